//! ==============================================================================
//! domain.rs - reading and control state
//! ==============================================================================
//!
//! purpose:
//!     the two values a render pass works from: the first csv row and the
//!     sidebar widget values of the current request.
//!
//! ==============================================================================

use serde::{Deserialize, Serialize};

/// the single telemetry row that drives the whole dashboard
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
pub struct Reading {
    /// copied verbatim from the source, no timestamp parsing
    pub last_reading_time: String,
    pub site_status: String,
    /// voltage1..voltage4 in column order
    pub voltages: [f64; 4],
    /// trimmed source cells of voltage1..voltage4, shown on the metric cards
    pub voltage_text: [String; 4],
    pub door_status: String,
    /// percent, not clamped
    pub fuel_level: f64,
    pub fuel_level_text: String,
    /// raw 10-bit adc value, displayed against a fixed 0-1023 range
    pub gauge_value: f64,
    /// celsius
    pub temperature: f64,
    /// relative humidity (%)
    pub humidity: f64,
}

/// sidebar widget values for one render pass
///
/// rebuilt from the request on every pass and dropped afterwards.
/// nothing here is persisted or sent to a device.
#[derive(Clone, Copy, Serialize, Deserialize, Debug, Default, PartialEq, Eq)]
pub struct ControlState {
    pub pump_on: bool,
    /// 0..=60
    pub pump_seconds: u8,
    pub generator_on: bool,
    /// true only on the pass triggered by the button click
    pub reset_requested: bool,
}

pub const PUMP_SECONDS_MAX: u8 = 60;

impl ControlState {
    /// "ON" / "OFF" label used by the device status cards
    pub fn switch_label(on: bool) -> &'static str {
        if on { "ON" } else { "OFF" }
    }
}
