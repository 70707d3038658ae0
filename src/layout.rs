//! ==============================================================================
//! layout.rs - the render pass: reading + controls -> page model
//! ==============================================================================
//!
//! purpose:
//!     binds the first csv row to a fixed grid of cards and charts.
//!     the output is a plain serializable tree; `render.rs` turns it into
//!     html and `/api/page` returns it as json.
//!
//! pass shape:
//!
//!     Table::load ──► first_reading ──► build_page ──► Page
//!          │               │
//!          └── DataLoadError aborts the pass, nothing is emitted
//!
//! same table + same controls always gives the same page.
//!
//! ==============================================================================

use crate::domain::{ControlState, Reading, PUMP_SECONDS_MAX};
use crate::series::TimeSeries;
use crate::source::{DataLoadError, Table, HEAD_ROWS};

use serde::Serialize;
use std::path::Path;

pub const PAGE_TITLE: &str = "Dashboard";
pub const PAGE_ICON: &str = "📊";
pub const FOOTER_TEXT: &str = "Dashboard by Your Name";
pub const GAUGE_RANGE: (f64, f64) = (0.0, 1023.0);

// form field names, shared with the query parser in server.rs
pub const FIELD_PUMP: &str = "pump";
pub const FIELD_PUMP_SECONDS: &str = "pump_seconds";
pub const FIELD_RESET: &str = "reset";
pub const FIELD_GENERATOR: &str = "generator";

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Page {
    pub title: String,
    pub icon: String,
    /// full-width layout
    pub wide: bool,
    pub sidebar: Sidebar,
    pub blocks: Vec<Block>,
    pub footer: String,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Sidebar {
    pub title: String,
    pub controls: Vec<Control>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Control {
    Checkbox { name: String, label: String, checked: bool },
    Slider { name: String, label: String, min: u8, max: u8, value: u8 },
    Button { name: String, label: String, clicked: bool },
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Block {
    Title { text: String },
    Subheader { text: String },
    Heading { text: String },
    Table { headers: Vec<String>, rows: Vec<Vec<String>> },
    Columns { columns: Vec<Vec<Widget>> },
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Delta {
    pub text: String,
    /// red/green swapped, as used for status deltas
    pub inverse: bool,
}

/// title and axis captions shared by every chart
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ChartFrame {
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    /// plotly-style dark template
    pub dark: bool,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Slice {
    pub label: String,
    pub value: f64,
    pub color: String,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Widget {
    Metric {
        label: String,
        value: String,
        delta: Option<Delta>,
    },
    Gauge {
        title: String,
        value: f64,
        min: f64,
        max: f64,
        bar_color: String,
    },
    Line {
        frame: ChartFrame,
        name: String,
        series: TimeSeries,
        color: String,
        width: u8,
    },
    Area {
        frame: ChartFrame,
        name: String,
        series: TimeSeries,
        fill_color: String,
    },
    Bar {
        frame: ChartFrame,
        categories: Vec<String>,
        values: Vec<f64>,
        color: String,
    },
    Pie {
        title: String,
        slices: Vec<Slice>,
    },
}

/// one full pass: load the source, extract the reading, lay out the page
pub fn render_pass(path: &Path, controls: &ControlState, show_reading: bool) -> Result<Page, DataLoadError> {
    tracing::debug!(source = %path.display(), ?controls, "render pass");

    let table = Table::load(path)?;
    let reading = table.first_reading()?;
    if show_reading {
        tracing::info!(
            time = %reading.last_reading_time,
            status = %reading.site_status,
            voltages = ?reading.voltages,
            fuel = reading.fuel_level,
            gauge = reading.gauge_value,
            temperature = reading.temperature,
            humidity = reading.humidity,
            "reading"
        );
    }

    Ok(build_page(&table, &reading, controls))
}

pub fn build_page(table: &Table, reading: &Reading, controls: &ControlState) -> Page {
    let blocks = vec![
        Block::Title { text: PAGE_TITLE.to_string() },
        Block::Subheader { text: "Dataset Overview".to_string() },
        Block::Table {
            headers: table.headers().to_vec(),
            rows: table.head(HEAD_ROWS).to_vec(),
        },
        metrics_row(reading),
        Block::Columns {
            columns: vec![
                vec![line_chart("Temperature", "Temperature (°C)", reading.temperature, "firebrick")],
                vec![line_chart("Humidity", "Humidity (%)", reading.humidity, "royalblue")],
            ],
        },
        Block::Columns {
            columns: vec![
                vec![site_status_pie(&reading.site_status)],
                vec![voltage_bars(&reading.voltages)],
                vec![fuel_area(reading.fuel_level)],
            ],
        },
        Block::Heading { text: "Device Status".to_string() },
        Block::Columns {
            columns: vec![
                vec![metric("Pump Switch", ControlState::switch_label(controls.pump_on), None)],
                vec![metric("Generator Switch", ControlState::switch_label(controls.generator_on), None)],
            ],
        },
    ];

    Page {
        title: PAGE_TITLE.to_string(),
        icon: PAGE_ICON.to_string(),
        wide: true,
        sidebar: sidebar(controls),
        blocks,
        footer: FOOTER_TEXT.to_string(),
    }
}

fn sidebar(controls: &ControlState) -> Sidebar {
    Sidebar {
        title: "Controls".to_string(),
        controls: vec![
            Control::Checkbox {
                name: FIELD_PUMP.to_string(),
                label: "Pump Switch".to_string(),
                checked: controls.pump_on,
            },
            Control::Slider {
                name: FIELD_PUMP_SECONDS.to_string(),
                label: "Pump Seconds".to_string(),
                min: 0,
                max: PUMP_SECONDS_MAX,
                value: controls.pump_seconds,
            },
            Control::Button {
                name: FIELD_RESET.to_string(),
                label: "Reset Slave".to_string(),
                clicked: controls.reset_requested,
            },
            Control::Checkbox {
                name: FIELD_GENERATOR.to_string(),
                label: "Generator Switch".to_string(),
                checked: controls.generator_on,
            },
        ],
    }
}

fn metrics_row(reading: &Reading) -> Block {
    let [v1, v2, v3, v4] = &reading.voltage_text;
    let inverse = |text: &str| Some(Delta { text: text.to_string(), inverse: true });

    Block::Columns {
        columns: vec![
            vec![
                metric("Last Reading Time", &reading.last_reading_time, None),
                metric("Site Status", &reading.site_status, inverse("Active")),
                metric("Main Voltage 1", &with_unit(v1, "V"), None),
                metric("Main Voltage 2", &with_unit(v2, "V"), None),
            ],
            vec![
                metric("Main Voltage 3", &with_unit(v3, "V"), None),
                metric("Main Voltage 4", &with_unit(v4, "V"), None),
                metric("Door Status", &reading.door_status, inverse("Closed")),
                metric("Generator Fuel Level", &with_unit(&reading.fuel_level_text, "%"), None),
            ],
            vec![Widget::Gauge {
                title: "Gauge".to_string(),
                value: reading.gauge_value,
                min: GAUGE_RANGE.0,
                max: GAUGE_RANGE.1,
                bar_color: "blue".to_string(),
            }],
        ],
    }
}

fn metric(label: &str, value: &str, delta: Option<Delta>) -> Widget {
    Widget::Metric { label: label.to_string(), value: value.to_string(), delta }
}

/// source text as written: "12" -> "12 V", "12.0" -> "12.0 V"
fn with_unit(text: &str, unit: &str) -> String {
    format!("{} {}", text, unit)
}

fn time_frame(title: &str, y_label: &str) -> ChartFrame {
    ChartFrame {
        title: title.to_string(),
        x_label: "Time".to_string(),
        y_label: y_label.to_string(),
        dark: true,
    }
}

fn line_chart(name: &str, y_label: &str, value: f64, color: &str) -> Widget {
    Widget::Line {
        frame: time_frame(&format!("{} Over Time", name), y_label),
        name: name.to_string(),
        series: TimeSeries::repeated(value),
        color: color.to_string(),
        width: 2,
    }
}

fn fuel_area(fuel_level: f64) -> Widget {
    Widget::Area {
        frame: time_frame("Fuel Level Over Time", "Fuel Level (%)"),
        name: "Fuel Level".to_string(),
        series: TimeSeries::repeated(fuel_level),
        fill_color: "green".to_string(),
    }
}

fn voltage_bars(voltages: &[f64; 4]) -> Widget {
    Widget::Bar {
        frame: ChartFrame {
            title: "Voltage Levels".to_string(),
            x_label: "Voltage Type".to_string(),
            y_label: "Voltage (V)".to_string(),
            dark: false,
        },
        categories: (1..=voltages.len()).map(|i| format!("Voltage {}", i)).collect(),
        values: voltages.to_vec(),
        color: "indianred".to_string(),
    }
}

fn site_status_pie(site_status: &str) -> Widget {
    Widget::Pie {
        title: "Site Status".to_string(),
        slices: vec![Slice {
            label: site_status.to_string(),
            value: 1.0,
            color: "royalblue".to_string(),
        }],
    }
}

// ==============================================================================
// tests
// ==============================================================================
#[cfg(test)]
mod tests {
    use super::*;
    use crate::series::SERIES_LEN;
    use crate::source::tests::SAMPLE;

    fn sample_page(controls: &ControlState) -> Page {
        let table = Table::from_reader(SAMPLE.as_bytes()).unwrap();
        let reading = table.first_reading().unwrap();
        build_page(&table, &reading, controls)
    }

    fn widgets(page: &Page) -> Vec<&Widget> {
        page.blocks
            .iter()
            .filter_map(|b| match b {
                Block::Columns { columns } => Some(columns),
                _ => None,
            })
            .flatten()
            .flatten()
            .collect()
    }

    fn metric_value<'a>(page: &'a Page, wanted: &str) -> &'a str {
        widgets(page)
            .into_iter()
            .find_map(|w| match w {
                Widget::Metric { label, value, .. } if label == wanted => Some(value.as_str()),
                _ => None,
            })
            .unwrap_or_else(|| panic!("no metric {wanted}"))
    }

    #[test]
    fn test_page_frame() {
        let page = sample_page(&ControlState::default());
        assert_eq!(page.title, "Dashboard");
        assert!(page.wide);
        assert_eq!(page.sidebar.title, "Controls");
        assert_eq!(page.footer, FOOTER_TEXT);
    }

    #[test]
    fn test_gauge_shows_value_in_fixed_range() {
        let page = sample_page(&ControlState::default());
        let gauge = widgets(&page)
            .into_iter()
            .find(|w| matches!(w, Widget::Gauge { .. }))
            .unwrap();
        match gauge {
            Widget::Gauge { value, min, max, .. } => {
                assert_eq!(*value, 512.0);
                assert_eq!((*min, *max), (0.0, 1023.0));
            }
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_voltage_bars_in_order() {
        let page = sample_page(&ControlState::default());
        let bar = widgets(&page)
            .into_iter()
            .find_map(|w| match w {
                Widget::Bar { categories, values, .. } => Some((categories.clone(), values.clone())),
                _ => None,
            })
            .unwrap();
        assert_eq!(bar.0, vec!["Voltage 1", "Voltage 2", "Voltage 3", "Voltage 4"]);
        assert_eq!(bar.1, vec![11.9, 12.0, 12.1, 11.8]);
    }

    #[test]
    fn test_single_slice_pie() {
        let page = sample_page(&ControlState::default());
        let slices = widgets(&page)
            .into_iter()
            .find_map(|w| match w {
                Widget::Pie { slices, .. } => Some(slices.clone()),
                _ => None,
            })
            .unwrap();
        assert_eq!(slices.len(), 1);
        assert_eq!(slices[0].label, "Active");
    }

    #[test]
    fn test_series_repeat_the_scalars() {
        let page = sample_page(&ControlState::default());
        let mut seen = Vec::new();
        for w in widgets(&page) {
            match w {
                Widget::Line { name, series, .. } | Widget::Area { name, series, .. } => {
                    assert_eq!(series.len(), SERIES_LEN);
                    seen.push((name.clone(), series.points[0].value));
                    assert!(series.values().all(|v| v == series.points[0].value));
                }
                _ => {}
            }
        }
        assert_eq!(
            seen,
            vec![
                ("Temperature".to_string(), 22.5),
                ("Humidity".to_string(), 45.0),
                ("Fuel Level".to_string(), 75.5),
            ]
        );
    }

    #[test]
    fn test_metric_text() {
        let page = sample_page(&ControlState::default());
        assert_eq!(metric_value(&page, "Main Voltage 2"), "12.0 V");
        assert_eq!(metric_value(&page, "Generator Fuel Level"), "75.5 %");
        assert_eq!(metric_value(&page, "Door Status"), "Closed");
        assert_eq!(metric_value(&page, "Last Reading Time"), "2024-05-01 10:00:00");
    }

    #[test]
    fn test_pump_toggle_only_changes_pump_indicator() {
        let off = sample_page(&ControlState::default());
        let on = sample_page(&ControlState { pump_on: true, ..Default::default() });

        assert_eq!(metric_value(&off, "Pump Switch"), "OFF");
        assert_eq!(metric_value(&on, "Pump Switch"), "ON");
        assert_eq!(metric_value(&on, "Generator Switch"), "OFF");

        // everything above the device status row is identical
        let n = off.blocks.len() - 1;
        assert_eq!(off.blocks[..n], on.blocks[..n]);
        assert_ne!(off.blocks[n], on.blocks[n]);
    }

    #[test]
    fn test_seconds_and_reset_leave_content_alone() {
        let base = sample_page(&ControlState::default());
        let busy = sample_page(&ControlState {
            pump_seconds: 42,
            reset_requested: true,
            ..Default::default()
        });
        assert_eq!(base.blocks, busy.blocks);
        assert_ne!(base.sidebar, busy.sidebar);
    }

    #[test]
    fn test_build_is_idempotent() {
        let c = ControlState { generator_on: true, ..Default::default() };
        assert_eq!(sample_page(&c), sample_page(&c));
    }

    #[test]
    fn test_dataset_overview_shows_head() {
        let page = sample_page(&ControlState::default());
        let rows = page
            .blocks
            .iter()
            .find_map(|b| match b {
                Block::Table { rows, .. } => Some(rows.len()),
                _ => None,
            })
            .unwrap();
        assert_eq!(rows, 2);
    }

    #[test]
    fn test_integer_cells_render_without_decimal_point() {
        let csv = SAMPLE.replacen("11.9,12.0,12.1,11.8,Closed,75.5", "12, 11.5 ,12,12,Closed,75", 1);
        let table = Table::from_reader(csv.as_bytes()).unwrap();
        let reading = table.first_reading().unwrap();
        let page = build_page(&table, &reading, &ControlState::default());

        assert_eq!(metric_value(&page, "Main Voltage 1"), "12 V");
        assert_eq!(metric_value(&page, "Main Voltage 2"), "11.5 V");
        assert_eq!(metric_value(&page, "Generator Fuel Level"), "75 %");
        assert_eq!(reading.voltages[0], 12.0);
    }

    #[test]
    fn test_render_pass_aborts_on_non_numeric_field() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.csv");
        std::fs::write(&path, SAMPLE.replacen("11.9", "twelve", 1)).unwrap();

        let err = render_pass(&path, &ControlState::default(), false).unwrap_err();
        assert!(matches!(err, DataLoadError::InvalidField { column, .. } if column == "voltage1"));
    }

    #[test]
    fn test_render_pass_aborts_on_missing_column() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.csv");
        std::fs::write(&path, SAMPLE.replacen(",gauge_value", "", 1)).unwrap();

        let err = render_pass(&path, &ControlState::default(), false).unwrap_err();
        assert!(matches!(err, DataLoadError::MissingColumns(cols) if cols == vec!["gauge_value"]));
    }
}
