//! ==============================================================================
//! series.rs - minute-spaced series for the over-time charts
//! ==============================================================================
//!
//! only one reading exists, so each series is that scalar repeated
//! `SERIES_LEN` times from a fixed start. no history is synthesized.
//!
//! ==============================================================================

use chrono::{Duration, NaiveDate, NaiveDateTime};
use serde::Serialize;

pub const SERIES_LEN: usize = 60;

/// 2022-01-01 00:00:00, the x origin of every series
pub fn series_start() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2022, 1, 1)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .unwrap_or_default()
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Point {
    pub time: NaiveDateTime,
    pub value: f64,
}

#[derive(Debug, Clone, Serialize, PartialEq, Default)]
pub struct TimeSeries {
    pub points: Vec<Point>,
}

impl TimeSeries {
    pub fn repeated(value: f64) -> Self {
        let start = series_start();
        let points = (0..SERIES_LEN as i64)
            .map(|i| Point { time: start + Duration::minutes(i), value })
            .collect();
        Self { points }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn values(&self) -> impl Iterator<Item = f64> + '_ {
        self.points.iter().map(|p| p.value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sixty_equal_points() {
        let s = TimeSeries::repeated(22.5);
        assert_eq!(s.len(), SERIES_LEN);
        assert!(s.values().all(|v| v == 22.5));
    }

    #[test]
    fn test_one_minute_spacing_from_fixed_start() {
        let s = TimeSeries::repeated(1.0);
        assert_eq!(s.points[0].time.to_string(), "2022-01-01 00:00:00");
        assert_eq!(s.points[59].time.to_string(), "2022-01-01 00:59:00");
        for pair in s.points.windows(2) {
            assert_eq!(pair[1].time - pair[0].time, Duration::minutes(1));
        }
    }

    #[test]
    fn test_same_value_same_series() {
        assert_eq!(TimeSeries::repeated(-3.0), TimeSeries::repeated(-3.0));
    }
}
