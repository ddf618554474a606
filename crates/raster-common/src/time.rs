//! Time windows and bin policies.
//!
//! A run's temporal axis is a contiguous, regular sequence of bins covering
//! the requested window. Dekads are calendar dekads: days 1-10, 11-20 and
//! 21 through the end of the month, so the third dekad of a month is 8 to
//! 11 days long.

use crate::error::CompositingError;
use chrono::{DateTime, Datelike, Duration, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// The requested time window of a run, half-open `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeWindow {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, dt: &DateTime<Utc>) -> bool {
        dt >= &self.start && dt < &self.end
    }
}

impl std::fmt::Display for TimeWindow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}/{}",
            self.start.format("%Y-%m-%dT%H:%M:%SZ"),
            self.end.format("%Y-%m-%dT%H:%M:%SZ")
        )
    }
}

/// One temporal bin, half-open `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BinPeriod {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl BinPeriod {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, dt: &DateTime<Utc>) -> bool {
        dt >= &self.start && dt < &self.end
    }

    /// Midpoint of the bin, used for day-of-year style derivations.
    pub fn midpoint(&self) -> DateTime<Utc> {
        self.start + (self.end - self.start) / 2
    }
}

impl std::fmt::Display for BinPeriod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}/{}",
            self.start.format("%Y-%m-%d"),
            self.end.format("%Y-%m-%d")
        )
    }
}

/// How the time window is partitioned into bins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BinPolicy {
    /// Fixed-length bins of N days, anchored at the window start.
    #[serde(rename = "fixed_days")]
    FixedDays(u32),
    /// Calendar dekads (1-10, 11-20, 21-end of month).
    Dekadal,
}

impl BinPolicy {
    /// Partition a window into a contiguous, gapless bin sequence.
    ///
    /// Bins are generated for the whole window even where no source data
    /// exists; the gap-fill policy, not omission, handles empty stretches.
    /// The final bin may extend past the window end to keep the sequence
    /// regular. Fails if the window is inverted or cannot hold one full
    /// bin.
    pub fn bin_periods(&self, window: &TimeWindow) -> Result<Vec<BinPeriod>, CompositingError> {
        if window.start >= window.end {
            return Err(CompositingError::InvalidWindow {
                start: window.start.to_rfc3339(),
                end: window.end.to_rfc3339(),
            });
        }

        let bins = match self {
            BinPolicy::FixedDays(days) => {
                if *days == 0 {
                    return Err(CompositingError::InvalidPolicy(
                        "fixed-day bin length must be at least 1 day".to_string(),
                    ));
                }
                let step = Duration::days(*days as i64);
                let mut bins = Vec::new();
                let mut start = window.start;
                while start < window.end {
                    bins.push(BinPeriod::new(start, start + step));
                    start += step;
                }
                bins
            }
            BinPolicy::Dekadal => {
                let mut bins = Vec::new();
                let mut start = dekad_start(window.start);
                while start < window.end {
                    let end = next_dekad_start(start);
                    bins.push(BinPeriod::new(start, end));
                    start = end;
                }
                bins
            }
        };

        // At least one bin must lie fully inside the window, otherwise the
        // policy conflicts with the window.
        let any_full = bins
            .iter()
            .any(|b| b.start >= window.start && b.end <= window.end);
        if !any_full {
            return Err(CompositingError::WindowTooShort {
                window: window.to_string(),
                policy: self.to_string(),
            });
        }

        Ok(bins)
    }
}

impl std::fmt::Display for BinPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BinPolicy::FixedDays(days) => write!(f, "{days}-day"),
            BinPolicy::Dekadal => write!(f, "dekadal"),
        }
    }
}

/// Start of the calendar dekad containing `dt`.
fn dekad_start(dt: DateTime<Utc>) -> DateTime<Utc> {
    let day = match dt.day() {
        1..=10 => 1,
        11..=20 => 11,
        _ => 21,
    };
    Utc.with_ymd_and_hms(dt.year(), dt.month(), day, 0, 0, 0)
        .unwrap()
}

/// Start of the calendar dekad after the one beginning at `start`.
fn next_dekad_start(start: DateTime<Utc>) -> DateTime<Utc> {
    match start.day() {
        1 => Utc
            .with_ymd_and_hms(start.year(), start.month(), 11, 0, 0, 0)
            .unwrap(),
        11 => Utc
            .with_ymd_and_hms(start.year(), start.month(), 21, 0, 0, 0)
            .unwrap(),
        _ => {
            let (year, month) = if start.month() == 12 {
                (start.year() + 1, 1)
            } else {
                (start.year(), start.month() + 1)
            };
            Utc.with_ymd_and_hms(year, month, 1, 0, 0, 0).unwrap()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dt(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap()
    }

    #[test]
    fn test_fixed_day_bins_are_regular() {
        let window = TimeWindow::new(dt(2023, 3, 1), dt(2023, 3, 31));
        let bins = BinPolicy::FixedDays(10).bin_periods(&window).unwrap();
        assert_eq!(bins.len(), 3);
        for pair in bins.windows(2) {
            assert_eq!(pair[0].end, pair[1].start);
            assert_eq!(pair[1].end - pair[1].start, Duration::days(10));
        }
    }

    #[test]
    fn test_fixed_day_last_bin_extends_past_window() {
        let window = TimeWindow::new(dt(2023, 3, 1), dt(2023, 3, 25));
        let bins = BinPolicy::FixedDays(10).bin_periods(&window).unwrap();
        assert_eq!(bins.len(), 3);
        assert_eq!(bins[2].end, dt(2023, 3, 31));
    }

    #[test]
    fn test_window_shorter_than_bin_fails() {
        let window = TimeWindow::new(dt(2023, 3, 1), dt(2023, 3, 5));
        let err = BinPolicy::FixedDays(10).bin_periods(&window).unwrap_err();
        assert!(matches!(err, CompositingError::WindowTooShort { .. }));
    }

    #[test]
    fn test_inverted_window_fails() {
        let window = TimeWindow::new(dt(2023, 3, 5), dt(2023, 3, 1));
        let err = BinPolicy::Dekadal.bin_periods(&window).unwrap_err();
        assert!(matches!(err, CompositingError::InvalidWindow { .. }));
    }

    #[test]
    fn test_zero_day_policy_fails() {
        let window = TimeWindow::new(dt(2023, 3, 1), dt(2023, 3, 31));
        let err = BinPolicy::FixedDays(0).bin_periods(&window).unwrap_err();
        assert!(matches!(err, CompositingError::InvalidPolicy(_)));
    }

    #[test]
    fn test_dekadal_bins_follow_calendar() {
        let window = TimeWindow::new(dt(2023, 2, 5), dt(2023, 3, 15));
        let bins = BinPolicy::Dekadal.bin_periods(&window).unwrap();
        // Feb 1-10 (containing window start), 11-20, 21-Mar 1, Mar 1-10, 11-20.
        assert_eq!(bins.len(), 5);
        assert_eq!(bins[0].start, dt(2023, 2, 1));
        assert_eq!(bins[2].start, dt(2023, 2, 21));
        assert_eq!(bins[2].end, dt(2023, 3, 1));
        assert_eq!(bins[3].end, dt(2023, 3, 11));
        // Contiguous.
        for pair in bins.windows(2) {
            assert_eq!(pair[0].end, pair[1].start);
        }
    }

    #[test]
    fn test_dekadal_third_dekad_of_december() {
        let window = TimeWindow::new(dt(2023, 12, 21), dt(2024, 1, 1));
        let bins = BinPolicy::Dekadal.bin_periods(&window).unwrap();
        assert_eq!(bins.len(), 1);
        assert_eq!(bins[0].start, dt(2023, 12, 21));
        assert_eq!(bins[0].end, dt(2024, 1, 1));
    }

    #[test]
    fn test_bin_midpoint() {
        let bin = BinPeriod::new(dt(2023, 3, 1), dt(2023, 3, 11));
        assert_eq!(bin.midpoint(), dt(2023, 3, 6));
    }
}
