use anyhow::{Context, Result};
use chrono::{Datelike, NaiveDate};

/// Acquisition time window, inclusive start, exclusive end.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl TimeWindow {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        TimeWindow { start, end }
    }

    pub fn start_string(&self) -> String {
        self.start.format("%Y-%m-%d").to_string()
    }

    pub fn end_string(&self) -> String {
        self.end.format("%Y-%m-%d").to_string()
    }
}

/// Acquisition window for the most recently completed meteorological season.
///
/// Heat-island runs compare against the season that just ended rather than
/// the one in progress, so every requested scene already exists.
pub fn seasonal_time_window(today: NaiveDate) -> Result<TimeWindow> {
    let year = today.year();
    let (start_year, start_month, end_year, end_month) = match today.month() {
        3..=5 => (year - 1, 12, year, 3),
        6..=8 => (year, 3, year, 6),
        9..=11 => (year, 6, year, 9),
        12 => (year, 9, year, 12),
        // January and February look back at last year's autumn
        _ => (year - 1, 9, year - 1, 12),
    };
    Ok(TimeWindow::new(
        first_of_month(start_year, start_month)?,
        first_of_month(end_year, end_month)?,
    ))
}

fn first_of_month(year: i32, month: u32) -> Result<NaiveDate> {
    NaiveDate::from_ymd_opt(year, month, 1)
        .with_context(|| format!("invalid date {year}-{month:02}-01"))
}
