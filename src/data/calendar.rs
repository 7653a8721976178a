//! Date bookkeeping for history retrieval

use chrono::{Datelike, FixedOffset, NaiveDate, Utc};
use std::fmt;

use crate::{CalendarConfig, PitchError, Result};

/// Inclusive range of game dates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateWindow {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        DateWindow { start, end }
    }

    /// True before the season has produced any finished day
    pub fn is_empty(&self) -> bool {
        self.start > self.end
    }

    pub fn start_str(&self) -> String {
        self.start.format("%Y-%m-%d").to_string()
    }

    pub fn end_str(&self) -> String {
        self.end.format("%Y-%m-%d").to_string()
    }
}

impl fmt::Display for DateWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} to {}", self.start_str(), self.end_str())
    }
}

/// Parse a `YYYY-MM-DD` date
pub fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
        .map_err(|e| PitchError::Parse(format!("Invalid date {:?}: {}", s, e)))
}

/// Local calendar of the service
#[derive(Debug, Clone, Copy)]
pub struct Calendar {
    offset: FixedOffset,
    season_start_month: u32,
    season_start_day: u32,
}

impl Calendar {
    pub fn from_config(config: &CalendarConfig) -> Result<Self> {
        let offset = FixedOffset::east_opt(config.utc_offset_hours * 3600).ok_or_else(|| {
            PitchError::Config(format!(
                "Invalid UTC offset: {} hours",
                config.utc_offset_hours
            ))
        })?;
        // Check month/day once against a leap year
        NaiveDate::from_ymd_opt(2024, config.season_start_month, config.season_start_day)
            .ok_or_else(|| {
                PitchError::Config(format!(
                    "Invalid season start {}-{}",
                    config.season_start_month, config.season_start_day
                ))
            })?;

        Ok(Calendar {
            offset,
            season_start_month: config.season_start_month,
            season_start_day: config.season_start_day,
        })
    }

    /// Today's date in the configured zone
    pub fn today(&self) -> NaiveDate {
        Utc::now().with_timezone(&self.offset).date_naive()
    }

    /// History window for a given day: season start of that year up to the
    /// day before
    pub fn history_window(&self, today: NaiveDate) -> Result<DateWindow> {
        let start = NaiveDate::from_ymd_opt(
            today.year(),
            self.season_start_month,
            self.season_start_day,
        )
        .ok_or_else(|| {
            PitchError::Config(format!(
                "Season start {}-{} does not exist in {}",
                self.season_start_month,
                self.season_start_day,
                today.year()
            ))
        })?;
        let end = today
            .pred_opt()
            .ok_or_else(|| PitchError::Parse(format!("No day before {}", today)))?;
        Ok(DateWindow::new(start, end))
    }

    /// History window ending yesterday
    pub fn current_window(&self) -> Result<DateWindow> {
        self.history_window(self.today())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_history_window() {
        let calendar = Calendar::from_config(&CalendarConfig::default()).unwrap();
        let window = calendar.history_window(date(2025, 7, 4)).unwrap();
        assert_eq!(window.start_str(), "2025-03-01");
        assert_eq!(window.end_str(), "2025-07-03");
        assert!(!window.is_empty());
    }

    #[test]
    fn test_window_before_season_is_empty() {
        let calendar = Calendar::from_config(&CalendarConfig::default()).unwrap();
        let window = calendar.history_window(date(2025, 1, 15)).unwrap();
        assert!(window.is_empty());
    }

    #[test]
    fn test_year_boundary() {
        let calendar = Calendar::from_config(&CalendarConfig::default()).unwrap();
        let window = calendar.history_window(date(2025, 1, 1)).unwrap();
        assert_eq!(window.end, date(2024, 12, 31));
    }

    #[test]
    fn test_invalid_config() {
        let config = CalendarConfig {
            season_start_month: 2,
            season_start_day: 30,
            ..CalendarConfig::default()
        };
        assert!(Calendar::from_config(&config).is_err());

        let config = CalendarConfig {
            utc_offset_hours: 30,
            ..CalendarConfig::default()
        };
        assert!(Calendar::from_config(&config).is_err());
    }

    #[test]
    fn test_parse_date() {
        assert_eq!(parse_date("2025-04-01").unwrap(), date(2025, 4, 1));
        assert!(parse_date("04/01/2025").is_err());
    }
}
