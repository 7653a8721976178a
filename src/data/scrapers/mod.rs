//! Clients for remote baseball data

pub mod savant;
pub mod statsapi;

use chrono::NaiveDate;

use crate::data::calendar::DateWindow;
use crate::features::{RawGameSnapshot, RawPitchRow};
use crate::{DataConfig, DataSource, GameId, LiveGame, PitchError, PitcherId, Result};

/// Source of the live state of a game
pub trait GameStateProvider {
    /// The data source this provider reads from
    fn source(&self) -> DataSource;

    /// Fetch the raw state of the at-bat in progress
    fn fetch_snapshot(&self, game: GameId) -> Result<RawGameSnapshot>;
}

/// Source of a pitcher's pitch-by-pitch history
pub trait PitchHistoryProvider {
    /// The data source this provider reads from
    fn source(&self) -> DataSource;

    /// Fetch regular-season pitches thrown in the window, with
    /// `last_pitch_type` already labeled
    fn fetch_history(&self, pitcher: PitcherId, window: &DateWindow) -> Result<Vec<RawPitchRow>>;
}

/// Source of the day's schedule
pub trait ScheduleProvider {
    /// Games in progress on the given date
    fn live_games(&self, date: NaiveDate) -> Result<Vec<LiveGame>>;
}

/// Build the blocking HTTP client shared by the providers
pub fn build_client(config: &DataConfig) -> Result<reqwest::blocking::Client> {
    reqwest::blocking::Client::builder()
        .user_agent(config.user_agent.as_str())
        .timeout(std::time::Duration::from_secs(config.timeout_secs))
        .build()
        .map_err(PitchError::Http)
}

/// Retry a fetch with exponential backoff
pub fn with_retry<T, F>(mut operation: F, max_attempts: u32) -> Result<T>
where
    F: FnMut() -> Result<T>,
{
    let max_attempts = max_attempts.max(1);
    let mut attempt = 0;
    loop {
        match operation() {
            Ok(result) => return Ok(result),
            Err(e) => {
                attempt += 1;
                log::warn!("Attempt {} failed: {}", attempt, e);
                if attempt >= max_attempts {
                    return Err(e);
                }
                let delay = std::time::Duration::from_millis(100 * 2u64.pow(attempt - 1));
                std::thread::sleep(delay);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retry_succeeds_after_failures() {
        let mut calls = 0;
        let result = with_retry(
            || {
                calls += 1;
                if calls < 3 {
                    Err(PitchError::Parse("flaky".into()))
                } else {
                    Ok(calls)
                }
            },
            3,
        );
        assert_eq!(result.unwrap(), 3);
    }

    #[test]
    fn test_retry_returns_last_error() {
        let mut calls = 0;
        let result: Result<()> = with_retry(
            || {
                calls += 1;
                Err(PitchError::Parse(format!("failure {}", calls)))
            },
            2,
        );
        assert_eq!(calls, 2);
        assert!(matches!(result, Err(PitchError::Parse(m)) if m == "failure 2"));
    }

    #[test]
    fn test_zero_attempts_still_tries_once() {
        let mut calls = 0;
        let _: Result<()> = with_retry(
            || {
                calls += 1;
                Err(PitchError::Parse("no".into()))
            },
            0,
        );
        assert_eq!(calls, 1);
    }
}
