//! Next-pitch prediction by historical situation matching
//!
//! Compares the live at-bat against a pitcher's own pitch-by-pitch history,
//! pools the most analogous past pitches and reports the pitch mix of that pool.

pub mod data;
pub mod features;
pub mod predict;
pub mod server;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

use crate::predict::scoring::FeatureWeights;

/// Label used when there is no pitch to report (first pitch of an at-bat,
/// last pitch of an at-bat for the lookahead label).
pub const NO_PITCH: &str = "N/A";

/// Stats API game identifier (`gamePk`)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GameId(pub i64);

impl fmt::Display for GameId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Game({})", self.0)
    }
}

/// MLBAM player identifier of a pitcher
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PitcherId(pub i64);

impl fmt::Display for PitcherId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Pitcher({})", self.0)
    }
}

/// Source of retrieved data
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DataSource {
    StatsApi,
    Savant,
}

impl fmt::Display for DataSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataSource::StatsApi => write!(f, "MLB Stats API"),
            DataSource::Savant => write!(f, "Baseball Savant"),
        }
    }
}

/// Side of the plate the batter stands on.
///
/// Only two sides are representable: anything that does not read as "left"
/// collapses to `Right`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BatterSide {
    Left,
    Right,
}

impl BatterSide {
    /// Normalize a textual side ("L", "Left", "R", "Right", ...)
    pub fn from_label(label: &str) -> Self {
        let label = label.trim();
        if label.eq_ignore_ascii_case("l") || label.eq_ignore_ascii_case("left") {
            BatterSide::Left
        } else {
            BatterSide::Right
        }
    }

    /// Numeric code: 0 = left, 1 = right
    pub fn code(&self) -> u8 {
        match self {
            BatterSide::Left => 0,
            BatterSide::Right => 1,
        }
    }
}

/// The live at-bat, normalized for matching
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentState {
    pub game_id: GameId,
    pub pitcher_id: PitcherId,
    pub balls: u8,
    pub strikes: u8,
    pub outs: u8,
    pub inning: u32,
    pub batter_side: BatterSide,
    /// Pitch code of the previous pitch, or [`NO_PITCH`]
    pub last_pitch_type: String,
    /// Fielding team score minus batting team score
    pub margin: i32,
    pub home_score: u32,
    pub away_score: u32,
}

/// One pitch from a pitcher's regular-season history, ready for scoring
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoricalPitch {
    pub game_pk: i64,
    pub at_bat_number: u32,
    pub balls: u8,
    pub strikes: u8,
    pub outs: u8,
    pub inning: u32,
    /// Fielding team score minus batting team score, when both were recorded
    pub margin: Option<i32>,
    pub batter_side: BatterSide,
    /// Neighbouring pitch in the same at-bat, or [`NO_PITCH`]
    pub last_pitch_type: String,
    /// Type of this pitch (the predicted quantity)
    pub pitch_type: String,
}

/// A historical pitch with its similarity to the current state
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredNeighbor {
    pub pitch: HistoricalPitch,
    pub score: f64,
}

/// Prediction output, shaped like the service's JSON response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    pub balls: u8,
    pub strikes: u8,
    pub outs: u8,
    pub inning: u32,
    pub away_score: u32,
    pub home_score: u32,
    pub last_pitch_type: String,
    pub confidence_score: i64,
    pub pitch_probabilities: BTreeMap<String, f64>,
}

impl PredictionResult {
    /// Most likely pitch type (first code wins a tie)
    pub fn most_likely(&self) -> Option<(&str, f64)> {
        self.pitch_probabilities
            .iter()
            .fold(None, |best: Option<(&str, f64)>, (code, &p)| match best {
                Some((_, bp)) if bp >= p => best,
                _ => Some((code.as_str(), p)),
            })
    }
}

/// A game currently in progress
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LiveGame {
    #[serde(rename = "gamePk")]
    pub game_pk: i64,
    pub away_team: String,
    pub home_team: String,
}

/// Application-wide errors
#[derive(Debug, Error)]
pub enum PitchError {
    #[error("Retrieval failed for {data_source}: {message}")]
    Retrieval {
        data_source: DataSource,
        message: String,
    },

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Current game state is missing field: {0}")]
    MissingStateField(&'static str),

    #[error("Insufficient history: has {rows} valid pitches, need {required}")]
    InsufficientHistory { rows: usize, required: usize },

    #[error("No pitcher on the mound for {0}")]
    NoPitcherOnMound(GameId),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Parse error: {0}")]
    Parse(String),
}

impl PitchError {
    /// Message shown to end users of the service
    pub fn user_message(&self) -> String {
        match self {
            PitchError::MissingStateField(field) => {
                format!("Could not get current game data (missing {}).", field)
            }
            PitchError::Retrieval {
                data_source: DataSource::Savant,
                ..
            }
            | PitchError::Csv(_) => "Could not get historical data for this pitcher.".to_string(),
            PitchError::Retrieval { .. }
            | PitchError::Http(_)
            | PitchError::Json(_)
            | PitchError::Parse(_) => "Could not get current game data.".to_string(),
            PitchError::InsufficientHistory { .. } => {
                "Not enough historical data for this pitcher.".to_string()
            }
            PitchError::NoPitcherOnMound(_) => "No pitcher is currently on the mound.".to_string(),
            PitchError::Config(_) | PitchError::Io(_) => self.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, PitchError>;

/// Which play events feed the live last-pitch code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LastPitchScope {
    /// Last parseable pitch code anywhere in the game feed
    #[default]
    Game,
    /// Last parseable pitch code within the current at-bat
    AtBat,
}

/// Which neighbour in the at-bat becomes a historical row's `last_pitch_type`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LabelDirection {
    /// The pitch thrown right after this one
    #[default]
    Following,
    /// The pitch thrown right before this one
    Preceding,
}

/// Application configuration loaded from config.toml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub engine: EngineConfig,
    pub data: DataConfig,
    pub calendar: CalendarConfig,
    pub server: ServerConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Valid historical pitches required before predicting
    pub min_history: usize,
    /// Neighbour pool size (k)
    pub pool_size: usize,
    /// Confidence normalization constant
    pub confidence_divisor: f64,
    pub weights: FeatureWeights,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            min_history: 98,
            pool_size: 98,
            confidence_divisor: 11.628,
            weights: FeatureWeights::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    pub stats_api_url: String,
    pub savant_url: String,
    pub user_agent: String,
    pub timeout_secs: u64,
    pub retry_attempts: u32,
    /// Directory for cached Savant responses
    pub cache_dir: Option<String>,
    /// Only read history from the cache
    pub offline: bool,
    pub last_pitch_scope: LastPitchScope,
    pub label_direction: LabelDirection,
}

impl Default for DataConfig {
    fn default() -> Self {
        DataConfig {
            stats_api_url: "https://statsapi.mlb.com".to_string(),
            savant_url: "https://baseballsavant.mlb.com".to_string(),
            user_agent: "pitchcast/0.1".to_string(),
            timeout_secs: 30,
            retry_attempts: 3,
            cache_dir: None,
            offline: false,
            last_pitch_scope: LastPitchScope::Game,
            label_direction: LabelDirection::Following,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CalendarConfig {
    /// Fixed offset used to decide what "today" is
    pub utc_offset_hours: i32,
    pub season_start_month: u32,
    pub season_start_day: u32,
}

impl Default for CalendarConfig {
    fn default() -> Self {
        CalendarConfig {
            utc_offset_hours: -5,
            season_start_month: 3,
            season_start_day: 1,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_addr: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            bind_addr: "0.0.0.0:5000".to_string(),
        }
    }
}

impl Config {
    pub fn load(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            PitchError::Config(format!("Failed to read config file {}: {}", path, e))
        })?;
        let config: Config = toml::from_str(&content)
            .map_err(|e| PitchError::Config(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn save(&self, path: &str) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| PitchError::Config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Reject settings the engine cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.engine.pool_size == 0 {
            return Err(PitchError::Config("engine.pool_size must be positive".into()));
        }
        if !(self.engine.confidence_divisor.is_finite() && self.engine.confidence_divisor > 0.0) {
            return Err(PitchError::Config(
                "engine.confidence_divisor must be a positive number".into(),
            ));
        }
        if !(1..=12).contains(&self.calendar.season_start_month) {
            return Err(PitchError::Config(format!(
                "calendar.season_start_month out of range: {}",
                self.calendar.season_start_month
            )));
        }
        if self.calendar.utc_offset_hours.abs() > 14 {
            return Err(PitchError::Config(format!(
                "calendar.utc_offset_hours out of range: {}",
                self.calendar.utc_offset_hours
            )));
        }
        Ok(())
    }
}
