//! Baseball Savant client for Statcast pitch-by-pitch history
//!
//! Downloads a pitcher's regular-season pitches as CSV. Responses can be
//! cached on disk, keyed by pitcher and date window, for offline runs.

use serde::Deserialize;
use std::io::Read;
use std::path::{Path, PathBuf};

use super::{with_retry, PitchHistoryProvider};
use crate::data::calendar::DateWindow;
use crate::features::{label_at_bats, RawPitchRow};
use crate::{DataConfig, DataSource, LabelDirection, PitchError, PitcherId, Result};

/// Statcast game type of regular-season games
const REGULAR_SEASON: &str = "R";

/// Client for baseballsavant.mlb.com
pub struct SavantClient {
    client: reqwest::blocking::Client,
    base_url: String,
    retry_attempts: u32,
    label_direction: LabelDirection,
    /// Optional cache directory for downloaded CSV files
    cache_dir: Option<PathBuf>,
    /// If true, only use cache (no network requests)
    offline_only: bool,
}

impl SavantClient {
    pub fn new(client: reqwest::blocking::Client, config: &DataConfig) -> Self {
        let mut savant = SavantClient {
            client,
            base_url: config.savant_url.trim_end_matches('/').to_string(),
            retry_attempts: config.retry_attempts,
            label_direction: config.label_direction,
            cache_dir: None,
            offline_only: false,
        };
        if let Some(dir) = &config.cache_dir {
            savant = savant.with_cache(dir);
        }
        savant.offline_only(config.offline)
    }

    /// Create client with a cache directory
    pub fn with_cache<P: AsRef<Path>>(mut self, cache_dir: P) -> Self {
        self.cache_dir = Some(cache_dir.as_ref().to_path_buf());
        self
    }

    /// Set offline-only mode (no network requests, cache must exist)
    pub fn offline_only(mut self, offline: bool) -> Self {
        self.offline_only = offline;
        self
    }

    /// Statcast search URL for one pitcher's regular-season pitches
    pub fn search_url(&self, pitcher: PitcherId, window: &DateWindow) -> String {
        format!(
            "{}/statcast_search/csv?all=true&type=details&player_type=pitcher\
             &hfGT=R%7C&min_pitches=0&min_results=0\
             &pitchers_lookup%5B%5D={}&game_date_gt={}&game_date_lt={}",
            self.base_url,
            pitcher.0,
            window.start_str(),
            window.end_str()
        )
    }

    /// Get the cache file path for a pitcher and window
    fn cache_path(&self, pitcher: PitcherId, window: &DateWindow) -> Option<PathBuf> {
        self.cache_dir.as_ref().map(|dir| {
            dir.join(format!(
                "savant_{}_{}_{}.csv",
                pitcher.0,
                window.start_str(),
                window.end_str()
            ))
        })
    }

    /// Load CSV from cache if available
    fn load_from_cache(&self, pitcher: PitcherId, window: &DateWindow) -> Option<String> {
        let path = self.cache_path(pitcher, window)?;
        if path.exists() {
            log::debug!("Loading from cache: {}", path.display());
            std::fs::read_to_string(&path).ok()
        } else {
            None
        }
    }

    /// Save CSV to cache
    fn save_to_cache(&self, pitcher: PitcherId, window: &DateWindow, body: &str) -> Result<()> {
        if let Some(path) = self.cache_path(pitcher, window) {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(&path, body)?;
            log::debug!("Saved to cache: {}", path.display());
        }
        Ok(())
    }

    fn download(&self, url: &str) -> Result<String> {
        log::debug!("GET {}", url);
        let resp = self.client.get(url).send()?;
        if !resp.status().is_success() {
            return Err(PitchError::Retrieval {
                data_source: DataSource::Savant,
                message: format!("search returned {}", resp.status()),
            });
        }
        Ok(resp.text()?)
    }

    fn fetch_csv(&self, pitcher: PitcherId, window: &DateWindow) -> Result<String> {
        if let Some(body) = self.load_from_cache(pitcher, window) {
            return Ok(body);
        }
        if self.offline_only {
            return Err(PitchError::Retrieval {
                data_source: DataSource::Savant,
                message: format!("offline mode and no cached history for {} ({})", pitcher, window),
            });
        }

        let url = self.search_url(pitcher, window);
        let body = with_retry(|| self.download(&url), self.retry_attempts)?;
        self.save_to_cache(pitcher, window, &body)?;
        Ok(body)
    }
}

impl PitchHistoryProvider for SavantClient {
    fn source(&self) -> DataSource {
        DataSource::Savant
    }

    fn fetch_history(&self, pitcher: PitcherId, window: &DateWindow) -> Result<Vec<RawPitchRow>> {
        if window.is_empty() {
            log::warn!("Empty history window {} for {}", window, pitcher);
            return Ok(Vec::new());
        }

        log::info!("Fetching Statcast history for {} ({})", pitcher, window);
        let body = self.fetch_csv(pitcher, window)?;
        let mut rows = parse_statcast_csv(body.as_bytes())?;
        label_at_bats(&mut rows, self.label_direction);
        log::info!("Loaded {} regular-season pitches for {}", rows.len(), pitcher);
        Ok(rows)
    }
}

/// Columns of a Statcast "details" export that matter here
#[derive(Debug, Deserialize)]
struct StatcastRecord {
    pitch_type: Option<String>,
    game_type: Option<String>,
    game_pk: Option<i64>,
    at_bat_number: Option<u32>,
    pitch_number: Option<u32>,
    balls: Option<u8>,
    strikes: Option<u8>,
    outs_when_up: Option<u8>,
    inning: Option<u32>,
    fld_score: Option<i32>,
    bat_score: Option<i32>,
    stand: Option<String>,
}

impl StatcastRecord {
    fn into_row(self) -> Option<RawPitchRow> {
        Some(RawPitchRow {
            game_pk: self.game_pk?,
            at_bat_number: self.at_bat_number?,
            pitch_number: self.pitch_number.unwrap_or(0),
            balls: self.balls?,
            strikes: self.strikes?,
            outs: self.outs_when_up?,
            inning: self.inning?,
            margin: self.fld_score.zip(self.bat_score).map(|(fld, bat)| fld - bat),
            bat_side: self.stand.unwrap_or_default(),
            pitch_type: self.pitch_type.filter(|p| !p.trim().is_empty()),
            last_pitch_type: String::new(),
        })
    }
}

/// Parse a Statcast CSV export into regular-season rows, in file order.
///
/// `last_pitch_type` is left empty; see [`label_at_bats`].
pub fn parse_statcast_csv<R: Read>(reader: R) -> Result<Vec<RawPitchRow>> {
    let mut csv_reader = csv::ReaderBuilder::new().flexible(true).from_reader(reader);
    let mut rows = Vec::new();
    let mut skipped = 0usize;

    for record in csv_reader.deserialize::<StatcastRecord>() {
        let record = record?;
        if record.game_type.as_deref() != Some(REGULAR_SEASON) {
            continue;
        }
        match record.into_row() {
            Some(row) => rows.push(row),
            None => skipped += 1,
        }
    }

    if skipped > 0 {
        log::debug!("Skipped {} Statcast rows with missing situation fields", skipped);
    }
    Ok(rows)
}
