//! MLB Stats API client
//!
//! Reads the live game feed for the at-bat in progress and the daily schedule
//! for games in progress.

use chrono::NaiveDate;
use serde::de::DeserializeOwned;
use serde::Deserialize;

use super::{with_retry, GameStateProvider, ScheduleProvider};
use crate::features::RawGameSnapshot;
use crate::{DataConfig, DataSource, GameId, LastPitchScope, LiveGame, PitchError, Result};

/// Schedule state of a game that is being played
const IN_PROGRESS: &str = "In Progress";

/// Client for statsapi.mlb.com
pub struct StatsApiClient {
    client: reqwest::blocking::Client,
    base_url: String,
    retry_attempts: u32,
    last_pitch_scope: LastPitchScope,
}

impl StatsApiClient {
    pub fn new(client: reqwest::blocking::Client, config: &DataConfig) -> Self {
        StatsApiClient {
            client,
            base_url: config.stats_api_url.trim_end_matches('/').to_string(),
            retry_attempts: config.retry_attempts,
            last_pitch_scope: config.last_pitch_scope,
        }
    }

    fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        log::debug!("GET {}", url);
        let resp = self.client.get(url).send()?;
        if !resp.status().is_success() {
            return Err(PitchError::Retrieval {
                data_source: DataSource::StatsApi,
                message: format!("{} returned {}", url, resp.status()),
            });
        }
        Ok(resp.json()?)
    }
}

impl GameStateProvider for StatsApiClient {
    fn source(&self) -> DataSource {
        DataSource::StatsApi
    }

    fn fetch_snapshot(&self, game: GameId) -> Result<RawGameSnapshot> {
        let url = format!("{}/api/v1.1/game/{}/feed/live", self.base_url, game.0);
        log::info!("Fetching live feed for {}", game);
        let feed: LiveFeed = with_retry(|| self.get_json(&url), self.retry_attempts)?;
        Ok(snapshot_from_feed(game, &feed, self.last_pitch_scope))
    }
}

impl ScheduleProvider for StatsApiClient {
    fn live_games(&self, date: NaiveDate) -> Result<Vec<LiveGame>> {
        let day = date.format("%Y-%m-%d");
        let url = format!(
            "{}/api/v1/schedule?sportId=1&startDate={}&endDate={}",
            self.base_url, day, day
        );
        log::info!("Fetching schedule for {}", day);
        let schedule: Schedule = with_retry(|| self.get_json(&url), self.retry_attempts)?;
        Ok(live_games_from_schedule(&schedule))
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LiveFeed {
    #[serde(default)]
    pub live_data: Option<LiveData>,
}

#[derive(Debug, Default, Deserialize)]
pub struct LiveData {
    #[serde(default)]
    pub plays: Option<Plays>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Plays {
    #[serde(default)]
    pub all_plays: Vec<Play>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Play {
    pub count: Option<Count>,
    pub matchup: Option<Matchup>,
    pub about: Option<About>,
    pub result: Option<PlayResult>,
    #[serde(default)]
    pub play_events: Vec<PlayEvent>,
}

#[derive(Debug, Default, Deserialize)]
pub struct Count {
    pub balls: Option<u8>,
    pub strikes: Option<u8>,
    pub outs: Option<u8>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Matchup {
    pub bat_side: Option<CodeDescription>,
    pub pitcher: Option<PersonRef>,
}

#[derive(Debug, Default, Deserialize)]
pub struct CodeDescription {
    pub code: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct PersonRef {
    pub id: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct About {
    pub inning: Option<u32>,
    pub half_inning: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayResult {
    pub home_score: Option<u32>,
    pub away_score: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
pub struct PlayEvent {
    pub details: Option<EventDetails>,
}

#[derive(Debug, Default, Deserialize)]
pub struct EventDetails {
    #[serde(rename = "type")]
    pub pitch_type: Option<CodeDescription>,
}

impl PlayEvent {
    fn pitch_code(&self) -> Option<&str> {
        self.details
            .as_ref()?
            .pitch_type
            .as_ref()?
            .code
            .as_deref()
    }
}

/// Extract the raw at-bat state from a live feed.
///
/// The at-bat in progress is the last entry of `allPlays`. An empty feed
/// yields a snapshot with no pitcher.
pub fn snapshot_from_feed(game: GameId, feed: &LiveFeed, scope: LastPitchScope) -> RawGameSnapshot {
    let plays: &[Play] = feed
        .live_data
        .as_ref()
        .and_then(|d| d.plays.as_ref())
        .map(|p| p.all_plays.as_slice())
        .unwrap_or_default();

    let Some(current) = plays.last() else {
        log::warn!("Live feed for {} has no plays", game);
        return RawGameSnapshot::new(game);
    };

    let last_pitch_code = match scope {
        LastPitchScope::Game => plays
            .iter()
            .flat_map(|play| play.play_events.iter())
            .filter_map(PlayEvent::pitch_code)
            .last(),
        LastPitchScope::AtBat => current
            .play_events
            .iter()
            .filter_map(PlayEvent::pitch_code)
            .last(),
    };

    let count = current.count.as_ref();
    let matchup = current.matchup.as_ref();
    let about = current.about.as_ref();
    let result = current.result.as_ref();

    RawGameSnapshot {
        game_id: game,
        pitcher_id: matchup.and_then(|m| m.pitcher.as_ref()).and_then(|p| p.id),
        balls: count.and_then(|c| c.balls),
        strikes: count.and_then(|c| c.strikes),
        outs: count.and_then(|c| c.outs),
        inning: about.and_then(|a| a.inning),
        half_inning: about.and_then(|a| a.half_inning.clone()),
        bat_side: matchup
            .and_then(|m| m.bat_side.as_ref())
            .and_then(|s| s.description.clone().or_else(|| s.code.clone())),
        home_score: result.and_then(|r| r.home_score),
        away_score: result.and_then(|r| r.away_score),
        last_pitch_code: last_pitch_code.map(str::to_string),
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct Schedule {
    #[serde(default)]
    pub dates: Vec<ScheduleDate>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ScheduleDate {
    #[serde(default)]
    pub games: Vec<ScheduleGame>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleGame {
    pub game_pk: i64,
    pub status: Option<GameStatus>,
    pub teams: Option<ScheduleTeams>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameStatus {
    pub detailed_state: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ScheduleTeams {
    pub away: Option<ScheduleTeam>,
    pub home: Option<ScheduleTeam>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ScheduleTeam {
    pub team: Option<NamedRef>,
}

#[derive(Debug, Default, Deserialize)]
pub struct NamedRef {
    pub name: Option<String>,
}

fn team_name(team: Option<&ScheduleTeam>) -> String {
    team.and_then(|t| t.team.as_ref())
        .and_then(|t| t.name.clone())
        .unwrap_or_else(|| "Unknown".to_string())
}

/// Games whose detailed state is "In Progress"
pub fn live_games_from_schedule(schedule: &Schedule) -> Vec<LiveGame> {
    schedule
        .dates
        .iter()
        .flat_map(|d| d.games.iter())
        .filter(|g| {
            g.status
                .as_ref()
                .and_then(|s| s.detailed_state.as_deref())
                == Some(IN_PROGRESS)
        })
        .map(|g| {
            let teams = g.teams.as_ref();
            LiveGame {
                game_pk: g.game_pk,
                away_team: team_name(teams.and_then(|t| t.away.as_ref())),
                home_team: team_name(teams.and_then(|t| t.home.as_ref())),
            }
        })
        .collect()
}
