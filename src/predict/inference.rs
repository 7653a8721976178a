//! End-to-end next-pitch prediction

use crate::data::calendar::{Calendar, DateWindow};
use crate::data::scrapers::{GameStateProvider, PitchHistoryProvider};
use crate::features::{filter_history, RawPitchRow};
use crate::predict::estimate::{confidence_score, pitch_distribution};
use crate::predict::neighbors::select_pool;
use crate::predict::scoring::score_history;
use crate::{
    CurrentState, EngineConfig, GameId, HistoricalPitch, PitcherId, PredictionResult, Result,
    NO_PITCH,
};

/// Predictor for the next pitch of a live game
pub struct Predictor<G, H> {
    games: G,
    history: H,
    calendar: Calendar,
    config: EngineConfig,
}

impl<G, H> Predictor<G, H>
where
    G: GameStateProvider,
    H: PitchHistoryProvider,
{
    /// Create a new predictor
    pub fn new(games: G, history: H, calendar: Calendar, config: EngineConfig) -> Self {
        Predictor {
            games,
            history,
            calendar,
            config,
        }
    }

    /// Predict the next pitch of a game, using the pitcher's history from
    /// season start up to yesterday
    pub fn predict(&self, game: GameId) -> Result<PredictionResult> {
        let window = self.calendar.current_window()?;
        self.predict_in_window(game, &window)
    }

    /// Predict the next pitch of a game against history from `window`
    pub fn predict_in_window(&self, game: GameId, window: &DateWindow) -> Result<PredictionResult> {
        let raw = self.games.fetch_snapshot(game)?;
        let state = CurrentState::from_snapshot(&raw)?;
        log::info!(
            "{} ({}): {} facing count {}-{}, {} out, inning {}, last pitch {}",
            game,
            self.games.source(),
            state.pitcher_id,
            state.balls,
            state.strikes,
            state.outs,
            state.inning,
            state.last_pitch_type
        );

        log::debug!("History for {} from {}", state.pitcher_id, self.history.source());
        let rows = self.history.fetch_history(state.pitcher_id, window)?;
        predict_with_history(&state, rows, &self.config)
    }

    /// A pitcher's usable history in a window, without the minimum check
    pub fn pitcher_history(
        &self,
        pitcher: PitcherId,
        window: &DateWindow,
    ) -> Result<(usize, Vec<HistoricalPitch>)> {
        log::debug!("History for {} from {}", pitcher, self.history.source());
        let rows = self.history.fetch_history(pitcher, window)?;
        let fetched = rows.len();
        Ok((fetched, filter_history(rows, 0)?))
    }

    pub fn calendar(&self) -> &Calendar {
        &self.calendar
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }
}

/// Run the matching engine on a normalized state and raw history rows
pub fn predict_with_history(
    state: &CurrentState,
    rows: Vec<RawPitchRow>,
    config: &EngineConfig,
) -> Result<PredictionResult> {
    let history = filter_history(rows, config.min_history)?;
    let scored = score_history(history, state, &config.weights);
    let pool = select_pool(scored, config.pool_size);

    let pitch_probabilities = pitch_distribution(&pool);
    // One-shot: computed after the whole pool has been summed, never per row
    let confidence = confidence_score(&pool, config.confidence_divisor);

    Ok(PredictionResult {
        balls: state.balls,
        strikes: state.strikes,
        outs: state.outs,
        inning: state.inning,
        away_score: state.away_score,
        home_score: state.home_score,
        last_pitch_type: state.last_pitch_type.clone(),
        confidence_score: confidence,
        pitch_probabilities,
    })
}

/// Format a prediction for display
pub fn format_prediction(game: GameId, result: &PredictionResult) -> String {
    let mut mix: Vec<_> = result.pitch_probabilities.iter().collect();
    mix.sort_by(|a, b| b.1.total_cmp(a.1).then_with(|| a.0.cmp(b.0)));

    let likely = result
        .most_likely()
        .map(|(code, pct)| format!("{} ({:.2}%)", code, pct))
        .unwrap_or_else(|| NO_PITCH.to_string());

    let mut lines = String::new();
    for (code, pct) in mix {
        lines.push_str(&format!("│    {:<6} {:>6.2}%\n", code, pct));
    }

    format!(
        r#"
┌─────────────────────────────────────────────────┐
│  {}  inning {}, away {} - home {}
├─────────────────────────────────────────────────┤
│  Count:            {}-{}, {} out
│  Last pitch:       {}
│  Confidence:       {}%
│  Most likely:      {}
│  Next pitch:
{}└─────────────────────────────────────────────────┘
"#,
        game,
        result.inning,
        result.away_score,
        result.home_score,
        result.balls,
        result.strikes,
        result.outs,
        result.last_pitch_type,
        result.confidence_score,
        likely,
        lines
    )
}
