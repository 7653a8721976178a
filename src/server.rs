//! HTTP service
//!
//! Routes:
//! - `GET /healthz`
//! - `GET /live_games`
//! - `GET /predict_pitch?game_id=N`
//!
//! The data clients are blocking, so each request runs its retrieval and
//! scoring on tokio's blocking pool.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;

use crate::data::scrapers::{GameStateProvider, PitchHistoryProvider, ScheduleProvider};
use crate::predict::Predictor;
use crate::{GameId, LiveGame, PitchError, PredictionResult, Result};

type ApiError = (StatusCode, Json<Value>);

/// Shared state of the service
pub struct AppState<G, H, S> {
    predictor: Arc<Predictor<G, H>>,
    schedule: Arc<S>,
}

impl<G, H, S> Clone for AppState<G, H, S> {
    fn clone(&self) -> Self {
        AppState {
            predictor: Arc::clone(&self.predictor),
            schedule: Arc::clone(&self.schedule),
        }
    }
}

impl<G, H, S> AppState<G, H, S> {
    pub fn new(predictor: Predictor<G, H>, schedule: S) -> Self {
        AppState {
            predictor: Arc::new(predictor),
            schedule: Arc::new(schedule),
        }
    }
}

/// HTTP status for an engine or retrieval failure
fn status_for(err: &PitchError) -> StatusCode {
    match err {
        PitchError::InsufficientHistory { .. } | PitchError::MissingStateField(_) => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
        PitchError::NoPitcherOnMound(_) => StatusCode::CONFLICT,
        PitchError::Retrieval { .. }
        | PitchError::Http(_)
        | PitchError::Csv(_)
        | PitchError::Json(_)
        | PitchError::Parse(_) => StatusCode::BAD_GATEWAY,
        PitchError::Config(_) | PitchError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn api_error(err: PitchError) -> ApiError {
    log::warn!("Request failed: {}", err);
    (status_for(&err), Json(json!({ "error": err.user_message() })))
}

fn bad_request(message: &str) -> ApiError {
    (StatusCode::BAD_REQUEST, Json(json!({ "error": message })))
}

/// Run blocking work off the async executor
async fn run_blocking<T, F>(work: F) -> std::result::Result<T, ApiError>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T> + Send + 'static,
{
    match tokio::task::spawn_blocking(work).await {
        Ok(result) => result.map_err(api_error),
        Err(e) => {
            log::error!("Worker task failed: {}", e);
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "Internal error." })),
            ))
        }
    }
}

/// Parse the `game_id` query parameter
fn game_id_param(params: &HashMap<String, String>) -> std::result::Result<GameId, ApiError> {
    let raw = params
        .get("game_id")
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .ok_or_else(|| bad_request("Missing game_id"))?;
    raw.parse::<i64>()
        .map(GameId)
        .map_err(|_| bad_request("Invalid game_id"))
}

async fn healthz() -> &'static str {
    "OK"
}

async fn live_games<G, H, S>(
    State(state): State<AppState<G, H, S>>,
) -> std::result::Result<Json<Value>, ApiError>
where
    G: GameStateProvider + Send + Sync + 'static,
    H: PitchHistoryProvider + Send + Sync + 'static,
    S: ScheduleProvider + Send + Sync + 'static,
{
    let today = state.predictor.calendar().today();
    let schedule = Arc::clone(&state.schedule);
    let games: Vec<LiveGame> = run_blocking(move || schedule.live_games(today)).await?;

    if games.is_empty() {
        return Ok(Json(json!({ "message": "No live games currently." })));
    }
    Ok(Json(json!(games)))
}

async fn predict_pitch<G, H, S>(
    State(state): State<AppState<G, H, S>>,
    Query(params): Query<HashMap<String, String>>,
) -> std::result::Result<Json<PredictionResult>, ApiError>
where
    G: GameStateProvider + Send + Sync + 'static,
    H: PitchHistoryProvider + Send + Sync + 'static,
    S: ScheduleProvider + Send + Sync + 'static,
{
    let game = game_id_param(&params)?;
    let predictor = Arc::clone(&state.predictor);
    let result = run_blocking(move || predictor.predict(game)).await?;
    log::info!(
        "{}: confidence {}%, {} pitch types",
        game,
        result.confidence_score,
        result.pitch_probabilities.len()
    );
    Ok(Json(result))
}

/// Build the service router
pub fn router<G, H, S>(state: AppState<G, H, S>) -> Router
where
    G: GameStateProvider + Send + Sync + 'static,
    H: PitchHistoryProvider + Send + Sync + 'static,
    S: ScheduleProvider + Send + Sync + 'static,
{
    Router::new()
        .route("/healthz", get(healthz))
        .route("/live_games", get(live_games::<G, H, S>))
        .route("/predict_pitch", get(predict_pitch::<G, H, S>))
        .with_state(state)
}

/// Serve until the process is stopped
pub async fn serve<G, H, S>(bind_addr: &str, state: AppState<G, H, S>) -> Result<()>
where
    G: GameStateProvider + Send + Sync + 'static,
    H: PitchHistoryProvider + Send + Sync + 'static,
    S: ScheduleProvider + Send + Sync + 'static,
{
    let listener = tokio::net::TcpListener::bind(bind_addr).await?;
    log::info!("Listening on {}", bind_addr);
    axum::serve(listener, router(state)).await?;
    Ok(())
}
