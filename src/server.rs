//! Axum HTTP server: strategy computation and the saved-strategy archive.
//!
//! Strategy searches are CPU-bound and run on tokio's blocking pool. Each
//! request gets its own solver caches, so concurrent requests never interact,
//! and a deadline of `search_timeout` from arrival; a search that misses it is
//! abandoned with `503`. History mutations rewrite the archive file, so they
//! run on the blocking pool too.
//!
//! ## Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | GET | `/health` | Health check |
//! | POST | `/api/strategy` | Top strategies for explicit tyre predictions |
//! | GET | `/api/strategy` | Top strategies for a circuit and conditions |
//! | POST | `/api/history` | Archive a strategy |
//! | GET | `/api/history` | List archived strategies |
//! | DELETE | `/api/history/{id}` | Remove an archived strategy |

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{delete, get},
    Json, Router,
};
use serde::Deserialize;
use tower_http::cors::{Any, CorsLayer};

use crate::api_computations::{
    compute_strategies_for_conditions, compute_strategy_response, StrategyRequest,
};
use crate::error::RequestError;
use crate::history::{HistoryStore, NewSavedStrategy};
use crate::predictions::{PredictionQuery, PredictionSource};
use crate::types::{RaceStrategy, SavedStrategy, SearchPolicy};

/// Shared, read-mostly server state.
pub struct AppContext {
    pub policy: SearchPolicy,
    /// Wall-clock budget for one strategy search.
    pub search_timeout: Duration,
    pub predictions: Option<Arc<dyn PredictionSource>>,
    pub history: HistoryStore,
}

pub type AppState = Arc<AppContext>;

pub fn create_router(ctx: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(handle_health_check))
        .route(
            "/api/strategy",
            get(handle_get_strategy).post(handle_post_strategy),
        )
        .route(
            "/api/history",
            get(handle_list_history).post(handle_save_history),
        )
        .route("/api/history/{id}", delete(handle_delete_history))
        .layer(cors)
        .with_state(ctx)
}

// ── Request/Response types ──────────────────────────────────────────

#[derive(Deserialize)]
struct StrategyQuery {
    #[serde(default = "default_circuit")]
    circuit: String,
    #[serde(default = "default_laps")]
    laps: i64,
    #[serde(default = "default_air_temp")]
    air_temp: f64,
    #[serde(default = "default_track_temp")]
    track_temp: f64,
}

fn default_circuit() -> String {
    "Bahrain Grand Prix".to_string()
}

fn default_laps() -> i64 {
    57
}

fn default_air_temp() -> f64 {
    30.0
}

fn default_track_temp() -> f64 {
    45.0
}

type ErrorResponse = (StatusCode, Json<serde_json::Value>);

fn error_response(status: StatusCode, msg: &str) -> ErrorResponse {
    (status, Json(serde_json::json!({ "error": msg })))
}

fn request_error_response(err: RequestError) -> ErrorResponse {
    let status = match err {
        RequestError::UnknownCircuit(_) | RequestError::HistoryNotFound(_) => StatusCode::NOT_FOUND,
        RequestError::SearchTimedOut => StatusCode::SERVICE_UNAVAILABLE,
        _ => StatusCode::BAD_REQUEST,
    };
    error_response(status, &err.to_string())
}

async fn run_blocking<T, F>(f: F) -> Result<T, ErrorResponse>
where
    F: FnOnce() -> Result<T, RequestError> + Send + 'static,
    T: Send + 'static,
{
    match tokio::task::spawn_blocking(f).await {
        Ok(result) => result.map_err(request_error_response),
        Err(e) => {
            tracing::error!(error = %e, "blocking task failed");
            Err(error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal task failed",
            ))
        }
    }
}

// ── Strategy handlers ───────────────────────────────────────────────

async fn handle_health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "OK" }))
}

async fn handle_post_strategy(
    State(ctx): State<AppState>,
    Json(req): Json<StrategyRequest>,
) -> Result<Json<Vec<RaceStrategy>>, ErrorResponse> {
    tracing::info!(
        total_laps = req.total_laps,
        compounds = req.tyres.len(),
        "strategy request"
    );
    let deadline = Instant::now() + ctx.search_timeout;
    let policy = ctx.policy.clone();
    let strategies =
        run_blocking(move || compute_strategy_response(&req, &policy, deadline)).await?;
    Ok(Json(strategies))
}

async fn handle_get_strategy(
    State(ctx): State<AppState>,
    Query(params): Query<StrategyQuery>,
) -> Result<Json<Vec<RaceStrategy>>, ErrorResponse> {
    let Some(source) = ctx.predictions.clone() else {
        return Err(error_response(
            StatusCode::SERVICE_UNAVAILABLE,
            "No tyre prediction source configured",
        ));
    };

    tracing::info!(
        circuit = %params.circuit,
        laps = params.laps,
        air_temp = params.air_temp,
        track_temp = params.track_temp,
        "strategy request for conditions"
    );
    let deadline = Instant::now() + ctx.search_timeout;
    let policy = ctx.policy.clone();
    let query = PredictionQuery {
        circuit: params.circuit,
        air_temp: params.air_temp,
        track_temp: params.track_temp,
    };
    let laps = params.laps;
    let (_, strategies) = run_blocking(move || {
        compute_strategies_for_conditions(source.as_ref(), &query, laps, &policy, deadline)
    })
    .await?;
    Ok(Json(strategies))
}

// ── History handlers ────────────────────────────────────────────────

async fn handle_save_history(
    State(ctx): State<AppState>,
    Json(new): Json<NewSavedStrategy>,
) -> Result<Json<SavedStrategy>, ErrorResponse> {
    let saved = run_blocking(move || Ok(ctx.history.save(new))).await?;
    Ok(Json(saved))
}

async fn handle_list_history(State(ctx): State<AppState>) -> Json<Vec<SavedStrategy>> {
    Json(ctx.history.list())
}

async fn handle_delete_history(
    State(ctx): State<AppState>,
    Path(id): Path<u64>,
) -> Result<StatusCode, ErrorResponse> {
    run_blocking(move || {
        if ctx.history.delete(id) {
            Ok(StatusCode::NO_CONTENT)
        } else {
            Err(RequestError::HistoryNotFound(id))
        }
    })
    .await
}
