//! HTTP API endpoints for playing matches.

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use std::sync::Arc;

use crate::error::{ArenaError, ArenaResult};
use crate::protocol::{
    ErrorResponse, FinalReportResponse, MatchView, OptionsResponse, StartMatchRequest,
    SubmitTurnRequest, TurnResponse,
};
use crate::state::AppState;

impl IntoResponse for ArenaError {
    fn into_response(self) -> Response {
        let status = match &self {
            ArenaError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            ArenaError::MatchNotFound(_) => StatusCode::NOT_FOUND,
            ArenaError::InvalidStateTransition { .. } | ArenaError::TurnInProgress(_) => {
                StatusCode::CONFLICT
            }
            ArenaError::ScoringUnavailable(_)
            | ArenaError::GenerationUnavailable(_)
            | ArenaError::ReportUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        };
        if status.is_server_error() {
            tracing::error!("Request failed: {}", self);
        } else {
            tracing::debug!("Request rejected: {}", self);
        }

        let body = ErrorResponse {
            code: self.code().to_string(),
            msg: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

/// Unwrap a JSON body, reporting malformed input as INVALID_INPUT
fn body<T>(payload: Result<Json<T>, JsonRejection>) -> ArenaResult<T> {
    payload
        .map(|Json(value)| value)
        .map_err(|rejection| ArenaError::InvalidInput(rejection.body_text()))
}

/// GET /healthz
pub async fn healthz() -> &'static str {
    "ok"
}

/// List personas, difficulties, stances and combat modes.
///
/// GET /api/options
pub async fn get_options() -> Json<OptionsResponse> {
    Json(OptionsResponse::current())
}

/// Start a new match; the response already contains the opening statement.
///
/// POST /api/matches
pub async fn start_match(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<StartMatchRequest>, JsonRejection>,
) -> ArenaResult<(StatusCode, Json<MatchView>)> {
    let request = body(payload)?;
    let started = state.start_match(request.into()).await?;
    Ok((StatusCode::CREATED, Json(MatchView::from(&started))))
}

/// GET /api/matches/{id}
pub async fn get_match(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ArenaResult<Json<MatchView>> {
    let current = state.get_match(&id).await?;
    Ok(Json(MatchView::from(&current)))
}

/// Submit the user's argument for this turn.
///
/// POST /api/matches/{id}/turns
pub async fn submit_turn(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    payload: Result<Json<SubmitTurnRequest>, JsonRejection>,
) -> ArenaResult<Json<TurnResponse>> {
    let request = body(payload)?;
    let result = state.submit_turn(&id, &request.argument).await?;
    Ok(Json(TurnResponse::from(result)))
}

/// POST /api/matches/{id}/quit
pub async fn quit_match(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ArenaResult<Json<MatchView>> {
    let ended = state.quit_match(&id).await?;
    Ok(Json(MatchView::from(&ended)))
}

/// Discard the match and start a new one with the same settings.
///
/// POST /api/matches/{id}/restart
pub async fn restart_match(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ArenaResult<(StatusCode, Json<MatchView>)> {
    let fresh = state.restart_match(&id).await?;
    Ok((StatusCode::CREATED, Json(MatchView::from(&fresh))))
}

/// DELETE /api/matches/{id}
pub async fn delete_match(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ArenaResult<StatusCode> {
    state.remove_match(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Coaching report for a finished match.
///
/// GET /api/matches/{id}/report
///
/// `report` is null when the generator is unavailable; asking again retries.
pub async fn final_report(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ArenaResult<Json<FinalReportResponse>> {
    let final_report = state.final_report(&id).await?;
    Ok(Json(FinalReportResponse::new(&id, final_report)))
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/api/options", get(get_options))
        .route("/api/matches", post(start_match))
        .route("/api/matches/{id}", get(get_match).delete(delete_match))
        .route("/api/matches/{id}/turns", post(submit_turn))
        .route("/api/matches/{id}/quit", post(quit_match))
        .route("/api/matches/{id}/restart", post(restart_match))
        .route("/api/matches/{id}/report", get(final_report))
        .with_state(state)
}
