use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, post},
};
use validator::Validate;

use crate::{
    dto::matches::{
        CreateMatchRequest, LegFinishResponse, LiveMatchView, MatchReport, ThrowRequest,
        ThrowResponse, UndoRequest, UndoResponse,
    },
    error::AppError,
    services::match_service,
    state::SharedState,
};

/// Routes handling live match scoring operations.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/matches", post(create_match).get(list_matches))
        .route("/matches/{id}", get(get_match))
        .route("/matches/{id}/throws", post(record_throw))
        .route("/matches/{id}/throws/undo", post(undo_last_throw))
        .route("/matches/{id}/legs/finish", post(finish_leg))
        .route("/matches/{id}/finish", post(finish_match))
}

/// Open a new live match between two league players.
#[utoipa::path(
    post,
    path = "/matches",
    tag = "matches",
    request_body = CreateMatchRequest,
    responses(
        (status = 200, description = "Match created", body = LiveMatchView),
        (status = 400, description = "Unknown or duplicate player ids")
    )
)]
pub async fn create_match(
    State(state): State<SharedState>,
    Json(payload): Json<CreateMatchRequest>,
) -> Result<Json<LiveMatchView>, AppError> {
    payload.validate()?;
    let view = match_service::create_match(&state, payload).await?;
    Ok(Json(view))
}

/// Snapshot of every match currently live in the registry.
#[utoipa::path(
    get,
    path = "/matches",
    tag = "matches",
    responses(
        (status = 200, description = "Active matches", body = [LiveMatchView])
    )
)]
pub async fn list_matches(State(state): State<SharedState>) -> Json<Vec<LiveMatchView>> {
    Json(match_service::list_active_matches(&state).await)
}

/// Snapshot of one live match.
#[utoipa::path(
    get,
    path = "/matches/{id}",
    tag = "matches",
    params(("id" = u64, Path, description = "Identifier of the live match")),
    responses(
        (status = 200, description = "Match snapshot", body = LiveMatchView),
        (status = 404, description = "Match is not live")
    )
)]
pub async fn get_match(
    State(state): State<SharedState>,
    Path(id): Path<u64>,
) -> Result<Json<LiveMatchView>, AppError> {
    let view = match_service::get_match(&state, id).await?;
    Ok(Json(view))
}

/// Record one scoring call for the current thrower.
#[utoipa::path(
    post,
    path = "/matches/{id}/throws",
    tag = "matches",
    params(("id" = u64, Path, description = "Identifier of the live match")),
    request_body = ThrowRequest,
    responses(
        (status = 200, description = "Call applied or rejected", body = ThrowResponse),
        (status = 404, description = "Match is not live")
    )
)]
pub async fn record_throw(
    State(state): State<SharedState>,
    Path(id): Path<u64>,
    Json(payload): Json<ThrowRequest>,
) -> Result<Json<ThrowResponse>, AppError> {
    let response = match_service::record_throw(&state, id, payload).await?;
    Ok(Json(response))
}

/// Undo the most recent throw of a player within the current leg.
#[utoipa::path(
    post,
    path = "/matches/{id}/throws/undo",
    tag = "matches",
    params(("id" = u64, Path, description = "Identifier of the live match")),
    request_body = UndoRequest,
    responses(
        (status = 200, description = "Undo applied or rejected", body = UndoResponse),
        (status = 404, description = "Match is not live")
    )
)]
pub async fn undo_last_throw(
    State(state): State<SharedState>,
    Path(id): Path<u64>,
    Json(payload): Json<UndoRequest>,
) -> Result<Json<UndoResponse>, AppError> {
    let response = match_service::undo_last_throw(&state, id, payload).await?;
    Ok(Json(response))
}

/// Explicitly close the current leg once a player sits at exactly 0.
#[utoipa::path(
    post,
    path = "/matches/{id}/legs/finish",
    tag = "matches",
    params(("id" = u64, Path, description = "Identifier of the live match")),
    responses(
        (status = 200, description = "Leg closed", body = LegFinishResponse),
        (status = 404, description = "Match is not live"),
        (status = 409, description = "No player has checked out")
    )
)]
pub async fn finish_leg(
    State(state): State<SharedState>,
    Path(id): Path<u64>,
) -> Result<Json<LegFinishResponse>, AppError> {
    let response = match_service::finish_leg(&state, id).await?;
    Ok(Json(response))
}

/// Persist a finished match and evict it from the live registry.
#[utoipa::path(
    post,
    path = "/matches/{id}/finish",
    tag = "matches",
    params(("id" = u64, Path, description = "Identifier of the live match")),
    responses(
        (status = 200, description = "Match persisted", body = MatchReport),
        (status = 404, description = "Match is not live"),
        (status = 409, description = "Match not finished"),
        (status = 503, description = "Persistence backend unavailable")
    )
)]
pub async fn finish_match(
    State(state): State<SharedState>,
    Path(id): Path<u64>,
) -> Result<Json<MatchReport>, AppError> {
    let report = match_service::finish_match(&state, id).await?;
    Ok(Json(report))
}
