use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get, post},
};
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    dto::battle::{BattleSummary, FindOpponentRequest, MatchResponse},
    error::AppError,
    services::matchmaking_service,
    state::SharedState,
};

/// Routes handling 1v1 matchmaking.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/battles/search", post(find_opponent))
        .route("/battles/{id}/search", delete(cancel_search))
        .route("/battles/{id}", get(get_battle))
}

/// Look for an opponent, claiming a waiting search or opening a new one.
#[utoipa::path(
    post,
    path = "/battles/search",
    tag = "battles",
    request_body = FindOpponentRequest,
    responses(
        (status = 200, description = "Matched or searching", body = MatchResponse),
        (status = 503, description = "No problems available or storage down")
    )
)]
pub async fn find_opponent(
    State(state): State<SharedState>,
    Json(payload): Json<FindOpponentRequest>,
) -> Result<Json<MatchResponse>, AppError> {
    payload.validate()?;
    let outcome =
        matchmaking_service::find_opponent(&state, payload.user_id, payload.display_name).await?;
    Ok(Json(outcome.into()))
}

#[derive(Debug, Deserialize, ToSchema)]
/// Identifies the caller of a cancel request.
pub struct CancelSearchRequest {
    /// Must match the battle id; only the initiator may cancel.
    pub user_id: Uuid,
}

/// Withdraw an open search.
#[utoipa::path(
    delete,
    path = "/battles/{id}/search",
    tag = "battles",
    params(("id" = Uuid, Path, description = "Battle identifier")),
    request_body = CancelSearchRequest,
    responses(
        (status = 204, description = "Search withdrawn (or already gone)"),
        (status = 409, description = "An opponent already joined")
    )
)]
pub async fn cancel_search(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<CancelSearchRequest>,
) -> Result<StatusCode, AppError> {
    matchmaking_service::cancel_search(&state, id, payload.user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Fetch one battle document.
#[utoipa::path(
    get,
    path = "/battles/{id}",
    tag = "battles",
    params(("id" = Uuid, Path, description = "Battle identifier")),
    responses(
        (status = 200, description = "Battle found", body = BattleSummary),
        (status = 404, description = "No such battle")
    )
)]
pub async fn get_battle(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<BattleSummary>, AppError> {
    let battle = matchmaking_service::get_battle(&state, id).await?;
    Ok(Json(battle.into()))
}
