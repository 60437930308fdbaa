use std::convert::Infallible;

use axum::{
    Router,
    extract::{Path, State},
    response::sse::Sse,
    routing::get,
};
use futures::Stream;
use tracing::info;
use uuid::Uuid;

use crate::{error::AppError, services::sse_service, state::SharedState};

#[utoipa::path(
    get,
    path = "/battles/{id}/events",
    tag = "sse",
    params(("id" = Uuid, Path, description = "Battle identifier")),
    responses((status = 200, description = "Battle SSE stream", content_type = "text/event-stream", body = String))
)]
/// Stream one battle's events, starting with a snapshot of its current state.
pub async fn battle_stream(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Sse<impl Stream<Item = Result<axum::response::sse::Event, Infallible>>>, AppError> {
    let (receiver, snapshot) = sse_service::subscribe_battle(&state, id).await?;
    info!(battle_id = %id, "new battle SSE connection");
    Ok(sse_service::to_sse_stream(snapshot, receiver))
}

#[utoipa::path(
    get,
    path = "/rooms/{code}/events",
    tag = "sse",
    params(("code" = String, Path, description = "Room join code")),
    responses((status = 200, description = "Room SSE stream", content_type = "text/event-stream", body = String))
)]
/// Stream one room's events, starting with a snapshot of its current state.
pub async fn room_stream(
    State(state): State<SharedState>,
    Path(code): Path<String>,
) -> Result<Sse<impl Stream<Item = Result<axum::response::sse::Event, Infallible>>>, AppError> {
    let (receiver, snapshot) = sse_service::subscribe_room(&state, &code).await?;
    info!(code, "new room SSE connection");
    Ok(sse_service::to_sse_stream(snapshot, receiver))
}

/// Configure the SSE endpoints.
pub fn router() -> Router<SharedState> {
    Router::<SharedState>::new()
        .route("/battles/{id}/events", get(battle_stream))
        .route("/rooms/{code}/events", get(room_stream))
}
