use axum::Router;

use crate::state::SharedState;

/// Matchmaking endpoints.
pub mod battle;
/// OpenAPI / Swagger UI endpoints.
pub mod docs;
/// Health probe endpoints.
pub mod health;
/// Judging submission endpoints.
pub mod judge;
/// Contest room endpoints.
pub mod room;
/// Server-sent events endpoints.
pub mod sse;

/// Compose all route trees, wiring in shared state and documentation routes.
pub fn router(state: SharedState) -> Router<()> {
    let api_router = health::router()
        .merge(battle::router())
        .merge(room::router())
        .merge(judge::router())
        .merge(sse::router());

    let docs_router = docs::router(state.clone());

    api_router.merge(docs_router).with_state(state)
}
