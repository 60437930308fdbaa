use std::time::SystemTime;

use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, post},
};
use validator::Validate;

use crate::{
    dao::models::RoomEntity,
    dto::{
        room::{
            CompleteContestRequest, CreateRoomRequest, JoinRoomRequest, ReportSolveRequest,
            RoomStateResponse, StartContestRequest,
        },
        validation::validate_room_code,
    },
    error::AppError,
    services::{progress_service, room_service},
    state::{SharedState, room::leaderboard, room::remaining_seconds},
};

/// Routes handling contest room lifecycle and progress.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/rooms", post(create_room))
        .route("/rooms/{code}", get(get_room))
        .route("/rooms/{code}/join", post(join_room))
        .route("/rooms/{code}/start", post(start_contest))
        .route("/rooms/{code}/complete", post(complete_contest))
        .route("/rooms/{code}/solves", post(report_solve))
}

fn room_state(state: &SharedState, room: RoomEntity) -> RoomStateResponse {
    let entries = leaderboard(&room).into_iter().map(Into::into).collect();
    let remaining = remaining_seconds(&room, state.config().contest_duration, SystemTime::now());
    RoomStateResponse {
        room: room.into(),
        leaderboard: entries,
        remaining_seconds: remaining,
    }
}

fn checked_code(code: &str) -> Result<(), AppError> {
    validate_room_code(code).map_err(|err| AppError::BadRequest(err.to_string()))
}

/// Create a new contest room with a fresh join code.
#[utoipa::path(
    post,
    path = "/rooms",
    tag = "rooms",
    request_body = CreateRoomRequest,
    responses(
        (status = 200, description = "Room created", body = RoomStateResponse)
    )
)]
pub async fn create_room(
    State(state): State<SharedState>,
    Json(payload): Json<CreateRoomRequest>,
) -> Result<Json<RoomStateResponse>, AppError> {
    payload.validate()?;
    let room = room_service::create_room(&state, payload.user_id, payload.display_name).await?;
    Ok(Json(room_state(&state, room)))
}

/// Fetch a room along with its derived standings and clock.
#[utoipa::path(
    get,
    path = "/rooms/{code}",
    tag = "rooms",
    params(("code" = String, Path, description = "Room join code")),
    responses(
        (status = 200, description = "Room found", body = RoomStateResponse),
        (status = 404, description = "No such room")
    )
)]
pub async fn get_room(
    State(state): State<SharedState>,
    Path(code): Path<String>,
) -> Result<Json<RoomStateResponse>, AppError> {
    checked_code(&code)?;
    let room = room_service::get_room(&state, &code).await?;
    Ok(Json(room_state(&state, room)))
}

/// Join a room; joining twice is a no-op.
#[utoipa::path(
    post,
    path = "/rooms/{code}/join",
    tag = "rooms",
    params(("code" = String, Path, description = "Room join code")),
    request_body = JoinRoomRequest,
    responses(
        (status = 200, description = "Joined", body = RoomStateResponse),
        (status = 404, description = "No such room"),
        (status = 409, description = "Contest already completed")
    )
)]
pub async fn join_room(
    State(state): State<SharedState>,
    Path(code): Path<String>,
    Json(payload): Json<JoinRoomRequest>,
) -> Result<Json<RoomStateResponse>, AppError> {
    checked_code(&code)?;
    payload.validate()?;
    let room =
        room_service::join_room(&state, &code, payload.user_id, payload.display_name).await?;
    Ok(Json(room_state(&state, room)))
}

/// Start the contest with a frozen problem set (owner only).
#[utoipa::path(
    post,
    path = "/rooms/{code}/start",
    tag = "rooms",
    params(("code" = String, Path, description = "Room join code")),
    request_body = StartContestRequest,
    responses(
        (status = 200, description = "Contest started", body = RoomStateResponse),
        (status = 400, description = "Invalid contest configuration"),
        (status = 401, description = "Caller is not the room owner"),
        (status = 409, description = "Contest already started")
    )
)]
pub async fn start_contest(
    State(state): State<SharedState>,
    Path(code): Path<String>,
    Json(payload): Json<StartContestRequest>,
) -> Result<Json<RoomStateResponse>, AppError> {
    checked_code(&code)?;
    payload.validate()?;
    let room = room_service::start_contest(
        &state,
        &code,
        payload.user_id,
        payload.topics,
        payload.difficulties,
        payload.num_problems,
    )
    .await?;
    Ok(Json(room_state(&state, room)))
}

/// End the contest (owner, or anyone once the clock has elapsed).
#[utoipa::path(
    post,
    path = "/rooms/{code}/complete",
    tag = "rooms",
    params(("code" = String, Path, description = "Room join code")),
    request_body = CompleteContestRequest,
    responses(
        (status = 200, description = "Contest completed", body = RoomStateResponse),
        (status = 401, description = "Caller may not end the contest yet"),
        (status = 409, description = "Contest not started")
    )
)]
pub async fn complete_contest(
    State(state): State<SharedState>,
    Path(code): Path<String>,
    Json(payload): Json<CompleteContestRequest>,
) -> Result<Json<RoomStateResponse>, AppError> {
    checked_code(&code)?;
    let room = room_service::complete_contest(&state, &code, payload.user_id).await?;
    Ok(Json(room_state(&state, room)))
}

/// Credit a judged-accepted solve to a participant.
#[utoipa::path(
    post,
    path = "/rooms/{code}/solves",
    tag = "rooms",
    params(("code" = String, Path, description = "Room join code")),
    request_body = ReportSolveRequest,
    responses(
        (status = 200, description = "Solve credited", body = RoomStateResponse),
        (status = 404, description = "Room or participant not found"),
        (status = 409, description = "Already solved or contest not in progress")
    )
)]
pub async fn report_solve(
    State(state): State<SharedState>,
    Path(code): Path<String>,
    Json(payload): Json<ReportSolveRequest>,
) -> Result<Json<RoomStateResponse>, AppError> {
    checked_code(&code)?;
    let room = progress_service::report_solve(
        &state,
        &code,
        payload.user_id,
        &payload.problem_id,
        payload.time_taken_secs,
    )
    .await?;
    Ok(Json(room_state(&state, room)))
}
