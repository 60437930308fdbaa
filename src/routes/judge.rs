use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, post},
};
use validator::Validate;

use crate::{
    dto::judge::{SubmitCodeRequest, VerdictResponse},
    error::AppError,
    services::judge_service::{self, Submission},
    state::SharedState,
};

/// Routes forwarding submissions to the judging service.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/judge/submissions", post(submit_code))
        .route("/judge/submissions/{token}", get(get_verdict))
}

/// Submit source code for judging and wait for the verdict.
#[utoipa::path(
    post,
    path = "/judge/submissions",
    tag = "judge",
    request_body = SubmitCodeRequest,
    responses(
        (status = 200, description = "Verdict settled", body = VerdictResponse),
        (status = 502, description = "Judging failed or timed out")
    )
)]
pub async fn submit_code(
    State(state): State<SharedState>,
    Json(payload): Json<SubmitCodeRequest>,
) -> Result<Json<VerdictResponse>, AppError> {
    payload.validate()?;

    let submission = Submission {
        source_code: payload.source_code,
        language_id: payload.language_id,
        stdin: payload.stdin,
        expected_output: payload.expected_output,
    };

    let config = state.config();
    let judge = state.judge();
    let token = judge.submit(submission).await?;
    let verdict = judge_service::await_verdict(
        judge.as_ref(),
        &token,
        config.judge_poll_attempts,
        config.judge_poll_interval,
    )
    .await?;

    Ok(Json(VerdictResponse::from_verdict(token, verdict)))
}

/// Fetch the current verdict state for a submission token.
#[utoipa::path(
    get,
    path = "/judge/submissions/{token}",
    tag = "judge",
    params(("token" = String, Path, description = "Submission token")),
    responses(
        (status = 200, description = "Verdict state", body = VerdictResponse),
        (status = 502, description = "Judging service error")
    )
)]
pub async fn get_verdict(
    State(state): State<SharedState>,
    Path(token): Path<String>,
) -> Result<Json<VerdictResponse>, AppError> {
    let verdict = state.judge().fetch(token.clone()).await?;
    Ok(Json(VerdictResponse::from_verdict(token, verdict)))
}
