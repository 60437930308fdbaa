use utoipa::OpenApi;

#[derive(OpenApi)]
/// Aggregated OpenAPI specification for the CodeVersus backend.
#[openapi(
    paths(
        crate::routes::health::healthcheck,
        crate::routes::battle::find_opponent,
        crate::routes::battle::cancel_search,
        crate::routes::battle::get_battle,
        crate::routes::room::create_room,
        crate::routes::room::get_room,
        crate::routes::room::join_room,
        crate::routes::room::start_contest,
        crate::routes::room::complete_contest,
        crate::routes::room::report_solve,
        crate::routes::judge::submit_code,
        crate::routes::judge::get_verdict,
        crate::routes::sse::battle_stream,
        crate::routes::sse::room_stream,
    ),
    components(
        schemas(
            crate::dto::health::HealthResponse,
            crate::dto::battle::FindOpponentRequest,
            crate::dto::battle::MatchResponse,
            crate::dto::battle::BattleSummary,
            crate::routes::battle::CancelSearchRequest,
            crate::dto::room::CreateRoomRequest,
            crate::dto::room::JoinRoomRequest,
            crate::dto::room::StartContestRequest,
            crate::dto::room::CompleteContestRequest,
            crate::dto::room::ReportSolveRequest,
            crate::dto::room::RoomSummary,
            crate::dto::room::RoomStateResponse,
            crate::dto::judge::SubmitCodeRequest,
            crate::dto::judge::VerdictResponse,
            crate::dao::models::BattleStatus,
            crate::dao::models::RoomStatus,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "battles", description = "1v1 matchmaking operations"),
        (name = "rooms", description = "Contest room lifecycle and progress"),
        (name = "judge", description = "Code judging submissions"),
        (name = "sse", description = "Server-sent events streams"),
    )
)]
pub struct ApiDoc;
