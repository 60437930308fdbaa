use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    dao::models::{ProblemRefEntity, RoomEntity, RoomParticipantEntity, RoomStatus},
    dto::format_system_time,
    state::room::LeaderboardRow,
};

/// Payload used to create a new contest room.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct CreateRoomRequest {
    /// Identifier of the creating user, who becomes the room owner.
    pub user_id: Uuid,
    /// Name shown to other participants.
    #[validate(length(min = 1, max = 64))]
    pub display_name: String,
}

/// Payload used to join an existing room.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct JoinRoomRequest {
    /// Identifier of the joining user.
    pub user_id: Uuid,
    /// Name shown to other participants.
    #[validate(length(min = 1, max = 64))]
    pub display_name: String,
}

/// Contest configuration submitted by the room owner to start the clock.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct StartContestRequest {
    /// Identifier of the caller; must be the room owner.
    pub user_id: Uuid,
    /// Topics to draw problems from.
    #[validate(length(min = 1))]
    pub topics: Vec<String>,
    /// Difficulties to draw problems from.
    #[validate(length(min = 1))]
    pub difficulties: Vec<String>,
    /// Requested problem count.
    #[validate(range(min = 1, max = 4))]
    pub num_problems: u32,
}

/// Payload asking the server to end the contest.
#[derive(Debug, Deserialize, ToSchema)]
pub struct CompleteContestRequest {
    /// Identifier of the caller. Owners complete immediately; anyone else is
    /// honored only once the contest clock has elapsed.
    pub user_id: Uuid,
}

/// A judged-accepted solve reported for a room participant.
#[derive(Debug, Deserialize, ToSchema)]
pub struct ReportSolveRequest {
    /// Participant the solve belongs to.
    pub user_id: Uuid,
    /// Problem from the room's frozen set.
    pub problem_id: String,
    /// Seconds the participant spent on the problem.
    pub time_taken_secs: u64,
}

/// Public projection of a room document.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct RoomSummary {
    /// Short join code identifying the room.
    pub code: String,
    /// Lifecycle status.
    pub status: RoomStatus,
    /// Id of the room owner.
    pub created_by: Uuid,
    /// When the room was created (RFC 3339).
    pub created_at: String,
    /// When the contest started, if it has (RFC 3339).
    pub started_at: Option<String>,
    /// Topics the problem set was drawn from.
    pub topics: Vec<String>,
    /// Difficulties the problem set was drawn from.
    pub difficulties: Vec<String>,
    /// Size of the frozen problem set.
    pub num_problems: u32,
    /// The frozen problem set; empty until the contest starts.
    pub problems: Vec<ProblemRef>,
    /// Participants in join order.
    pub participants: Vec<RoomParticipantSummary>,
}

/// One problem of a room's frozen set.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ProblemRef {
    /// Catalog identifier (slug).
    pub id: String,
    /// Human readable problem name.
    pub name: String,
    /// Difficulty label.
    pub difficulty: String,
    /// Topic tags attached to the problem.
    pub topics: Vec<String>,
}

/// Public projection of one room participant.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct RoomParticipantSummary {
    /// Participant identifier.
    pub user_id: Uuid,
    /// Name shown to other participants.
    pub display_name: String,
    /// When the participant joined (RFC 3339).
    pub join_time: String,
    /// Ids of problems this participant has solved.
    pub solved_problem_ids: Vec<String>,
    /// Problems solved so far.
    pub total_solved: u32,
    /// Accumulated solve time in seconds.
    pub total_time_taken_secs: u64,
}

/// Room state plus the derived standings and clock.
#[derive(Debug, Serialize, ToSchema)]
pub struct RoomStateResponse {
    /// The room document.
    pub room: RoomSummary,
    /// Standings recomputed from the participant records.
    pub leaderboard: Vec<LeaderboardEntry>,
    /// Seconds left on the contest clock, saturating at zero.
    pub remaining_seconds: u64,
}

/// One row of the recomputed standings.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct LeaderboardEntry {
    /// Participant this row ranks.
    pub user_id: Uuid,
    /// Name shown to other participants.
    pub display_name: String,
    /// Problems solved so far.
    pub total_solved: u32,
    /// Accumulated solve time in seconds, the tie breaker.
    pub total_time_taken_secs: u64,
}

impl From<LeaderboardRow> for LeaderboardEntry {
    fn from(row: LeaderboardRow) -> Self {
        Self {
            user_id: row.user_id,
            display_name: row.display_name,
            total_solved: row.total_solved,
            total_time_taken_secs: row.total_time_taken_secs,
        }
    }
}

impl From<ProblemRefEntity> for ProblemRef {
    fn from(entity: ProblemRefEntity) -> Self {
        Self {
            id: entity.id,
            name: entity.name,
            difficulty: entity.difficulty,
            topics: entity.topics,
        }
    }
}

impl From<RoomParticipantEntity> for RoomParticipantSummary {
    fn from(entity: RoomParticipantEntity) -> Self {
        Self {
            user_id: entity.user_id,
            display_name: entity.display_name,
            join_time: format_system_time(entity.join_time),
            solved_problem_ids: entity.solved_problem_ids,
            total_solved: entity.total_solved,
            total_time_taken_secs: entity.total_time_taken_secs,
        }
    }
}

impl From<RoomEntity> for RoomSummary {
    fn from(entity: RoomEntity) -> Self {
        Self {
            code: entity.code,
            status: entity.status,
            created_by: entity.created_by,
            created_at: format_system_time(entity.created_at),
            started_at: entity.started_at.map(format_system_time),
            topics: entity.topics,
            difficulties: entity.difficulties,
            num_problems: entity.num_problems,
            problems: entity.problems.into_iter().map(Into::into).collect(),
            participants: entity.participants.into_iter().map(Into::into).collect(),
        }
    }
}
