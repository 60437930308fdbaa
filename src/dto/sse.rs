use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::dto::{
    battle::BattleSummary,
    room::{LeaderboardEntry, RoomParticipantSummary, RoomSummary},
};

#[derive(Clone, Debug)]
/// Dispatched payload carried across SSE channels.
pub struct ServerEvent {
    pub event: Option<String>,
    pub data: String,
}

impl ServerEvent {
    /// Convenience wrapper that serialises `payload` into the SSE data field.
    pub fn json<E, T>(event: E, payload: &T) -> serde_json::Result<Self>
    where
        E: Into<Option<String>>,
        T: Serialize,
    {
        Ok(Self {
            event: event.into(),
            data: serde_json::to_string(payload)?,
        })
    }
}

#[derive(Debug, Serialize, ToSchema)]
/// Current battle document, sent first on every battle stream.
pub struct BattleSnapshotEvent {
    pub battle: BattleSummary,
}

#[derive(Debug, Serialize, ToSchema)]
/// Broadcast once when an opponent claims the search.
pub struct BattleFoundEvent {
    pub battle: BattleSummary,
}

#[derive(Debug, Serialize, ToSchema)]
/// Current room document plus standings, sent first on every room stream.
pub struct RoomSnapshotEvent {
    pub room: RoomSummary,
    pub leaderboard: Vec<LeaderboardEntry>,
    pub remaining_seconds: u64,
}

#[derive(Debug, Serialize, ToSchema)]
/// Broadcast when a participant joins a room.
pub struct ParticipantJoinedEvent {
    pub participant: RoomParticipantSummary,
}

#[derive(Debug, Serialize, ToSchema)]
/// Broadcast when the room owner starts the contest.
pub struct ContestStartedEvent {
    pub room: RoomSummary,
    pub remaining_seconds: u64,
}

#[derive(Debug, Serialize, ToSchema)]
/// Broadcast after a solve is credited, carrying the fresh standings.
pub struct ProgressEvent {
    pub user_id: Uuid,
    pub problem_id: String,
    pub leaderboard: Vec<LeaderboardEntry>,
}

#[derive(Debug, Serialize, ToSchema)]
/// Broadcast once when the contest ends, carrying the final standings.
pub struct ContestCompletedEvent {
    pub room: RoomSummary,
    pub leaderboard: Vec<LeaderboardEntry>,
}
