use serde::{Deserialize, Serialize};
use std::time::SystemTime;
use uuid::Uuid;

/// Matchmaking status of a 1v1 battle document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "kebab-case")]
pub enum BattleStatus {
    /// The initiating user is waiting for an opponent.
    Searching,
    /// An opponent joined; the battle is live.
    Found,
}

/// Lifecycle status of a contest room document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "kebab-case")]
pub enum RoomStatus {
    /// Room is open for joins; the creator is still configuring it.
    NotStarted,
    /// The contest clock is running and the problem set is frozen.
    InProgress,
    /// The contest ended, either by clock expiry or the creator's hand.
    Completed,
}

/// One 1v1 matchmaking/match document, keyed by the initiating user's id.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BattleEntity {
    /// Document key: the id of the user who started the search.
    pub id: Uuid,
    /// Current matchmaking status.
    pub status: BattleStatus,
    /// Problem chosen at creation time; immutable once set.
    pub problem_id: String,
    /// Creation timestamp for auditing/debugging.
    pub created_at: SystemTime,
    /// Participants in join order; at most two.
    pub participants: Vec<BattleParticipantEntity>,
}

/// Per-user progress embedded inside a battle document.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BattleParticipantEntity {
    /// Stable identifier from the external identity provider.
    pub user_id: Uuid,
    /// Display name captured at join time.
    pub display_name: String,
    /// When this user entered the battle.
    pub join_time: SystemTime,
    /// Number of problems solved during the battle.
    pub solved_count: u32,
    /// Cumulative solving time in seconds.
    pub time_taken_secs: u64,
}

/// Aggregate contest room document, keyed by its short join code.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RoomEntity {
    /// Document key: short human-entered join code.
    pub code: String,
    /// Lifecycle status.
    pub status: RoomStatus,
    /// Id of the room owner; only they may start or force-complete.
    pub created_by: Uuid,
    /// Creation timestamp for auditing/debugging.
    pub created_at: SystemTime,
    /// Set when the contest starts; drives the shared clock.
    pub started_at: Option<SystemTime>,
    /// Topics the contest problems were drawn from; frozen at start.
    pub topics: Vec<String>,
    /// Difficulties the contest problems were drawn from; frozen at start.
    pub difficulties: Vec<String>,
    /// Number of contest problems; always equals `problems.len()` once started.
    pub num_problems: u32,
    /// Frozen ordered problem set.
    pub problems: Vec<ProblemRefEntity>,
    /// Participants in join order.
    pub participants: Vec<RoomParticipantEntity>,
}

/// Reference to a catalog problem frozen into a room at start time.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProblemRefEntity {
    /// Catalog identifier (slug).
    pub id: String,
    /// Human readable problem name.
    pub name: String,
    /// Difficulty label ("easy", "medium", "hard").
    pub difficulty: String,
    /// Topic tags attached to the problem.
    pub topics: Vec<String>,
}

/// Per-user progress embedded inside a room document.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RoomParticipantEntity {
    /// Stable identifier from the external identity provider.
    pub user_id: Uuid,
    /// Display name captured at join time.
    pub display_name: String,
    /// When this user joined the room.
    pub join_time: SystemTime,
    /// Ids of problems this user has solved; only ever grows.
    pub solved_problem_ids: Vec<String>,
    /// Invariant: equals `solved_problem_ids.len()`.
    pub total_solved: u32,
    /// Cumulative solving time in seconds.
    pub total_time_taken_secs: u64,
}

impl BattleParticipantEntity {
    /// Fresh participant record with zeroed progress.
    pub fn new(user_id: Uuid, display_name: String) -> Self {
        Self {
            user_id,
            display_name,
            join_time: SystemTime::now(),
            solved_count: 0,
            time_taken_secs: 0,
        }
    }
}

impl RoomParticipantEntity {
    /// Fresh participant record with an empty solved set.
    pub fn new(user_id: Uuid, display_name: String) -> Self {
        Self {
            user_id,
            display_name,
            join_time: SystemTime::now(),
            solved_problem_ids: Vec::new(),
            total_solved: 0,
            total_time_taken_secs: 0,
        }
    }
}

impl RoomEntity {
    /// Whether the given user appears in the participant list.
    pub fn has_participant(&self, user_id: Uuid) -> bool {
        self.participants.iter().any(|p| p.user_id == user_id)
    }

    /// Look up a participant by id.
    pub fn participant(&self, user_id: Uuid) -> Option<&RoomParticipantEntity> {
        self.participants.iter().find(|p| p.user_id == user_id)
    }
}
