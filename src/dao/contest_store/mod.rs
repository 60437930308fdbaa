//! Abstraction over the document store holding battle and room documents.
//!
//! Every operation that the coordination logic needs to be race-free is a
//! store-native conditional write: the filter carries the expected status (and
//! for solves, the per-participant precondition), so concurrent writers never
//! silently overwrite each other. A `None` return from a conditional method
//! means the condition did not hold at commit time; the caller decides whether
//! that is a no-op or an error.

/// Always-available in-memory backend, also used by the service tests.
pub mod memory;
#[cfg(feature = "mongo-store")]
/// MongoDB-backed store.
pub mod mongodb;

use std::time::SystemTime;

use futures::future::BoxFuture;
use uuid::Uuid;

use crate::dao::models::{
    BattleEntity, BattleParticipantEntity, ProblemRefEntity, RoomEntity, RoomParticipantEntity,
};
use crate::dao::storage::StorageResult;

/// Outcome of a conditional searching-battle delete.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelOutcome {
    /// The searching record existed and is gone.
    Deleted,
    /// No record with that id exists; repeat cancels land here.
    Missing,
    /// The record exists but a match was already found; nothing was deleted.
    AlreadyMatched,
}

/// Frozen configuration written when a contest starts.
#[derive(Debug, Clone)]
pub struct ContestConfig {
    /// Server-side start timestamp.
    pub started_at: SystemTime,
    /// Topics the problem set was drawn from.
    pub topics: Vec<String>,
    /// Difficulties the problem set was drawn from.
    pub difficulties: Vec<String>,
    /// Selected problem count; equals `problems.len()`.
    pub num_problems: u32,
    /// The frozen problem set.
    pub problems: Vec<ProblemRefEntity>,
}

/// Abstraction over the persistence layer for battles and contest rooms.
pub trait ContestStore: Send + Sync {
    /// Persist a fresh searching battle keyed by its initiator.
    fn create_battle(&self, battle: BattleEntity) -> BoxFuture<'static, StorageResult<()>>;

    /// Fetch one battle document.
    fn find_battle(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<BattleEntity>>>;

    /// All battles currently in the searching state, oldest first.
    fn searching_battles(&self) -> BoxFuture<'static, StorageResult<Vec<BattleEntity>>>;

    /// Atomically flip a searching battle to found and append the challenger.
    ///
    /// Returns the updated document, or `None` when the battle was missing or
    /// no longer searching (another challenger won, or the owner cancelled).
    fn claim_battle(
        &self,
        id: Uuid,
        challenger: BattleParticipantEntity,
    ) -> BoxFuture<'static, StorageResult<Option<BattleEntity>>>;

    /// Delete a battle, but only while it is still searching.
    fn cancel_battle(&self, id: Uuid) -> BoxFuture<'static, StorageResult<CancelOutcome>>;

    /// Insert a room if no document already uses its code.
    ///
    /// Returns `false` on a code collision so the caller can regenerate.
    fn insert_room(&self, room: RoomEntity) -> BoxFuture<'static, StorageResult<bool>>;

    /// Fetch one room document.
    fn find_room(&self, code: String) -> BoxFuture<'static, StorageResult<Option<RoomEntity>>>;

    /// Append a participant unless a record with the same user id is present
    /// (array-union semantics). `None` means the append condition did not
    /// match: the room is missing, already completed, or the user is already
    /// a participant.
    fn append_participant(
        &self,
        code: String,
        participant: RoomParticipantEntity,
    ) -> BoxFuture<'static, StorageResult<Option<RoomEntity>>>;

    /// Transition a room to in-progress and freeze its contest configuration,
    /// conditional on the room still being not-started.
    fn start_room(
        &self,
        code: String,
        contest: ContestConfig,
    ) -> BoxFuture<'static, StorageResult<Option<RoomEntity>>>;

    /// Transition a room to completed, conditional on it being in-progress.
    /// Racing completers observe `None` and treat it as a no-op.
    fn complete_room(&self, code: String)
    -> BoxFuture<'static, StorageResult<Option<RoomEntity>>>;

    /// Credit one solve to one participant, conditional on the room being
    /// in-progress and the problem not already in that participant's solved
    /// set. Only that participant's sub-fields are touched.
    fn apply_solve(
        &self,
        code: String,
        user_id: Uuid,
        problem_id: String,
        time_taken_secs: u64,
    ) -> BoxFuture<'static, StorageResult<Option<RoomEntity>>>;

    /// Cheap connectivity probe.
    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>>;

    /// Re-establish the backend connection after a failed health check.
    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>>;
}
