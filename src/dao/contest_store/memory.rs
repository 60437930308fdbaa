//! In-memory [`ContestStore`] backend.
//!
//! Documents live in insertion-ordered maps behind an async lock, so the
//! "first searching record" selection policy is deterministic. Each method
//! applies its whole condition-and-write under one lock acquisition, which
//! gives the same atomicity the MongoDB backend gets from
//! `find_one_and_update`.

use std::sync::Arc;

use futures::future::BoxFuture;
use indexmap::IndexMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{CancelOutcome, ContestConfig, ContestStore};
use crate::dao::models::{
    BattleEntity, BattleParticipantEntity, BattleStatus, RoomEntity, RoomParticipantEntity,
    RoomStatus,
};
use crate::dao::storage::StorageResult;

/// Process-local store used in tests and storage-less deployments.
#[derive(Clone, Default)]
pub struct MemoryContestStore {
    inner: Arc<Inner>,
}

#[derive(Default)]
struct Inner {
    battles: RwLock<IndexMap<Uuid, BattleEntity>>,
    rooms: RwLock<IndexMap<String, RoomEntity>>,
}

impl MemoryContestStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl ContestStore for MemoryContestStore {
    fn create_battle(&self, battle: BattleEntity) -> BoxFuture<'static, StorageResult<()>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            let mut battles = inner.battles.write().await;
            battles.insert(battle.id, battle);
            Ok(())
        })
    }

    fn find_battle(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<BattleEntity>>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            let battles = inner.battles.read().await;
            Ok(battles.get(&id).cloned())
        })
    }

    fn searching_battles(&self) -> BoxFuture<'static, StorageResult<Vec<BattleEntity>>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            let battles = inner.battles.read().await;
            Ok(battles
                .values()
                .filter(|battle| battle.status == BattleStatus::Searching)
                .cloned()
                .collect())
        })
    }

    fn claim_battle(
        &self,
        id: Uuid,
        challenger: BattleParticipantEntity,
    ) -> BoxFuture<'static, StorageResult<Option<BattleEntity>>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            let mut battles = inner.battles.write().await;
            let Some(battle) = battles.get_mut(&id) else {
                return Ok(None);
            };
            if battle.status != BattleStatus::Searching || battle.participants.len() >= 2 {
                return Ok(None);
            }
            battle.status = BattleStatus::Found;
            battle.participants.push(challenger);
            Ok(Some(battle.clone()))
        })
    }

    fn cancel_battle(&self, id: Uuid) -> BoxFuture<'static, StorageResult<CancelOutcome>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            let mut battles = inner.battles.write().await;
            match battles.get(&id) {
                None => Ok(CancelOutcome::Missing),
                Some(battle) if battle.status == BattleStatus::Found => {
                    Ok(CancelOutcome::AlreadyMatched)
                }
                Some(_) => {
                    battles.shift_remove(&id);
                    Ok(CancelOutcome::Deleted)
                }
            }
        })
    }

    fn insert_room(&self, room: RoomEntity) -> BoxFuture<'static, StorageResult<bool>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            let mut rooms = inner.rooms.write().await;
            if rooms.contains_key(&room.code) {
                return Ok(false);
            }
            rooms.insert(room.code.clone(), room);
            Ok(true)
        })
    }

    fn find_room(&self, code: String) -> BoxFuture<'static, StorageResult<Option<RoomEntity>>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            let rooms = inner.rooms.read().await;
            Ok(rooms.get(&code).cloned())
        })
    }

    fn append_participant(
        &self,
        code: String,
        participant: RoomParticipantEntity,
    ) -> BoxFuture<'static, StorageResult<Option<RoomEntity>>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            let mut rooms = inner.rooms.write().await;
            let Some(room) = rooms.get_mut(&code) else {
                return Ok(None);
            };
            if room.status == RoomStatus::Completed || room.has_participant(participant.user_id) {
                return Ok(None);
            }
            room.participants.push(participant);
            Ok(Some(room.clone()))
        })
    }

    fn start_room(
        &self,
        code: String,
        contest: ContestConfig,
    ) -> BoxFuture<'static, StorageResult<Option<RoomEntity>>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            let mut rooms = inner.rooms.write().await;
            let Some(room) = rooms.get_mut(&code) else {
                return Ok(None);
            };
            if room.status != RoomStatus::NotStarted {
                return Ok(None);
            }
            room.status = RoomStatus::InProgress;
            room.started_at = Some(contest.started_at);
            room.topics = contest.topics;
            room.difficulties = contest.difficulties;
            room.num_problems = contest.num_problems;
            room.problems = contest.problems;
            Ok(Some(room.clone()))
        })
    }

    fn complete_room(
        &self,
        code: String,
    ) -> BoxFuture<'static, StorageResult<Option<RoomEntity>>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            let mut rooms = inner.rooms.write().await;
            let Some(room) = rooms.get_mut(&code) else {
                return Ok(None);
            };
            if room.status != RoomStatus::InProgress {
                return Ok(None);
            }
            room.status = RoomStatus::Completed;
            Ok(Some(room.clone()))
        })
    }

    fn apply_solve(
        &self,
        code: String,
        user_id: Uuid,
        problem_id: String,
        time_taken_secs: u64,
    ) -> BoxFuture<'static, StorageResult<Option<RoomEntity>>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            let mut rooms = inner.rooms.write().await;
            let Some(room) = rooms.get_mut(&code) else {
                return Ok(None);
            };
            if room.status != RoomStatus::InProgress {
                return Ok(None);
            }
            let Some(participant) = room
                .participants
                .iter_mut()
                .find(|p| p.user_id == user_id)
            else {
                return Ok(None);
            };
            if participant.solved_problem_ids.contains(&problem_id) {
                return Ok(None);
            }
            participant.solved_problem_ids.push(problem_id);
            participant.total_solved += 1;
            participant.total_time_taken_secs += time_taken_secs;
            Ok(Some(room.clone()))
        })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        Box::pin(async { Ok(()) })
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        Box::pin(async { Ok(()) })
    }
}

#[cfg(test)]
mod tests {
    use std::time::SystemTime;

    use super::*;

    fn searching_battle(owner: Uuid) -> BattleEntity {
        BattleEntity {
            id: owner,
            status: BattleStatus::Searching,
            problem_id: "two-sum".into(),
            created_at: SystemTime::now(),
            participants: vec![BattleParticipantEntity::new(owner, "owner".into())],
        }
    }

    fn empty_room(code: &str, creator: Uuid) -> RoomEntity {
        RoomEntity {
            code: code.into(),
            status: RoomStatus::NotStarted,
            created_by: creator,
            created_at: SystemTime::now(),
            started_at: None,
            topics: Vec::new(),
            difficulties: Vec::new(),
            num_problems: 0,
            problems: Vec::new(),
            participants: vec![RoomParticipantEntity::new(creator, "creator".into())],
        }
    }

    #[tokio::test]
    async fn claim_is_exclusive() {
        let store = MemoryContestStore::new();
        let owner = Uuid::new_v4();
        store.create_battle(searching_battle(owner)).await.unwrap();

        let first = store
            .claim_battle(owner, BattleParticipantEntity::new(Uuid::new_v4(), "a".into()))
            .await
            .unwrap();
        let second = store
            .claim_battle(owner, BattleParticipantEntity::new(Uuid::new_v4(), "b".into()))
            .await
            .unwrap();

        let claimed = first.expect("first claim succeeds");
        assert_eq!(claimed.status, BattleStatus::Found);
        assert_eq!(claimed.participants.len(), 2);
        assert!(second.is_none(), "second claim must lose the race");
    }

    #[tokio::test]
    async fn cancel_distinguishes_missing_and_matched() {
        let store = MemoryContestStore::new();
        let owner = Uuid::new_v4();
        store.create_battle(searching_battle(owner)).await.unwrap();

        assert_eq!(store.cancel_battle(owner).await.unwrap(), CancelOutcome::Deleted);
        assert_eq!(store.cancel_battle(owner).await.unwrap(), CancelOutcome::Missing);

        store.create_battle(searching_battle(owner)).await.unwrap();
        store
            .claim_battle(owner, BattleParticipantEntity::new(Uuid::new_v4(), "c".into()))
            .await
            .unwrap();
        assert_eq!(
            store.cancel_battle(owner).await.unwrap(),
            CancelOutcome::AlreadyMatched
        );
    }

    #[tokio::test]
    async fn insert_room_rejects_duplicate_codes() {
        let store = MemoryContestStore::new();
        let creator = Uuid::new_v4();
        assert!(store.insert_room(empty_room("AB12CD", creator)).await.unwrap());
        assert!(!store.insert_room(empty_room("AB12CD", creator)).await.unwrap());
    }

    #[tokio::test]
    async fn append_participant_is_union() {
        let store = MemoryContestStore::new();
        let creator = Uuid::new_v4();
        let joiner = Uuid::new_v4();
        store.insert_room(empty_room("XY99ZZ", creator)).await.unwrap();

        let appended = store
            .append_participant(
                "XY99ZZ".into(),
                RoomParticipantEntity::new(joiner, "joiner".into()),
            )
            .await
            .unwrap();
        assert_eq!(appended.unwrap().participants.len(), 2);

        let repeat = store
            .append_participant(
                "XY99ZZ".into(),
                RoomParticipantEntity::new(joiner, "joiner".into()),
            )
            .await
            .unwrap();
        assert!(repeat.is_none(), "same user id must not be appended twice");
    }

    #[tokio::test]
    async fn solve_requires_in_progress_and_unsolved() {
        let store = MemoryContestStore::new();
        let creator = Uuid::new_v4();
        store.insert_room(empty_room("SOLVE1", creator)).await.unwrap();

        // Not started yet: the conditional write must not match.
        let early = store
            .apply_solve("SOLVE1".into(), creator, "two-sum".into(), 30)
            .await
            .unwrap();
        assert!(early.is_none());

        store
            .start_room(
                "SOLVE1".into(),
                ContestConfig {
                    started_at: SystemTime::now(),
                    topics: vec!["arrays".into()],
                    difficulties: vec!["easy".into()],
                    num_problems: 1,
                    problems: Vec::new(),
                },
            )
            .await
            .unwrap();

        let first = store
            .apply_solve("SOLVE1".into(), creator, "two-sum".into(), 30)
            .await
            .unwrap()
            .expect("first solve applies");
        assert_eq!(first.participants[0].total_solved, 1);
        assert_eq!(first.participants[0].total_time_taken_secs, 30);

        let repeat = store
            .apply_solve("SOLVE1".into(), creator, "two-sum".into(), 99)
            .await
            .unwrap();
        assert!(repeat.is_none(), "resubmission must not double-credit");
    }

    #[tokio::test]
    async fn complete_room_is_single_shot() {
        let store = MemoryContestStore::new();
        let creator = Uuid::new_v4();
        store.insert_room(empty_room("DONE00", creator)).await.unwrap();
        store
            .start_room(
                "DONE00".into(),
                ContestConfig {
                    started_at: SystemTime::now(),
                    topics: Vec::new(),
                    difficulties: Vec::new(),
                    num_problems: 0,
                    problems: Vec::new(),
                },
            )
            .await
            .unwrap();

        assert!(store.complete_room("DONE00".into()).await.unwrap().is_some());
        assert!(
            store.complete_room("DONE00".into()).await.unwrap().is_none(),
            "second completer must observe a no-op"
        );
    }
}
