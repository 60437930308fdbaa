//! Contest room lifecycle: creation, joining, starting, completion.
//!
//! Status transitions are committed through the store's conditional writes.
//! The pre-checks in this module exist to give callers precise errors; they
//! never substitute for the write-time condition, so two racing starters (or
//! completers) still resolve to exactly one winner.

use std::time::{Duration, SystemTime};

use rand::{Rng, seq::SliceRandom};
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    dao::{
        contest_store::ContestConfig,
        models::{RoomEntity, RoomParticipantEntity, RoomStatus},
    },
    error::ServiceError,
    services::sse_events,
    state::{SharedState, lifecycle, room::remaining_seconds},
};

const CODE_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

fn generate_room_code(length: usize) -> String {
    let mut rng = rand::rng();
    (0..length)
        .map(|_| CODE_ALPHABET[rng.random_range(0..CODE_ALPHABET.len())] as char)
        .collect()
}

/// Create a room with a fresh join code, the creator being its first
/// participant. Code collisions are retried a bounded number of times.
pub async fn create_room(
    state: &SharedState,
    user_id: Uuid,
    display_name: String,
) -> Result<RoomEntity, ServiceError> {
    let store = state.require_contest_store().await?;
    let config = state.config();

    for _ in 0..config.room_code_attempts {
        let room = RoomEntity {
            code: generate_room_code(config.room_code_length),
            status: RoomStatus::NotStarted,
            created_by: user_id,
            created_at: SystemTime::now(),
            started_at: None,
            topics: Vec::new(),
            difficulties: Vec::new(),
            num_problems: 0,
            problems: Vec::new(),
            participants: vec![RoomParticipantEntity::new(user_id, display_name.clone())],
        };

        if store.insert_room(room.clone()).await? {
            info!(code = %room.code, created_by = %user_id, "room created");
            return Ok(room);
        }

        warn!(code = %room.code, "room code collision, regenerating");
    }

    Err(ServiceError::RoomCodeExhausted)
}

/// Fetch a single room document.
pub async fn get_room(state: &SharedState, code: &str) -> Result<RoomEntity, ServiceError> {
    let store = state.require_contest_store().await?;
    store
        .find_room(code.to_owned())
        .await?
        .ok_or_else(|| ServiceError::RoomNotFound(code.to_owned()))
}

/// Add a user to a room. Joining is idempotent: a user who is already a
/// participant gets the current room back unchanged. Completed rooms reject
/// joins.
pub async fn join_room(
    state: &SharedState,
    code: &str,
    user_id: Uuid,
    display_name: String,
) -> Result<RoomEntity, ServiceError> {
    let store = state.require_contest_store().await?;

    let participant = RoomParticipantEntity::new(user_id, display_name);
    if let Some(room) = store
        .append_participant(code.to_owned(), participant.clone())
        .await?
    {
        info!(code, %user_id, "participant joined");
        sse_events::broadcast_participant_joined(state, code, participant);
        return Ok(room);
    }

    // The append condition did not match; re-read to tell the caller why.
    let room = get_room(state, code).await?;
    if room.has_participant(user_id) {
        return Ok(room);
    }
    debug_assert!(!lifecycle::accepts_participants(room.status));
    Err(ServiceError::InvalidState(
        "contest already completed".into(),
    ))
}

/// Start the contest: freeze a problem set drawn from the catalog and flip
/// the room to in-progress. Only the room owner may start, and only once.
pub async fn start_contest(
    state: &SharedState,
    code: &str,
    user_id: Uuid,
    topics: Vec<String>,
    difficulties: Vec<String>,
    num_problems: u32,
) -> Result<RoomEntity, ServiceError> {
    let store = state.require_contest_store().await?;

    if topics.is_empty() || difficulties.is_empty() {
        return Err(ServiceError::InvalidConfiguration(
            "at least one topic and one difficulty are required".into(),
        ));
    }

    let room = get_room(state, code).await?;
    if room.created_by != user_id {
        return Err(ServiceError::NotAuthorized(
            "only the room owner may start the contest".into(),
        ));
    }
    lifecycle::apply_room_event(room.status, lifecycle::RoomEvent::Start)
        .map_err(|err| ServiceError::InvalidState(err.to_string()))?;

    let mut pool = state
        .catalog()
        .problems_matching(topics.clone(), difficulties.clone())
        .await?;
    if pool.is_empty() {
        return Err(ServiceError::InvalidConfiguration(
            "no problems match the requested topics and difficulties".into(),
        ));
    }

    pool.shuffle(&mut rand::rng());
    pool.truncate(num_problems as usize);

    let contest = ContestConfig {
        started_at: SystemTime::now(),
        topics,
        difficulties,
        num_problems: pool.len() as u32,
        problems: pool,
    };

    let Some(room) = store.start_room(code.to_owned(), contest).await? else {
        // Lost the start race; the room is no longer not-started.
        return Err(ServiceError::InvalidState(
            "contest already started".into(),
        ));
    };

    info!(code, problems = room.num_problems, "contest started");
    schedule_contest_end(state.clone(), code.to_owned(), state.config().contest_duration);

    let remaining = remaining_seconds(&room, state.config().contest_duration, SystemTime::now());
    sse_events::broadcast_contest_started(state, room.clone(), remaining);
    Ok(room)
}

/// Complete the contest. The owner may complete at any point; anyone else is
/// honored only once the contest clock has elapsed. A room that is already
/// completed is returned as-is.
pub async fn complete_contest(
    state: &SharedState,
    code: &str,
    user_id: Uuid,
) -> Result<RoomEntity, ServiceError> {
    let store = state.require_contest_store().await?;

    let room = get_room(state, code).await?;
    match room.status {
        RoomStatus::Completed => return Ok(room),
        RoomStatus::NotStarted => {
            return Err(ServiceError::InvalidState("contest not started".into()));
        }
        RoomStatus::InProgress => {}
    }

    if room.created_by != user_id {
        let remaining = remaining_seconds(&room, state.config().contest_duration, SystemTime::now());
        if remaining > 0 {
            return Err(ServiceError::NotAuthorized(
                "only the room owner may end the contest early".into(),
            ));
        }
    }

    match store.complete_room(code.to_owned()).await? {
        Some(room) => {
            info!(code, "contest completed");
            sse_events::broadcast_contest_completed(state, room.clone());
            Ok(room)
        }
        // A concurrent completer won; the result is the same.
        None => get_room(state, code).await,
    }
}

/// Spawn the authoritative end-of-contest task.
///
/// The task fires the same conditional completion write as the HTTP path, so
/// whichever side commits first wins and the other becomes a no-op.
pub fn schedule_contest_end(state: SharedState, code: String, duration: Duration) {
    tokio::spawn(async move {
        tokio::time::sleep(duration).await;

        let Some(store) = state.contest_store().await else {
            warn!(code, "contest clock elapsed while storage is unavailable");
            return;
        };

        match store.complete_room(code.clone()).await {
            Ok(Some(room)) => {
                info!(code, "contest clock elapsed, room completed");
                sse_events::broadcast_contest_completed(&state, room);
            }
            Ok(None) => {
                // Already completed through the HTTP path.
            }
            Err(err) => {
                warn!(code, error = %err, "failed to complete room on clock expiry");
            }
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::test_support::test_state;

    #[tokio::test]
    async fn create_room_seeds_the_creator() {
        let state = test_state().await;
        let creator = Uuid::new_v4();

        let room = create_room(&state, creator, "creator".into()).await.unwrap();

        assert_eq!(room.status, RoomStatus::NotStarted);
        assert_eq!(room.created_by, creator);
        assert_eq!(room.participants.len(), 1);
        assert_eq!(room.code.len(), state.config().room_code_length);
        assert!(
            room.code
                .chars()
                .all(|c| c.is_ascii_alphanumeric() && !c.is_ascii_lowercase())
        );
    }

    #[tokio::test]
    async fn join_is_idempotent_per_user() {
        let state = test_state().await;
        let creator = Uuid::new_v4();
        let joiner = Uuid::new_v4();
        let room = create_room(&state, creator, "creator".into()).await.unwrap();

        let joined = join_room(&state, &room.code, joiner, "joiner".into())
            .await
            .unwrap();
        assert_eq!(joined.participants.len(), 2);

        let repeat = join_room(&state, &room.code, joiner, "joiner".into())
            .await
            .unwrap();
        assert_eq!(repeat.participants.len(), 2, "repeat join must not duplicate");
    }

    #[tokio::test]
    async fn join_unknown_room_is_not_found() {
        let state = test_state().await;

        let err = join_room(&state, "ZZZZZ9", Uuid::new_v4(), "joiner".into())
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::RoomNotFound(_)));
    }

    #[tokio::test]
    async fn only_the_owner_may_start() {
        let state = test_state().await;
        let creator = Uuid::new_v4();
        let other = Uuid::new_v4();
        let room = create_room(&state, creator, "creator".into()).await.unwrap();

        let err = start_contest(
            &state,
            &room.code,
            other,
            vec!["arrays".into()],
            vec!["easy".into()],
            1,
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ServiceError::NotAuthorized(_)));
    }

    #[tokio::test]
    async fn start_freezes_a_matching_problem_set() {
        let state = test_state().await;
        let creator = Uuid::new_v4();
        let room = create_room(&state, creator, "creator".into()).await.unwrap();

        let started = start_contest(
            &state,
            &room.code,
            creator,
            vec!["arrays".into()],
            vec!["easy".into(), "medium".into()],
            2,
        )
        .await
        .unwrap();

        assert_eq!(started.status, RoomStatus::InProgress);
        assert!(started.started_at.is_some());
        assert_eq!(started.num_problems, 2);
        assert_eq!(started.problems.len(), 2);
        for problem in &started.problems {
            assert!(problem.topics.iter().any(|tag| tag == "arrays"));
        }
    }

    #[tokio::test]
    async fn requested_count_clamps_to_the_matching_pool() {
        let state = test_state().await;
        let creator = Uuid::new_v4();
        let room = create_room(&state, creator, "creator".into()).await.unwrap();

        // The built-in catalog has exactly two easy/medium dynamic-programming
        // problems.
        let started = start_contest(
            &state,
            &room.code,
            creator,
            vec!["dynamic-programming".into()],
            vec!["easy".into(), "medium".into()],
            4,
        )
        .await
        .unwrap();

        assert_eq!(started.num_problems, 2);
        assert_eq!(started.problems.len(), 2);
    }

    #[tokio::test]
    async fn start_requires_topics_and_difficulties() {
        let state = test_state().await;
        let creator = Uuid::new_v4();
        let room = create_room(&state, creator, "creator".into()).await.unwrap();

        let err = start_contest(&state, &room.code, creator, vec![], vec!["easy".into()], 1)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidConfiguration(_)));

        let err = start_contest(&state, &room.code, creator, vec!["arrays".into()], vec![], 1)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidConfiguration(_)));
    }

    #[tokio::test]
    async fn start_rejects_filters_matching_nothing() {
        let state = test_state().await;
        let creator = Uuid::new_v4();
        let room = create_room(&state, creator, "creator".into()).await.unwrap();

        let err = start_contest(
            &state,
            &room.code,
            creator,
            vec!["geometry".into()],
            vec!["easy".into()],
            1,
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidConfiguration(_)));
    }

    #[tokio::test]
    async fn start_is_single_shot() {
        let state = test_state().await;
        let creator = Uuid::new_v4();
        let room = create_room(&state, creator, "creator".into()).await.unwrap();

        start_contest(
            &state,
            &room.code,
            creator,
            vec!["arrays".into()],
            vec!["easy".into()],
            1,
        )
        .await
        .unwrap();

        let err = start_contest(
            &state,
            &room.code,
            creator,
            vec!["arrays".into()],
            vec!["easy".into()],
            1,
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidState(_)));
    }

    #[tokio::test]
    async fn non_owner_cannot_complete_before_the_clock_elapses() {
        let state = test_state().await;
        let creator = Uuid::new_v4();
        let other = Uuid::new_v4();
        let room = create_room(&state, creator, "creator".into()).await.unwrap();
        join_room(&state, &room.code, other, "other".into()).await.unwrap();
        start_contest(
            &state,
            &room.code,
            creator,
            vec!["arrays".into()],
            vec!["easy".into()],
            1,
        )
        .await
        .unwrap();

        let err = complete_contest(&state, &room.code, other).await.unwrap_err();
        assert!(matches!(err, ServiceError::NotAuthorized(_)));
    }

    #[tokio::test]
    async fn owner_completion_is_idempotent() {
        let state = test_state().await;
        let creator = Uuid::new_v4();
        let room = create_room(&state, creator, "creator".into()).await.unwrap();
        start_contest(
            &state,
            &room.code,
            creator,
            vec!["arrays".into()],
            vec!["easy".into()],
            1,
        )
        .await
        .unwrap();

        let completed = complete_contest(&state, &room.code, creator).await.unwrap();
        assert_eq!(completed.status, RoomStatus::Completed);

        let repeat = complete_contest(&state, &room.code, creator).await.unwrap();
        assert_eq!(repeat.status, RoomStatus::Completed);
    }

    #[tokio::test]
    async fn completing_an_unstarted_room_is_rejected() {
        let state = test_state().await;
        let creator = Uuid::new_v4();
        let room = create_room(&state, creator, "creator".into()).await.unwrap();

        let err = complete_contest(&state, &room.code, creator).await.unwrap_err();
        assert!(matches!(err, ServiceError::InvalidState(_)));
    }

    #[tokio::test]
    async fn full_contest_round_trip() {
        use crate::{services::progress_service, state::room::leaderboard};

        let state = test_state().await;
        let creator = Uuid::new_v4();
        let second = Uuid::new_v4();
        let third = Uuid::new_v4();

        let room = create_room(&state, creator, "creator".into()).await.unwrap();
        join_room(&state, &room.code, second, "second".into()).await.unwrap();
        join_room(&state, &room.code, third, "third".into()).await.unwrap();

        let started = start_contest(
            &state,
            &room.code,
            creator,
            vec!["arrays".into()],
            vec!["easy".into(), "medium".into()],
            2,
        )
        .await
        .unwrap();
        assert_eq!(started.participants.len(), 3);
        assert_eq!(started.problems.len(), 2);

        let problem = started.problems[0].id.clone();
        progress_service::report_solve(&state, &room.code, second, &problem, 75)
            .await
            .unwrap();

        let finished = complete_contest(&state, &room.code, creator).await.unwrap();
        assert_eq!(finished.status, RoomStatus::Completed);

        let rows = leaderboard(&finished);
        assert_eq!(rows[0].user_id, second, "the sole solver leads the standings");
        assert_eq!(rows[0].total_solved, 1);
    }

    #[tokio::test]
    async fn completed_rooms_reject_joins() {
        let state = test_state().await;
        let creator = Uuid::new_v4();
        let room = create_room(&state, creator, "creator".into()).await.unwrap();
        start_contest(
            &state,
            &room.code,
            creator,
            vec!["arrays".into()],
            vec!["easy".into()],
            1,
        )
        .await
        .unwrap();
        complete_contest(&state, &room.code, creator).await.unwrap();

        let err = join_room(&state, &room.code, Uuid::new_v4(), "late".into())
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidState(_)));
    }
}
