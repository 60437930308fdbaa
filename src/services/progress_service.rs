//! Solve reconciliation for in-progress contests.
//!
//! A solve is credited through a participant-scoped conditional write that
//! only touches the reporting participant's sub-fields. Two participants
//! solving at the same moment therefore never overwrite each other, and a
//! resubmitted problem is a strict no-op surfaced as a conflict.

use tracing::info;
use uuid::Uuid;

use crate::{
    dao::models::{RoomEntity, RoomStatus},
    error::ServiceError,
    services::sse_events,
    state::SharedState,
};

/// Credit an accepted solve to a room participant.
pub async fn report_solve(
    state: &SharedState,
    code: &str,
    user_id: Uuid,
    problem_id: &str,
    time_taken_secs: u64,
) -> Result<RoomEntity, ServiceError> {
    let store = state.require_contest_store().await?;

    // Pre-read for precise errors; the write-time condition remains the
    // authority on what gets credited.
    let room = store
        .find_room(code.to_owned())
        .await?
        .ok_or_else(|| ServiceError::RoomNotFound(code.to_owned()))?;
    classify(&room, code, user_id, problem_id)?;

    if !room.problems.iter().any(|problem| problem.id == problem_id) {
        return Err(ServiceError::InvalidConfiguration(format!(
            "problem `{problem_id}` is not part of this contest"
        )));
    }

    let updated = store
        .apply_solve(
            code.to_owned(),
            user_id,
            problem_id.to_owned(),
            time_taken_secs,
        )
        .await?;

    match updated {
        Some(room) => {
            info!(code, %user_id, problem_id, "solve credited");
            sse_events::broadcast_progress(state, &room, user_id, problem_id);
            Ok(room)
        }
        None => {
            // The condition stopped matching between the pre-read and the
            // write; re-read to report what changed.
            let room = store
                .find_room(code.to_owned())
                .await?
                .ok_or_else(|| ServiceError::RoomNotFound(code.to_owned()))?;
            classify(&room, code, user_id, problem_id)?;
            Err(ServiceError::InvalidState(
                "solve could not be credited".into(),
            ))
        }
    }
}

fn classify(
    room: &RoomEntity,
    code: &str,
    user_id: Uuid,
    problem_id: &str,
) -> Result<(), ServiceError> {
    match room.status {
        RoomStatus::NotStarted => {
            return Err(ServiceError::InvalidState("contest not started".into()));
        }
        RoomStatus::Completed => {
            return Err(ServiceError::InvalidState(
                "contest already completed".into(),
            ));
        }
        RoomStatus::InProgress => {}
    }

    let participant = room.participant(user_id).ok_or_else(|| {
        ServiceError::ParticipantNotFound {
            user_id,
            code: code.to_owned(),
        }
    })?;

    if participant
        .solved_problem_ids
        .iter()
        .any(|solved| solved == problem_id)
    {
        return Err(ServiceError::AlreadySolved);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        services::{room_service, test_support::test_state},
        state::{SharedState, room::leaderboard},
    };

    async fn started_room(state: &SharedState, creator: Uuid) -> RoomEntity {
        let room = room_service::create_room(state, creator, "creator".into())
            .await
            .unwrap();
        room_service::start_contest(
            state,
            &room.code,
            creator,
            vec!["arrays".into()],
            vec!["easy".into(), "medium".into()],
            3,
        )
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn solve_updates_only_the_reporting_participant() {
        let state = test_state().await;
        let creator = Uuid::new_v4();
        let other = Uuid::new_v4();
        let room = started_room(&state, creator).await;
        room_service::join_room(&state, &room.code, other, "other".into())
            .await
            .unwrap();

        let problem = room.problems[0].id.clone();
        let updated = report_solve(&state, &room.code, creator, &problem, 120)
            .await
            .unwrap();

        let solver = updated.participant(creator).unwrap();
        assert_eq!(solver.total_solved, 1);
        assert_eq!(solver.total_time_taken_secs, 120);
        assert_eq!(solver.solved_problem_ids, vec![problem]);

        let bystander = updated.participant(other).unwrap();
        assert_eq!(bystander.total_solved, 0);
        assert!(bystander.solved_problem_ids.is_empty());
    }

    #[tokio::test]
    async fn resubmission_is_a_strict_no_op() {
        let state = test_state().await;
        let creator = Uuid::new_v4();
        let room = started_room(&state, creator).await;
        let problem = room.problems[0].id.clone();

        report_solve(&state, &room.code, creator, &problem, 60)
            .await
            .unwrap();
        let err = report_solve(&state, &room.code, creator, &problem, 60)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::AlreadySolved));

        let room = room_service::get_room(&state, &room.code).await.unwrap();
        let solver = room.participant(creator).unwrap();
        assert_eq!(solver.total_solved, 1, "credit must not be applied twice");
        assert_eq!(solver.total_time_taken_secs, 60);
    }

    #[tokio::test]
    async fn non_participants_cannot_report() {
        let state = test_state().await;
        let creator = Uuid::new_v4();
        let room = started_room(&state, creator).await;
        let problem = room.problems[0].id.clone();

        let err = report_solve(&state, &room.code, Uuid::new_v4(), &problem, 60)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::ParticipantNotFound { .. }));
    }

    #[tokio::test]
    async fn solves_outside_the_frozen_set_are_rejected() {
        let state = test_state().await;
        let creator = Uuid::new_v4();
        let room = started_room(&state, creator).await;

        let err = report_solve(&state, &room.code, creator, "word-ladder", 60)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidConfiguration(_)));
    }

    #[tokio::test]
    async fn solves_require_an_in_progress_contest() {
        let state = test_state().await;
        let creator = Uuid::new_v4();
        let room = room_service::create_room(&state, creator, "creator".into())
            .await
            .unwrap();

        let err = report_solve(&state, &room.code, creator, "two-sum", 60)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidState(_)));

        let room = started_room(&state, Uuid::new_v4()).await;
        let problem = room.problems[0].id.clone();
        room_service::complete_contest(&state, &room.code, room.created_by)
            .await
            .unwrap();

        let err = report_solve(&state, &room.code, room.created_by, &problem, 60)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidState(_)));
    }

    #[tokio::test]
    async fn standings_rank_solves_then_time() {
        let state = test_state().await;
        let creator = Uuid::new_v4();
        let fast = Uuid::new_v4();
        let slow = Uuid::new_v4();
        let room = started_room(&state, creator).await;
        room_service::join_room(&state, &room.code, fast, "fast".into())
            .await
            .unwrap();
        room_service::join_room(&state, &room.code, slow, "slow".into())
            .await
            .unwrap();

        let first = room.problems[0].id.clone();
        let second = room.problems[1].id.clone();

        // fast and slow both solve two problems; fast is quicker. The creator
        // solves one.
        report_solve(&state, &room.code, fast, &first, 40).await.unwrap();
        report_solve(&state, &room.code, fast, &second, 50).await.unwrap();
        report_solve(&state, &room.code, slow, &first, 100).await.unwrap();
        report_solve(&state, &room.code, slow, &second, 110).await.unwrap();
        report_solve(&state, &room.code, creator, &first, 10).await.unwrap();

        let final_room = room_service::complete_contest(&state, &room.code, creator)
            .await
            .unwrap();
        let rows = leaderboard(&final_room);

        assert_eq!(rows[0].user_id, fast);
        assert_eq!(rows[1].user_id, slow);
        assert_eq!(rows[2].user_id, creator);
        assert_eq!(rows[0].total_solved, 2);
        assert_eq!(rows[0].total_time_taken_secs, 90);
    }
}
