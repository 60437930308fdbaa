//! 1v1 matchmaking built on conditional store writes.
//!
//! The scan-then-claim sequence is racy by nature: two seekers can both see
//! the same searching record. The claim is a conditional status flip, so
//! exactly one of them wins it and the loser moves on to the next candidate
//! or opens its own search. The in-process gate only reduces wasted claim
//! attempts between local tasks.

use std::time::SystemTime;

use rand::prelude::IndexedRandom;
use tracing::{debug, info};
use uuid::Uuid;

use crate::{
    dao::{
        contest_store::CancelOutcome,
        models::{BattleEntity, BattleParticipantEntity, BattleStatus},
    },
    error::ServiceError,
    services::sse_events,
    state::SharedState,
};

/// Result of a matchmaking attempt.
#[derive(Debug, Clone)]
pub enum MatchOutcome {
    /// The caller claimed an existing search; the battle is live.
    Found(BattleEntity),
    /// No claimable search existed; the caller is now searching.
    Searching(BattleEntity),
}

/// Match the caller against a waiting opponent, or open a new search.
pub async fn find_opponent(
    state: &SharedState,
    user_id: Uuid,
    display_name: String,
) -> Result<MatchOutcome, ServiceError> {
    let store = state.require_contest_store().await?;

    let problems = state.catalog().list_problems().await?;
    if problems.is_empty() {
        return Err(ServiceError::NoProblemsAvailable);
    }

    let _gate = state.matchmaking_gate().lock().await;

    // A repeated request from the same user resolves to their existing record
    // instead of racing against it.
    if let Some(existing) = store.find_battle(user_id).await? {
        debug!(%user_id, status = ?existing.status, "search already recorded");
        return Ok(match existing.status {
            BattleStatus::Searching => MatchOutcome::Searching(existing),
            BattleStatus::Found => MatchOutcome::Found(existing),
        });
    }

    for candidate in store.searching_battles().await? {
        if candidate.id == user_id {
            continue;
        }

        let challenger = BattleParticipantEntity::new(user_id, display_name.clone());
        if let Some(battle) = store.claim_battle(candidate.id, challenger).await? {
            info!(battle_id = %battle.id, challenger = %user_id, "opponent found");
            sse_events::broadcast_battle_found(state, battle.clone());
            return Ok(MatchOutcome::Found(battle));
        }

        // Lost the claim to a concurrent challenger or a cancel; keep going.
        debug!(battle_id = %candidate.id, "claim lost, trying next candidate");
    }

    let problem = problems
        .choose(&mut rand::rng())
        .ok_or(ServiceError::NoProblemsAvailable)?;

    let battle = BattleEntity {
        id: user_id,
        status: BattleStatus::Searching,
        problem_id: problem.id.clone(),
        created_at: SystemTime::now(),
        participants: vec![BattleParticipantEntity::new(user_id, display_name)],
    };

    store
        .create_battle(battle.clone())
        .await
        .map_err(ServiceError::MatchmakingWriteError)?;

    info!(battle_id = %battle.id, problem = %battle.problem_id, "search opened");
    Ok(MatchOutcome::Searching(battle))
}

/// Withdraw the caller's own search.
///
/// Only the initiator may cancel, and only while the record is still
/// searching; a search an opponent already claimed stays in place. Cancelling
/// a search that is already gone succeeds, so repeat cancels never raise.
pub async fn cancel_search(
    state: &SharedState,
    battle_id: Uuid,
    user_id: Uuid,
) -> Result<(), ServiceError> {
    if battle_id != user_id {
        return Err(ServiceError::NotAuthorized(
            "only the initiator may cancel their search".into(),
        ));
    }

    let store = state.require_contest_store().await?;

    match store.cancel_battle(battle_id).await? {
        CancelOutcome::Deleted => {
            info!(%battle_id, "search cancelled");
            state.sse().remove_battle_hub(battle_id);
            Ok(())
        }
        CancelOutcome::Missing => {
            debug!(%battle_id, "cancel of an absent search is a no-op");
            Ok(())
        }
        CancelOutcome::AlreadyMatched => Err(ServiceError::InvalidState(
            "an opponent already joined this battle".into(),
        )),
    }
}

/// Fetch a single battle document.
pub async fn get_battle(state: &SharedState, battle_id: Uuid) -> Result<BattleEntity, ServiceError> {
    let store = state.require_contest_store().await?;
    store
        .find_battle(battle_id)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("battle `{battle_id}`")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::{
        catalog::StaticCatalog,
        test_support::{test_state, test_state_with_catalog},
    };

    #[tokio::test]
    async fn second_seeker_claims_the_first_search() {
        let state = test_state().await;
        let alice = Uuid::new_v4();
        let bob = Uuid::new_v4();

        let first = find_opponent(&state, alice, "alice".into()).await.unwrap();
        assert!(matches!(first, MatchOutcome::Searching(_)));

        let second = find_opponent(&state, bob, "bob".into()).await.unwrap();
        let MatchOutcome::Found(battle) = second else {
            panic!("second seeker must be matched");
        };
        assert_eq!(battle.id, alice);
        assert_eq!(battle.status, BattleStatus::Found);
        assert_eq!(battle.participants.len(), 2);
        assert_eq!(battle.participants[1].user_id, bob);
    }

    #[tokio::test]
    async fn matched_pair_shares_one_problem() {
        let state = test_state().await;
        let alice = Uuid::new_v4();
        let bob = Uuid::new_v4();

        let MatchOutcome::Searching(opened) =
            find_opponent(&state, alice, "alice".into()).await.unwrap()
        else {
            panic!("first seeker opens a search");
        };
        let MatchOutcome::Found(battle) =
            find_opponent(&state, bob, "bob".into()).await.unwrap()
        else {
            panic!("second seeker is matched");
        };

        assert_eq!(battle.problem_id, opened.problem_id);
    }

    #[tokio::test]
    async fn repeated_request_returns_the_existing_record() {
        let state = test_state().await;
        let alice = Uuid::new_v4();

        find_opponent(&state, alice, "alice".into()).await.unwrap();
        let repeat = find_opponent(&state, alice, "alice".into()).await.unwrap();

        let MatchOutcome::Searching(battle) = repeat else {
            panic!("own open search must be returned, not matched against");
        };
        assert_eq!(battle.participants.len(), 1);
    }

    #[tokio::test]
    async fn cancelled_search_is_not_matchable() {
        let state = test_state().await;
        let alice = Uuid::new_v4();
        let bob = Uuid::new_v4();

        find_opponent(&state, alice, "alice".into()).await.unwrap();
        cancel_search(&state, alice, alice).await.unwrap();

        let outcome = find_opponent(&state, bob, "bob".into()).await.unwrap();
        assert!(
            matches!(outcome, MatchOutcome::Searching(_)),
            "a withdrawn search must not be claimed"
        );
    }

    #[tokio::test]
    async fn repeat_cancel_is_a_no_op() {
        let state = test_state().await;
        let alice = Uuid::new_v4();

        find_opponent(&state, alice, "alice".into()).await.unwrap();
        cancel_search(&state, alice, alice).await.unwrap();
        cancel_search(&state, alice, alice)
            .await
            .expect("cancelling an already-cancelled search must not raise");
    }

    #[tokio::test]
    async fn cancelling_allows_a_fresh_search() {
        let state = test_state().await;
        let alice = Uuid::new_v4();

        find_opponent(&state, alice, "alice".into()).await.unwrap();
        cancel_search(&state, alice, alice).await.unwrap();

        let reopened = find_opponent(&state, alice, "alice".into()).await.unwrap();
        let MatchOutcome::Searching(battle) = reopened else {
            panic!("a cancelled seeker must be able to search again");
        };
        assert_eq!(battle.status, BattleStatus::Searching);
        assert_eq!(battle.participants.len(), 1);
    }

    #[tokio::test]
    async fn only_the_initiator_may_cancel() {
        let state = test_state().await;
        let alice = Uuid::new_v4();
        let mallory = Uuid::new_v4();

        find_opponent(&state, alice, "alice".into()).await.unwrap();

        let err = cancel_search(&state, alice, mallory).await.unwrap_err();
        assert!(matches!(err, ServiceError::NotAuthorized(_)));
    }

    #[tokio::test]
    async fn cancel_after_match_is_rejected() {
        let state = test_state().await;
        let alice = Uuid::new_v4();
        let bob = Uuid::new_v4();

        find_opponent(&state, alice, "alice".into()).await.unwrap();
        find_opponent(&state, bob, "bob".into()).await.unwrap();

        let err = cancel_search(&state, alice, alice).await.unwrap_err();
        assert!(matches!(err, ServiceError::InvalidState(_)));
    }

    #[tokio::test]
    async fn empty_catalog_refuses_matchmaking() {
        let state = test_state_with_catalog(StaticCatalog::new(Vec::new())).await;

        let err = find_opponent(&state, Uuid::new_v4(), "alice".into())
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::NoProblemsAvailable));
    }
}
