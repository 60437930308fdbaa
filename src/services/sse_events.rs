//! SSE event construction and broadcasting helpers.

use serde::Serialize;
use tracing::warn;
use uuid::Uuid;

use crate::{
    dao::models::{BattleEntity, RoomEntity, RoomParticipantEntity},
    dto::{
        room::LeaderboardEntry,
        sse::{
            BattleFoundEvent, BattleSnapshotEvent, ContestCompletedEvent, ContestStartedEvent,
            ParticipantJoinedEvent, ProgressEvent, RoomSnapshotEvent, ServerEvent,
        },
    },
    state::{SharedState, room::leaderboard},
};

const EVENT_BATTLE_SNAPSHOT: &str = "battle.snapshot";
const EVENT_BATTLE_FOUND: &str = "battle.found";
const EVENT_ROOM_SNAPSHOT: &str = "room.snapshot";
const EVENT_PARTICIPANT_JOINED: &str = "room.participant_joined";
const EVENT_CONTEST_STARTED: &str = "room.started";
const EVENT_PROGRESS: &str = "room.progress";
const EVENT_CONTEST_COMPLETED: &str = "room.completed";

fn leaderboard_entries(room: &RoomEntity) -> Vec<LeaderboardEntry> {
    leaderboard(room).into_iter().map(Into::into).collect()
}

/// Build the snapshot event a battle subscriber receives first.
pub fn battle_snapshot_event(battle: BattleEntity) -> Option<ServerEvent> {
    build_event(
        EVENT_BATTLE_SNAPSHOT,
        &BattleSnapshotEvent {
            battle: battle.into(),
        },
    )
}

/// Broadcast that a challenger claimed the battle, then retire its hub.
///
/// Found is terminal for the battle stream; late subscribers still see the
/// outcome through the snapshot event.
pub fn broadcast_battle_found(state: &SharedState, battle: BattleEntity) {
    let id = battle.id;
    let payload = BattleFoundEvent {
        battle: battle.into(),
    };
    if let Some(event) = build_event(EVENT_BATTLE_FOUND, &payload) {
        state.sse().battle_hub(id).broadcast(event);
    }
    state.sse().remove_battle_hub(id);
}

/// Build the snapshot event a room subscriber receives first.
pub fn room_snapshot_event(room: RoomEntity, remaining_seconds: u64) -> Option<ServerEvent> {
    let entries = leaderboard_entries(&room);
    build_event(
        EVENT_ROOM_SNAPSHOT,
        &RoomSnapshotEvent {
            room: room.into(),
            leaderboard: entries,
            remaining_seconds,
        },
    )
}

/// Broadcast that a participant joined the room.
pub fn broadcast_participant_joined(state: &SharedState, code: &str, participant: RoomParticipantEntity) {
    let payload = ParticipantJoinedEvent {
        participant: participant.into(),
    };
    if let Some(event) = build_event(EVENT_PARTICIPANT_JOINED, &payload) {
        state.sse().room_hub(code).broadcast(event);
    }
}

/// Broadcast that the contest clock started.
pub fn broadcast_contest_started(state: &SharedState, room: RoomEntity, remaining_seconds: u64) {
    let code = room.code.clone();
    let payload = ContestStartedEvent {
        room: room.into(),
        remaining_seconds,
    };
    if let Some(event) = build_event(EVENT_CONTEST_STARTED, &payload) {
        state.sse().room_hub(&code).broadcast(event);
    }
}

/// Broadcast a credited solve along with the fresh standings.
pub fn broadcast_progress(state: &SharedState, room: &RoomEntity, user_id: Uuid, problem_id: &str) {
    let payload = ProgressEvent {
        user_id,
        problem_id: problem_id.to_owned(),
        leaderboard: leaderboard_entries(room),
    };
    if let Some(event) = build_event(EVENT_PROGRESS, &payload) {
        state.sse().room_hub(&room.code).broadcast(event);
    }
}

/// Broadcast the final standings, then retire the room's hub.
pub fn broadcast_contest_completed(state: &SharedState, room: RoomEntity) {
    let code = room.code.clone();
    let entries = leaderboard_entries(&room);
    let payload = ContestCompletedEvent {
        room: room.into(),
        leaderboard: entries,
    };
    if let Some(event) = build_event(EVENT_CONTEST_COMPLETED, &payload) {
        state.sse().room_hub(&code).broadcast(event);
    }
    state.sse().remove_room_hub(&code);
}

fn build_event(event: &str, payload: &impl Serialize) -> Option<ServerEvent> {
    match ServerEvent::json(Some(event.to_string()), payload) {
        Ok(event) => Some(event),
        Err(err) => {
            warn!(event, error = %err, "failed to serialize SSE payload");
            None
        }
    }
}
