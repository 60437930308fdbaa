//! Pure transition rules for room statuses.
//!
//! Statuses live in the document store; these functions only answer "is this
//! transition legal". The conditional writes in the store enforce the same
//! rules at commit time, so a racing writer that passes here can still lose
//! the write and must treat the store's `None` as the authoritative answer.

use thiserror::Error;

use crate::dao::models::RoomStatus;

/// Events that move a room through its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoomEvent {
    /// The creator starts the contest.
    Start,
    /// The server-side contest clock reached the deadline.
    ClockElapsed,
    /// The creator ends the contest early.
    ForceComplete,
}

/// Error returned when attempting an invalid room transition.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid transition: {event:?} cannot be applied while {from:?}")]
pub struct InvalidRoomTransition {
    /// The status the room was in when the invalid event was received.
    pub from: RoomStatus,
    /// The event that cannot be applied from this status.
    pub event: RoomEvent,
}

/// Compute the room status that follows `event`, or reject it.
pub fn apply_room_event(
    from: RoomStatus,
    event: RoomEvent,
) -> Result<RoomStatus, InvalidRoomTransition> {
    match (from, event) {
        (RoomStatus::NotStarted, RoomEvent::Start) => Ok(RoomStatus::InProgress),
        (RoomStatus::InProgress, RoomEvent::ClockElapsed)
        | (RoomStatus::InProgress, RoomEvent::ForceComplete) => Ok(RoomStatus::Completed),
        (from, event) => Err(InvalidRoomTransition { from, event }),
    }
}

/// Whether participants may still join a room in this status.
pub fn accepts_participants(status: RoomStatus) -> bool {
    matches!(status, RoomStatus::NotStarted | RoomStatus::InProgress)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn room_follows_forward_only_path() {
        assert_eq!(
            apply_room_event(RoomStatus::NotStarted, RoomEvent::Start),
            Ok(RoomStatus::InProgress)
        );
        assert_eq!(
            apply_room_event(RoomStatus::InProgress, RoomEvent::ClockElapsed),
            Ok(RoomStatus::Completed)
        );
        assert_eq!(
            apply_room_event(RoomStatus::InProgress, RoomEvent::ForceComplete),
            Ok(RoomStatus::Completed)
        );
    }

    #[test]
    fn room_rejects_restart_and_double_completion() {
        assert!(apply_room_event(RoomStatus::InProgress, RoomEvent::Start).is_err());
        assert!(apply_room_event(RoomStatus::Completed, RoomEvent::Start).is_err());
        assert!(apply_room_event(RoomStatus::Completed, RoomEvent::ForceComplete).is_err());
        assert!(apply_room_event(RoomStatus::NotStarted, RoomEvent::ClockElapsed).is_err());
    }

    #[test]
    fn completed_rooms_stop_accepting_participants() {
        assert!(accepts_participants(RoomStatus::NotStarted));
        assert!(accepts_participants(RoomStatus::InProgress));
        assert!(!accepts_participants(RoomStatus::Completed));
    }
}
