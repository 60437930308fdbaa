//! Derived, read-only views over room documents.
//!
//! Standings are never stored; they are recomputed from the participant
//! records on every read so a lost broadcast can never leave a stale
//! leaderboard behind.

use std::time::{Duration, SystemTime};

use uuid::Uuid;

use crate::dao::models::{RoomEntity, RoomParticipantEntity};

/// One row of the recomputed contest standings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeaderboardRow {
    /// Participant this row ranks.
    pub user_id: Uuid,
    /// Display name captured at join time.
    pub display_name: String,
    /// Problems solved so far.
    pub total_solved: u32,
    /// Accumulated solve time in seconds, the tie breaker.
    pub total_time_taken_secs: u64,
}

impl From<&RoomParticipantEntity> for LeaderboardRow {
    fn from(participant: &RoomParticipantEntity) -> Self {
        Self {
            user_id: participant.user_id,
            display_name: participant.display_name.clone(),
            total_solved: participant.total_solved,
            total_time_taken_secs: participant.total_time_taken_secs,
        }
    }
}

/// Rank participants by solved count descending, then accumulated time
/// ascending. Ties beyond that keep join order, which is stable.
pub fn leaderboard(room: &RoomEntity) -> Vec<LeaderboardRow> {
    let mut rows: Vec<LeaderboardRow> = room.participants.iter().map(Into::into).collect();
    rows.sort_by(|a, b| {
        b.total_solved
            .cmp(&a.total_solved)
            .then(a.total_time_taken_secs.cmp(&b.total_time_taken_secs))
    });
    rows
}

/// Seconds left on the contest clock at `now`, saturating at zero.
///
/// Rooms that never started report the full duration.
pub fn remaining_seconds(room: &RoomEntity, duration: Duration, now: SystemTime) -> u64 {
    let Some(started_at) = room.started_at else {
        return duration.as_secs();
    };

    let deadline = started_at + duration;
    match deadline.duration_since(now) {
        Ok(left) => left.as_secs(),
        Err(_) => 0,
    }
}

#[cfg(test)]
mod tests {
    use std::time::{Duration, SystemTime};

    use uuid::Uuid;

    use super::*;
    use crate::dao::models::{RoomEntity, RoomParticipantEntity, RoomStatus};

    fn room_with(participants: Vec<RoomParticipantEntity>) -> RoomEntity {
        RoomEntity {
            code: "ABC123".to_owned(),
            status: RoomStatus::InProgress,
            created_by: Uuid::new_v4(),
            created_at: SystemTime::now(),
            started_at: Some(SystemTime::now()),
            topics: vec!["arrays".to_owned()],
            difficulties: vec!["easy".to_owned()],
            num_problems: 2,
            problems: Vec::new(),
            participants,
        }
    }

    fn scored(name: &str, solved: u32, secs: u64) -> RoomParticipantEntity {
        let mut participant = RoomParticipantEntity::new(Uuid::new_v4(), name.to_owned());
        participant.total_solved = solved;
        participant.total_time_taken_secs = secs;
        participant
    }

    #[test]
    fn ranks_by_solved_then_time() {
        let room = room_with(vec![
            scored("alice", 1, 30),
            scored("bob", 2, 90),
            scored("carol", 2, 45),
        ]);

        let rows = leaderboard(&room);
        let names: Vec<&str> = rows.iter().map(|row| row.display_name.as_str()).collect();
        assert_eq!(names, vec!["carol", "bob", "alice"]);
    }

    #[test]
    fn equal_rows_keep_join_order() {
        let room = room_with(vec![scored("first", 1, 60), scored("second", 1, 60)]);

        let rows = leaderboard(&room);
        assert_eq!(rows[0].display_name, "first");
        assert_eq!(rows[1].display_name, "second");
    }

    #[test]
    fn clock_saturates_at_zero() {
        let duration = Duration::from_secs(90 * 60);
        let mut room = room_with(Vec::new());
        let started = SystemTime::now();
        room.started_at = Some(started);

        assert_eq!(
            remaining_seconds(&room, duration, started + Duration::from_secs(60)),
            duration.as_secs() - 60
        );
        assert_eq!(
            remaining_seconds(&room, duration, started + duration + Duration::from_secs(5)),
            0
        );
    }

    #[test]
    fn unstarted_room_reports_full_duration() {
        let duration = Duration::from_secs(90 * 60);
        let mut room = room_with(Vec::new());
        room.started_at = None;
        assert_eq!(
            remaining_seconds(&room, duration, SystemTime::now()),
            duration.as_secs()
        );
    }
}
