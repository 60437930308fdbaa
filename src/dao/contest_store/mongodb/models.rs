//! BSON document shapes for the battle and room collections.
//!
//! Ids are stored as their canonical string form so conditional-update filters
//! compare against exactly what was written; timestamps are stored as BSON
//! datetimes.

use mongodb::bson::{DateTime, Document, doc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::error::MongoDaoError;
use crate::dao::models::{
    BattleEntity, BattleParticipantEntity, BattleStatus, ProblemRefEntity, RoomEntity,
    RoomParticipantEntity, RoomStatus,
};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoBattleDocument {
    #[serde(rename = "_id")]
    id: String,
    status: BattleStatus,
    problem_id: String,
    created_at: DateTime,
    participants: Vec<MongoBattleParticipant>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoBattleParticipant {
    user_id: String,
    display_name: String,
    join_time: DateTime,
    solved_count: u32,
    time_taken_secs: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoRoomDocument {
    #[serde(rename = "_id")]
    code: String,
    status: RoomStatus,
    created_by: String,
    created_at: DateTime,
    started_at: Option<DateTime>,
    topics: Vec<String>,
    difficulties: Vec<String>,
    num_problems: u32,
    problems: Vec<ProblemRefEntity>,
    participants: Vec<MongoRoomParticipant>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoRoomParticipant {
    user_id: String,
    display_name: String,
    join_time: DateTime,
    solved_problem_ids: Vec<String>,
    total_solved: u32,
    total_time_taken_secs: i64,
}

impl From<BattleParticipantEntity> for MongoBattleParticipant {
    fn from(value: BattleParticipantEntity) -> Self {
        Self {
            user_id: value.user_id.to_string(),
            display_name: value.display_name,
            join_time: DateTime::from_system_time(value.join_time),
            solved_count: value.solved_count,
            time_taken_secs: value.time_taken_secs as i64,
        }
    }
}

impl TryFrom<MongoBattleParticipant> for BattleParticipantEntity {
    type Error = MongoDaoError;

    fn try_from(value: MongoBattleParticipant) -> Result<Self, Self::Error> {
        Ok(Self {
            user_id: parse_uuid(&value.user_id)?,
            display_name: value.display_name,
            join_time: value.join_time.to_system_time(),
            solved_count: value.solved_count,
            time_taken_secs: value.time_taken_secs.max(0) as u64,
        })
    }
}

impl From<BattleEntity> for MongoBattleDocument {
    fn from(value: BattleEntity) -> Self {
        Self {
            id: value.id.to_string(),
            status: value.status,
            problem_id: value.problem_id,
            created_at: DateTime::from_system_time(value.created_at),
            participants: value.participants.into_iter().map(Into::into).collect(),
        }
    }
}

impl TryFrom<MongoBattleDocument> for BattleEntity {
    type Error = MongoDaoError;

    fn try_from(value: MongoBattleDocument) -> Result<Self, Self::Error> {
        Ok(Self {
            id: parse_uuid(&value.id)?,
            status: value.status,
            problem_id: value.problem_id,
            created_at: value.created_at.to_system_time(),
            participants: value
                .participants
                .into_iter()
                .map(TryInto::try_into)
                .collect::<Result<_, _>>()?,
        })
    }
}

impl From<RoomParticipantEntity> for MongoRoomParticipant {
    fn from(value: RoomParticipantEntity) -> Self {
        Self {
            user_id: value.user_id.to_string(),
            display_name: value.display_name,
            join_time: DateTime::from_system_time(value.join_time),
            solved_problem_ids: value.solved_problem_ids,
            total_solved: value.total_solved,
            total_time_taken_secs: value.total_time_taken_secs as i64,
        }
    }
}

impl TryFrom<MongoRoomParticipant> for RoomParticipantEntity {
    type Error = MongoDaoError;

    fn try_from(value: MongoRoomParticipant) -> Result<Self, Self::Error> {
        Ok(Self {
            user_id: parse_uuid(&value.user_id)?,
            display_name: value.display_name,
            join_time: value.join_time.to_system_time(),
            solved_problem_ids: value.solved_problem_ids,
            total_solved: value.total_solved,
            total_time_taken_secs: value.total_time_taken_secs.max(0) as u64,
        })
    }
}

impl From<RoomEntity> for MongoRoomDocument {
    fn from(value: RoomEntity) -> Self {
        Self {
            code: value.code,
            status: value.status,
            created_by: value.created_by.to_string(),
            created_at: DateTime::from_system_time(value.created_at),
            started_at: value.started_at.map(DateTime::from_system_time),
            topics: value.topics,
            difficulties: value.difficulties,
            num_problems: value.num_problems,
            problems: value.problems,
            participants: value.participants.into_iter().map(Into::into).collect(),
        }
    }
}

impl TryFrom<MongoRoomDocument> for RoomEntity {
    type Error = MongoDaoError;

    fn try_from(value: MongoRoomDocument) -> Result<Self, Self::Error> {
        Ok(Self {
            code: value.code,
            status: value.status,
            created_by: parse_uuid(&value.created_by)?,
            created_at: value.created_at.to_system_time(),
            started_at: value.started_at.map(|ts| ts.to_system_time()),
            topics: value.topics,
            difficulties: value.difficulties,
            num_problems: value.num_problems,
            problems: value.problems,
            participants: value
                .participants
                .into_iter()
                .map(TryInto::try_into)
                .collect::<Result<_, _>>()?,
        })
    }
}

// A stored id that does not parse is corrupt data; surface it instead of
// substituting a sentinel.
fn parse_uuid(raw: &str) -> Result<Uuid, MongoDaoError> {
    Uuid::parse_str(raw).map_err(|source| MongoDaoError::InvalidStoredId {
        raw: raw.to_owned(),
        source,
    })
}

pub fn battle_id(id: Uuid) -> Document {
    doc! {"_id": id.to_string()}
}

pub fn room_id(code: &str) -> Document {
    doc! {"_id": code}
}

#[cfg(test)]
mod tests {
    use std::time::SystemTime;

    use super::*;

    fn stored_room(created_by: &str) -> MongoRoomDocument {
        MongoRoomDocument {
            code: "AB12CD".to_owned(),
            status: RoomStatus::NotStarted,
            created_by: created_by.to_owned(),
            created_at: DateTime::from_system_time(SystemTime::now()),
            started_at: None,
            topics: Vec::new(),
            difficulties: Vec::new(),
            num_problems: 0,
            problems: Vec::new(),
            participants: Vec::new(),
        }
    }

    #[test]
    fn stored_ids_decode_back_to_uuids() {
        let id = Uuid::new_v4();
        let room = RoomEntity::try_from(stored_room(&id.to_string())).unwrap();
        assert_eq!(room.created_by, id);
    }

    #[test]
    fn corrupt_stored_id_is_an_error() {
        let err = RoomEntity::try_from(stored_room("not-a-uuid")).unwrap_err();
        assert!(matches!(err, MongoDaoError::InvalidStoredId { .. }));
    }
}
