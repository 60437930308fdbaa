use std::sync::Arc;

use futures::{TryStreamExt, future::BoxFuture};
use mongodb::{
    Client, Collection, Database,
    bson::{doc, serialize_to_bson},
    error::{ErrorKind, WriteFailure},
    options::{IndexOptions, ReturnDocument},
};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{
    config::MongoConfig,
    connection::establish_connection,
    error::{MongoDaoError, MongoResult},
    models::{MongoBattleDocument, MongoRoomDocument, battle_id, room_id},
};
use crate::dao::{
    contest_store::{CancelOutcome, ContestConfig, ContestStore},
    models::{BattleEntity, BattleParticipantEntity, RoomEntity, RoomParticipantEntity},
    storage::StorageResult,
};

const BATTLE_COLLECTION_NAME: &str = "battles";
const ROOM_COLLECTION_NAME: &str = "rooms";

const STATUS_SEARCHING: &str = "searching";
const STATUS_FOUND: &str = "found";
const STATUS_NOT_STARTED: &str = "not-started";
const STATUS_IN_PROGRESS: &str = "in-progress";
const STATUS_COMPLETED: &str = "completed";

#[derive(Clone)]
pub struct MongoContestStore {
    inner: Arc<MongoInner>,
}

struct MongoInner {
    state: RwLock<MongoState>,
    config: MongoConfig,
}

struct MongoState {
    client: Client,
    database: Database,
}

impl MongoInner {
    async fn ping(&self) -> MongoResult<()> {
        let database = {
            let guard = self.state.read().await;
            guard.database.clone()
        };

        database
            .run_command(doc! { "ping": 1 })
            .await
            .map_err(|source| MongoDaoError::HealthPing { source })?;
        Ok(())
    }

    async fn reconnect(&self) -> MongoResult<()> {
        let (client, database) =
            establish_connection(&self.config.options, &self.config.database_name).await?;
        let mut guard = self.state.write().await;
        guard.client = client;
        guard.database = database;
        Ok(())
    }
}

impl MongoContestStore {
    /// Establish a connection to MongoDB and ensure indexes are present.
    pub async fn connect(config: MongoConfig) -> MongoResult<Self> {
        let (client, database) =
            establish_connection(&config.options, &config.database_name).await?;

        let inner = Arc::new(MongoInner {
            state: RwLock::new(MongoState { client, database }),
            config,
        });

        let store = Self { inner };
        store.ensure_indexes().await?;
        Ok(store)
    }

    async fn ensure_indexes(&self) -> MongoResult<()> {
        let database = self.database().await;

        // Matchmaking scans the searching battles oldest first.
        let collection = database.collection::<mongodb::bson::Document>(BATTLE_COLLECTION_NAME);
        let index = mongodb::IndexModel::builder()
            .keys(doc! {"status": 1, "created_at": 1})
            .options(
                IndexOptions::builder()
                    .name(Some("battle_status_idx".to_owned()))
                    .build(),
            )
            .build();

        collection
            .create_index(index)
            .await
            .map_err(|source| MongoDaoError::EnsureIndex {
                collection: BATTLE_COLLECTION_NAME,
                index: "status,created_at",
                source,
            })?;

        Ok(())
    }

    async fn database(&self) -> Database {
        let guard = self.inner.state.read().await;
        guard.database.clone()
    }

    async fn battle_collection(&self) -> Collection<MongoBattleDocument> {
        let guard = self.inner.state.read().await;
        guard
            .database
            .collection::<MongoBattleDocument>(BATTLE_COLLECTION_NAME)
    }

    async fn room_collection(&self) -> Collection<MongoRoomDocument> {
        let guard = self.inner.state.read().await;
        guard
            .database
            .collection::<MongoRoomDocument>(ROOM_COLLECTION_NAME)
    }

    async fn create_battle(&self, battle: BattleEntity) -> MongoResult<()> {
        let id = battle.id;
        let document: MongoBattleDocument = battle.into();
        let collection = self.battle_collection().await;
        collection
            .insert_one(&document)
            .await
            .map_err(|source| MongoDaoError::WriteBattle { id, source })?;
        Ok(())
    }

    async fn find_battle(&self, id: Uuid) -> MongoResult<Option<BattleEntity>> {
        let collection = self.battle_collection().await;
        let document = collection
            .find_one(battle_id(id))
            .await
            .map_err(|source| MongoDaoError::LoadBattle { id, source })?;
        document.map(TryInto::try_into).transpose()
    }

    async fn searching_battles(&self) -> MongoResult<Vec<BattleEntity>> {
        let collection = self.battle_collection().await;
        let documents: Vec<MongoBattleDocument> = collection
            .find(doc! {"status": STATUS_SEARCHING})
            .sort(doc! {"created_at": 1})
            .await
            .map_err(|source| MongoDaoError::QuerySearching { source })?
            .try_collect()
            .await
            .map_err(|source| MongoDaoError::QuerySearching { source })?;

        documents.into_iter().map(TryInto::try_into).collect()
    }

    async fn claim_battle(
        &self,
        id: Uuid,
        challenger: BattleParticipantEntity,
    ) -> MongoResult<Option<BattleEntity>> {
        let challenger: super::models::MongoBattleParticipant = challenger.into();
        let challenger =
            serialize_to_bson(&challenger).map_err(|source| MongoDaoError::Serialize { source })?;

        let mut filter = battle_id(id);
        filter.insert("status", STATUS_SEARCHING);

        let collection = self.battle_collection().await;
        let document = collection
            .find_one_and_update(
                filter,
                doc! {
                    "$set": {"status": STATUS_FOUND},
                    "$push": {"participants": challenger},
                },
            )
            .return_document(ReturnDocument::After)
            .await
            .map_err(|source| MongoDaoError::WriteBattle { id, source })?;

        document.map(TryInto::try_into).transpose()
    }

    async fn cancel_battle(&self, id: Uuid) -> MongoResult<CancelOutcome> {
        let mut filter = battle_id(id);
        filter.insert("status", STATUS_SEARCHING);

        let collection = self.battle_collection().await;
        let result = collection
            .delete_one(filter)
            .await
            .map_err(|source| MongoDaoError::WriteBattle { id, source })?;

        if result.deleted_count > 0 {
            return Ok(CancelOutcome::Deleted);
        }

        // Nothing matched the searching filter; distinguish a vanished record
        // from one a challenger already claimed.
        match self.find_battle(id).await? {
            Some(_) => Ok(CancelOutcome::AlreadyMatched),
            None => Ok(CancelOutcome::Missing),
        }
    }

    async fn insert_room(&self, room: RoomEntity) -> MongoResult<bool> {
        let code = room.code.clone();
        let document: MongoRoomDocument = room.into();
        let collection = self.room_collection().await;

        match collection.insert_one(&document).await {
            Ok(_) => Ok(true),
            Err(err) if is_duplicate_key(&err) => Ok(false),
            Err(source) => Err(MongoDaoError::WriteRoom { code, source }),
        }
    }

    async fn find_room(&self, code: String) -> MongoResult<Option<RoomEntity>> {
        let collection = self.room_collection().await;
        let document = collection
            .find_one(room_id(&code))
            .await
            .map_err(|source| MongoDaoError::LoadRoom { code, source })?;
        document.map(TryInto::try_into).transpose()
    }

    async fn append_participant(
        &self,
        code: String,
        participant: RoomParticipantEntity,
    ) -> MongoResult<Option<RoomEntity>> {
        let user_id = participant.user_id.to_string();
        let participant: super::models::MongoRoomParticipant = participant.into();
        let participant =
            serialize_to_bson(&participant).map_err(|source| MongoDaoError::Serialize { source })?;

        // Union semantics: only push when no element already carries this
        // user id, so concurrent joins cannot duplicate the participant.
        // Completed rooms no longer accept joins.
        let mut filter = room_id(&code);
        filter.insert("status", doc! {"$ne": STATUS_COMPLETED});
        filter.insert("participants.user_id", doc! {"$ne": user_id});

        let collection = self.room_collection().await;
        let document = collection
            .find_one_and_update(filter, doc! {"$push": {"participants": participant}})
            .return_document(ReturnDocument::After)
            .await
            .map_err(|source| MongoDaoError::WriteRoom { code, source })?;

        document.map(TryInto::try_into).transpose()
    }

    async fn start_room(
        &self,
        code: String,
        contest: ContestConfig,
    ) -> MongoResult<Option<RoomEntity>> {
        let started_at = mongodb::bson::DateTime::from_system_time(contest.started_at);
        let problems = serialize_to_bson(&contest.problems)
            .map_err(|source| MongoDaoError::Serialize { source })?;
        let topics = serialize_to_bson(&contest.topics)
            .map_err(|source| MongoDaoError::Serialize { source })?;
        let difficulties = serialize_to_bson(&contest.difficulties)
            .map_err(|source| MongoDaoError::Serialize { source })?;

        let mut filter = room_id(&code);
        filter.insert("status", STATUS_NOT_STARTED);

        let collection = self.room_collection().await;
        let document = collection
            .find_one_and_update(
                filter,
                doc! {
                    "$set": {
                        "status": STATUS_IN_PROGRESS,
                        "started_at": started_at,
                        "topics": topics,
                        "difficulties": difficulties,
                        "num_problems": contest.num_problems as i32,
                        "problems": problems,
                    },
                },
            )
            .return_document(ReturnDocument::After)
            .await
            .map_err(|source| MongoDaoError::WriteRoom { code, source })?;

        document.map(TryInto::try_into).transpose()
    }

    async fn complete_room(&self, code: String) -> MongoResult<Option<RoomEntity>> {
        let mut filter = room_id(&code);
        filter.insert("status", STATUS_IN_PROGRESS);

        let collection = self.room_collection().await;
        let document = collection
            .find_one_and_update(filter, doc! {"$set": {"status": STATUS_COMPLETED}})
            .return_document(ReturnDocument::After)
            .await
            .map_err(|source| MongoDaoError::WriteRoom { code, source })?;

        document.map(TryInto::try_into).transpose()
    }

    async fn apply_solve(
        &self,
        code: String,
        user_id: Uuid,
        problem_id: String,
        time_taken_secs: u64,
    ) -> MongoResult<Option<RoomEntity>> {
        // The elemMatch both targets the participant for the positional
        // update and guards against crediting the same problem twice.
        let mut filter = room_id(&code);
        filter.insert("status", STATUS_IN_PROGRESS);
        filter.insert(
            "participants",
            doc! {
                "$elemMatch": {
                    "user_id": user_id.to_string(),
                    "solved_problem_ids": {"$ne": &problem_id},
                },
            },
        );

        let collection = self.room_collection().await;
        let document = collection
            .find_one_and_update(
                filter,
                doc! {
                    "$addToSet": {"participants.$.solved_problem_ids": problem_id},
                    "$inc": {
                        "participants.$.total_solved": 1,
                        "participants.$.total_time_taken_secs": time_taken_secs as i64,
                    },
                },
            )
            .return_document(ReturnDocument::After)
            .await
            .map_err(|source| MongoDaoError::WriteRoom { code, source })?;

        document.map(TryInto::try_into).transpose()
    }
}

fn is_duplicate_key(err: &mongodb::error::Error) -> bool {
    matches!(
        err.kind.as_ref(),
        ErrorKind::Write(WriteFailure::WriteError(write_error)) if write_error.code == 11000
    )
}

impl ContestStore for MongoContestStore {
    fn create_battle(&self, battle: BattleEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.create_battle(battle).await.map_err(Into::into) })
    }

    fn find_battle(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<BattleEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.find_battle(id).await.map_err(Into::into) })
    }

    fn searching_battles(&self) -> BoxFuture<'static, StorageResult<Vec<BattleEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.searching_battles().await.map_err(Into::into) })
    }

    fn claim_battle(
        &self,
        id: Uuid,
        challenger: BattleParticipantEntity,
    ) -> BoxFuture<'static, StorageResult<Option<BattleEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.claim_battle(id, challenger).await.map_err(Into::into) })
    }

    fn cancel_battle(&self, id: Uuid) -> BoxFuture<'static, StorageResult<CancelOutcome>> {
        let store = self.clone();
        Box::pin(async move { store.cancel_battle(id).await.map_err(Into::into) })
    }

    fn insert_room(&self, room: RoomEntity) -> BoxFuture<'static, StorageResult<bool>> {
        let store = self.clone();
        Box::pin(async move { store.insert_room(room).await.map_err(Into::into) })
    }

    fn find_room(&self, code: String) -> BoxFuture<'static, StorageResult<Option<RoomEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.find_room(code).await.map_err(Into::into) })
    }

    fn append_participant(
        &self,
        code: String,
        participant: RoomParticipantEntity,
    ) -> BoxFuture<'static, StorageResult<Option<RoomEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .append_participant(code, participant)
                .await
                .map_err(Into::into)
        })
    }

    fn start_room(
        &self,
        code: String,
        contest: ContestConfig,
    ) -> BoxFuture<'static, StorageResult<Option<RoomEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.start_room(code, contest).await.map_err(Into::into) })
    }

    fn complete_room(
        &self,
        code: String,
    ) -> BoxFuture<'static, StorageResult<Option<RoomEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.complete_room(code).await.map_err(Into::into) })
    }

    fn apply_solve(
        &self,
        code: String,
        user_id: Uuid,
        problem_id: String,
        time_taken_secs: u64,
    ) -> BoxFuture<'static, StorageResult<Option<RoomEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .apply_solve(code, user_id, problem_id, time_taken_secs)
                .await
                .map_err(Into::into)
        })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.inner.ping().await.map_err(Into::into) })
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.inner.reconnect().await.map_err(Into::into) })
    }
}
