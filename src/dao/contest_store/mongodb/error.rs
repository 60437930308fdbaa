use mongodb::error::Error as MongoError;
use thiserror::Error;
use uuid::Uuid;

pub type MongoResult<T> = std::result::Result<T, MongoDaoError>;

/// Errors raised by the MongoDB contest store.
#[derive(Debug, Error)]
pub enum MongoDaoError {
    #[error("failed to parse MongoDB connection URI `{uri}`")]
    InvalidUri {
        uri: String,
        #[source]
        source: MongoError,
    },
    #[error("failed to build MongoDB client from options")]
    ClientConstruction {
        #[source]
        source: MongoError,
    },
    #[error("MongoDB ping failed during initial connection after {attempts} attempt(s)")]
    InitialPing {
        attempts: u32,
        #[source]
        source: MongoError,
    },
    #[error("MongoDB ping health check failed")]
    HealthPing {
        #[source]
        source: MongoError,
    },
    #[error("failed to ensure index `{index}` on collection `{collection}`")]
    EnsureIndex {
        collection: &'static str,
        index: &'static str,
        #[source]
        source: MongoError,
    },
    #[error("failed to write battle `{id}`")]
    WriteBattle {
        id: Uuid,
        #[source]
        source: MongoError,
    },
    #[error("failed to load battle `{id}`")]
    LoadBattle {
        id: Uuid,
        #[source]
        source: MongoError,
    },
    #[error("failed to query searching battles")]
    QuerySearching {
        #[source]
        source: MongoError,
    },
    #[error("failed to write room `{code}`")]
    WriteRoom {
        code: String,
        #[source]
        source: MongoError,
    },
    #[error("failed to load room `{code}`")]
    LoadRoom {
        code: String,
        #[source]
        source: MongoError,
    },
    #[error("failed to serialize document payload")]
    Serialize {
        #[source]
        source: mongodb::bson::error::Error,
    },
    #[error("stored id `{raw}` is not a valid UUID")]
    InvalidStoredId {
        raw: String,
        #[source]
        source: uuid::Error,
    },
}
