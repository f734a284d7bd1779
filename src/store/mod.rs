use std::fmt;

use async_trait::async_trait;
use futures::stream::BoxStream;
use mongodb::bson::Document;

pub mod memory;
pub mod mongo;

pub use memory::InMemoryStore;
pub use mongo::MongoStore;

pub const POLLS_COLLECTION: &str = "polls";
pub const VOTES_COLLECTION: &str = "votes";

#[derive(Debug)]
pub enum StoreError {
    /// The backing store could not be reached or refused the operation.
    Unavailable(String),
    /// A stored record could not be converted to or from its typed form.
    Serialization(String),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::Unavailable(msg) => write!(f, "Store unavailable: {}", msg),
            StoreError::Serialization(msg) => write!(f, "Serialization error: {}", msg),
        }
    }
}

impl std::error::Error for StoreError {}

/// Live feed of point-in-time snapshots of a matching document set. Each
/// emission is the full matching set, not a delta. Dropping the stream
/// detaches the feed; nothing is delivered afterwards.
pub type ChangeStream = BoxStream<'static, Result<Vec<Document>, StoreError>>;

/// The document-store collaborator every other component is built against.
/// Implementations own durability and ordering; callers hold transient,
/// recomputed-on-demand copies of whatever they read.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Durably write a new document and return its store-assigned id. Any
    /// `_id` already present on the record is replaced.
    async fn create(&self, collection: &str, record: Document) -> Result<String, StoreError>;

    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, StoreError>;

    /// All documents whose fields equal every field of `filter`. An empty
    /// filter matches the whole collection.
    async fn query(&self, collection: &str, filter: Document) -> Result<Vec<Document>, StoreError>;

    async fn delete(&self, collection: &str, id: &str) -> Result<(), StoreError>;

    /// Subscribe to the documents matching `filter`: an initial snapshot,
    /// then a fresh snapshot whenever the matching set changes. A feed
    /// error ends the stream after the error is delivered.
    fn watch(&self, collection: &str, filter: Document) -> ChangeStream;
}
