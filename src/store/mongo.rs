use std::time::Duration;

use async_trait::async_trait;
use futures::stream;
use futures_util::TryStreamExt;
use mongodb::{
    bson::{doc, oid::ObjectId, Document},
    Collection, Database,
};
use tokio::time::sleep;

use crate::store::{ChangeStream, DocumentStore, StoreError};

const DEFAULT_WATCH_INTERVAL: Duration = Duration::from_secs(2);

/// Production store backed by a MongoDB database. `watch` re-queries the
/// matching set on an interval and emits only when the snapshot changed,
/// so observers see the same snapshot semantics as the in-memory store.
#[derive(Clone)]
pub struct MongoStore {
    db: Database,
    watch_interval: Duration,
}

impl MongoStore {
    pub fn new(db: Database) -> Self {
        Self {
            db,
            watch_interval: DEFAULT_WATCH_INTERVAL,
        }
    }

    pub fn with_watch_interval(mut self, interval: Duration) -> Self {
        self.watch_interval = interval;
        self
    }

    fn collection(&self, name: &str) -> Collection<Document> {
        self.db.collection::<Document>(name)
    }
}

struct WatchState {
    coll: Collection<Document>,
    filter: Document,
    last: Option<Vec<Document>>,
    interval: Duration,
    done: bool,
}

async fn fetch_snapshot(
    coll: &Collection<Document>,
    filter: Document,
) -> Result<Vec<Document>, StoreError> {
    let mut cursor = coll
        .find(filter)
        .await
        .map_err(|e| StoreError::Unavailable(e.to_string()))?;

    let mut docs = Vec::new();
    while let Some(doc) = cursor
        .try_next()
        .await
        .map_err(|e| StoreError::Unavailable(e.to_string()))?
    {
        docs.push(doc);
    }
    Ok(docs)
}

#[async_trait]
impl DocumentStore for MongoStore {
    async fn create(&self, collection: &str, mut record: Document) -> Result<String, StoreError> {
        let id = ObjectId::new().to_hex();
        record.insert("_id", id.clone());

        self.collection(collection)
            .insert_one(record)
            .await
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;

        Ok(id)
    }

    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, StoreError> {
        self.collection(collection)
            .find_one(doc! { "_id": id })
            .await
            .map_err(|e| StoreError::Unavailable(e.to_string()))
    }

    async fn query(&self, collection: &str, filter: Document) -> Result<Vec<Document>, StoreError> {
        fetch_snapshot(&self.collection(collection), filter).await
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<(), StoreError> {
        self.collection(collection)
            .delete_one(doc! { "_id": id })
            .await
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;
        Ok(())
    }

    fn watch(&self, collection: &str, filter: Document) -> ChangeStream {
        let state = WatchState {
            coll: self.collection(collection),
            filter,
            last: None,
            interval: self.watch_interval,
            done: false,
        };

        Box::pin(stream::unfold(state, |mut state| async move {
            if state.done {
                return None;
            }

            loop {
                // The first snapshot goes out immediately; afterwards the
                // matching set is re-read once per interval.
                if state.last.is_some() {
                    sleep(state.interval).await;
                }

                match fetch_snapshot(&state.coll, state.filter.clone()).await {
                    Ok(docs) => {
                        if state.last.as_ref() != Some(&docs) {
                            state.last = Some(docs.clone());
                            return Some((Ok(docs), state));
                        }
                    }
                    Err(err) => {
                        state.done = true;
                        return Some((Err(err), state));
                    }
                }
            }
        }))
    }
}
