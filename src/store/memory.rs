use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use futures::stream;
use mongodb::bson::Document;
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::store::{ChangeStream, DocumentStore, StoreError};

type Collections = Arc<Mutex<HashMap<String, Vec<Document>>>>;

/// Store kept entirely in process memory, with a broadcast channel waking
/// watchers whenever a collection changes. Used by the test suites; it
/// honors the same snapshot semantics as the MongoDB store.
#[derive(Clone)]
pub struct InMemoryStore {
    collections: Collections,
    changes: broadcast::Sender<String>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        let (changes, _) = broadcast::channel(64);
        Self {
            collections: Arc::new(Mutex::new(HashMap::new())),
            changes,
        }
    }

    fn snapshot(&self, collection: &str, filter: &Document) -> Vec<Document> {
        snapshot_matching(&self.collections, collection, filter)
    }

    fn notify(&self, collection: &str) {
        // Nobody listening is fine; watchers subscribe lazily.
        let _ = self.changes.send(collection.to_string());
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

fn matches(doc: &Document, filter: &Document) -> bool {
    filter.iter().all(|(key, value)| doc.get(key) == Some(value))
}

fn snapshot_matching(
    collections: &Collections,
    collection: &str,
    filter: &Document,
) -> Vec<Document> {
    let guard = collections.lock().expect("store mutex poisoned");
    guard
        .get(collection)
        .map(|docs| {
            docs.iter()
                .filter(|doc| matches(doc, filter))
                .cloned()
                .collect()
        })
        .unwrap_or_default()
}

struct WatchState {
    collections: Collections,
    rx: broadcast::Receiver<String>,
    collection: String,
    filter: Document,
    first: bool,
}

#[async_trait]
impl DocumentStore for InMemoryStore {
    async fn create(&self, collection: &str, mut record: Document) -> Result<String, StoreError> {
        let id = Uuid::new_v4().to_string();
        record.insert("_id", id.clone());

        {
            let mut guard = self.collections.lock().expect("store mutex poisoned");
            guard
                .entry(collection.to_string())
                .or_default()
                .push(record);
        }

        self.notify(collection);
        Ok(id)
    }

    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, StoreError> {
        let guard = self.collections.lock().expect("store mutex poisoned");
        let found = guard.get(collection).and_then(|docs| {
            docs.iter()
                .find(|doc| doc.get_str("_id").map(|v| v == id).unwrap_or(false))
                .cloned()
        });
        Ok(found)
    }

    async fn query(&self, collection: &str, filter: Document) -> Result<Vec<Document>, StoreError> {
        Ok(self.snapshot(collection, &filter))
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<(), StoreError> {
        {
            let mut guard = self.collections.lock().expect("store mutex poisoned");
            if let Some(docs) = guard.get_mut(collection) {
                docs.retain(|doc| doc.get_str("_id").map(|v| v != id).unwrap_or(true));
            }
        }

        self.notify(collection);
        Ok(())
    }

    fn watch(&self, collection: &str, filter: Document) -> ChangeStream {
        let state = WatchState {
            collections: Arc::clone(&self.collections),
            rx: self.changes.subscribe(),
            collection: collection.to_string(),
            filter,
            first: true,
        };

        Box::pin(stream::unfold(state, |mut state| async move {
            if !state.first {
                loop {
                    match state.rx.recv().await {
                        Ok(changed) if changed == state.collection => break,
                        Ok(_) => continue,
                        // Missed signals still mean "something changed";
                        // re-snapshot rather than give up.
                        Err(broadcast::error::RecvError::Lagged(_)) => break,
                        Err(broadcast::error::RecvError::Closed) => return None,
                    }
                }
            }
            state.first = false;

            let snapshot =
                snapshot_matching(&state.collections, &state.collection, &state.filter);
            Some((Ok(snapshot), state))
        }))
    }
}
