use std::sync::Arc;

use futures::stream::{self, Stream, StreamExt};
use mongodb::bson::{doc, Document};

use crate::core::{aggregate, decode, AggregatedResult, VoteError};
use crate::models::poll_models::Poll;
use crate::models::vote_models::Vote;
use crate::store::{DocumentStore, StoreError, POLLS_COLLECTION, VOTES_COLLECTION};

/// Observable state of one live-results subscription. A subscription moves
/// from `Loading` to a `Ready` per tally recomputation, or to `Failed`,
/// which is terminal: the stream ends after delivering it and the caller
/// must re-subscribe for a fresh feed.
#[derive(Debug, Clone, PartialEq)]
pub enum LiveResults {
    Loading,
    Ready {
        poll: Poll,
        results: AggregatedResult,
    },
    Failed(String),
}

enum FeedEvent {
    Poll(Result<Vec<Document>, StoreError>),
    Votes(Result<Vec<Document>, StoreError>),
}

struct SubscriptionState {
    user_id: String,
    poll: Option<Poll>,
    votes: Option<Vec<Vote>>,
}

/// Follow a poll and its votes, recomputing the tally on every snapshot
/// from either feed. The first item is always `Loading`; a `Ready` goes
/// out once both feeds have reported and again on each subsequent change.
/// A `Failed` ends the stream at once. Dropping the stream detaches both
/// feeds immediately; an in-flight `cast_vote` is unaffected by
/// cancellation.
pub fn watch_poll_results(
    store: Arc<dyn DocumentStore>,
    poll_id: &str,
    user_id: &str,
) -> impl Stream<Item = LiveResults> {
    let poll_feed = store
        .watch(POLLS_COLLECTION, doc! { "_id": poll_id })
        .map(FeedEvent::Poll);
    let votes_feed = store
        .watch(VOTES_COLLECTION, doc! { "poll_id": poll_id })
        .map(FeedEvent::Votes);

    let merged = stream::select(poll_feed, votes_feed);
    let state = SubscriptionState {
        user_id: user_id.to_string(),
        poll: None,
        votes: None,
    };

    let updates = stream::unfold(Some((merged, state)), |slot| async move {
        let (mut merged, mut state) = slot?;
        loop {
            let event = merged.next().await?;
            if let Some(item) = apply_event(&mut state, event) {
                // Failed is terminal: drop the feeds so nothing more can
                // be delivered after it.
                let next = if matches!(item, LiveResults::Failed(_)) {
                    None
                } else {
                    Some((merged, state))
                };
                return Some((item, next));
            }
        }
    });

    stream::once(futures::future::ready(LiveResults::Loading)).chain(updates)
}

/// One transition of the subscription state machine. `None` swallows
/// snapshots that arrive before both feeds have reported.
fn apply_event(state: &mut SubscriptionState, event: FeedEvent) -> Option<LiveResults> {
    match event {
        FeedEvent::Poll(Err(err)) | FeedEvent::Votes(Err(err)) => {
            return Some(LiveResults::Failed(err.to_string()));
        }
        FeedEvent::Poll(Ok(docs)) => {
            // The poll feed is filtered on one id: an empty snapshot means
            // the poll is gone.
            let Some(doc) = docs.into_iter().next() else {
                return Some(LiveResults::Failed(VoteError::NotFound.to_string()));
            };
            match decode::<Poll>(doc) {
                Ok(poll) => state.poll = Some(poll),
                Err(err) => return Some(LiveResults::Failed(err.to_string())),
            }
        }
        FeedEvent::Votes(Ok(docs)) => {
            let parsed: Result<Vec<Vote>, VoteError> = docs.into_iter().map(decode).collect();
            match parsed {
                Ok(votes) => state.votes = Some(votes),
                Err(err) => return Some(LiveResults::Failed(err.to_string())),
            }
        }
    }

    match (&state.poll, &state.votes) {
        (Some(poll), Some(votes)) => Some(LiveResults::Ready {
            poll: poll.clone(),
            results: aggregate(poll, votes, &state.user_id),
        }),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{AdmissionPolicy, PollDirectory, VoteLedger};
    use crate::store::{ChangeStream, InMemoryStore};
    use async_trait::async_trait;
    use chrono::Utc;
    use std::time::Duration;
    use tokio::time::timeout;

    async fn next(stream: &mut (impl Stream<Item = LiveResults> + Unpin)) -> Option<LiveResults> {
        timeout(Duration::from_secs(5), stream.next())
            .await
            .expect("subscription delivery timed out")
    }

    fn draft_poll(allow_multiple_votes: bool) -> Poll {
        Poll {
            id: String::new(),
            question: "Best lunch?".to_string(),
            options: vec!["Pizza".to_string(), "Burger".to_string()],
            created_by: "u1".to_string(),
            created_at: Utc::now(),
            expires_at: None,
            is_active: true,
            allow_multiple_votes,
        }
    }

    #[tokio::test]
    async fn delivers_loading_then_monotonic_ready_totals() {
        let store: Arc<dyn DocumentStore> = Arc::new(InMemoryStore::new());
        let directory = PollDirectory::new(Arc::clone(&store));
        let ledger = VoteLedger::new(Arc::clone(&store), AdmissionPolicy::default());

        let poll = directory.create(draft_poll(false)).await.unwrap();
        ledger.cast_vote(&poll, "u1", 0).await.unwrap();

        let mut feed = Box::pin(watch_poll_results(Arc::clone(&store), &poll.id, "u2"));

        assert_eq!(next(&mut feed).await, Some(LiveResults::Loading));

        let first_total = match next(&mut feed).await {
            Some(LiveResults::Ready { results, .. }) => {
                assert_eq!(results.total_votes, 1);
                assert_eq!(results.count(0), 1);
                assert_eq!(results.current_user_choice, None);
                results.total_votes
            }
            other => panic!("expected Ready, got {:?}", other),
        };

        ledger.cast_vote(&poll, "u2", 1).await.unwrap();

        match next(&mut feed).await {
            Some(LiveResults::Ready { results, .. }) => {
                assert!(results.total_votes >= first_total);
                assert_eq!(results.total_votes, 2);
                assert_eq!(results.count(1), 1);
                assert_eq!(results.current_user_choice, Some(1));
            }
            other => panic!("expected Ready, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn deleted_poll_fails_and_ends_the_stream() {
        let store: Arc<dyn DocumentStore> = Arc::new(InMemoryStore::new());
        let directory = PollDirectory::new(Arc::clone(&store));

        let poll = directory.create(draft_poll(false)).await.unwrap();
        let mut feed = Box::pin(watch_poll_results(Arc::clone(&store), &poll.id, "u1"));

        assert_eq!(next(&mut feed).await, Some(LiveResults::Loading));
        assert!(matches!(
            next(&mut feed).await,
            Some(LiveResults::Ready { .. })
        ));

        directory.delete(&poll.id, "u1").await.unwrap();

        match next(&mut feed).await {
            Some(LiveResults::Failed(message)) => assert!(message.contains("not found")),
            other => panic!("expected Failed, got {:?}", other),
        }
        assert_eq!(next(&mut feed).await, None);
    }

    #[tokio::test]
    async fn subscribing_to_a_missing_poll_fails() {
        let store: Arc<dyn DocumentStore> = Arc::new(InMemoryStore::new());
        let mut feed = Box::pin(watch_poll_results(Arc::clone(&store), "missing", "u1"));

        assert_eq!(next(&mut feed).await, Some(LiveResults::Loading));
        assert!(matches!(next(&mut feed).await, Some(LiveResults::Failed(_))));
        assert_eq!(next(&mut feed).await, None);
    }

    /// Store whose feeds fail immediately, for the error path.
    struct BrokenStore;

    #[async_trait]
    impl DocumentStore for BrokenStore {
        async fn create(&self, _: &str, _: Document) -> Result<String, StoreError> {
            Err(StoreError::Unavailable("down".to_string()))
        }

        async fn get(&self, _: &str, _: &str) -> Result<Option<Document>, StoreError> {
            Err(StoreError::Unavailable("down".to_string()))
        }

        async fn query(&self, _: &str, _: Document) -> Result<Vec<Document>, StoreError> {
            Err(StoreError::Unavailable("down".to_string()))
        }

        async fn delete(&self, _: &str, _: &str) -> Result<(), StoreError> {
            Err(StoreError::Unavailable("down".to_string()))
        }

        fn watch(&self, _: &str, _: Document) -> ChangeStream {
            Box::pin(stream::once(futures::future::ready(Err(
                StoreError::Unavailable("down".to_string()),
            ))))
        }
    }

    #[tokio::test]
    async fn feed_error_is_terminal() {
        let store: Arc<dyn DocumentStore> = Arc::new(BrokenStore);
        let mut feed = Box::pin(watch_poll_results(store, "p1", "u1"));

        assert_eq!(next(&mut feed).await, Some(LiveResults::Loading));
        match next(&mut feed).await {
            Some(LiveResults::Failed(message)) => assert!(message.contains("unavailable")),
            other => panic!("expected Failed, got {:?}", other),
        }
        assert_eq!(next(&mut feed).await, None);
    }
}
