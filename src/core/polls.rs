use std::sync::Arc;

use mongodb::bson::doc;
use tracing::debug;

use crate::core::{decode, encode, VoteError};
use crate::models::poll_models::Poll;
use crate::store::{DocumentStore, POLLS_COLLECTION};

/// Read/write access to the poll collection. Polls are created once and
/// never updated; the only mutation after creation is an owner-only
/// delete.
pub struct PollDirectory {
    store: Arc<dyn DocumentStore>,
}

impl PollDirectory {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Persist a new poll and return it with its store-assigned id.
    pub async fn create(&self, poll: Poll) -> Result<Poll, VoteError> {
        let id = self.store.create(POLLS_COLLECTION, encode(&poll)?).await?;
        debug!(poll_id = %id, created_by = %poll.created_by, "poll created");
        Ok(Poll { id, ..poll })
    }

    pub async fn get(&self, poll_id: &str) -> Result<Poll, VoteError> {
        let doc = self
            .store
            .get(POLLS_COLLECTION, poll_id)
            .await?
            .ok_or(VoteError::NotFound)?;
        decode(doc)
    }

    /// All polls, newest first.
    pub async fn list(&self) -> Result<Vec<Poll>, VoteError> {
        let docs = self.store.query(POLLS_COLLECTION, doc! {}).await?;
        let mut polls: Vec<Poll> = docs.into_iter().map(decode).collect::<Result<_, _>>()?;
        polls.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(polls)
    }

    /// One user's polls, newest first.
    pub async fn for_user(&self, user_id: &str) -> Result<Vec<Poll>, VoteError> {
        let docs = self
            .store
            .query(POLLS_COLLECTION, doc! { "created_by": user_id })
            .await?;
        let mut polls: Vec<Poll> = docs.into_iter().map(decode).collect::<Result<_, _>>()?;
        polls.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(polls)
    }

    /// Delete a poll on behalf of `requesting_user`; only the creator may.
    /// Vote records are left in place: every read path starts from the
    /// poll, and live feeds observe the empty poll snapshot and end.
    pub async fn delete(&self, poll_id: &str, requesting_user: &str) -> Result<(), VoteError> {
        let poll = self.get(poll_id).await?;
        if poll.created_by != requesting_user {
            return Err(VoteError::NotOwner);
        }

        self.store.delete(POLLS_COLLECTION, poll_id).await?;
        debug!(poll_id, "poll deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryStore;
    use chrono::{Duration, Utc};

    fn directory() -> PollDirectory {
        PollDirectory::new(Arc::new(InMemoryStore::new()))
    }

    fn draft_poll(question: &str, created_by: &str, age: Duration) -> Poll {
        Poll {
            id: String::new(),
            question: question.to_string(),
            options: vec!["A".to_string(), "B".to_string()],
            created_by: created_by.to_string(),
            created_at: Utc::now() - age,
            expires_at: None,
            is_active: true,
            allow_multiple_votes: false,
        }
    }

    #[tokio::test]
    async fn create_then_get_round_trips() {
        let directory = directory();

        let created = directory
            .create(draft_poll("Best lunch?", "u1", Duration::zero()))
            .await
            .unwrap();
        assert!(!created.id.is_empty());

        let fetched = directory.get(&created.id).await.unwrap();
        assert_eq!(fetched, created);
    }

    #[tokio::test]
    async fn missing_poll_is_not_found() {
        let directory = directory();
        let err = directory.get("nope").await.unwrap_err();
        assert!(matches!(err, VoteError::NotFound));
    }

    #[tokio::test]
    async fn list_is_newest_first() {
        let directory = directory();
        directory
            .create(draft_poll("old", "u1", Duration::hours(2)))
            .await
            .unwrap();
        directory
            .create(draft_poll("new", "u2", Duration::zero()))
            .await
            .unwrap();
        directory
            .create(draft_poll("middle", "u1", Duration::hours(1)))
            .await
            .unwrap();

        let polls = directory.list().await.unwrap();
        let questions: Vec<&str> = polls.iter().map(|p| p.question.as_str()).collect();
        assert_eq!(questions, vec!["new", "middle", "old"]);
    }

    #[tokio::test]
    async fn for_user_filters_by_creator() {
        let directory = directory();
        directory
            .create(draft_poll("mine", "u1", Duration::hours(1)))
            .await
            .unwrap();
        directory
            .create(draft_poll("theirs", "u2", Duration::zero()))
            .await
            .unwrap();
        directory
            .create(draft_poll("mine too", "u1", Duration::zero()))
            .await
            .unwrap();

        let polls = directory.for_user("u1").await.unwrap();
        assert_eq!(polls.len(), 2);
        assert!(polls.iter().all(|p| p.created_by == "u1"));
        assert_eq!(polls[0].question, "mine too");
    }

    #[tokio::test]
    async fn only_the_creator_can_delete() {
        let directory = directory();
        let poll = directory
            .create(draft_poll("Best lunch?", "u1", Duration::zero()))
            .await
            .unwrap();

        let err = directory.delete(&poll.id, "u2").await.unwrap_err();
        assert!(matches!(err, VoteError::NotOwner));
        assert!(directory.get(&poll.id).await.is_ok());

        directory.delete(&poll.id, "u1").await.unwrap();
        let err = directory.get(&poll.id).await.unwrap_err();
        assert!(matches!(err, VoteError::NotFound));
    }
}
