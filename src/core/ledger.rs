use std::sync::Arc;

use chrono::Utc;
use mongodb::bson::doc;
use tracing::debug;

use crate::core::{decode, encode, VoteError};
use crate::models::poll_models::Poll;
use crate::models::vote_models::Vote;
use crate::store::{DocumentStore, VOTES_COLLECTION};

/// What the ledger does with votes on inactive or past-deadline polls.
/// The original data model carries both flags without enforcing them, so
/// enforcement is a deployment choice rather than a fixed contract.
#[derive(Debug, Clone, Copy)]
pub struct AdmissionPolicy {
    pub reject_inactive: bool,
    pub reject_expired: bool,
}

impl Default for AdmissionPolicy {
    fn default() -> Self {
        Self {
            reject_inactive: true,
            reject_expired: true,
        }
    }
}

impl AdmissionPolicy {
    /// Admit everything the data model allows, like the original system.
    pub fn permissive() -> Self {
        Self {
            reject_inactive: false,
            reject_expired: false,
        }
    }
}

/// The authoritative append-only record of votes. Admission is decided
/// against the store's current contents: the check-then-append sequence is
/// not atomic across processes, so concurrent casts from different
/// processes can slip a duplicate through; the store stays the sole
/// arbiter of ordering.
pub struct VoteLedger {
    store: Arc<dyn DocumentStore>,
    policy: AdmissionPolicy,
}

impl VoteLedger {
    pub fn new(store: Arc<dyn DocumentStore>, policy: AdmissionPolicy) -> Self {
        Self { store, policy }
    }

    /// Admit or reject a vote. On success exactly one new vote record is
    /// persisted and returned; on failure the store is untouched.
    pub async fn cast_vote(
        &self,
        poll: &Poll,
        user_id: &str,
        option_index: u32,
    ) -> Result<Vote, VoteError> {
        if !poll.has_option(option_index) {
            return Err(VoteError::InvalidOption {
                index: option_index,
                option_count: poll.options.len(),
            });
        }

        if self.policy.reject_inactive && !poll.is_active {
            return Err(VoteError::PollClosed);
        }

        if self.policy.reject_expired && poll.is_expired(Utc::now()) {
            return Err(VoteError::PollExpired);
        }

        if !poll.allow_multiple_votes {
            let existing = self
                .store
                .query(
                    VOTES_COLLECTION,
                    doc! { "poll_id": &poll.id, "user_id": user_id },
                )
                .await?;

            if !existing.is_empty() {
                debug!(poll_id = %poll.id, user_id, "vote rejected: already voted");
                return Err(VoteError::AlreadyVoted);
            }
        }

        let vote = Vote {
            id: String::new(),
            poll_id: poll.id.clone(),
            user_id: user_id.to_string(),
            option_index,
            timestamp: Utc::now(),
        };

        let id = self.store.create(VOTES_COLLECTION, encode(&vote)?).await?;
        debug!(poll_id = %poll.id, user_id, option_index, vote_id = %id, "vote recorded");

        Ok(Vote { id, ..vote })
    }

    /// True iff at least one vote by `user_id` exists on the poll.
    pub async fn has_voted(&self, poll_id: &str, user_id: &str) -> Result<bool, VoteError> {
        let existing = self
            .store
            .query(VOTES_COLLECTION, doc! { "poll_id": poll_id, "user_id": user_id })
            .await?;
        Ok(!existing.is_empty())
    }

    /// Current snapshot of all votes on a poll.
    pub async fn votes_for_poll(&self, poll_id: &str) -> Result<Vec<Vote>, VoteError> {
        let docs = self
            .store
            .query(VOTES_COLLECTION, doc! { "poll_id": poll_id })
            .await?;
        docs.into_iter().map(decode).collect()
    }

    /// Current snapshot of one user's votes on a poll.
    pub async fn votes_by_user(
        &self,
        poll_id: &str,
        user_id: &str,
    ) -> Result<Vec<Vote>, VoteError> {
        let docs = self
            .store
            .query(VOTES_COLLECTION, doc! { "poll_id": poll_id, "user_id": user_id })
            .await?;
        docs.into_iter().map(decode).collect()
    }
}
