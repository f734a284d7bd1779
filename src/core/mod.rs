use std::fmt;

use mongodb::bson::Document;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::store::StoreError;

pub mod ledger;
pub mod live;
pub mod polls;
pub mod results;

pub use ledger::{AdmissionPolicy, VoteLedger};
pub use live::{watch_poll_results, LiveResults};
pub use polls::PollDirectory;
pub use results::{aggregate, AggregatedResult};

/// Failures of the poll/vote operations. Every operation reports its
/// outcome through one of these; nothing panics across an API or
/// subscription boundary.
#[derive(Debug)]
pub enum VoteError {
    /// Admission rejected: the user already has a vote on this poll.
    AlreadyVoted,
    /// The chosen option index is out of range for the poll.
    InvalidOption { index: u32, option_count: usize },
    /// Admission policy rejected a vote on a deactivated poll.
    PollClosed,
    /// Admission policy rejected a vote past the poll's deadline.
    PollExpired,
    /// The referenced poll does not exist.
    NotFound,
    /// The caller is not the poll's creator.
    NotOwner,
    /// The document store failed; the core does not retry.
    Store(StoreError),
}

impl fmt::Display for VoteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VoteError::AlreadyVoted => write!(f, "You have already voted on this poll"),
            VoteError::InvalidOption { index, option_count } => write!(
                f,
                "Option {} is not valid for this poll ({} options)",
                index, option_count
            ),
            VoteError::PollClosed => write!(f, "Poll is closed. Voting is not allowed"),
            VoteError::PollExpired => write!(f, "Poll has expired. Voting is not allowed"),
            VoteError::NotFound => write!(f, "Poll not found"),
            VoteError::NotOwner => write!(f, "Only the poll creator can do that"),
            VoteError::Store(err) => write!(f, "{}", err),
        }
    }
}

impl std::error::Error for VoteError {}

impl From<StoreError> for VoteError {
    fn from(err: StoreError) -> Self {
        VoteError::Store(err)
    }
}

pub(crate) fn encode<T: Serialize>(value: &T) -> Result<Document, VoteError> {
    mongodb::bson::to_document(value)
        .map_err(|e| VoteError::Store(StoreError::Serialization(e.to_string())))
}

pub(crate) fn decode<T: DeserializeOwned>(doc: Document) -> Result<T, VoteError> {
    mongodb::bson::from_document(doc)
        .map_err(|e| VoteError::Store(StoreError::Serialization(e.to_string())))
}
