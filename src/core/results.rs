use std::collections::BTreeMap;

use crate::models::poll_models::Poll;
use crate::models::vote_models::Vote;

/// Tally derived from a vote snapshot. Never persisted: it is recomputed
/// from scratch on every snapshot, not patched.
#[derive(Debug, Clone, PartialEq)]
pub struct AggregatedResult {
    /// Option index -> vote count; only options with at least one vote
    /// have an entry.
    pub vote_counts: BTreeMap<u32, u64>,
    pub total_votes: u64,
    /// The requesting user's choice. With multiple votes allowed this is
    /// their most recent vote by timestamp.
    pub current_user_choice: Option<u32>,
}

impl AggregatedResult {
    pub fn count(&self, option_index: u32) -> u64 {
        self.vote_counts.get(&option_index).copied().unwrap_or(0)
    }

    /// Share of the total in [0, 100]; 0 when nobody has voted yet.
    pub fn percentage(&self, option_index: u32) -> f64 {
        if self.total_votes == 0 {
            return 0.0;
        }
        self.count(option_index) as f64 / self.total_votes as f64 * 100.0
    }
}

/// Fold a vote snapshot into a display-ready tally. Pure and
/// deterministic: counts are order-independent, and the requesting user's
/// choice is their latest vote by timestamp (later snapshot position wins
/// a tie), so repeated calls on the same snapshot agree.
pub fn aggregate(poll: &Poll, votes: &[Vote], requesting_user: &str) -> AggregatedResult {
    let mut vote_counts: BTreeMap<u32, u64> = BTreeMap::new();
    for vote in votes {
        *vote_counts.entry(vote.option_index).or_insert(0) += 1;
    }

    let mut user_votes = votes.iter().filter(|vote| vote.user_id == requesting_user);
    let current_user_choice = if poll.allow_multiple_votes {
        user_votes
            .max_by_key(|vote| vote.timestamp)
            .map(|vote| vote.option_index)
    } else {
        // At most one vote per user can exist on this poll.
        user_votes.next().map(|vote| vote.option_index)
    };

    AggregatedResult {
        vote_counts,
        total_votes: votes.len() as u64,
        current_user_choice,
    }
}
