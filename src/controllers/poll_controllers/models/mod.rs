use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::{AggregatedResult, LiveResults};
use crate::models::poll_models::Poll;

#[derive(Deserialize, Debug)]
pub struct CreatePollRequest {
    pub question: String,
    pub options: Vec<String>,
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub allow_multiple_votes: bool,
}

#[derive(Deserialize, Serialize, Debug)]
pub struct PollResponse {
    pub id: String,
    pub question: String,
    pub options: Vec<String>,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
    pub is_active: bool,
    pub allow_multiple_votes: bool,
}

impl From<Poll> for PollResponse {
    fn from(poll: Poll) -> Self {
        Self {
            id: poll.id,
            question: poll.question,
            options: poll.options,
            created_by: poll.created_by,
            created_at: poll.created_at,
            expires_at: poll.expires_at,
            is_active: poll.is_active,
            allow_multiple_votes: poll.allow_multiple_votes,
        }
    }
}

#[derive(Deserialize, Debug)]
pub struct CastVoteRequest {
    pub option_index: u32,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct VoteStatusResponse {
    pub has_voted: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub option_index: Option<u32>,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct OptionTally {
    pub index: u32,
    pub text: String,
    pub votes: u64,
    pub percentage: f64,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct PollResultsResponse {
    pub poll_id: String,
    pub question: String,
    pub total_votes: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_vote: Option<u32>,
    pub options: Vec<OptionTally>,
}

impl PollResultsResponse {
    pub fn from_parts(poll: &Poll, results: &AggregatedResult) -> Self {
        let options = poll
            .options
            .iter()
            .enumerate()
            .map(|(index, text)| {
                let index = index as u32;
                OptionTally {
                    index,
                    text: text.clone(),
                    votes: results.count(index),
                    percentage: (results.percentage(index) * 100.0).round() / 100.0,
                }
            })
            .collect();

        Self {
            poll_id: poll.id.clone(),
            question: poll.question.clone(),
            total_votes: results.total_votes,
            user_vote: results.current_user_choice,
            options,
        }
    }
}

/// Wire form of the live subscription states for the SSE route.
#[derive(Serialize, Debug)]
#[serde(tag = "state", rename_all = "lowercase")]
pub enum LiveResultsEvent {
    Loading,
    Ready { results: PollResultsResponse },
    Error { message: String },
}

impl From<LiveResults> for LiveResultsEvent {
    fn from(update: LiveResults) -> Self {
        match update {
            LiveResults::Loading => LiveResultsEvent::Loading,
            LiveResults::Ready { poll, results } => LiveResultsEvent::Ready {
                results: PollResultsResponse::from_parts(&poll, &results),
            },
            LiveResults::Failed(message) => LiveResultsEvent::Error { message },
        }
    }
}
