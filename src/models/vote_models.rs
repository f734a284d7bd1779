use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One user's selection of one option on one poll. Votes are append-only:
/// they are created by the ledger and never updated.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Vote {
    #[serde(rename = "_id")]
    pub id: String,

    pub poll_id: String,

    pub user_id: String,

    pub option_index: u32,

    pub timestamp: DateTime<Utc>,
}
