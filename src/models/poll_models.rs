use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const MIN_OPTIONS: usize = 2;
pub const MAX_OPTIONS: usize = 10;

/// A poll document. Created once by its owner and immutable afterwards;
/// the only write after creation is an owner-only delete.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Poll {
    /// Store-assigned opaque id. Empty until the store has accepted the
    /// document; `DocumentStore::create` fills it in.
    #[serde(rename = "_id")]
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

impl Poll {
    pub fn has_option(&self, index: u32) -> bool {
        (index as usize) < self.options.len()
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        match self.expires_at {
            Some(deadline) => deadline <= now,
            None => false,
        }
    }
}

/// Trim and check a caller-supplied question and option list, returning the
/// cleaned values ready to store. Options must be distinct after trimming
/// and the count must stay within [MIN_OPTIONS, MAX_OPTIONS].
pub fn validate_poll_input(
    question: &str,
    options: &[String],
) -> Result<(String, Vec<String>), String> {
    let question = question.trim();
    if question.is_empty() {
        return Err("Poll question must not be empty".to_string());
    }

    let trimmed: Vec<String> = options
        .iter()
        .map(|opt| opt.trim().to_string())
        .collect();

    if trimmed.iter().any(|opt| opt.is_empty()) {
        return Err("Poll options must not be empty".to_string());
    }

    if trimmed.len() < MIN_OPTIONS {
        return Err(format!(
            "Enter at least {} options for the user to select from",
            MIN_OPTIONS
        ));
    }

    if trimmed.len() > MAX_OPTIONS {
        return Err(format!("A poll can have at most {} options", MAX_OPTIONS));
    }

    let mut deduped = Vec::new();
    for option in &trimmed {
        if !deduped.contains(option) {
            deduped.push(option.clone());
        }
    }

    if deduped.len() != trimmed.len() {
        return Err("Poll options must be unique".to_string());
    }

    Ok((question.to_string(), trimmed))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn poll_with_expiry(expires_at: Option<DateTime<Utc>>) -> Poll {
        Poll {
            id: "p1".to_string(),
            question: "Best lunch?".to_string(),
            options: vec!["Pizza".to_string(), "Burger".to_string()],
            created_by: "u1".to_string(),
            created_at: Utc::now(),
            expires_at,
            is_active: true,
            allow_multiple_votes: false,
        }
    }

    #[test]
    fn accepts_trimmed_distinct_options() {
        let (question, options) =
            validate_poll_input(" Best lunch? ", &["  Pizza ".to_string(), "Burger".to_string()])
                .unwrap();
        assert_eq!(question, "Best lunch?");
        assert_eq!(options, vec!["Pizza".to_string(), "Burger".to_string()]);
    }

    #[test]
    fn rejects_blank_question() {
        let err = validate_poll_input("   ", &["A".to_string(), "B".to_string()]).unwrap_err();
        assert!(err.contains("question"));
    }

    #[test]
    fn rejects_too_few_options() {
        assert!(validate_poll_input("Q", &["Only".to_string()]).is_err());
    }

    #[test]
    fn rejects_too_many_options() {
        let options: Vec<String> = (0..11).map(|i| format!("opt-{}", i)).collect();
        assert!(validate_poll_input("Q", &options).is_err());
    }

    #[test]
    fn rejects_duplicate_options_after_trim() {
        let err = validate_poll_input("Q", &["Pizza".to_string(), " Pizza ".to_string()])
            .unwrap_err();
        assert!(err.contains("unique"));
    }

    #[test]
    fn option_bounds() {
        let poll = poll_with_expiry(None);
        assert!(poll.has_option(0));
        assert!(poll.has_option(1));
        assert!(!poll.has_option(2));
    }

    #[test]
    fn expiry_is_advisory_metadata() {
        let now = Utc::now();
        assert!(!poll_with_expiry(None).is_expired(now));
        assert!(!poll_with_expiry(Some(now + Duration::hours(1))).is_expired(now));
        assert!(poll_with_expiry(Some(now - Duration::hours(1))).is_expired(now));
    }
}
