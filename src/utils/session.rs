use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: String,
    pub exp: usize,
}

fn secret() -> String {
    env::var("SESSION_SECRET").unwrap_or_else(|_| "default-secret-key".to_string())
}

/// Mint a session token for a user id. Token issuance normally lives with
/// the external auth service; this helper exists for tooling and tests.
pub fn create_token(user_id: &str) -> Result<String, jsonwebtoken::errors::Error> {
    let expiration = Utc::now()
        .checked_add_signed(Duration::hours(24))
        .expect("valid timestamp")
        .timestamp();

    let claims = Claims {
        sub: user_id.to_string(),
        exp: expiration as usize,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret().as_bytes()),
    )
}

pub fn verify_token(token: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret().as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_round_trip_preserves_subject() {
        let token = create_token("user-42").unwrap();
        let claims = verify_token(&token).unwrap();
        assert_eq!(claims.sub, "user-42");
    }

    #[test]
    fn garbage_token_is_rejected() {
        assert!(verify_token("not-a-token").is_err());
    }
}
