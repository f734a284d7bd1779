use axum::{
    extract::{Extension, State},
    Json,
};
use chrono::Utc;

use crate::controllers::poll_controllers::models::{CreatePollRequest, PollResponse};
use crate::models::poll_models::{validate_poll_input, Poll};
use crate::state::AppState;
use crate::utils::error::{AppError, AppResult};
use crate::utils::session::Claims;

pub async fn create_poll(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<CreatePollRequest>,
) -> AppResult<Json<PollResponse>> {
    let (question, options) = validate_poll_input(&payload.question, &payload.options)
        .map_err(AppError::ValidationError)?;

    let now = Utc::now();

    if let Some(expires_at) = payload.expires_at {
        if expires_at <= now {
            return Err(AppError::ValidationError(
                "Poll expiry must be in the future".to_string(),
            ));
        }
    }

    let poll = Poll {
        id: String::new(),
        question,
        options,
        created_by: claims.sub,
        created_at: now,
        expires_at: payload.expires_at,
        is_active: true,
        allow_multiple_votes: payload.allow_multiple_votes,
    };

    let created = state.polls.create(poll).await?;

    Ok(Json(PollResponse::from(created)))
}
