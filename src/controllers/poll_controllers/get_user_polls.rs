use axum::{
    extract::{Extension, State},
    Json,
};

use crate::controllers::poll_controllers::models::PollResponse;
use crate::state::AppState;
use crate::utils::error::AppResult;
use crate::utils::session::Claims;

pub async fn get_polls_by_user(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> AppResult<Json<Vec<PollResponse>>> {
    let polls = state.polls.for_user(&claims.sub).await?;

    let poll_responses: Vec<PollResponse> = polls.into_iter().map(PollResponse::from).collect();

    Ok(Json(poll_responses))
}
