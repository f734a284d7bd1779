use axum::{
    extract::{Path, State},
    Json,
};

use crate::controllers::poll_controllers::models::PollResponse;
use crate::state::AppState;
use crate::utils::error::AppResult;

pub async fn get_poll(
    Path(poll_id): Path<String>,
    State(state): State<AppState>,
) -> AppResult<Json<PollResponse>> {
    let poll = state.polls.get(&poll_id).await?;
    Ok(Json(PollResponse::from(poll)))
}
