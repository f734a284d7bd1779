use axum::{
    extract::{Extension, Path, State},
    Json,
};

use crate::controllers::poll_controllers::models::{CastVoteRequest, PollResultsResponse};
use crate::core::aggregate;
use crate::state::AppState;
use crate::utils::error::AppResult;
use crate::utils::session::Claims;

pub async fn cast_vote(
    Path(poll_id): Path<String>,
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<CastVoteRequest>,
) -> AppResult<Json<PollResultsResponse>> {
    let poll = state.polls.get(&poll_id).await?;

    state
        .ledger
        .cast_vote(&poll, &claims.sub, payload.option_index)
        .await?;

    // Hand the voter the tally as it stands after their vote.
    let votes = state.ledger.votes_for_poll(&poll.id).await?;
    let results = aggregate(&poll, &votes, &claims.sub);

    Ok(Json(PollResultsResponse::from_parts(&poll, &results)))
}
