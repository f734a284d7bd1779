use axum::{
    extract::{Extension, Path, State},
    Json,
};

use crate::controllers::poll_controllers::models::VoteStatusResponse;
use crate::state::AppState;
use crate::utils::error::AppResult;
use crate::utils::session::Claims;

pub async fn check_user_vote(
    Path(poll_id): Path<String>,
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> AppResult<Json<VoteStatusResponse>> {
    let votes = state.ledger.votes_by_user(&poll_id, &claims.sub).await?;

    let option_index = votes
        .iter()
        .max_by_key(|vote| vote.timestamp)
        .map(|vote| vote.option_index);

    Ok(Json(VoteStatusResponse {
        has_voted: option_index.is_some(),
        option_index,
    }))
}
