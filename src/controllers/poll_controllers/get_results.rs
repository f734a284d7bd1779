use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{Extension, Path, State},
    response::sse::{Event, KeepAlive, Sse},
    Json,
};
use futures::stream::{Stream, StreamExt};

use crate::controllers::poll_controllers::models::{LiveResultsEvent, PollResultsResponse};
use crate::core::{aggregate, watch_poll_results};
use crate::state::AppState;
use crate::utils::error::AppResult;
use crate::utils::session::Claims;

/// One-shot tally of the poll as of the current vote snapshot.
pub async fn get_results(
    Path(poll_id): Path<String>,
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> AppResult<Json<PollResultsResponse>> {
    let poll = state.polls.get(&poll_id).await?;
    let votes = state.ledger.votes_for_poll(&poll.id).await?;
    let results = aggregate(&poll, &votes, &claims.sub);

    Ok(Json(PollResultsResponse::from_parts(&poll, &results)))
}

/// Live tally feed: one SSE event per subscription state transition,
/// starting with `loading`. Client disconnect cancels the subscription
/// and detaches the underlying store feeds.
pub async fn watch_results(
    Path(poll_id): Path<String>,
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> AppResult<Sse<impl Stream<Item = Result<Event, axum::Error>>>> {
    // Reject unknown polls with a proper 404 before attaching any feed.
    state.polls.get(&poll_id).await?;

    let stream = watch_poll_results(Arc::clone(&state.store), &poll_id, &claims.sub)
        .map(|update| Event::default().json_data(LiveResultsEvent::from(update)));

    Ok(Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    ))
}
