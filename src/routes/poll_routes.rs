use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use crate::controllers::poll_controllers::{
    cast_vote, check_vote, create_poll, delete_poll, get_poll, get_results, get_user_polls, polls,
};
use crate::middleware::jwt::jwt_auth;
use crate::state::AppState;

pub fn poll_routes(state: AppState) -> Router {
    Router::new()
        .route("/create", post(create_poll::create_poll))
        .route("/", get(polls::get_all_polls))
        .route("/user", get(get_user_polls::get_polls_by_user))
        .route(
            "/:poll_id",
            get(get_poll::get_poll).delete(delete_poll::delete_poll),
        )
        .route("/:poll_id/vote", post(cast_vote::cast_vote))
        .route("/:poll_id/voted", get(check_vote::check_user_vote))
        .route("/:poll_id/results", get(get_results::get_results))
        .route("/:poll_id/results/live", get(get_results::watch_results))
        .layer(middleware::from_fn(jwt_auth))
        .with_state(state)
}

/// Index router for the collection root. Nesting `poll_routes` at `/api/polls`
/// makes its `/` route answer at `/api/polls` only; axum does not map a nested
/// `/` to the prefix-with-trailing-slash form. This index router, nested at
/// `/api/polls/`, serves `GET /api/polls/` (the spec's list endpoint) through
/// the same auth layer.
pub fn poll_index_route(state: AppState) -> Router {
    Router::new()
        .route("/", get(polls::get_all_polls))
        .layer(middleware::from_fn(jwt_auth))
        .with_state(state)
}
