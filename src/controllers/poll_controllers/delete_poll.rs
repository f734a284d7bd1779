use axum::{
    extract::{Extension, Path, State},
    Json,
};
use serde_json::json;

use crate::state::AppState;
use crate::utils::error::AppResult;
use crate::utils::session::Claims;

pub async fn delete_poll(
    Path(poll_id): Path<String>,
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> AppResult<Json<serde_json::Value>> {
    state.polls.delete(&poll_id, &claims.sub).await?;

    Ok(Json(json!({ "deleted": true })))
}
