use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use tracing::{info, instrument};

use super::repo::{self, HistoryEntry};
use super::services;
use crate::error::{is_foreign_key_violation, AppError, AppResult};
use crate::state::AppState;
use crate::wishlist::dto::UserRecipeRequest;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/:user_id", get(list_history))
        .route("/add", post(add_history))
}

#[instrument(skip(state))]
pub async fn list_history(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
) -> AppResult<Json<Vec<HistoryEntry>>> {
    Ok(Json(repo::list_for_user(&state.db, user_id).await?))
}

#[instrument(skip(state))]
pub async fn add_history(
    State(state): State<AppState>,
    Json(payload): Json<UserRecipeRequest>,
) -> AppResult<(StatusCode, Json<Value>)> {
    let (user_id, recipe_id) = payload.require()?;

    let id = services::record_view(&state.db, user_id, recipe_id)
        .await
        .map_err(|e| {
            if is_foreign_key_violation(&e) {
                AppError::not_found("User or recipe not found")
            } else {
                e.into()
            }
        })?;

    info!(user_id, recipe_id, history_id = id, "view recorded");
    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "History added", "id": id })),
    ))
}
