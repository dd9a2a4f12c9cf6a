use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get, post},
    Json, Router,
};
use serde_json::{json, Value};
use tracing::{info, instrument};

use super::dto::{UserRecipeRequest, WishlistItem};
use super::repo;
use crate::error::{is_foreign_key_violation, is_unique_violation, AppError, AppResult};
use crate::state::AppState;

const ALREADY_SAVED: &str = "Recipe already in wishlist";

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/:user_id", get(list_wishlist))
        .route("/add", post(add_to_wishlist))
        .route("/remove", delete(remove_from_wishlist))
}

#[instrument(skip(state))]
pub async fn list_wishlist(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
) -> AppResult<Json<Vec<WishlistItem>>> {
    Ok(Json(repo::list_for_user(&state.db, user_id).await?))
}

#[instrument(skip(state))]
pub async fn add_to_wishlist(
    State(state): State<AppState>,
    Json(payload): Json<UserRecipeRequest>,
) -> AppResult<(StatusCode, Json<Value>)> {
    let (user_id, recipe_id) = payload.require()?;

    if repo::exists(&state.db, user_id, recipe_id).await? {
        return Err(AppError::conflict(ALREADY_SAVED));
    }
    // The UNIQUE constraint catches a concurrent add that slipped past the check.
    let id = repo::insert(&state.db, user_id, recipe_id)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                AppError::conflict(ALREADY_SAVED)
            } else if is_foreign_key_violation(&e) {
                AppError::not_found("User or recipe not found")
            } else {
                e.into()
            }
        })?;

    info!(user_id, recipe_id, "recipe bookmarked");
    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "Recipe added to wishlist", "id": id })),
    ))
}

#[instrument(skip(state))]
pub async fn remove_from_wishlist(
    State(state): State<AppState>,
    Json(payload): Json<UserRecipeRequest>,
) -> AppResult<Json<Value>> {
    let (user_id, recipe_id) = payload.require()?;
    if repo::delete(&state.db, user_id, recipe_id).await? == 0 {
        return Err(AppError::not_found("Wishlist item not found"));
    }
    info!(user_id, recipe_id, "bookmark removed");
    Ok(Json(json!({ "message": "Recipe removed from wishlist" })))
}
