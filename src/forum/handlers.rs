use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use tracing::instrument;

use super::dto::{LikeRequest, LikeState, NewPostRequest, Post, Thread};
use super::{repo, services};
use crate::error::{AppError, AppResult};
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_posts))
        .route("/add", post(add_post))
        .route("/:id", get(get_thread))
        .route("/:id/like", post(toggle_like))
}

#[instrument(skip(state))]
pub async fn list_posts(State(state): State<AppState>) -> AppResult<Json<Vec<Post>>> {
    Ok(Json(repo::list_top_level(&state.db).await?))
}

#[instrument(skip(state))]
pub async fn get_thread(State(state): State<AppState>, Path(id): Path<i64>) -> AppResult<Json<Thread>> {
    let post = repo::find(&state.db, id)
        .await?
        .ok_or_else(|| AppError::not_found("Discussion not found"))?;
    let replies = repo::replies(&state.db, id).await?;
    Ok(Json(Thread { post, replies }))
}

#[instrument(skip(state, payload))]
pub async fn add_post(
    State(state): State<AppState>,
    Json(payload): Json<NewPostRequest>,
) -> AppResult<(StatusCode, Json<Value>)> {
    let post = payload.validate()?;
    let id = services::create_post(&state.db, &post).await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "Discussion added", "id": id })),
    ))
}

#[instrument(skip(state))]
pub async fn toggle_like(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<LikeRequest>,
) -> AppResult<Json<LikeState>> {
    let user_id = payload
        .user_id
        .ok_or_else(|| AppError::validation("user_id is required"))?;
    Ok(Json(services::toggle_like(&state.db, id, user_id).await?))
}
