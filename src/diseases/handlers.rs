use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get, post},
    Json, Router,
};
use serde_json::{json, Value};
use tracing::{info, instrument};

use super::dto::{DiseaseLinkRequest, DiseaseNameRequest, LinkResponse};
use super::repo;
use super::repo_types::Disease;
use crate::error::{is_foreign_key_violation, AppError, AppResult};
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_diseases))
        .route("/user/:user_id", get(user_diseases))
        .route("/user/add", post(add_by_id))
        .route("/user/add-by-name", post(add_by_name))
        .route("/user/remove", delete(remove_by_id))
        .route("/user/remove-by-name", delete(remove_by_name))
}

#[instrument(skip(state))]
pub async fn list_diseases(State(state): State<AppState>) -> AppResult<Json<Vec<Disease>>> {
    Ok(Json(repo::list_all(&state.db).await?))
}

#[instrument(skip(state))]
pub async fn user_diseases(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
) -> AppResult<Json<Vec<Disease>>> {
    Ok(Json(repo::list_for_user(&state.db, user_id).await?))
}

async fn link(
    state: &AppState,
    user_id: i64,
    disease_id: i64,
) -> AppResult<(StatusCode, Json<LinkResponse>)> {
    let created = repo::link(&state.db, user_id, disease_id)
        .await
        .map_err(|e| {
            if is_foreign_key_violation(&e) {
                AppError::not_found("User or disease not found")
            } else {
                e.into()
            }
        })?;

    Ok(match created {
        Some(id) => {
            info!(user_id, disease_id, "disease linked");
            (
                StatusCode::CREATED,
                Json(LinkResponse {
                    message: "Disease added to history".into(),
                    id: Some(id),
                }),
            )
        }
        None => (
            StatusCode::OK,
            Json(LinkResponse {
                message: "Disease already in history".into(),
                id: None,
            }),
        ),
    })
}

async fn unlink(state: &AppState, user_id: i64, disease_id: i64) -> AppResult<Json<Value>> {
    if repo::unlink(&state.db, user_id, disease_id).await? == 0 {
        return Err(AppError::not_found("Disease history entry not found"));
    }
    info!(user_id, disease_id, "disease unlinked");
    Ok(Json(json!({ "message": "Disease removed from history" })))
}

#[instrument(skip(state))]
pub async fn add_by_id(
    State(state): State<AppState>,
    Json(payload): Json<DiseaseLinkRequest>,
) -> AppResult<(StatusCode, Json<LinkResponse>)> {
    let (user_id, disease_id) = payload.require()?;
    link(&state, user_id, disease_id).await
}

#[instrument(skip(state))]
pub async fn add_by_name(
    State(state): State<AppState>,
    Json(payload): Json<DiseaseNameRequest>,
) -> AppResult<(StatusCode, Json<LinkResponse>)> {
    let (user_id, name) = payload.require()?;
    let disease_id = repo::find_id_by_name(&state.db, name)
        .await?
        .ok_or_else(|| AppError::not_found("Disease not found"))?;
    link(&state, user_id, disease_id).await
}

#[instrument(skip(state))]
pub async fn remove_by_id(
    State(state): State<AppState>,
    Json(payload): Json<DiseaseLinkRequest>,
) -> AppResult<Json<Value>> {
    let (user_id, disease_id) = payload.require()?;
    unlink(&state, user_id, disease_id).await
}

#[instrument(skip(state))]
pub async fn remove_by_name(
    State(state): State<AppState>,
    Json(payload): Json<DiseaseNameRequest>,
) -> AppResult<Json<Value>> {
    let (user_id, name) = payload.require()?;
    let disease_id = repo::find_id_by_name(&state.db, name)
        .await?
        .ok_or_else(|| AppError::not_found("Disease not found"))?;
    unlink(&state, user_id, disease_id).await
}
