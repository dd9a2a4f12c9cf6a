use axum::{
    extract::{Path, State},
    routing::{delete, get},
    Json, Router,
};
use serde_json::{json, Value};
use tracing::{info, instrument};

use super::dto::{UpdateUserRequest, UserProfile};
use super::{repo, services};
use crate::diseases;
use crate::error::{AppError, AppResult};
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/:id", get(get_user).put(update_user).delete(delete_user))
        .route("/:id/disease/:disease_id", delete(remove_disease))
}

#[instrument(skip(state))]
pub async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<Json<UserProfile>> {
    Ok(Json(services::load_profile(&state.db, id).await?))
}

#[instrument(skip(state, payload))]
pub async fn update_user(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateUserRequest>,
) -> AppResult<Json<UserProfile>> {
    Ok(Json(services::update_profile(&state.db, id, &payload).await?))
}

#[instrument(skip(state))]
pub async fn delete_user(State(state): State<AppState>, Path(id): Path<i64>) -> AppResult<Json<Value>> {
    if repo::delete(&state.db, id).await? == 0 {
        return Err(AppError::not_found("User not found"));
    }
    info!(user_id = id, "account deleted");
    Ok(Json(json!({ "message": "User deleted" })))
}

#[instrument(skip(state))]
pub async fn remove_disease(
    State(state): State<AppState>,
    Path((id, disease_id)): Path<(i64, i64)>,
) -> AppResult<Json<Value>> {
    if diseases::repo::unlink(&state.db, id, disease_id).await? == 0 {
        return Err(AppError::not_found("Disease history entry not found"));
    }
    Ok(Json(json!({ "message": "Disease removed from history" })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use tower::ServiceExt;

    async fn send(method: &str, uri: &str, body: &str) -> StatusCode {
        let app = crate::users::router().with_state(AppState::fake());
        app.oneshot(
            Request::builder()
                .method(method)
                .uri(uri)
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap()
        .status()
    }

    #[tokio::test]
    async fn invalid_email_is_rejected_before_the_database() {
        assert_eq!(send("PUT", "/7", r#"{"email": "not-an-email"}"#).await, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn non_numeric_ids_are_rejected() {
        assert_eq!(send("GET", "/me", "").await, StatusCode::BAD_REQUEST);
        assert_eq!(send("DELETE", "/1/disease/x", "").await, StatusCode::BAD_REQUEST);
    }
}
