use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use tracing::instrument;

use super::dto::{NewTipRequest, TipCard, TipDetail};
use super::{repo, services};
use crate::error::{AppError, AppResult};
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/all", get(list_tips))
        .route("/add", post(add_tip))
        .route("/:id", get(get_tip).delete(delete_tip))
}

#[instrument(skip(state))]
pub async fn list_tips(State(state): State<AppState>) -> AppResult<Json<Vec<TipCard>>> {
    Ok(Json(repo::list_cards(&state.db).await?))
}

#[instrument(skip(state))]
pub async fn get_tip(State(state): State<AppState>, Path(id): Path<i64>) -> AppResult<Json<TipDetail>> {
    let row = repo::find(&state.db, id)
        .await?
        .ok_or_else(|| AppError::not_found("Tip not found"))?;
    let hashtags = repo::hashtags(&state.db, id).await?;
    Ok(Json(TipDetail::new(row, hashtags)))
}

#[instrument(skip(state, payload))]
pub async fn add_tip(
    State(state): State<AppState>,
    Json(payload): Json<NewTipRequest>,
) -> AppResult<(StatusCode, Json<Value>)> {
    let tip = payload.validate()?;
    let id = services::create_tip(&state.db, &tip).await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "Tip added", "id": id })),
    ))
}

#[instrument(skip(state))]
pub async fn delete_tip(State(state): State<AppState>, Path(id): Path<i64>) -> AppResult<Json<Value>> {
    if !services::delete_tip(&state.db, id).await? {
        return Err(AppError::not_found("Tip not found"));
    }
    Ok(Json(json!({ "message": "Tip deleted" })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, http::Request};
    use tower::ServiceExt;

    #[tokio::test]
    async fn add_rejects_missing_body_text() {
        let app = crate::tips::router().with_state(AppState::fake());
        let res = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/add")
                    .header("content-type", "application/json")
                    .body(Body::from(r#"{"user_id": 1, "title": "Rice tip"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn non_numeric_tip_id_is_rejected() {
        let app = crate::tips::router().with_state(AppState::fake());
        let res = app
            .oneshot(Request::builder().uri("/abc").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }
}
