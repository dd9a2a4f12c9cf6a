use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde_json::Value;
use tracing::instrument;

use super::dto::{CreatedRecipeResponse, RecipeDetail};
use super::{repo, services};
use crate::error::{AppError, AppResult};
use crate::state::AppState;

pub fn read_routes() -> Router<AppState> {
    Router::new().route("/:id", get(get_recipe))
}

pub fn write_routes() -> Router<AppState> {
    Router::new().route("/create", post(create_recipe))
}

/// Full recipe: info, tools, ingredients, procedures with steps, tags.
#[instrument(skip(state))]
pub async fn get_recipe(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<Json<RecipeDetail>> {
    let info = repo::find_info(&state.db, id)
        .await?
        .ok_or_else(|| AppError::not_found("Recipe not found"))?;
    let tools = repo::list_tools(&state.db, id).await?;
    let ingredients = repo::list_ingredients(&state.db, id).await?;
    let procedures = services::group_procedures(repo::list_procedure_steps(&state.db, id).await?);
    let tags = repo::list_tags(&state.db, id).await?;

    Ok(Json(RecipeDetail {
        info: info.into(),
        tools,
        ingredients,
        procedures,
        tags,
    }))
}

#[instrument(skip(state, body))]
pub async fn create_recipe(
    State(state): State<AppState>,
    Json(body): Json<Value>,
) -> AppResult<(StatusCode, Json<CreatedRecipeResponse>)> {
    let recipe = services::normalize_payload(body)?;
    services::validate(&recipe)?;

    let recipe_id = services::create_full_recipe(&state.db, &recipe).await?;

    Ok((
        StatusCode::CREATED,
        Json(CreatedRecipeResponse {
            success: true,
            message: "Recipe saved".into(),
            recipe_id,
        }),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, http::Request};
    use serde_json::json;
    use tower::ServiceExt;

    async fn post_create(body: Value) -> (StatusCode, Value) {
        let app = crate::recipes::router().with_state(AppState::fake());
        let res = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/create")
                    .header("content-type", "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        let status = res.status();
        let bytes = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn create_rejects_incomplete_recipe_without_writing() {
        let (status, body) = post_create(json!({"name": "Soto", "servings": 2})).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        let msg = body["error"].as_str().unwrap();
        assert!(msg.contains("user_id"));
        assert!(msg.contains("category_id"));
    }

    #[tokio::test]
    async fn create_rejects_incomplete_nested_recipe() {
        let inner = json!({"user_id": 1, "name": "Soto"}).to_string();
        let (status, _) = post_create(json!({ "recipe": inner })).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn get_rejects_non_numeric_id() {
        let app = crate::recipes::router().with_state(AppState::fake());
        let res = app
            .oneshot(Request::builder().uri("/abc").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }
}
