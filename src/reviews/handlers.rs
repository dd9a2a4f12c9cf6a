use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get, post},
    Json, Router,
};
use serde_json::{json, Value};
use tracing::{info, instrument};

use super::dto::{AddReviewRequest, ReviewInput, ReviewRow, ReviewSaved, ReviewStats};
use super::repo;
use crate::error::{is_foreign_key_violation, is_unique_violation, AppError, AppResult};
use crate::state::AppState;
use crate::wishlist::dto::UserRecipeRequest;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/:recipe_id", get(list_reviews))
        .route("/stats/:recipe_id", get(review_stats))
        .route("/add", post(add_review))
        .route("/delete", delete(delete_review))
}

#[instrument(skip(state))]
pub async fn list_reviews(
    State(state): State<AppState>,
    Path(recipe_id): Path<i64>,
) -> AppResult<Json<Vec<ReviewRow>>> {
    Ok(Json(repo::list_for_recipe(&state.db, recipe_id).await?))
}

#[instrument(skip(state))]
pub async fn review_stats(
    State(state): State<AppState>,
    Path(recipe_id): Path<i64>,
) -> AppResult<Json<ReviewStats>> {
    Ok(Json(repo::stats(&state.db, recipe_id).await?))
}

fn saved(status: StatusCode, message: &str, review_id: i64) -> (StatusCode, Json<ReviewSaved>) {
    (
        status,
        Json(ReviewSaved {
            message: message.into(),
            review_id,
        }),
    )
}

/// One review per user and recipe: a second submission replaces the first.
#[instrument(skip(state, payload))]
pub async fn add_review(
    State(state): State<AppState>,
    Json(payload): Json<AddReviewRequest>,
) -> AppResult<(StatusCode, Json<ReviewSaved>)> {
    let input = payload.validate()?;

    if let Some(id) = repo::update(&state.db, &input).await? {
        info!(review_id = id, "review updated");
        return Ok(saved(StatusCode::OK, "Review updated", id));
    }

    match repo::insert(&state.db, &input).await {
        Ok(id) => {
            info!(review_id = id, user_id = input.user_id, recipe_id = input.recipe_id, "review added");
            Ok(saved(StatusCode::CREATED, "Review added", id))
        }
        // Lost a race with a concurrent first review; apply ours on top.
        Err(e) if is_unique_violation(&e) => update_existing(&state, &input).await,
        Err(e) if is_foreign_key_violation(&e) => {
            Err(AppError::not_found("User or recipe not found"))
        }
        Err(e) => Err(e.into()),
    }
}

async fn update_existing(
    state: &AppState,
    input: &ReviewInput,
) -> AppResult<(StatusCode, Json<ReviewSaved>)> {
    let id = repo::update(&state.db, input)
        .await?
        .ok_or_else(|| AppError::not_found("Review not found"))?;
    Ok(saved(StatusCode::OK, "Review updated", id))
}

#[instrument(skip(state))]
pub async fn delete_review(
    State(state): State<AppState>,
    Json(payload): Json<UserRecipeRequest>,
) -> AppResult<Json<Value>> {
    let (user_id, recipe_id) = payload.require()?;
    if repo::delete(&state.db, user_id, recipe_id).await? == 0 {
        return Err(AppError::not_found("Review not found"));
    }
    info!(user_id, recipe_id, "review deleted");
    Ok(Json(json!({ "message": "Review deleted" })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, http::Request};
    use tower::ServiceExt;

    async fn send(method: &str, uri: &str, body: Value) -> (StatusCode, Value) {
        let app = crate::reviews::router().with_state(AppState::fake());
        let res = app
            .oneshot(
                Request::builder()
                    .method(method)
                    .uri(uri)
                    .header("content-type", "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        let status = res.status();
        let bytes = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
    }

    #[tokio::test]
    async fn out_of_range_rating_is_rejected_before_writing() {
        let (status, body) =
            send("POST", "/add", json!({"user_id": 1, "recipe_id": 1, "rating": 9})).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("between 1 and 5"));
    }

    #[tokio::test]
    async fn delete_requires_both_ids() {
        let (status, _) = send("DELETE", "/delete", json!({"user_id": 1})).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn non_numeric_recipe_id_is_rejected() {
        let (status, _) = send("GET", "/stats/abc", Value::Null).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn second_review_replaces_the_first(pool: sqlx::PgPool) {
        use crate::test_support::{app, call, insert_recipe, insert_user};

        let user = insert_user(&pool, "taster@masakio.test").await;
        let recipe = insert_recipe(&pool, user, 1, "gado-gado").await;
        let app = app(pool.clone());

        let first = json!({"user_id": user, "recipe_id": recipe, "rating": 2, "comment": "a"});
        let second = json!({"user_id": user, "recipe_id": recipe, "rating": "5", "comment": "b"});
        assert_eq!(call(&app, "POST", "/reviews/add", Some(first)).await.0, StatusCode::CREATED);
        assert_eq!(call(&app, "POST", "/reviews/add", Some(second)).await.0, StatusCode::OK);

        let rows: Vec<(i32, Option<String>)> =
            sqlx::query_as("SELECT rating, comment FROM reviews WHERE recipe_id = $1")
                .bind(recipe)
                .fetch_all(&pool)
                .await
                .unwrap();
        assert_eq!(rows, vec![(5, Some("b".to_string()))]);

        let (status, stats) = call(&app, "GET", &format!("/reviews/stats/{recipe}"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(stats["total_reviews"], 1);
        assert_eq!(stats["rating_5"], 1);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn deleting_a_missing_review_is_not_found(pool: sqlx::PgPool) {
        let app = crate::test_support::app(pool);
        let (status, _) = crate::test_support::call(
            &app,
            "DELETE",
            "/reviews/delete",
            Some(json!({"user_id": 1, "recipe_id": 1})),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
