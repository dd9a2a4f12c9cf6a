//! Fixtures for tests that run against a migrated database (`#[sqlx::test]`).

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use serde_json::Value;
use sqlx::PgPool;
use tower::ServiceExt;

use crate::state::AppState;

/// The full application over `db`, with the in-memory asset host.
pub fn app(db: PgPool) -> Router {
    crate::app::build_app(AppState {
        db,
        ..AppState::fake()
    })
}

pub async fn call(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let req = Request::builder().method(method).uri(uri);
    let req = match body {
        Some(body) => req
            .header("content-type", "application/json")
            .body(Body::from(body.to_string())),
        None => req.body(Body::empty()),
    }
    .unwrap();
    let res = app.clone().oneshot(req).await.unwrap();
    let status = res.status();
    let bytes = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
}

pub async fn insert_user(db: &PgPool, email: &str) -> i64 {
    sqlx::query_scalar(
        "INSERT INTO users (username, email, password_hash) VALUES ($1, $2, 'x') RETURNING id",
    )
    .bind(email.split('@').next().unwrap_or(email))
    .bind(email)
    .fetch_one(db)
    .await
    .unwrap()
}

pub async fn insert_recipe(db: &PgPool, author: i64, category_id: i64, name: &str) -> i64 {
    sqlx::query_scalar(
        r#"
        INSERT INTO recipes (user_id, category_id, name, description, thumbnail, servings)
        VALUES ($1, $2, $3, 'test recipe', 'thumb.jpg', 2)
        RETURNING id
        "#,
    )
    .bind(author)
    .bind(category_id)
    .bind(name)
    .fetch_one(db)
    .await
    .unwrap()
}

pub async fn insert_review(db: &PgPool, user_id: i64, recipe_id: i64, rating: i32) {
    sqlx::query("INSERT INTO reviews (user_id, recipe_id, rating) VALUES ($1, $2, $3)")
        .bind(user_id)
        .bind(recipe_id)
        .bind(rating)
        .execute(db)
        .await
        .unwrap();
}

pub async fn count(db: &PgPool, table: &str) -> i64 {
    sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {table}"))
        .fetch_one(db)
        .await
        .unwrap()
}
