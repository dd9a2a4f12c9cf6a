use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use tracing::instrument;

use super::dto::{
    check_limit, CardRecipe, FilterQuery, RecipeCount, ViewerQuery, DEFAULT_RECOMMENDATIONS,
};
use super::{recommend, repo};
use crate::error::AppResult;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/all", get(all_cards))
        .route("/filter", get(filter_cards))
        .route("/recommendations", get(recommendations))
        .route("/user/:id", get(cards_by_author))
        .route("/count/:id", get(count_by_author))
        .route("/category/:id", get(cards_by_category))
}

#[instrument(skip(state))]
pub async fn all_cards(
    State(state): State<AppState>,
    Query(q): Query<ViewerQuery>,
) -> AppResult<Json<Vec<CardRecipe>>> {
    let limit = check_limit(q.limit)?;
    Ok(Json(repo::list_all(&state.db, q.user_id, limit).await?))
}

#[instrument(skip(state))]
pub async fn filter_cards(
    State(state): State<AppState>,
    Query(q): Query<FilterQuery>,
) -> AppResult<Json<Vec<CardRecipe>>> {
    let limit = check_limit(q.limit)?;
    let include = repo::parse_terms(q.include.as_deref());
    let exclude = repo::parse_terms(q.exclude.as_deref());
    let cards = repo::filter(&state.db, &include, &exclude, q.category_id, q.user_id, limit).await?;
    Ok(Json(cards))
}

#[instrument(skip(state))]
pub async fn recommendations(
    State(state): State<AppState>,
    Query(q): Query<ViewerQuery>,
) -> AppResult<Json<Vec<CardRecipe>>> {
    let limit = check_limit(q.limit)?.unwrap_or(DEFAULT_RECOMMENDATIONS) as usize;
    let candidates = repo::recommendation_candidates(&state.db, q.user_id).await?;

    let diseases = match q.user_id {
        Some(user_id) => crate::diseases::repo::names_for_user(&state.db, user_id).await?,
        None => Vec::new(),
    };

    Ok(Json(recommend::recommend(candidates, &diseases, limit)))
}

#[instrument(skip(state))]
pub async fn cards_by_author(
    State(state): State<AppState>,
    Path(author_id): Path<i64>,
    Query(q): Query<ViewerQuery>,
) -> AppResult<Json<Vec<CardRecipe>>> {
    Ok(Json(repo::list_by_author(&state.db, author_id, q.user_id).await?))
}

#[instrument(skip(state))]
pub async fn count_by_author(
    State(state): State<AppState>,
    Path(author_id): Path<i64>,
) -> AppResult<Json<RecipeCount>> {
    let total_recipes = repo::count_by_author(&state.db, author_id).await?;
    Ok(Json(RecipeCount { total_recipes }))
}

#[instrument(skip(state))]
pub async fn cards_by_category(
    State(state): State<AppState>,
    Path(category_id): Path<i64>,
    Query(q): Query<ViewerQuery>,
) -> AppResult<Json<Vec<CardRecipe>>> {
    let limit = check_limit(q.limit)?;
    Ok(Json(
        repo::list_by_category(&state.db, category_id, q.user_id, limit).await?,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use tower::ServiceExt;

    async fn status_of(uri: &str) -> StatusCode {
        let app = crate::cards::router().with_state(AppState::fake());
        app.oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap()
            .status()
    }

    #[tokio::test]
    async fn out_of_range_limit_is_rejected() {
        assert_eq!(status_of("/all?limit=0").await, StatusCode::BAD_REQUEST);
        assert_eq!(status_of("/recommendations?limit=1000").await, StatusCode::BAD_REQUEST);
        assert_eq!(status_of("/category/1?limit=-3").await, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn non_numeric_ids_are_rejected() {
        assert_eq!(status_of("/user/abc").await, StatusCode::BAD_REQUEST);
        assert_eq!(status_of("/count/abc").await, StatusCode::BAD_REQUEST);
        assert_eq!(status_of("/filter?user_id=x").await, StatusCode::BAD_REQUEST);
    }

    mod with_database {
        use crate::test_support::{app, call, insert_recipe, insert_review, insert_user};
        use axum::http::StatusCode;
        use serde_json::Value;
        use sqlx::PgPool;

        fn ids(cards: &Value) -> Vec<i64> {
            cards
                .as_array()
                .unwrap()
                .iter()
                .map(|c| c["id"].as_i64().unwrap())
                .collect()
        }

        /// Three rated recipes without nutrition and one diabetic viewer.
        async fn seed(pool: &PgPool) -> (i64, [i64; 3]) {
            let viewer = insert_user(pool, "viewer@masakio.test").await;
            let author = insert_user(pool, "author@masakio.test").await;
            let best = insert_recipe(pool, author, 1, "best").await;
            let worst = insert_recipe(pool, author, 1, "worst").await;
            let middle = insert_recipe(pool, author, 1, "middle").await;
            insert_review(pool, author, best, 5).await;
            insert_review(pool, author, worst, 2).await;
            insert_review(pool, author, middle, 4).await;
            sqlx::query(
                "INSERT INTO user_diseases (user_id, disease_id) \
                 SELECT $1, id FROM diseases WHERE name = 'Diabetes'",
            )
            .bind(viewer)
            .execute(pool)
            .await
            .unwrap();
            (viewer, [best, worst, middle])
        }

        #[sqlx::test(migrations = "./migrations")]
        async fn too_few_healthy_recipes_falls_back_to_popularity(pool: PgPool) {
            let (viewer, [best, _, middle]) = seed(&pool).await;
            let app = app(pool);

            let (status, personal) =
                call(&app, "GET", &format!("/card_recipe/recommendations?user_id={viewer}&limit=2"), None).await;
            assert_eq!(status, StatusCode::OK);
            let (_, popular) = call(&app, "GET", "/card_recipe/recommendations?limit=2", None).await;

            assert_eq!(ids(&personal), vec![best, middle]);
            assert_eq!(ids(&personal), ids(&popular));
        }

        #[sqlx::test(migrations = "./migrations")]
        async fn enough_healthy_recipes_are_preferred(pool: PgPool) {
            let (viewer, _) = seed(&pool).await;
            let author = insert_user(&pool, "nutritionist@masakio.test").await;
            let salad = insert_recipe(&pool, author, 1, "salad").await;
            sqlx::query(
                "INSERT INTO nutrition (recipe_id, carbohydrate, protein, fat, fiber) \
                 VALUES ($1, 10, 20, 5, 6)",
            )
            .bind(salad)
            .execute(&pool)
            .await
            .unwrap();
            let app = app(pool);

            let (status, cards) =
                call(&app, "GET", &format!("/card_recipe/recommendations?user_id={viewer}&limit=1"), None).await;
            assert_eq!(status, StatusCode::OK);
            assert_eq!(ids(&cards), vec![salad]);
        }

        #[sqlx::test(migrations = "./migrations")]
        async fn failed_disease_lookup_is_a_server_error(pool: PgPool) {
            let (viewer, _) = seed(&pool).await;
            sqlx::query("DROP TABLE user_diseases").execute(&pool).await.unwrap();
            let app = app(pool);

            let (status, body) =
                call(&app, "GET", &format!("/card_recipe/recommendations?user_id={viewer}"), None).await;
            assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
            assert!(body["error"].is_string());
        }
    }
}
