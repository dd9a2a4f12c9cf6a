use sqlx::PgPool;

use super::dto::{ReviewInput, ReviewRow, ReviewStats};

pub async fn list_for_recipe(db: &PgPool, recipe_id: i64) -> sqlx::Result<Vec<ReviewRow>> {
    sqlx::query_as::<_, ReviewRow>(
        r#"
        SELECT rv.id, r.name AS recipe_name, u.id AS user_id, u.username, u.email,
               rv.rating, rv.comment, rv.created_at, rv.updated_at
          FROM reviews rv
          JOIN recipes r ON r.id = rv.recipe_id
          JOIN users u ON u.id = rv.user_id
         WHERE rv.recipe_id = $1
         ORDER BY rv.id DESC
        "#,
    )
    .bind(recipe_id)
    .fetch_all(db)
    .await
}

pub async fn stats(db: &PgPool, recipe_id: i64) -> sqlx::Result<ReviewStats> {
    sqlx::query_as::<_, ReviewStats>(
        r#"
        SELECT COUNT(*) AS total_reviews,
               COALESCE(ROUND(AVG(rating)::numeric, 2), 0)::float8 AS average_rating,
               COUNT(*) FILTER (WHERE rating = 5) AS rating_5,
               COUNT(*) FILTER (WHERE rating = 4) AS rating_4,
               COUNT(*) FILTER (WHERE rating = 3) AS rating_3,
               COUNT(*) FILTER (WHERE rating = 2) AS rating_2,
               COUNT(*) FILTER (WHERE rating = 1) AS rating_1
          FROM reviews
         WHERE recipe_id = $1
        "#,
    )
    .bind(recipe_id)
    .fetch_one(db)
    .await
}

/// Updates the user's existing review of the recipe, if any.
pub async fn update(db: &PgPool, input: &ReviewInput) -> sqlx::Result<Option<i64>> {
    sqlx::query_scalar::<_, i64>(
        r#"
        UPDATE reviews
           SET rating = $3, comment = $4, updated_at = now()
         WHERE user_id = $1 AND recipe_id = $2
        RETURNING id
        "#,
    )
    .bind(input.user_id)
    .bind(input.recipe_id)
    .bind(input.rating)
    .bind(input.comment.as_deref())
    .fetch_optional(db)
    .await
}

pub async fn insert(db: &PgPool, input: &ReviewInput) -> sqlx::Result<i64> {
    sqlx::query_scalar::<_, i64>(
        r#"
        INSERT INTO reviews (user_id, recipe_id, rating, comment)
        VALUES ($1, $2, $3, $4)
        RETURNING id
        "#,
    )
    .bind(input.user_id)
    .bind(input.recipe_id)
    .bind(input.rating)
    .bind(input.comment.as_deref())
    .fetch_one(db)
    .await
}

pub async fn delete(db: &PgPool, user_id: i64, recipe_id: i64) -> sqlx::Result<u64> {
    let res = sqlx::query("DELETE FROM reviews WHERE user_id = $1 AND recipe_id = $2")
        .bind(user_id)
        .bind(recipe_id)
        .execute(db)
        .await?;
    Ok(res.rows_affected())
}
