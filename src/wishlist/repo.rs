use sqlx::PgPool;

use super::dto::WishlistItem;

pub async fn list_for_user(db: &PgPool, user_id: i64) -> sqlx::Result<Vec<WishlistItem>> {
    sqlx::query_as::<_, WishlistItem>(
        r#"
        SELECT r.id AS recipe_id, r.name, r.thumbnail,
               COALESCE(rv.review_count, 0)::bigint AS review_count,
               COALESCE(rv.rating, 0)::float8 AS rating
          FROM wishlists w
          JOIN recipes r ON r.id = w.recipe_id
          LEFT JOIN (
                SELECT recipe_id, COUNT(*) AS review_count, ROUND(AVG(rating)::numeric, 1) AS rating
                  FROM reviews GROUP BY recipe_id
          ) rv ON rv.recipe_id = r.id
         WHERE w.user_id = $1
         ORDER BY w.id DESC
        "#,
    )
    .bind(user_id)
    .fetch_all(db)
    .await
}

pub async fn exists(db: &PgPool, user_id: i64, recipe_id: i64) -> sqlx::Result<bool> {
    sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS (SELECT 1 FROM wishlists WHERE user_id = $1 AND recipe_id = $2)",
    )
    .bind(user_id)
    .bind(recipe_id)
    .fetch_one(db)
    .await
}

pub async fn insert(db: &PgPool, user_id: i64, recipe_id: i64) -> sqlx::Result<i64> {
    sqlx::query_scalar::<_, i64>(
        "INSERT INTO wishlists (user_id, recipe_id) VALUES ($1, $2) RETURNING id",
    )
    .bind(user_id)
    .bind(recipe_id)
    .fetch_one(db)
    .await
}

pub async fn delete(db: &PgPool, user_id: i64, recipe_id: i64) -> sqlx::Result<u64> {
    let res = sqlx::query("DELETE FROM wishlists WHERE user_id = $1 AND recipe_id = $2")
        .bind(user_id)
        .bind(recipe_id)
        .execute(db)
        .await?;
    Ok(res.rows_affected())
}
