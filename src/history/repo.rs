use serde::Serialize;
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use time::OffsetDateTime;

/// Most entries kept per user.
pub const HISTORY_LIMIT: i64 = 10;

#[derive(Debug, Serialize, FromRow)]
pub struct HistoryEntry {
    pub id: i64,
    pub recipe_id: i64,
    pub name: String,
    pub thumbnail: String,
    #[serde(with = "time::serde::rfc3339")]
    pub viewed_at: OffsetDateTime,
    pub review_count: i64,
    /// One decimal; 0 without reviews.
    pub rating: f64,
}

pub async fn list_for_user(db: &PgPool, user_id: i64) -> sqlx::Result<Vec<HistoryEntry>> {
    sqlx::query_as::<_, HistoryEntry>(
        r#"
        SELECT h.id, r.id AS recipe_id, r.name, r.thumbnail, h.viewed_at,
               COALESCE(rv.review_count, 0)::bigint AS review_count,
               COALESCE(rv.rating, 0)::float8 AS rating
          FROM history h
          JOIN recipes r ON r.id = h.recipe_id
          LEFT JOIN (
                SELECT recipe_id, COUNT(*) AS review_count, ROUND(AVG(rating)::numeric, 1) AS rating
                  FROM reviews GROUP BY recipe_id
          ) rv ON rv.recipe_id = r.id
         WHERE h.user_id = $1
         ORDER BY h.viewed_at DESC, h.id DESC
        "#,
    )
    .bind(user_id)
    .fetch_all(db)
    .await
}

/// Locks the user row so concurrent views for one user queue behind each other.
pub async fn lock_user_tx(tx: &mut Transaction<'_, Postgres>, user_id: i64) -> sqlx::Result<bool> {
    let found = sqlx::query_scalar::<_, i64>("SELECT id FROM users WHERE id = $1 FOR UPDATE")
        .bind(user_id)
        .fetch_optional(&mut **tx)
        .await?;
    Ok(found.is_some())
}

pub async fn count_tx(tx: &mut Transaction<'_, Postgres>, user_id: i64) -> sqlx::Result<i64> {
    sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM history WHERE user_id = $1")
        .bind(user_id)
        .fetch_one(&mut **tx)
        .await
}

/// Removes exactly one row: the user's oldest view.
pub async fn delete_oldest_tx(tx: &mut Transaction<'_, Postgres>, user_id: i64) -> sqlx::Result<u64> {
    let res = sqlx::query(
        r#"
        DELETE FROM history
         WHERE id = (
                SELECT id FROM history
                 WHERE user_id = $1
                 ORDER BY viewed_at, id
                 LIMIT 1
         )
        "#,
    )
    .bind(user_id)
    .execute(&mut **tx)
    .await?;
    Ok(res.rows_affected())
}

pub async fn insert_tx(
    tx: &mut Transaction<'_, Postgres>,
    user_id: i64,
    recipe_id: i64,
) -> sqlx::Result<i64> {
    sqlx::query_scalar::<_, i64>(
        "INSERT INTO history (user_id, recipe_id) VALUES ($1, $2) RETURNING id",
    )
    .bind(user_id)
    .bind(recipe_id)
    .fetch_one(&mut **tx)
    .await
}

pub async fn bump_view_count_tx(
    tx: &mut Transaction<'_, Postgres>,
    recipe_id: i64,
) -> sqlx::Result<()> {
    sqlx::query("UPDATE recipes SET view_count = view_count + 1 WHERE id = $1")
        .bind(recipe_id)
        .execute(&mut **tx)
        .await?;
    Ok(())
}
