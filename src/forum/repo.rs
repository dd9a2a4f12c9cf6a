use sqlx::{PgPool, Postgres, Transaction};

use super::dto::{NewPost, Post};

const POST_SELECT: &str = r#"
    SELECT d.id, d.user_id, u.username AS author_name, u.photo AS author_photo,
           d.image, d.caption, d.reply_to, d.created_at,
           (SELECT COUNT(*) FROM discussion_likes l WHERE l.discussion_id = d.id) AS like_count,
           (SELECT COUNT(*) FROM discussions c WHERE c.reply_to = d.id) AS reply_count
      FROM discussions d
      JOIN users u ON u.id = d.user_id
"#;

pub async fn list_top_level(db: &PgPool) -> sqlx::Result<Vec<Post>> {
    sqlx::query_as::<_, Post>(&format!(
        "{POST_SELECT} WHERE d.reply_to IS NULL ORDER BY d.created_at DESC, d.id DESC"
    ))
    .fetch_all(db)
    .await
}

pub async fn find(db: &PgPool, id: i64) -> sqlx::Result<Option<Post>> {
    sqlx::query_as::<_, Post>(&format!("{POST_SELECT} WHERE d.id = $1"))
        .bind(id)
        .fetch_optional(db)
        .await
}

pub async fn replies(db: &PgPool, parent_id: i64) -> sqlx::Result<Vec<Post>> {
    sqlx::query_as::<_, Post>(&format!(
        "{POST_SELECT} WHERE d.reply_to = $1 ORDER BY d.created_at, d.id"
    ))
    .bind(parent_id)
    .fetch_all(db)
    .await
}

/// `None` when the post does not exist, otherwise its own `reply_to`.
pub async fn parent_of(db: &PgPool, id: i64) -> sqlx::Result<Option<Option<i64>>> {
    sqlx::query_scalar::<_, Option<i64>>("SELECT reply_to FROM discussions WHERE id = $1")
        .bind(id)
        .fetch_optional(db)
        .await
}

pub async fn insert(db: &PgPool, post: &NewPost) -> sqlx::Result<i64> {
    sqlx::query_scalar::<_, i64>(
        r#"
        INSERT INTO discussions (user_id, image, caption, reply_to)
        VALUES ($1, $2, $3, $4)
        RETURNING id
        "#,
    )
    .bind(post.user_id)
    .bind(post.image.as_deref())
    .bind(&post.caption)
    .bind(post.reply_to)
    .fetch_one(db)
    .await
}

/// Locks the post row for the rest of the transaction.
pub async fn lock_tx(tx: &mut Transaction<'_, Postgres>, id: i64) -> sqlx::Result<bool> {
    let found = sqlx::query_scalar::<_, i64>("SELECT id FROM discussions WHERE id = $1 FOR UPDATE")
        .bind(id)
        .fetch_optional(&mut **tx)
        .await?;
    Ok(found.is_some())
}

pub async fn unlike_tx(tx: &mut Transaction<'_, Postgres>, id: i64, user_id: i64) -> sqlx::Result<bool> {
    let res = sqlx::query("DELETE FROM discussion_likes WHERE discussion_id = $1 AND user_id = $2")
        .bind(id)
        .bind(user_id)
        .execute(&mut **tx)
        .await?;
    Ok(res.rows_affected() > 0)
}

pub async fn like_tx(tx: &mut Transaction<'_, Postgres>, id: i64, user_id: i64) -> sqlx::Result<()> {
    sqlx::query(
        r#"
        INSERT INTO discussion_likes (discussion_id, user_id)
        VALUES ($1, $2)
        ON CONFLICT (discussion_id, user_id) DO NOTHING
        "#,
    )
    .bind(id)
    .bind(user_id)
    .execute(&mut **tx)
    .await?;
    Ok(())
}

/// Recomputes the stored counter from the likes table.
pub async fn refresh_like_count_tx(tx: &mut Transaction<'_, Postgres>, id: i64) -> sqlx::Result<i64> {
    let count = sqlx::query_scalar::<_, i32>(
        r#"
        UPDATE discussions
           SET like_count = (SELECT COUNT(*) FROM discussion_likes WHERE discussion_id = $1)
         WHERE id = $1
        RETURNING like_count
        "#,
    )
    .bind(id)
    .fetch_one(&mut **tx)
    .await?;
    Ok(count.into())
}
