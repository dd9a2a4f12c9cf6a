use sqlx::{PgPool, Postgres, QueryBuilder, Transaction};

use super::dto::{NewTip, TipCard, TipRow};

pub async fn list_cards(db: &PgPool) -> sqlx::Result<Vec<TipCard>> {
    sqlx::query_as::<_, TipCard>(
        r#"
        SELECT t.id, u.username AS author_name, t.title, t.image
          FROM tips t
          JOIN users u ON u.id = t.user_id
         ORDER BY t.created_at DESC, t.id DESC
        "#,
    )
    .fetch_all(db)
    .await
}

pub async fn find(db: &PgPool, id: i64) -> sqlx::Result<Option<TipRow>> {
    sqlx::query_as::<_, TipRow>(
        r#"
        SELECT t.id, t.user_id, u.username AS author_name, t.title, t.body, t.image, t.created_at
          FROM tips t
          JOIN users u ON u.id = t.user_id
         WHERE t.id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(db)
    .await
}

pub async fn hashtags(db: &PgPool, tip_id: i64) -> sqlx::Result<Vec<String>> {
    sqlx::query_scalar::<_, String>("SELECT name FROM tip_hashtags WHERE tip_id = $1 ORDER BY id")
        .bind(tip_id)
        .fetch_all(db)
        .await
}

pub async fn insert_tx(tx: &mut Transaction<'_, Postgres>, tip: &NewTip) -> sqlx::Result<i64> {
    sqlx::query_scalar::<_, i64>(
        "INSERT INTO tips (user_id, title, body, image) VALUES ($1, $2, $3, $4) RETURNING id",
    )
    .bind(tip.user_id)
    .bind(&tip.title)
    .bind(&tip.body)
    .bind(tip.image.as_deref())
    .fetch_one(&mut **tx)
    .await
}

pub async fn insert_hashtags_tx(
    tx: &mut Transaction<'_, Postgres>,
    tip_id: i64,
    tags: &[String],
) -> sqlx::Result<()> {
    let mut qb = QueryBuilder::<Postgres>::new("INSERT INTO tip_hashtags (tip_id, name) ");
    qb.push_values(tags, |mut b, tag| {
        b.push_bind(tip_id).push_bind(tag.clone());
    });
    qb.build().execute(&mut **tx).await?;
    Ok(())
}

pub async fn delete_hashtags_tx(tx: &mut Transaction<'_, Postgres>, tip_id: i64) -> sqlx::Result<u64> {
    let res = sqlx::query("DELETE FROM tip_hashtags WHERE tip_id = $1")
        .bind(tip_id)
        .execute(&mut **tx)
        .await?;
    Ok(res.rows_affected())
}

pub async fn delete_tx(tx: &mut Transaction<'_, Postgres>, tip_id: i64) -> sqlx::Result<u64> {
    let res = sqlx::query("DELETE FROM tips WHERE id = $1")
        .bind(tip_id)
        .execute(&mut **tx)
        .await?;
    Ok(res.rows_affected())
}
