use sqlx::{PgExecutor, PgPool};

use super::repo_types::Disease;

pub async fn list_all(db: &PgPool) -> sqlx::Result<Vec<Disease>> {
    sqlx::query_as::<_, Disease>("SELECT id, name FROM diseases ORDER BY name")
        .fetch_all(db)
        .await
}

pub async fn list_for_user(db: &PgPool, user_id: i64) -> sqlx::Result<Vec<Disease>> {
    sqlx::query_as::<_, Disease>(
        r#"
        SELECT d.id, d.name
          FROM user_diseases ud
          JOIN diseases d ON d.id = ud.disease_id
         WHERE ud.user_id = $1
         ORDER BY d.name
        "#,
    )
    .bind(user_id)
    .fetch_all(db)
    .await
}

pub async fn names_for_user<'e, E: PgExecutor<'e>>(ex: E, user_id: i64) -> sqlx::Result<Vec<String>> {
    sqlx::query_scalar::<_, String>(
        r#"
        SELECT d.name
          FROM user_diseases ud
          JOIN diseases d ON d.id = ud.disease_id
         WHERE ud.user_id = $1
         ORDER BY d.name
        "#,
    )
    .bind(user_id)
    .fetch_all(ex)
    .await
}

/// Case-insensitive lookup by name.
pub async fn find_id_by_name<'e, E: PgExecutor<'e>>(ex: E, name: &str) -> sqlx::Result<Option<i64>> {
    sqlx::query_scalar::<_, i64>("SELECT id FROM diseases WHERE lower(name) = lower($1)")
        .bind(name.trim())
        .fetch_optional(ex)
        .await
}

/// Links a disease to a user. Returns the new link id, or `None` when the
/// pair already existed.
pub async fn link<'e, E: PgExecutor<'e>>(
    ex: E,
    user_id: i64,
    disease_id: i64,
) -> sqlx::Result<Option<i64>> {
    sqlx::query_scalar::<_, i64>(
        r#"
        INSERT INTO user_diseases (user_id, disease_id)
        VALUES ($1, $2)
        ON CONFLICT (user_id, disease_id) DO NOTHING
        RETURNING id
        "#,
    )
    .bind(user_id)
    .bind(disease_id)
    .fetch_optional(ex)
    .await
}

/// Returns the number of links removed.
pub async fn unlink(db: &PgPool, user_id: i64, disease_id: i64) -> sqlx::Result<u64> {
    let res = sqlx::query("DELETE FROM user_diseases WHERE user_id = $1 AND disease_id = $2")
        .bind(user_id)
        .bind(disease_id)
        .execute(db)
        .await?;
    Ok(res.rows_affected())
}
