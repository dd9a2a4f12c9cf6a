use sqlx::{PgPool, Postgres, Transaction};

use super::dto::UserChanges;
use crate::auth::repo::USER_COLUMNS;
use crate::auth::repo_types::User;

pub async fn update_tx(
    tx: &mut Transaction<'_, Postgres>,
    id: i64,
    changes: &UserChanges,
) -> sqlx::Result<Option<User>> {
    sqlx::query_as::<_, User>(&format!(
        r#"
        UPDATE users
           SET username      = COALESCE($2, username),
               email         = COALESCE($3, email),
               password_hash = COALESCE($4, password_hash),
               birth_date    = COALESCE($5, birth_date),
               photo         = COALESCE($6, photo)
         WHERE id = $1
        RETURNING {USER_COLUMNS}
        "#
    ))
    .bind(id)
    .bind(changes.username.as_deref())
    .bind(changes.email.as_deref())
    .bind(changes.password_hash.as_deref())
    .bind(changes.birth_date)
    .bind(changes.photo.as_deref())
    .fetch_optional(&mut **tx)
    .await
}

/// Deletes the account; owned rows go with it through ON DELETE CASCADE.
pub async fn delete(db: &PgPool, id: i64) -> sqlx::Result<u64> {
    let res = sqlx::query("DELETE FROM users WHERE id = $1")
        .bind(id)
        .execute(db)
        .await?;
    Ok(res.rows_affected())
}
