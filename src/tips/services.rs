use anyhow::Context;
use sqlx::PgPool;
use tracing::info;

use super::dto::NewTip;
use super::repo;

/// Saves the tip and its hashtags together.
pub async fn create_tip(db: &PgPool, tip: &NewTip) -> anyhow::Result<i64> {
    let mut tx = db.begin().await.context("begin transaction")?;

    let tip_id = repo::insert_tx(&mut tx, tip).await.context("save tip")?;
    if !tip.hashtags.is_empty() {
        repo::insert_hashtags_tx(&mut tx, tip_id, &tip.hashtags)
            .await
            .context("save hashtags")?;
    }

    tx.commit().await.context("commit transaction")?;
    info!(tip_id, user_id = tip.user_id, hashtags = tip.hashtags.len(), "tip created");
    Ok(tip_id)
}

/// Deletes hashtags then the tip. Returns false when the tip did not exist;
/// nothing is kept from a failed or empty delete.
pub async fn delete_tip(db: &PgPool, tip_id: i64) -> anyhow::Result<bool> {
    let mut tx = db.begin().await.context("begin transaction")?;

    repo::delete_hashtags_tx(&mut tx, tip_id)
        .await
        .context("delete hashtags")?;
    if repo::delete_tx(&mut tx, tip_id).await.context("delete tip")? == 0 {
        tx.rollback().await.context("rollback")?;
        return Ok(false);
    }

    tx.commit().await.context("commit transaction")?;
    info!(tip_id, "tip deleted");
    Ok(true)
}
