use sqlx::PgPool;
use tracing::debug;

use super::repo::{self, HISTORY_LIMIT};

pub fn is_full(current: i64) -> bool {
    current >= HISTORY_LIMIT
}

/// Records a view in one transaction: drops the user's oldest entry when they
/// are at the cap, inserts the new one, bumps the recipe's view counter.
///
/// The user row is locked first, so the count and eviction never race with
/// another view by the same user. An unknown user surfaces as the insert's
/// foreign-key violation.
pub async fn record_view(db: &PgPool, user_id: i64, recipe_id: i64) -> sqlx::Result<i64> {
    let mut tx = db.begin().await?;

    if !repo::lock_user_tx(&mut tx, user_id).await? {
        debug!(user_id, "recording view for unknown user");
    }
    let current = repo::count_tx(&mut tx, user_id).await?;
    if is_full(current) {
        repo::delete_oldest_tx(&mut tx, user_id).await?;
        debug!(user_id, current, "history full, evicted oldest");
    }

    let id = repo::insert_tx(&mut tx, user_id, recipe_id).await?;
    repo::bump_view_count_tx(&mut tx, recipe_id).await?;

    tx.commit().await?;
    Ok(id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{insert_recipe, insert_user};

    async fn kept_recipes(db: &PgPool, user_id: i64) -> Vec<i64> {
        sqlx::query_scalar("SELECT recipe_id FROM history WHERE user_id = $1 ORDER BY viewed_at, id")
            .bind(user_id)
            .fetch_all(db)
            .await
            .unwrap()
    }

    #[test]
    fn eviction_starts_at_the_cap() {
        assert!(!is_full(0));
        assert!(!is_full(HISTORY_LIMIT - 1));
        assert!(is_full(HISTORY_LIMIT));
        assert!(is_full(HISTORY_LIMIT + 3));
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn keeps_the_ten_newest_views(pool: PgPool) {
        let viewer = insert_user(&pool, "viewer@masakio.test").await;
        let author = insert_user(&pool, "author@masakio.test").await;
        let mut recipes = Vec::new();
        for i in 0..13 {
            recipes.push(insert_recipe(&pool, author, 1, &format!("recipe {i}")).await);
        }

        for recipe_id in &recipes {
            record_view(&pool, viewer, *recipe_id).await.unwrap();
        }

        assert_eq!(kept_recipes(&pool, viewer).await, recipes[3..].to_vec());
        let views: i32 = sqlx::query_scalar("SELECT view_count FROM recipes WHERE id = $1")
            .bind(recipes[0])
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(views, 1);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn concurrent_views_at_the_cap_stay_capped(pool: PgPool) {
        let viewer = insert_user(&pool, "busy@masakio.test").await;
        let author = insert_user(&pool, "chef@masakio.test").await;
        let recipe_id = insert_recipe(&pool, author, 1, "soto").await;
        for _ in 0..HISTORY_LIMIT {
            record_view(&pool, viewer, recipe_id).await.unwrap();
        }

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let pool = pool.clone();
                tokio::spawn(async move { record_view(&pool, viewer, recipe_id).await })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        assert_eq!(kept_recipes(&pool, viewer).await.len() as i64, HISTORY_LIMIT);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn unknown_user_is_a_foreign_key_violation(pool: PgPool) {
        let author = insert_user(&pool, "cook@masakio.test").await;
        let recipe_id = insert_recipe(&pool, author, 1, "rawon").await;
        let err = record_view(&pool, author + 1000, recipe_id).await.unwrap_err();
        assert!(crate::error::is_foreign_key_violation(&err));
    }
}
