use sqlx::PgPool;
use tracing::info;

use super::dto::{LikeState, NewPost};
use super::repo;
use crate::error::{is_foreign_key_violation, AppError, AppResult};

/// Replies nest one level only: the parent must be a top-level post.
pub fn check_parent(parent: Option<Option<i64>>) -> AppResult<()> {
    match parent {
        None => Err(AppError::not_found("Parent discussion not found")),
        Some(Some(_)) => Err(AppError::validation("Cannot reply to a reply")),
        Some(None) => Ok(()),
    }
}

pub async fn create_post(db: &PgPool, post: &NewPost) -> AppResult<i64> {
    if let Some(parent_id) = post.reply_to {
        check_parent(repo::parent_of(db, parent_id).await?)?;
    }
    let id = repo::insert(db, post).await.map_err(|e| {
        if is_foreign_key_violation(&e) {
            AppError::not_found("User not found")
        } else {
            e.into()
        }
    })?;
    info!(discussion_id = id, user_id = post.user_id, reply_to = ?post.reply_to, "discussion posted");
    Ok(id)
}

/// Likes the post if the user has not yet, otherwise removes the like.
pub async fn toggle_like(db: &PgPool, id: i64, user_id: i64) -> AppResult<LikeState> {
    let mut tx = db.begin().await?;

    if !repo::lock_tx(&mut tx, id).await? {
        return Err(AppError::not_found("Discussion not found"));
    }
    let liked = if repo::unlike_tx(&mut tx, id, user_id).await? {
        false
    } else {
        repo::like_tx(&mut tx, id, user_id).await.map_err(|e| {
            if is_foreign_key_violation(&e) {
                AppError::not_found("User not found")
            } else {
                AppError::from(e)
            }
        })?;
        true
    };
    let like_count = repo::refresh_like_count_tx(&mut tx, id).await?;

    tx.commit().await?;
    Ok(LikeState { liked, like_count })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_parent_is_not_found() {
        assert!(matches!(check_parent(None), Err(AppError::NotFound(_))));
    }

    #[test]
    fn reply_to_a_reply_is_rejected() {
        assert!(matches!(check_parent(Some(Some(3))), Err(AppError::Validation(_))));
    }

    #[test]
    fn top_level_parent_is_accepted() {
        assert!(check_parent(Some(None)).is_ok());
    }
}
