use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::error::{AppError, AppResult};

/// `{user_id, recipe_id}` body shared by the wishlist, history and review endpoints.
#[derive(Debug, Deserialize)]
pub struct UserRecipeRequest {
    #[serde(default, alias = "id_user", deserialize_with = "crate::recipes::dto::lenient_i64")]
    pub user_id: Option<i64>,
    #[serde(default, alias = "id_resep", deserialize_with = "crate::recipes::dto::lenient_i64")]
    pub recipe_id: Option<i64>,
}

impl UserRecipeRequest {
    pub fn require(&self) -> AppResult<(i64, i64)> {
        match (self.user_id, self.recipe_id) {
            (Some(u), Some(r)) => Ok((u, r)),
            _ => Err(AppError::validation("user_id and recipe_id are required")),
        }
    }
}

#[derive(Debug, Serialize, FromRow)]
pub struct WishlistItem {
    pub recipe_id: i64,
    pub name: String,
    pub thumbnail: String,
    pub review_count: i64,
    /// Average rating, one decimal; 0 without reviews.
    pub rating: f64,
}
