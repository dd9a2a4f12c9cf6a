use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use time::OffsetDateTime;

use crate::error::{AppError, AppResult};

#[derive(Debug, Deserialize)]
pub struct AddReviewRequest {
    #[serde(default, alias = "id_user", deserialize_with = "crate::recipes::dto::lenient_i64")]
    pub user_id: Option<i64>,
    #[serde(default, alias = "id_resep", deserialize_with = "crate::recipes::dto::lenient_i64")]
    pub recipe_id: Option<i64>,
    /// Kept raw so a bad rating is reported as a 400 with a clear message.
    #[serde(default)]
    pub rating: Option<Value>,
    #[serde(default, alias = "komentar")]
    pub comment: Option<String>,
}

/// A validated review submission.
#[derive(Debug, PartialEq)]
pub struct ReviewInput {
    pub user_id: i64,
    pub recipe_id: i64,
    pub rating: i32,
    pub comment: Option<String>,
}

impl AddReviewRequest {
    pub fn validate(self) -> AppResult<ReviewInput> {
        let (Some(user_id), Some(recipe_id), Some(raw)) = (self.user_id, self.recipe_id, self.rating)
        else {
            return Err(AppError::validation("user_id, recipe_id and rating are required"));
        };
        let rating = parse_rating(&raw)
            .ok_or_else(|| AppError::validation("rating must be a number between 1 and 5"))?;
        let comment = self
            .comment
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty());
        Ok(ReviewInput {
            user_id,
            recipe_id,
            rating,
            comment,
        })
    }
}

// Leading-integer parse, so "4" and "4.0" both mean 4.
fn parse_rating(raw: &Value) -> Option<i32> {
    let n = match raw {
        Value::Number(n) => n.as_f64()?.trunc() as i64,
        Value::String(s) => {
            let s = s.trim();
            let digits: String = s.chars().take_while(|c| c.is_ascii_digit()).collect();
            digits.parse().ok()?
        }
        _ => return None,
    };
    (1..=5).contains(&n).then_some(n as i32)
}

#[derive(Debug, Serialize, FromRow)]
pub struct ReviewRow {
    pub id: i64,
    pub recipe_name: String,
    pub user_id: i64,
    pub username: String,
    pub email: String,
    pub rating: i32,
    pub comment: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339::option")]
    pub updated_at: Option<OffsetDateTime>,
}

#[derive(Debug, Serialize, FromRow)]
pub struct ReviewStats {
    pub total_reviews: i64,
    /// Two decimals; 0 without reviews.
    pub average_rating: f64,
    pub rating_5: i64,
    pub rating_4: i64,
    pub rating_3: i64,
    pub rating_2: i64,
    pub rating_1: i64,
}

#[derive(Debug, Serialize)]
pub struct ReviewSaved {
    pub message: String,
    pub review_id: i64,
}
