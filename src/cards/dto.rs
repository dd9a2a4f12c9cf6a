use serde::{de, Deserialize, Deserializer, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;

use crate::error::AppError;
use crate::recipes::repo_types::NutritionFacts;

/// Summary shown on every recipe card.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct CardRecipe {
    pub id: i64,
    pub name: String,
    pub view_count: i32,
    pub thumbnail: String,
    pub servings: i32,
    pub author_name: String,
    pub rating: f64,
    pub review_count: i64,
    /// Sum of procedure durations, minutes.
    pub total_duration: i64,
    pub price_estimate: i64,
    pub is_bookmarked: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    /// Ranking score, only set on recommendations.
    #[sqlx(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
}

/// A card plus what the health rules look at.
#[derive(Debug, Clone, FromRow)]
pub struct Candidate {
    #[sqlx(flatten)]
    pub card: CardRecipe,
    pub category_id: i64,
    pub nutrition_id: Option<i64>,
    pub carbohydrate: Option<f64>,
    pub protein: Option<f64>,
    pub fat: Option<f64>,
    pub fiber: Option<f64>,
}

impl Candidate {
    pub fn nutrition(&self) -> Option<NutritionFacts> {
        self.nutrition_id.map(|_| NutritionFacts {
            carbohydrate: self.carbohydrate.unwrap_or_default(),
            protein: self.protein.unwrap_or_default(),
            fat: self.fat.unwrap_or_default(),
            fiber: self.fiber.unwrap_or_default(),
        })
    }
}

#[derive(Debug, Serialize)]
pub struct RecipeCount {
    pub total_recipes: i64,
}

#[derive(Debug, Default, Deserialize)]
pub struct ViewerQuery {
    #[serde(default, deserialize_with = "blank_as_none")]
    pub user_id: Option<i64>,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub limit: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct FilterQuery {
    #[serde(default, deserialize_with = "blank_as_none")]
    pub category_id: Option<i64>,
    #[serde(default)]
    pub include: Option<String>,
    #[serde(default)]
    pub exclude: Option<String>,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub user_id: Option<i64>,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub limit: Option<i64>,
}

pub const DEFAULT_RECOMMENDATIONS: i64 = 5;
pub const MAX_LIMIT: i64 = 100;

/// Rejects limits outside `1..=MAX_LIMIT`.
pub fn check_limit(limit: Option<i64>) -> Result<Option<i64>, AppError> {
    match limit {
        Some(l) if !(1..=MAX_LIMIT).contains(&l) => Err(AppError::validation(format!(
            "limit must be between 1 and {MAX_LIMIT}"
        ))),
        other => Ok(other),
    }
}

// `?user_id=` is sent by clients that have no user; treat it as absent.
fn blank_as_none<'de, D: Deserializer<'de>>(d: D) -> Result<Option<i64>, D::Error> {
    match Option::<String>::deserialize(d)? {
        None => Ok(None),
        Some(s) if s.trim().is_empty() => Ok(None),
        Some(s) => s
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| de::Error::custom(format!("expected an integer, got {s:?}"))),
    }
}
