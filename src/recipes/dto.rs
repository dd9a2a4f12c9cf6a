use serde::{de, Deserialize, Deserializer, Serialize};

use super::repo_types::{IngredientRow, RecipeInfo, TagRow, ToolRow};

#[derive(Debug, Serialize)]
pub struct RecipeDetail {
    pub info: RecipeInfo,
    pub tools: Vec<ToolRow>,
    pub ingredients: Vec<IngredientRow>,
    pub procedures: Vec<ProcedureDetail>,
    pub tags: Vec<TagRow>,
}

#[derive(Debug, PartialEq, Serialize)]
pub struct ProcedureDetail {
    pub id: i64,
    pub name: String,
    pub position: i32,
    pub duration: i32,
    pub steps: Vec<StepDetail>,
}

#[derive(Debug, PartialEq, Serialize)]
pub struct StepDetail {
    pub id: i64,
    pub description: String,
    pub position: i32,
}

/// Recipe payload after the nested/flat forms have been merged.
#[derive(Debug, Default, Deserialize)]
pub struct NewRecipe {
    #[serde(default, deserialize_with = "lenient_i64")]
    pub user_id: Option<i64>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient_i64")]
    pub category_id: Option<i64>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "lenient_i32")]
    pub servings: Option<i32>,
    #[serde(default)]
    pub video: Option<String>,
    #[serde(default)]
    pub thumbnail: Option<String>,
    #[serde(default)]
    pub nutrition: Option<NewNutrition>,
    #[serde(default)]
    pub tools: Vec<NewTool>,
    #[serde(default)]
    pub ingredients: Vec<NewIngredient>,
    #[serde(default)]
    pub procedures: Vec<NewProcedure>,
    #[serde(default)]
    pub tags: Vec<NewTag>,
}

#[derive(Debug, Default, Deserialize)]
pub struct NewNutrition {
    #[serde(default, deserialize_with = "lenient_f64")]
    pub carbohydrate: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub protein: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub fat: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub fiber: Option<f64>,
}

impl NewNutrition {
    pub fn is_empty(&self) -> bool {
        self.carbohydrate.is_none()
            && self.protein.is_none()
            && self.fat.is_none()
            && self.fiber.is_none()
    }
}

#[derive(Debug, Deserialize)]
pub struct NewTool {
    pub name: String,
    #[serde(default, deserialize_with = "lenient_text")]
    pub quantity: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct NewIngredient {
    pub name: String,
    #[serde(default, deserialize_with = "lenient_text")]
    pub quantity: Option<String>,
    #[serde(default, deserialize_with = "lenient_i64")]
    pub unit_id: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct NewProcedure {
    pub name: String,
    /// Minutes.
    #[serde(default, deserialize_with = "lenient_i32")]
    pub duration: Option<i32>,
    #[serde(default)]
    pub steps: Vec<NewStep>,
}

#[derive(Debug, Deserialize)]
pub struct NewStep {
    pub description: String,
}

#[derive(Debug, Deserialize)]
pub struct NewTag {
    pub name: String,
}

#[derive(Debug, Serialize)]
pub struct CreatedRecipeResponse {
    pub success: bool,
    pub message: String,
    pub recipe_id: i64,
}

// Form submissions send numbers as strings; accept both.
#[derive(Deserialize)]
#[serde(untagged)]
enum Scalar {
    Int(i64),
    Float(f64),
    Text(String),
}

pub(crate) fn lenient_i64<'de, D: Deserializer<'de>>(d: D) -> Result<Option<i64>, D::Error> {
    match Option::<Scalar>::deserialize(d)? {
        None => Ok(None),
        Some(Scalar::Int(n)) => Ok(Some(n)),
        Some(Scalar::Float(f)) if f.fract() == 0.0 => Ok(Some(f as i64)),
        Some(Scalar::Float(f)) => Err(de::Error::custom(format!("expected an integer, got {f}"))),
        Some(Scalar::Text(s)) if s.trim().is_empty() => Ok(None),
        Some(Scalar::Text(s)) => s
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| de::Error::custom(format!("expected an integer, got {s:?}"))),
    }
}

/// Like [`lenient_i64`], for INTEGER columns; out-of-range values are rejected.
fn lenient_i32<'de, D: Deserializer<'de>>(d: D) -> Result<Option<i32>, D::Error> {
    lenient_i64(d)?
        .map(|n| {
            i32::try_from(n).map_err(|_| de::Error::custom(format!("{n} is out of range")))
        })
        .transpose()
}

fn lenient_f64<'de, D: Deserializer<'de>>(d: D) -> Result<Option<f64>, D::Error> {
    match Option::<Scalar>::deserialize(d)? {
        None => Ok(None),
        Some(Scalar::Int(n)) => Ok(Some(n as f64)),
        Some(Scalar::Float(f)) => Ok(Some(f)),
        Some(Scalar::Text(s)) if s.trim().is_empty() => Ok(None),
        Some(Scalar::Text(s)) => s
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| de::Error::custom(format!("expected a number, got {s:?}"))),
    }
}

fn lenient_text<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
    Ok(match Option::<Scalar>::deserialize(d)? {
        None => None,
        Some(Scalar::Int(n)) => Some(n.to_string()),
        Some(Scalar::Float(f)) => Some(f.to_string()),
        Some(Scalar::Text(s)) => Some(s),
    })
}
