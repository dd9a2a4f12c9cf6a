use serde::Serialize;
use sqlx::FromRow;
use time::OffsetDateTime;

#[derive(Debug, FromRow)]
pub struct RecipeInfoRow {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub video: Option<String>,
    pub thumbnail: String,
    pub servings: i32,
    pub like_count: i32,
    pub view_count: i32,
    pub created_at: OffsetDateTime,
    pub author_id: i64,
    pub author_name: String,
    pub author_email: String,
    pub category_id: i64,
    pub category_name: String,
    pub nutrition_id: Option<i64>,
    pub carbohydrate: Option<f64>,
    pub protein: Option<f64>,
    pub fat: Option<f64>,
    pub fiber: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NutritionFacts {
    pub carbohydrate: f64,
    pub protein: f64,
    pub fat: f64,
    pub fiber: f64,
}

#[derive(Debug, Serialize)]
pub struct RecipeInfo {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub video: Option<String>,
    pub thumbnail: String,
    pub servings: i32,
    pub like_count: i32,
    pub view_count: i32,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    pub author_id: i64,
    pub author_name: String,
    pub author_email: String,
    pub category_id: i64,
    pub category_name: String,
    pub nutrition: Option<NutritionFacts>,
}

impl From<RecipeInfoRow> for RecipeInfo {
    fn from(r: RecipeInfoRow) -> Self {
        let nutrition = r.nutrition_id.map(|_| NutritionFacts {
            carbohydrate: r.carbohydrate.unwrap_or_default(),
            protein: r.protein.unwrap_or_default(),
            fat: r.fat.unwrap_or_default(),
            fiber: r.fiber.unwrap_or_default(),
        });
        Self {
            id: r.id,
            name: r.name,
            description: r.description,
            video: r.video,
            thumbnail: r.thumbnail,
            servings: r.servings,
            like_count: r.like_count,
            view_count: r.view_count,
            created_at: r.created_at,
            author_id: r.author_id,
            author_name: r.author_name,
            author_email: r.author_email,
            category_id: r.category_id,
            category_name: r.category_name,
            nutrition,
        }
    }
}

#[derive(Debug, Serialize, FromRow)]
pub struct ToolRow {
    pub id: i64,
    pub name: String,
    pub quantity: Option<String>,
}

#[derive(Debug, Serialize, FromRow)]
pub struct IngredientRow {
    pub id: i64,
    pub name: String,
    pub quantity: Option<String>,
    pub unit_id: Option<i64>,
    pub unit_name: Option<String>,
}

/// One row of the procedures LEFT JOIN steps query.
#[derive(Debug, FromRow)]
pub struct ProcedureStepRow {
    pub procedure_id: i64,
    pub procedure_name: String,
    pub procedure_position: i32,
    pub duration: i32,
    pub step_id: Option<i64>,
    pub step_description: Option<String>,
    pub step_position: Option<i32>,
}

#[derive(Debug, Serialize, FromRow)]
pub struct TagRow {
    pub id: i64,
    pub name: String,
}
