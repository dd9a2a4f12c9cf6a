use sqlx::{PgPool, Postgres, QueryBuilder, Transaction};

use super::dto::{NewIngredient, NewNutrition, NewProcedure, NewRecipe, NewTag, NewTool};
use super::repo_types::{IngredientRow, ProcedureStepRow, RecipeInfoRow, TagRow, ToolRow};

/// Stored when a recipe is created without a thumbnail.
pub const DEFAULT_THUMBNAIL: &str = "default_recipe.jpeg";

// ---- Queries ----

pub async fn find_info(db: &PgPool, recipe_id: i64) -> sqlx::Result<Option<RecipeInfoRow>> {
    sqlx::query_as::<_, RecipeInfoRow>(
        r#"
        SELECT r.id, r.name, r.description, r.video, r.thumbnail, r.servings,
               r.like_count, r.view_count, r.created_at,
               u.id AS author_id, u.username AS author_name, u.email AS author_email,
               c.id AS category_id, c.name AS category_name,
               n.id AS nutrition_id, n.carbohydrate, n.protein, n.fat, n.fiber
          FROM recipes r
          JOIN users u ON u.id = r.user_id
          JOIN categories c ON c.id = r.category_id
          LEFT JOIN nutrition n ON n.recipe_id = r.id
         WHERE r.id = $1
        "#,
    )
    .bind(recipe_id)
    .fetch_optional(db)
    .await
}

pub async fn list_tools(db: &PgPool, recipe_id: i64) -> sqlx::Result<Vec<ToolRow>> {
    sqlx::query_as::<_, ToolRow>(
        "SELECT id, name, quantity FROM tools WHERE recipe_id = $1 ORDER BY id",
    )
    .bind(recipe_id)
    .fetch_all(db)
    .await
}

pub async fn list_ingredients(db: &PgPool, recipe_id: i64) -> sqlx::Result<Vec<IngredientRow>> {
    sqlx::query_as::<_, IngredientRow>(
        r#"
        SELECT i.id, i.name, i.quantity, un.id AS unit_id, un.name AS unit_name
          FROM ingredients i
          LEFT JOIN units un ON un.id = i.unit_id
         WHERE i.recipe_id = $1
         ORDER BY i.id
        "#,
    )
    .bind(recipe_id)
    .fetch_all(db)
    .await
}

pub async fn list_procedure_steps(
    db: &PgPool,
    recipe_id: i64,
) -> sqlx::Result<Vec<ProcedureStepRow>> {
    sqlx::query_as::<_, ProcedureStepRow>(
        r#"
        SELECT p.id AS procedure_id, p.name AS procedure_name,
               p.position AS procedure_position, p.duration,
               s.id AS step_id, s.description AS step_description, s.position AS step_position
          FROM procedures p
          LEFT JOIN steps s ON s.procedure_id = p.id
         WHERE p.recipe_id = $1
         ORDER BY p.position, s.position
        "#,
    )
    .bind(recipe_id)
    .fetch_all(db)
    .await
}

pub async fn list_tags(db: &PgPool, recipe_id: i64) -> sqlx::Result<Vec<TagRow>> {
    sqlx::query_as::<_, TagRow>("SELECT id, name FROM tags WHERE recipe_id = $1 ORDER BY name")
        .bind(recipe_id)
        .fetch_all(db)
        .await
}

// ---- Inserts (all inside the caller's transaction) ----

/// Inserts the recipe row; `recipe` must already be validated.
pub async fn insert_recipe_tx(
    tx: &mut Transaction<'_, Postgres>,
    recipe: &NewRecipe,
) -> sqlx::Result<i64> {
    sqlx::query_scalar::<_, i64>(
        r#"
        INSERT INTO recipes (user_id, category_id, name, description, servings, video, thumbnail)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        RETURNING id
        "#,
    )
    .bind(recipe.user_id)
    .bind(recipe.category_id)
    .bind(recipe.name.as_deref().map(str::trim))
    .bind(recipe.description.as_deref())
    .bind(recipe.servings)
    .bind(recipe.video.as_deref().filter(|v| !v.trim().is_empty()))
    .bind(
        recipe
            .thumbnail
            .as_deref()
            .filter(|t| !t.trim().is_empty())
            .unwrap_or(DEFAULT_THUMBNAIL),
    )
    .fetch_one(&mut **tx)
    .await
}

pub async fn insert_nutrition_tx(
    tx: &mut Transaction<'_, Postgres>,
    recipe_id: i64,
    n: &NewNutrition,
) -> sqlx::Result<()> {
    sqlx::query(
        r#"
        INSERT INTO nutrition (recipe_id, carbohydrate, protein, fat, fiber)
        VALUES ($1, $2, $3, $4, $5)
        "#,
    )
    .bind(recipe_id)
    .bind(n.carbohydrate.unwrap_or(0.0))
    .bind(n.protein.unwrap_or(0.0))
    .bind(n.fat.unwrap_or(0.0))
    .bind(n.fiber.unwrap_or(0.0))
    .execute(&mut **tx)
    .await?;
    Ok(())
}

pub async fn insert_tools_tx(
    tx: &mut Transaction<'_, Postgres>,
    recipe_id: i64,
    tools: &[NewTool],
) -> sqlx::Result<()> {
    let mut qb = QueryBuilder::<Postgres>::new("INSERT INTO tools (recipe_id, name, quantity) ");
    qb.push_values(tools, |mut b, t| {
        b.push_bind(recipe_id)
            .push_bind(t.name.clone())
            .push_bind(t.quantity.clone());
    });
    qb.build().execute(&mut **tx).await?;
    Ok(())
}

pub async fn insert_ingredients_tx(
    tx: &mut Transaction<'_, Postgres>,
    recipe_id: i64,
    ingredients: &[NewIngredient],
) -> sqlx::Result<()> {
    let mut qb = QueryBuilder::<Postgres>::new(
        "INSERT INTO ingredients (recipe_id, name, quantity, unit_id) ",
    );
    qb.push_values(ingredients, |mut b, i| {
        b.push_bind(recipe_id)
            .push_bind(i.name.clone())
            .push_bind(i.quantity.clone())
            .push_bind(i.unit_id);
    });
    qb.build().execute(&mut **tx).await?;
    Ok(())
}

/// Inserts one procedure at `position` and its steps numbered from 1.
pub async fn insert_procedure_tx(
    tx: &mut Transaction<'_, Postgres>,
    recipe_id: i64,
    position: i32,
    procedure: &NewProcedure,
) -> sqlx::Result<i64> {
    let procedure_id = sqlx::query_scalar::<_, i64>(
        r#"
        INSERT INTO procedures (recipe_id, name, position, duration)
        VALUES ($1, $2, $3, $4)
        RETURNING id
        "#,
    )
    .bind(recipe_id)
    .bind(&procedure.name)
    .bind(position)
    .bind(procedure.duration.unwrap_or(0))
    .fetch_one(&mut **tx)
    .await?;

    if !procedure.steps.is_empty() {
        let mut qb =
            QueryBuilder::<Postgres>::new("INSERT INTO steps (procedure_id, description, position) ");
        qb.push_values(procedure.steps.iter().enumerate(), |mut b, (idx, s)| {
            b.push_bind(procedure_id)
                .push_bind(s.description.clone())
                .push_bind(idx as i32 + 1);
        });
        qb.build().execute(&mut **tx).await?;
    }

    Ok(procedure_id)
}

pub async fn insert_tags_tx(
    tx: &mut Transaction<'_, Postgres>,
    recipe_id: i64,
    tags: &[NewTag],
) -> sqlx::Result<()> {
    let mut qb = QueryBuilder::<Postgres>::new("INSERT INTO tags (recipe_id, name) ");
    qb.push_values(tags, |mut b, t| {
        b.push_bind(recipe_id).push_bind(t.name.clone());
    });
    qb.build().execute(&mut **tx).await?;
    Ok(())
}
