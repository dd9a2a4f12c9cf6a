use anyhow::Context;
use serde_json::Value;
use sqlx::PgPool;
use tracing::{info, warn};

use super::dto::{NewRecipe, ProcedureDetail, StepDetail};
use super::repo;
use super::repo_types::ProcedureStepRow;
use crate::error::{AppError, AppResult};

/// Collection fields that clients may send as JSON-encoded strings.
const NESTED_FIELDS: [&str; 5] = ["nutrition", "tools", "ingredients", "procedures", "tags"];

/// Merges the two accepted request shapes into one [`NewRecipe`].
///
/// The body is either the recipe object itself, or `{"recipe": ...}` where the
/// value is an object or a JSON-encoded string. Any nested collection may also
/// arrive JSON-encoded.
pub fn normalize_payload(body: Value) -> AppResult<NewRecipe> {
    let mut recipe = match body {
        Value::Object(mut map) if map.contains_key("recipe") => {
            match map.remove("recipe").unwrap_or(Value::Null) {
                Value::String(raw) => serde_json::from_str::<Value>(&raw)
                    .map_err(|_| AppError::validation("recipe is not valid JSON"))?,
                other => other,
            }
        }
        other => other,
    };

    let Value::Object(fields) = &mut recipe else {
        return Err(AppError::validation("recipe must be a JSON object"));
    };

    for field in NESTED_FIELDS {
        if let Some(Value::String(raw)) = fields.get(field) {
            let parsed = if raw.trim().is_empty() {
                Value::Null
            } else {
                serde_json::from_str::<Value>(raw)
                    .map_err(|_| AppError::validation(format!("{field} is not valid JSON")))?
            };
            fields.insert(field.to_string(), parsed);
        }
    }
    // An explicit null collection means "none".
    for field in NESTED_FIELDS.iter().skip(1) {
        if matches!(fields.get(*field), Some(Value::Null)) {
            fields.remove(*field);
        }
    }

    serde_json::from_value::<NewRecipe>(recipe)
        .map_err(|e| AppError::validation(format!("invalid recipe payload: {e}")))
}

fn is_blank(v: &Option<String>) -> bool {
    v.as_deref().map_or(true, |s| s.trim().is_empty())
}

/// Checks the required recipe fields.
pub fn validate(recipe: &NewRecipe) -> AppResult<()> {
    let mut missing = Vec::new();
    if recipe.user_id.is_none() {
        missing.push("user_id");
    }
    if is_blank(&recipe.name) {
        missing.push("name");
    }
    if recipe.category_id.is_none() {
        missing.push("category_id");
    }
    if is_blank(&recipe.description) {
        missing.push("description");
    }
    if recipe.servings.map_or(true, |s| s <= 0) {
        missing.push("servings");
    }
    if !missing.is_empty() {
        return Err(AppError::validation(format!(
            "incomplete recipe data: {}",
            missing.join(", ")
        )));
    }
    Ok(())
}

/// Writes the recipe and every dependent row in one transaction.
///
/// Order: recipe, nutrition, tools, ingredients, procedures with their steps,
/// tags. The first failure rolls everything back and is reported with the
/// stage that failed.
pub async fn create_full_recipe(db: &PgPool, recipe: &NewRecipe) -> anyhow::Result<i64> {
    let mut tx = db.begin().await.context("begin transaction")?;

    let result = async {
        let recipe_id = repo::insert_recipe_tx(&mut tx, recipe)
            .await
            .context("save recipe")?;

        if let Some(nutrition) = recipe.nutrition.as_ref().filter(|n| !n.is_empty()) {
            repo::insert_nutrition_tx(&mut tx, recipe_id, nutrition)
                .await
                .context("save nutrition")?;
        }
        if !recipe.tools.is_empty() {
            repo::insert_tools_tx(&mut tx, recipe_id, &recipe.tools)
                .await
                .context("save tools")?;
        }
        if !recipe.ingredients.is_empty() {
            repo::insert_ingredients_tx(&mut tx, recipe_id, &recipe.ingredients)
                .await
                .context("save ingredients")?;
        }
        for (idx, procedure) in recipe.procedures.iter().enumerate() {
            repo::insert_procedure_tx(&mut tx, recipe_id, idx as i32 + 1, procedure)
                .await
                .with_context(|| format!("save procedure {}", idx + 1))?;
        }
        if !recipe.tags.is_empty() {
            repo::insert_tags_tx(&mut tx, recipe_id, &recipe.tags)
                .await
                .context("save tags")?;
        }
        anyhow::Ok(recipe_id)
    }
    .await;

    match result {
        Ok(recipe_id) => {
            tx.commit().await.context("commit transaction")?;
            info!(recipe_id, "recipe created");
            Ok(recipe_id)
        }
        Err(e) => {
            if let Err(rb) = tx.rollback().await {
                warn!(error = %rb, "rollback failed");
            }
            Err(e)
        }
    }
}

/// Folds the ordered procedure/step join rows into nested procedures.
pub fn group_procedures(rows: Vec<ProcedureStepRow>) -> Vec<ProcedureDetail> {
    let mut out: Vec<ProcedureDetail> = Vec::new();
    for row in rows {
        if out.last().map(|p| p.id) != Some(row.procedure_id) {
            out.push(ProcedureDetail {
                id: row.procedure_id,
                name: row.procedure_name,
                position: row.procedure_position,
                duration: row.duration,
                steps: Vec::new(),
            });
        }
        if let (Some(id), Some(description), Some(position), Some(current)) = (
            row.step_id,
            row.step_description,
            row.step_position,
            out.last_mut(),
        ) {
            current.steps.push(StepDetail {
                id,
                description,
                position,
            });
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{count, insert_user};
    use serde_json::json;

    fn full_flat() -> Value {
        json!({
            "user_id": 1,
            "name": "Nasi goreng",
            "category_id": 1,
            "description": "Fried rice",
            "servings": 2,
            "nutrition": {"protein": 12, "fat": "7.5"},
            "tools": [{"name": "wok", "quantity": 1}],
            "ingredients": [{"name": "rice", "quantity": "200", "unit_id": 1}],
            "procedures": [
                {"name": "prep", "duration": 5, "steps": [{"description": "wash"}, {"description": "chop"}]},
                {"name": "cook", "duration": "10"}
            ],
            "tags": [{"name": "rice"}]
        })
    }

    #[test]
    fn flat_payload_is_accepted() {
        let r = normalize_payload(full_flat()).unwrap();
        assert_eq!(r.user_id, Some(1));
        assert_eq!(r.servings, Some(2));
        let n = r.nutrition.as_ref().unwrap();
        assert_eq!(n.protein, Some(12.0));
        assert_eq!(n.fat, Some(7.5));
        assert_eq!(n.fiber, None);
        assert_eq!(r.tools[0].quantity.as_deref(), Some("1"));
        assert_eq!(r.procedures.len(), 2);
        assert_eq!(r.procedures[0].steps.len(), 2);
        assert_eq!(r.procedures[1].duration, Some(10));
        assert!(validate(&r).is_ok());
    }

    #[test]
    fn nested_string_payload_matches_flat() {
        let body = json!({ "recipe": full_flat().to_string() });
        let r = normalize_payload(body).unwrap();
        assert_eq!(r.name.as_deref(), Some("Nasi goreng"));
        assert_eq!(r.ingredients[0].unit_id, Some(1));
        assert_eq!(r.tags[0].name, "rice");
    }

    #[test]
    fn nested_object_payload_is_accepted() {
        let r = normalize_payload(json!({ "recipe": full_flat() })).unwrap();
        assert_eq!(r.category_id, Some(1));
    }

    #[test]
    fn form_style_fields_are_decoded() {
        let body = json!({
            "user_id": "3",
            "name": "Soto",
            "category_id": "3",
            "description": "Soup",
            "servings": "4",
            "nutrition": "{\"carbohydrate\": 20}",
            "procedures": "[{\"name\": \"boil\", \"steps\": [{\"description\": \"heat water\"}]}]",
            "tools": "",
            "tags": null
        });
        let r = normalize_payload(body).unwrap();
        assert_eq!(r.user_id, Some(3));
        assert_eq!(r.servings, Some(4));
        assert_eq!(r.nutrition.unwrap().carbohydrate, Some(20.0));
        assert_eq!(r.procedures[0].steps[0].description, "heat water");
        assert!(r.tools.is_empty());
        assert!(r.tags.is_empty());
    }

    #[test]
    fn bad_nested_json_is_a_validation_error() {
        let err = normalize_payload(json!({"name": "x", "tools": "[oops"})).unwrap_err();
        assert!(matches!(err, AppError::Validation(ref m) if m.contains("tools")));

        let err = normalize_payload(json!({"recipe": "{not json"})).unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));

        let err = normalize_payload(json!([1, 2])).unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[test]
    fn missing_required_fields_are_listed() {
        let r = normalize_payload(json!({"name": "  ", "servings": 0})).unwrap();
        let err = validate(&r).unwrap_err();
        let AppError::Validation(msg) = err else { panic!("expected validation error") };
        for field in ["user_id", "name", "category_id", "description", "servings"] {
            assert!(msg.contains(field), "{msg} should mention {field}");
        }
    }

    #[test]
    fn oversized_integers_are_rejected_not_truncated() {
        let mut body = full_flat();
        body["servings"] = json!(4_294_967_297_i64);
        let err = normalize_payload(body).unwrap_err();
        assert!(matches!(err, AppError::Validation(ref m) if m.contains("out of range")));

        let mut body = full_flat();
        body["procedures"][0]["duration"] = json!("3000000000");
        assert!(matches!(normalize_payload(body), Err(AppError::Validation(_))));
    }

    #[test]
    fn empty_nutrition_object_is_skipped() {
        let r = normalize_payload(json!({"nutrition": {}})).unwrap();
        assert!(r.nutrition.unwrap().is_empty());
    }

    fn row(pid: i64, ppos: i32, step: Option<(i64, &str, i32)>) -> ProcedureStepRow {
        ProcedureStepRow {
            procedure_id: pid,
            procedure_name: format!("p{pid}"),
            procedure_position: ppos,
            duration: 5,
            step_id: step.map(|s| s.0),
            step_description: step.map(|s| s.1.to_string()),
            step_position: step.map(|s| s.2),
        }
    }

    #[test]
    fn groups_steps_under_their_procedure() {
        let grouped = group_procedures(vec![
            row(10, 1, Some((1, "a", 1))),
            row(10, 1, Some((2, "b", 2))),
            row(11, 2, None),
            row(12, 3, Some((3, "c", 1))),
        ]);
        assert_eq!(grouped.len(), 3);
        assert_eq!(grouped[0].steps.len(), 2);
        assert_eq!(grouped[0].steps[1].description, "b");
        assert!(grouped[1].steps.is_empty());
        assert_eq!(grouped[2].position, 3);
        assert_eq!(grouped[2].steps[0].id, 3);
    }

    #[test]
    fn no_rows_means_no_procedures() {
        assert!(group_procedures(Vec::new()).is_empty());
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn saves_every_part_of_a_recipe(pool: PgPool) {
        let author = insert_user(&pool, "chef@masakio.test").await;
        let mut body = full_flat();
        body["user_id"] = json!(author);
        let recipe = normalize_payload(body).unwrap();
        validate(&recipe).unwrap();

        let id = create_full_recipe(&pool, &recipe).await.unwrap();

        let procedures = group_procedures(repo::list_procedure_steps(&pool, id).await.unwrap());
        assert_eq!(procedures.len(), 2);
        assert_eq!(procedures[0].steps.len(), 2);
        assert_eq!(procedures[1].duration, 10);
        assert_eq!(repo::list_tags(&pool, id).await.unwrap().len(), 1);
        assert_eq!(count(&pool, "nutrition").await, 1);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn failed_ingredient_insert_rolls_back_the_recipe(pool: PgPool) {
        let author = insert_user(&pool, "chef@masakio.test").await;
        let mut body = full_flat();
        body["user_id"] = json!(author);
        body["ingredients"][0]["unit_id"] = json!(99_999);
        let recipe = normalize_payload(body).unwrap();
        validate(&recipe).unwrap();

        let err = create_full_recipe(&pool, &recipe).await.unwrap_err();

        assert_eq!(err.to_string(), "save ingredients");
        for table in ["recipes", "nutrition", "tools", "ingredients", "procedures", "tags"] {
            assert_eq!(count(&pool, table).await, 0, "{table} should be empty");
        }
    }
}
