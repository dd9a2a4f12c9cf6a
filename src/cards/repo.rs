use sqlx::{PgPool, Postgres, QueryBuilder};

use super::dto::{Candidate, CardRecipe};

// Aggregates come from per-table subqueries so the joins never multiply rows.
// The price estimate is 2000 per distinct ingredient.
const CARD_SELECT: &str = r#"
    SELECT r.id, r.name, r.view_count, r.thumbnail, r.servings, r.created_at,
           u.username AS author_name,
           COALESCE(rv.rating, 0)::float8 AS rating,
           COALESCE(rv.review_count, 0)::bigint AS review_count,
           COALESCE(pd.total_duration, 0)::bigint AS total_duration,
           (COALESCE(ig.ingredient_count, 0) * 2000)::bigint AS price_estimate,
           (w.id IS NOT NULL) AS is_bookmarked
"#;

const CARD_FROM: &str = r#"
      FROM recipes r
      JOIN users u ON u.id = r.user_id
      LEFT JOIN (
            SELECT recipe_id, ROUND(AVG(rating)::numeric, 2) AS rating, COUNT(*) AS review_count
              FROM reviews GROUP BY recipe_id
      ) rv ON rv.recipe_id = r.id
      LEFT JOIN (
            SELECT recipe_id, SUM(duration) AS total_duration
              FROM procedures GROUP BY recipe_id
      ) pd ON pd.recipe_id = r.id
      LEFT JOIN (
            SELECT recipe_id, COUNT(DISTINCT lower(name)) AS ingredient_count
              FROM ingredients GROUP BY recipe_id
      ) ig ON ig.recipe_id = r.id
      LEFT JOIN wishlists w ON w.recipe_id = r.id AND w.user_id = "#;

const POPULAR_ORDER: &str = " ORDER BY rating DESC, review_count DESC, r.view_count DESC, r.id";

/// Card SELECT up to the end of the joins; `viewer` drives `is_bookmarked`.
fn card_builder<'a>(viewer: Option<i64>, extra_columns: &str, extra_joins: &str) -> QueryBuilder<'a, Postgres> {
    let mut qb = QueryBuilder::<Postgres>::new(CARD_SELECT);
    qb.push(extra_columns);
    qb.push(CARD_FROM);
    qb.push_bind(viewer);
    qb.push(extra_joins);
    qb
}

fn push_limit(qb: &mut QueryBuilder<'_, Postgres>, limit: Option<i64>) {
    if let Some(limit) = limit {
        qb.push(" LIMIT ").push_bind(limit);
    }
}

pub async fn list_all(
    db: &PgPool,
    viewer: Option<i64>,
    limit: Option<i64>,
) -> sqlx::Result<Vec<CardRecipe>> {
    let mut qb = card_builder(viewer, "", "");
    qb.push(POPULAR_ORDER);
    push_limit(&mut qb, limit);
    qb.build_query_as::<CardRecipe>().fetch_all(db).await
}

pub async fn list_by_category(
    db: &PgPool,
    category_id: i64,
    viewer: Option<i64>,
    limit: Option<i64>,
) -> sqlx::Result<Vec<CardRecipe>> {
    let mut qb = card_builder(viewer, "", "");
    qb.push(" WHERE r.category_id = ").push_bind(category_id);
    qb.push(POPULAR_ORDER);
    push_limit(&mut qb, limit);
    qb.build_query_as::<CardRecipe>().fetch_all(db).await
}

pub async fn list_by_author(
    db: &PgPool,
    author_id: i64,
    viewer: Option<i64>,
) -> sqlx::Result<Vec<CardRecipe>> {
    let mut qb = card_builder(viewer, "", "");
    qb.push(" WHERE r.user_id = ").push_bind(author_id);
    qb.push(" ORDER BY r.created_at DESC, r.id DESC");
    qb.build_query_as::<CardRecipe>().fetch_all(db).await
}

pub async fn count_by_author(db: &PgPool, author_id: i64) -> sqlx::Result<i64> {
    sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM recipes WHERE user_id = $1")
        .bind(author_id)
        .fetch_one(db)
        .await
}

/// Most recipes handed to the in-memory ranking per request.
pub const CANDIDATE_POOL: i64 = 500;

fn candidates_builder<'a>(viewer: Option<i64>) -> QueryBuilder<'a, Postgres> {
    let mut qb = card_builder(
        viewer,
        ", r.category_id, n.id AS nutrition_id, n.carbohydrate, n.protein, n.fat, n.fiber",
        " LEFT JOIN nutrition n ON n.recipe_id = r.id",
    );
    qb.push(POPULAR_ORDER);
    push_limit(&mut qb, Some(CANDIDATE_POOL));
    qb
}

/// The most popular recipes with category and nutrition, for the
/// recommendation ranking. Health filtering only sees this pool.
pub async fn recommendation_candidates(
    db: &PgPool,
    viewer: Option<i64>,
) -> sqlx::Result<Vec<Candidate>> {
    candidates_builder(viewer)
        .build_query_as::<Candidate>()
        .fetch_all(db)
        .await
}

/// Ingredient include/exclude search.
///
/// Every include term must appear in some ingredient name and no exclude term
/// may appear in any of them. Matching is a case-insensitive substring match.
pub async fn filter(
    db: &PgPool,
    include: &[String],
    exclude: &[String],
    category_id: Option<i64>,
    viewer: Option<i64>,
    limit: Option<i64>,
) -> sqlx::Result<Vec<CardRecipe>> {
    let mut qb = card_builder(viewer, "", "");
    push_filter_conditions(&mut qb, include, exclude, category_id);
    qb.push(POPULAR_ORDER);
    push_limit(&mut qb, limit);
    qb.build_query_as::<CardRecipe>().fetch_all(db).await
}

fn push_filter_conditions(
    qb: &mut QueryBuilder<'_, Postgres>,
    include: &[String],
    exclude: &[String],
    category_id: Option<i64>,
) {
    qb.push(" WHERE TRUE");
    if let Some(category_id) = category_id {
        qb.push(" AND r.category_id = ").push_bind(category_id);
    }
    for term in include {
        qb.push(" AND EXISTS (SELECT 1 FROM ingredients i WHERE i.recipe_id = r.id AND i.name ILIKE ")
            .push_bind(like_pattern(term))
            .push(" ESCAPE '\\')");
    }
    for term in exclude {
        qb.push(" AND NOT EXISTS (SELECT 1 FROM ingredients i WHERE i.recipe_id = r.id AND i.name ILIKE ")
            .push_bind(like_pattern(term))
            .push(" ESCAPE '\\')");
    }
}

/// Splits a comma separated term list, trimming and dropping empties.
pub fn parse_terms(raw: Option<&str>) -> Vec<String> {
    raw.unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

/// `%term%` with the LIKE wildcards inside `term` escaped.
pub fn like_pattern(term: &str) -> String {
    let mut out = String::with_capacity(term.len() + 2);
    out.push('%');
    for ch in term.chars() {
        if matches!(ch, '\\' | '%' | '_') {
            out.push('\\');
        }
        out.push(ch);
    }
    out.push('%');
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terms_are_trimmed_and_empties_dropped() {
        assert_eq!(parse_terms(Some(" egg, ,rice ,")), vec!["egg", "rice"]);
        assert!(parse_terms(None).is_empty());
        assert!(parse_terms(Some(" , ")).is_empty());
    }

    #[test]
    fn like_wildcards_are_escaped() {
        assert_eq!(like_pattern("egg"), "%egg%");
        assert_eq!(like_pattern("50%_off\\"), "%50\\%\\_off\\\\%");
    }

    #[test]
    fn filter_sql_binds_every_term() {
        let mut qb = card_builder(Some(1), "", "");
        push_filter_conditions(
            &mut qb,
            &["egg".into(), "rice".into()],
            &["peanut".into()],
            Some(3),
        );
        let sql = qb.sql();
        assert_eq!(sql.matches(" AND EXISTS").count(), 2);
        assert_eq!(sql.matches("NOT EXISTS").count(), 1);
        // Viewer, category, then the three terms.
        assert!(sql.contains("$5"));
        assert!(!sql.contains("$6"));
    }

    #[test]
    fn candidate_pool_is_bounded_in_sql() {
        let qb = candidates_builder(Some(7));
        let sql = qb.sql();
        assert!(sql.contains("ORDER BY rating DESC"));
        assert!(sql.trim_end().ends_with("LIMIT $2"));
    }

    #[test]
    fn card_select_binds_viewer_first() {
        let qb = card_builder(None, "", "");
        assert!(qb.sql().trim_end().ends_with("w.user_id = $1"));
    }
}
