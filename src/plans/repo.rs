use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use time::{Date, OffsetDateTime};
use uuid::Uuid;

use crate::recipes::repo::{self as recipes_repo, Ingredient, Recipe};

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DayPlan {
    pub id: Uuid,
    pub user_id: Uuid,
    pub date: Date,
    pub recipe_id: Option<Uuid>,
    pub meal_type: String,
    pub created_at: OffsetDateTime,
}

/// A day plan joined with its recipe and the recipe's ingredients.
/// Plans without a recipe carry `None`.
#[derive(Debug, Clone)]
pub struct PlanWithRecipe {
    pub plan: DayPlan,
    pub recipe: Option<(Recipe, Vec<Ingredient>)>,
}

pub async fn list_range(
    db: &PgPool,
    user_id: Uuid,
    start: Date,
    end: Date,
) -> anyhow::Result<Vec<DayPlan>> {
    let rows = sqlx::query_as::<_, DayPlan>(
        r#"
        SELECT id, user_id, date, recipe_id, meal_type, created_at
        FROM day_plans
        WHERE user_id = $1 AND date >= $2 AND date <= $3
        ORDER BY date ASC, created_at ASC
        "#,
    )
    .bind(user_id)
    .bind(start)
    .bind(end)
    .fetch_all(db)
    .await?;
    Ok(rows)
}

/// Load all plans in a range together with their recipes and ingredients.
pub async fn plans_with_recipes(
    db: &PgPool,
    user_id: Uuid,
    start: Date,
    end: Date,
) -> anyhow::Result<Vec<PlanWithRecipe>> {
    let plans = list_range(db, user_id, start, end).await?;

    let recipe_ids: Vec<Uuid> = plans.iter().filter_map(|p| p.recipe_id).collect();
    let recipes = sqlx::query_as::<_, Recipe>(
        r#"
        SELECT id, user_id, name, description, image, rating, created_at
        FROM recipes
        WHERE id = ANY($1) AND user_id = $2
        "#,
    )
    .bind(&recipe_ids)
    .bind(user_id)
    .fetch_all(db)
    .await?;

    let mut ingredients_by_recipe: HashMap<Uuid, Vec<Ingredient>> = HashMap::new();
    for ingredient in recipes_repo::ingredients_for_recipes(db, &recipe_ids).await? {
        ingredients_by_recipe
            .entry(ingredient.recipe_id)
            .or_default()
            .push(ingredient);
    }

    // Several plans may reference the same recipe, so entries are cloned out
    // rather than moved.
    let recipes_by_id: HashMap<Uuid, Recipe> =
        recipes.into_iter().map(|r| (r.id, r)).collect();

    Ok(plans
        .into_iter()
        .map(|plan| {
            let recipe = plan.recipe_id.and_then(|rid| {
                recipes_by_id.get(&rid).cloned().map(|r| {
                    let ings = ingredients_by_recipe.get(&rid).cloned().unwrap_or_default();
                    (r, ings)
                })
            });
            PlanWithRecipe { plan, recipe }
        })
        .collect())
}

pub async fn create(
    db: &PgPool,
    user_id: Uuid,
    date: Date,
    recipe_id: Option<Uuid>,
    meal_type: &str,
) -> anyhow::Result<DayPlan> {
    let plan = sqlx::query_as::<_, DayPlan>(
        r#"
        INSERT INTO day_plans (user_id, date, recipe_id, meal_type)
        VALUES ($1, $2, $3, $4)
        RETURNING id, user_id, date, recipe_id, meal_type, created_at
        "#,
    )
    .bind(user_id)
    .bind(date)
    .bind(recipe_id)
    .bind(meal_type)
    .fetch_one(db)
    .await?;
    Ok(plan)
}

pub async fn delete_by_id(db: &PgPool, user_id: Uuid, id: Uuid) -> anyhow::Result<u64> {
    let result = sqlx::query(r#"DELETE FROM day_plans WHERE id = $1 AND user_id = $2"#)
        .bind(id)
        .bind(user_id)
        .execute(db)
        .await?;
    Ok(result.rows_affected())
}

/// Clear every plan on a given date.
pub async fn delete_by_date(db: &PgPool, user_id: Uuid, date: Date) -> anyhow::Result<u64> {
    let result = sqlx::query(r#"DELETE FROM day_plans WHERE user_id = $1 AND date = $2"#)
        .bind(user_id)
        .bind(date)
        .execute(db)
        .await?;
    Ok(result.rows_affected())
}

/// Dates in the range that already have at least one plan.
pub async fn planned_dates(
    db: &PgPool,
    user_id: Uuid,
    start: Date,
    end: Date,
) -> anyhow::Result<Vec<Date>> {
    let dates: Vec<Date> = sqlx::query_scalar(
        r#"
        SELECT DISTINCT date
        FROM day_plans
        WHERE user_id = $1 AND date >= $2 AND date <= $3
        "#,
    )
    .bind(user_id)
    .bind(start)
    .bind(end)
    .fetch_all(db)
    .await?;
    Ok(dates)
}
