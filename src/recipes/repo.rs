use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Recipe {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub image: Option<String>,
    pub rating: Option<f64>,
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Ingredient {
    pub id: Uuid,
    pub recipe_id: Uuid,
    pub name: String,
    pub amount: f64,
    pub unit: String,
}

/// Validated ingredient values ready for insertion.
#[derive(Debug, Clone)]
pub struct NewIngredient {
    pub name: String,
    pub amount: f64,
    pub unit: String,
}

#[derive(Debug, Clone)]
pub struct NewRecipe {
    pub name: String,
    pub description: Option<String>,
    pub image: Option<String>,
    pub rating: Option<f64>,
    pub ingredients: Vec<NewIngredient>,
}

pub async fn count_by_user(db: &PgPool, user_id: Uuid) -> anyhow::Result<i64> {
    let count: i64 = sqlx::query_scalar(r#"SELECT COUNT(*) FROM recipes WHERE user_id = $1"#)
        .bind(user_id)
        .fetch_one(db)
        .await?;
    Ok(count)
}

pub async fn list_by_user(
    db: &PgPool,
    user_id: Uuid,
    limit: i64,
    offset: i64,
) -> anyhow::Result<Vec<Recipe>> {
    let rows = sqlx::query_as::<_, Recipe>(
        r#"
        SELECT id, user_id, name, description, image, rating, created_at
        FROM recipes
        WHERE user_id = $1
        ORDER BY created_at DESC
        LIMIT $2 OFFSET $3
        "#,
    )
    .bind(user_id)
    .bind(limit)
    .bind(offset)
    .fetch_all(db)
    .await?;
    Ok(rows)
}

pub async fn find_by_user(
    db: &PgPool,
    user_id: Uuid,
    recipe_id: Uuid,
) -> anyhow::Result<Option<Recipe>> {
    let recipe = sqlx::query_as::<_, Recipe>(
        r#"
        SELECT id, user_id, name, description, image, rating, created_at
        FROM recipes
        WHERE id = $1 AND user_id = $2
        "#,
    )
    .bind(recipe_id)
    .bind(user_id)
    .fetch_optional(db)
    .await?;
    Ok(recipe)
}

pub async fn ingredients_for_recipe(
    db: &PgPool,
    recipe_id: Uuid,
) -> anyhow::Result<Vec<Ingredient>> {
    let rows = sqlx::query_as::<_, Ingredient>(
        r#"
        SELECT id, recipe_id, name, amount, unit
        FROM ingredients
        WHERE recipe_id = $1
        "#,
    )
    .bind(recipe_id)
    .fetch_all(db)
    .await?;
    Ok(rows)
}

pub async fn ingredients_for_recipes(
    db: &PgPool,
    recipe_ids: &[Uuid],
) -> anyhow::Result<Vec<Ingredient>> {
    let rows = sqlx::query_as::<_, Ingredient>(
        r#"
        SELECT id, recipe_id, name, amount, unit
        FROM ingredients
        WHERE recipe_id = ANY($1)
        "#,
    )
    .bind(recipe_ids)
    .fetch_all(db)
    .await?;
    Ok(rows)
}

/// Insert a recipe with its ingredients in one transaction.
pub async fn create(
    db: &PgPool,
    user_id: Uuid,
    new: NewRecipe,
) -> anyhow::Result<(Recipe, Vec<Ingredient>)> {
    let mut tx = db.begin().await?;

    let recipe = sqlx::query_as::<_, Recipe>(
        r#"
        INSERT INTO recipes (user_id, name, description, image, rating)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING id, user_id, name, description, image, rating, created_at
        "#,
    )
    .bind(user_id)
    .bind(&new.name)
    .bind(&new.description)
    .bind(&new.image)
    .bind(new.rating)
    .fetch_one(&mut *tx)
    .await?;

    let mut ingredients = Vec::with_capacity(new.ingredients.len());
    for ing in &new.ingredients {
        let row = sqlx::query_as::<_, Ingredient>(
            r#"
            INSERT INTO ingredients (recipe_id, name, amount, unit)
            VALUES ($1, $2, $3, $4)
            RETURNING id, recipe_id, name, amount, unit
            "#,
        )
        .bind(recipe.id)
        .bind(&ing.name)
        .bind(ing.amount)
        .bind(&ing.unit)
        .fetch_one(&mut *tx)
        .await?;
        ingredients.push(row);
    }

    tx.commit().await?;
    Ok((recipe, ingredients))
}

/// Update a recipe and replace all its ingredients in one transaction.
/// Returns `None` when the recipe does not belong to the user.
pub async fn update(
    db: &PgPool,
    user_id: Uuid,
    recipe_id: Uuid,
    new: NewRecipe,
) -> anyhow::Result<Option<(Recipe, Vec<Ingredient>)>> {
    let mut tx = db.begin().await?;

    let recipe = sqlx::query_as::<_, Recipe>(
        r#"
        UPDATE recipes
        SET name = $3, description = $4, image = $5, rating = $6
        WHERE id = $1 AND user_id = $2
        RETURNING id, user_id, name, description, image, rating, created_at
        "#,
    )
    .bind(recipe_id)
    .bind(user_id)
    .bind(&new.name)
    .bind(&new.description)
    .bind(&new.image)
    .bind(new.rating)
    .fetch_optional(&mut *tx)
    .await?;

    let Some(recipe) = recipe else {
        tx.rollback().await?;
        return Ok(None);
    };

    sqlx::query(r#"DELETE FROM ingredients WHERE recipe_id = $1"#)
        .bind(recipe_id)
        .execute(&mut *tx)
        .await?;

    let mut ingredients = Vec::with_capacity(new.ingredients.len());
    for ing in &new.ingredients {
        let row = sqlx::query_as::<_, Ingredient>(
            r#"
            INSERT INTO ingredients (recipe_id, name, amount, unit)
            VALUES ($1, $2, $3, $4)
            RETURNING id, recipe_id, name, amount, unit
            "#,
        )
        .bind(recipe_id)
        .bind(&ing.name)
        .bind(ing.amount)
        .bind(&ing.unit)
        .fetch_one(&mut *tx)
        .await?;
        ingredients.push(row);
    }

    tx.commit().await?;
    Ok(Some((recipe, ingredients)))
}

/// Delete a recipe owned by the user; ingredients go with it via the
/// ON DELETE CASCADE foreign key. Returns affected rows.
pub async fn delete(db: &PgPool, user_id: Uuid, recipe_id: Uuid) -> anyhow::Result<u64> {
    let result = sqlx::query(r#"DELETE FROM recipes WHERE id = $1 AND user_id = $2"#)
        .bind(recipe_id)
        .bind(user_id)
        .execute(db)
        .await?;
    Ok(result.rows_affected())
}
