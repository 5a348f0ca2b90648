use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{delete, get, post, put},
    Json, Router,
};
use serde_json::json;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::auth::jwt::AuthUser;
use crate::billing::quota;
use crate::error::ApiError;
use crate::recipes::dto::{Pagination, RecipeInput, RecipeListResponse, RecipeResponse};
use crate::recipes::repo;
use crate::state::AppState;

pub fn read_routes() -> Router<AppState> {
    Router::new()
        .route("/recipes", get(list_recipes))
        .route("/recipes/:id", get(get_recipe))
}

pub fn write_routes() -> Router<AppState> {
    Router::new()
        .route("/recipes", post(create_recipe))
        .route("/recipes/:id", put(update_recipe))
        .route("/recipes/:id", delete(delete_recipe))
}

#[instrument(skip(state))]
pub async fn list_recipes(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Query(p): Query<Pagination>,
) -> Result<Json<RecipeListResponse>, ApiError> {
    let recipes = repo::list_by_user(&state.db, user_id, p.limit, p.offset).await?;
    let total = repo::count_by_user(&state.db, user_id).await?;

    let ids: Vec<Uuid> = recipes.iter().map(|r| r.id).collect();
    let mut by_recipe: std::collections::HashMap<Uuid, Vec<_>> = std::collections::HashMap::new();
    for ingredient in repo::ingredients_for_recipes(&state.db, &ids).await? {
        by_recipe
            .entry(ingredient.recipe_id)
            .or_default()
            .push(ingredient);
    }

    let items = recipes
        .into_iter()
        .map(|recipe| {
            let own = by_recipe.remove(&recipe.id).unwrap_or_default();
            RecipeResponse::from_parts(recipe, own)
        })
        .collect();

    Ok(Json(RecipeListResponse {
        recipes: items,
        total,
        limit: p.limit,
        offset: p.offset,
    }))
}

#[instrument(skip(state))]
pub async fn get_recipe(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<RecipeResponse>, ApiError> {
    let recipe = repo::find_by_user(&state.db, user_id, id)
        .await?
        .ok_or(ApiError::NotFound("Recipe"))?;
    let ingredients = repo::ingredients_for_recipe(&state.db, recipe.id).await?;

    Ok(Json(RecipeResponse::from_parts(recipe, ingredients)))
}

#[instrument(skip(state, payload))]
pub async fn create_recipe(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(payload): Json<RecipeInput>,
) -> Result<(StatusCode, Json<RecipeResponse>), ApiError> {
    let new = payload.validate()?;

    // Best-effort gate: count reflects prior successful creates, not a
    // serializable read. See billing::quota.
    if !quota::check(&state.db, user_id).await? {
        warn!(%user_id, "recipe limit reached");
        return Err(ApiError::RecipeLimitReached);
    }

    let (recipe, ingredients) = repo::create(&state.db, user_id, new).await?;
    info!(%user_id, recipe_id = %recipe.id, "recipe created");

    Ok((
        StatusCode::CREATED,
        Json(RecipeResponse::from_parts(recipe, ingredients)),
    ))
}

#[instrument(skip(state, payload))]
pub async fn update_recipe(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<RecipeInput>,
) -> Result<Json<RecipeResponse>, ApiError> {
    let new = payload.validate()?;

    let (recipe, ingredients) = repo::update(&state.db, user_id, id, new)
        .await?
        .ok_or(ApiError::NotFound("Recipe"))?;

    info!(%user_id, recipe_id = %recipe.id, "recipe updated");
    Ok(Json(RecipeResponse::from_parts(recipe, ingredients)))
}

#[instrument(skip(state))]
pub async fn delete_recipe(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let affected = repo::delete(&state.db, user_id, id).await?;
    if affected == 0 {
        return Err(ApiError::NotFound("Recipe"));
    }

    info!(%user_id, recipe_id = %id, "recipe deleted");
    Ok(Json(json!({ "message": "Recipe deleted successfully" })))
}
