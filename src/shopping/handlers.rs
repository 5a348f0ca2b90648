use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get, patch, post},
    Json, Router,
};
use serde_json::json;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::auth::jwt::AuthUser;
use crate::error::ApiError;
use crate::plans::dto::parse_date;
use crate::plans::repo as plans_repo;
use crate::shopping::aggregate::aggregate_plans;
use crate::shopping::dto::{
    CheckItemRequest, GenerateShoppingListRequest, ShoppingListItemResponse, ShoppingListResponse,
    ShoppingListSummary,
};
use crate::shopping::repo;
use crate::state::AppState;

pub fn shopping_routes() -> Router<AppState> {
    Router::new()
        .route("/shopping-lists", post(generate_shopping_list))
        .route("/shopping-lists", get(list_shopping_lists))
        .route("/shopping-lists/:id", get(get_shopping_list))
        .route("/shopping-lists/:id", delete(delete_shopping_list))
        .route("/shopping-list-items/:id", patch(check_item))
}

/// Aggregate all planned ingredients over the date range and persist the
/// result as a new shopping list.
#[instrument(skip(state, payload))]
pub async fn generate_shopping_list(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(payload): Json<GenerateShoppingListRequest>,
) -> Result<(StatusCode, Json<ShoppingListResponse>), ApiError> {
    // Malformed dates are rejected before any day plan is loaded.
    let start = parse_date(&payload.start_date)?;
    let end = parse_date(&payload.end_date)?;
    if end < start {
        return Err(ApiError::BadRequest(
            "end_date must not be before start_date".into(),
        ));
    }

    let plans = plans_repo::plans_with_recipes(&state.db, user_id, start, end).await?;
    if plans.is_empty() {
        return Err(ApiError::BadRequest(
            "No day plans found in the selected date range".into(),
        ));
    }

    let aggregated = aggregate_plans(&plans);

    let (list, items) = repo::create_with_items(&state.db, user_id, start, end, &aggregated).await?;
    info!(%user_id, list_id = %list.id, items = items.len(), "shopping list generated");

    Ok((
        StatusCode::CREATED,
        Json(ShoppingListResponse::from_parts(list, items)),
    ))
}

#[instrument(skip(state))]
pub async fn list_shopping_lists(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<Vec<ShoppingListSummary>>, ApiError> {
    let lists = repo::list_by_user(&state.db, user_id).await?;
    Ok(Json(lists.into_iter().map(Into::into).collect()))
}

#[instrument(skip(state))]
pub async fn get_shopping_list(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<ShoppingListResponse>, ApiError> {
    let (list, items) = repo::find_with_items(&state.db, user_id, id)
        .await?
        .ok_or(ApiError::NotFound("Shopping list"))?;
    Ok(Json(ShoppingListResponse::from_parts(list, items)))
}

#[instrument(skip(state))]
pub async fn delete_shopping_list(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let affected = repo::delete(&state.db, user_id, id).await?;
    if affected == 0 {
        return Err(ApiError::NotFound("Shopping list"));
    }
    info!(%user_id, list_id = %id, "shopping list deleted");
    Ok(Json(json!({ "success": true })))
}

#[instrument(skip(state))]
pub async fn check_item(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<CheckItemRequest>,
) -> Result<Json<ShoppingListItemResponse>, ApiError> {
    let item = repo::set_item_checked(&state.db, user_id, id, payload.checked)
        .await?
        .ok_or(ApiError::NotFound("Shopping list item"))?;
    Ok(Json(item.into()))
}
