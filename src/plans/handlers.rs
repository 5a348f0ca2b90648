use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{delete, get, post},
    Json, Router,
};
use serde_json::json;
use time::{Duration, OffsetDateTime};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::auth::jwt::AuthUser;
use crate::error::ApiError;
use crate::plans::dto::{
    format_date, parse_date, AutoAssignRequest, CreateDayPlanRequest, DayPlanResponse,
    WeekDayResponse, WeekPlanQuery, WeekPlanResponse,
};
use crate::plans::repo;
use crate::recipes::repo as recipes_repo;
use crate::state::AppState;

const AUTO_ASSIGN_WINDOW_DAYS: i64 = 30;

pub fn plan_routes() -> Router<AppState> {
    Router::new()
        .route("/week-plan", get(week_plan))
        .route("/day-plans", post(create_day_plan))
        .route("/day-plans/auto-assign", post(auto_assign))
        .route("/day-plans/:id", delete(delete_day_plan))
        .route("/day-plans/date/:date", delete(clear_day))
}

#[instrument(skip(state))]
pub async fn week_plan(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Query(q): Query<WeekPlanQuery>,
) -> Result<Json<WeekPlanResponse>, ApiError> {
    let start = match q.start.as_deref() {
        Some(s) => parse_date(s)?,
        None => OffsetDateTime::now_utc().date(),
    };
    let end = start + Duration::days(6);

    let plans = repo::plans_with_recipes(&state.db, user_id, start, end).await?;

    let mut week_plan = Vec::with_capacity(7);
    for offset in 0..7 {
        let date = start + Duration::days(offset);
        let day_plans = plans
            .iter()
            .filter(|p| p.plan.date == date)
            .cloned()
            .map(DayPlanResponse::from)
            .collect();
        week_plan.push(WeekDayResponse {
            date: format_date(date),
            plans: day_plans,
        });
    }

    Ok(Json(WeekPlanResponse { week_plan }))
}

#[instrument(skip(state, payload))]
pub async fn create_day_plan(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(payload): Json<CreateDayPlanRequest>,
) -> Result<(StatusCode, Json<DayPlanResponse>), ApiError> {
    let date = parse_date(&payload.date)?;

    // The referenced recipe must belong to the caller; a foreign id is
    // indistinguishable from a missing one.
    if let Some(recipe_id) = payload.recipe_id {
        recipes_repo::find_by_user(&state.db, user_id, recipe_id)
            .await?
            .ok_or(ApiError::NotFound("Recipe"))?;
    }

    let meal_type = payload.meal_type.as_deref().unwrap_or("dinner");
    let plan = repo::create(&state.db, user_id, date, payload.recipe_id, meal_type).await?;
    info!(%user_id, plan_id = %plan.id, date = %format_date(date), "day plan created");

    let recipe = match plan.recipe_id {
        Some(rid) => {
            let recipe = recipes_repo::find_by_user(&state.db, user_id, rid)
                .await?
                .ok_or(ApiError::NotFound("Recipe"))?;
            let ingredients = recipes_repo::ingredients_for_recipe(&state.db, rid).await?;
            Some((recipe, ingredients))
        }
        None => None,
    };

    Ok((
        StatusCode::CREATED,
        Json(DayPlanResponse::from(repo::PlanWithRecipe { plan, recipe })),
    ))
}

#[instrument(skip(state))]
pub async fn delete_day_plan(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let affected = repo::delete_by_id(&state.db, user_id, id).await?;
    if affected == 0 {
        return Err(ApiError::NotFound("Day plan"));
    }
    Ok(Json(json!({ "success": true })))
}

#[instrument(skip(state))]
pub async fn clear_day(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(date): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let date = parse_date(&date)?;
    let affected = repo::delete_by_date(&state.db, user_id, date).await?;
    if affected == 0 {
        return Err(ApiError::NotFound("Day plan"));
    }
    Ok(Json(json!({ "message": "Day plans deleted successfully" })))
}

/// Assign a recipe to the first date without plans within the next 30 days.
#[instrument(skip(state, payload))]
pub async fn auto_assign(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(payload): Json<AutoAssignRequest>,
) -> Result<(StatusCode, Json<DayPlanResponse>), ApiError> {
    let recipe = recipes_repo::find_by_user(&state.db, user_id, payload.recipe_id)
        .await?
        .ok_or(ApiError::NotFound("Recipe"))?;

    let today = OffsetDateTime::now_utc().date();
    let window_end = today + Duration::days(AUTO_ASSIGN_WINDOW_DAYS);

    let planned: std::collections::HashSet<_> =
        repo::planned_dates(&state.db, user_id, today, window_end)
            .await?
            .into_iter()
            .collect();

    let target = (0..AUTO_ASSIGN_WINDOW_DAYS)
        .map(|offset| today + Duration::days(offset))
        .find(|date| !planned.contains(date))
        .ok_or_else(|| {
            ApiError::BadRequest("No free days found in the next 30 days".into())
        })?;

    let plan = repo::create(&state.db, user_id, target, Some(recipe.id), "dinner").await?;
    info!(%user_id, plan_id = %plan.id, date = %format_date(target), "recipe auto-assigned");

    let ingredients = recipes_repo::ingredients_for_recipe(&state.db, recipe.id).await?;

    Ok((
        StatusCode::CREATED,
        Json(DayPlanResponse::from(repo::PlanWithRecipe {
            plan,
            recipe: Some((recipe, ingredients)),
        })),
    ))
}
