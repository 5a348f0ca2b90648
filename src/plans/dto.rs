use serde::{Deserialize, Serialize};
use time::{format_description::FormatItem, macros::format_description, Date};
use uuid::Uuid;

use crate::error::ApiError;
use crate::plans::repo::PlanWithRecipe;
use crate::recipes::dto::RecipeResponse;

pub const DATE_FORMAT: &[FormatItem<'static>] = format_description!("[year]-[month]-[day]");

/// Parse a `YYYY-MM-DD` calendar date, rejecting anything else up front.
pub fn parse_date(value: &str) -> Result<Date, ApiError> {
    Date::parse(value.trim(), DATE_FORMAT)
        .map_err(|_| ApiError::BadRequest(format!("Invalid date: '{value}'. Expected YYYY-MM-DD")))
}

pub fn format_date(date: Date) -> String {
    date.format(DATE_FORMAT)
        .unwrap_or_else(|_| date.to_string())
}

#[derive(Debug, Deserialize)]
pub struct WeekPlanQuery {
    pub start: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateDayPlanRequest {
    pub date: String,
    pub recipe_id: Option<Uuid>,
    pub meal_type: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AutoAssignRequest {
    pub recipe_id: Uuid,
}

#[derive(Debug, Serialize)]
pub struct DayPlanResponse {
    pub id: Uuid,
    pub date: String,
    pub meal_type: String,
    pub recipe: Option<RecipeResponse>,
}

impl From<PlanWithRecipe> for DayPlanResponse {
    fn from(p: PlanWithRecipe) -> Self {
        Self {
            id: p.plan.id,
            date: format_date(p.plan.date),
            meal_type: p.plan.meal_type,
            recipe: p
                .recipe
                .map(|(recipe, ingredients)| RecipeResponse::from_parts(recipe, ingredients)),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct WeekDayResponse {
    pub date: String,
    pub plans: Vec<DayPlanResponse>,
}

#[derive(Debug, Serialize)]
pub struct WeekPlanResponse {
    pub week_plan: Vec<WeekDayResponse>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_iso_dates() {
        let date = parse_date("2026-08-24").expect("valid date");
        assert_eq!(format_date(date), "2026-08-24");
    }

    #[test]
    fn rejects_malformed_dates() {
        for bad in ["not-a-date", "2026-13-01", "2026-02-30", "24.08.2026", ""] {
            assert!(parse_date(bad).is_err(), "{bad} should be rejected");
        }
    }
}
