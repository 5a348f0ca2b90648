use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::error::ApiError;
use crate::recipes::repo::{Ingredient, NewIngredient, NewRecipe, Recipe};

#[derive(Debug, Deserialize)]
pub struct IngredientInput {
    pub name: String,
    pub amount: f64,
    pub unit: String,
}

#[derive(Debug, Deserialize)]
pub struct RecipeInput {
    pub name: String,
    pub description: Option<String>,
    pub image: Option<String>,
    pub rating: Option<f64>,
    #[serde(default)]
    pub ingredients: Vec<IngredientInput>,
}

impl RecipeInput {
    /// Validate and normalize into insertable values. Name must be non-empty
    /// after trimming; amounts must be finite and non-negative.
    pub fn validate(self) -> Result<NewRecipe, ApiError> {
        let name = self.name.trim().to_string();
        if name.is_empty() {
            return Err(ApiError::BadRequest("Name is required".into()));
        }

        let mut ingredients = Vec::with_capacity(self.ingredients.len());
        for ing in self.ingredients {
            let ing_name = ing.name.trim().to_string();
            if ing_name.is_empty() {
                return Err(ApiError::BadRequest("Ingredient name is required".into()));
            }
            if !ing.amount.is_finite() || ing.amount < 0.0 {
                return Err(ApiError::BadRequest(format!(
                    "Invalid amount for ingredient '{ing_name}'"
                )));
            }
            ingredients.push(NewIngredient {
                name: ing_name,
                amount: ing.amount,
                unit: ing.unit,
            });
        }

        Ok(NewRecipe {
            name,
            description: self
                .description
                .map(|d| d.trim().to_string())
                .filter(|d| !d.is_empty()),
            image: self.image,
            rating: self.rating,
            ingredients,
        })
    }
}

#[derive(Debug, Serialize)]
pub struct IngredientResponse {
    pub id: Uuid,
    pub name: String,
    pub amount: f64,
    pub unit: String,
}

impl From<Ingredient> for IngredientResponse {
    fn from(i: Ingredient) -> Self {
        Self {
            id: i.id,
            name: i.name,
            amount: i.amount,
            unit: i.unit,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct RecipeResponse {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub image: Option<String>,
    pub rating: Option<f64>,
    pub created_at: OffsetDateTime,
    pub ingredients: Vec<IngredientResponse>,
}

impl RecipeResponse {
    pub fn from_parts(recipe: Recipe, ingredients: Vec<Ingredient>) -> Self {
        Self {
            id: recipe.id,
            name: recipe.name,
            description: recipe.description,
            image: recipe.image,
            rating: recipe.rating,
            created_at: recipe.created_at,
            ingredients: ingredients.into_iter().map(Into::into).collect(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct RecipeListResponse {
    pub recipes: Vec<RecipeResponse>,
    pub total: i64,
    pub limit: i64,
    pub offset: i64,
}

#[derive(Debug, Deserialize)]
pub struct Pagination {
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
}

fn default_limit() -> i64 {
    20
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(name: &str, ingredients: Vec<IngredientInput>) -> RecipeInput {
        RecipeInput {
            name: name.into(),
            description: None,
            image: None,
            rating: None,
            ingredients,
        }
    }

    #[test]
    fn rejects_blank_name() {
        assert!(input("   ", vec![]).validate().is_err());
    }

    #[test]
    fn trims_name_and_description() {
        let mut i = input("  Carbonara  ", vec![]);
        i.description = Some("  creamy  ".into());
        let new = i.validate().expect("valid input");
        assert_eq!(new.name, "Carbonara");
        assert_eq!(new.description.as_deref(), Some("creamy"));
    }

    #[test]
    fn rejects_negative_and_non_finite_amounts() {
        for amount in [-1.0, f64::NAN, f64::INFINITY] {
            let i = input(
                "Soup",
                vec![IngredientInput {
                    name: "Salt".into(),
                    amount,
                    unit: "g".into(),
                }],
            );
            assert!(i.validate().is_err(), "amount {amount} should be rejected");
        }
    }
}
