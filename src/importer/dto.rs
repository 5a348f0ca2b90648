use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct ImportRequest {
    pub url: String,
}

/// Ingredient extracted from a recipe page. Best-effort values, returned for
/// user review and never written to storage directly.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImportedIngredient {
    pub name: String,
    pub amount: f64,
    pub unit: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ImportedRecipe {
    pub name: String,
    pub description: Option<String>,
    pub image: Option<String>,
    pub rating: Option<f64>,
    pub ingredients: Vec<ImportedIngredient>,
}

#[derive(Debug, Serialize)]
pub struct ImportResponse {
    pub success: bool,
    pub recipe: ImportedRecipe,
}
