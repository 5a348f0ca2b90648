//! Per-domain recipe parsers.
//!
//! New domains are supported by registering another [`RecipeParser`]
//! implementation, not by branching. Parsing is best-effort text extraction:
//! a parser degrades to a partial result (name-only) rather than failing once
//! the page has been fetched.

use std::collections::HashMap;
use std::sync::Arc;

use lazy_static::lazy_static;
use regex::Regex;
use tracing::debug;

use crate::importer::dto::{ImportedIngredient, ImportedRecipe};

pub trait RecipeParser: Send + Sync {
    fn parse(&self, html: &str, url: &str) -> ImportedRecipe;
}

/// Maps a registered domain (hostname without `www.`) to its parser.
pub struct ParserRegistry {
    parsers: HashMap<String, Arc<dyn RecipeParser>>,
}

impl ParserRegistry {
    pub fn new() -> Self {
        Self {
            parsers: HashMap::new(),
        }
    }

    pub fn register(&mut self, domain: &str, parser: Arc<dyn RecipeParser>) {
        self.parsers.insert(domain.to_lowercase(), parser);
    }

    pub fn get(&self, domain: &str) -> Option<&Arc<dyn RecipeParser>> {
        self.parsers.get(&domain.to_lowercase())
    }

    pub fn supported_domains(&self) -> Vec<&str> {
        let mut domains: Vec<&str> = self.parsers.keys().map(String::as_str).collect();
        domains.sort_unstable();
        domains
    }
}

impl Default for ParserRegistry {
    fn default() -> Self {
        let mut registry = Self::new();
        registry.register("chefkoch.de", Arc::new(JsonLdParser));
        registry.register("allrecipes.com", Arc::new(JsonLdParser));
        registry
    }
}

/// Parses JSON-LD structured data (`@type: Recipe`) embedded in the page,
/// falling back to the page title with no ingredients.
pub struct JsonLdParser;

impl RecipeParser for JsonLdParser {
    fn parse(&self, html: &str, url: &str) -> ImportedRecipe {
        lazy_static! {
            static ref JSON_LD_RE: Regex = Regex::new(
                r#"(?is)<script[^>]*type=["']application/ld\+json["'][^>]*>(.*?)</script>"#
            )
            .unwrap();
        }

        for capture in JSON_LD_RE.captures_iter(html) {
            let Some(content) = capture.get(1) else {
                continue;
            };
            let data: serde_json::Value = match serde_json::from_str(content.as_str().trim()) {
                Ok(v) => v,
                Err(e) => {
                    debug!(error = %e, "skipping unparsable JSON-LD block");
                    continue;
                }
            };

            let candidates: Vec<&serde_json::Value> = match data.as_array() {
                Some(items) => items.iter().collect(),
                None => vec![&data],
            };

            for item in candidates {
                if let Some(recipe) = recipe_from_json_ld(item) {
                    return recipe;
                }
            }
        }

        // No usable structured data; degrade to the page title.
        ImportedRecipe {
            name: title_from_html(html),
            description: Some(format!("Recipe imported from {url}")),
            image: None,
            rating: None,
            ingredients: Vec::new(),
        }
    }
}

fn is_recipe_type(value: &serde_json::Value) -> bool {
    match &value["@type"] {
        serde_json::Value::String(t) => t == "Recipe",
        serde_json::Value::Array(types) => types.iter().any(|t| t.as_str() == Some("Recipe")),
        _ => false,
    }
}

fn recipe_from_json_ld(item: &serde_json::Value) -> Option<ImportedRecipe> {
    if !is_recipe_type(item) {
        return None;
    }

    let ingredients = item["recipeIngredient"]
        .as_array()
        .map(|list| {
            list.iter()
                .filter_map(|v| v.as_str())
                .map(parse_ingredient_string)
                .collect()
        })
        .unwrap_or_default();

    let image = match &item["image"] {
        serde_json::Value::String(s) => Some(s.clone()),
        serde_json::Value::Array(images) => images
            .first()
            .and_then(|v| v.as_str())
            .map(str::to_string),
        _ => None,
    };

    let rating = match &item["aggregateRating"]["ratingValue"] {
        serde_json::Value::String(s) => s.replace(',', ".").parse::<f64>().ok(),
        serde_json::Value::Number(n) => n.as_f64(),
        _ => None,
    };

    Some(ImportedRecipe {
        name: item["name"]
            .as_str()
            .unwrap_or("Imported Recipe")
            .to_string(),
        description: item["description"].as_str().map(str::to_string),
        image,
        rating,
        ingredients,
    })
}

fn title_from_html(html: &str) -> String {
    lazy_static! {
        static ref TITLE_RE: Regex = Regex::new(r"(?i)<title[^>]*>([^<]+)").unwrap();
        static ref TITLE_SUFFIX_RE: Regex = Regex::new(r"\s*-\s*.*$").unwrap();
    }
    TITLE_RE
        .captures(html)
        .and_then(|c| c.get(1))
        .map(|m| TITLE_SUFFIX_RE.replace(m.as_str(), "").trim().to_string())
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| "Imported Recipe".to_string())
}

/// Split strings like `"200g flour"` or `"1,5 l Milch"` into amount, unit and
/// name. `.` and `,` both work as decimal separator. Strings without a leading
/// numeral become a single "piece" of the whole string.
pub fn parse_ingredient_string(raw: &str) -> ImportedIngredient {
    lazy_static! {
        static ref INGREDIENT_RE: Regex =
            Regex::new(r"^(\d+(?:[.,]\d+)?)\s*([a-zA-Z]*)\s+(.+)$").unwrap();
    }

    if let Some(captures) = INGREDIENT_RE.captures(raw.trim()) {
        let amount = captures[1].replace(',', ".").parse::<f64>();
        if let Ok(amount) = amount {
            let unit = captures[2].trim();
            return ImportedIngredient {
                name: captures[3].trim().to_string(),
                amount,
                unit: if unit.is_empty() {
                    "piece".to_string()
                } else {
                    unit.to_string()
                },
            };
        }
    }

    ImportedIngredient {
        name: raw.trim().to_string(),
        amount: 1.0,
        unit: "piece".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_amount_unit_and_name() {
        let ing = parse_ingredient_string("200g flour");
        assert_eq!(ing.name, "flour");
        assert_eq!(ing.amount, 200.0);
        assert_eq!(ing.unit, "g");
    }

    #[test]
    fn accepts_comma_as_decimal_separator() {
        let ing = parse_ingredient_string("1,5 l Milch");
        assert_eq!(ing.name, "Milch");
        assert_eq!(ing.amount, 1.5);
        assert_eq!(ing.unit, "l");
    }

    #[test]
    fn bare_count_defaults_to_piece() {
        let ing = parse_ingredient_string("2 Eggs");
        assert_eq!(ing.name, "Eggs");
        assert_eq!(ing.amount, 2.0);
        assert_eq!(ing.unit, "piece");
    }

    #[test]
    fn unmatched_string_becomes_one_piece_of_whole_string() {
        let ing = parse_ingredient_string("Salt to taste");
        assert_eq!(ing.name, "Salt to taste");
        assert_eq!(ing.amount, 1.0);
        assert_eq!(ing.unit, "piece");
    }

    #[test]
    fn extracts_recipe_from_json_ld() {
        let html = r#"
            <html><head>
            <script type="application/ld+json">
            {
              "@type": "Recipe",
              "name": "Pancakes",
              "description": "Fluffy",
              "image": ["https://example.com/p.jpg"],
              "aggregateRating": { "ratingValue": "4.5" },
              "recipeIngredient": ["200g flour", "2 Eggs"]
            }
            </script>
            </head><body></body></html>
        "#;

        let recipe = JsonLdParser.parse(html, "https://chefkoch.de/x");
        assert_eq!(recipe.name, "Pancakes");
        assert_eq!(recipe.description.as_deref(), Some("Fluffy"));
        assert_eq!(recipe.image.as_deref(), Some("https://example.com/p.jpg"));
        assert_eq!(recipe.rating, Some(4.5));
        assert_eq!(recipe.ingredients.len(), 2);
        assert_eq!(recipe.ingredients[0].amount, 200.0);
    }

    #[test]
    fn skips_non_recipe_json_ld_blocks() {
        let html = r#"
            <script type="application/ld+json">{"@type": "Organization", "name": "X"}</script>
            <script type="application/ld+json">
            [{"@type": "Recipe", "name": "Goulash", "recipeIngredient": []}]
            </script>
        "#;
        let recipe = JsonLdParser.parse(html, "https://chefkoch.de/x");
        assert_eq!(recipe.name, "Goulash");
    }

    #[test]
    fn falls_back_to_page_title() {
        let html = "<html><head><title>Spaghetti Bolognese - Chefkoch</title></head></html>";
        let recipe = JsonLdParser.parse(html, "https://chefkoch.de/x");
        assert_eq!(recipe.name, "Spaghetti Bolognese");
        assert!(recipe.ingredients.is_empty());
        assert_eq!(
            recipe.description.as_deref(),
            Some("Recipe imported from https://chefkoch.de/x")
        );
    }

    #[test]
    fn falls_back_to_default_name_without_title() {
        let recipe = JsonLdParser.parse("<html></html>", "https://chefkoch.de/x");
        assert_eq!(recipe.name, "Imported Recipe");
    }

    #[test]
    fn registry_lookup_is_case_insensitive_and_unknown_is_none() {
        let registry = ParserRegistry::default();
        assert!(registry.get("chefkoch.de").is_some());
        assert!(registry.get("Chefkoch.DE").is_some());
        assert!(registry.get("unknown.example").is_none());
        assert!(registry
            .supported_domains()
            .contains(&"allrecipes.com"));
    }
}
