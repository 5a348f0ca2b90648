//! Ingredient aggregation for shopping-list generation.
//!
//! Ingredients are merged by a normalization key of lowercased, trimmed name
//! and unit, so "Flour"/" flour " in "g" collapse into one entry while the
//! first-seen casing is kept for display. Amounts are summed as IEEE-754 f64;
//! they are validated finite and non-negative when recipes are written, so
//! totals are order-independent up to floating-point rounding.

use std::collections::HashMap;

use crate::plans::repo::PlanWithRecipe;

#[derive(Debug, Clone, PartialEq)]
pub struct AggregatedIngredient {
    pub name: String,
    pub amount: f64,
    pub unit: String,
}

fn normalization_key(name: &str, unit: &str) -> String {
    format!(
        "{}::{}",
        name.trim().to_lowercase(),
        unit.trim().to_lowercase()
    )
}

/// Collapse the ingredients of every planned recipe into a deduplicated,
/// summed list, sorted case-insensitively by display name. Plans without a
/// recipe contribute nothing; empty input yields an empty list.
pub fn aggregate_plans(plans: &[PlanWithRecipe]) -> Vec<AggregatedIngredient> {
    let mut map: HashMap<String, AggregatedIngredient> = HashMap::new();

    for plan in plans {
        let Some((_, ingredients)) = &plan.recipe else {
            continue;
        };
        for ingredient in ingredients {
            let key = normalization_key(&ingredient.name, &ingredient.unit);
            match map.get_mut(&key) {
                Some(existing) => existing.amount += ingredient.amount,
                None => {
                    map.insert(
                        key,
                        AggregatedIngredient {
                            name: ingredient.name.clone(),
                            amount: ingredient.amount,
                            unit: ingredient.unit.clone(),
                        },
                    );
                }
            }
        }
    }

    let mut items: Vec<AggregatedIngredient> = map.into_values().collect();
    items.sort_by(|a, b| a.name.to_lowercase().cmp(&b.name.to_lowercase()));
    items
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plans::repo::DayPlan;
    use crate::recipes::repo::{Ingredient, Recipe};
    use time::macros::date;
    use time::OffsetDateTime;
    use uuid::Uuid;

    fn recipe_with(ingredients: &[(&str, f64, &str)]) -> (Recipe, Vec<Ingredient>) {
        let recipe_id = Uuid::new_v4();
        let recipe = Recipe {
            id: recipe_id,
            user_id: Uuid::new_v4(),
            name: "Test".into(),
            description: None,
            image: None,
            rating: None,
            created_at: OffsetDateTime::now_utc(),
        };
        let ingredients = ingredients
            .iter()
            .map(|(name, amount, unit)| Ingredient {
                id: Uuid::new_v4(),
                recipe_id,
                name: (*name).into(),
                amount: *amount,
                unit: (*unit).into(),
            })
            .collect();
        (recipe, ingredients)
    }

    fn plan(recipe: Option<(Recipe, Vec<Ingredient>)>) -> PlanWithRecipe {
        PlanWithRecipe {
            plan: DayPlan {
                id: Uuid::new_v4(),
                user_id: Uuid::new_v4(),
                date: date!(2026 - 08 - 24),
                recipe_id: recipe.as_ref().map(|(r, _)| r.id),
                meal_type: "dinner".into(),
                created_at: OffsetDateTime::now_utc(),
            },
            recipe,
        }
    }

    #[test]
    fn empty_input_yields_empty_list() {
        assert!(aggregate_plans(&[]).is_empty());
    }

    #[test]
    fn plan_without_recipe_contributes_nothing() {
        let plans = vec![plan(None), plan(None)];
        assert!(aggregate_plans(&plans).is_empty());
    }

    #[test]
    fn sums_matching_name_and_unit() {
        let plans = vec![
            plan(Some(recipe_with(&[("Flour", 200.0, "g")]))),
            plan(Some(recipe_with(&[("Flour", 300.0, "g")]))),
        ];
        let items = aggregate_plans(&plans);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].name, "Flour");
        assert_eq!(items[0].amount, 500.0);
        assert_eq!(items[0].unit, "g");
    }

    #[test]
    fn matching_is_case_and_whitespace_insensitive() {
        let plans = vec![
            plan(Some(recipe_with(&[("Flour", 200.0, "g")]))),
            plan(Some(recipe_with(&[(" flour ", 100.0, "G")]))),
            plan(Some(recipe_with(&[("FLOUR", 50.0, " g ")]))),
        ];
        let items = aggregate_plans(&plans);
        assert_eq!(items.len(), 1);
        // first-encountered casing wins for display
        assert_eq!(items[0].name, "Flour");
        assert_eq!(items[0].unit, "g");
        assert_eq!(items[0].amount, 350.0);
    }

    #[test]
    fn same_name_different_unit_stays_separate() {
        let plans = vec![
            plan(Some(recipe_with(&[("Milk", 200.0, "ml")]))),
            plan(Some(recipe_with(&[("Milk", 1.0, "l")]))),
        ];
        let items = aggregate_plans(&plans);
        assert_eq!(items.len(), 2);
    }

    #[test]
    fn totals_are_order_independent() {
        let a = plan(Some(recipe_with(&[("Egg", 2.0, "piece"), ("Flour", 200.0, "g")])));
        let b = plan(Some(recipe_with(&[("Flour", 150.0, "g")])));
        let c = plan(Some(recipe_with(&[("Sugar", 50.0, "g"), ("Egg", 1.0, "piece")])));

        let forward = aggregate_plans(&[a.clone(), b.clone(), c.clone()]);
        let backward = aggregate_plans(&[c, b, a]);
        assert_eq!(forward, backward);
    }

    #[test]
    fn output_is_sorted_case_insensitively_by_name() {
        let plans = vec![plan(Some(recipe_with(&[
            ("zucchini", 1.0, "piece"),
            ("Apple", 2.0, "piece"),
            ("banana", 3.0, "piece"),
        ])))];
        let names: Vec<_> = aggregate_plans(&plans)
            .into_iter()
            .map(|i| i.name)
            .collect();
        assert_eq!(names, vec!["Apple", "banana", "zucchini"]);
    }

    #[test]
    fn weekly_example_from_three_repeated_recipes() {
        // Mon-Sun week where the same recipe appears on three days.
        let mut plans: Vec<PlanWithRecipe> = (0..3)
            .map(|_| {
                plan(Some(recipe_with(&[
                    ("Flour", 200.0, "g"),
                    ("Egg", 2.0, "piece"),
                ])))
            })
            .collect();
        plans.extend((0..4).map(|_| plan(None)));

        let items = aggregate_plans(&plans);
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].name, "Egg");
        assert_eq!(items[0].amount, 6.0);
        assert_eq!(items[1].name, "Flour");
        assert_eq!(items[1].amount, 600.0);
    }
}
