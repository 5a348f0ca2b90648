use sqlx::PgPool;
use uuid::Uuid;

use crate::billing::repo::Subscription;
use crate::recipes::repo;

/// Recipes a user may store without an active subscription.
pub const FREE_RECIPE_LIMIT: i64 = 10;

/// Whether a subscription status lifts the free-tier limit.
pub fn is_subscription_active(status: Option<&str>) -> bool {
    matches!(status, Some("active") | Some("trial"))
}

/// Read-only decision: may this user create one more recipe?
///
/// Active and trial subscribers are unlimited; everyone else is capped at
/// [`FREE_RECIPE_LIMIT`]. The count is read outside of any serializable
/// transaction, so two concurrent creates can both pass and overshoot by one.
pub fn can_create_recipe(status: Option<&str>, recipe_count: i64) -> bool {
    if is_subscription_active(status) {
        return true;
    }
    recipe_count < FREE_RECIPE_LIMIT
}

/// Load the user's subscription and recipe count and apply the gate.
pub async fn check(db: &PgPool, user_id: Uuid) -> anyhow::Result<bool> {
    let subscription = Subscription::find_by_user(db, user_id).await?;
    let count = repo::count_by_user(db, user_id).await?;
    Ok(can_create_recipe(
        subscription.as_ref().map(|s| s.status.as_str()),
        count,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn active_and_trial_are_unlimited() {
        for status in ["active", "trial"] {
            assert!(can_create_recipe(Some(status), 0));
            assert!(can_create_recipe(Some(status), FREE_RECIPE_LIMIT));
            assert!(can_create_recipe(Some(status), 1_000));
        }
    }

    #[test]
    fn free_tier_is_capped_at_limit() {
        assert!(can_create_recipe(None, 0));
        assert!(can_create_recipe(None, FREE_RECIPE_LIMIT - 1));
        assert!(!can_create_recipe(None, FREE_RECIPE_LIMIT));
        assert!(!can_create_recipe(None, FREE_RECIPE_LIMIT + 5));
    }

    #[test]
    fn canceled_does_not_grant_unlimited_creation() {
        assert!(can_create_recipe(Some("canceled"), 9));
        assert!(!can_create_recipe(Some("canceled"), 10));
    }

    #[test]
    fn unknown_status_is_treated_as_inactive() {
        assert!(!can_create_recipe(Some("past_due"), FREE_RECIPE_LIMIT));
    }
}
