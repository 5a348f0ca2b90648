use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

/// Local subscription status, reconciled from payment-processor events.
/// Absence of a row means the user has never subscribed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubscriptionStatus {
    Active,
    Trial,
    Canceled,
}

impl SubscriptionStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            SubscriptionStatus::Active => "active",
            SubscriptionStatus::Trial => "trial",
            SubscriptionStatus::Canceled => "canceled",
        }
    }
}

/// Subscription record, one per user. Only written by the Stripe webhook.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Subscription {
    pub id: Uuid,
    pub user_id: Uuid,
    pub status: String,
    pub stripe_customer_id: Option<String>,
    pub stripe_subscription_id: Option<String>,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

impl Subscription {
    pub async fn find_by_user(db: &PgPool, user_id: Uuid) -> anyhow::Result<Option<Subscription>> {
        let sub = sqlx::query_as::<_, Subscription>(
            r#"
            SELECT id, user_id, status, stripe_customer_id, stripe_subscription_id,
                   created_at, updated_at
            FROM subscriptions
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(db)
        .await?;
        Ok(sub)
    }

    pub async fn upsert_for_user(
        db: &PgPool,
        user_id: Uuid,
        status: SubscriptionStatus,
        stripe_customer_id: &str,
        stripe_subscription_id: &str,
    ) -> anyhow::Result<Subscription> {
        let sub = sqlx::query_as::<_, Subscription>(
            r#"
            INSERT INTO subscriptions (user_id, status, stripe_customer_id, stripe_subscription_id)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (user_id) DO UPDATE SET
                status = EXCLUDED.status,
                stripe_customer_id = EXCLUDED.stripe_customer_id,
                stripe_subscription_id = EXCLUDED.stripe_subscription_id,
                updated_at = now()
            RETURNING id, user_id, status, stripe_customer_id, stripe_subscription_id,
                      created_at, updated_at
            "#,
        )
        .bind(user_id)
        .bind(status.as_str())
        .bind(stripe_customer_id)
        .bind(stripe_subscription_id)
        .fetch_one(db)
        .await?;
        Ok(sub)
    }

    /// Update the status of the subscription linked to a Stripe subscription id.
    /// Returns the number of affected rows; zero means the id is unknown locally.
    pub async fn set_status_by_stripe_id(
        db: &PgPool,
        stripe_subscription_id: &str,
        status: SubscriptionStatus,
    ) -> anyhow::Result<u64> {
        let result = sqlx::query(
            r#"
            UPDATE subscriptions
            SET status = $2, updated_at = now()
            WHERE stripe_subscription_id = $1
            "#,
        )
        .bind(stripe_subscription_id)
        .bind(status.as_str())
        .execute(db)
        .await?;
        Ok(result.rows_affected())
    }
}
