use std::time::Duration;

use anyhow::Context;
use axum::async_trait;
use serde::Serialize;
use tracing::warn;

const STRIPE_API_BASE: &str = "https://api.stripe.com/v1";

#[derive(Debug, Clone, Serialize)]
pub struct StripePrice {
    pub amount: Option<i64>,
    pub currency: Option<String>,
    pub interval: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct StripeProduct {
    pub id: String,
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<StripePrice>,
}

/// Thin view of the Stripe API. A trait object so handlers and the webhook can
/// be exercised in tests without network access.
#[async_trait]
pub trait StripeApi: Send + Sync {
    /// Resolve the email of a customer, `None` if the customer is deleted or
    /// has no email on file.
    async fn customer_email(&self, customer_id: &str) -> anyhow::Result<Option<String>>;

    /// Fetch a product with its default price expanded.
    async fn product_with_price(&self, product_id: &str) -> anyhow::Result<StripeProduct>;
}

pub struct StripeClient {
    http: reqwest::Client,
    api_key: String,
}

impl StripeClient {
    pub fn new(api_key: &str) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .context("build stripe http client")?;
        Ok(Self {
            http,
            api_key: api_key.to_string(),
        })
    }

    async fn get_json(&self, url: &str) -> anyhow::Result<serde_json::Value> {
        let response = self
            .http
            .get(url)
            .bearer_auth(&self.api_key)
            .send()
            .await
            .context("stripe request failed")?;
        let status = response.status();
        if !status.is_success() {
            anyhow::bail!("stripe returned {status} for {url}");
        }
        Ok(response.json().await.context("decode stripe response")?)
    }
}

#[async_trait]
impl StripeApi for StripeClient {
    async fn customer_email(&self, customer_id: &str) -> anyhow::Result<Option<String>> {
        let customer = self
            .get_json(&format!("{STRIPE_API_BASE}/customers/{customer_id}"))
            .await?;

        if customer["deleted"].as_bool() == Some(true) {
            warn!(%customer_id, "stripe customer is deleted");
            return Ok(None);
        }
        Ok(customer["email"].as_str().map(str::to_string))
    }

    async fn product_with_price(&self, product_id: &str) -> anyhow::Result<StripeProduct> {
        let product = self
            .get_json(&format!(
                "{STRIPE_API_BASE}/products/{product_id}?expand[]=default_price"
            ))
            .await?;

        let price = product["default_price"].as_object().map(|p| StripePrice {
            amount: p.get("unit_amount").and_then(|v| v.as_i64()),
            currency: p
                .get("currency")
                .and_then(|v| v.as_str())
                .map(str::to_string),
            interval: p
                .get("recurring")
                .and_then(|r| r.get("interval"))
                .and_then(|v| v.as_str())
                .map(str::to_string),
        });

        Ok(StripeProduct {
            id: product["id"].as_str().unwrap_or(product_id).to_string(),
            name: product["name"].as_str().map(str::to_string),
            description: product["description"].as_str().map(str::to_string),
            price,
        })
    }
}
