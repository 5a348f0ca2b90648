use serde::Serialize;

use crate::billing::stripe::StripePrice;

#[derive(Debug, Serialize)]
pub struct SubscriptionInfo {
    pub status: Option<String>,
    pub is_active: bool,
}

#[derive(Debug, Serialize)]
pub struct BillingStatusResponse {
    pub subscription: SubscriptionInfo,
    pub recipe_count: i64,
    pub recipe_limit: i64,
    pub can_create_recipe: bool,
}

#[derive(Debug, Serialize)]
pub struct PaymentLinkResponse {
    pub payment_link: String,
}

#[derive(Debug, Serialize)]
pub struct ProductResponse {
    pub id: String,
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<StripePrice>,
}
