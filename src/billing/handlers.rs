use axum::{extract::State, routing::get, Json, Router};
use tracing::instrument;

use crate::auth::jwt::AuthUser;
use crate::billing::dto::{
    BillingStatusResponse, PaymentLinkResponse, ProductResponse, SubscriptionInfo,
};
use crate::billing::quota::{self, FREE_RECIPE_LIMIT};
use crate::billing::repo::Subscription;
use crate::error::ApiError;
use crate::recipes::repo;
use crate::state::AppState;

pub fn billing_routes() -> Router<AppState> {
    Router::new()
        .route("/billing/status", get(billing_status))
        .route("/billing/payment-link", get(payment_link))
        .route("/billing/product", get(product))
}

#[instrument(skip(state))]
pub async fn billing_status(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<BillingStatusResponse>, ApiError> {
    let subscription = Subscription::find_by_user(&state.db, user_id).await?;
    let recipe_count = repo::count_by_user(&state.db, user_id).await?;

    let status = subscription.map(|s| s.status);
    let is_active = quota::is_subscription_active(status.as_deref());

    Ok(Json(BillingStatusResponse {
        can_create_recipe: quota::can_create_recipe(status.as_deref(), recipe_count),
        subscription: SubscriptionInfo { status, is_active },
        recipe_count,
        recipe_limit: FREE_RECIPE_LIMIT,
    }))
}

#[instrument(skip(state))]
pub async fn payment_link(
    State(state): State<AppState>,
    AuthUser(_user_id): AuthUser,
) -> Result<Json<PaymentLinkResponse>, ApiError> {
    let payment_link = state
        .config
        .stripe
        .payment_link
        .clone()
        .ok_or_else(|| ApiError::Internal(anyhow::anyhow!("STRIPE_PAYMENT_LINK not configured")))?;

    Ok(Json(PaymentLinkResponse { payment_link }))
}

#[instrument(skip(state))]
pub async fn product(
    State(state): State<AppState>,
    AuthUser(_user_id): AuthUser,
) -> Result<Json<ProductResponse>, ApiError> {
    let product_id = state
        .config
        .stripe
        .product_id
        .clone()
        .ok_or_else(|| ApiError::Internal(anyhow::anyhow!("STRIPE_PRODUCT_ID not configured")))?;

    let product = state.stripe.product_with_price(&product_id).await?;

    Ok(Json(ProductResponse {
        id: product.id,
        name: product.name,
        description: product.description,
        price: product.price,
    }))
}
