use axum::{extract::State, http::HeaderMap, routing::post, Json, Router};
use hmac::{Hmac, Mac};
use serde::Deserialize;
use serde_json::json;
use sha2::Sha256;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{debug, info, instrument, warn};

use crate::auth::repo::User;
use crate::billing::repo::{Subscription, SubscriptionStatus};
use crate::error::ApiError;
use crate::state::AppState;

/// Reject events whose signature timestamp is further than this from now.
const SIGNATURE_TOLERANCE_SECS: i64 = 300;

pub fn routes() -> Router<AppState> {
    Router::new().route("/webhooks/stripe", post(stripe_webhook))
}

#[derive(Debug, thiserror::Error)]
pub enum SignatureError {
    #[error("malformed Stripe-Signature header")]
    Malformed,
    #[error("signature timestamp outside tolerance")]
    Expired,
    #[error("signature mismatch")]
    Mismatch,
}

/// Verify a `Stripe-Signature` header (`t=<unix>,v1=<hex>`) against the raw
/// request body. The signed payload is `"{t}.{body}"`, HMAC-SHA256 with the
/// webhook secret; comparison is constant-time via `Mac::verify_slice`.
pub fn verify_signature(
    secret: &str,
    header: &str,
    body: &str,
    now_unix: i64,
) -> Result<(), SignatureError> {
    let mut timestamp: Option<i64> = None;
    let mut signatures: Vec<Vec<u8>> = Vec::new();

    for part in header.split(',') {
        match part.trim().split_once('=') {
            Some(("t", value)) => {
                timestamp = value.parse::<i64>().ok();
            }
            Some(("v1", value)) => {
                if let Ok(bytes) = hex::decode(value) {
                    signatures.push(bytes);
                }
            }
            _ => {}
        }
    }

    let timestamp = timestamp.ok_or(SignatureError::Malformed)?;
    if signatures.is_empty() {
        return Err(SignatureError::Malformed);
    }
    if (now_unix - timestamp).abs() > SIGNATURE_TOLERANCE_SECS {
        return Err(SignatureError::Expired);
    }

    let signed_payload = format!("{timestamp}.{body}");
    for signature in &signatures {
        let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes())
            .map_err(|_| SignatureError::Malformed)?;
        mac.update(signed_payload.as_bytes());
        if mac.verify_slice(signature).is_ok() {
            return Ok(());
        }
    }
    Err(SignatureError::Mismatch)
}

/// Map a remote Stripe subscription status onto the local status set.
pub fn map_remote_status(remote: &str) -> SubscriptionStatus {
    match remote {
        "active" => SubscriptionStatus::Active,
        "trialing" => SubscriptionStatus::Trial,
        _ => SubscriptionStatus::Canceled,
    }
}

#[derive(Debug, Deserialize)]
struct WebhookEvent {
    #[serde(rename = "type")]
    kind: String,
    data: EventData,
}

#[derive(Debug, Deserialize)]
struct EventData {
    object: serde_json::Value,
}

#[instrument(skip(state, headers, body))]
pub async fn stripe_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: String,
) -> Result<Json<serde_json::Value>, ApiError> {
    let signature = headers
        .get("stripe-signature")
        .and_then(|v| v.to_str().ok())
        .ok_or(ApiError::BadRequest("Missing Stripe-Signature header".into()))?;

    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0);

    if let Err(e) = verify_signature(&state.config.stripe.webhook_secret, signature, &body, now) {
        warn!(error = %e, "webhook signature verification failed");
        return Err(ApiError::BadRequest("Invalid signature".into()));
    }

    let event: WebhookEvent = serde_json::from_str(&body)
        .map_err(|_| ApiError::BadRequest("Invalid event payload".into()))?;

    match event.kind.as_str() {
        "customer.subscription.created" | "customer.subscription.updated" => {
            handle_subscription_event(&state, &event.data.object).await?;
        }
        "customer.subscription.deleted" => {
            if let Some(sub_id) = event.data.object["id"].as_str() {
                let affected = Subscription::set_status_by_stripe_id(
                    &state.db,
                    sub_id,
                    SubscriptionStatus::Canceled,
                )
                .await?;
                if affected == 0 {
                    warn!(stripe_subscription_id = %sub_id, "deleted event for unknown subscription");
                } else {
                    info!(stripe_subscription_id = %sub_id, "subscription canceled");
                }
            }
        }
        "invoice.payment_succeeded" => {
            apply_invoice_status(&state, &event.data.object, SubscriptionStatus::Active).await?;
        }
        "invoice.payment_failed" => {
            apply_invoice_status(&state, &event.data.object, SubscriptionStatus::Canceled).await?;
        }
        other => {
            debug!(event_type = %other, "unhandled event type");
        }
    }

    Ok(Json(json!({ "received": true })))
}

/// Link a subscription event to a local user via the customer email and upsert
/// the subscription row. Unknown customers and users are logged and dropped so
/// Stripe does not retry forever.
async fn handle_subscription_event(
    state: &AppState,
    object: &serde_json::Value,
) -> Result<(), ApiError> {
    let (Some(customer_id), Some(subscription_id)) =
        (object["customer"].as_str(), object["id"].as_str())
    else {
        warn!("subscription event missing customer or id");
        return Ok(());
    };

    let email = match state.stripe.customer_email(customer_id).await {
        Ok(Some(email)) => email,
        Ok(None) => {
            warn!(%customer_id, "customer has no email, dropping event");
            return Ok(());
        }
        Err(e) => {
            warn!(error = %e, %customer_id, "customer lookup failed, dropping event");
            return Ok(());
        }
    };

    let Some(user) = User::find_by_email(&state.db, &email).await? else {
        warn!(%email, "no user for customer email, dropping event");
        return Ok(());
    };

    let remote = object["status"].as_str().unwrap_or_default();
    let status = map_remote_status(remote);

    Subscription::upsert_for_user(&state.db, user.id, status, customer_id, subscription_id)
        .await?;

    info!(user_id = %user.id, status = status.as_str(), "subscription reconciled");
    Ok(())
}

async fn apply_invoice_status(
    state: &AppState,
    object: &serde_json::Value,
    status: SubscriptionStatus,
) -> Result<(), ApiError> {
    let Some(sub_id) = object["subscription"].as_str() else {
        debug!("invoice event without subscription id");
        return Ok(());
    };

    let affected = Subscription::set_status_by_stripe_id(&state.db, sub_id, status).await?;
    if affected == 0 {
        warn!(stripe_subscription_id = %sub_id, "invoice event for unknown subscription");
    } else {
        info!(stripe_subscription_id = %sub_id, status = status.as_str(), "invoice event applied");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sign(secret: &str, timestamp: i64, body: &str) -> String {
        let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes()).expect("hmac key");
        mac.update(format!("{timestamp}.{body}").as_bytes());
        let sig = hex::encode(mac.finalize().into_bytes());
        format!("t={timestamp},v1={sig}")
    }

    #[test]
    fn accepts_valid_signature() {
        let body = r#"{"type":"invoice.payment_succeeded"}"#;
        let header = sign("whsec_test", 1_700_000_000, body);
        assert!(verify_signature("whsec_test", &header, body, 1_700_000_000).is_ok());
    }

    #[test]
    fn rejects_wrong_secret() {
        let body = "{}";
        let header = sign("whsec_other", 1_700_000_000, body);
        assert!(matches!(
            verify_signature("whsec_test", &header, body, 1_700_000_000),
            Err(SignatureError::Mismatch)
        ));
    }

    #[test]
    fn rejects_tampered_body() {
        let header = sign("whsec_test", 1_700_000_000, r#"{"a":1}"#);
        assert!(matches!(
            verify_signature("whsec_test", &header, r#"{"a":2}"#, 1_700_000_000),
            Err(SignatureError::Mismatch)
        ));
    }

    #[test]
    fn rejects_stale_timestamp() {
        let body = "{}";
        let header = sign("whsec_test", 1_700_000_000, body);
        assert!(matches!(
            verify_signature("whsec_test", &header, body, 1_700_000_000 + 301),
            Err(SignatureError::Expired)
        ));
    }

    #[test]
    fn rejects_malformed_header() {
        assert!(matches!(
            verify_signature("whsec_test", "v1=deadbeef", "{}", 0),
            Err(SignatureError::Malformed)
        ));
        assert!(matches!(
            verify_signature("whsec_test", "t=123", "{}", 123),
            Err(SignatureError::Malformed)
        ));
    }

    #[test]
    fn accepts_any_of_multiple_v1_signatures() {
        let body = "{}";
        let timestamp = 1_700_000_000;
        let mut mac = Hmac::<Sha256>::new_from_slice(b"whsec_test").expect("hmac key");
        mac.update(format!("{timestamp}.{body}").as_bytes());
        let good = hex::encode(mac.finalize().into_bytes());
        let header = format!("t={timestamp},v1={},v1={good}", "ab".repeat(32));
        assert!(verify_signature("whsec_test", &header, body, timestamp).is_ok());
    }

    #[test]
    fn remote_status_mapping() {
        assert_eq!(map_remote_status("active"), SubscriptionStatus::Active);
        assert_eq!(map_remote_status("trialing"), SubscriptionStatus::Trial);
        assert_eq!(map_remote_status("past_due"), SubscriptionStatus::Canceled);
        assert_eq!(map_remote_status("unpaid"), SubscriptionStatus::Canceled);
        assert_eq!(map_remote_status(""), SubscriptionStatus::Canceled);
    }
}
