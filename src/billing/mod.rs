mod dto;
pub mod handlers;
pub mod quota;
pub mod repo;
pub mod stripe;
pub mod webhook;

use axum::Router;

use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .merge(handlers::billing_routes())
        .merge(webhook::routes())
}
