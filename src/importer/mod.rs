pub mod dto;
pub mod handlers;
pub mod parsers;

use axum::Router;

use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().merge(handlers::import_routes())
}
