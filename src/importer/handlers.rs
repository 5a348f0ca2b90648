use axum::{extract::State, routing::post, Json, Router};
use tracing::{info, instrument, warn};

use crate::auth::jwt::AuthUser;
use crate::error::ApiError;
use crate::importer::dto::{ImportRequest, ImportResponse};
use crate::state::AppState;

pub fn import_routes() -> Router<AppState> {
    Router::new().route("/recipes/import", post(import_recipe))
}

/// Fetch a recipe page and extract structured data for user review.
/// Nothing is written to storage; the client submits the reviewed result
/// through the normal recipe-creation endpoint.
#[instrument(skip(state, payload))]
pub async fn import_recipe(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(payload): Json<ImportRequest>,
) -> Result<Json<ImportResponse>, ApiError> {
    let url = payload.url.trim();
    if url.is_empty() {
        return Err(ApiError::BadRequest("URL is required".into()));
    }

    let parsed = url::Url::parse(url).map_err(|_| ApiError::BadRequest("Invalid URL".into()))?;
    let domain = parsed
        .host_str()
        .map(|h| h.trim_start_matches("www.").to_string())
        .ok_or(ApiError::BadRequest("Invalid URL".into()))?;

    let Some(parser) = state.parsers.get(&domain) else {
        let supported = state.parsers.supported_domains().join(", ");
        return Err(ApiError::BadRequest(format!(
            "Unsupported domain. Currently supported: {supported}"
        )));
    };

    let html = match fetch_page(&state.http, url).await {
        Ok(html) => html,
        Err(e) => {
            warn!(error = %e, %url, "recipe page fetch failed");
            return Err(ApiError::BadRequest(
                "Failed to fetch recipe from URL".into(),
            ));
        }
    };

    let recipe = parser.parse(&html, url);
    info!(%user_id, %domain, recipe = %recipe.name, "recipe imported");

    Ok(Json(ImportResponse {
        success: true,
        recipe,
    }))
}

async fn fetch_page(http: &reqwest::Client, url: &str) -> anyhow::Result<String> {
    let response = http.get(url).send().await?;
    let status = response.status();
    if !status.is_success() {
        anyhow::bail!("HTTP {status}");
    }
    Ok(response.text().await?)
}
