//! HTTP routes for the search endpoint.
//!
//! Routes:
//! - `GET /search?query=<text>` → price-sorted product array
//! - `GET /health` → `ok`
//! - everything else → static assets, when a static directory is configured

use std::path::Path;
use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{self, State, rejection::QueryRejection},
    routing::get,
};
use serde::Deserialize;
use shelfscan_client::PriceSearch;
use shelfscan_core::{ProductRecord, Query};
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};

use crate::error::ApiError;

/// Shared state handed to every request.
#[derive(Clone)]
pub struct AppState {
    search: Arc<PriceSearch>,
}

impl AppState {
    pub fn new(search: PriceSearch) -> Self {
        Self { search: Arc::new(search) }
    }
}

/// Build the application router.
pub fn router(state: AppState, static_dir: Option<&Path>) -> Router {
    let mut router = Router::new()
        .route("/search", get(search))
        .route("/health", get(|| async { "ok" }))
        .with_state(state);

    if let Some(dir) = static_dir {
        router = router.fallback_service(ServeDir::new(dir));
    }

    router
        .layer(CorsLayer::very_permissive())
        .layer(TraceLayer::new_for_http())
}

#[derive(Debug, Deserialize)]
struct SearchParams {
    query: Option<String>,
}

async fn search(
    State(state): State<AppState>, params: Result<extract::Query<SearchParams>, QueryRejection>,
) -> Result<Json<Vec<ProductRecord>>, ApiError> {
    let extract::Query(params) = params.map_err(|rejection| ApiError::InvalidQuery(rejection.body_text()))?;
    let query = Query::new(params.query.as_deref().unwrap_or_default())?;

    // Run on its own task so a panic inside the pipeline becomes a 500
    // instead of tearing down the connection.
    let search = state.search.clone();
    let report = tokio::spawn(async move { search.search(&query).await })
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?;

    Ok(Json(report.products))
}
