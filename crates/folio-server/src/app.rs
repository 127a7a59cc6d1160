//! HTTP routes: health and cache administration.
//!
//! Cache failures never turn into error statuses. Invalidation endpoints
//! answer 200 and report a degraded outcome in the body.

use axum::{
    extract::{Path, State},
    response::IntoResponse,
    routing::{delete, get},
    Json, Router,
};
use folio_cache::{CacheDelete, ResponseCache};
use serde::Serialize;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::info;

/// Shared state for handlers.
#[derive(Clone)]
pub struct AppState {
    pub cache: Arc<ResponseCache>,
}

impl AppState {
    pub fn new(cache: Arc<ResponseCache>) -> Self {
        Self { cache }
    }
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub cache_enabled: bool,
}

/// Result of an invalidation request.
#[derive(Debug, Serialize)]
pub struct InvalidationResponse {
    pub deleted: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub degraded: Option<String>,
}

impl From<CacheDelete> for InvalidationResponse {
    fn from(outcome: CacheDelete) -> Self {
        match outcome {
            CacheDelete::Deleted(deleted) => Self {
                deleted,
                degraded: None,
            },
            CacheDelete::Degraded(reason) => Self {
                deleted: 0,
                degraded: Some(reason.to_string()),
            },
        }
    }
}

/// Creates the application router.
pub fn create_router(state: AppState) -> Router {
    let api_router = Router::new()
        .route("/cache", delete(clear_cache))
        .route("/cache/prefix/:prefix", delete(invalidate_prefix));

    let router = Router::new()
        .route("/health", get(health_check))
        .nest("/api/v1", api_router)
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    info!("Router created with health and cache endpoints");
    router
}

async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        cache_enabled: state.cache.is_enabled(),
    })
}

async fn clear_cache(State(state): State<AppState>) -> Json<InvalidationResponse> {
    Json(state.cache.clear().await.into())
}

async fn invalidate_prefix(
    State(state): State<AppState>,
    Path(prefix): Path<String>,
) -> Json<InvalidationResponse> {
    Json(state.cache.delete_by_prefix(&prefix).await.into())
}
