//! Router construction for the organization catalog server.

use std::sync::Arc;

use axum::{
    http::{header, HeaderName, Method},
    middleware as axum_mw,
    routing::get,
    Extension, Router,
};
use org_catalog_core::CatalogService;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};

use crate::config::ApiSettings;
use crate::handlers;
use crate::handlers::activity::ActivityNamePolicy;
use crate::middleware::api_key::{api_key_auth, ApiKeyConfig, API_KEY_HEADER};
use crate::middleware::request_log::request_log;

/// Build the full axum router with all routes and middleware.
pub fn build_router(service: Arc<dyn CatalogService>, settings: &ApiSettings) -> Router {
    // Routes that require the API key
    let protected = Router::new()
        .route("/org/name", get(handlers::organizations::by_name))
        .route("/org/building", get(handlers::organizations::by_building))
        .route("/org/location", get(handlers::location::by_location))
        // The segment after /org/ is an organization id or an activity name;
        // matchit needs one parameter name for both.
        .route("/org/:key", get(handlers::organizations::by_id))
        .route("/org/:key/root", get(handlers::activity::by_activity))
        .route("/org/:key/tree", get(handlers::activity::by_activity_tree))
        .layer(axum_mw::from_fn(api_key_auth))
        .layer(Extension(ApiKeyConfig::new(&settings.api_key)))
        .layer(Extension(ActivityNamePolicy {
            strict: settings.strict_activity_names,
        }));

    let protected = if settings.api_prefix.is_empty() {
        protected
    } else {
        Router::new().nest(&settings.api_prefix, protected)
    };

    // Public routes (no auth)
    let public = Router::new().route("/health", get(handlers::health::health));

    // Combine and add shared state
    public
        .merge(protected)
        .layer(Extension(service))
        .layer(axum_mw::from_fn(request_log))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(settings))
}

fn cors_layer(settings: &ApiSettings) -> CorsLayer {
    let origin = if settings.allowed_origins.is_empty() {
        AllowOrigin::any()
    } else {
        AllowOrigin::list(settings.allowed_origins.iter().cloned())
    };
    CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET])
        .allow_headers([header::CONTENT_TYPE, HeaderName::from_static(API_KEY_HEADER)])
}
