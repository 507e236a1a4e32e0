//! GET /health : public liveness probe.

use std::sync::Arc;

use axum::{http::StatusCode, response::IntoResponse, Extension, Json};
use org_catalog_core::CatalogService;
use org_catalog_types::{ErrorResponse, HealthResponse};

pub async fn health(Extension(service): Extension<Arc<dyn CatalogService>>) -> impl IntoResponse {
    match service.health().await {
        Ok(backend) => (
            StatusCode::OK,
            Json(HealthResponse {
                status: "ok".into(),
                backend: backend.into(),
            }),
        )
            .into_response(),
        Err(e) => {
            tracing::warn!(error = %e, "health check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(ErrorResponse::new("Unavailable", e.to_string())),
            )
                .into_response()
        }
    }
}
