//! HTTP error mapping.
//!
//! Every failure leaves the server as `{result: false, error_type, error_message}`.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use org_catalog_core::CatalogError;
use org_catalog_types::ErrorResponse;

#[derive(Debug)]
pub enum AppError {
    Catalog(CatalogError),
    Authentication,
}

impl From<CatalogError> for AppError {
    fn from(err: CatalogError) -> Self {
        Self::Catalog(err)
    }
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Catalog(e) => {
                StatusCode::from_u16(e.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
            }
            Self::Authentication => StatusCode::FORBIDDEN,
        }
    }

    pub fn body(&self) -> ErrorResponse {
        match self {
            Self::Catalog(e) => ErrorResponse::new(e.error_type(), e.to_string()),
            Self::Authentication => {
                ErrorResponse::new("AuthenticationError", "Invalid or missing API key.")
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(status = status.as_u16(), error = ?self, "request failed");
        } else {
            tracing::debug!(status = status.as_u16(), error = ?self, "request rejected");
        }
        (status, Json(self.body())).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_maps_to_404() {
        let err = AppError::from(CatalogError::not_found("organization", "id=4"));
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
        let body = err.body();
        assert!(!body.result);
        assert_eq!(body.error_type, "NotFound");
        assert_eq!(body.error_message, "organization not found: id=4");
    }

    #[test]
    fn invalid_input_maps_to_422() {
        let err = AppError::from(CatalogError::InvalidInput("radius".into()));
        assert_eq!(err.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(err.body().error_type, "ValidationError");
    }

    #[test]
    fn invalid_geometry_maps_to_500() {
        let err = AppError::from(CatalogError::InvalidGeometry("bad".into()));
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn authentication_maps_to_403() {
        assert_eq!(AppError::Authentication.status(), StatusCode::FORBIDDEN);
        assert_eq!(AppError::Authentication.body().error_type, "AuthenticationError");
    }
}
