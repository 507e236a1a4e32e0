//! `X-API-Key` guard for the catalog routes.

use std::sync::Arc;

use axum::{extract::Request, middleware::Next, response::Response, Extension};

use crate::error::AppError;

pub const API_KEY_HEADER: &str = "x-api-key";

/// The expected key, shared by every request.
#[derive(Clone)]
pub struct ApiKeyConfig {
    key: Arc<str>,
}

impl ApiKeyConfig {
    pub fn new(key: &str) -> Self {
        Self { key: key.into() }
    }

    /// Compare without short-circuiting on the first differing byte.
    pub fn matches(&self, presented: &[u8]) -> bool {
        let expected = self.key.as_bytes();
        if expected.len() != presented.len() {
            return false;
        }
        expected
            .iter()
            .zip(presented)
            .fold(0u8, |acc, (a, b)| acc | (a ^ b))
            == 0
    }
}

impl std::fmt::Debug for ApiKeyConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiKeyConfig").field("key", &"***").finish()
    }
}

pub async fn api_key_auth(
    Extension(config): Extension<ApiKeyConfig>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let presented = request
        .headers()
        .get(API_KEY_HEADER)
        .map(|v| v.as_bytes())
        .unwrap_or_default();
    if !config.matches(presented) {
        tracing::warn!(
            method = %request.method(),
            uri = %request.uri(),
            "rejected request with missing or invalid API key"
        );
        return Err(AppError::Authentication);
    }
    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_only_exact_key() {
        let config = ApiKeyConfig::new("s3cret");
        assert!(config.matches(b"s3cret"));
        assert!(!config.matches(b"s3cre"));
        assert!(!config.matches(b"S3cret"));
        assert!(!config.matches(b""));
    }

    #[test]
    fn debug_hides_key() {
        let rendered = format!("{:?}", ApiKeyConfig::new("s3cret"));
        assert!(!rendered.contains("s3cret"));
    }
}
