use thiserror::Error;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("{entity} not found: {key}")]
    NotFound { entity: &'static str, key: String },

    #[error("storage error: {0:#}")]
    Storage(#[from] anyhow::Error),

    #[error("invalid geometry: {0}")]
    InvalidGeometry(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),
}

pub type Result<T> = std::result::Result<T, CatalogError>;

impl CatalogError {
    pub fn not_found(entity: &'static str, key: impl std::fmt::Display) -> Self {
        Self::NotFound {
            entity,
            key: key.to_string(),
        }
    }

    pub fn http_status(&self) -> u16 {
        match self {
            Self::NotFound { .. } => 404,
            Self::Storage(_) => 500,
            Self::InvalidGeometry(_) => 500,
            Self::InvalidInput(_) => 422,
        }
    }

    /// Value of `error_type` in the public error envelope.
    pub fn error_type(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "NotFound",
            Self::Storage(_) => "StorageError",
            Self::InvalidGeometry(_) => "InvalidGeometry",
            Self::InvalidInput(_) => "ValidationError",
        }
    }
}
