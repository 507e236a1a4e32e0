//! Server configuration from environment variables.
//!
//!   CATALOG_API_KEY : value required in `X-API-Key` (required)
//!   CATALOG_BIND_ADDR : listen address (default: 0.0.0.0:8080)
//!   CATALOG_API_PREFIX : prefix for `/org` routes (default: /v1)
//!   CATALOG_ALLOWED_ORIGINS : comma-separated CORS origins (default: any)
//!   CATALOG_STRICT_ACTIVITY_NAMES : reject unknown activity names (default: true)
//!   CATALOG_BACKEND : `postgres` (default) or `memory`
//!   CATALOG_SEED_FILE : JSON seed for the memory backend
//!   DATABASE_* : see `org_catalog_postgres::DatabaseConfig`

use std::path::PathBuf;

use anyhow::{bail, Context};
use axum::http::HeaderValue;
use org_catalog_postgres::DatabaseConfig;

/// Settings the router needs.
#[derive(Debug, Clone)]
pub struct ApiSettings {
    pub api_key: String,
    pub api_prefix: String,
    /// Empty means any origin.
    pub allowed_origins: Vec<HeaderValue>,
    pub strict_activity_names: bool,
}

impl ApiSettings {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            api_prefix: "/v1".to_string(),
            allowed_origins: Vec::new(),
            strict_activity_names: true,
        }
    }
}

#[derive(Debug, Clone)]
pub enum StorageBackend {
    Postgres(DatabaseConfig),
    Memory { seed_file: Option<PathBuf> },
}

impl StorageBackend {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Postgres(_) => "postgres",
            Self::Memory { .. } => "memory",
        }
    }
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind_addr: String,
    pub api: ApiSettings,
    pub backend: StorageBackend,
}

impl ServerConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let api_key = lookup("CATALOG_API_KEY")
            .filter(|k| !k.trim().is_empty())
            .context("CATALOG_API_KEY must be set")?;

        let api_prefix = normalize_prefix(
            &lookup("CATALOG_API_PREFIX").unwrap_or_else(|| "/v1".to_string()),
        );

        let allowed_origins = lookup("CATALOG_ALLOWED_ORIGINS")
            .map(|raw| parse_origins(&raw))
            .transpose()?
            .unwrap_or_default();

        let strict_activity_names = match lookup("CATALOG_STRICT_ACTIVITY_NAMES") {
            None => true,
            Some(v) => match v.to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" => true,
                "0" | "false" | "no" => false,
                other => bail!("CATALOG_STRICT_ACTIVITY_NAMES must be true or false, got '{other}'"),
            },
        };

        let backend = match lookup("CATALOG_BACKEND").as_deref().unwrap_or("postgres") {
            "postgres" => StorageBackend::Postgres(DatabaseConfig::from_lookup(&lookup)?),
            "memory" => StorageBackend::Memory {
                seed_file: lookup("CATALOG_SEED_FILE").map(PathBuf::from),
            },
            other => bail!("CATALOG_BACKEND must be 'postgres' or 'memory', got '{other}'"),
        };

        Ok(Self {
            bind_addr: lookup("CATALOG_BIND_ADDR").unwrap_or_else(|| "0.0.0.0:8080".to_string()),
            api: ApiSettings {
                api_key,
                api_prefix,
                allowed_origins,
                strict_activity_names,
            },
            backend,
        })
    }
}

/// `v1/` → `/v1`; empty or `/` → `` (routes at the root).
fn normalize_prefix(raw: &str) -> String {
    let trimmed = raw.trim().trim_matches('/');
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("/{trimmed}")
    }
}

fn parse_origins(raw: &str) -> anyhow::Result<Vec<HeaderValue>> {
    raw.split(',')
        .map(str::trim)
        .filter(|o| !o.is_empty() && *o != "*")
        .map(|o| HeaderValue::from_str(o).with_context(|| format!("invalid CORS origin '{o}'")))
        .collect()
}
