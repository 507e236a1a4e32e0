//! Database configuration and connection pool management.

use std::time::Duration;

use anyhow::Context;
use sqlx::{postgres::PgPoolOptions, PgPool};
use tracing::{info, warn};

/// Database configuration
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub database_url: String,
    pub max_connections: u32,
    pub acquire_timeout: Duration,
    pub idle_timeout: Option<Duration>,
    pub max_lifetime: Option<Duration>,
    pub run_migrations: bool,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            database_url: "postgresql://localhost:5432/org_catalog".to_string(),
            max_connections: 10,
            acquire_timeout: Duration::from_secs(30),
            idle_timeout: Some(Duration::from_secs(600)), // 10 minutes
            max_lifetime: Some(Duration::from_secs(1800)), // 30 minutes
            run_migrations: false,
        }
    }
}

impl DatabaseConfig {
    /// Read `DATABASE_*` variables; anything unset keeps its default.
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let defaults = Self::default();
        let secs = |key: &str| -> anyhow::Result<Option<Duration>> {
            lookup(key)
                .map(|v| {
                    v.parse::<u64>()
                        .map(Duration::from_secs)
                        .with_context(|| format!("{key} must be a whole number of seconds, got '{v}'"))
                })
                .transpose()
        };

        let max_connections = match lookup("DATABASE_POOL_SIZE") {
            Some(v) => v
                .parse::<u32>()
                .ok()
                .filter(|n| *n > 0)
                .with_context(|| format!("DATABASE_POOL_SIZE must be a positive integer, got '{v}'"))?,
            None => defaults.max_connections,
        };
        let run_migrations = match lookup("DATABASE_RUN_MIGRATIONS") {
            Some(v) => matches!(v.to_ascii_lowercase().as_str(), "1" | "true" | "yes"),
            None => defaults.run_migrations,
        };

        Ok(Self {
            database_url: lookup("DATABASE_URL").unwrap_or(defaults.database_url),
            max_connections,
            acquire_timeout: secs("DATABASE_ACQUIRE_TIMEOUT_SECS")?
                .unwrap_or(defaults.acquire_timeout),
            idle_timeout: secs("DATABASE_IDLE_TIMEOUT_SECS")?.or(defaults.idle_timeout),
            max_lifetime: secs("DATABASE_MAX_LIFETIME_SECS")?.or(defaults.max_lifetime),
            run_migrations,
        })
    }
}

/// Create the connection pool, running migrations first when configured.
pub async fn connect(config: &DatabaseConfig) -> Result<PgPool, sqlx::Error> {
    info!(
        "Connecting to database: {}",
        mask_database_url(&config.database_url)
    );

    let mut pool_options = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .acquire_timeout(config.acquire_timeout);

    if let Some(idle_timeout) = config.idle_timeout {
        pool_options = pool_options.idle_timeout(idle_timeout);
    }

    if let Some(max_lifetime) = config.max_lifetime {
        pool_options = pool_options.max_lifetime(max_lifetime);
    }

    let pool = pool_options
        .connect(&config.database_url)
        .await
        .map_err(|e| {
            warn!("Failed to connect to database: {}", e);
            e
        })?;

    info!(
        max_connections = config.max_connections,
        "Database connection pool created"
    );

    if config.run_migrations {
        run_migrations(&pool).await?;
    }

    Ok(pool)
}

/// Apply the bundled schema migrations.
pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    info!("Running database migrations");
    sqlx::migrate!("./migrations").run(pool).await?;
    info!("Database migrations applied");
    Ok(())
}

/// Mask sensitive information in database URL for logging
pub fn mask_database_url(url: &str) -> String {
    if let Ok(parsed) = url::Url::parse(url) {
        let mut masked = parsed.clone();
        if parsed.password().is_some() {
            let _ = masked.set_password(Some("***"));
        }
        masked.to_string()
    } else if url.chars().count() > 20 {
        // Unparsable URLs can hold any text; cut on char boundaries.
        let len = url.chars().count();
        let head: String = url.chars().take(10).collect();
        let tail: String = url.chars().skip(len - 10).collect();
        format!("{head}***{tail}")
    } else {
        "***".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_when_unset() {
        let config = DatabaseConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.max_connections, 10);
        assert_eq!(config.acquire_timeout, Duration::from_secs(30));
        assert!(!config.run_migrations);
    }

    #[test]
    fn reads_pool_settings() {
        let config = DatabaseConfig::from_lookup(lookup(&[
            ("DATABASE_URL", "postgresql://catalog:pw@db:5432/catalog"),
            ("DATABASE_POOL_SIZE", "25"),
            ("DATABASE_ACQUIRE_TIMEOUT_SECS", "5"),
            ("DATABASE_RUN_MIGRATIONS", "true"),
        ]))
        .unwrap();
        assert_eq!(config.max_connections, 25);
        assert_eq!(config.acquire_timeout, Duration::from_secs(5));
        assert!(config.run_migrations);
        assert_eq!(config.database_url, "postgresql://catalog:pw@db:5432/catalog");
    }

    #[test]
    fn rejects_bad_numbers() {
        assert!(DatabaseConfig::from_lookup(lookup(&[("DATABASE_POOL_SIZE", "0")])).is_err());
        assert!(
            DatabaseConfig::from_lookup(lookup(&[("DATABASE_IDLE_TIMEOUT_SECS", "soon")])).is_err()
        );
    }

    #[test]
    fn masks_password() {
        let masked = mask_database_url("postgresql://catalog:secret@db:5432/catalog");
        assert!(!masked.contains("secret"));
        assert!(masked.contains("***"));
        assert_eq!(mask_database_url("not a url"), "***");
    }

    #[test]
    fn masks_unparsable_non_ascii_url() {
        let url = "хост базы данных каталога организаций";
        let masked = mask_database_url(url);
        assert!(masked.starts_with("хост базы "));
        assert!(masked.ends_with("рганизаций"));
        assert!(masked.contains("***"));
    }
}
