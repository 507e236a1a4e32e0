//! Storage backend construction.

use std::sync::Arc;

use anyhow::Context;
use org_catalog_core::{CatalogSeed, CatalogService, CatalogServiceImpl, MemoryCatalogStore};
use org_catalog_postgres::PgCatalogStore;
use tracing::info;

use crate::config::StorageBackend;

/// The service plus whatever needs closing at shutdown.
pub struct Catalog {
    pub service: Arc<dyn CatalogService>,
    pg_store: Option<Arc<PgCatalogStore>>,
}

impl Catalog {
    pub async fn open(backend: &StorageBackend) -> anyhow::Result<Self> {
        match backend {
            StorageBackend::Postgres(db) => {
                let pool = org_catalog_postgres::connect(db)
                    .await
                    .context("failed to connect to database")?;
                let store = Arc::new(PgCatalogStore::new(pool));
                Ok(Self {
                    service: Arc::new(CatalogServiceImpl::new(store.clone())),
                    pg_store: Some(store),
                })
            }
            StorageBackend::Memory { seed_file } => {
                let seed = match seed_file {
                    Some(path) => {
                        let json = tokio::fs::read_to_string(path)
                            .await
                            .with_context(|| format!("failed to read seed file {}", path.display()))?;
                        CatalogSeed::from_json(&json)
                            .with_context(|| format!("failed to parse seed file {}", path.display()))?
                    }
                    None => {
                        info!("No CATALOG_SEED_FILE given, loading demo catalog");
                        CatalogSeed::demo()
                    }
                };
                let store = MemoryCatalogStore::from_seed(seed).context("invalid catalog seed")?;
                Ok(Self {
                    service: Arc::new(CatalogServiceImpl::new(Arc::new(store))),
                    pg_store: None,
                })
            }
        }
    }

    pub async fn close(self) {
        if let Some(store) = self.pg_store {
            store.close().await;
        }
    }
}
