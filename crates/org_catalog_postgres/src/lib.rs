//! org_catalog_postgres: PostgreSQL/PostGIS adapter for the organization
//! catalog.
//!
//! `PgCatalogStore` implements `org_catalog_core::CatalogStore`;
//! `database` owns pool configuration and the bundled migrations.

pub mod database;
mod sqlx_types;
pub mod store;

pub use database::{connect, mask_database_url, run_migrations, DatabaseConfig};
pub use store::PgCatalogStore;
