//! org_catalog_core: domain types, the storage port, and the read-side
//! resolvers for the organization catalog.
//!
//! No sqlx here. The PostgreSQL adapter lives in `org_catalog_postgres`;
//! `memory::MemoryCatalogStore` serves tests, fixtures and demo mode.

pub mod activity_tree;
pub mod error;
pub mod geo;
pub mod memory;
pub mod ports;
pub mod seeds;
pub mod service;
pub mod types;

pub use activity_tree::{ActivityLoad, ActivityNode, ActivityTree, Children};
pub use error::{CatalogError, Result};
pub use geo::{extract_coordinates, Envelope, GeometryValue, RadiusQuery};
pub use memory::MemoryCatalogStore;
pub use ports::CatalogStore;
pub use seeds::CatalogSeed;
pub use service::{CatalogService, CatalogServiceImpl};
pub use types::*;
