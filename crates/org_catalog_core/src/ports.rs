//! Storage port.
//!
//! Adapters return `CatalogError::Storage` for persistence failures and
//! `CatalogError::InvalidGeometry` for corrupt stored points. Recovery is
//! the service's job, not the adapter's.

use async_trait::async_trait;

use crate::activity_tree::{ActivityLoad, ActivityNode};
use crate::geo::{Envelope, RadiusQuery};
use crate::types::{BuildingId, Organization, OrganizationId};

pub use crate::error::Result;

#[async_trait]
pub trait CatalogStore: Send + Sync {
    async fn organization_by_id(&self, id: OrganizationId) -> Result<Option<Organization>>;

    /// Exact match; duplicate names resolve to the lowest id.
    async fn organization_by_name(&self, name: &str) -> Result<Option<Organization>>;

    async fn organizations_by_building(&self, building_id: BuildingId)
        -> Result<Vec<Organization>>;

    /// Exact match on activity name (lowest id wins), loading as much of
    /// the subtree as `load` asks for.
    async fn activity_by_name(&self, name: &str, load: ActivityLoad)
        -> Result<Option<ActivityNode>>;

    async fn organizations_in_envelope(&self, envelope: &Envelope) -> Result<Vec<Organization>>;

    async fn organizations_in_radius(&self, query: &RadiusQuery) -> Result<Vec<Organization>>;

    /// Cheap liveness probe against the backend.
    async fn ping(&self) -> Result<()>;

    fn backend_name(&self) -> &'static str;
}
