//! CatalogService, the read-side resolvers over a `CatalogStore`.
//!
//! Storage failures stop here: they are logged with the operation name and
//! key parameters and turned into `NotFound` (single lookups) or an empty
//! list (multi lookups). `InvalidGeometry` passes through untouched since it
//! means persisted state is corrupt.

use std::fmt::Display;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, error};

use crate::{
    activity_tree::{ActivityLoad, ActivityNode},
    error::{CatalogError, Result},
    geo::{Envelope, RadiusQuery},
    ports::CatalogStore,
    types::{dedup_organizations, BuildingId, Organization, OrganizationId},
};

// ── CatalogService trait ──────────────────────────────────────

#[async_trait]
pub trait CatalogService: Send + Sync {
    async fn get_by_id(&self, id: OrganizationId) -> Result<Organization>;

    async fn get_by_name(&self, name: &str) -> Result<Organization>;

    /// Empty when the building has no organizations or does not exist.
    async fn get_by_building_id(&self, building_id: BuildingId) -> Result<Vec<Organization>>;

    /// Find an activity by exact name. With `with_children` the node comes
    /// back with children and grandchildren materialized.
    async fn get_activity(&self, name: &str, with_children: bool) -> Result<ActivityNode>;

    /// Organizations attached directly to the named activity.
    async fn organizations_by_activity(&self, name: &str) -> Result<Vec<Organization>>;

    /// Organizations attached to the named activity or any descendant, each once.
    async fn organizations_by_activity_tree(&self, name: &str) -> Result<Vec<Organization>>;

    async fn get_objects_in_rectangle(&self, envelope: &Envelope) -> Result<Vec<Organization>>;

    /// Deduplicated by organization id.
    async fn get_objects_in_radius(&self, query: &RadiusQuery) -> Result<Vec<Organization>>;

    /// Backend liveness. Storage errors are NOT recovered here.
    async fn health(&self) -> Result<&'static str>;
}

// ── CatalogServiceImpl ────────────────────────────────────────

pub struct CatalogServiceImpl {
    store: Arc<dyn CatalogStore>,
}

impl CatalogServiceImpl {
    pub fn new(store: Arc<dyn CatalogStore>) -> Self {
        Self { store }
    }
}

fn recover_one<T>(
    operation: &'static str,
    key: &(dyn Display + Sync),
    result: Result<Option<T>>,
) -> Result<Option<T>> {
    match result {
        Err(CatalogError::Storage(e)) => {
            error!(operation, key = %key, error = %format!("{e:#}"), "storage failure, reporting not found");
            Ok(None)
        }
        other => other,
    }
}

fn recover_many<T>(
    operation: &'static str,
    key: &(dyn Display + Sync),
    result: Result<Vec<T>>,
) -> Result<Vec<T>> {
    match result {
        Err(CatalogError::Storage(e)) => {
            error!(operation, key = %key, error = %format!("{e:#}"), "storage failure, reporting empty result");
            Ok(Vec::new())
        }
        other => other,
    }
}

#[async_trait]
impl CatalogService for CatalogServiceImpl {
    async fn get_by_id(&self, id: OrganizationId) -> Result<Organization> {
        let key = format!("id={id}");
        recover_one("get_by_id", &key, self.store.organization_by_id(id).await)?
            .ok_or_else(|| CatalogError::not_found("organization", key))
    }

    async fn get_by_name(&self, name: &str) -> Result<Organization> {
        let key = format!("name={name}");
        recover_one("get_by_name", &key, self.store.organization_by_name(name).await)?
            .ok_or_else(|| CatalogError::not_found("organization", key))
    }

    async fn get_by_building_id(&self, building_id: BuildingId) -> Result<Vec<Organization>> {
        let key = format!("building_id={building_id}");
        recover_many(
            "get_by_building_id",
            &key,
            self.store.organizations_by_building(building_id).await,
        )
    }

    async fn get_activity(&self, name: &str, with_children: bool) -> Result<ActivityNode> {
        let key = format!("name={name} with_children={with_children}");
        let load = ActivityLoad::from(with_children);
        let node = recover_one(
            "get_activity",
            &key,
            self.store.activity_by_name(name, load).await,
        )?
        .ok_or_else(|| CatalogError::not_found("activity", format!("name={name}")))?;
        debug!(
            activity_id = node.activity.id,
            level = node.activity.level,
            with_children,
            "resolved activity"
        );
        Ok(node)
    }

    async fn organizations_by_activity(&self, name: &str) -> Result<Vec<Organization>> {
        Ok(self.get_activity(name, false).await?.organizations)
    }

    async fn organizations_by_activity_tree(&self, name: &str) -> Result<Vec<Organization>> {
        Ok(self.get_activity(name, true).await?.closure())
    }

    async fn get_objects_in_rectangle(&self, envelope: &Envelope) -> Result<Vec<Organization>> {
        let key = format!(
            "lon_min={} lat_min={} lon_max={} lat_max={}",
            envelope.lon_min, envelope.lat_min, envelope.lon_max, envelope.lat_max
        );
        recover_many(
            "get_objects_in_rectangle",
            &key,
            self.store.organizations_in_envelope(envelope).await,
        )
    }

    async fn get_objects_in_radius(&self, query: &RadiusQuery) -> Result<Vec<Organization>> {
        let key = format!(
            "lon={} lat={} radius={}",
            query.center.longitude, query.center.latitude, query.radius_m
        );
        let found = recover_many(
            "get_objects_in_radius",
            &key,
            self.store.organizations_in_radius(query).await,
        )?;
        Ok(dedup_organizations(found))
    }

    async fn health(&self) -> Result<&'static str> {
        self.store.ping().await?;
        Ok(self.store.backend_name())
    }
}
