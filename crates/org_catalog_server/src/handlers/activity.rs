//! Organizations by activity.
//!
//! GET /org/:activity/root : attached directly to the activity
//! GET /org/:activity/tree : attached to the activity or any descendant
//!
//! 404 only when no activity has that name; a known activity with no
//! organizations answers `[]`.

use std::sync::Arc;

use axum::{extract::Path, Extension, Json};
use org_catalog_core::CatalogService;
use org_catalog_types::OrganizationResponse;

use crate::error::AppError;
use crate::response::organization_list;
use crate::validation::activity_name;

/// Whether activity names must belong to the known taxonomy.
#[derive(Debug, Clone, Copy)]
pub struct ActivityNamePolicy {
    pub strict: bool,
}

pub async fn by_activity(
    Extension(service): Extension<Arc<dyn CatalogService>>,
    Extension(policy): Extension<ActivityNamePolicy>,
    Path(activity): Path<String>,
) -> Result<Json<Vec<OrganizationResponse>>, AppError> {
    let name = activity_name(&activity, policy.strict)?;
    let orgs = service.organizations_by_activity(name).await?;
    Ok(Json(organization_list(&orgs)))
}

pub async fn by_activity_tree(
    Extension(service): Extension<Arc<dyn CatalogService>>,
    Extension(policy): Extension<ActivityNamePolicy>,
    Path(activity): Path<String>,
) -> Result<Json<Vec<OrganizationResponse>>, AppError> {
    let name = activity_name(&activity, policy.strict)?;
    let orgs = service.organizations_by_activity_tree(name).await?;
    Ok(Json(organization_list(&orgs)))
}
