//! Organization lookups.
//!
//! GET /org/:id : by id
//! GET /org/name?name= : by exact name
//! GET /org/building?id= : all organizations in a building, possibly none

use std::sync::Arc;

use axum::{
    extract::{rejection::PathRejection, rejection::QueryRejection, Path, Query},
    Extension, Json,
};
use org_catalog_core::{CatalogError, CatalogService};
use org_catalog_types::{BuildingQuery, NameQuery, OrganizationResponse};

use crate::error::AppError;
use crate::response::{organization_list, organization_response};
use crate::validation::{positive_id, required_name};

pub async fn by_id(
    Extension(service): Extension<Arc<dyn CatalogService>>,
    path: Result<Path<i32>, PathRejection>,
) -> Result<Json<OrganizationResponse>, AppError> {
    let Path(id) = path.map_err(|e| CatalogError::InvalidInput(e.body_text()))?;
    let id = positive_id("id", id)?;
    let org = service.get_by_id(id).await?;
    Ok(Json(organization_response(&org)))
}

pub async fn by_name(
    Extension(service): Extension<Arc<dyn CatalogService>>,
    query: Result<Query<NameQuery>, QueryRejection>,
) -> Result<Json<OrganizationResponse>, AppError> {
    let Query(query) = query.map_err(|e| CatalogError::InvalidInput(e.body_text()))?;
    let name = required_name("name", &query.name)?;
    let org = service.get_by_name(name).await?;
    Ok(Json(organization_response(&org)))
}

pub async fn by_building(
    Extension(service): Extension<Arc<dyn CatalogService>>,
    query: Result<Query<BuildingQuery>, QueryRejection>,
) -> Result<Json<Vec<OrganizationResponse>>, AppError> {
    let Query(query) = query.map_err(|e| CatalogError::InvalidInput(e.body_text()))?;
    let building_id = positive_id("id", query.id)?;
    let orgs = service.get_by_building_id(building_id).await?;
    Ok(Json(organization_list(&orgs)))
}
