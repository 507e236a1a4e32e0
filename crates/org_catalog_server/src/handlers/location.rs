//! GET /org/location : organizations by radius or by rectangle.

use std::sync::Arc;

use axum::{
    extract::{rejection::QueryRejection, Query},
    Extension, Json,
};
use org_catalog_core::{CatalogError, CatalogService};
use org_catalog_types::{LocationQuery, OrganizationResponse};

use crate::error::AppError;
use crate::handlers::non_empty;
use crate::validation::LocationFilter;

pub async fn by_location(
    Extension(service): Extension<Arc<dyn CatalogService>>,
    query: Result<Query<LocationQuery>, QueryRejection>,
) -> Result<Json<Vec<OrganizationResponse>>, AppError> {
    let Query(query) = query.map_err(|e| CatalogError::InvalidInput(e.body_text()))?;
    let orgs = match LocationFilter::try_from(&query)? {
        LocationFilter::Radius(radius) => service.get_objects_in_radius(&radius).await?,
        LocationFilter::Rectangle(envelope) => service.get_objects_in_rectangle(&envelope).await?,
    };
    Ok(Json(non_empty(orgs, "location")?))
}
