pub mod activity;
pub mod health;
pub mod location;
pub mod organizations;

use org_catalog_core::{CatalogError, Organization};
use org_catalog_types::OrganizationResponse;

use crate::response::organization_list;

/// Location search answers 404 instead of an empty array.
pub(crate) fn non_empty(
    orgs: Vec<Organization>,
    key: impl std::fmt::Display,
) -> Result<Vec<OrganizationResponse>, CatalogError> {
    if orgs.is_empty() {
        Err(CatalogError::not_found("organizations", key))
    } else {
        Ok(organization_list(&orgs))
    }
}
