//! Row types for runtime-checked queries and their conversions into core
//! entities.

use anyhow::anyhow;
use org_catalog_core::{
    extract_coordinates, Activity, Building, CatalogError, GeometryValue, PhoneNumber, Result,
};

/// Organization joined with its building. `location` is `ST_AsEWKB(...)`.
#[derive(Debug, sqlx::FromRow)]
pub(crate) struct OrganizationRow {
    pub id: i32,
    pub name: String,
    pub building_id: i32,
    pub address: String,
    pub location: Vec<u8>,
}

impl OrganizationRow {
    pub fn building(&self) -> Result<Building> {
        let location = extract_coordinates(&GeometryValue::Binary(self.location.clone()))
            .map_err(|e| match e {
                CatalogError::InvalidGeometry(msg) => CatalogError::InvalidGeometry(format!(
                    "building {}: {msg}",
                    self.building_id
                )),
                other => other,
            })?;
        Ok(Building {
            id: self.building_id,
            address: self.address.clone(),
            location,
        })
    }
}

/// `OrganizationRow` tagged with the activity it was reached through.
#[derive(Debug, sqlx::FromRow)]
pub(crate) struct ActivityOrganizationRow {
    pub activity_id: i32,
    #[sqlx(flatten)]
    pub organization: OrganizationRow,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub(crate) struct ActivityRow {
    pub id: i32,
    pub name: String,
    pub parent_id: Option<i32>,
    pub level: i16,
}

impl TryFrom<ActivityRow> for Activity {
    type Error = CatalogError;

    fn try_from(row: ActivityRow) -> Result<Self> {
        let level = u8::try_from(row.level).map_err(|_| {
            CatalogError::Storage(anyhow!("activity {} has level {}", row.id, row.level))
        })?;
        Ok(Activity {
            id: row.id,
            name: row.name,
            parent_id: row.parent_id,
            level,
        })
    }
}

/// Activity tagged with the organization it is attached to.
#[derive(Debug, sqlx::FromRow)]
pub(crate) struct OrganizationActivityRow {
    pub organization_id: i32,
    #[sqlx(flatten)]
    pub activity: ActivityRow,
}

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct PhoneRow {
    pub id: i32,
    pub number: String,
    pub organization_id: i32,
}

impl From<PhoneRow> for PhoneNumber {
    fn from(row: PhoneRow) -> Self {
        PhoneNumber {
            id: row.id,
            number: row.number,
        }
    }
}
