//! Catalog entities.
//!
//! Organization owns its phone numbers. Building and Activity are
//! referenced, not owned.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

pub type ActivityId = i32;
pub type BuildingId = i32;
pub type OrganizationId = i32;
pub type PhoneNumberId = i32;

/// Deepest level an activity may occupy (roots are level 1).
pub const MAX_ACTIVITY_LEVEL: u8 = 3;

/// WGS84 point, `(longitude, latitude)` in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub longitude: f64,
    pub latitude: f64,
}

impl GeoPoint {
    pub fn new(longitude: f64, latitude: f64) -> Self {
        Self {
            longitude,
            latitude,
        }
    }

    pub fn as_lon_lat(&self) -> (f64, f64) {
        (self.longitude, self.latitude)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Building {
    pub id: BuildingId,
    pub address: String,
    pub location: GeoPoint,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhoneNumber {
    pub id: PhoneNumberId,
    pub number: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Activity {
    pub id: ActivityId,
    pub name: String,
    pub parent_id: Option<ActivityId>,
    pub level: u8,
}

impl Activity {
    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }
}

/// Organization with its relations loaded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Organization {
    pub id: OrganizationId,
    pub name: String,
    pub building: Building,
    pub phones: Vec<PhoneNumber>,
    pub activities: Vec<Activity>,
}

/// Drop repeated organizations, keeping the first occurrence of each id.
pub fn dedup_organizations(organizations: Vec<Organization>) -> Vec<Organization> {
    let mut seen = HashSet::with_capacity(organizations.len());
    organizations
        .into_iter()
        .filter(|org| seen.insert(org.id))
        .collect()
}
