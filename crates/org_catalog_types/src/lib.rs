//! Shared API types for the organization catalog.
//!
//! Every type that crosses the HTTP boundary lives here. Handlers never
//! define inline request/response structs.
//!
//! ## Rules
//!
//! 1. Coordinates are always `(longitude, latitude)`.
//! 2. Error bodies use the `{result, error_type, error_message}` envelope.
//! 3. Field names match the public JSON contract, not internal entity names.

pub mod activity_names;

use serde::{Deserialize, Serialize};

pub use activity_names::{is_known_activity, ACTIVITY_TAXONOMY};

// ============================================================================
// REQUEST PARAMETERS
// ============================================================================

/// `GET /org/name?name=`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NameQuery {
    pub name: String,
}

/// `GET /org/building?id=`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildingQuery {
    pub id: i32,
}

/// `GET /org/location`
///
/// Either the radius set (`lon`, `lat`, `radius`) or the rectangle set
/// (`lon_min`, `lat_min`, `lon_max`, `lat_max`) must be supplied, never both.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LocationQuery {
    #[serde(default)]
    pub lon: Option<f64>,
    #[serde(default)]
    pub lat: Option<f64>,
    /// Radius in meters (Web Mercator distance).
    #[serde(default)]
    pub radius: Option<f64>,
    #[serde(default)]
    pub lon_min: Option<f64>,
    #[serde(default)]
    pub lat_min: Option<f64>,
    #[serde(default)]
    pub lon_max: Option<f64>,
    #[serde(default)]
    pub lat_max: Option<f64>,
}

impl LocationQuery {
    /// True when any of the radius parameters is present.
    pub fn has_radius_params(&self) -> bool {
        self.lon.is_some() || self.lat.is_some() || self.radius.is_some()
    }

    /// True when any of the rectangle parameters is present.
    pub fn has_rectangle_params(&self) -> bool {
        self.lon_min.is_some()
            || self.lat_min.is_some()
            || self.lon_max.is_some()
            || self.lat_max.is_some()
    }
}

// ============================================================================
// RESPONSES
// ============================================================================

/// Organization with its building, phones and activity names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrganizationResponse {
    pub id: i32,
    pub name: String,
    pub building: BuildingResponse,
    pub phones: Vec<PhoneResponse>,
    pub activity: Vec<ActivityResponse>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuildingResponse {
    pub id: i32,
    pub address: String,
    /// `[longitude, latitude]`
    pub location: (f64, f64),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhoneResponse {
    pub phone: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityResponse {
    pub name: String,
}

/// Error envelope returned by every failing endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub result: bool,
    pub error_type: String,
    pub error_message: String,
}

impl ErrorResponse {
    pub fn new(error_type: impl Into<String>, error_message: impl Into<String>) -> Self {
        Self {
            result: false,
            error_type: error_type.into(),
            error_message: error_message.into(),
        }
    }
}

/// `GET /health`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub backend: String,
}
