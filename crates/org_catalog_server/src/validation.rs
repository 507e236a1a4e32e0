//! Request parameter validation. Everything here fails with
//! `CatalogError::InvalidInput` (422).

use org_catalog_core::{CatalogError, Envelope, RadiusQuery, Result};
use org_catalog_types::{is_known_activity, LocationQuery};

/// Which location search the caller asked for.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LocationFilter {
    Radius(RadiusQuery),
    Rectangle(Envelope),
}

impl TryFrom<&LocationQuery> for LocationFilter {
    type Error = CatalogError;

    fn try_from(q: &LocationQuery) -> Result<Self> {
        match (q.has_radius_params(), q.has_rectangle_params()) {
            (true, true) => Err(CatalogError::InvalidInput(
                "pass either lon/lat/radius or lon_min/lat_min/lon_max/lat_max, not both".into(),
            )),
            (false, false) => Err(CatalogError::InvalidInput(
                "pass lon/lat/radius or lon_min/lat_min/lon_max/lat_max".into(),
            )),
            (true, false) => match (q.lon, q.lat, q.radius) {
                (Some(lon), Some(lat), Some(radius)) => {
                    RadiusQuery::new(lon, lat, radius).map(Self::Radius)
                }
                _ => Err(CatalogError::InvalidInput(
                    "radius search needs lon, lat and radius".into(),
                )),
            },
            (false, true) => match (q.lon_min, q.lat_min, q.lon_max, q.lat_max) {
                (Some(lon_min), Some(lat_min), Some(lon_max), Some(lat_max)) => {
                    Envelope::new(lon_min, lat_min, lon_max, lat_max).map(Self::Rectangle)
                }
                _ => Err(CatalogError::InvalidInput(
                    "rectangle search needs lon_min, lat_min, lon_max and lat_max".into(),
                )),
            },
        }
    }
}

pub fn positive_id(field: &str, value: i32) -> Result<i32> {
    if value > 0 {
        Ok(value)
    } else {
        Err(CatalogError::InvalidInput(format!(
            "{field} must be a positive integer, got {value}"
        )))
    }
}

/// Blank names are rejected; others pass through untouched for exact matching.
pub fn required_name<'a>(field: &str, value: &'a str) -> Result<&'a str> {
    if value.trim().is_empty() {
        Err(CatalogError::InvalidInput(format!("{field} must not be empty")))
    } else {
        Ok(value)
    }
}

pub fn activity_name<'a>(value: &'a str, strict: bool) -> Result<&'a str> {
    let name = required_name("activity", value)?;
    if strict && !is_known_activity(name) {
        return Err(CatalogError::InvalidInput(format!(
            "unknown activity '{name}'"
        )));
    }
    Ok(name)
}
