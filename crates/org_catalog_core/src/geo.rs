//! Point geometry: extraction from stored representations and the two
//! spatial predicates (envelope coverage, projected radius).
//!
//! Stored points are SRID 4326. Radius comparisons happen in Web Mercator
//! (SRID 3857) meters, matching `ST_DWithin(ST_Transform(.., 3857), ..)`.

use crate::error::{CatalogError, Result};
use crate::types::GeoPoint;

pub const WGS84_SRID: i32 = 4326;
pub const WEB_MERCATOR_SRID: i32 = 3857;

/// Semi-major axis of the spherical Web Mercator projection.
const EARTH_RADIUS_M: f64 = 6_378_137.0;

/// Latitude band where Web Mercator is defined.
pub const MAX_MERCATOR_LATITUDE: f64 = 85.051_128_78;

const EWKB_SRID_FLAG: u32 = 0x2000_0000;
const EWKB_M_FLAG: u32 = 0x4000_0000;
const EWKB_Z_FLAG: u32 = 0x8000_0000;
const WKB_POINT: u32 = 1;

// ── Stored geometry ──────────────────────────────────────────

/// A point geometry as handed out by storage.
#[derive(Debug, Clone, PartialEq)]
pub enum GeometryValue {
    /// (E)WKB bytes, either byte order.
    Binary(Vec<u8>),
    /// EWKT (`SRID=4326;POINT(lon lat)`), WKT, or hex-encoded EWKB.
    Text(String),
}

/// Convert a stored point into `(longitude, latitude)`.
pub fn extract_coordinates(value: &GeometryValue) -> Result<GeoPoint> {
    match value {
        GeometryValue::Binary(bytes) => parse_ewkb(bytes),
        GeometryValue::Text(text) => parse_text(text),
    }
}

fn invalid(msg: impl Into<String>) -> CatalogError {
    CatalogError::InvalidGeometry(msg.into())
}

struct WkbReader<'a> {
    bytes: &'a [u8],
    pos: usize,
    little_endian: bool,
}

impl<'a> WkbReader<'a> {
    fn take<const N: usize>(&mut self) -> Result<[u8; N]> {
        let end = self.pos + N;
        let slice = self
            .bytes
            .get(self.pos..end)
            .ok_or_else(|| invalid(format!("truncated WKB at byte {}", self.pos)))?;
        self.pos = end;
        let mut buf = [0u8; N];
        buf.copy_from_slice(slice);
        Ok(buf)
    }

    fn u32(&mut self) -> Result<u32> {
        let b = self.take::<4>()?;
        Ok(if self.little_endian {
            u32::from_le_bytes(b)
        } else {
            u32::from_be_bytes(b)
        })
    }

    fn f64(&mut self) -> Result<f64> {
        let b = self.take::<8>()?;
        Ok(if self.little_endian {
            f64::from_le_bytes(b)
        } else {
            f64::from_be_bytes(b)
        })
    }
}

fn parse_ewkb(bytes: &[u8]) -> Result<GeoPoint> {
    let little_endian = match bytes.first() {
        Some(0) => false,
        Some(1) => true,
        Some(other) => return Err(invalid(format!("unknown WKB byte order {other}"))),
        None => return Err(invalid("empty WKB")),
    };
    let mut reader = WkbReader {
        bytes,
        pos: 1,
        little_endian,
    };

    let raw_type = reader.u32()?;
    let mut has_z = raw_type & EWKB_Z_FLAG != 0;
    let mut has_m = raw_type & EWKB_M_FLAG != 0;
    let mut base_type = raw_type & 0x0FFF_FFFF;
    // ISO WKB encodes dimensions as thousands (1001 = Point Z, 3001 = Point ZM).
    match base_type / 1000 {
        0 => {}
        1 => has_z = true,
        2 => has_m = true,
        3 => {
            has_z = true;
            has_m = true;
        }
        _ => return Err(invalid(format!("unknown WKB geometry type {raw_type:#x}"))),
    }
    base_type %= 1000;

    if raw_type & EWKB_SRID_FLAG != 0 {
        let srid = reader.u32()? as i32;
        if srid != WGS84_SRID {
            return Err(invalid(format!("expected SRID {WGS84_SRID}, found {srid}")));
        }
    }
    if base_type != WKB_POINT {
        return Err(invalid(format!("expected a point, found WKB type {base_type}")));
    }

    let longitude = reader.f64()?;
    let latitude = reader.f64()?;
    if has_z {
        reader.f64()?;
    }
    if has_m {
        reader.f64()?;
    }
    if reader.pos != bytes.len() {
        return Err(invalid(format!(
            "{} trailing bytes after point",
            bytes.len() - reader.pos
        )));
    }
    finite_point(longitude, latitude)
}

fn parse_text(text: &str) -> Result<GeoPoint> {
    let text = text.trim();
    if !text.is_empty() && text.len() % 2 == 0 && text.bytes().all(|b| b.is_ascii_hexdigit()) {
        let bytes = hex::decode(text).map_err(|e| invalid(format!("bad hex EWKB: {e}")))?;
        return parse_ewkb(&bytes);
    }

    let body = match text.split_once(';') {
        Some((srid_part, rest)) => {
            let srid = srid_part
                .trim()
                .strip_prefix("SRID=")
                .and_then(|s| s.trim().parse::<i32>().ok())
                .ok_or_else(|| invalid(format!("bad SRID prefix '{srid_part}'")))?;
            if srid != WGS84_SRID {
                return Err(invalid(format!("expected SRID {WGS84_SRID}, found {srid}")));
            }
            rest.trim()
        }
        None => text,
    };

    let upper = body.to_ascii_uppercase();
    let after_keyword = upper
        .strip_prefix("POINT")
        .ok_or_else(|| invalid(format!("expected POINT, found '{body}'")))?;
    let open = after_keyword
        .find('(')
        .ok_or_else(|| invalid(format!("empty or malformed point '{body}'")))?;
    let dims = after_keyword[..open].trim();
    if !matches!(dims, "" | "Z" | "M" | "ZM") {
        return Err(invalid(format!("unknown point dimensions '{dims}'")));
    }
    let coords = after_keyword[open + 1..]
        .strip_suffix(')')
        .ok_or_else(|| invalid(format!("unterminated point '{body}'")))?;

    let values = coords
        .split_whitespace()
        .map(|v| {
            v.parse::<f64>()
                .map_err(|_| invalid(format!("bad coordinate '{v}'")))
        })
        .collect::<Result<Vec<_>>>()?;
    match values.as_slice() {
        [lon, lat] | [lon, lat, _] | [lon, lat, _, _] => finite_point(*lon, *lat),
        _ => Err(invalid(format!("expected 2-4 coordinates, found {}", values.len()))),
    }
}

fn finite_point(longitude: f64, latitude: f64) -> Result<GeoPoint> {
    if longitude.is_nan() && latitude.is_nan() {
        return Err(invalid("empty point"));
    }
    if !longitude.is_finite() || !latitude.is_finite() {
        return Err(invalid("non-finite coordinate"));
    }
    Ok(GeoPoint::new(longitude, latitude))
}

/// Encode a point as little-endian EWKB with SRID 4326.
pub fn encode_ewkb(point: GeoPoint) -> Vec<u8> {
    let mut out = Vec::with_capacity(25);
    out.push(1);
    out.extend_from_slice(&(WKB_POINT | EWKB_SRID_FLAG).to_le_bytes());
    out.extend_from_slice(&(WGS84_SRID as u32).to_le_bytes());
    out.extend_from_slice(&point.longitude.to_le_bytes());
    out.extend_from_slice(&point.latitude.to_le_bytes());
    out
}

// ── Input validation ─────────────────────────────────────────

fn check_longitude(field: &str, value: f64) -> Result<()> {
    if value.is_finite() && (-180.0..=180.0).contains(&value) {
        Ok(())
    } else {
        Err(CatalogError::InvalidInput(format!(
            "{field} must be within [-180, 180], got {value}"
        )))
    }
}

fn check_latitude(field: &str, value: f64) -> Result<()> {
    if value.is_finite() && (-90.0..=90.0).contains(&value) {
        Ok(())
    } else {
        Err(CatalogError::InvalidInput(format!(
            "{field} must be within [-90, 90], got {value}"
        )))
    }
}

// ── Envelope ─────────────────────────────────────────────────

/// Axis-aligned rectangle in SRID 4326.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Envelope {
    pub lon_min: f64,
    pub lat_min: f64,
    pub lon_max: f64,
    pub lat_max: f64,
}

impl Envelope {
    pub fn new(lon_min: f64, lat_min: f64, lon_max: f64, lat_max: f64) -> Result<Self> {
        check_longitude("lon_min", lon_min)?;
        check_longitude("lon_max", lon_max)?;
        check_latitude("lat_min", lat_min)?;
        check_latitude("lat_max", lat_max)?;
        if lon_min > lon_max || lat_min > lat_max {
            return Err(CatalogError::InvalidInput(format!(
                "envelope minimum ({lon_min}, {lat_min}) exceeds maximum ({lon_max}, {lat_max})"
            )));
        }
        Ok(Self {
            lon_min,
            lat_min,
            lon_max,
            lat_max,
        })
    }

    /// Boundary points count as covered.
    pub fn covers(&self, point: GeoPoint) -> bool {
        (self.lon_min..=self.lon_max).contains(&point.longitude)
            && (self.lat_min..=self.lat_max).contains(&point.latitude)
    }
}

// ── Radius ───────────────────────────────────────────────────

/// Project a WGS84 point onto spherical Web Mercator, in meters.
///
/// Latitudes outside the projection band are clamped to it, so the poles
/// map to finite coordinates.
pub fn to_web_mercator(point: GeoPoint) -> (f64, f64) {
    let lat = point
        .latitude
        .clamp(-MAX_MERCATOR_LATITUDE, MAX_MERCATOR_LATITUDE);
    let x = EARTH_RADIUS_M * point.longitude.to_radians();
    let y = EARTH_RADIUS_M * (std::f64::consts::FRAC_PI_4 + lat.to_radians() / 2.0).tan().ln();
    (x, y)
}

/// Center and radius (meters, projected).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RadiusQuery {
    pub center: GeoPoint,
    pub radius_m: f64,
}

impl RadiusQuery {
    pub fn new(lon: f64, lat: f64, radius_m: f64) -> Result<Self> {
        check_longitude("lon", lon)?;
        check_latitude("lat", lat)?;
        if !radius_m.is_finite() || radius_m <= 0.0 {
            return Err(CatalogError::InvalidInput(format!(
                "radius must be a positive number of meters, got {radius_m}"
            )));
        }
        Ok(Self {
            center: GeoPoint::new(lon, lat),
            radius_m,
        })
    }

    pub fn projected_distance(&self, point: GeoPoint) -> f64 {
        let (cx, cy) = to_web_mercator(self.center);
        let (px, py) = to_web_mercator(point);
        (px - cx).hypot(py - cy)
    }

    /// Inclusive: a point exactly `radius_m` away is within.
    pub fn contains(&self, point: GeoPoint) -> bool {
        self.projected_distance(point) <= self.radius_m
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn ewkb_be_without_srid(lon: f64, lat: f64) -> Vec<u8> {
        let mut out = vec![0];
        out.extend_from_slice(&WKB_POINT.to_be_bytes());
        out.extend_from_slice(&lon.to_be_bytes());
        out.extend_from_slice(&lat.to_be_bytes());
        out
    }

    // ── extraction ───────────────────────────────────────────────

    #[test]
    fn extracts_little_endian_ewkb_with_srid() {
        let bytes = encode_ewkb(GeoPoint::new(-52.105232, -9.719463));
        let p = extract_coordinates(&GeometryValue::Binary(bytes)).unwrap();
        assert_eq!(p.as_lon_lat(), (-52.105232, -9.719463));
    }

    #[test]
    fn extracts_big_endian_plain_wkb() {
        let bytes = ewkb_be_without_srid(37.62, 55.75);
        let p = extract_coordinates(&GeometryValue::Binary(bytes)).unwrap();
        assert_eq!(p.as_lon_lat(), (37.62, 55.75));
    }

    #[test]
    fn extracts_postgis_hex_ewkb() {
        // SELECT ST_AsEWKB('SRID=4326;POINT(1 2)'::geometry)
        let hex = "0101000020E6100000000000000000F03F0000000000000040";
        let p = extract_coordinates(&GeometryValue::Text(hex.into())).unwrap();
        assert_eq!(p.as_lon_lat(), (1.0, 2.0));
    }

    #[test]
    fn extracts_ewkt_and_wkt() {
        let p = extract_coordinates(&GeometryValue::Text("SRID=4326;POINT(0.5 -0.5)".into()))
            .unwrap();
        assert_eq!(p.as_lon_lat(), (0.5, -0.5));

        let p = extract_coordinates(&GeometryValue::Text("point z (10 20 30)".into())).unwrap();
        assert_eq!(p.as_lon_lat(), (10.0, 20.0));
    }

    #[test]
    fn rejects_wrong_srid() {
        let err = extract_coordinates(&GeometryValue::Text("SRID=3857;POINT(1 2)".into()))
            .unwrap_err();
        assert!(matches!(err, CatalogError::InvalidGeometry(_)));
    }

    #[test]
    fn rejects_non_point_and_truncated_wkb() {
        let mut line = encode_ewkb(GeoPoint::new(1.0, 2.0));
        line[1] = 2;
        assert!(matches!(
            extract_coordinates(&GeometryValue::Binary(line)),
            Err(CatalogError::InvalidGeometry(_))
        ));

        let mut truncated = encode_ewkb(GeoPoint::new(1.0, 2.0));
        truncated.truncate(20);
        assert!(matches!(
            extract_coordinates(&GeometryValue::Binary(truncated)),
            Err(CatalogError::InvalidGeometry(_))
        ));
    }

    #[test]
    fn rejects_empty_and_garbage_text() {
        for text in ["POINT EMPTY", "LINESTRING(0 0, 1 1)", "", "POINT(1)", "POINT(a b)"] {
            assert!(
                matches!(
                    extract_coordinates(&GeometryValue::Text(text.into())),
                    Err(CatalogError::InvalidGeometry(_))
                ),
                "{text} should be rejected"
            );
        }
    }

    #[test]
    fn rejects_empty_wkb_point() {
        let bytes = encode_ewkb(GeoPoint::new(f64::NAN, f64::NAN));
        let err = extract_coordinates(&GeometryValue::Binary(bytes)).unwrap_err();
        assert_eq!(err.to_string(), "invalid geometry: empty point");
    }

    // ── envelope ─────────────────────────────────────────────────

    #[test]
    fn envelope_boundary_is_inside() {
        let env = Envelope::new(-1.0, -1.0, 1.0, 1.0).unwrap();
        assert!(env.covers(GeoPoint::new(1.0, 1.0)));
        assert!(env.covers(GeoPoint::new(-1.0, -1.0)));
        assert!(env.covers(GeoPoint::new(0.0, 0.0)));
        assert!(!env.covers(GeoPoint::new(1.000001, 0.0)));
    }

    #[test]
    fn envelope_rejects_inverted_or_out_of_range_bounds() {
        assert!(Envelope::new(1.0, 0.0, -1.0, 1.0).is_err());
        assert!(Envelope::new(-181.0, 0.0, 1.0, 1.0).is_err());
        assert!(Envelope::new(0.0, 0.0, 1.0, f64::NAN).is_err());
    }

    // ── radius ───────────────────────────────────────────────────

    #[test]
    fn radius_includes_near_and_excludes_far_points() {
        let q = RadiusQuery::new(0.0, 0.0, 1000.0).unwrap();
        // ~0.0045 degrees of longitude is ~500 m at the equator in 3857.
        assert!(q.contains(GeoPoint::new(0.0045, 0.0)));
        // ~0.018 degrees is ~2000 m.
        assert!(!q.contains(GeoPoint::new(0.018, 0.0)));
    }

    #[test]
    fn radius_center_is_always_within() {
        let q = RadiusQuery::new(12.5, 41.9, f64::MIN_POSITIVE).unwrap();
        assert!(q.contains(GeoPoint::new(12.5, 41.9)));
    }

    #[test]
    fn radius_rejects_non_positive() {
        assert!(RadiusQuery::new(0.0, 0.0, 0.0).is_err());
        assert!(RadiusQuery::new(0.0, 0.0, -5.0).is_err());
        assert!(RadiusQuery::new(0.0, 91.0, 5.0).is_err());
    }

    #[test]
    fn mercator_is_finite_at_the_poles() {
        let (x, y) = to_web_mercator(GeoPoint::new(180.0, 90.0));
        assert!(x.is_finite() && y.is_finite());
        let (_, y_south) = to_web_mercator(GeoPoint::new(0.0, -90.0));
        assert!((y + y_south).abs() < 1e-6);
    }

    proptest! {
        #[test]
        fn ewkb_extraction_preserves_coordinates(
            lon in -180.0f64..=180.0,
            lat in -90.0f64..=90.0,
        ) {
            let p = extract_coordinates(&GeometryValue::Binary(encode_ewkb(GeoPoint::new(lon, lat))))
                .unwrap();
            prop_assert_eq!(p.as_lon_lat(), (lon, lat));
        }

        #[test]
        fn envelope_covers_its_corners(
            a in -180.0f64..=180.0, b in -180.0f64..=180.0,
            c in -90.0f64..=90.0, d in -90.0f64..=90.0,
        ) {
            let env = Envelope::new(a.min(b), c.min(d), a.max(b), c.max(d)).unwrap();
            prop_assert!(env.covers(GeoPoint::new(env.lon_min, env.lat_min)));
            prop_assert!(env.covers(GeoPoint::new(env.lon_max, env.lat_max)));
        }
    }
}
