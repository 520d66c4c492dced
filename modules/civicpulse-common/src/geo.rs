//! Geo index utility: geohash encode/neighbors plus haversine distance.
//!
//! Pure functions, no side effects. All coordinate inputs are validated
//! before touching the geohash crate so callers get one error shape.

use crate::error::CivicPulseError;

const EARTH_RADIUS_METERS: f64 = 6_371_000.0;

/// Reject coordinates outside |lat| <= 90, |lng| <= 180.
pub fn validate_coordinate(lat: f64, lng: f64) -> Result<(), CivicPulseError> {
    if !lat.is_finite() || !lng.is_finite() || lat.abs() > 90.0 || lng.abs() > 180.0 {
        return Err(CivicPulseError::InvalidCoordinate { lat, lng });
    }
    Ok(())
}

/// Encode a lat/lng into a base-32 geohash cell at the given precision.
pub fn encode_geohash(lat: f64, lng: f64, precision: usize) -> Result<String, CivicPulseError> {
    validate_coordinate(lat, lng)?;
    geohash::encode(geohash::Coord { x: lng, y: lat }, precision)
        .map_err(|_| CivicPulseError::InvalidCoordinate { lat, lng })
}

/// The 8 cells adjacent to a geohash, in fixed n/ne/e/se/s/sw/w/nw order.
pub fn neighbor_cells(hash: &str) -> Result<Vec<String>, CivicPulseError> {
    let n = geohash::neighbors(hash)
        .map_err(|e| CivicPulseError::Validation(format!("invalid geohash {hash:?}: {e}")))?;
    Ok(vec![n.n, n.ne, n.e, n.se, n.s, n.sw, n.w, n.nw])
}

/// Haversine great-circle distance between two lat/lng points in meters.
pub fn distance_meters(lat1: f64, lng1: f64, lat2: f64, lng2: f64) -> f64 {
    let d_lat = (lat2 - lat1).to_radians();
    let d_lng = (lng2 - lng1).to_radians();
    let lat1_r = lat1.to_radians();
    let lat2_r = lat2.to_radians();

    let a = (d_lat / 2.0).sin().powi(2) + lat1_r.cos() * lat2_r.cos() * (d_lng / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().asin();
    EARTH_RADIUS_METERS * c
}
