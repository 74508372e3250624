//! Geographic coordinates and great-circle navigation math.
//!
//! All functions use a spherical earth model, which is accurate to well
//! under a meter for the short dead-reckoning distances the tracker projects.
//!
//! # Conventions
//!
//! - Latitude: degrees north (-90 to 90)
//! - Longitude: degrees east (-180 to 180)
//! - Bearing: degrees true (0-360, 0=north, 90=east)
//! - Distance: meters

mod types;

pub use types::{Coordinate, MAX_LAT, MAX_LON, MIN_LAT, MIN_LON};

use std::f64::consts::PI;

/// Mean earth radius in meters.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

const DEG_TO_RAD: f64 = PI / 180.0;
const RAD_TO_DEG: f64 = 180.0 / PI;

/// Calculate the initial bearing from one coordinate to another.
///
/// Returns the forward azimuth in degrees (0-360). Identical coordinates
/// yield `0.0`.
///
/// # Example
///
/// ```
/// use groundtrack::coord::{bearing_between, Coordinate};
///
/// let bearing = bearing_between(Coordinate::new(0.0, 0.0), Coordinate::new(0.0, 1.0));
/// assert!((bearing - 90.0).abs() < 0.1);
/// ```
pub fn bearing_between(from: Coordinate, to: Coordinate) -> f64 {
    let lat1_rad = from.latitude * DEG_TO_RAD;
    let lat2_rad = to.latitude * DEG_TO_RAD;
    let delta_lon = (to.longitude - from.longitude) * DEG_TO_RAD;

    let y = delta_lon.sin() * lat2_rad.cos();
    let x = lat1_rad.cos() * lat2_rad.sin() - lat1_rad.sin() * lat2_rad.cos() * delta_lon.cos();

    normalize_bearing(y.atan2(x) * RAD_TO_DEG)
}

/// Project a coordinate along a bearing for a given distance.
///
/// # Example
///
/// ```
/// use groundtrack::coord::{project_position, Coordinate};
///
/// // ~111km north of the equator is one degree of latitude
/// let dest = project_position(Coordinate::new(0.0, 0.0), 0.0, 111_195.0);
/// assert!((dest.latitude - 1.0).abs() < 0.001);
/// assert!(dest.longitude.abs() < 1e-9);
/// ```
pub fn project_position(start: Coordinate, bearing_deg: f64, distance_m: f64) -> Coordinate {
    let mut out = start;
    project_into(start, bearing_deg, distance_m, &mut out);
    out
}

/// Project a coordinate along a bearing, writing the result into `out`.
///
/// `out` may be reused across calls; only its fields are overwritten.
pub fn project_into(start: Coordinate, bearing_deg: f64, distance_m: f64, out: &mut Coordinate) {
    let lat1_rad = start.latitude * DEG_TO_RAD;
    let lon1_rad = start.longitude * DEG_TO_RAD;
    let bearing_rad = bearing_deg * DEG_TO_RAD;
    let angular_distance = distance_m / EARTH_RADIUS_M;

    let sin_lat1 = lat1_rad.sin();
    let cos_lat1 = lat1_rad.cos();
    let sin_d = angular_distance.sin();
    let cos_d = angular_distance.cos();

    let lat2_rad = (sin_lat1 * cos_d + cos_lat1 * sin_d * bearing_rad.cos()).asin();
    let lon2_rad =
        lon1_rad + (bearing_rad.sin() * sin_d * cos_lat1).atan2(cos_d - sin_lat1 * lat2_rad.sin());

    out.latitude = lat2_rad * RAD_TO_DEG;
    out.longitude = normalize_longitude(lon2_rad * RAD_TO_DEG);
}

/// Great-circle distance between two coordinates in meters (haversine).
pub fn distance_m(from: Coordinate, to: Coordinate) -> f64 {
    let lat1_rad = from.latitude * DEG_TO_RAD;
    let lat2_rad = to.latitude * DEG_TO_RAD;
    let delta_lat = (to.latitude - from.latitude) * DEG_TO_RAD;
    let delta_lon = (to.longitude - from.longitude) * DEG_TO_RAD;

    let a = (delta_lat / 2.0).sin().powi(2)
        + lat1_rad.cos() * lat2_rad.cos() * (delta_lon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_M * c
}

/// Normalize a bearing into `[0, 360)`.
#[inline]
pub fn normalize_bearing(bearing_deg: f64) -> f64 {
    let b = bearing_deg.rem_euclid(360.0);
    // rem_euclid can round up to exactly 360.0 for tiny negative inputs
    if b >= 360.0 {
        0.0
    } else {
        b
    }
}

#[inline]
fn normalize_longitude(lon: f64) -> f64 {
    if lon > 180.0 {
        lon - 360.0
    } else if lon < -180.0 {
        lon + 360.0
    } else {
        lon
    }
}
