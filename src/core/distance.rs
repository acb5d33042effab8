use crate::models::Coordinates;

/// Earth's radius in miles
const EARTH_RADIUS_MILES: f64 = 3959.0;

/// Great-circle distance between two points in miles (Haversine)
///
/// # Arguments
/// * `lat1`, `lon1` - First point in degrees
/// * `lat2`, `lon2` - Second point in degrees
#[inline]
pub fn haversine_miles(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let lat1_rad = lat1.to_radians();
    let lat2_rad = lat2.to_radians();
    let delta_lat = (lat2 - lat1).to_radians();
    let delta_lon = (lon2 - lon1).to_radians();

    let a = (delta_lat / 2.0).sin().powi(2)
        + lat1_rad.cos() * lat2_rad.cos() * (delta_lon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_MILES * c
}

#[inline]
pub fn distance_between(from: Coordinates, to: Coordinates) -> f64 {
    haversine_miles(from.latitude, from.longitude, to.latitude, to.longitude)
}
