//! Geographic helpers for coordinate validation and radius search.

/// Mean Earth radius in kilometers.
const EARTH_RADIUS_KM: f64 = 6371.0;

/// Kilometers per degree of latitude (and of longitude at the equator).
const KM_PER_DEGREE: f64 = 111.0;

/// Great-circle distance between two points in kilometers (haversine).
pub fn distance_km(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let d_lat = (lat2 - lat1).to_radians();
    let d_lon = (lon2 - lon1).to_radians();

    let a = (d_lat / 2.0).sin().powi(2)
        + lat1.to_radians().cos() * lat2.to_radians().cos() * (d_lon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().asin();

    EARTH_RADIUS_KM * c
}

/// Bounding box around a center point for a radius search, as
/// `(min_lat, max_lat, min_lon, max_lon)`.
///
/// The box is a coarse prefilter: it always contains the full circle, so
/// candidates still need an exact [`distance_km`] check.
pub fn bounding_box(latitude: f64, longitude: f64, radius_km: f64) -> (f64, f64, f64, f64) {
    let lat_offset = radius_km / KM_PER_DEGREE;
    // Longitude degrees shrink with latitude.
    let lon_offset = radius_km / (KM_PER_DEGREE * latitude.to_radians().cos());

    (
        latitude - lat_offset,
        latitude + lat_offset,
        longitude - lon_offset,
        longitude + lon_offset,
    )
}

/// Whether a point lies inside a rectangular area (bounds inclusive).
pub fn point_in_rectangle(
    lat: f64,
    lon: f64,
    north: f64,
    south: f64,
    east: f64,
    west: f64,
) -> bool {
    (south..=north).contains(&lat) && (west..=east).contains(&lon)
}

/// Whether the pair is a valid WGS84 coordinate.
pub fn valid_coordinates(latitude: f64, longitude: f64) -> bool {
    (-90.0..=90.0).contains(&latitude) && (-180.0..=180.0).contains(&longitude)
}
