use crate::data_models::LatLng;

pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Great-circle distance in kilometers (haversine).
pub fn distance_km(a: LatLng, b: LatLng) -> f64 {
    let d_lat = (b.lat - a.lat).to_radians();
    let d_lng = (b.lng - a.lng).to_radians();
    let lat1 = a.lat.to_radians();
    let lat2 = b.lat.to_radians();

    let sin_d_lat = (d_lat / 2.0).sin();
    let sin_d_lng = (d_lng / 2.0).sin();
    // rounding can push x a hair past 1 for antipodal points
    let x = (sin_d_lat * sin_d_lat + lat1.cos() * lat2.cos() * sin_d_lng * sin_d_lng).clamp(0.0, 1.0);
    let c = 2.0 * x.sqrt().atan2((1.0 - x).sqrt());
    EARTH_RADIUS_KM * c
}
