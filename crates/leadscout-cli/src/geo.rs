const EARTH_RADIUS_KM: f64 = 6371.0;

/// Moves a lat/lng point `distance_km` along `bearing_deg` on a great
/// circle. North is 0°, east 90°.
pub fn move_center(lat: f64, lng: f64, distance_km: f64, bearing_deg: f64) -> (f64, f64) {
    let lat_rad = lat.to_radians();
    let lng_rad = lng.to_radians();
    let bearing_rad = bearing_deg.to_radians();
    let angular = distance_km / EARTH_RADIUS_KM;

    let new_lat_sin =
        lat_rad.sin() * angular.cos() + lat_rad.cos() * angular.sin() * bearing_rad.cos();
    let new_lat = new_lat_sin.atan2((1.0 - new_lat_sin * new_lat_sin).sqrt());

    let new_lng = lng_rad
        + (bearing_rad.sin() * angular.sin() * lat_rad.cos())
            .atan2(angular.cos() - lat_rad.sin() * new_lat.sin());

    (new_lat.to_degrees(), new_lng.to_degrees())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_distance_is_a_noop() {
        let (lat, lng) = move_center(35.4676, -97.5164, 0.0, 180.0);
        assert!((lat - 35.4676).abs() < 1e-9);
        assert!((lng - -97.5164).abs() < 1e-9);
    }

    #[test]
    fn one_degree_of_latitude_is_about_111_km() {
        let (lat, lng) = move_center(0.0, 0.0, 111.19, 0.0);
        assert!((lat - 1.0).abs() < 0.01, "lat was {lat}");
        assert!(lng.abs() < 1e-9, "lng was {lng}");
    }

    #[test]
    fn south_bearing_decreases_latitude() {
        let (lat, _) = move_center(35.0, -97.0, 10.0, 180.0);
        assert!(lat < 35.0);
    }
}
