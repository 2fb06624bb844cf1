//! Great-circle helpers on WGS84-ish coordinates.
//!
//! The sphere model is good enough for pacing and heading; no ellipsoid
//! corrections are applied.

use super::types::Coordinate;

/// Mean Earth radius in meters.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Haversine distance in meters between two coordinates.
///
/// The haversine term is clamped into [0, 1] before `asin` so rounding
/// overshoot near equal or antipodal points cannot produce NaN.
pub fn distance_meters(a: &Coordinate, b: &Coordinate) -> f64 {
    let phi1 = a.lat.to_radians();
    let phi2 = b.lat.to_radians();
    let d_phi = (b.lat - a.lat).to_radians();
    let d_lambda = (b.lng - a.lng).to_radians();

    let h = (d_phi / 2.0).sin().powi(2) + phi1.cos() * phi2.cos() * (d_lambda / 2.0).sin().powi(2);
    let h = h.clamp(0.0, 1.0);

    2.0 * EARTH_RADIUS_M * h.sqrt().asin()
}

/// Initial bearing from `a` to `b` in degrees, normalized to [0, 360).
///
/// Due north is 0, due east is 90.
pub fn bearing_degrees(a: &Coordinate, b: &Coordinate) -> f64 {
    let phi1 = a.lat.to_radians();
    let phi2 = b.lat.to_radians();
    let d_lambda = (b.lng - a.lng).to_radians();

    let y = d_lambda.sin() * phi2.cos();
    let x = phi1.cos() * phi2.sin() - phi1.sin() * phi2.cos() * d_lambda.cos();
    let theta = y.atan2(x).to_degrees();

    // `rem_euclid` can round up to exactly 360.0 for tiny negative angles.
    (theta + 360.0) % 360.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn c(lat: f64, lng: f64) -> Coordinate {
        Coordinate::new(lat, lng)
    }

    #[test]
    fn distance_of_coincident_points_is_zero() {
        for p in [c(0.0, 0.0), c(48.8566, 2.3522), c(-89.9, 179.9), c(90.0, -180.0)] {
            assert_eq!(distance_meters(&p, &p), 0.0);
        }
    }

    #[test]
    fn one_degree_of_latitude_is_about_111_km() {
        let d = distance_meters(&c(0.0, 0.0), &c(1.0, 0.0));
        assert!((d - 111_195.0).abs() < 10.0, "got {d}");
    }

    #[test]
    fn antipodal_distance_is_half_circumference_and_finite() {
        let d = distance_meters(&c(0.0, 0.0), &c(0.0, 180.0));
        assert!(d.is_finite());
        assert!((d - std::f64::consts::PI * EARTH_RADIUS_M).abs() < 1.0);

        let d = distance_meters(&c(90.0, 0.0), &c(-90.0, 0.0));
        assert!(d.is_finite());
    }

    #[test]
    fn cardinal_bearings() {
        let north = bearing_degrees(&c(0.0, 0.0), &c(1.0, 0.0));
        assert!(north < 1e-9 || north > 360.0 - 1e-9, "north bearing {north}");

        let east = bearing_degrees(&c(0.0, 0.0), &c(0.0, 1.0));
        assert!((east - 90.0).abs() < 1e-9);

        let south = bearing_degrees(&c(1.0, 0.0), &c(0.0, 0.0));
        assert!((south - 180.0).abs() < 1e-9);

        let west = bearing_degrees(&c(0.0, 1.0), &c(0.0, 0.0));
        assert!((west - 270.0).abs() < 1e-9);
    }

    #[test]
    fn bearing_stays_in_range() {
        let points = [
            c(0.0, 0.0),
            c(0.0, -1e-12),
            c(-1e-12, 0.0),
            c(45.0, 45.0),
            c(-45.0, 170.0),
            c(89.999, -179.999),
            c(-89.999, 179.999),
            c(12.5, -0.0001),
        ];
        for a in &points {
            for b in &points {
                let bearing = bearing_degrees(a, b);
                assert!((0.0..360.0).contains(&bearing), "{a:?} -> {b:?} gave {bearing}");
            }
        }
    }
}
