//! Great-circle geometry over (latitude, longitude) pairs in degrees.

/// Earth radius in miles, as used by the CHM project data.
pub const EARTH_RADIUS_MILES: f64 = 3963.1;

/// Multiplier applied to straight great-circle distances to account for
/// unplotted curves in route data.
pub const CURVE_FACTOR: f64 = 1.02112;

/// Distance in miles between two points, spherical law of cosines,
/// scaled by [`CURVE_FACTOR`].
pub fn distance_miles(lat1: f64, lng1: f64, lat2: f64, lng2: f64) -> f64 {
    let rlat1 = lat1.to_radians();
    let rlng1 = lng1.to_radians();
    let rlat2 = lat2.to_radians();
    let rlng2 = lng2.to_radians();

    let cosine = rlat1.cos() * rlng1.cos() * rlat2.cos() * rlng2.cos()
        + rlat1.cos() * rlng1.sin() * rlat2.cos() * rlng2.sin()
        + rlat1.sin() * rlat2.sin();
    // clamp guards acos against rounding when the points coincide
    cosine.clamp(-1.0, 1.0).acos() * EARTH_RADIUS_MILES * CURVE_FACTOR
}

/// Exterior bend in degrees at `mid` formed by the line from `pred` to `mid`
/// and the line from `mid` to `succ`.
///
/// All three points are converted to unit 3-vectors; the angle is between the
/// chord vectors (succ - mid) and (mid - pred). Undefined (NaN) when `mid`
/// coincides with either neighbor; callers must test for colocation first.
pub fn angle_degrees(
    pred: (f64, f64),
    mid: (f64, f64),
    succ: (f64, f64),
) -> f64 {
    let (x0, y0, z0) = unit_vector(pred);
    let (x1, y1, z1) = unit_vector(mid);
    let (x2, y2, z2) = unit_vector(succ);

    let dot = (x2 - x1) * (x1 - x0) + (y2 - y1) * (y1 - y0) + (z2 - z1) * (z1 - z0);
    let norms = ((x2 - x1).powi(2) + (y2 - y1).powi(2) + (z2 - z1).powi(2))
        * ((x1 - x0).powi(2) + (y1 - y0).powi(2) + (z1 - z0).powi(2));

    (dot / norms.sqrt()).clamp(-1.0, 1.0).acos().to_degrees()
}

fn unit_vector((lat, lng): (f64, f64)) -> (f64, f64, f64) {
    let rlat = lat.to_radians();
    let rlng = lng.to_radians();
    (rlng.cos() * rlat.cos(), rlng.sin() * rlat.cos(), rlat.sin())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn distance_is_zero_for_identical_points() {
        assert_eq!(distance_miles(42.81, -73.95, 42.81, -73.95), 0.0);
    }

    #[test]
    fn distance_is_symmetric() {
        let d1 = distance_miles(40.0, -75.0, 40.1, -75.1);
        let d2 = distance_miles(40.1, -75.1, 40.0, -75.0);
        assert!((d1 - d2).abs() < 1e-12);
        assert!(d1 > 0.0);
    }

    #[test]
    fn one_degree_of_latitude_is_about_seventy_miles() {
        let d = distance_miles(40.0, -75.0, 41.0, -75.0);
        // 69.17 miles per degree of latitude, times the curve factor
        assert!((d - 69.17 * CURVE_FACTOR).abs() < 0.5, "got {d}");
    }

    #[test]
    fn angle_is_symmetric_in_endpoints() {
        let p = (40.0, -75.0);
        let m = (40.1, -75.05);
        let s = (40.2, -75.2);
        let a1 = angle_degrees(p, m, s);
        let a2 = angle_degrees(s, m, p);
        assert!((a1 - a2).abs() < 1e-9, "{a1} vs {a2}");
    }

    #[test]
    fn straight_line_has_no_bend() {
        let a = angle_degrees((40.0, -75.0), (40.1, -75.0), (40.2, -75.0));
        assert!(a < 0.01, "got {a}");
    }

    #[test]
    fn doubling_back_is_a_sharp_angle() {
        let a = angle_degrees((40.0, -75.0), (40.1, -75.0), (40.0, -75.0001));
        assert!(a > 135.0, "got {a}");
    }
}
