//! Great-circle distance between two coordinates.
//!
//! Haversine over a spherical Earth. Deterministic and pure; the only
//! failure mode is an invalid coordinate (non-finite or out of range),
//! which fails fast rather than silently returning 0.

use serde::{Deserialize, Serialize};

/// Mean Earth radius in meters.
pub const EARTH_RADIUS_METERS: f64 = 6_371_000.0;

/// A WGS84 latitude/longitude pair in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub lat: f64,
    pub lng: f64,
}

/// An out-of-range or non-finite coordinate.
#[derive(Debug, thiserror::Error, PartialEq)]
#[error("Invalid coordinate: lat={lat}, lng={lng}")]
pub struct InvalidCoordinate {
    pub lat: f64,
    pub lng: f64,
}

impl Location {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Check that both components are finite and within range
    /// (|lat| <= 90, |lng| <= 180).
    pub fn validate(&self) -> Result<(), InvalidCoordinate> {
        let ok = self.lat.is_finite()
            && self.lng.is_finite()
            && self.lat.abs() <= 90.0
            && self.lng.abs() <= 180.0;
        if ok {
            Ok(())
        } else {
            Err(InvalidCoordinate {
                lat: self.lat,
                lng: self.lng,
            })
        }
    }
}

/// Haversine great-circle distance between `a` and `b`, in meters.
pub fn distance_meters(a: Location, b: Location) -> Result<f64, InvalidCoordinate> {
    a.validate()?;
    b.validate()?;

    let d_lat = (b.lat - a.lat).to_radians();
    let d_lng = (b.lng - a.lng).to_radians();
    let sin_lat = (d_lat / 2.0).sin();
    let sin_lng = (d_lng / 2.0).sin();

    let h = sin_lat * sin_lat
        + a.lat.to_radians().cos() * b.lat.to_radians().cos() * sin_lng * sin_lng;

    Ok(EARTH_RADIUS_METERS * 2.0 * h.sqrt().atan2((1.0 - h).sqrt()))
}

/// Whether `user` is within `threshold_meters` of `target`.
pub fn is_within_proximity(
    user: Location,
    target: Location,
    threshold_meters: f64,
) -> Result<bool, InvalidCoordinate> {
    Ok(distance_meters(user, target)? <= threshold_meters)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_distance_for_identical_points() {
        let p = Location::new(52.5200, 13.4050);
        assert_eq!(distance_meters(p, p).unwrap(), 0.0);
    }

    #[test]
    fn test_known_city_pair_distance() {
        // Berlin -> Paris is roughly 878 km great-circle.
        let berlin = Location::new(52.5200, 13.4050);
        let paris = Location::new(48.8566, 2.3522);
        let d = distance_meters(berlin, paris).unwrap();
        assert!((d - 878_000.0).abs() < 5_000.0, "got {d}");
    }

    #[test]
    fn test_one_degree_latitude_is_about_111km() {
        let a = Location::new(0.0, 0.0);
        let b = Location::new(1.0, 0.0);
        let d = distance_meters(a, b).unwrap();
        assert!((d - 111_195.0).abs() < 100.0, "got {d}");
    }

    #[test]
    fn test_short_distance_precision() {
        // ~200m north of the origin point.
        let a = Location::new(40.0, -74.0);
        let b = Location::new(40.0 + 200.0 / 111_195.0, -74.0);
        let d = distance_meters(a, b).unwrap();
        assert!((d - 200.0).abs() < 1.0, "got {d}");
    }

    #[test]
    fn test_symmetry() {
        let a = Location::new(40.7128, -74.0060);
        let b = Location::new(40.7138, -74.0050);
        assert!(
            (distance_meters(a, b).unwrap() - distance_meters(b, a).unwrap()).abs() < 1e-9
        );
    }

    #[test]
    fn test_nan_coordinate_fails_fast() {
        let a = Location::new(f64::NAN, 0.0);
        let b = Location::new(0.0, 0.0);
        assert!(distance_meters(a, b).is_err());
        assert!(distance_meters(b, a).is_err());
    }

    #[test]
    fn test_out_of_range_coordinate_fails_fast() {
        let bad_lat = Location::new(91.0, 0.0);
        let bad_lng = Location::new(0.0, 180.5);
        let ok = Location::new(0.0, 0.0);
        assert!(distance_meters(bad_lat, ok).is_err());
        assert!(distance_meters(ok, bad_lng).is_err());
    }

    #[test]
    fn test_antimeridian_boundary_is_valid() {
        let a = Location::new(0.0, 180.0);
        let b = Location::new(0.0, -180.0);
        let d = distance_meters(a, b).unwrap();
        assert!(d < 1.0, "got {d}");
    }

    #[test]
    fn test_proximity_threshold() {
        let a = Location::new(40.0, -74.0);
        let near = Location::new(40.0 + 180.0 / 111_195.0, -74.0);
        let far = Location::new(40.0 + 350.0 / 111_195.0, -74.0);
        assert!(is_within_proximity(near, a, 200.0).unwrap());
        assert!(!is_within_proximity(far, a, 200.0).unwrap());
    }
}
