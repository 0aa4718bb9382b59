//! Geographic primitives
//!
//! Only the math the animation system needs: linear interpolation between
//! coordinates, great-circle segment length, and initial bearing. Projection
//! to screen space belongs to the host map.

use serde::{Deserialize, Serialize};

/// Mean earth radius in meters
pub const EARTH_RADIUS_M: f64 = 6_371_008.8;

/// A longitude / latitude pair in degrees
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 2]", into = "[f64; 2]")]
pub struct LngLat {
    pub lng: f64,
    pub lat: f64,
}

impl LngLat {
    pub const fn new(lng: f64, lat: f64) -> Self {
        Self { lng, lat }
    }

    /// Component-wise linear interpolation
    pub fn lerp(&self, other: &LngLat, t: f64) -> LngLat {
        LngLat {
            lng: self.lng + (other.lng - self.lng) * t,
            lat: self.lat + (other.lat - self.lat) * t,
        }
    }

    /// Great-circle (haversine) distance in meters
    pub fn distance_to(&self, other: &LngLat) -> f64 {
        let lat1 = self.lat.to_radians();
        let lat2 = other.lat.to_radians();
        let dlat = lat2 - lat1;
        let dlng = (other.lng - self.lng).to_radians();

        let a = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlng / 2.0).sin().powi(2);
        2.0 * EARTH_RADIUS_M * a.sqrt().atan2((1.0 - a).sqrt())
    }

    /// Initial bearing towards `other`, degrees clockwise from north in [0, 360)
    pub fn bearing_to(&self, other: &LngLat) -> f64 {
        let lat1 = self.lat.to_radians();
        let lat2 = other.lat.to_radians();
        let dlng = (other.lng - self.lng).to_radians();

        let y = dlng.sin() * lat2.cos();
        let x = lat1.cos() * lat2.sin() - lat1.sin() * lat2.cos() * dlng.cos();
        normalize_degrees(y.atan2(x).to_degrees())
    }
}

impl From<[f64; 2]> for LngLat {
    fn from(value: [f64; 2]) -> Self {
        Self::new(value[0], value[1])
    }
}

impl From<LngLat> for [f64; 2] {
    fn from(value: LngLat) -> Self {
        [value.lng, value.lat]
    }
}

/// Wrap an angle into [0, 360)
pub fn normalize_degrees(degrees: f64) -> f64 {
    let wrapped = degrees.rem_euclid(360.0);
    // rem_euclid can round up to exactly 360 for tiny negative inputs
    if wrapped >= 360.0 {
        0.0
    } else {
        wrapped
    }
}

/// Signed shortest rotation from `from` to `to`, in (-180, 180]
pub fn angle_delta(from: f64, to: f64) -> f64 {
    let delta = (to - from).rem_euclid(360.0);
    if delta > 180.0 {
        delta - 360.0
    } else {
        delta
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bearing_cardinal_directions() {
        let origin = LngLat::new(0.0, 0.0);
        assert!((origin.bearing_to(&LngLat::new(0.0, 1.0)) - 0.0).abs() < 1e-9);
        assert!((origin.bearing_to(&LngLat::new(1.0, 0.0)) - 90.0).abs() < 1e-9);
        assert!((origin.bearing_to(&LngLat::new(0.0, -1.0)) - 180.0).abs() < 1e-9);
        assert!((origin.bearing_to(&LngLat::new(-1.0, 0.0)) - 270.0).abs() < 1e-9);
    }

    #[test]
    fn test_distance_one_degree_latitude() {
        let a = LngLat::new(116.0, 39.0);
        let b = LngLat::new(116.0, 40.0);
        // ~111.2 km per degree of latitude
        assert!((a.distance_to(&b) - 111_195.0).abs() < 100.0);
        assert_eq!(a.distance_to(&a), 0.0);
    }

    #[test]
    fn test_angle_delta_takes_short_way() {
        assert_eq!(angle_delta(350.0, 10.0), 20.0);
        assert_eq!(angle_delta(10.0, 350.0), -20.0);
        assert_eq!(angle_delta(0.0, 180.0), 180.0);
        assert_eq!(normalize_degrees(-90.0), 270.0);
        assert_eq!(normalize_degrees(720.0), 0.0);
    }

    #[test]
    fn test_lnglat_serde_as_pair() {
        let p: LngLat = serde_json::from_str("[116.4, 39.9]").unwrap();
        assert_eq!(p, LngLat::new(116.4, 39.9));
        assert_eq!(serde_json::to_string(&p).unwrap(), "[116.4,39.9]");
    }
}
