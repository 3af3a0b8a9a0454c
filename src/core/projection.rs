//! Web Mercator projections between geographic degrees and a normalized plane.
//!
//! Two variants are provided. [`Epsg3857`] maps the world onto `[-1,1]×[-1,1]`
//! and is the convention used by the viewport, tile math and navigator.
//! [`WebMercator`] maps onto `[0,1]×[0,1]` and exists for collaborators that
//! speak the classic slippy-map unit square. In both, `y` grows southward so
//! that screen-down, tile rows and projected `y` all point the same way.
//! Callers must not mix the two.

use crate::core::constants::{LATITUDE_MAX, LATITUDE_MIN, LONGITUDE_MAX, LONGITUDE_MIN};
use std::f64::consts::PI;

/// Conversion between degrees and a normalized projected plane
pub trait Projection: Send + Sync {
    fn longitude_to_x(&self, longitude: f64) -> f64;

    fn latitude_to_y(&self, latitude: f64) -> f64;

    fn x_to_longitude(&self, x: f64) -> f64;

    fn y_to_latitude(&self, y: f64) -> f64;

    /// Clamps a latitude to the range where the projection stays finite
    fn limit_latitude(&self, latitude: f64) -> f64 {
        latitude.clamp(LATITUDE_MIN, LATITUDE_MAX)
    }

    fn limit_longitude(&self, longitude: f64) -> f64 {
        longitude.clamp(LONGITUDE_MIN, LONGITUDE_MAX)
    }
}

/// `[-1,1]` normalized spherical mercator
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Epsg3857;

impl Projection for Epsg3857 {
    fn longitude_to_x(&self, longitude: f64) -> f64 {
        self.limit_longitude(longitude) / LONGITUDE_MAX
    }

    fn latitude_to_y(&self, latitude: f64) -> f64 {
        let sin_latitude = self.limit_latitude(latitude).to_radians().sin();
        let y = -((1.0 + sin_latitude) / (1.0 - sin_latitude)).ln() / (2.0 * PI);
        y.clamp(-1.0, 1.0)
    }

    fn x_to_longitude(&self, x: f64) -> f64 {
        LONGITUDE_MAX * x.clamp(-1.0, 1.0)
    }

    fn y_to_latitude(&self, y: f64) -> f64 {
        90.0 - 360.0 * (y.clamp(-1.0, 1.0) * PI).exp().atan() / PI
    }
}

/// `[0,1]` unit-square spherical mercator
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WebMercator;

impl Projection for WebMercator {
    fn longitude_to_x(&self, longitude: f64) -> f64 {
        (self.limit_longitude(longitude) + 180.0) / 360.0
    }

    fn latitude_to_y(&self, latitude: f64) -> f64 {
        let sin_latitude = self.limit_latitude(latitude).to_radians().sin();
        let y = 0.5 - ((1.0 + sin_latitude) / (1.0 - sin_latitude)).ln() / (4.0 * PI);
        y.clamp(0.0, 1.0)
    }

    fn x_to_longitude(&self, x: f64) -> f64 {
        360.0 * (x.clamp(0.0, 1.0) - 0.5)
    }

    fn y_to_latitude(&self, y: f64) -> f64 {
        90.0 - 360.0 * ((y.clamp(0.0, 1.0) - 0.5) * 2.0 * PI).exp().atan() / PI
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f64 = 1e-9;

    #[test]
    fn test_epsg3857_extremes() {
        let projection = Epsg3857;
        assert!((projection.longitude_to_x(-180.0) + 1.0).abs() < EPSILON);
        assert!((projection.longitude_to_x(180.0) - 1.0).abs() < EPSILON);
        assert!((projection.latitude_to_y(LATITUDE_MAX) + 1.0).abs() < 1e-6);
        assert!((projection.latitude_to_y(LATITUDE_MIN) - 1.0).abs() < 1e-6);
        assert!(projection.latitude_to_y(0.0).abs() < EPSILON);
    }

    #[test]
    fn test_north_is_negative_y() {
        assert!(Epsg3857.latitude_to_y(45.0) < 0.0);
        assert!(WebMercator.latitude_to_y(45.0) < 0.5);
    }

    #[test]
    fn test_inverse_functions() {
        for projection in [&Epsg3857 as &dyn Projection, &WebMercator] {
            for latitude in [-80.0, -45.5, -1.0, 0.0, 12.25, 60.0, 85.0] {
                let y = projection.latitude_to_y(latitude);
                assert!((projection.y_to_latitude(y) - latitude).abs() < 1e-9);
            }
            for longitude in [-180.0, -90.0, 0.0, 33.3, 179.9] {
                let x = projection.longitude_to_x(longitude);
                assert!((projection.x_to_longitude(x) - longitude).abs() < 1e-9);
            }
        }
    }

    #[test]
    fn test_out_of_range_inputs_are_clamped() {
        assert_eq!(Epsg3857.longitude_to_x(500.0), 1.0);
        assert_eq!(Epsg3857.limit_latitude(90.0), LATITUDE_MAX);
        assert!(Epsg3857.latitude_to_y(90.0).is_finite());
        assert!((WebMercator.latitude_to_y(-90.0) - 1.0).abs() < 1e-9);
    }
}
