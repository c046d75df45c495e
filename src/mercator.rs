use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Edge length of a single tile at zoom 0, in pixels.
pub const TILE_SIZE: f64 = 256.0;

/// Highest latitude representable in Web Mercator; inputs beyond it are clamped.
pub const MAX_LATITUDE: f64 = 85.05112877980659;

/// A position in continuous world pixel space at a specific zoom level.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ProjectedPoint {
    /// Horizontal pixel offset from the antimeridian, growing eastwards.
    pub x: f64,

    /// Vertical pixel offset from the northern Mercator edge, growing southwards.
    pub y: f64,
}

/// Size of the whole world in pixels at the given (possibly fractional) zoom level.
///
/// # Arguments
///
/// - `zoom`: The zoom level.
///
/// # Returns
///
/// The width (and height) of the projected world in pixels.
pub fn world_size(zoom: f64) -> f64 {
    TILE_SIZE * zoom.exp2()
}

/// Project geographic coordinates to world pixel coordinates.
///
/// Latitude is clamped to [`MAX_LATITUDE`] so the result stays finite near the poles.
/// NaN input propagates to the output.
///
/// # Arguments
///
/// - `lat`: Latitude in degrees.
/// - `lng`: Longitude in degrees.
/// - `zoom`: The zoom level to project at.
///
/// # Returns
///
/// The projected position in pixels.
pub fn project(lat: f64, lng: f64, zoom: f64) -> ProjectedPoint {
    let scale = world_size(zoom);

    ProjectedPoint {
        x: lng_x(lng) * scale,
        y: lat_y(lat) * scale,
    }
}

/// Convert world pixel coordinates back to geographic coordinates.
///
/// This is the inverse of [`project`] for the same zoom level.
///
/// # Arguments
///
/// - `x`: Horizontal world pixel coordinate.
/// - `y`: Vertical world pixel coordinate.
/// - `zoom`: The zoom level the coordinates were projected at.
///
/// # Returns
///
/// A `(lat, lng)` pair in degrees.
pub fn unproject(x: f64, y: f64, zoom: f64) -> (f64, f64) {
    let scale = world_size(zoom);

    (y_lat(y / scale), x_lng(x / scale))
}

/// Convert longitude to spherical mercator in the [0..1] range.
fn lng_x(lng: f64) -> f64 {
    (lng + 180.0) / 360.0
}

/// Convert latitude to spherical mercator in the [0..1] range.
fn lat_y(lat: f64) -> f64 {
    let sin = lat.clamp(-MAX_LATITUDE, MAX_LATITUDE).to_radians().sin();

    0.5 - ((1.0 + sin) / (1.0 - sin)).ln() / (4.0 * PI)
}

/// Convert spherical mercator to longitude.
fn x_lng(x: f64) -> f64 {
    x * 360.0 - 180.0
}

/// Convert spherical mercator to latitude.
fn y_lat(y: f64) -> f64 {
    let n = PI - 2.0 * PI * y;

    n.sinh().atan().to_degrees()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(actual: f64, expected: f64, tolerance: f64) {
        assert!(
            (actual - expected).abs() <= tolerance,
            "{actual} is not within {tolerance} of {expected}"
        );
    }

    #[test]
    fn test_world_size() {
        assert_eq!(world_size(0.0), 256.0);
        assert_eq!(world_size(1.0), 512.0);
        assert_eq!(world_size(10.0), 262144.0);
    }

    #[test]
    fn test_lng_x() {
        assert_eq!(lng_x(0.0), 0.5);
        assert_eq!(lng_x(180.0), 1.0);
        assert_eq!(lng_x(-180.0), 0.0);
        assert_eq!(lng_x(90.0), 0.75);
        assert_eq!(lng_x(-90.0), 0.25);
    }

    #[test]
    fn test_lat_y() {
        assert_eq!(lat_y(0.0), 0.5);
        assert_close(lat_y(45.0), 0.35972503691520497, 1e-12);
        assert_close(lat_y(-45.0), 0.640274963084795, 1e-12);
    }

    #[test]
    fn test_lat_y_clamps_poles() {
        assert!(lat_y(90.0).is_finite());
        assert!(lat_y(-90.0).is_finite());
        assert_close(lat_y(90.0), 0.0, 1e-9);
        assert_close(lat_y(-90.0), 1.0, 1e-9);
    }

    #[test]
    fn test_x_lng() {
        assert_eq!(x_lng(0.5), 0.0);
        assert_eq!(x_lng(1.0), 180.0);
        assert_eq!(x_lng(0.0), -180.0);
        assert_eq!(x_lng(0.75), 90.0);
        assert_eq!(x_lng(0.25), -90.0);
    }

    #[test]
    fn test_y_lat() {
        assert_eq!(y_lat(0.5), 0.0);
        assert_close(y_lat(0.875), -79.17133464081944, 1e-9);
        assert_close(y_lat(0.125), 79.17133464081945, 1e-9);
    }

    #[test]
    fn test_project_origin() {
        let p = project(0.0, 0.0, 0.0);

        assert_eq!(p, ProjectedPoint { x: 128.0, y: 128.0 });
    }

    #[test]
    fn test_project_scales_with_zoom() {
        let low = project(41.3874, 2.1686, 3.0);
        let high = project(41.3874, 2.1686, 4.0);

        assert_close(high.x, low.x * 2.0, 1e-9);
        assert_close(high.y, low.y * 2.0, 1e-9);
    }

    #[test]
    fn test_unproject_inverts_project() {
        let zoom = 12.5;
        let p = project(41.3874, 2.1686, zoom);
        let (lat, lng) = unproject(p.x, p.y, zoom);

        assert_close(lat, 41.3874, 1e-9);
        assert_close(lng, 2.1686, 1e-9);
    }

    #[test]
    fn test_nan_propagates() {
        let p = project(f64::NAN, 0.0, 3.0);

        assert!(p.y.is_nan());
        assert!(!p.x.is_nan());
    }
}
