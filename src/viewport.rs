use crate::error::{Error, Result};
use crate::mercator::{project, unproject, TILE_SIZE};
use log::warn;
use serde::{Deserialize, Serialize};

/// Lowest zoom level the estimator returns
pub const MIN_ZOOM: f64 = 1.0;

/// Highest zoom level the estimator returns
pub const MAX_ZOOM: f64 = 20.0;

/// Zoom used when fitting a single point (or several coincident points)
pub const SINGLE_POINT_ZOOM: f64 = 14.0;

/// Each visible-window edge sits `delta / VISIBLE_MARGIN_DIVISOR` away from the center
pub const VISIBLE_MARGIN_DIVISOR: f64 = 1.8;

/// A geographic coordinate in degrees
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    /// Latitude in degrees
    pub latitude: f64,

    /// Longitude in degrees
    pub longitude: f64,
}

impl LatLng {
    /// Create a new coordinate from latitude and longitude in degrees.
    pub fn new(latitude: f64, longitude: f64) -> Self {
        LatLng {
            latitude,
            longitude,
        }
    }
}

/// The visible map window: a center and an angular span on both axes
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Viewport {
    /// Center latitude in degrees
    pub latitude: f64,

    /// Center longitude in degrees
    pub longitude: f64,

    /// Visible latitude span in degrees
    pub latitude_delta: f64,

    /// Visible longitude span in degrees
    pub longitude_delta: f64,
}

/// An axis-aligned geographic rectangle
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    /// Southern edge latitude
    pub south: f64,

    /// Western edge longitude
    pub west: f64,

    /// Northern edge latitude
    pub north: f64,

    /// Eastern edge longitude
    pub east: f64,
}

impl Bounds {
    /// Check whether a coordinate lies inside the rectangle, edges included.
    pub fn contains(&self, lat: f64, lng: f64) -> bool {
        lat >= self.south && lat <= self.north && lng >= self.west && lng <= self.east
    }
}

/// Pixel margins kept free around fitted content
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct EdgePadding {
    /// Top margin in pixels
    pub top: f64,

    /// Right margin in pixels
    pub right: f64,

    /// Bottom margin in pixels
    pub bottom: f64,

    /// Left margin in pixels
    pub left: f64,
}

impl EdgePadding {
    /// The same margin on every side.
    pub fn uniform(px: f64) -> Self {
        EdgePadding {
            top: px,
            right: px,
            bottom: px,
            left: px,
        }
    }
}

impl Default for EdgePadding {
    fn default() -> Self {
        EdgePadding::uniform(60.0)
    }
}

/// Size of the map surface in pixels
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScreenSize {
    /// Width in pixels
    pub width: f64,

    /// Height in pixels
    pub height: f64,
}

impl Viewport {
    /// Create a viewport from its center and spans.
    pub fn new(latitude: f64, longitude: f64, latitude_delta: f64, longitude_delta: f64) -> Self {
        Viewport {
            latitude,
            longitude,
            latitude_delta,
            longitude_delta,
        }
    }

    /// Center of the viewport.
    pub fn center(&self) -> LatLng {
        LatLng::new(self.latitude, self.longitude)
    }

    /// The exact rectangle spanned by the deltas around the center.
    pub fn bounds(&self) -> Bounds {
        self.bounds_with_divisor(2.0)
    }

    /// The rectangle used to pick which points are drawn.
    ///
    /// Slightly wider than [`Viewport::bounds`] so markers right at the screen
    /// edge do not pop in and out while panning.
    pub fn loose_bounds(&self) -> Bounds {
        self.bounds_with_divisor(VISIBLE_MARGIN_DIVISOR)
    }

    fn bounds_with_divisor(&self, divisor: f64) -> Bounds {
        let half_lat = self.latitude_delta / divisor;
        let half_lng = self.longitude_delta / divisor;

        Bounds {
            south: self.latitude - half_lat,
            west: self.longitude - half_lng,
            north: self.latitude + half_lat,
            east: self.longitude + half_lng,
        }
    }

    /// Estimated zoom level, see [`estimate_zoom`].
    pub fn zoom(&self) -> f64 {
        estimate_zoom(self)
    }

    /// Reject viewports with a non-finite center or non-positive spans.
    pub fn validate(&self) -> Result<()> {
        let checks = [
            ("viewport latitude", self.latitude, self.latitude.is_finite()),
            ("viewport longitude", self.longitude, self.longitude.is_finite()),
            (
                "latitude delta",
                self.latitude_delta,
                self.latitude_delta.is_finite() && self.latitude_delta > 0.0,
            ),
            (
                "longitude delta",
                self.longitude_delta,
                self.longitude_delta.is_finite() && self.longitude_delta > 0.0,
            ),
        ];

        match checks.iter().find(|(_, _, ok)| !ok) {
            Some((name, value, _)) => Err(Error::InvalidArgument {
                name: *name,
                value: *value,
            }),
            None => Ok(()),
        }
    }

    /// Viewport centered on `center` showing a screen of the given size at `zoom`.
    ///
    /// # Arguments
    ///
    /// - `center`: The coordinate at the middle of the screen.
    /// - `zoom`: The zoom level.
    /// - `screen`: The size of the map surface in pixels.
    ///
    /// # Returns
    ///
    /// A viewport whose deltas cover exactly the screen.
    pub fn around(center: LatLng, zoom: f64, screen: ScreenSize) -> Self {
        let scale = zoom.exp2();
        let longitude_delta = 360.0 * screen.width / (TILE_SIZE * scale);

        let c = project(center.latitude, center.longitude, 0.0);
        let half_height = screen.height / 2.0 / scale;
        let (north, _) = unproject(c.x, c.y - half_height, 0.0);
        let (south, _) = unproject(c.x, c.y + half_height, 0.0);

        Viewport::new(center.latitude, center.longitude, north - south, longitude_delta)
    }
}

/// Estimate the zoom level shown by a viewport, clamped between [`MIN_ZOOM`] and [`MAX_ZOOM`].
///
/// Uses `log2(360 / longitude_delta)`. A non-positive or NaN delta is treated as an
/// infinitely small span and yields the maximum zoom.
pub fn estimate_zoom(viewport: &Viewport) -> f64 {
    estimate_zoom_within(viewport, MIN_ZOOM, MAX_ZOOM)
}

/// Same as [`estimate_zoom`] with caller-chosen bounds.
///
/// # Arguments
///
/// - `viewport`: The visible map window.
/// - `min_zoom`: Lowest zoom to return.
/// - `max_zoom`: Highest zoom to return.
///
/// # Returns
///
/// The estimated zoom level within `[min_zoom, max_zoom]`. A non-finite bound is
/// replaced by [`MIN_ZOOM`] or [`MAX_ZOOM`] and inverted bounds are swapped, so
/// this never panics.
pub fn estimate_zoom_within(viewport: &Viewport, min_zoom: f64, max_zoom: f64) -> f64 {
    let (min_zoom, max_zoom) = zoom_bounds(min_zoom, max_zoom);
    let delta = viewport.longitude_delta;

    if delta.is_nan() || delta <= 0.0 {
        warn!("degenerate longitude delta {delta}, using zoom {max_zoom}");
        return max_zoom;
    }

    (360.0 / delta).log2().clamp(min_zoom, max_zoom)
}

fn zoom_bounds(min_zoom: f64, max_zoom: f64) -> (f64, f64) {
    let min_zoom = if min_zoom.is_finite() { min_zoom } else { MIN_ZOOM };
    let max_zoom = if max_zoom.is_finite() { max_zoom } else { MAX_ZOOM };

    if min_zoom <= max_zoom {
        (min_zoom, max_zoom)
    } else {
        warn!("zoom bounds {min_zoom} > {max_zoom}, swapping");
        (max_zoom, min_zoom)
    }
}

/// Viewport one step closer: same center, both deltas halved.
pub fn next_zoom_region(viewport: &Viewport) -> Viewport {
    Viewport {
        latitude_delta: viewport.latitude_delta * 0.5,
        longitude_delta: viewport.longitude_delta * 0.5,
        ..*viewport
    }
}

/// Compute a viewport that shows every given point inside the padded screen.
///
/// # Arguments
///
/// - `points`: Coordinates to fit.
/// - `padding`: Pixel margins kept free on each side.
/// - `screen`: Size of the map surface in pixels.
///
/// # Returns
///
/// `None` when `points` is empty. A single point, or several coincident ones, get a
/// viewport at [`SINGLE_POINT_ZOOM`] centered on them.
pub fn fit_to_points(points: &[LatLng], padding: EdgePadding, screen: ScreenSize) -> Option<Viewport> {
    let first = points.first()?;

    let mut min_x = f64::INFINITY;
    let mut min_y = f64::INFINITY;
    let mut max_x = f64::NEG_INFINITY;
    let mut max_y = f64::NEG_INFINITY;

    for point in points {
        let p = project(point.latitude, point.longitude, 0.0);

        min_x = min_x.min(p.x);
        min_y = min_y.min(p.y);
        max_x = max_x.max(p.x);
        max_y = max_y.max(p.y);
    }

    let width = max_x - min_x;
    let height = max_y - min_y;

    if width <= 0.0 && height <= 0.0 {
        return Some(Viewport::around(*first, SINGLE_POINT_ZOOM, screen));
    }

    let available_width = (screen.width - padding.left - padding.right).max(1.0);
    let available_height = (screen.height - padding.top - padding.bottom).max(1.0);

    let zoom_x = if width > 0.0 {
        (available_width / width).log2()
    } else {
        f64::INFINITY
    };
    let zoom_y = if height > 0.0 {
        (available_height / height).log2()
    } else {
        f64::INFINITY
    };
    let zoom = zoom_x.min(zoom_y).clamp(MIN_ZOOM, MAX_ZOOM);

    // Shift the center so the box sits in the middle of the unpadded area
    let scale = zoom.exp2();
    let cx = (min_x + max_x) / 2.0 + (padding.right - padding.left) / 2.0 / scale;
    let cy = (min_y + max_y) / 2.0 + (padding.bottom - padding.top) / 2.0 / scale;
    let (latitude, longitude) = unproject(cx, cy, 0.0);

    Some(Viewport::around(LatLng::new(latitude, longitude), zoom, screen))
}
