//! Grid-based clustering of map markers.
//!
//! Points are projected to Web Mercator pixels at the zoom level a viewport shows,
//! bucketed into square cells of a fixed pixel size, and every occupied cell becomes
//! either a single point or a cluster. Because the grid lives in pixel space, one cell
//! size works at every zoom: clusters split apart on their own as the user zooms in.
//!
//! ```
//! use gridcluster::{cluster, GeoPoint, RenderItem, Viewport};
//!
//! let points = vec![
//!     GeoPoint::new("a", 41.0, 2.0),
//!     GeoPoint::new("b", 41.0001, 2.0001),
//!     GeoPoint::new("c", 41.5, 2.5),
//! ];
//! let viewport = Viewport::new(41.2, 2.2, 0.5, 0.5);
//!
//! let items = cluster(&points, &viewport, 64.0);
//!
//! assert_eq!(items.len(), 2);
//! assert!(matches!(&items[0], RenderItem::Cluster(c) if c.count == 2));
//! ```
#![forbid(unsafe_code)]

mod error;
mod feature;
mod filter;
pub mod mercator;
mod point;
mod source;
mod viewport;

use log::{debug, trace, warn};
use mercator::{project, unproject, ProjectedPoint};
use serde::{Deserialize, Serialize};
use std::cmp::Reverse;
use std::collections::hash_map::{Entry, HashMap};

pub use error::{Error, Result};
pub use feature::{points_from_geojson, to_feature_collection, SHADOWED_PROPERTIES_KEY};
pub use filter::{visible_points, PointFilter, DEFAULT_VISIBLE_LIMIT};
pub use point::{Category, GeoPoint, Properties, RESERVED_KEYS};
pub use source::{MemorySource, PointSource};
pub use viewport::{
    estimate_zoom, estimate_zoom_within, fit_to_points, next_zoom_region, Bounds, EdgePadding,
    LatLng, ScreenSize, Viewport, MAX_ZOOM, MIN_ZOOM, SINGLE_POINT_ZOOM,
};

/// Default grid cell edge length in pixels
pub const DEFAULT_CELL_SIZE: f64 = 64.0;

/// Fraction of a cell added before flooring so projection rounding noise does not
/// push a point that sits exactly on a grid line into the previous cell
const CELL_SNAP: f64 = 1e-6;

/// Clusterer configuration options
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Options {
    /// Grid cell edge length in pixels
    pub cell_size: f64,

    /// Lowest zoom level the viewport estimate is clamped to
    pub min_zoom: f64,

    /// Highest zoom level the viewport estimate is clamped to
    pub max_zoom: f64,
}

impl Default for Options {
    fn default() -> Self {
        Options {
            cell_size: DEFAULT_CELL_SIZE,
            min_zoom: MIN_ZOOM,
            max_zoom: MAX_ZOOM,
        }
    }
}

impl Options {
    /// Check that the cell size is positive and the zoom bounds are finite and ordered.
    pub fn validate(&self) -> Result<()> {
        if !(self.cell_size.is_finite() && self.cell_size > 0.0) {
            return Err(Error::InvalidArgument {
                name: "cell size",
                value: self.cell_size,
            });
        }

        if !self.min_zoom.is_finite() {
            return Err(Error::InvalidArgument {
                name: "min zoom",
                value: self.min_zoom,
            });
        }

        if !self.max_zoom.is_finite() || self.max_zoom < self.min_zoom {
            return Err(Error::InvalidArgument {
                name: "max zoom",
                value: self.max_zoom,
            });
        }

        Ok(())
    }
}

/// Two or more points that share a grid cell
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ClusterItem {
    /// Identifier derived from the grid cell, `c:<cell x>:<cell y>`
    pub id: String,

    /// Centroid latitude in degrees
    pub lat: f64,

    /// Centroid longitude in degrees
    pub lng: f64,

    /// Number of member points, always equal to `members.len()`
    pub count: usize,

    /// Member points in input order
    #[serde(rename = "children")]
    pub members: Vec<GeoPoint>,
}

impl ClusterItem {
    /// Centroid of the cluster.
    pub fn position(&self) -> LatLng {
        LatLng::new(self.lat, self.lng)
    }

    /// Member count shortened for a badge: `950`, `1.5k`, `12k`.
    pub fn abbreviated_count(&self) -> String {
        let count = self.count as f64;

        if count >= 10000.0 {
            format!("{}k", (count / 1000.0).round())
        } else if count >= 1000.0 {
            format!("{}k", (count / 100.0).round() / 10.0)
        } else {
            self.count.to_string()
        }
    }

    /// Viewport to animate to when the cluster is tapped.
    ///
    /// Fits the member coordinates inside the padded screen.
    ///
    /// # Arguments
    ///
    /// - `padding`: Pixel margins kept free on each side.
    /// - `screen`: Size of the map surface in pixels.
    ///
    /// # Returns
    ///
    /// The viewport framing every member.
    pub fn expansion_viewport(&self, padding: EdgePadding, screen: ScreenSize) -> Viewport {
        let coordinates: Vec<LatLng> = self.members.iter().map(GeoPoint::position).collect();

        fit_to_points(&coordinates, padding, screen)
            .unwrap_or_else(|| Viewport::around(self.position(), SINGLE_POINT_ZOOM, screen))
    }
}

/// A marker to draw: either a cluster badge or a single point
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum RenderItem {
    /// Several points drawn as one badge
    Cluster(ClusterItem),

    /// A point alone in its cell, unchanged
    Point(GeoPoint),
}

impl RenderItem {
    /// Identifier of the cluster or the point.
    ///
    /// Cluster ids (`c:<x>:<y>`) and point ids share one namespace, so a point may
    /// carry an id that looks like a cluster's. Tell them apart with
    /// [`RenderItem::is_cluster`], the serialized `type` tag or the `cluster`
    /// GeoJSON property.
    pub fn id(&self) -> &str {
        match self {
            RenderItem::Cluster(cluster) => &cluster.id,
            RenderItem::Point(point) => &point.id,
        }
    }

    /// Whether this item is a cluster.
    pub fn is_cluster(&self) -> bool {
        matches!(self, RenderItem::Cluster(_))
    }

    /// Number of input points the item stands for.
    pub fn count(&self) -> usize {
        match self {
            RenderItem::Cluster(cluster) => cluster.count,
            RenderItem::Point(_) => 1,
        }
    }

    /// Where the marker is drawn.
    pub fn position(&self) -> LatLng {
        match self {
            RenderItem::Cluster(cluster) => cluster.position(),
            RenderItem::Point(point) => point.position(),
        }
    }

    /// Input points the item stands for.
    pub fn points(&self) -> &[GeoPoint] {
        match self {
            RenderItem::Cluster(cluster) => &cluster.members,
            RenderItem::Point(point) => std::slice::from_ref(point),
        }
    }
}

/// Points collected in one grid cell during a clustering pass
struct Bucket<'a> {
    cell: (i64, i64),
    sum_x: f64,
    sum_y: f64,
    members: Vec<&'a GeoPoint>,
}

impl<'a> Bucket<'a> {
    fn new(cell: (i64, i64)) -> Self {
        Bucket {
            cell,
            sum_x: 0.0,
            sum_y: 0.0,
            members: Vec::new(),
        }
    }

    fn add(&mut self, projected: ProjectedPoint, point: &'a GeoPoint) {
        self.sum_x += projected.x;
        self.sum_y += projected.y;
        self.members.push(point);
    }

    fn into_item(self, zoom: f64) -> RenderItem {
        if let [point] = self.members.as_slice() {
            return RenderItem::Point((*point).clone());
        }

        let count = self.members.len();
        let (lat, lng) = unproject(
            self.sum_x / count as f64,
            self.sum_y / count as f64,
            zoom,
        );
        let id = format!("c:{}:{}", self.cell.0, self.cell.1);

        trace!("cell {id} holds {count} points");

        RenderItem::Cluster(ClusterItem {
            id,
            lat,
            lng,
            count,
            members: self.members.into_iter().cloned().collect(),
        })
    }
}

/// Groups points into grid cells in projected pixel space
#[derive(Clone, Debug, Default)]
pub struct GridClusterer {
    /// Configuration settings
    options: Options,
}

impl GridClusterer {
    /// Create a new clusterer with the specified configuration settings.
    pub fn new(options: Options) -> Self {
        GridClusterer { options }
    }

    /// Configuration in use.
    pub fn options(&self) -> &Options {
        &self.options
    }

    /// Cluster the points visible in a viewport.
    ///
    /// Every input point ends up in exactly one returned item. Clusters come first,
    /// largest first; single points follow in input order. Input is not validated:
    /// NaN coordinates or a degenerate viewport produce meaningless cells rather than
    /// an error. Use [`GridClusterer::try_cluster`] to reject such input instead.
    ///
    /// # Arguments
    ///
    /// - `points`: Points to cluster.
    /// - `viewport`: The visible map window; its longitude span sets the zoom.
    ///
    /// # Returns
    ///
    /// The markers to draw.
    pub fn cluster(&self, points: &[GeoPoint], viewport: &Viewport) -> Vec<RenderItem> {
        if points.is_empty() {
            return Vec::new();
        }

        let zoom = estimate_zoom_within(viewport, self.options.min_zoom, self.options.max_zoom);
        let cell_size = self.options.cell_size;

        let mut cells: HashMap<(i64, i64), usize> = HashMap::with_capacity(points.len());
        let mut buckets: Vec<Bucket> = Vec::new();

        for point in points {
            let projected = project(point.lat, point.lng, zoom);
            let cell = (
                cell_index(projected.x, cell_size),
                cell_index(projected.y, cell_size),
            );

            let slot = match cells.entry(cell) {
                Entry::Occupied(entry) => *entry.get(),
                Entry::Vacant(entry) => {
                    buckets.push(Bucket::new(cell));
                    *entry.insert(buckets.len() - 1)
                }
            };

            buckets[slot].add(projected, point);
        }

        let mut items: Vec<RenderItem> = buckets
            .into_iter()
            .map(|bucket| bucket.into_item(zoom))
            .collect();

        // Stable: equal ranks keep first-seen cell order
        items.sort_by_key(|item| match item {
            RenderItem::Cluster(cluster) => Reverse(cluster.count),
            RenderItem::Point(_) => Reverse(0),
        });

        debug!(
            "clustered {} points into {} items at zoom {zoom:.2}",
            points.len(),
            items.len()
        );

        items
    }

    /// Like [`GridClusterer::cluster`], but validate the input first.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` for bad options or a degenerate viewport, `InvalidCoordinate`
    /// for the first point outside the valid latitude/longitude range and
    /// `ReservedProperty` for metadata that would clash with the point's own fields.
    pub fn try_cluster(&self, points: &[GeoPoint], viewport: &Viewport) -> Result<Vec<RenderItem>> {
        self.options.validate()?;
        viewport.validate()?;

        for point in points {
            if let Err(err) = point.validate() {
                warn!("rejecting clustering input: {err}");
                return Err(err);
            }
        }

        Ok(self.cluster(points, viewport))
    }
}

/// Cluster points with the default zoom bounds and the given cell size in pixels.
pub fn cluster(points: &[GeoPoint], viewport: &Viewport, cell_size_px: f64) -> Vec<RenderItem> {
    GridClusterer::new(Options {
        cell_size: cell_size_px,
        ..Options::default()
    })
    .cluster(points, viewport)
}

/// Integer grid coordinate of a pixel coordinate.
fn cell_index(value: f64, cell_size: f64) -> i64 {
    (value / cell_size + CELL_SNAP).floor() as i64
}
