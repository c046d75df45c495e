//! Repository access to the points a map shows.
//!
//! [`PointSource`] is the narrow interface the clustering side needs from whatever
//! backend stores points. [`MemorySource`] keeps them in a `Vec` and serves hosts
//! without a remote store as well as tests.

use crate::error::{Error, Result};
use crate::filter::PointFilter;
use crate::point::GeoPoint;
use chrono::Utc;
use log::debug;
use std::cmp::Reverse;

/// Read and write access to stored points.
pub trait PointSource {
    /// List points matching `filter`, newest first.
    ///
    /// Points without a creation time sort after dated ones; ties keep insertion order.
    fn list_points(&self, filter: &PointFilter) -> Result<Vec<GeoPoint>>;

    /// Look up a single point by identifier.
    fn get_point(&self, id: &str) -> Result<Option<GeoPoint>>;

    /// Store a new point and return it as stored.
    ///
    /// # Errors
    ///
    /// `MissingTitle` when the title is blank, `InvalidCoordinate` for out of range
    /// coordinates and `DuplicateId` when the identifier is taken.
    fn create_point(&mut self, point: GeoPoint) -> Result<GeoPoint>;
}

/// In-memory [`PointSource`].
#[derive(Clone, Debug, Default)]
pub struct MemorySource {
    points: Vec<GeoPoint>,
}

impl MemorySource {
    /// Create a source from a collection of points, kept in the given order.
    pub fn with_points<I>(points: I) -> Self
    where
        I: IntoIterator<Item = GeoPoint>,
    {
        MemorySource {
            points: points.into_iter().collect(),
        }
    }

    /// Number of stored points.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Whether the source holds no points.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

impl PointSource for MemorySource {
    fn list_points(&self, filter: &PointFilter) -> Result<Vec<GeoPoint>> {
        let mut matched: Vec<&GeoPoint> = self.points.iter().filter(|p| filter.matches(p)).collect();

        // `None` < `Some`, so reversing puts undated points last
        matched.sort_by_key(|p| Reverse(p.properties.created_at));

        let range = filter.page_range(matched.len());

        debug!(
            "listing {} of {} matching points",
            range.len(),
            matched.len()
        );

        Ok(matched[range].iter().map(|p| (*p).clone()).collect())
    }

    fn get_point(&self, id: &str) -> Result<Option<GeoPoint>> {
        Ok(self.points.iter().find(|p| p.id == id).cloned())
    }

    fn create_point(&mut self, mut point: GeoPoint) -> Result<GeoPoint> {
        let has_title = point
            .properties
            .title
            .as_deref()
            .is_some_and(|title| !title.trim().is_empty());

        if !has_title {
            return Err(Error::MissingTitle);
        }

        point.validate()?;

        if self.points.iter().any(|p| p.id == point.id) {
            return Err(Error::DuplicateId(point.id));
        }

        point.properties.created_at.get_or_insert_with(Utc::now);
        self.points.push(point.clone());

        debug!("created point {}", point.id);

        Ok(point)
    }
}
