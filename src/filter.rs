use crate::point::{Category, GeoPoint};
use crate::viewport::Viewport;
use serde::{Deserialize, Serialize};

/// Most points handed to the clusterer in one pass
pub const DEFAULT_VISIBLE_LIMIT: usize = 200;

/// Query parameters for listing points from a [`PointSource`](crate::PointSource)
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PointFilter {
    /// Case-insensitive text matched against title and description
    pub query: Option<String>,

    /// Only points of this category
    pub category: Option<Category>,

    /// Zero-based page number
    pub page: usize,

    /// Points per page, `0` returns everything
    pub page_size: usize,
}

impl PointFilter {
    /// Trimmed query text, `None` when blank.
    pub fn search_text(&self) -> Option<&str> {
        self.query
            .as_deref()
            .map(str::trim)
            .filter(|text| !text.is_empty())
    }

    /// Whether a point satisfies the query and category parts of the filter.
    pub fn matches(&self, point: &GeoPoint) -> bool {
        if let Some(category) = self.category {
            if point.category() != category {
                return false;
            }
        }

        match self.search_text() {
            Some(text) => {
                let needle = text.to_lowercase();
                let props = &point.properties;

                [&props.title, &props.description]
                    .into_iter()
                    .flatten()
                    .any(|field| field.to_lowercase().contains(&needle))
            }
            None => true,
        }
    }

    /// Index range of the requested page within `total` results.
    pub fn page_range(&self, total: usize) -> std::ops::Range<usize> {
        if self.page_size == 0 {
            return 0..total;
        }

        let start = self.page.saturating_mul(self.page_size).min(total);
        let end = start.saturating_add(self.page_size).min(total);

        start..end
    }
}

/// Select the points worth clustering for a viewport.
///
/// Keeps points inside [`Viewport::loose_bounds`], optionally of a single category
/// (points without one count as [`Category::Other`]), in input order, at most `limit`.
///
/// # Arguments
///
/// - `points`: Candidate points.
/// - `viewport`: The visible map window.
/// - `category`: Category to keep, or `None` for all.
/// - `limit`: Maximum number of points returned.
///
/// # Returns
///
/// The selected points.
pub fn visible_points<'a>(
    points: &'a [GeoPoint],
    viewport: &Viewport,
    category: Option<Category>,
    limit: usize,
) -> Vec<&'a GeoPoint> {
    let bounds = viewport.loose_bounds();

    points
        .iter()
        .filter(|p| bounds.contains(p.lat, p.lng))
        .filter(|p| category.map_or(true, |c| p.category() == c))
        .take(limit)
        .collect()
}
