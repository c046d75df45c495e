use crate::error::{Error, Result};
use crate::viewport::LatLng;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Keys a [`GeoPoint`] or [`RenderItem`](crate::RenderItem) serializes its own fields
/// under. [`Properties::extra`] must not use them.
pub const RESERVED_KEYS: [&str; 4] = ["id", "lat", "lng", "type"];

/// Kind of place or event a point describes
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    /// Food and drink
    #[serde(rename = "gastronomia", alias = "gastronomía")]
    Food,

    /// Places worth visiting
    #[serde(rename = "lugares")]
    Places,

    /// Parties
    #[serde(rename = "fiesta")]
    Party,

    /// Walking or cycling routes
    #[serde(rename = "rutas")]
    Routes,

    /// Street markets
    #[serde(rename = "mercadillos")]
    Markets,

    /// Nightlife
    #[serde(rename = "noche")]
    Night,

    /// Fairs
    #[serde(rename = "ferias")]
    Fairs,

    /// One-off events
    #[serde(rename = "evento")]
    Event,

    /// Sports
    #[serde(rename = "deporte")]
    Sport,

    /// Anything else; points without a category count as this
    #[default]
    #[serde(rename = "otros")]
    Other,
}

impl Category {
    /// Every category, in display order.
    pub const ALL: [Category; 10] = [
        Category::Food,
        Category::Places,
        Category::Party,
        Category::Routes,
        Category::Markets,
        Category::Night,
        Category::Fairs,
        Category::Event,
        Category::Sport,
        Category::Other,
    ];

    /// Canonical key stored with a point.
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Food => "gastronomia",
            Category::Places => "lugares",
            Category::Party => "fiesta",
            Category::Routes => "rutas",
            Category::Markets => "mercadillos",
            Category::Night => "noche",
            Category::Fairs => "ferias",
            Category::Event => "evento",
            Category::Sport => "deporte",
            Category::Other => "otros",
        }
    }
}

/// Caller metadata carried by a point. Clustering never reads it.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Properties {
    /// Title shown in the callout
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    /// Identifier of the user who published the point
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,

    /// Cover image reference
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,

    /// Gallery image references
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_urls: Option<Vec<String>>,

    /// Free text description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Category, if the publisher picked one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<Category>,

    /// Start of the live window
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub live_start_at: Option<DateTime<Utc>>,

    /// End of the live window
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub live_end_at: Option<DateTime<Utc>>,

    /// Creation time, used to order listings
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,

    /// Any other fields, kept verbatim. Keys in [`RESERVED_KEYS`] are rejected by
    /// [`GeoPoint::validate`].
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A single located item to render
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    /// Unique identifier
    pub id: String,

    /// Latitude in degrees
    pub lat: f64,

    /// Longitude in degrees
    pub lng: f64,

    /// Pass-through metadata
    #[serde(flatten)]
    pub properties: Properties,
}

impl GeoPoint {
    /// Create a point without metadata.
    pub fn new(id: impl Into<String>, lat: f64, lng: f64) -> Self {
        GeoPoint {
            id: id.into(),
            lat,
            lng,
            properties: Properties::default(),
        }
    }

    /// Set the title.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.properties.title = Some(title.into());
        self
    }

    /// Set the category.
    pub fn with_category(mut self, category: Category) -> Self {
        self.properties.category = Some(category);
        self
    }

    /// Position of the point.
    pub fn position(&self) -> LatLng {
        LatLng::new(self.lat, self.lng)
    }

    /// Category of the point, [`Category::Other`] when none was set.
    pub fn category(&self) -> Category {
        self.properties.category.unwrap_or_default()
    }

    /// Whether `now` falls inside the point's live window.
    ///
    /// Both ends must be present; the window is inclusive on both sides.
    pub fn is_live_at(&self, now: DateTime<Utc>) -> bool {
        match (self.properties.live_start_at, self.properties.live_end_at) {
            (Some(start), Some(end)) => start <= now && now <= end,
            _ => false,
        }
    }

    /// Reject points with non-finite or out of range coordinates, or with metadata
    /// that would clash with the point's own fields once serialized.
    pub fn validate(&self) -> Result<()> {
        if let Some(key) = RESERVED_KEYS
            .iter()
            .find(|key| self.properties.extra.contains_key(**key))
        {
            return Err(Error::ReservedProperty {
                id: self.id.clone(),
                key: key.to_string(),
            });
        }

        let valid = self.lat.is_finite()
            && self.lng.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lng);

        if valid {
            Ok(())
        } else {
            Err(Error::InvalidCoordinate {
                id: self.id.clone(),
                lat: self.lat,
                lng: self.lng,
            })
        }
    }
}
