use crate::error::{Error, Result};
use crate::point::{GeoPoint, Properties, RESERVED_KEYS};
use crate::{ClusterItem, RenderItem};
use geojson::{feature::Id, Feature, FeatureCollection, Geometry, JsonObject};
use serde_json::Value;

/// Property key that collects feature properties named like a point field
/// (see [`RESERVED_KEYS`]), so they pass through without clashing.
pub const SHADOWED_PROPERTIES_KEY: &str = "feature_properties";

impl TryFrom<&Feature> for GeoPoint {
    type Error = Error;

    /// Read a GeoJSON Point feature. The id comes from the feature id or, failing
    /// that, an `"id"` property; the other properties become [`Properties`].
    ///
    /// Properties named like a point field are moved under
    /// [`SHADOWED_PROPERTIES_KEY`] unchanged.
    fn try_from(feature: &Feature) -> Result<Self> {
        let coordinates = match feature.geometry.as_ref().map(|g| &g.value) {
            Some(geojson::Value::Point(coordinates)) if coordinates.len() >= 2 => coordinates,
            _ => return Err(Error::InvalidFeature("expected a point geometry".to_string())),
        };

        let mut properties = feature.properties.clone().unwrap_or_default();

        let id = match &feature.id {
            Some(Id::String(id)) => id.clone(),
            Some(Id::Number(id)) => id.to_string(),
            None => match properties.remove("id") {
                Some(Value::String(id)) => id,
                Some(Value::Number(id)) => id.to_string(),
                _ => return Err(Error::InvalidFeature("feature has no id".to_string())),
            },
        };

        let mut shadowed = JsonObject::new();
        for key in RESERVED_KEYS {
            if let Some(value) = properties.remove(key) {
                shadowed.insert(key.to_string(), value);
            }
        }

        if !shadowed.is_empty() {
            if properties.contains_key(SHADOWED_PROPERTIES_KEY) {
                return Err(Error::ReservedProperty {
                    id,
                    key: SHADOWED_PROPERTIES_KEY.to_string(),
                });
            }
            properties.insert(SHADOWED_PROPERTIES_KEY.to_string(), Value::Object(shadowed));
        }

        let properties: Properties = serde_json::from_value(Value::Object(properties))?;

        Ok(GeoPoint {
            id,
            lat: coordinates[1],
            lng: coordinates[0],
            properties,
        })
    }
}

/// Parse a GeoJSON FeatureCollection of Point features into points.
///
/// # Errors
///
/// `Json` when the text is not a FeatureCollection, `InvalidFeature` for the first
/// feature that is not a point with an id.
pub fn points_from_geojson(input: &str) -> Result<Vec<GeoPoint>> {
    let collection: FeatureCollection = serde_json::from_str(input)?;

    collection.features.iter().map(GeoPoint::try_from).collect()
}

impl RenderItem {
    /// Convert the item into a GeoJSON Point feature.
    ///
    /// Clusters carry `cluster`, `cluster_id`, `point_count` and
    /// `point_count_abbreviated` properties; single points keep their own properties.
    pub fn to_feature(&self) -> Result<Feature> {
        let (id, properties) = match self {
            RenderItem::Cluster(cluster) => (cluster.id.clone(), cluster_properties(cluster)),
            RenderItem::Point(point) => (point.id.clone(), point_properties(point)?),
        };
        let position = self.position();

        Ok(Feature {
            bbox: None,
            geometry: Some(Geometry::new(geojson::Value::Point(vec![
                position.longitude,
                position.latitude,
            ]))),
            id: Some(Id::String(id)),
            properties: Some(properties),
            foreign_members: None,
        })
    }
}

/// Convert render items into a FeatureCollection, keeping their order.
pub fn to_feature_collection(items: &[RenderItem]) -> Result<FeatureCollection> {
    Ok(FeatureCollection {
        bbox: None,
        features: items.iter().map(RenderItem::to_feature).collect::<Result<_>>()?,
        foreign_members: None,
    })
}

fn cluster_properties(cluster: &ClusterItem) -> JsonObject {
    let mut properties = JsonObject::new();

    properties.insert("cluster".to_string(), Value::Bool(true));
    properties.insert("cluster_id".to_string(), Value::from(cluster.id.as_str()));
    properties.insert("point_count".to_string(), Value::from(cluster.count));
    properties.insert(
        "point_count_abbreviated".to_string(),
        Value::from(cluster.abbreviated_count()),
    );

    properties
}

fn point_properties(point: &GeoPoint) -> Result<JsonObject> {
    match serde_json::to_value(&point.properties)? {
        Value::Object(properties) => Ok(properties),
        _ => Ok(JsonObject::new()),
    }
}
