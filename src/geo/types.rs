//! GeoJSON feature model for backend responses.
//!
//! Only the parts the session engine reads are modelled. Unknown members are
//! ignored, and a `null` properties object deserializes to the default.
//! Features that fail to parse are dropped one by one so a partial response
//! still renders.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use super::bounds::{Bounds, LatLng};
use crate::classify::DEFAULT_LST;

/// GeoJSON position: `[lng, lat]`, optionally followed by altitude.
pub type Position = Vec<f64>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(bound(deserialize = "P: DeserializeOwned + Default"))]
pub struct FeatureCollection<P> {
    #[serde(default, deserialize_with = "skip_malformed")]
    pub features: Vec<Feature<P>>,
}

impl<P> FeatureCollection<P> {
    pub fn new(features: Vec<Feature<P>>) -> Self {
        Self { features }
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(bound(deserialize = "P: Deserialize<'de> + Default"))]
pub struct Feature<P> {
    #[serde(default)]
    pub geometry: Option<Geometry>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub properties: P,
}

impl<P> Feature<P> {
    pub fn new(geometry: Option<Geometry>, properties: P) -> Self {
        Self {
            geometry,
            properties,
        }
    }
}

fn skip_malformed<'de, D, P>(deserializer: D) -> Result<Vec<Feature<P>>, D::Error>
where
    D: Deserializer<'de>,
    P: DeserializeOwned + Default,
{
    let raw = Option::<Vec<Value>>::deserialize(deserializer)?.unwrap_or_default();
    let total = raw.len();
    let features: Vec<Feature<P>> = raw
        .into_iter()
        .filter_map(|value| match serde_json::from_value(value) {
            Ok(feature) => Some(feature),
            Err(e) => {
                debug!("Dropping malformed feature: {}", e);
                None
            }
        })
        .collect();

    let skipped = total - features.len();
    if skipped > 0 {
        warn!("Skipped {} of {} malformed features", skipped, total);
    }
    Ok(features)
}

/// Numbers arrive as JSON numbers or numeric strings; anything else is absent.
fn lenient_number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let number = match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    Ok(number.filter(|n| n.is_finite()))
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Geometry {
    Point { coordinates: Position },
    MultiPoint { coordinates: Vec<Position> },
    LineString { coordinates: Vec<Position> },
    MultiLineString { coordinates: Vec<Vec<Position>> },
    Polygon { coordinates: Vec<Vec<Position>> },
    MultiPolygon { coordinates: Vec<Vec<Vec<Position>>> },
    GeometryCollection { geometries: Vec<Geometry> },
    /// Vectorised output nested as a whole collection in one feature's geometry.
    FeatureCollection {
        #[serde(default)]
        features: Vec<NestedFeature>,
    },
    /// Any other `type`; carries no coordinates.
    #[serde(other)]
    Unknown,
}

/// Geometry-only view of a feature inside a nested collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NestedFeature {
    #[serde(default)]
    pub geometry: Option<Geometry>,
}

impl Geometry {
    pub fn point(lat: f64, lng: f64) -> Self {
        Geometry::Point {
            coordinates: vec![lng, lat],
        }
    }

    /// Single-ring polygon from `(lat, lng)` corners.
    pub fn polygon(ring: &[(f64, f64)]) -> Self {
        Geometry::Polygon {
            coordinates: vec![ring.iter().map(|&(lat, lng)| vec![lng, lat]).collect()],
        }
    }

    pub fn bounds(&self) -> Option<Bounds> {
        let mut points = Vec::new();
        self.collect_points(&mut points);
        Bounds::from_points(points)
    }

    /// Where a marker for this geometry goes: the point itself, otherwise the bounds center.
    pub fn representative_point(&self) -> Option<LatLng> {
        match self {
            Geometry::Point { coordinates } => to_latlng(coordinates),
            _ => self.bounds().map(|b| b.center()),
        }
    }

    fn collect_points(&self, out: &mut Vec<LatLng>) {
        match self {
            Geometry::Point { coordinates } => out.extend(to_latlng(coordinates)),
            Geometry::MultiPoint { coordinates } | Geometry::LineString { coordinates } => {
                out.extend(coordinates.iter().filter_map(|p| to_latlng(p)))
            }
            Geometry::MultiLineString { coordinates } | Geometry::Polygon { coordinates } => out
                .extend(
                    coordinates
                        .iter()
                        .flatten()
                        .filter_map(|p| to_latlng(p)),
                ),
            Geometry::MultiPolygon { coordinates } => out.extend(
                coordinates
                    .iter()
                    .flatten()
                    .flatten()
                    .filter_map(|p| to_latlng(p)),
            ),
            Geometry::GeometryCollection { geometries } => {
                for geometry in geometries {
                    geometry.collect_points(out);
                }
            }
            Geometry::FeatureCollection { features } => {
                for geometry in features.iter().filter_map(|f| f.geometry.as_ref()) {
                    geometry.collect_points(out);
                }
            }
            Geometry::Unknown => {}
        }
    }
}

fn to_latlng(position: &[f64]) -> Option<LatLng> {
    match position {
        [lng, lat, ..] => Some(LatLng::new(*lat, *lng)),
        _ => None,
    }
}

/// Attributes of one heat cell. Temperatures are °C.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HeatProperties {
    #[serde(rename = "LST", default, deserialize_with = "lenient_number")]
    pub lst: Option<f64>,
    #[serde(rename = "NDVI", default, deserialize_with = "lenient_number")]
    pub ndvi: Option<f64>,
    #[serde(rename = "UHI", default, deserialize_with = "lenient_number")]
    pub uhi: Option<f64>,
    #[serde(default)]
    pub start_date: Option<String>,
    #[serde(default)]
    pub end_date: Option<String>,
    #[serde(default)]
    pub data_source: Option<String>,
    #[serde(default)]
    pub resolution: Option<String>,
}

impl HeatProperties {
    pub fn with_lst(lst: f64) -> Self {
        Self {
            lst: Some(lst),
            ..Self::default()
        }
    }

    pub fn lst_or_default(&self) -> f64 {
        self.lst.unwrap_or(DEFAULT_LST)
    }
}

/// Attributes of one mitigation suggestion.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MitigationProperties {
    #[serde(default)]
    pub suggestion: Option<String>,
    /// Raw priority; unknown values are kept and styled as high.
    #[serde(default)]
    pub priority: Option<String>,
    /// Minimum UHI intensity (°C) the suggestion was computed for
    #[serde(default, deserialize_with = "lenient_number")]
    pub threshold: Option<f64>,
    #[serde(default)]
    pub estimated_cooling: Option<String>,
    #[serde(default)]
    pub period_days: Option<u32>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_heat_collection() {
        let raw = json!({
            "type": "FeatureCollection",
            "features": [
                {
                    "type": "Feature",
                    "properties": {"LST": 41.2, "NDVI": 0.12, "UHI": 3.4,
                                   "start_date": "2024-01-01", "end_date": "2024-01-31"},
                    "geometry": {"type": "Polygon",
                                 "coordinates": [[[74.1, 31.3], [74.2, 31.3], [74.2, 31.4], [74.1, 31.3]]]}
                },
                {"type": "Feature", "properties": null, "geometry": null}
            ]
        });
        let fc: FeatureCollection<HeatProperties> = serde_json::from_value(raw).unwrap();
        assert_eq!(fc.len(), 2);
        assert_eq!(fc.features[0].properties.lst, Some(41.2));
        assert_eq!(fc.features[0].properties.start_date.as_deref(), Some("2024-01-01"));
        assert_eq!(fc.features[1].properties, HeatProperties::default());
        assert!(fc.features[1].geometry.is_none());
        assert_eq!(fc.features[1].properties.lst_or_default(), 25.0);
    }

    #[test]
    fn test_lowercase_lst_is_not_read() {
        let raw = json!({"features": [{"properties": {"lst": 41.0}, "geometry": null}]});
        let fc: FeatureCollection<HeatProperties> = serde_json::from_value(raw).unwrap();
        assert_eq!(fc.features[0].properties.lst, None);
    }

    #[test]
    fn test_parse_mitigation_with_unknown_priority() {
        let raw = json!({
            "features": [{
                "properties": {"suggestion": "urban_greening", "priority": "urgent",
                               "threshold": 2.0, "estimated_cooling": "2-5°C", "period_days": 30},
                "geometry": {"type": "Point", "coordinates": [74.3, 31.5]}
            }]
        });
        let fc: FeatureCollection<MitigationProperties> = serde_json::from_value(raw).unwrap();
        let props = &fc.features[0].properties;
        assert_eq!(props.priority.as_deref(), Some("urgent"));
        assert_eq!(props.period_days, Some(30));
    }

    #[test]
    fn test_missing_features_is_empty() {
        let fc: FeatureCollection<HeatProperties> =
            serde_json::from_value(json!({"type": "FeatureCollection"})).unwrap();
        assert!(fc.is_empty());
    }

    #[test]
    fn test_geometry_bounds_ignore_altitude() {
        let geometry: Geometry = serde_json::from_value(json!({
            "type": "MultiPolygon",
            "coordinates": [[[[74.0, 31.0, 210.0], [75.0, 32.0, 215.0], [74.5, 31.2]]]]
        }))
        .unwrap();
        let b = geometry.bounds().unwrap();
        assert_eq!((b.south, b.west, b.north, b.east), (31.0, 74.0, 32.0, 75.0));
    }

    #[test]
    fn test_representative_point() {
        assert_eq!(
            Geometry::point(31.5, 74.3).representative_point(),
            Some(LatLng::new(31.5, 74.3))
        );
        let square = Geometry::polygon(&[(31.0, 74.0), (31.0, 75.0), (32.0, 75.0), (32.0, 74.0)]);
        assert_eq!(square.representative_point(), Some(LatLng::new(31.5, 74.5)));

        let empty = Geometry::GeometryCollection { geometries: vec![] };
        assert_eq!(empty.representative_point(), None);
    }

    #[test]
    fn test_malformed_feature_is_skipped() {
        let raw = json!({
            "features": [
                {
                    "properties": {"LST": 38.0},
                    "geometry": {"type": "Polygon",
                                 "coordinates": [[[74.1, 31.3], [74.2, 31.3], [74.2, 31.4], [74.1, 31.3]]]}
                },
                {"properties": {"LST": 30.0}, "geometry": {"type": "Polygon", "coordinates": "bad"}},
                {"properties": "oops", "geometry": null}
            ]
        });
        let fc: FeatureCollection<HeatProperties> = serde_json::from_value(raw).unwrap();
        assert_eq!(fc.len(), 1);
        assert_eq!(fc.features[0].properties.lst, Some(38.0));
    }

    #[test]
    fn test_numeric_strings_and_garbage_attributes() {
        let raw = json!({
            "features": [
                {"properties": {"LST": "33.5", "NDVI": " 0.25 "}, "geometry": null},
                {"properties": {"LST": "hot", "UHI": [1, 2]}, "geometry": null},
                {"properties": {"LST": "NaN"}, "geometry": null}
            ]
        });
        let fc: FeatureCollection<HeatProperties> = serde_json::from_value(raw).unwrap();
        assert_eq!(fc.len(), 3);
        assert_eq!(fc.features[0].properties.lst, Some(33.5));
        assert_eq!(fc.features[0].properties.ndvi, Some(0.25));
        assert_eq!(fc.features[1].properties.lst, None);
        assert_eq!(fc.features[1].properties.uhi, None);
        assert_eq!(fc.features[1].properties.lst_or_default(), 25.0);
        assert_eq!(fc.features[2].properties.lst, None);
    }

    #[test]
    fn test_nested_collection_geometry() {
        let raw = json!({
            "features": [{
                "properties": {"LST": 36.0},
                "geometry": {
                    "type": "FeatureCollection",
                    "features": [
                        {"type": "Feature", "properties": {"label": 1},
                         "geometry": {"type": "Polygon",
                                      "coordinates": [[[74.0, 31.0], [74.5, 31.0], [74.5, 31.5], [74.0, 31.0]]]}},
                        {"type": "Feature", "properties": {"label": 2},
                         "geometry": {"type": "Point", "coordinates": [75.0, 32.0]}}
                    ]
                }
            }]
        });
        let fc: FeatureCollection<HeatProperties> = serde_json::from_value(raw).unwrap();
        let b = fc.features[0].geometry.as_ref().unwrap().bounds().unwrap();
        assert_eq!((b.south, b.west, b.north, b.east), (31.0, 74.0, 32.0, 75.0));
    }

    #[test]
    fn test_unknown_geometry_type_keeps_feature() {
        let raw = json!({
            "features": [{"properties": {"LST": 31.0}, "geometry": {"type": "Circle", "radius": 5}}]
        });
        let fc: FeatureCollection<HeatProperties> = serde_json::from_value(raw).unwrap();
        assert_eq!(fc.features[0].geometry, Some(Geometry::Unknown));
        assert_eq!(fc.features[0].geometry.as_ref().unwrap().bounds(), None);
    }
}
