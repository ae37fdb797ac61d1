//! Mitigation suggestion styling and clustering.
//!
//! Suggestions are styled by priority only: every marker has the same radius
//! and the colour carries the class. A missing or unrecognised priority is
//! styled as `high`, since the backend may omit the field.

mod cluster;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::geo::{Bounds, Feature, FeatureCollection, LatLng, MitigationProperties};

pub use cluster::{cluster_markers, MarkerCluster};

/// Marker radius in map units, shared by every priority.
pub const MARKER_RADIUS: f64 = 6.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    Medium,
    #[default]
    High,
}

impl Priority {
    /// Exact lookup of the backend value; anything else is `High`.
    pub fn from_raw(raw: Option<&str>) -> Self {
        match raw {
            Some("medium") => Priority::Medium,
            Some("low") => Priority::Low,
            _ => Priority::High,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::High => "high",
            Priority::Medium => "medium",
            Priority::Low => "low",
        }
    }

    pub fn style(&self) -> MitigationStyle {
        let color = match self {
            Priority::High => "#e74c3c",
            Priority::Medium => "#f39c12",
            Priority::Low => "#2ecc71",
        };
        MitigationStyle {
            color,
            radius: MARKER_RADIUS,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MitigationStyle {
    pub color: &'static str,
    pub radius: f64,
}

pub fn style_for(priority: Option<&str>) -> MitigationStyle {
    Priority::from_raw(priority).style()
}

/// One styled suggestion, ready to be placed in the cluster container.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MitigationMarker {
    pub position: LatLng,
    pub priority: Priority,
    pub style: MitigationStyle,
    pub popup: String,
    pub properties: MitigationProperties,
}

impl MitigationMarker {
    /// `None` when the feature has no usable coordinates.
    pub fn from_feature(feature: &Feature<MitigationProperties>) -> Option<Self> {
        let position = feature.geometry.as_ref()?.representative_point()?;
        let props = &feature.properties;
        let priority = Priority::from_raw(props.priority.as_deref());
        Some(Self {
            position,
            priority,
            style: priority.style(),
            popup: mitigation_popup(props, priority),
            properties: props.clone(),
        })
    }
}

fn mitigation_popup(props: &MitigationProperties, priority: Priority) -> String {
    let suggestion = props
        .suggestion
        .as_deref()
        .map(humanize)
        .unwrap_or_else(|| "n/a".to_string());
    let cooling = props.estimated_cooling.as_deref().unwrap_or("n/a");
    let threshold = props
        .threshold
        .map(|t| format!("{:.1}°C", t))
        .unwrap_or_else(|| "n/a".to_string());
    format!(
        "Suggestion: {}\nPriority: {}\nEstimated cooling: {}\nUHI threshold: {}",
        suggestion,
        priority.as_str(),
        cooling,
        threshold
    )
}

/// "urban_greening" -> "Urban greening"
fn humanize(raw: &str) -> String {
    let spaced = raw.trim().replace('_', " ");
    let mut chars = spaced.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// The single cluster container shown for mitigation suggestions.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MitigationLayer {
    pub markers: Vec<MitigationMarker>,
    pub clusters: Vec<MarkerCluster>,
}

impl MitigationLayer {
    pub fn build(collection: &FeatureCollection<MitigationProperties>, cell_degrees: f64) -> Self {
        let markers: Vec<MitigationMarker> = collection
            .features
            .iter()
            .filter_map(MitigationMarker::from_feature)
            .collect();

        let skipped = collection.len() - markers.len();
        if skipped > 0 {
            warn!("Skipped {} mitigation features without coordinates", skipped);
        }

        let clusters = cluster_markers(&markers, cell_degrees);
        Self { markers, clusters }
    }

    pub fn bounds(&self) -> Option<Bounds> {
        Bounds::from_points(self.markers.iter().map(|m| m.position))
    }
}
