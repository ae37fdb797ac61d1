use std::collections::BTreeMap;

use serde::Serialize;

use super::{MitigationMarker, MitigationStyle, Priority};
use crate::geo::LatLng;

/// Markers that share a grid cell.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MarkerCluster {
    /// Mean position of the members
    pub center: LatLng,
    pub count: usize,
    /// Highest member priority; colours the cluster
    pub priority: Priority,
    pub style: MitigationStyle,
    /// Indices into the marker list
    pub members: Vec<usize>,
}

/// Group markers on a `cell_degrees` lat/lng grid.
///
/// Clusters come back high priority first, then largest first. A
/// non-positive or non-finite cell size puts every marker in its own cluster.
pub fn cluster_markers(markers: &[MitigationMarker], cell_degrees: f64) -> Vec<MarkerCluster> {
    let gridded = cell_degrees.is_finite() && cell_degrees > 0.0;

    let mut cells: BTreeMap<(i64, i64), Vec<usize>> = BTreeMap::new();
    for (idx, marker) in markers.iter().enumerate() {
        let key = if gridded {
            (
                (marker.position.lat / cell_degrees).floor() as i64,
                (marker.position.lng / cell_degrees).floor() as i64,
            )
        } else {
            (idx as i64, 0)
        };
        cells.entry(key).or_default().push(idx);
    }

    let mut clusters: Vec<MarkerCluster> = cells
        .into_values()
        .map(|members| {
            let count = members.len();
            let (lat_sum, lng_sum) = members.iter().fold((0.0, 0.0), |(lat, lng), &i| {
                (lat + markers[i].position.lat, lng + markers[i].position.lng)
            });
            let priority = members
                .iter()
                .map(|&i| markers[i].priority)
                .max()
                .unwrap_or_default();
            MarkerCluster {
                center: LatLng::new(lat_sum / count as f64, lng_sum / count as f64),
                count,
                priority,
                style: priority.style(),
                members,
            }
        })
        .collect();

    clusters.sort_by(|a, b| b.priority.cmp(&a.priority).then(b.count.cmp(&a.count)));
    clusters
}
