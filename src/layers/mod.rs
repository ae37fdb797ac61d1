//! Derived map layers and the store that keeps one live handle per kind.
//!
//! The engine never talks to a concrete map library. It hands [`Layer`]
//! payloads to a [`MapWidget`] and keeps the returned [`LayerHandle`]s in a
//! [`LayerStore`], which always removes the previous handle of a kind before
//! attaching its replacement.

mod headless;
mod heat;
mod store;
mod widget;

use std::fmt;

use serde::Serialize;

use crate::classify::Legend;
use crate::geo::Bounds;
use crate::mitigation::MitigationLayer;

pub use headless::{HeadlessMap, MapOp};
pub use heat::{HeatLayer, HeatStyle, StyledHeatFeature};
pub use store::LayerStore;
pub use widget::MapWidget;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum LayerKind {
    Heat,
    Mitigation,
    Legend,
    Loading,
}

impl LayerKind {
    pub const ALL: [LayerKind; 4] = [
        LayerKind::Heat,
        LayerKind::Mitigation,
        LayerKind::Legend,
        LayerKind::Loading,
    ];
}

/// Opaque id the map widget hands out for an attached layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct LayerHandle(pub u64);

impl fmt::Display for LayerHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Spinner control shown while a heat request is outstanding.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LoadingIndicator {
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Layer {
    Heat(HeatLayer),
    Mitigation(MitigationLayer),
    Legend(Legend),
    Loading(LoadingIndicator),
}

impl Layer {
    pub fn kind(&self) -> LayerKind {
        match self {
            Layer::Heat(_) => LayerKind::Heat,
            Layer::Mitigation(_) => LayerKind::Mitigation,
            Layer::Legend(_) => LayerKind::Legend,
            Layer::Loading(_) => LayerKind::Loading,
        }
    }

    /// Geographic extent; controls (legend, spinner) have none.
    pub fn bounds(&self) -> Option<Bounds> {
        match self {
            Layer::Heat(heat) => heat.bounds(),
            Layer::Mitigation(mitigation) => mitigation.bounds(),
            Layer::Legend(_) | Layer::Loading(_) => None,
        }
    }

    /// One-line description for logs and the CLI.
    pub fn summary(&self) -> String {
        match self {
            Layer::Heat(heat) => format!("heat layer with {} features", heat.features.len()),
            Layer::Mitigation(m) => format!(
                "mitigation layer with {} markers in {} clusters",
                m.markers.len(),
                m.clusters.len()
            ),
            Layer::Legend(legend) => {
                let labels: Vec<_> = legend.bands.iter().map(|b| b.label).collect();
                format!("legend [{}] for {}", labels.join(", "), legend.annotation())
            }
            Layer::Loading(loading) => format!("loading indicator: {}", loading.message),
        }
    }
}
