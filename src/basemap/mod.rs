//! Base map selection.
//!
//! Switching backdrops is independent of the analysis session: it acts on the
//! map widget directly and remembers the choice in the preference store so
//! the next session opens on the same backdrop.

mod preferences;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::UhiMapperError;
use crate::layers::MapWidget;

pub use preferences::{JsonPreferences, MemoryPreferences, PreferenceStore};

/// Preference key holding the last chosen backdrop.
pub const BASE_MAP_KEY: &str = "base_map";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BaseMap {
    #[default]
    Street,
    Satellite,
    Topo,
    Hybrid,
}

impl BaseMap {
    pub const ALL: [BaseMap; 4] = [
        BaseMap::Street,
        BaseMap::Satellite,
        BaseMap::Topo,
        BaseMap::Hybrid,
    ];

    pub fn id(&self) -> &'static str {
        match self {
            BaseMap::Street => "street",
            BaseMap::Satellite => "satellite",
            BaseMap::Topo => "topo",
            BaseMap::Hybrid => "hybrid",
        }
    }

    /// Tile URL template handed to the widget.
    pub fn tile_url(&self) -> &'static str {
        match self {
            BaseMap::Street => "https://{s}.tile.openstreetmap.org/{z}/{x}/{y}.png",
            BaseMap::Satellite => {
                "https://server.arcgisonline.com/ArcGIS/rest/services/World_Imagery/MapServer/tile/{z}/{y}/{x}"
            }
            BaseMap::Topo => "https://{s}.tile.opentopomap.org/{z}/{x}/{y}.png",
            BaseMap::Hybrid => "https://{s}.google.com/vt/lyrs=s,h&x={x}&y={y}&z={z}",
        }
    }

    pub fn attribution(&self) -> &'static str {
        match self {
            BaseMap::Street => "© OpenStreetMap contributors",
            BaseMap::Satellite => "Tiles © Esri",
            BaseMap::Topo => "© OpenTopoMap (CC-BY-SA)",
            BaseMap::Hybrid => "© Google",
        }
    }
}

impl fmt::Display for BaseMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for BaseMap {
    type Err = UhiMapperError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        BaseMap::ALL
            .into_iter()
            .find(|b| b.id() == s.trim())
            .ok_or_else(|| UhiMapperError::UnknownBaseMap(s.to_string()))
    }
}

/// Leave exactly `selected` attached among the four backdrops.
pub fn show_base_map<M: MapWidget + ?Sized>(map: &mut M, selected: BaseMap) {
    for base in BaseMap::ALL {
        if base != selected && map.has_base_layer(base) {
            map.detach_base_layer(base);
        }
    }
    if !map.has_base_layer(selected) {
        map.attach_base_layer(selected);
    }
}

/// Apply a user's backdrop choice and persist it.
///
/// The map is switched even if persisting fails; the error is returned so the
/// caller can report it.
pub fn switch_base_map<M, P>(map: &mut M, prefs: &mut P, selected: BaseMap) -> Result<(), UhiMapperError>
where
    M: MapWidget + ?Sized,
    P: PreferenceStore + ?Sized,
{
    show_base_map(map, selected);
    info!("Base map switched to {}", selected);
    prefs.set(BASE_MAP_KEY, selected.id())
}

/// Attach the remembered backdrop, `street` when none is stored or it is unreadable.
pub fn restore_base_map<M, P>(map: &mut M, prefs: &P) -> BaseMap
where
    M: MapWidget + ?Sized,
    P: PreferenceStore + ?Sized,
{
    let selected = match prefs.get(BASE_MAP_KEY) {
        Ok(Some(raw)) => raw.parse().unwrap_or_else(|e| {
            warn!("Ignoring stored base map: {}", e);
            BaseMap::default()
        }),
        Ok(None) => BaseMap::default(),
        Err(e) => {
            warn!("Failed to read base map preference: {}", e);
            BaseMap::default()
        }
    };
    show_base_map(map, selected);
    selected
}
