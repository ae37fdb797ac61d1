use std::collections::{BTreeMap, BTreeSet};

use tracing::{debug, warn};

use super::{Layer, LayerHandle, LayerKind, MapWidget};
use crate::basemap::BaseMap;
use crate::geo::Bounds;

/// A map operation as seen by [`HeadlessMap`], in call order.
#[derive(Debug, Clone, PartialEq)]
pub enum MapOp {
    Added(LayerHandle, LayerKind),
    Removed(LayerHandle, LayerKind),
    Fitted(Bounds, [u32; 2]),
    BaseAttached(BaseMap),
    BaseDetached(BaseMap),
}

/// In-memory map surface with no rendering.
///
/// Keeps attached layers and an operation log; used by the CLI and as the
/// widget double in tests.
#[derive(Debug, Default)]
pub struct HeadlessMap {
    next_id: u64,
    layers: BTreeMap<LayerHandle, Layer>,
    base_layers: BTreeSet<BaseMap>,
    viewport: Option<Bounds>,
    ops: Vec<MapOp>,
}

impl HeadlessMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn layer(&self, handle: LayerHandle) -> Option<&Layer> {
        self.layers.get(&handle)
    }

    pub fn layers(&self) -> impl Iterator<Item = (LayerHandle, &Layer)> {
        self.layers.iter().map(|(h, l)| (*h, l))
    }

    pub fn layers_of(&self, kind: LayerKind) -> Vec<&Layer> {
        self.layers.values().filter(|l| l.kind() == kind).collect()
    }

    pub fn layer_count(&self) -> usize {
        self.layers.len()
    }

    pub fn base_layers(&self) -> Vec<BaseMap> {
        self.base_layers.iter().copied().collect()
    }

    /// Bounds from the most recent `fit_bounds` call.
    pub fn viewport(&self) -> Option<Bounds> {
        self.viewport
    }

    pub fn ops(&self) -> &[MapOp] {
        &self.ops
    }

    pub fn fit_count(&self) -> usize {
        self.ops
            .iter()
            .filter(|op| matches!(op, MapOp::Fitted(..)))
            .count()
    }
}

impl MapWidget for HeadlessMap {
    fn add_layer(&mut self, layer: Layer) -> LayerHandle {
        self.next_id += 1;
        let handle = LayerHandle(self.next_id);
        debug!("Map: add {} as {}", layer.summary(), handle);
        self.ops.push(MapOp::Added(handle, layer.kind()));
        self.layers.insert(handle, layer);
        handle
    }

    fn remove_layer(&mut self, handle: LayerHandle) {
        match self.layers.remove(&handle) {
            Some(layer) => self.ops.push(MapOp::Removed(handle, layer.kind())),
            None => warn!("Map: remove of unknown layer {}", handle),
        }
    }

    fn layer_bounds(&self, handle: LayerHandle) -> Option<Bounds> {
        self.layers.get(&handle).and_then(Layer::bounds)
    }

    fn fit_bounds(&mut self, bounds: Bounds, padding: [u32; 2]) {
        self.viewport = Some(bounds);
        self.ops.push(MapOp::Fitted(bounds, padding));
    }

    fn attach_base_layer(&mut self, base: BaseMap) {
        if self.base_layers.insert(base) {
            self.ops.push(MapOp::BaseAttached(base));
        }
    }

    fn detach_base_layer(&mut self, base: BaseMap) {
        if self.base_layers.remove(&base) {
            self.ops.push(MapOp::BaseDetached(base));
        }
    }

    fn has_base_layer(&self, base: BaseMap) -> bool {
        self.base_layers.contains(&base)
    }
}
