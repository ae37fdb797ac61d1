use tracing::debug;

use super::{Layer, LayerHandle, LayerKind, MapWidget};

/// Live layer handles, at most one per [`LayerKind`].
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct LayerStore {
    heat: Option<LayerHandle>,
    mitigation: Option<LayerHandle>,
    legend: Option<LayerHandle>,
    loading: Option<LayerHandle>,
}

impl LayerStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, kind: LayerKind) -> Option<LayerHandle> {
        match kind {
            LayerKind::Heat => self.heat,
            LayerKind::Mitigation => self.mitigation,
            LayerKind::Legend => self.legend,
            LayerKind::Loading => self.loading,
        }
    }

    fn slot_mut(&mut self, kind: LayerKind) -> &mut Option<LayerHandle> {
        match kind {
            LayerKind::Heat => &mut self.heat,
            LayerKind::Mitigation => &mut self.mitigation,
            LayerKind::Legend => &mut self.legend,
            LayerKind::Loading => &mut self.loading,
        }
    }

    /// Swap in `layer` for its kind. The old handle is removed from the map
    /// before the new layer is attached.
    pub fn replace<M: MapWidget + ?Sized>(&mut self, map: &mut M, layer: Layer) -> LayerHandle {
        let kind = layer.kind();
        let slot = self.slot_mut(kind);
        if let Some(old) = slot.take() {
            map.remove_layer(old);
            debug!("Removed {:?} layer {}", kind, old);
        }
        let handle = map.add_layer(layer);
        *slot = Some(handle);
        debug!("Attached {:?} layer {}", kind, handle);
        handle
    }

    /// Remove the live layer of `kind` without a replacement. Returns whether one existed.
    pub fn clear<M: MapWidget + ?Sized>(&mut self, map: &mut M, kind: LayerKind) -> bool {
        match self.slot_mut(kind).take() {
            Some(old) => {
                map.remove_layer(old);
                debug!("Cleared {:?} layer {}", kind, old);
                true
            }
            None => false,
        }
    }

    pub fn live_count(&self) -> usize {
        LayerKind::ALL
            .iter()
            .filter(|kind| self.get(**kind).is_some())
            .count()
    }
}
