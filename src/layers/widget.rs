use super::{Layer, LayerHandle};
use crate::basemap::BaseMap;
use crate::geo::Bounds;

/// The slice of a map widget the session engine drives.
///
/// Implementations own the layer payloads once attached. Tile fetching,
/// pan/zoom and geocoding stay on the widget's side of this boundary.
pub trait MapWidget {
    fn add_layer(&mut self, layer: Layer) -> LayerHandle;

    fn remove_layer(&mut self, handle: LayerHandle);

    /// Extent of an attached layer, `None` for unknown handles or controls.
    fn layer_bounds(&self, handle: LayerHandle) -> Option<Bounds>;

    fn fit_bounds(&mut self, bounds: Bounds, padding: [u32; 2]);

    fn attach_base_layer(&mut self, base: BaseMap);

    fn detach_base_layer(&mut self, base: BaseMap);

    fn has_base_layer(&self, base: BaseMap) -> bool;
}
