mod bounds;
mod types;

pub use bounds::{Bounds, LatLng};
pub use types::{
    Feature, FeatureCollection, Geometry, HeatProperties, MitigationProperties, NestedFeature, Position,
};
