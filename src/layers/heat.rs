use serde::Serialize;
use tracing::debug;

use crate::classify::{classify, HeatBand};
use crate::geo::{Bounds, Feature, FeatureCollection, Geometry, HeatProperties};

pub const HEAT_FILL_OPACITY: f64 = 0.7;
pub const HEAT_OUTLINE_COLOR: &str = "#ffffff";
pub const HEAT_OUTLINE_WEIGHT: f64 = 1.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct HeatStyle {
    pub fill_color: &'static str,
    pub fill_opacity: f64,
    pub color: &'static str,
    pub weight: f64,
}

impl HeatStyle {
    pub fn for_band(band: HeatBand) -> Self {
        Self {
            fill_color: band.color(),
            fill_opacity: HEAT_FILL_OPACITY,
            color: HEAT_OUTLINE_COLOR,
            weight: HEAT_OUTLINE_WEIGHT,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StyledHeatFeature {
    /// Temperature the band was computed from (defaulted when missing)
    pub lst: f64,
    pub band: HeatBand,
    pub style: HeatStyle,
    pub popup: String,
    pub geometry: Option<Geometry>,
    pub properties: HeatProperties,
}

impl StyledHeatFeature {
    pub fn from_feature(feature: &Feature<HeatProperties>) -> Self {
        let props = &feature.properties;
        if props.lst.is_none() {
            debug!("Heat feature without LST, using default temperature");
        }
        let lst = props.lst_or_default();
        let band = classify(lst);
        Self {
            lst,
            band,
            style: HeatStyle::for_band(band),
            popup: heat_popup(props),
            geometry: feature.geometry.clone(),
            properties: props.clone(),
        }
    }
}

fn heat_popup(props: &HeatProperties) -> String {
    let lst = props
        .lst
        .map(|v| format!("{:.1}°C", v))
        .unwrap_or_else(|| "n/a".to_string());
    let ndvi = props
        .ndvi
        .map(|v| format!("{:.2}", v))
        .unwrap_or_else(|| "n/a".to_string());
    let uhi = props
        .uhi
        .map(|v| format!("{:.1}°C", v))
        .unwrap_or_else(|| "n/a".to_string());
    let period = match (&props.start_date, &props.end_date) {
        (Some(start), Some(end)) => format!("{} to {}", start, end),
        _ => "n/a".to_string(),
    };
    format!(
        "LST: {}\nNDVI: {}\nUHI: {}\nPeriod: {}",
        lst, ndvi, uhi, period
    )
}

/// Choropleth layer: one styled polygon per heat feature.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HeatLayer {
    pub features: Vec<StyledHeatFeature>,
}

impl HeatLayer {
    pub fn build(collection: &FeatureCollection<HeatProperties>) -> Self {
        Self {
            features: collection
                .features
                .iter()
                .map(StyledHeatFeature::from_feature)
                .collect(),
        }
    }

    pub fn bands(&self) -> Vec<HeatBand> {
        self.features.iter().map(|f| f.band).collect()
    }

    /// First data source reported by the backend, if any.
    pub fn data_source(&self) -> Option<&str> {
        self.features
            .iter()
            .find_map(|f| f.properties.data_source.as_deref())
    }

    /// First ground resolution reported by the backend, if any.
    pub fn resolution(&self) -> Option<&str> {
        self.features
            .iter()
            .find_map(|f| f.properties.resolution.as_deref())
    }

    pub fn bounds(&self) -> Option<Bounds> {
        self.features
            .iter()
            .filter_map(|f| f.geometry.as_ref()?.bounds())
            .reduce(Bounds::union)
    }
}
