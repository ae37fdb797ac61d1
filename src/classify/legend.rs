use serde::Serialize;

use super::HeatBand;
use crate::validation::DateRange;

pub const LEGEND_TITLE: &str = "Land Surface Temperature (°C)";

/// One labelled stop of the gradient legend.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LegendBand {
    pub label: &'static str,
    /// Exclusive lower bound shared with the classifier ladder
    pub lower_bound: f64,
    pub band: HeatBand,
    pub color: &'static str,
}

const LEGEND_STOPS: [(&str, f64, HeatBand); 4] = [
    ("40+", 40.0, HeatBand::Extreme),
    ("35", 35.0, HeatBand::High),
    ("30", 30.0, HeatBand::Warm),
    ("25", 25.0, HeatBand::Cool),
];

/// Labelled legend stops, hottest first.
pub fn legend_bands() -> Vec<LegendBand> {
    LEGEND_STOPS
        .iter()
        .map(|&(label, lower_bound, band)| LegendBand {
            label,
            lower_bound,
            band,
            color: band.color(),
        })
        .collect()
}

/// The legend control rebuilt on every successful heat load.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Legend {
    pub title: String,
    pub bands: Vec<LegendBand>,
    /// Active window, e.g. "2024-01-01 to 2024-01-31"
    pub range_label: String,
    pub data_source: Option<String>,
    /// Ground resolution reported by the backend, e.g. "500m"
    pub resolution: Option<String>,
}

impl Legend {
    pub fn for_range(range: &DateRange, data_source: Option<&str>, resolution: Option<&str>) -> Self {
        Self {
            title: LEGEND_TITLE.to_string(),
            bands: legend_bands(),
            range_label: range.to_string(),
            data_source: data_source.map(str::to_string),
            resolution: resolution.map(str::to_string),
        }
    }

    /// Text under the gradient: the window, then source and resolution when known.
    pub fn annotation(&self) -> String {
        let mut text = self.range_label.clone();
        match (&self.data_source, &self.resolution) {
            (Some(source), Some(resolution)) => text.push_str(&format!(" ({}, {})", source, resolution)),
            (Some(source), None) => text.push_str(&format!(" ({})", source)),
            (None, Some(resolution)) => text.push_str(&format!(" ({})", resolution)),
            (None, None) => {}
        }
        text
    }
}
