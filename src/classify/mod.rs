//! Land surface temperature classification.
//!
//! Continuous LST values are mapped onto a fixed ladder of ten colour bands.
//! The ladder is a contract shared with the legend: each band's lower bound
//! is exclusive (`> bound`) and bands are checked hottest first.
//!
//! # Example
//!
//! ```
//! use uhi_mapper::classify::{classify, HeatBand};
//!
//! assert_eq!(classify(41.0), HeatBand::Extreme);
//! assert_eq!(classify(40.0), HeatBand::High);
//! assert_eq!(classify(20.0), HeatBand::Cold);
//! ```

mod legend;

use serde::{Deserialize, Serialize};

pub use legend::{legend_bands, Legend, LegendBand, LEGEND_TITLE};

/// Temperature substituted when a feature carries no LST value.
pub const DEFAULT_LST: f64 = 25.0;

/// Colour band for a temperature, ordered coldest to hottest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum HeatBand {
    Cold,
    CoolGreen,
    Cooler,
    Cool,
    Mild,
    Warm,
    ModerateHigh,
    High,
    VeryHigh,
    Extreme,
}

/// Descending threshold ladder. Anything not above the last bound is `Cold`.
const LADDER: [(f64, HeatBand); 9] = [
    (40.0, HeatBand::Extreme),
    (37.0, HeatBand::VeryHigh),
    (35.0, HeatBand::High),
    (32.0, HeatBand::ModerateHigh),
    (30.0, HeatBand::Warm),
    (27.0, HeatBand::Mild),
    (25.0, HeatBand::Cool),
    (22.0, HeatBand::Cooler),
    (20.0, HeatBand::CoolGreen),
];

impl HeatBand {
    pub const ALL: [HeatBand; 10] = [
        HeatBand::Cold,
        HeatBand::CoolGreen,
        HeatBand::Cooler,
        HeatBand::Cool,
        HeatBand::Mild,
        HeatBand::Warm,
        HeatBand::ModerateHigh,
        HeatBand::High,
        HeatBand::VeryHigh,
        HeatBand::Extreme,
    ];

    /// Fill colour used on the map.
    pub fn color(&self) -> &'static str {
        match self {
            HeatBand::Extreme => "#800026",
            HeatBand::VeryHigh => "#bd0026",
            HeatBand::High => "#e31a1c",
            HeatBand::ModerateHigh => "#fc4e2a",
            HeatBand::Warm => "#fd8d3c",
            HeatBand::Mild => "#feb24c",
            HeatBand::Cool => "#fed976",
            HeatBand::Cooler => "#ffeda0",
            HeatBand::CoolGreen => "#a1d99b",
            HeatBand::Cold => "#31a354",
        }
    }

    /// Position on the scale, 0 = coldest.
    pub fn index(&self) -> usize {
        *self as usize
    }

    /// Exclusive lower bound of the band, `None` for `Cold`.
    pub fn lower_bound(&self) -> Option<f64> {
        LADDER
            .iter()
            .find(|(_, band)| band == self)
            .map(|(bound, _)| *bound)
    }
}

/// Classify a temperature in °C. Total: NaN falls through to `Cold`.
pub fn classify(temp_celsius: f64) -> HeatBand {
    LADDER
        .iter()
        .find(|(bound, _)| temp_celsius > *bound)
        .map(|(_, band)| *band)
        .unwrap_or(HeatBand::Cold)
}

/// Classify an optional reading, substituting [`DEFAULT_LST`] when absent.
pub fn classify_or_default(temp_celsius: Option<f64>) -> HeatBand {
    classify(temp_celsius.unwrap_or(DEFAULT_LST))
}
