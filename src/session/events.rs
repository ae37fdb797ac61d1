use crate::error::FetchError;
use crate::geo::{FeatureCollection, HeatProperties, MitigationProperties};
use crate::validation::DateRange;

/// User controls the engine enables and disables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TriggerId {
    LoadHeat,
    LoadMitigation,
}

/// Discrete inputs to the session: user triggers and backend responses.
#[derive(Debug, Clone)]
pub enum Event {
    /// "Load heat data" clicked with the raw date inputs
    LoadHeatRequested { start: String, end: String },
    HeatLoaded(Result<FeatureCollection<HeatProperties>, FetchError>),
    /// "Show mitigation areas" clicked
    LoadMitigationRequested,
    MitigationLoaded(Result<FeatureCollection<MitigationProperties>, FetchError>),
}

impl Event {
    pub fn load_heat(start: impl Into<String>, end: impl Into<String>) -> Self {
        Event::LoadHeatRequested {
            start: start.into(),
            end: end.into(),
        }
    }
}

/// Backend work a handler asks the runner to perform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    FetchHeat(DateRange),
    FetchMitigation,
}
