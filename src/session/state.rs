use chrono::NaiveDate;
use serde::Serialize;

use crate::layers::LayerStore;
use crate::validation::DateRange;

/// Progress of one load track (heat or mitigation).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub enum TrackStatus {
    #[default]
    Idle,
    Loading,
    Ready,
    Error(String),
}

impl TrackStatus {
    pub fn is_loading(&self) -> bool {
        matches!(self, TrackStatus::Loading)
    }
}

/// Session-wide phase as shown to the user.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub enum Phase {
    #[default]
    Idle,
    LoadingHeat,
    LoadingMitigation,
    Ready,
    Error(String),
}

/// Everything one open analysis view owns. Discarded with the view.
#[derive(Debug, Clone)]
pub struct SessionState {
    /// Initial value of the date inputs
    pub(crate) default_range: DateRange,
    /// Last successfully loaded window; the dedup key
    pub(crate) current_range: Option<DateRange>,
    /// Window of the outstanding heat request
    pub(crate) pending_range: Option<DateRange>,
    pub(crate) heat: TrackStatus,
    pub(crate) mitigation: TrackStatus,
    /// Outcome of the most recently settled transition
    pub(crate) last_settled: Phase,
    pub(crate) layers: LayerStore,
}

impl SessionState {
    pub fn open(today: NaiveDate, window_days: i64) -> Self {
        Self {
            default_range: DateRange::last_days(today, window_days),
            current_range: None,
            pending_range: None,
            heat: TrackStatus::Idle,
            mitigation: TrackStatus::Idle,
            last_settled: Phase::Idle,
            layers: LayerStore::new(),
        }
    }

    pub fn default_range(&self) -> DateRange {
        self.default_range
    }

    pub fn current_range(&self) -> Option<DateRange> {
        self.current_range
    }

    pub fn heat_status(&self) -> &TrackStatus {
        &self.heat
    }

    pub fn mitigation_status(&self) -> &TrackStatus {
        &self.mitigation
    }

    pub fn layers(&self) -> &LayerStore {
        &self.layers
    }

    /// In-flight loads win over settled outcomes; heat is reported before mitigation.
    pub fn phase(&self) -> Phase {
        if self.heat.is_loading() {
            Phase::LoadingHeat
        } else if self.mitigation.is_loading() {
            Phase::LoadingMitigation
        } else {
            self.last_settled.clone()
        }
    }
}
