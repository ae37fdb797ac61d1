use std::time::Duration;

use chrono::NaiveDate;
use tracing::{debug, info, warn};

use super::events::{Command, Event, TriggerId};
use super::state::{Phase, SessionState, TrackStatus};
use crate::classify::Legend;
use crate::config::MapperConfig;
use crate::error::{FetchError, LoadError};
use crate::geo::{FeatureCollection, HeatProperties, MitigationProperties};
use crate::layers::{HeatLayer, Layer, LayerKind, LoadingIndicator, MapWidget};
use crate::mitigation::MitigationLayer;
use crate::notify::{NoticeKind, NotificationChannel};
use crate::validation::DateRange;

/// Tunables the controller reads on every transition.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSettings {
    pub fit_padding: [u32; 2],
    pub mitigation_fit_limit: usize,
    pub cluster_cell_degrees: f64,
    pub notice_lifetime: Duration,
    pub default_window_days: i64,
}

impl From<&MapperConfig> for SessionSettings {
    fn from(config: &MapperConfig) -> Self {
        Self {
            fit_padding: config.fit_padding,
            mitigation_fit_limit: config.mitigation_fit_limit,
            cluster_cell_degrees: config.cluster_cell_degrees,
            notice_lifetime: config.notice_lifetime(),
            default_window_days: config.default_window_days,
        }
    }
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self::from(&MapperConfig::default())
    }
}

/// Owns the session state and the map, and turns [`Event`]s into state
/// transitions plus at most one [`Command`] for the backend.
///
/// Handlers never block; backend work is returned as a command and its
/// result comes back later as another event.
pub struct SessionController<M> {
    map: M,
    state: SessionState,
    notices: NotificationChannel,
    settings: SessionSettings,
}

impl<M: MapWidget> SessionController<M> {
    pub fn open(map: M, settings: SessionSettings, today: NaiveDate) -> Self {
        let state = SessionState::open(today, settings.default_window_days);
        info!("Opened analysis session, default window {}", state.default_range());
        Self {
            map,
            state,
            notices: NotificationChannel::new(settings.notice_lifetime),
            settings,
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn phase(&self) -> Phase {
        self.state.phase()
    }

    pub fn map(&self) -> &M {
        &self.map
    }

    pub fn map_mut(&mut self) -> &mut M {
        &mut self.map
    }

    pub fn notices(&self) -> &NotificationChannel {
        &self.notices
    }

    pub fn settings(&self) -> &SessionSettings {
        &self.settings
    }

    /// A trigger is disabled while its own request is outstanding.
    pub fn is_enabled(&self, trigger: TriggerId) -> bool {
        match trigger {
            TriggerId::LoadHeat => !self.state.heat.is_loading(),
            TriggerId::LoadMitigation => !self.state.mitigation.is_loading(),
        }
    }

    pub fn dispatch(&mut self, event: Event) -> Option<Command> {
        match event {
            Event::LoadHeatRequested { start, end } => self.on_load_heat(&start, &end),
            Event::HeatLoaded(result) => {
                self.on_heat_loaded(result);
                None
            }
            Event::LoadMitigationRequested => self.on_load_mitigation(),
            Event::MitigationLoaded(result) => {
                self.on_mitigation_loaded(result);
                None
            }
        }
    }

    fn on_load_heat(&mut self, start: &str, end: &str) -> Option<Command> {
        if !self.is_enabled(TriggerId::LoadHeat) {
            debug!("Heat load already in progress, ignoring trigger");
            return None;
        }

        let range = match DateRange::parse(start, end) {
            Ok(range) => range,
            Err(e) => {
                self.fail(TriggerId::LoadHeat, LoadError::from(e));
                return None;
            }
        };

        if self.state.current_range == Some(range) {
            info!("Heat data for {} already loaded, skipping request", range);
            self.settle(TriggerId::LoadHeat, TrackStatus::Ready);
            return None;
        }

        info!("Loading heat data for {}", range);
        self.state.heat = TrackStatus::Loading;
        self.state.pending_range = Some(range);
        self.state.layers.replace(
            &mut self.map,
            Layer::Loading(LoadingIndicator {
                message: format!("Loading heat data for {}", range),
            }),
        );
        Some(Command::FetchHeat(range))
    }

    fn on_heat_loaded(&mut self, result: Result<FeatureCollection<HeatProperties>, FetchError>) {
        let Some(range) = self.state.pending_range.take() else {
            warn!("Heat response arrived with no request outstanding, dropping it");
            return;
        };
        self.state.layers.clear(&mut self.map, LayerKind::Loading);

        let collection = match result {
            Ok(collection) => collection,
            Err(e) => {
                self.fail(TriggerId::LoadHeat, LoadError::from(e));
                return;
            }
        };

        let layer = HeatLayer::build(&collection);
        let count = layer.features.len();
        let legend = Legend::for_range(&range, layer.data_source(), layer.resolution());

        let handle = self.state.layers.replace(&mut self.map, Layer::Heat(layer));
        self.state.layers.replace(&mut self.map, Layer::Legend(legend));

        if count > 0 {
            if let Some(bounds) = self.map.layer_bounds(handle) {
                self.map.fit_bounds(bounds, self.settings.fit_padding);
            }
        }

        self.state.current_range = Some(range);
        self.settle(TriggerId::LoadHeat, TrackStatus::Ready);

        let message = if count == 0 {
            format!("No heat data returned for {}", range)
        } else {
            format!("Loaded {} heat features for {}", count, range)
        };
        self.notices.show(message, NoticeKind::Info);
    }

    fn on_load_mitigation(&mut self) -> Option<Command> {
        if !self.is_enabled(TriggerId::LoadMitigation) {
            debug!("Mitigation load already in progress, ignoring trigger");
            return None;
        }
        info!("Loading mitigation suggestions");
        self.state.mitigation = TrackStatus::Loading;
        Some(Command::FetchMitigation)
    }

    fn on_mitigation_loaded(
        &mut self,
        result: Result<FeatureCollection<MitigationProperties>, FetchError>,
    ) {
        if !self.state.mitigation.is_loading() {
            warn!("Mitigation response arrived with no request outstanding, dropping it");
            return;
        }

        let collection = match result {
            Ok(collection) => collection,
            Err(e) => {
                self.fail(TriggerId::LoadMitigation, LoadError::from(e));
                return;
            }
        };

        // the fit limit applies to what the backend returned, placeable or not
        let feature_count = collection.len();
        let layer = MitigationLayer::build(&collection, self.settings.cluster_cell_degrees);
        let count = layer.markers.len();
        let handle = self
            .state
            .layers
            .replace(&mut self.map, Layer::Mitigation(layer));

        if count > 0 && feature_count < self.settings.mitigation_fit_limit {
            if let Some(bounds) = self.map.layer_bounds(handle) {
                self.map.fit_bounds(bounds, self.settings.fit_padding);
            }
        } else if count > 0 {
            debug!("{} mitigation features, leaving viewport unchanged", feature_count);
        }

        self.settle(TriggerId::LoadMitigation, TrackStatus::Ready);
        self.notices.show(
            format!("Loaded {} mitigation suggestions", count),
            NoticeKind::Info,
        );
    }

    /// Report a failure. Layers from the last good load stay attached.
    fn fail(&mut self, trigger: TriggerId, err: LoadError) {
        let message = err.to_string();
        warn!("{:?} failed: {}", trigger, message);
        self.notices.show(message.clone(), NoticeKind::Error);
        self.settle(trigger, TrackStatus::Error(message));
    }

    fn settle(&mut self, trigger: TriggerId, status: TrackStatus) {
        self.state.last_settled = match &status {
            TrackStatus::Error(message) => Phase::Error(message.clone()),
            TrackStatus::Ready => Phase::Ready,
            TrackStatus::Idle => Phase::Idle,
            TrackStatus::Loading => self.state.last_settled.clone(),
        };
        match trigger {
            TriggerId::LoadHeat => self.state.heat = status,
            TriggerId::LoadMitigation => self.state.mitigation = status,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::HeatBand;
    use crate::geo::{Feature, Geometry};
    use crate::layers::{HeadlessMap, MapOp};

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 30).unwrap()
    }

    fn controller() -> SessionController<HeadlessMap> {
        SessionController::open(HeadlessMap::new(), SessionSettings::default(), today())
    }

    fn heat(lsts: &[Option<f64>]) -> FeatureCollection<HeatProperties> {
        FeatureCollection::new(
            lsts.iter()
                .enumerate()
                .map(|(i, lst)| {
                    let lat = 31.3 + i as f64 * 0.01;
                    Feature::new(
                        Some(Geometry::polygon(&[(lat, 74.1), (lat, 74.2), (lat + 0.01, 74.2), (lat, 74.1)])),
                        HeatProperties {
                            lst: *lst,
                            ..HeatProperties::default()
                        },
                    )
                })
                .collect(),
        )
    }

    fn mitigation(n: usize) -> FeatureCollection<MitigationProperties> {
        FeatureCollection::new(
            (0..n)
                .map(|i| {
                    Feature::new(
                        Some(Geometry::point(31.3 + i as f64 * 0.0001, 74.2)),
                        MitigationProperties::default(),
                    )
                })
                .collect(),
        )
    }

    fn heat_layer(c: &SessionController<HeadlessMap>) -> &HeatLayer {
        let handle = c.state().layers().get(LayerKind::Heat).unwrap();
        match c.map().layer(handle) {
            Some(Layer::Heat(layer)) => layer,
            other => panic!("expected heat layer, got {:?}", other),
        }
    }

    #[test]
    fn test_opens_idle_with_default_window() {
        let c = controller();
        assert_eq!(c.phase(), Phase::Idle);
        assert_eq!(c.state().current_range(), None);
        assert_eq!(c.state().default_range().to_string(), "2024-05-31 to 2024-06-30");
        assert_eq!(c.state().layers().live_count(), 0);
        assert!(c.is_enabled(TriggerId::LoadHeat));
        assert!(c.is_enabled(TriggerId::LoadMitigation));
    }

    #[test]
    fn test_heat_trigger_shows_loading_and_disables() {
        let mut c = controller();
        let cmd = c.dispatch(Event::load_heat("2024-01-01", "2024-01-31"));
        let range = DateRange::parse("2024-01-01", "2024-01-31").unwrap();
        assert_eq!(cmd, Some(Command::FetchHeat(range)));
        assert_eq!(c.phase(), Phase::LoadingHeat);
        assert!(!c.is_enabled(TriggerId::LoadHeat));
        assert!(c.is_enabled(TriggerId::LoadMitigation));
        assert_eq!(c.map().layers_of(LayerKind::Loading).len(), 1);
    }

    #[test]
    fn test_reentrant_heat_trigger_is_ignored() {
        let mut c = controller();
        assert!(c.dispatch(Event::load_heat("2024-01-01", "2024-01-31")).is_some());
        assert!(c.dispatch(Event::load_heat("2024-02-01", "2024-02-28")).is_none());
        assert_eq!(c.map().layers_of(LayerKind::Loading).len(), 1);

        c.dispatch(Event::HeatLoaded(Ok(heat(&[Some(30.0)]))));
        assert_eq!(
            c.state().current_range(),
            Some(DateRange::parse("2024-01-01", "2024-01-31").unwrap())
        );
    }

    #[test]
    fn test_successful_heat_load() {
        let mut c = controller();
        c.dispatch(Event::load_heat("2024-01-01", "2024-01-31"));
        c.dispatch(Event::HeatLoaded(Ok(heat(&[Some(41.0), Some(33.0), Some(18.0)]))));

        assert_eq!(c.phase(), Phase::Ready);
        assert!(c.is_enabled(TriggerId::LoadHeat));
        assert_eq!(c.state().layers().get(LayerKind::Loading), None);
        assert!(c.map().layers_of(LayerKind::Loading).is_empty());
        assert_eq!(
            heat_layer(&c).bands(),
            vec![HeatBand::Extreme, HeatBand::ModerateHigh, HeatBand::Cold]
        );
        assert_eq!(c.map().layers_of(LayerKind::Legend).len(), 1);
        assert_eq!(c.map().fit_count(), 1);
        assert_eq!(c.notices().latest().unwrap().kind, NoticeKind::Info);
    }

    #[test]
    fn test_legend_rebuilt_per_load() {
        let mut c = controller();
        c.dispatch(Event::load_heat("2024-01-01", "2024-01-31"));
        c.dispatch(Event::HeatLoaded(Ok(heat(&[Some(30.0)]))));
        c.dispatch(Event::load_heat("2024-02-01", "2024-02-29"));
        c.dispatch(Event::HeatLoaded(Ok(heat(&[Some(30.0)]))));

        let legends = c.map().layers_of(LayerKind::Legend);
        assert_eq!(legends.len(), 1);
        match legends[0] {
            Layer::Legend(legend) => assert_eq!(legend.range_label, "2024-02-01 to 2024-02-29"),
            other => panic!("expected legend, got {:?}", other),
        }
    }

    #[test]
    fn test_empty_heat_result_does_not_fit() {
        let mut c = controller();
        c.dispatch(Event::load_heat("2024-01-01", "2024-01-31"));
        c.dispatch(Event::HeatLoaded(Ok(heat(&[]))));
        assert_eq!(c.phase(), Phase::Ready);
        assert_eq!(c.map().fit_count(), 0);
        assert_eq!(c.map().layers_of(LayerKind::Heat).len(), 1);
        assert!(c.notices().latest().unwrap().message.starts_with("No heat data"));
    }

    #[test]
    fn test_invalid_range_never_issues_request() {
        let mut c = controller();
        assert!(c.dispatch(Event::load_heat("2024-02-01", "2024-01-01")).is_none());
        assert!(matches!(c.phase(), Phase::Error(_)));
        assert!(c.is_enabled(TriggerId::LoadHeat));
        assert_eq!(c.map().layer_count(), 0);
        let notice = c.notices().latest().unwrap();
        assert_eq!(notice.kind, NoticeKind::Error);
        assert_eq!(notice.message, "Start date must be on or before the end date");

        assert!(c.dispatch(Event::load_heat("2023-01-01", "2024-06-01")).is_none());
        assert!(c.dispatch(Event::load_heat("garbage", "2024-06-01")).is_none());
    }

    #[test]
    fn test_failed_reload_keeps_last_good_layers() {
        let mut c = controller();
        c.dispatch(Event::load_heat("2024-01-01", "2024-01-31"));
        c.dispatch(Event::HeatLoaded(Ok(heat(&[Some(36.0)]))));
        let heat_handle = c.state().layers().get(LayerKind::Heat);
        let legend_handle = c.state().layers().get(LayerKind::Legend);

        c.dispatch(Event::load_heat("2024-03-01", "2024-03-31"));
        c.dispatch(Event::HeatLoaded(Err(FetchError::Backend {
            status: 500,
            detail: "Earth Engine quota exceeded".to_string(),
        })));

        assert_eq!(c.phase(), Phase::Error("Earth Engine quota exceeded".to_string()));
        assert!(c.is_enabled(TriggerId::LoadHeat));
        assert_eq!(c.state().layers().get(LayerKind::Heat), heat_handle);
        assert_eq!(c.state().layers().get(LayerKind::Legend), legend_handle);
        assert_eq!(c.state().layers().get(LayerKind::Loading), None);
        assert_eq!(heat_layer(&c).bands(), vec![HeatBand::High]);
        assert_eq!(
            c.state().current_range(),
            Some(DateRange::parse("2024-01-01", "2024-01-31").unwrap())
        );
    }

    #[test]
    fn test_unchanged_range_is_noop_after_error() {
        let mut c = controller();
        c.dispatch(Event::load_heat("2024-01-01", "2024-01-31"));
        c.dispatch(Event::HeatLoaded(Ok(heat(&[Some(30.0)]))));
        c.dispatch(Event::load_heat("2024-05-01", "2024-04-01"));
        assert!(matches!(c.phase(), Phase::Error(_)));

        assert!(c.dispatch(Event::load_heat("2024-01-01", "2024-01-31")).is_none());
        assert_eq!(c.phase(), Phase::Ready);
    }

    #[test]
    fn test_stray_response_is_dropped() {
        let mut c = controller();
        c.dispatch(Event::HeatLoaded(Ok(heat(&[Some(30.0)]))));
        c.dispatch(Event::MitigationLoaded(Ok(mitigation(3))));
        assert_eq!(c.map().layer_count(), 0);
        assert_eq!(c.phase(), Phase::Idle);
    }

    #[test]
    fn test_mitigation_always_requests() {
        let mut c = controller();
        for _ in 0..3 {
            assert_eq!(c.dispatch(Event::LoadMitigationRequested), Some(Command::FetchMitigation));
            assert_eq!(c.phase(), Phase::LoadingMitigation);
            assert!(c.dispatch(Event::LoadMitigationRequested).is_none());
            c.dispatch(Event::MitigationLoaded(Ok(mitigation(2))));
        }
        assert_eq!(c.map().layers_of(LayerKind::Mitigation).len(), 1);
        assert_eq!(c.phase(), Phase::Ready);
    }

    #[test]
    fn test_large_mitigation_result_keeps_viewport() {
        let mut c = controller();
        c.dispatch(Event::LoadMitigationRequested);
        c.dispatch(Event::MitigationLoaded(Ok(mitigation(1000))));
        assert_eq!(c.map().fit_count(), 0);
        assert_eq!(c.map().layers_of(LayerKind::Mitigation).len(), 1);

        c.dispatch(Event::LoadMitigationRequested);
        c.dispatch(Event::MitigationLoaded(Ok(mitigation(999))));
        assert_eq!(c.map().fit_count(), 1);
    }

    #[test]
    fn test_fit_limit_counts_unplaceable_features() {
        let mut features = mitigation(998).features;
        features.push(Feature::new(None, MitigationProperties::default()));
        features.push(Feature::new(None, MitigationProperties::default()));

        let mut c = controller();
        c.dispatch(Event::LoadMitigationRequested);
        c.dispatch(Event::MitigationLoaded(Ok(FeatureCollection::new(features))));

        match c.map().layers_of(LayerKind::Mitigation)[0] {
            Layer::Mitigation(layer) => assert_eq!(layer.markers.len(), 998),
            other => panic!("expected mitigation layer, got {:?}", other),
        }
        assert_eq!(c.map().fit_count(), 0);
    }

    #[test]
    fn test_mitigation_failure_keeps_prior_layer() {
        let mut c = controller();
        c.dispatch(Event::LoadMitigationRequested);
        c.dispatch(Event::MitigationLoaded(Ok(mitigation(2))));
        let before = c.state().layers().get(LayerKind::Mitigation);

        c.dispatch(Event::LoadMitigationRequested);
        c.dispatch(Event::MitigationLoaded(Err(FetchError::Transport(
            "connection reset".to_string(),
        ))));
        assert_eq!(c.state().layers().get(LayerKind::Mitigation), before);
        assert!(c.is_enabled(TriggerId::LoadMitigation));
        assert_eq!(
            c.phase(),
            Phase::Error("Could not reach the analysis server".to_string())
        );
    }

    #[test]
    fn test_tracks_are_independent() {
        let mut c = controller();
        c.dispatch(Event::load_heat("2024-01-01", "2024-01-31"));
        assert!(c.dispatch(Event::LoadMitigationRequested).is_some());
        c.dispatch(Event::MitigationLoaded(Ok(mitigation(1))));
        assert_eq!(c.phase(), Phase::LoadingHeat);

        c.dispatch(Event::HeatLoaded(Ok(heat(&[Some(30.0)]))));
        assert_eq!(c.phase(), Phase::Ready);
        assert_eq!(c.state().layers().live_count(), 3);
    }

    #[test]
    fn test_loading_removed_before_heat_attached() {
        let mut c = controller();
        c.dispatch(Event::load_heat("2024-01-01", "2024-01-31"));
        c.dispatch(Event::HeatLoaded(Ok(heat(&[Some(30.0)]))));
        let kinds: Vec<_> = c
            .map()
            .ops()
            .iter()
            .filter_map(|op| match op {
                MapOp::Added(_, kind) => Some(format!("+{:?}", kind)),
                MapOp::Removed(_, kind) => Some(format!("-{:?}", kind)),
                _ => None,
            })
            .collect();
        assert_eq!(kinds, vec!["+Loading", "-Loading", "+Heat", "+Legend"]);
    }
}
