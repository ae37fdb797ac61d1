use chrono::NaiveDate;
use tracing::warn;

use super::controller::{SessionController, SessionSettings};
use super::events::{Command, Event};
use crate::backend::BackendClient;
use crate::basemap::{restore_base_map, switch_base_map, BaseMap, PreferenceStore};
use crate::config::MapperConfig;
use crate::error::UhiMapperError;
use crate::layers::MapWidget;
use crate::notify::NoticeKind;

/// One open analysis view: the controller wired to a backend and a preference store.
///
/// Each call runs a trigger to completion, so within a track at most one
/// request is ever in flight and responses are consumed in issue order.
pub struct Session<M, B, P> {
    controller: SessionController<M>,
    backend: B,
    preferences: P,
    base_map: BaseMap,
}

impl<M, B, P> Session<M, B, P>
where
    M: MapWidget,
    B: BackendClient,
    P: PreferenceStore,
{
    /// Open a view on `map`, restoring the remembered backdrop.
    pub fn open(mut map: M, backend: B, preferences: P, config: &MapperConfig, today: NaiveDate) -> Self {
        let base_map = restore_base_map(&mut map, &preferences);
        Self {
            controller: SessionController::open(map, SessionSettings::from(config), today),
            backend,
            preferences,
            base_map,
        }
    }

    pub fn controller(&self) -> &SessionController<M> {
        &self.controller
    }

    pub fn map(&self) -> &M {
        self.controller.map()
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn preferences(&self) -> &P {
        &self.preferences
    }

    pub fn base_map(&self) -> BaseMap {
        self.base_map
    }

    /// Feed an event and execute whatever backend work it asks for.
    pub async fn trigger(&mut self, event: Event) {
        let mut next = self.controller.dispatch(event);
        while let Some(command) = next {
            let response = self.execute(command).await;
            next = self.controller.dispatch(response);
        }
    }

    pub async fn load_heat_data(&mut self, start: &str, end: &str) {
        self.trigger(Event::load_heat(start, end)).await
    }

    pub async fn load_mitigation(&mut self) {
        self.trigger(Event::LoadMitigationRequested).await
    }

    /// Switch the backdrop. Never touches analysis state; a failed save is
    /// reported but the switch stands.
    pub fn select_base_map(&mut self, base: BaseMap) -> Result<(), UhiMapperError> {
        self.base_map = base;
        let result = switch_base_map(self.controller.map_mut(), &mut self.preferences, base);
        if let Err(e) = &result {
            warn!("Failed to remember base map {}: {}", base, e);
        }
        result
    }

    async fn execute(&self, command: Command) -> Event {
        match command {
            Command::FetchHeat(range) => Event::HeatLoaded(self.backend.fetch_heat(&range).await),
            Command::FetchMitigation => Event::MitigationLoaded(self.backend.fetch_mitigation().await),
        }
    }

    /// Messages of notices still visible now.
    pub fn visible_notices(&self) -> Vec<(NoticeKind, String)> {
        self.controller
            .notices()
            .active()
            .into_iter()
            .map(|n| (n.kind, n.message.clone()))
            .collect()
    }
}
