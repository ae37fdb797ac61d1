//! Access to the satellite analysis backend.
//!
//! The engine depends on [`BackendClient`] only; [`HttpBackendClient`] is the
//! production implementation talking to the `/uhi-data` and
//! `/mitigation-suggestions` endpoints.

mod http_client;

use crate::error::FetchError;
use crate::geo::{FeatureCollection, HeatProperties, MitigationProperties};
use crate::validation::DateRange;

pub use http_client::{backend_detail, HttpBackendClient, MitigationQuery};

#[allow(async_fn_in_trait)]
pub trait BackendClient {
    async fn fetch_heat(
        &self,
        range: &DateRange,
    ) -> Result<FeatureCollection<HeatProperties>, FetchError>;

    async fn fetch_mitigation(&self) -> Result<FeatureCollection<MitigationProperties>, FetchError>;
}
