use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{info, warn};
use url::Url;

use super::BackendClient;
use crate::config::MapperConfig;
use crate::error::{FetchError, UhiMapperError, GENERIC_BACKEND_MESSAGE};
use crate::geo::{FeatureCollection, HeatProperties, MitigationProperties};
use crate::validation::DateRange;

const USER_AGENT: &str = "uhi-mapper/0.1";

/// Optional tuning sent with mitigation requests; the backend has its own defaults.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MitigationQuery {
    pub threshold: Option<f64>,
    pub days: Option<u32>,
}

/// reqwest-backed client. Requests carry no timeout and are never cancelled.
pub struct HttpBackendClient {
    client: reqwest::Client,
    base_url: Url,
    mitigation_query: MitigationQuery,
}

impl HttpBackendClient {
    pub fn new(base_url: &str) -> Result<Self, UhiMapperError> {
        let mut base_url = Url::parse(base_url)
            .map_err(|e| UhiMapperError::Config(format!("Invalid backend URL '{}': {}", base_url, e)))?;
        // Url::join replaces the last segment unless the path ends with '/'
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| UhiMapperError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url,
            mitigation_query: MitigationQuery::default(),
        })
    }

    pub fn from_config(config: &MapperConfig) -> Result<Self, UhiMapperError> {
        Ok(Self::new(&config.backend_url)?.with_mitigation_query(MitigationQuery {
            threshold: config.mitigation_threshold,
            days: config.mitigation_days,
        }))
    }

    pub fn with_mitigation_query(mut self, query: MitigationQuery) -> Self {
        self.mitigation_query = query;
        self
    }

    pub fn heat_url(&self, range: &DateRange) -> Url {
        let mut url = self.endpoint("uhi-data");
        url.query_pairs_mut()
            .append_pair("start_date", &range.start_param())
            .append_pair("end_date", &range.end_param());
        url
    }

    pub fn mitigation_url(&self) -> Url {
        let mut url = self.endpoint("mitigation-suggestions");
        if let Some(threshold) = self.mitigation_query.threshold {
            url.query_pairs_mut()
                .append_pair("threshold", &threshold.to_string());
        }
        if let Some(days) = self.mitigation_query.days {
            url.query_pairs_mut().append_pair("days", &days.to_string());
        }
        url
    }

    fn endpoint(&self, path: &str) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().push(path);
        }
        url
    }

    async fn get_collection<P>(&self, url: Url) -> Result<FeatureCollection<P>, FetchError>
    where
        P: DeserializeOwned + Default,
    {
        info!("Fetching {}", url);
        let response = self.client.get(url.clone()).send().await.map_err(|e| {
            warn!("Request to {} failed: {}", url, e);
            FetchError::Transport(e.to_string())
        })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| {
            warn!("Failed to read response body from {}: {}", url, e);
            FetchError::Transport(e.to_string())
        })?;

        if !status.is_success() {
            let detail = backend_detail(&body);
            warn!("Backend returned {} for {}: {}", status.as_u16(), url, detail);
            return Err(FetchError::Backend {
                status: status.as_u16(),
                detail,
            });
        }

        serde_json::from_str(&body).map_err(|e| {
            warn!("Unreadable feature collection from {}: {}", url, e);
            FetchError::Backend {
                status: status.as_u16(),
                detail: "The analysis server returned an unreadable response".to_string(),
            }
        })
    }
}

impl BackendClient for HttpBackendClient {
    async fn fetch_heat(
        &self,
        range: &DateRange,
    ) -> Result<FeatureCollection<HeatProperties>, FetchError> {
        self.get_collection(self.heat_url(range)).await
    }

    async fn fetch_mitigation(&self) -> Result<FeatureCollection<MitigationProperties>, FetchError> {
        self.get_collection(self.mitigation_url()).await
    }
}

/// User-facing message from an error body.
///
/// Reads `{"detail": "..."}`; FastAPI validation errors carry a list of
/// `{"msg": ...}` objects instead. Anything else gets the generic phrase.
pub fn backend_detail(body: &str) -> String {
    let detail = serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v.get("detail").cloned());

    match detail {
        Some(Value::String(s)) if !s.trim().is_empty() => s,
        Some(Value::Array(items)) => {
            let msgs: Vec<&str> = items
                .iter()
                .filter_map(|item| item.get("msg").and_then(Value::as_str))
                .collect();
            if msgs.is_empty() {
                GENERIC_BACKEND_MESSAGE.to_string()
            } else {
                msgs.join("; ")
            }
        }
        _ => GENERIC_BACKEND_MESSAGE.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_heat_url() {
        let client = HttpBackendClient::new("http://localhost:8000").unwrap();
        let range = DateRange::parse("2024-01-01", "2024-01-31").unwrap();
        assert_eq!(
            client.heat_url(&range).as_str(),
            "http://localhost:8000/uhi-data?start_date=2024-01-01&end_date=2024-01-31"
        );
    }

    #[test]
    fn test_urls_keep_base_path() {
        let client = HttpBackendClient::new("https://example.org/api").unwrap();
        assert_eq!(
            client.mitigation_url().as_str(),
            "https://example.org/api/mitigation-suggestions"
        );

        let slashed = HttpBackendClient::new("https://example.org/api/").unwrap();
        assert_eq!(
            slashed.mitigation_url().as_str(),
            "https://example.org/api/mitigation-suggestions"
        );
    }

    #[test]
    fn test_mitigation_query_params() {
        let client = HttpBackendClient::new("http://localhost:8000")
            .unwrap()
            .with_mitigation_query(MitigationQuery {
                threshold: Some(2.5),
                days: Some(60),
            });
        assert_eq!(
            client.mitigation_url().as_str(),
            "http://localhost:8000/mitigation-suggestions?threshold=2.5&days=60"
        );
    }

    #[test]
    fn test_invalid_base_url() {
        assert!(matches!(
            HttpBackendClient::new("not a url"),
            Err(UhiMapperError::Config(_))
        ));
    }

    #[test]
    fn test_detail_string() {
        assert_eq!(
            backend_detail(r#"{"detail": "Earth Engine not initialized"}"#),
            "Earth Engine not initialized"
        );
    }

    #[test]
    fn test_detail_validation_list() {
        let body = r#"{"detail": [{"loc": ["query", "start_date"], "msg": "field required", "type": "value_error.missing"}]}"#;
        assert_eq!(backend_detail(body), "field required");
    }

    #[test]
    fn test_detail_fallback() {
        assert_eq!(backend_detail(""), GENERIC_BACKEND_MESSAGE);
        assert_eq!(backend_detail("<html>502 Bad Gateway</html>"), GENERIC_BACKEND_MESSAGE);
        assert_eq!(backend_detail(r#"{"detail": ""}"#), GENERIC_BACKEND_MESSAGE);
        assert_eq!(backend_detail(r#"{"error": "boom"}"#), GENERIC_BACKEND_MESSAGE);
    }

    #[tokio::test]
    async fn test_unreachable_server_is_transport_error() {
        // Port 9 (discard) on localhost is not expected to accept HTTP
        let client = HttpBackendClient::new("http://127.0.0.1:9").unwrap();
        let err = client.fetch_mitigation().await.unwrap_err();
        assert!(matches!(err, FetchError::Transport(_)), "got {:?}", err);
    }
}
