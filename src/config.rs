//! Engine configuration.
//!
//! Loaded from TOML, every field optional:
//!
//! ```toml
//! backend_url = "http://localhost:8000"
//! fit_padding = [20, 20]
//! mitigation_fit_limit = 1000
//! notice_lifetime_secs = 5
//! default_window_days = 30
//! cluster_cell_degrees = 0.01
//! mitigation_threshold = 2.0
//! mitigation_days = 30
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::basemap::JsonPreferences;
use crate::error::UhiMapperError;

/// Environment variable overriding `backend_url`.
pub const BACKEND_URL_ENV: &str = "UHI_MAPPER_BACKEND_URL";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapperConfig {
    pub backend_url: String,
    /// Pixel padding passed to `fit_bounds`
    pub fit_padding: [u32; 2],
    /// Mitigation results this large or larger do not move the viewport
    pub mitigation_fit_limit: usize,
    pub notice_lifetime_secs: u64,
    /// Initial analysis window, ending today
    pub default_window_days: i64,
    /// Grid size for mitigation clustering; 0 disables grouping
    pub cluster_cell_degrees: f64,
    /// Minimum UHI intensity (°C) sent with mitigation requests
    pub mitigation_threshold: Option<f64>,
    /// Analysis period (days) sent with mitigation requests
    pub mitigation_days: Option<u32>,
    pub preferences_path: Option<PathBuf>,
}

impl Default for MapperConfig {
    fn default() -> Self {
        Self {
            backend_url: "http://localhost:8000".to_string(),
            fit_padding: [20, 20],
            mitigation_fit_limit: 1000,
            notice_lifetime_secs: 5,
            default_window_days: 30,
            cluster_cell_degrees: 0.01,
            mitigation_threshold: None,
            mitigation_days: None,
            preferences_path: None,
        }
    }
}

impl MapperConfig {
    pub fn from_toml(content: &str) -> Result<Self, UhiMapperError> {
        toml::from_str(content).map_err(|e| UhiMapperError::Config(e.to_string()))
    }

    pub fn load_from(path: &Path) -> Result<Self, UhiMapperError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| UhiMapperError::Config(format!("Failed to read {:?}: {}", path, e)))?;
        let config = Self::from_toml(&content)?;
        info!("Loaded config from {:?}", path);
        Ok(config)
    }

    /// Load `explicit`, else the default config file if it exists, else
    /// defaults; then apply the environment override.
    pub fn load(explicit: Option<&Path>) -> Result<Self, UhiMapperError> {
        let config = match explicit {
            Some(path) => Self::load_from(path)?,
            None => match Self::default_path().filter(|p| p.exists()) {
                Some(path) => Self::load_from(&path)?,
                None => Self::default(),
            },
        };
        Ok(config.with_backend_url_override(std::env::var(BACKEND_URL_ENV).ok()))
    }

    /// `<config dir>/uhi-mapper/config.toml`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("uhi-mapper").join("config.toml"))
    }

    pub fn with_backend_url_override(mut self, url: Option<String>) -> Self {
        if let Some(url) = url.filter(|u| !u.trim().is_empty()) {
            info!("Backend URL overridden to {}", url);
            self.backend_url = url;
        }
        self
    }

    pub fn notice_lifetime(&self) -> Duration {
        Duration::from_secs(self.notice_lifetime_secs)
    }

    pub fn preferences_path(&self) -> Option<PathBuf> {
        self.preferences_path
            .clone()
            .or_else(JsonPreferences::default_path)
    }
}
