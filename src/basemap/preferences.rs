use std::collections::HashMap;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde_json::{Map, Value};
use tempfile::NamedTempFile;
use tracing::{info, warn};

use crate::error::UhiMapperError;

/// Durable string key-value preferences.
pub trait PreferenceStore {
    fn get(&self, key: &str) -> Result<Option<String>, UhiMapperError>;

    fn set(&mut self, key: &str, value: &str) -> Result<(), UhiMapperError>;
}

/// Preferences kept in a flat JSON object on disk, rewritten atomically on every `set`.
#[derive(Debug)]
pub struct JsonPreferences {
    path: PathBuf,
    values: Map<String, Value>,
}

impl JsonPreferences {
    /// Open the store at `path`. A missing file is an empty store; a corrupt
    /// one is logged and replaced on the next write.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, UhiMapperError> {
        let path = path.into();
        let values = if path.exists() {
            let content = std::fs::read_to_string(&path).map_err(|e| {
                UhiMapperError::Preferences(format!("Failed to read {:?}: {}", path, e))
            })?;
            match serde_json::from_str::<Map<String, Value>>(&content) {
                Ok(values) => values,
                Err(e) => {
                    warn!("Ignoring unreadable preferences at {:?}: {}", path, e);
                    Map::new()
                }
            }
        } else {
            Map::new()
        };
        Ok(Self { path, values })
    }

    /// `<config dir>/uhi-mapper/preferences.json`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("uhi-mapper").join("preferences.json"))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn save(&self) -> Result<(), UhiMapperError> {
        let parent = self.path.parent().ok_or_else(|| {
            UhiMapperError::Preferences(format!("Path has no parent directory: {:?}", self.path))
        })?;
        std::fs::create_dir_all(parent)
            .map_err(|e| UhiMapperError::Preferences(format!("Failed to create {:?}: {}", parent, e)))?;

        let json = serde_json::to_string_pretty(&self.values)
            .map_err(|e| UhiMapperError::Preferences(format!("Failed to serialize: {}", e)))?;

        let mut temp = NamedTempFile::new_in(parent)
            .map_err(|e| UhiMapperError::Preferences(e.to_string()))?;
        temp.write_all(json.as_bytes())
            .map_err(|e| UhiMapperError::Preferences(e.to_string()))?;
        temp.flush()
            .map_err(|e| UhiMapperError::Preferences(e.to_string()))?;
        temp.persist(&self.path)
            .map_err(|e| UhiMapperError::Preferences(e.to_string()))?;
        Ok(())
    }
}

impl PreferenceStore for JsonPreferences {
    fn get(&self, key: &str) -> Result<Option<String>, UhiMapperError> {
        Ok(self
            .values
            .get(key)
            .and_then(|v| v.as_str().map(|s| s.to_string())))
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), UhiMapperError> {
        info!("Setting preference: {} = {}", key, value);
        self.values
            .insert(key.to_string(), Value::String(value.to_string()));
        self.save()
    }
}

/// Process-local preferences, for when no config directory is available.
#[derive(Debug, Default, Clone)]
pub struct MemoryPreferences {
    values: HashMap<String, String>,
}

impl PreferenceStore for MemoryPreferences {
    fn get(&self, key: &str) -> Result<Option<String>, UhiMapperError> {
        Ok(self.values.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), UhiMapperError> {
        self.values.insert(key.to_string(), value.to_string());
        Ok(())
    }
}
