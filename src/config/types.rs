use serde::{Deserialize, Serialize};
use std::io;

/// Default executable, looked up on `PATH`.
pub const DEFAULT_EXECUTABLE: &str = "verible-verilog-format";

/// Default per-invocation timeout in milliseconds.
pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;

/// Effective formatter settings for one invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    /// Executable name or path
    pub path: String,
    /// Flagfile name or path, resolved per document
    pub flag_file: Option<String>,
    /// Invocation timeout in milliseconds (0 disables)
    pub timeout_ms: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            path: DEFAULT_EXECUTABLE.to_string(),
            flag_file: None,
            timeout_ms: DEFAULT_TIMEOUT_MS,
        }
    }
}

impl Settings {
    /// Layer `overrides` on top of these settings. Unset fields are kept.
    pub fn apply(&mut self, overrides: &SettingsOverrides) {
        if let Some(path) = &overrides.path {
            self.path = path.clone();
        }
        if let Some(flag_file) = &overrides.flag_file {
            // An empty value clears a flagfile configured by a lower layer
            self.flag_file = Some(flag_file.trim().to_string()).filter(|f| !f.is_empty());
        }
        if let Some(timeout_ms) = overrides.timeout_ms {
            self.timeout_ms = timeout_ms;
        }
    }

    pub fn with(mut self, overrides: &SettingsOverrides) -> Self {
        self.apply(overrides);
        self
    }
}

/// A partial settings layer: a config file, initialization options or a
/// configuration change pushed by the client.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsOverrides {
    #[serde(default)]
    pub path: Option<String>,

    #[serde(default, alias = "flag-file", alias = "flagfile")]
    pub flag_file: Option<String>,

    #[serde(default, alias = "timeout-ms", alias = "timeout")]
    pub timeout_ms: Option<u64>,
}

/// Keys a client may nest formatter settings under.
const CLIENT_SECTIONS: &[&str] = &["veriformat", "verible-formatter"];

impl SettingsOverrides {
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    /// Extract overrides from a client-supplied JSON payload.
    ///
    /// Accepts the settings bare or nested under one of the known sections.
    pub fn from_client_value(value: &serde_json::Value) -> Result<Self, ConfigError> {
        let section = CLIENT_SECTIONS
            .iter()
            .find_map(|key| value.get(*key))
            .unwrap_or(value);

        if section.is_null() {
            return Ok(Self::default());
        }

        serde_json::from_value(section.clone())
            .map_err(|e| ConfigError::ParseError(format!("Invalid client settings: {e}")))
    }
}

/// Errors that can occur when loading configuration
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file
    #[error("Failed to read config file at {path}: {source}")]
    IoError { source: io::Error, path: String },

    /// Failed to parse the configuration content (TOML or JSON)
    #[error("Failed to parse config: {0}")]
    ParseError(String),

    /// Explicitly requested config file does not exist
    #[error("Configuration file not found: {path}")]
    NotFound { path: String },
}
