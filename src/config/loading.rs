use serde::Deserialize;
use std::path::{Path, PathBuf};

use super::types::{ConfigError, Settings, SettingsOverrides};

/// Config file names checked in each directory, in order of precedence.
pub const CONFIG_FILES: &[&str] = &[".veriformat.toml", "veriformat.toml", ".config/veriformat.toml"];

/// Keys understood in a config file, in either spelling.
const KNOWN_KEYS: &[&str] = &["path", "flag-file", "flagFile", "flagfile", "timeout-ms", "timeoutMs", "timeout"];

/// Maximum number of parent directories visited during discovery
const MAX_DEPTH: usize = 100;

/// Discover a configuration file by walking up from `start_dir`.
///
/// The walk stops after the first directory containing `.git`, so a config
/// outside the repository is never picked up.
pub fn discover_config_upward(start_dir: &Path) -> Option<PathBuf> {
    let mut current = if start_dir.is_relative() {
        std::env::current_dir()
            .map(|cwd| cwd.join(start_dir))
            .unwrap_or_else(|_| start_dir.to_path_buf())
    } else {
        start_dir.to_path_buf()
    };

    for _ in 0..MAX_DEPTH {
        log::debug!("[veriformat-config] Searching for config in: {}", current.display());

        if let Some(found) = CONFIG_FILES
            .iter()
            .map(|name| current.join(name))
            .find(|candidate| candidate.is_file())
        {
            log::debug!("[veriformat-config] Found config file: {}", found.display());
            return Some(found);
        }

        if current.join(".git").exists() {
            log::debug!("[veriformat-config] Stopping at .git directory");
            return None;
        }

        match current.parent() {
            Some(parent) => current = parent.to_path_buf(),
            None => {
                log::debug!("[veriformat-config] Reached filesystem root");
                return None;
            }
        }
    }

    log::debug!("[veriformat-config] Maximum traversal depth reached");
    None
}

/// Finds the project root by walking up from `start_dir` looking for `.git`.
pub fn find_project_root(start_dir: &Path) -> Option<PathBuf> {
    let mut current = start_dir.to_path_buf();

    for _ in 0..MAX_DEPTH {
        if current.join(".git").exists() {
            log::debug!("[veriformat-config] Found .git at: {}", current.display());
            return Some(current);
        }

        match current.parent() {
            Some(parent) => current = parent.to_path_buf(),
            None => break,
        }
    }

    None
}

/// Read one config file into a settings layer.
pub fn load_config_file(path: &Path) -> Result<SettingsOverrides, ConfigError> {
    let path_str = path.display().to_string();
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::IoError {
        source: e,
        path: path_str.clone(),
    })?;

    parse_config_toml(&content, &path_str)
}

/// Parse config file content, warning about keys that are not understood.
pub fn parse_config_toml(content: &str, display_path: &str) -> Result<SettingsOverrides, ConfigError> {
    let table: toml::Table = toml::from_str(content)
        .map_err(|e| ConfigError::ParseError(format!("{display_path}: Failed to parse TOML: {e}")))?;

    for key in table.keys().filter(|key| !KNOWN_KEYS.contains(&key.as_str())) {
        log::warn!("[veriformat-config] Unknown key '{key}' in {display_path}");
    }

    SettingsOverrides::deserialize(toml::Value::Table(table))
        .map_err(|e| ConfigError::ParseError(format!("{display_path}: {e}")))
}

/// Build settings from defaults and a project config file.
///
/// An explicit path must exist; otherwise a config is discovered upward from
/// `start_dir`. Returns the settings and the file they came from, if any.
pub fn load_settings(explicit: Option<&Path>, start_dir: &Path) -> Result<(Settings, Option<PathBuf>), ConfigError> {
    let config_path = match explicit {
        Some(path) if !path.exists() => {
            return Err(ConfigError::NotFound {
                path: path.display().to_string(),
            });
        }
        Some(path) => Some(path.to_path_buf()),
        None => discover_config_upward(start_dir),
    };

    let mut settings = Settings::default();
    if let Some(path) = &config_path {
        settings.apply(&load_config_file(path)?);
        log::info!("Loaded veriformat config from: {}", path.display());
    }

    Ok((settings, config_path))
}
