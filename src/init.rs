//!
//! This module provides initialization utilities for veriformat, such as creating default configuration files.

use std::fs;
use std::io;
use std::path::Path;
use thiserror::Error;

/// Error type for initialization operations
#[derive(Error, Debug)]
pub enum InitError {
    #[error("Failed to access file {path}: {source}")]
    IoError { source: io::Error, path: String },
}

/// Content written by `veriformat init`
pub const DEFAULT_CONFIG: &str = r#"# veriformat configuration file

# verible-verilog-format executable, looked up on PATH unless absolute
path = "verible-verilog-format"

# Flagfile with extra formatter options. Tried as given, then relative to
# the formatted file, then relative to the workspace root.
# flag-file = ".verible-format.flags"

# Kill the formatter after this many milliseconds (0 disables the limit)
timeout-ms = 30000
"#;

/// Create a default configuration file at the specified path.
///
/// Returns `true` if the file was created, or `false` if it already exists.
///
/// # Errors
///
/// Returns an error if the file cannot be created due to permissions or other I/O errors.
pub fn create_default_config(path: &str) -> Result<bool, InitError> {
    if Path::new(path).exists() {
        return Ok(false);
    }

    fs::write(path, DEFAULT_CONFIG).map_err(|e| InitError::IoError {
        source: e,
        path: path.to_string(),
    })?;

    Ok(true)
}
