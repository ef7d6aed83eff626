//!
//! This module defines formatter settings and how they are layered: built-in
//! defaults, a project `.veriformat.toml`, then whatever the editor sends.

pub mod types;
pub use types::*;

mod loading;
pub use loading::{
    CONFIG_FILES, discover_config_upward, find_project_root, load_config_file, load_settings, parse_config_toml,
};
