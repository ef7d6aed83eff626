//! Handler for the `init` command.

use colored::*;

use veriformat_lib::exit_codes::exit;
use veriformat_lib::init::create_default_config;

/// Create a default `.veriformat.toml` in the current directory.
pub fn handle_init() {
    let path = ".veriformat.toml";

    match create_default_config(path) {
        Ok(true) => {
            println!("Created default configuration file: {path}");
        }
        Ok(false) => {
            eprintln!("{}: Configuration file already exists: {path}", "Error".red().bold());
            exit::tool_error();
        }
        Err(e) => {
            eprintln!("{}: {e}", "Error".red().bold());
            exit::tool_error();
        }
    }
}
