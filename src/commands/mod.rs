//! Command handlers for the veriformat CLI.
//!
//! Each subcommand has its own module with a public handler function
//! that `main()` dispatches to.

pub mod format;
pub mod init;
pub mod server;
pub mod version;
