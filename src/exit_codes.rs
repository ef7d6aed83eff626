/// Exit codes for veriformat
///
/// These exit codes allow editors and CI systems to tell a rejected source
/// file apart from a broken setup.
/// Success - The document was formatted
pub const SUCCESS: i32 = 0;

/// Formatting failed - verible rejected the input and reported diagnostics
pub const FORMAT_FAILED: i32 = 1;

/// Tool error - Missing executable, configuration error, timeout or an
/// unparseable formatter failure
pub const TOOL_ERROR: i32 = 2;

/// Helper functions for consistent exit behavior
pub mod exit {
    use super::{FORMAT_FAILED, SUCCESS, TOOL_ERROR};

    /// Exit with success code (0)
    pub fn success() -> ! {
        std::process::exit(SUCCESS);
    }

    /// Exit with format failed code (1)
    pub fn format_failed() -> ! {
        std::process::exit(FORMAT_FAILED);
    }

    /// Exit with tool error code (2)
    pub fn tool_error() -> ! {
        std::process::exit(TOOL_ERROR);
    }
}
