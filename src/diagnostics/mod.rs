//! Turning the formatter's error report into document diagnostics.
//!
//! [`parser`] reads verible's standard error into 1-based records,
//! [`position`] maps them onto 0-based document ranges and [`store`] keeps
//! the latest set per document.

pub mod parser;
pub mod position;
pub mod store;

pub use parser::{DiagnosticEnd, ParsedDiagnostic, STDIN_MARKER, parse_diagnostics, parse_line};
pub use position::{DocumentPosition, DocumentRange, translate};
pub use store::{DiagnosticCollection, FormatDiagnostic};

/// Parse a standard-error report straight into document diagnostics.
pub fn diagnostics_from_stderr(stderr: &str) -> Vec<FormatDiagnostic> {
    parse_diagnostics(stderr)
        .into_iter()
        .map(|parsed| FormatDiagnostic {
            range: translate(&parsed),
            message: parsed.message,
        })
        .collect()
}
