//! LSP type conversions and server options for veriformat
//!
//! Core types stay editor-neutral; this module maps them onto
//! `lsp_types` at the protocol boundary.

use tower_lsp::lsp_types::*;

use crate::config::{ConfigError, SettingsOverrides};
use crate::diagnostics::{DocumentPosition, DocumentRange, FormatDiagnostic};
use crate::pipeline::NoticeLevel;
use crate::publisher::ReplacementEdit;

/// Source label attached to published diagnostics
pub const DIAGNOSTIC_SOURCE: &str = "verible";

/// Options accepted in `initializationOptions`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VeriformatLspConfig {
    /// Path to a veriformat configuration file
    pub config_path: Option<String>,
    /// Formatter settings sent by the client
    pub settings: SettingsOverrides,
}

impl VeriformatLspConfig {
    pub fn from_initialization_options(value: &serde_json::Value) -> Result<Self, ConfigError> {
        let config_path = value
            .get("configPath")
            .or_else(|| value.get("config-path"))
            .and_then(|v| v.as_str())
            .map(str::to_string);

        Ok(Self {
            config_path,
            settings: SettingsOverrides::from_client_value(value)?,
        })
    }
}

pub fn to_lsp_position(position: DocumentPosition) -> Position {
    Position {
        line: position.line,
        character: position.character,
    }
}

pub fn to_lsp_range(range: DocumentRange) -> Range {
    Range {
        start: to_lsp_position(range.start),
        end: to_lsp_position(range.end),
    }
}

pub fn from_lsp_range(range: Range) -> DocumentRange {
    DocumentRange::new(range.start.line, range.start.character, range.end.line, range.end.character)
}

/// Convert a formatter diagnostic to an LSP diagnostic
pub fn format_diagnostic_to_lsp(diagnostic: &FormatDiagnostic) -> Diagnostic {
    Diagnostic {
        range: to_lsp_range(diagnostic.range),
        severity: Some(DiagnosticSeverity::ERROR),
        source: Some(DIAGNOSTIC_SOURCE.to_string()),
        message: diagnostic.message.clone(),
        ..Default::default()
    }
}

pub fn edit_to_lsp(edit: &ReplacementEdit) -> TextEdit {
    TextEdit {
        range: to_lsp_range(edit.range),
        new_text: edit.new_text.clone(),
    }
}

pub fn notice_message_type(level: NoticeLevel) -> MessageType {
    match level {
        NoticeLevel::Error => MessageType::ERROR,
        NoticeLevel::Warning => MessageType::WARNING,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_range_conversion_is_lossless() {
        let range = DocumentRange::new(3, 1, 7, 12);
        assert_eq!(from_lsp_range(to_lsp_range(range)), range);
    }

    #[test]
    fn test_diagnostic_conversion() {
        let diag = format_diagnostic_to_lsp(&FormatDiagnostic {
            range: DocumentRange::new(1, 4, 1, 4),
            message: "unexpected token".to_string(),
        });

        assert_eq!(diag.range.start, Position { line: 1, character: 4 });
        assert_eq!(diag.severity, Some(DiagnosticSeverity::ERROR));
        assert_eq!(diag.source.as_deref(), Some("verible"));
        assert_eq!(diag.message, "unexpected token");
    }

    #[test]
    fn test_initialization_options() {
        let value = serde_json::json!({
            "configPath": "/proj/.veriformat.toml",
            "verible-formatter": { "flagFile": ".verible.flags" }
        });

        let config = VeriformatLspConfig::from_initialization_options(&value).unwrap();
        assert_eq!(config.config_path.as_deref(), Some("/proj/.veriformat.toml"));
        assert_eq!(config.settings.flag_file.as_deref(), Some(".verible.flags"));
    }

    #[test]
    fn test_notice_levels() {
        assert_eq!(notice_message_type(NoticeLevel::Error), MessageType::ERROR);
        assert_eq!(notice_message_type(NoticeLevel::Warning), MessageType::WARNING);
    }
}
