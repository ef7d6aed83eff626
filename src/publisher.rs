//! Turning a finished formatter run into either an edit or diagnostics.
//!
//! A zero exit replaces the whole document with the tool's stdout and clears
//! the document's diagnostics; verible prints the complete document even for
//! `--lines` requests. Any other exit parses stderr: matched diagnostics
//! replace the document's set, and an unparseable report is handed back so
//! the caller can tell the user.

use url::Url;

use crate::diagnostics::{DiagnosticCollection, DocumentRange, FormatDiagnostic, diagnostics_from_stderr};
use crate::executor::ProcessOutcome;

/// A replacement of `range` with `new_text`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplacementEdit {
    pub range: DocumentRange,
    pub new_text: String,
}

impl ReplacementEdit {
    /// Replace all of `original` with `new_text`.
    pub fn whole_document(original: &str, new_text: String) -> Self {
        Self {
            range: DocumentRange::whole_document(original),
            new_text,
        }
    }
}

/// What was published for one outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Publication {
    /// Formatting succeeded; diagnostics were cleared.
    Edit(ReplacementEdit),
    /// Formatting failed with position-accurate diagnostics, now recorded.
    Diagnostics(Vec<FormatDiagnostic>),
    /// Formatting failed and nothing in stderr could be anchored.
    Unparseable { exit_code: Option<i32>, stderr: String },
}

impl Publication {
    pub fn edit(&self) -> Option<&ReplacementEdit> {
        match self {
            Self::Edit(edit) => Some(edit),
            _ => None,
        }
    }

    /// Whether the collection entry for the document was touched.
    pub fn changed_diagnostics(&self) -> bool {
        !matches!(self, Self::Unparseable { .. })
    }
}

/// Publish `outcome` for the document `uri` whose current text is `original`.
pub fn publish(outcome: ProcessOutcome, uri: &Url, original: &str, collection: &DiagnosticCollection) -> Publication {
    if outcome.succeeded() {
        collection.clear(uri);
        return Publication::Edit(ReplacementEdit::whole_document(original, outcome.stdout));
    }

    let diagnostics = diagnostics_from_stderr(&outcome.stderr);
    if diagnostics.is_empty() {
        log::error!(
            "Formatting failed with error (exit code={})\n{}",
            describe_exit(outcome.exit_code),
            outcome.stderr
        );
        return Publication::Unparseable {
            exit_code: outcome.exit_code,
            stderr: outcome.stderr,
        };
    }

    log::debug!("Recording {} diagnostic(s) for {uri}", diagnostics.len());
    collection.set(uri, diagnostics.clone());
    Publication::Diagnostics(diagnostics)
}

/// Exit code for log output; a missing code means the process was signalled.
pub fn describe_exit(exit_code: Option<i32>) -> String {
    exit_code.map_or_else(|| "none".to_string(), |code| code.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn uri() -> Url {
        Url::parse("file:///project/top.sv").unwrap()
    }

    fn outcome(exit_code: Option<i32>, stdout: &str, stderr: &str) -> ProcessOutcome {
        ProcessOutcome {
            exit_code,
            stdout: stdout.to_string(),
            stderr: stderr.to_string(),
        }
    }

    fn stale() -> FormatDiagnostic {
        FormatDiagnostic {
            range: DocumentRange::new(9, 0, 9, 3),
            message: "stale".to_string(),
        }
    }

    #[test]
    fn test_success_replaces_whole_document_and_clears() {
        let collection = DiagnosticCollection::new("verible");
        collection.set(&uri(), vec![stale()]);

        let publication = publish(
            outcome(Some(0), "module m;\n endmodule\n", ""),
            &uri(),
            "module m; endmodule",
            &collection,
        );

        assert_eq!(
            publication,
            Publication::Edit(ReplacementEdit {
                range: DocumentRange::new(0, 0, 0, 19),
                new_text: "module m;\n endmodule\n".to_string(),
            })
        );
        assert!(collection.get(&uri()).is_empty());
    }

    #[test]
    fn test_success_ignores_stderr_noise() {
        let collection = DiagnosticCollection::new("verible");
        let publication = publish(outcome(Some(0), "x\n", "<stdin>:1:1: warning"), &uri(), "x", &collection);
        assert!(publication.edit().is_some());
        assert!(collection.get(&uri()).is_empty());
    }

    #[test]
    fn test_failure_records_diagnostics() {
        let collection = DiagnosticCollection::new("verible");
        collection.set(&uri(), vec![stale()]);

        let publication = publish(
            outcome(Some(1), "", "<stdin>:2:5: unexpected token\n"),
            &uri(),
            "module m;\n  wire\n",
            &collection,
        );

        let expected = vec![FormatDiagnostic {
            range: DocumentRange::new(1, 4, 1, 4),
            message: "unexpected token".to_string(),
        }];
        assert_eq!(publication, Publication::Diagnostics(expected.clone()));
        assert_eq!(publication.edit(), None);
        assert_eq!(collection.get(&uri()), expected);
    }

    #[test]
    fn test_absent_exit_code_is_failure() {
        let collection = DiagnosticCollection::new("verible");
        let publication = publish(outcome(None, "partial", "<stdin>:1:1: killed"), &uri(), "x", &collection);
        assert!(matches!(publication, Publication::Diagnostics(_)));
    }

    #[test]
    fn test_unparseable_failure_keeps_store() {
        let collection = DiagnosticCollection::new("verible");
        collection.set(&uri(), vec![stale()]);

        let publication = publish(outcome(Some(2), "", "Segmentation fault\n"), &uri(), "x", &collection);

        assert_eq!(
            publication,
            Publication::Unparseable {
                exit_code: Some(2),
                stderr: "Segmentation fault\n".to_string()
            }
        );
        assert!(!publication.changed_diagnostics());
        assert_eq!(collection.get(&uri()), vec![stale()]);
    }

    #[test]
    fn test_describe_exit() {
        assert_eq!(describe_exit(Some(1)), "1");
        assert_eq!(describe_exit(None), "none");
    }
}
