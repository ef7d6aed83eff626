//! One formatting request from settings to published result.
//!
//! Executable lookup and flagfile resolution happen fresh for every request.
//! The request then runs the formatter and publishes either a whole-document
//! edit or diagnostics. User-facing feedback is returned as [`Notice`]s for
//! the host to display.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio_util::sync::CancellationToken;
use url::Url;

use crate::config::Settings;
use crate::diagnostics::{DiagnosticCollection, DocumentRange};
use crate::executor::{self, ExecutorError, InvocationRequest, LineSpan};
use crate::flagfile::{FlagfilePath, resolve_flagfile};
use crate::publisher::{Publication, ReplacementEdit, describe_exit, publish};

/// Severity of a user-facing notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Error,
    Warning,
}

/// A message the host should show to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            message: message.into(),
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Warning,
            message: message.into(),
        }
    }
}

/// How a request ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormatStatus {
    /// The tool succeeded and an edit was produced.
    Formatted,
    /// The tool rejected the input with parseable diagnostics.
    Rejected,
    /// The request failed without anything to anchor in the document.
    Failed,
    /// The result is no longer wanted and was discarded.
    Cancelled,
}

/// Everything a host needs to act on a finished request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatReport {
    pub status: FormatStatus,
    pub edit: Option<ReplacementEdit>,
    pub notices: Vec<Notice>,
    /// The document's entry in the diagnostic collection changed.
    pub diagnostics_changed: bool,
    /// Raw tool output for a log or console channel.
    pub log_message: Option<String>,
}

impl FormatReport {
    fn new(status: FormatStatus) -> Self {
        Self {
            status,
            edit: None,
            notices: Vec::new(),
            diagnostics_changed: false,
            log_message: None,
        }
    }

    /// The edits to hand back to an editor: zero or one.
    pub fn edits(&self) -> Vec<ReplacementEdit> {
        self.edit.iter().cloned().collect()
    }
}

/// A document to format.
#[derive(Debug, Clone)]
pub struct FormatRequest<'a> {
    pub uri: &'a Url,
    pub text: &'a str,
    /// Restrict formatting to the lines this range touches.
    pub range: Option<DocumentRange>,
    pub cancellation: CancellationToken,
}

/// Host-owned state a request reads.
#[derive(Debug, Clone, Copy)]
pub struct FormatContext<'a> {
    pub settings: &'a Settings,
    pub workspace_folders: &'a [PathBuf],
    pub diagnostics: &'a DiagnosticCollection,
}

/// Run one formatting request end to end.
pub async fn format_document(request: FormatRequest<'_>, context: FormatContext<'_>) -> FormatReport {
    let settings = context.settings;

    let executable = match executor::locate_executable(&settings.path) {
        Ok(executable) => executable,
        Err(e) => {
            log::error!("{e}");
            let mut report = FormatReport::new(FormatStatus::Failed);
            report.notices.push(Notice::error(format!("{e}.")));
            return report;
        }
    };

    let mut notices = Vec::new();

    let flagfile = match settings.flag_file.as_deref() {
        Some(configured) => match resolve_flagfile(configured, request.uri, context.workspace_folders).await {
            FlagfilePath::Resolved { path, .. } => Some(path),
            FlagfilePath::Unresolved => {
                log::warn!("Flagfile \"{configured}\" not found for {}", request.uri);
                notices.push(Notice::warning(format!("Flagfile \"{configured}\" not found.")));
                None
            }
        },
        None => None,
    };

    let arguments = executor::build_arguments(flagfile.as_deref(), request.range.as_ref().map(LineSpan::from_range));
    let invocation = InvocationRequest::new(executable, arguments, request.text.to_string())
        .with_cancellation(request.cancellation.clone())
        .with_timeout_ms(settings.timeout_ms);

    let outcome = executor::execute(&invocation).await;

    let mut report = match outcome {
        Ok(_) if request.cancellation.is_cancelled() => cancelled(request.uri),
        Ok(outcome) => {
            let exit_code = outcome.exit_code;
            let publication = publish(outcome, request.uri, request.text, context.diagnostics);
            let diagnostics_changed = publication.changed_diagnostics();

            let mut report = match publication {
                Publication::Edit(edit) => {
                    let mut report = FormatReport::new(FormatStatus::Formatted);
                    report.edit = Some(edit);
                    report
                }
                Publication::Diagnostics(_) => FormatReport::new(FormatStatus::Rejected),
                Publication::Unparseable { stderr, .. } => {
                    let mut report = FormatReport::new(FormatStatus::Failed);
                    report.notices.push(Notice::error("Formatting failed"));
                    report.log_message = Some(format!(
                        "Formatting failed with error (exit code={})\n{stderr}",
                        describe_exit(exit_code)
                    ));
                    report
                }
            };
            report.diagnostics_changed = diagnostics_changed;
            report
        }
        Err(ExecutorError::Cancelled { .. }) => cancelled(request.uri),
        Err(e) => {
            log::error!("Formatting {} failed: {e}", request.uri);
            let mut report = FormatReport::new(FormatStatus::Failed);
            report.notices.push(Notice::error(format!("Formatting failed: {e}")));
            report
        }
    };

    if report.status != FormatStatus::Cancelled {
        notices.append(&mut report.notices);
        report.notices = notices;
    }
    report
}

fn cancelled(uri: &Url) -> FormatReport {
    log::debug!("Discarding formatting result for {uri}: request cancelled");
    FormatReport::new(FormatStatus::Cancelled)
}

/// Tracks the running request per document so a newer one supersedes it.
#[derive(Debug, Clone, Default)]
pub struct InFlightRequests {
    running: Arc<Mutex<HashMap<Url, (u64, CancellationToken)>>>,
    next_id: Arc<AtomicU64>,
}

impl InFlightRequests {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a request for `uri`, cancelling whatever was running for it.
    pub fn begin(&self, uri: &Url) -> RequestGuard {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let token = CancellationToken::new();

        if let Some((previous_id, previous)) = self.lock().insert(uri.clone(), (id, token.clone())) {
            log::debug!("Request {id} for {uri} supersedes request {previous_id}");
            previous.cancel();
        }

        RequestGuard {
            tracker: self.clone(),
            uri: uri.clone(),
            id,
            token,
        }
    }

    /// Cancel the running request for `uri`, if any.
    pub fn cancel(&self, uri: &Url) {
        if let Some((id, token)) = self.lock().remove(uri) {
            log::debug!("Cancelling request {id} for {uri}");
            token.cancel();
        }
    }

    /// Cancel every running request.
    pub fn cancel_all(&self) {
        for (_, (_, token)) in self.lock().drain() {
            token.cancel();
        }
    }

    /// Number of documents with a running request.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn finish(&self, uri: &Url, id: u64) {
        let mut running = self.lock();
        if running.get(uri).is_some_and(|(current, _)| *current == id) {
            running.remove(uri);
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<Url, (u64, CancellationToken)>> {
        self.running.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Registration of one running request; unregisters on drop.
#[derive(Debug)]
pub struct RequestGuard {
    tracker: InFlightRequests,
    uri: Url,
    id: u64,
    token: CancellationToken,
}

impl RequestGuard {
    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }
}

impl Drop for RequestGuard {
    fn drop(&mut self) {
        self.tracker.finish(&self.uri, self.id);
    }
}
