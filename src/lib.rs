pub mod config;
pub mod diagnostics;
pub mod executor;
pub mod exit_codes;
pub mod flagfile;
pub mod init;
pub mod lsp;
pub mod pipeline;
pub mod publisher;

pub use crate::diagnostics::{DiagnosticCollection, DocumentPosition, DocumentRange, FormatDiagnostic};
pub use crate::executor::{ExecutorError, InvocationRequest, ProcessOutcome};
pub use crate::pipeline::{
    FormatContext, FormatReport, FormatRequest, FormatStatus, InFlightRequests, Notice, NoticeLevel, format_document,
};
pub use crate::publisher::{Publication, ReplacementEdit};
