//! Document coordinates and translation from the formatter's coordinate space.
//!
//! verible reports 1-based lines and columns with an inclusive end column.
//! Documents use 0-based lines and characters with an exclusive end, so the
//! end column carries over unchanged while everything else is decremented.

use serde::{Deserialize, Serialize};

use super::parser::{DiagnosticEnd, ParsedDiagnostic};

/// A 0-based position inside a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct DocumentPosition {
    pub line: u32,
    pub character: u32,
}

impl DocumentPosition {
    pub const fn new(line: u32, character: u32) -> Self {
        Self { line, character }
    }
}

/// A 0-based, end-exclusive span inside a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct DocumentRange {
    pub start: DocumentPosition,
    pub end: DocumentPosition,
}

impl DocumentRange {
    pub const fn new(start_line: u32, start_character: u32, end_line: u32, end_character: u32) -> Self {
        Self {
            start: DocumentPosition::new(start_line, start_character),
            end: DocumentPosition::new(end_line, end_character),
        }
    }

    /// Span covering `text` from its first character to the end of its last line.
    ///
    /// Lines are split on `\n`; the end character is the length of the last
    /// line in UTF-16 code units, which is what LSP clients count by default.
    pub fn whole_document(text: &str) -> Self {
        let last_line = text.matches('\n').count();
        let tail = text.rsplit('\n').next().unwrap_or("");
        let tail = tail.strip_suffix('\r').unwrap_or(tail);

        Self::new(0, 0, to_u32(last_line), to_u32(tail.encode_utf16().count()))
    }

    /// Whether the range has no extent.
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

/// Map a diagnostic reported by the formatter onto the document.
///
/// Start line and column lose one. The end line loses one, but an explicit
/// end column is kept as-is: the tool's inclusive 1-based end column equals
/// the document's exclusive 0-based end column. A point diagnostic collapses
/// onto its start, and a line-only end reuses the translated start column.
/// Every value saturates at zero.
pub fn translate(diagnostic: &ParsedDiagnostic) -> DocumentRange {
    let start = DocumentPosition::new(
        diagnostic.start_line.saturating_sub(1),
        diagnostic.start_column.saturating_sub(1),
    );

    let end = match diagnostic.end {
        DiagnosticEnd::Point => start,
        DiagnosticEnd::Line(end_line) => DocumentPosition::new(end_line.saturating_sub(1), start.character),
        DiagnosticEnd::Explicit { line, column } => DocumentPosition::new(line.saturating_sub(1), column),
    };

    DocumentRange { start, end }
}

fn to_u32(value: usize) -> u32 {
    u32::try_from(value).unwrap_or(u32::MAX)
}
