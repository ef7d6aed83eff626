//! Parser for the formatter's standard-error report.
//!
//! Input arrives on standard input, so verible names it with a fixed marker
//! instead of a file name. Each relevant line looks like
//!
//! ```text
//! <stdin>:LINE:COLUMN[:ENDLINE:ENDCOLUMN | -ENDLINE]: message
//! ```
//!
//! Lines without the marker (banners, summary counts) are skipped, as are
//! marked lines whose location does not follow the grammar.

/// Token verible prints in place of a file name for piped input.
pub const STDIN_MARKER: &str = "<stdin>";

/// How a diagnostic's location ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagnosticEnd {
    /// `LINE:COLUMN:` with no end; the diagnostic is a single point.
    Point,
    /// `LINE:COLUMN-ENDLINE:`; the end column is implied by the start column.
    Line(u32),
    /// `LINE:COLUMN:ENDLINE:ENDCOLUMN:`.
    Explicit { line: u32, column: u32 },
}

/// One diagnostic in the formatter's 1-based coordinates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedDiagnostic {
    pub start_line: u32,
    pub start_column: u32,
    pub end: DiagnosticEnd,
    pub message: String,
}

impl ParsedDiagnostic {
    /// 1-based end line, falling back to the start line.
    pub fn end_line(&self) -> u32 {
        match self.end {
            DiagnosticEnd::Point => self.start_line,
            DiagnosticEnd::Line(line) | DiagnosticEnd::Explicit { line, .. } => line,
        }
    }

    /// 1-based end column, falling back to the start column.
    pub fn end_column(&self) -> u32 {
        match self.end {
            DiagnosticEnd::Point | DiagnosticEnd::Line(_) => self.start_column,
            DiagnosticEnd::Explicit { column, .. } => column,
        }
    }
}

/// Parse every recognisable diagnostic out of the formatter's standard error.
pub fn parse_diagnostics(stderr: &str) -> Vec<ParsedDiagnostic> {
    stderr.lines().filter_map(parse_line).collect()
}

/// Parse a single line of standard error.
///
/// Returns `None` for lines without the marker or with a malformed location.
pub fn parse_line(line: &str) -> Option<ParsedDiagnostic> {
    let line = line.trim();
    let marker = format!("{STDIN_MARKER}:");

    line.match_indices(&marker)
        .find_map(|(idx, _)| parse_location(&line[idx + marker.len()..]))
}

fn parse_location(input: &str) -> Option<ParsedDiagnostic> {
    let mut cursor = Cursor::new(input);

    let start_line = cursor.number()?;
    if !cursor.eat(':') {
        return None;
    }
    let start_column = cursor.number()?;

    let end = parse_end(&mut cursor)?;

    let message = cursor.rest.strip_prefix(' ').unwrap_or(cursor.rest);

    Some(ParsedDiagnostic {
        start_line,
        start_column,
        end,
        message: message.to_string(),
    })
}

/// Parse the optional end suffix together with the terminating colon.
///
/// Shapes are tried in order: explicit pair, end line, nothing.
fn parse_end(cursor: &mut Cursor<'_>) -> Option<DiagnosticEnd> {
    let mut explicit = cursor.clone();
    if explicit.eat(':')
        && let Some(line) = explicit.number()
        && explicit.eat(':')
        && let Some(column) = explicit.number()
        && explicit.eat(':')
    {
        *cursor = explicit;
        return Some(DiagnosticEnd::Explicit { line, column });
    }

    let mut ranged = cursor.clone();
    if ranged.eat('-')
        && let Some(line) = ranged.number()
        && ranged.eat(':')
    {
        *cursor = ranged;
        return Some(DiagnosticEnd::Line(line));
    }

    cursor.eat(':').then_some(DiagnosticEnd::Point)
}

#[derive(Clone)]
struct Cursor<'a> {
    rest: &'a str,
}

impl<'a> Cursor<'a> {
    fn new(input: &'a str) -> Self {
        Self { rest: input }
    }

    fn eat(&mut self, expected: char) -> bool {
        match self.rest.strip_prefix(expected) {
            Some(rest) => {
                self.rest = rest;
                true
            }
            None => false,
        }
    }

    fn number(&mut self) -> Option<u32> {
        let digits = self.rest.bytes().take_while(u8::is_ascii_digit).count();
        if digits == 0 {
            return None;
        }
        let value = self.rest[..digits].parse().ok()?;
        self.rest = &self.rest[digits..];
        Some(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(location: &str) -> ParsedDiagnostic {
        parse_line(&format!("<stdin>:{location}")).expect("location should parse")
    }

    #[test]
    fn test_point_location() {
        let diag = parse("12:3:");
        assert_eq!((diag.start_line, diag.start_column), (12, 3));
        assert_eq!(diag.end, DiagnosticEnd::Point);
        assert_eq!((diag.end_line(), diag.end_column()), (12, 3));
        assert_eq!(diag.message, "");
    }

    #[test]
    fn test_end_line_location() {
        let diag = parse("12:3-15:");
        assert_eq!(diag.end, DiagnosticEnd::Line(15));
        assert_eq!((diag.end_line(), diag.end_column()), (15, 3));
    }

    #[test]
    fn test_explicit_location() {
        let diag = parse("12:3:15:7:");
        assert_eq!(diag.end, DiagnosticEnd::Explicit { line: 15, column: 7 });
        assert_eq!((diag.end_line(), diag.end_column()), (15, 7));
    }

    #[test]
    fn test_message_after_separator() {
        let diag = parse("12:3: message text");
        assert_eq!(diag.end, DiagnosticEnd::Point);
        assert_eq!(diag.message, "message text");
    }

    #[test]
    fn test_incomplete_explicit_suffix_falls_back_to_point() {
        let diag = parse("4:2:9: stray number");
        assert_eq!(diag.end, DiagnosticEnd::Point);
        assert_eq!(diag.message, "9: stray number");
    }

    #[test]
    fn test_verible_syntax_error_line() {
        let diag = parse_line("  <stdin>:7:10-14: syntax error at token \"endmodule\"  ")
            .expect("syntax error line should parse");
        assert_eq!(diag.start_line, 7);
        assert_eq!(diag.start_column, 10);
        assert_eq!(diag.end, DiagnosticEnd::Line(14));
        assert_eq!(diag.message, "syntax error at token \"endmodule\"");
    }

    #[test]
    fn test_lines_without_marker_are_ignored() {
        assert_eq!(parse_line("1 error(s) found"), None);
        assert_eq!(parse_line("main.sv:1:1: not piped input"), None);
        assert_eq!(parse_line(""), None);
    }

    #[test]
    fn test_malformed_locations_are_dropped() {
        assert_eq!(parse_line("<stdin>: fatal"), None);
        assert_eq!(parse_line("<stdin>:12 missing column"), None);
        assert_eq!(parse_line("<stdin>:12:3 no terminator"), None);
        assert_eq!(parse_line("<stdin>:x:3: not a number"), None);
    }

    #[test]
    fn test_later_marker_is_tried() {
        let diag = parse_line("note: <stdin>: from <stdin>:2:5: unexpected token").expect("second marker parses");
        assert_eq!((diag.start_line, diag.start_column), (2, 5));
        assert_eq!(diag.message, "unexpected token");
    }

    #[test]
    fn test_parse_diagnostics_mixed_report() {
        let stderr = "\
verible-verilog-format: rejected input
<stdin>:2:5: unexpected token
<stdin>:bogus
<stdin>:4:1:4:9: second problem
Found 2 syntax errors.
";
        let diags = parse_diagnostics(stderr);
        assert_eq!(diags.len(), 2);
        assert_eq!(diags[0].message, "unexpected token");
        assert_eq!(diags[1].end, DiagnosticEnd::Explicit { line: 4, column: 9 });
    }
}
