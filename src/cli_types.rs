use clap::Args;

/// Arguments for `veriformat format`
#[derive(Args, Debug)]
pub struct FormatArgs {
    /// File to format (use '-' for stdin)
    pub file: String,

    /// Only reformat these 1-based lines, inclusive (e.g. 10-20)
    #[arg(long, value_name = "START-END", value_parser = parse_line_span)]
    pub lines: Option<(u32, u32)>,

    /// Configuration file path
    #[arg(short, long)]
    pub config: Option<String>,

    /// verible-verilog-format executable (overrides config)
    #[arg(long)]
    pub path: Option<String>,

    /// Flagfile passed to the formatter (overrides config)
    #[arg(long)]
    pub flagfile: Option<String>,

    /// Kill the formatter after this many milliseconds, 0 disables (overrides config)
    #[arg(long)]
    pub timeout_ms: Option<u64>,

    /// Rewrite the file instead of printing the result
    #[arg(short, long, conflicts_with = "stdin_filename")]
    pub in_place: bool,

    /// Filename to use for stdin input (for flagfile lookup and messages)
    #[arg(long, help = "Filename to use when reading from stdin (e.g., rtl/top.sv)")]
    pub stdin_filename: Option<String>,

    /// Show detailed output
    #[arg(short, long)]
    pub verbose: bool,
}

/// Parse `START-END` into an inclusive 1-based line span.
pub fn parse_line_span(value: &str) -> Result<(u32, u32), String> {
    let (start, end) = value
        .split_once('-')
        .ok_or_else(|| format!("expected START-END, got '{value}'"))?;

    let start: u32 = start.trim().parse().map_err(|e| format!("invalid start line '{start}': {e}"))?;
    let end: u32 = end.trim().parse().map_err(|e| format!("invalid end line '{end}': {e}"))?;

    if start == 0 || end < start {
        return Err(format!("line span '{value}' must satisfy 1 <= START <= END"));
    }

    Ok((start, end))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_line_span() {
        assert_eq!(parse_line_span("3-7"), Ok((3, 7)));
        assert_eq!(parse_line_span("5-5"), Ok((5, 5)));
        assert!(parse_line_span("0-4").is_err());
        assert!(parse_line_span("9-2").is_err());
        assert!(parse_line_span("12").is_err());
        assert!(parse_line_span("a-b").is_err());
    }
}
