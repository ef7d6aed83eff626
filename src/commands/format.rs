//! Handler for the `format` command.

use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use colored::*;
use tokio_util::sync::CancellationToken;
use url::Url;

use veriformat_lib::config::{SettingsOverrides, find_project_root, load_settings};
use veriformat_lib::exit_codes::exit;
use veriformat_lib::lsp::types::DIAGNOSTIC_SOURCE;
use veriformat_lib::{
    DiagnosticCollection, DocumentRange, FormatContext, FormatRequest, FormatStatus, NoticeLevel, format_document,
};

use crate::cli_types::FormatArgs;

/// Format one file (or stdin) through verible-verilog-format.
pub fn handle_format(args: &FormatArgs) {
    let from_stdin = args.file == "-";
    let input = match read_input(&args.file) {
        Ok(input) => input,
        Err(e) => {
            eprintln!("{}: Failed to read {}: {e}", "Error".red().bold(), args.file);
            exit::tool_error();
        }
    };

    let document_path = if from_stdin {
        args.stdin_filename.as_deref().map(absolutize)
    } else {
        Some(absolutize(&args.file))
    };
    let display_name = if from_stdin {
        args.stdin_filename.clone().unwrap_or_else(|| "<stdin>".to_string())
    } else {
        args.file.clone()
    };

    let Some(uri) = document_path
        .as_deref()
        .and_then(|path| Url::from_file_path(path).ok())
        .or_else(|| Url::parse("untitled:stdin").ok())
    else {
        eprintln!("{}: Cannot build a document URI for {display_name}", "Error".red().bold());
        exit::tool_error();
    };

    let start_dir = document_path
        .as_deref()
        .and_then(Path::parent)
        .map(Path::to_path_buf)
        .or_else(|| std::env::current_dir().ok())
        .unwrap_or_default();

    let mut settings = match load_settings(args.config.as_deref().map(Path::new), &start_dir) {
        Ok((settings, _)) => settings,
        Err(e) => {
            eprintln!("{}: {e}", "Error".red().bold());
            exit::tool_error();
        }
    };
    settings.apply(&SettingsOverrides {
        path: args.path.clone(),
        flag_file: args.flagfile.clone(),
        timeout_ms: args.timeout_ms,
    });

    let workspace_folders: Vec<PathBuf> = find_project_root(&start_dir).into_iter().collect();
    let range = args
        .lines
        .map(|(start, end)| DocumentRange::new(start - 1, 0, end - 1, 0));
    let diagnostics = DiagnosticCollection::new(DIAGNOSTIC_SOURCE);

    let runtime = tokio::runtime::Runtime::new().unwrap_or_else(|e| {
        eprintln!("{}: Failed to create Tokio runtime: {}", "Error".red().bold(), e);
        exit::tool_error();
    });

    let cancellation = CancellationToken::new();
    let interrupt = cancellation.clone();
    runtime.spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            interrupt.cancel();
        }
    });

    let report = runtime.block_on(format_document(
        FormatRequest {
            uri: &uri,
            text: &input,
            range,
            cancellation,
        },
        FormatContext {
            settings: &settings,
            workspace_folders: &workspace_folders,
            diagnostics: &diagnostics,
        },
    ));

    for notice in &report.notices {
        let label = match notice.level {
            NoticeLevel::Error => "Error".red().bold(),
            NoticeLevel::Warning => "Warning".yellow().bold(),
        };
        eprintln!("{label}: {}", notice.message);
    }
    if let Some(message) = &report.log_message {
        eprintln!("{message}");
    }

    match report.status {
        FormatStatus::Formatted => {
            let formatted = report.edit.map(|edit| edit.new_text).unwrap_or_default();
            if let Err(e) = write_output(args, from_stdin, &input, &formatted) {
                eprintln!("{}: Failed to write output: {e}", "Error".red().bold());
                exit::tool_error();
            }
            exit::success();
        }
        FormatStatus::Rejected => {
            for diagnostic in diagnostics.get(&uri) {
                eprintln!(
                    "{}:{}:{}: {}: {}",
                    display_name,
                    diagnostic.range.start.line + 1,
                    diagnostic.range.start.character + 1,
                    "error".red().bold(),
                    diagnostic.message
                );
            }
            exit::format_failed();
        }
        FormatStatus::Failed => exit::tool_error(),
        FormatStatus::Cancelled => {
            eprintln!("{}: Interrupted", "Error".red().bold());
            exit::tool_error();
        }
    }
}

fn read_input(file: &str) -> io::Result<String> {
    if file == "-" {
        let mut content = String::new();
        io::stdin().read_to_string(&mut content)?;
        Ok(content)
    } else {
        std::fs::read_to_string(file)
    }
}

fn write_output(args: &FormatArgs, from_stdin: bool, original: &str, formatted: &str) -> io::Result<()> {
    if args.in_place && !from_stdin {
        if formatted != original {
            std::fs::write(&args.file, formatted)?;
            log::info!("Reformatted {}", args.file);
        }
        return Ok(());
    }

    let mut stdout = io::stdout().lock();
    stdout.write_all(formatted.as_bytes())?;
    stdout.flush()
}

fn absolutize(path: &str) -> PathBuf {
    let path = PathBuf::from(path);
    if path.is_absolute() {
        return path;
    }
    std::env::current_dir().map(|cwd| cwd.join(&path)).unwrap_or(path)
}
