//! Running verible-verilog-format as a subprocess.
//!
//! The document is written to the tool's stdin while stdout and stderr are
//! drained concurrently. An outcome is only reported once input is closed,
//! both streams are fully read and the exit status is known. Cancellation
//! and timeouts kill the child and surface as distinct errors.

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tokio::process::{Child, ChildStdin, Command};
use tokio_util::sync::CancellationToken;

use crate::diagnostics::DocumentRange;

/// Makes verible exit non-zero when it cannot format its input.
pub const FAILSAFE_FLAG: &str = "--failsafe_success=false";

/// Positional argument telling verible to read the source from stdin.
pub const STDIN_ARGUMENT: &str = "-";

/// Result of one formatter run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessOutcome {
    /// Exit code, absent when the process was terminated by a signal.
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl ProcessOutcome {
    pub fn succeeded(&self) -> bool {
        self.exit_code == Some(0)
    }
}

/// Error during formatter execution.
#[derive(Debug, thiserror::Error)]
pub enum ExecutorError {
    #[error("Path to verible-verilog-format not specified")]
    ExecutableNotSpecified,

    #[error("Executable \"{name}\" not found")]
    ExecutableNotFound { name: String },

    #[error("Failed to spawn '{tool}': {source}")]
    Spawn { tool: String, source: io::Error },

    #[error("I/O error while running '{tool}': {source}")]
    Io { tool: String, source: io::Error },

    #[error("Formatting with '{tool}' was cancelled")]
    Cancelled { tool: String },

    #[error("Tool '{tool}' timed out after {timeout_ms}ms")]
    Timeout { tool: String, timeout_ms: u64 },
}

/// Inclusive 1-based line span passed as `--lines`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineSpan {
    pub start: u32,
    pub end: u32,
}

impl LineSpan {
    /// Lines touched by a 0-based document range.
    pub fn from_range(range: &DocumentRange) -> Self {
        Self {
            start: range.start.line.saturating_add(1),
            end: range.end.line.saturating_add(1),
        }
    }
}

impl fmt::Display for LineSpan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.start, self.end)
    }
}

/// Build verible's argument vector. Order is fixed.
pub fn build_arguments(flagfile: Option<&Path>, lines: Option<LineSpan>) -> Vec<String> {
    let mut args = vec![FAILSAFE_FLAG.to_string()];

    if let Some(flagfile) = flagfile {
        args.push(format!("--flagfile={}", flagfile.display()));
    }

    if let Some(lines) = lines {
        args.push(format!("--lines={lines}"));
    }

    args.push(STDIN_ARGUMENT.to_string());
    args
}

/// Resolve the configured executable through `PATH`.
pub fn locate_executable(name: &str) -> Result<PathBuf, ExecutorError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(ExecutorError::ExecutableNotSpecified);
    }

    which::which(name).map_err(|e| {
        log::debug!("PATH lookup for {name} failed: {e}");
        ExecutorError::ExecutableNotFound { name: name.to_string() }
    })
}

/// Everything needed to run the formatter once.
#[derive(Debug, Clone)]
pub struct InvocationRequest {
    pub executable: PathBuf,
    pub arguments: Vec<String>,
    pub input: String,
    pub cancellation: CancellationToken,
    pub timeout: Option<Duration>,
}

impl InvocationRequest {
    pub fn new(executable: PathBuf, arguments: Vec<String>, input: String) -> Self {
        Self {
            executable,
            arguments,
            input,
            cancellation: CancellationToken::new(),
            timeout: None,
        }
    }

    pub fn with_cancellation(mut self, cancellation: CancellationToken) -> Self {
        self.cancellation = cancellation;
        self
    }

    /// A zero timeout disables the limit.
    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout = (timeout_ms > 0).then(|| Duration::from_millis(timeout_ms));
        self
    }

    fn tool_name(&self) -> String {
        self.executable.display().to_string()
    }
}

enum Interrupt {
    Cancelled,
    TimedOut(Duration),
}

/// Run the formatter and collect its outcome.
pub async fn execute(request: &InvocationRequest) -> Result<ProcessOutcome, ExecutorError> {
    let tool = request.tool_name();

    if request.cancellation.is_cancelled() {
        return Err(ExecutorError::Cancelled { tool });
    }

    log::debug!("Running {tool} {}", request.arguments.join(" "));

    let mut child = Command::new(&request.executable)
        .args(&request.arguments)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(|source| ExecutorError::Spawn {
            tool: tool.clone(),
            source,
        })?;

    let stdin = child.stdin.take();
    let stdout = child.stdout.take();
    let stderr = child.stderr.take();

    let collect = async {
        let (written, out, err) = tokio::join!(
            write_input(stdin, &request.input),
            read_pipe(stdout),
            read_pipe(stderr)
        );
        written?;
        let status = child.wait().await?;
        Ok::<_, io::Error>((status, out?, err?))
    };

    let deadline = async {
        match request.timeout {
            Some(timeout) => {
                tokio::time::sleep(timeout).await;
                timeout
            }
            None => std::future::pending().await,
        }
    };

    let collected = tokio::select! {
        biased;
        _ = request.cancellation.cancelled() => Err(Interrupt::Cancelled),
        timeout = deadline => Err(Interrupt::TimedOut(timeout)),
        result = collect => Ok(result),
    };

    match collected {
        Ok(result) => {
            let (status, stdout, stderr) = result.map_err(|source| ExecutorError::Io {
                tool: tool.clone(),
                source,
            })?;

            // The token may flip between the last poll and here.
            if request.cancellation.is_cancelled() {
                return Err(ExecutorError::Cancelled { tool });
            }

            Ok(ProcessOutcome {
                exit_code: status.code(),
                stdout,
                stderr,
            })
        }
        Err(Interrupt::Cancelled) => {
            terminate(&mut child, &tool).await;
            Err(ExecutorError::Cancelled { tool })
        }
        Err(Interrupt::TimedOut(timeout)) => {
            terminate(&mut child, &tool).await;
            Err(ExecutorError::Timeout {
                tool,
                timeout_ms: u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
            })
        }
    }
}

async fn terminate(child: &mut Child, tool: &str) {
    if let Err(e) = child.kill().await {
        log::debug!("Failed to kill {tool}: {e}");
    }
}

async fn write_input(stdin: Option<ChildStdin>, input: &str) -> io::Result<()> {
    let Some(mut stdin) = stdin else {
        return Ok(());
    };

    match stdin.write_all(input.as_bytes()).await {
        // The tool may exit before reading everything; its outcome still counts.
        Err(e) if e.kind() == io::ErrorKind::BrokenPipe => {
            log::debug!("Formatter closed stdin early");
            Ok(())
        }
        result => result,
    }
}

async fn read_pipe<R: AsyncRead + Unpin>(pipe: Option<R>) -> io::Result<String> {
    let Some(mut pipe) = pipe else {
        return Ok(String::new());
    };

    let mut buf = Vec::new();
    pipe.read_to_end(&mut buf).await?;
    Ok(String::from_utf8_lossy(&buf).into_owned())
}
