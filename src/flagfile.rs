//! Locating the formatter's flagfile.
//!
//! A configured flagfile may be absolute, relative to the working directory,
//! relative to the document being formatted, or relative to the workspace
//! folder that contains the document. The first existing candidate wins.
//! Resolution runs on every request since the document may have moved.

use std::path::{Path, PathBuf};

use url::Url;

/// Where a resolved flagfile was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlagfileOrigin {
    /// The configured value itself (absolute, home-relative or cwd-relative).
    Configured,
    /// Relative to the directory holding the document.
    DocumentFolder,
    /// Relative to the enclosing workspace folder.
    WorkspaceRoot,
}

/// Outcome of a flagfile lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlagfilePath {
    Resolved { path: PathBuf, origin: FlagfileOrigin },
    Unresolved,
}

impl FlagfilePath {
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::Resolved { path, .. } => Some(path),
            Self::Unresolved => None,
        }
    }
}

/// Resolve `configured` for the document at `document`.
///
/// `workspace_folders` are the host's open folders; the longest one that
/// contains the document is used for the last search tier.
pub async fn resolve_flagfile(configured: &str, document: &Url, workspace_folders: &[PathBuf]) -> FlagfilePath {
    let document_path = document.to_file_path().ok();

    for (origin, candidate) in candidates(configured, document_path.as_deref(), workspace_folders) {
        log::debug!("Checking flagfile candidate {}", candidate.display());
        if exists(&candidate).await {
            log::debug!("Resolved flagfile {configured} to {} ({origin:?})", candidate.display());
            return FlagfilePath::Resolved {
                path: candidate,
                origin,
            };
        }
    }

    FlagfilePath::Unresolved
}

/// Search candidates in priority order.
fn candidates(
    configured: &str,
    document_path: Option<&Path>,
    workspace_folders: &[PathBuf],
) -> Vec<(FlagfileOrigin, PathBuf)> {
    let mut candidates = vec![(FlagfileOrigin::Configured, absolutize(&expand_home(configured)))];

    if let Some(document_path) = document_path {
        if let Some(folder) = document_path.parent() {
            candidates.push((FlagfileOrigin::DocumentFolder, folder.join(configured)));
        }
        if let Some(root) = enclosing_workspace(document_path, workspace_folders) {
            candidates.push((FlagfileOrigin::WorkspaceRoot, root.join(configured)));
        }
    }

    candidates
}

/// The deepest workspace folder containing `document_path`.
pub fn enclosing_workspace<'a>(document_path: &Path, workspace_folders: &'a [PathBuf]) -> Option<&'a Path> {
    workspace_folders
        .iter()
        .filter(|folder| document_path.starts_with(folder))
        .max_by_key(|folder| folder.components().count())
        .map(PathBuf::as_path)
}

/// Expand a leading `~/` to the user's home directory.
fn expand_home(value: &str) -> PathBuf {
    if let Some(rest) = value.strip_prefix("~/") {
        use etcetera::{BaseStrategy, choose_base_strategy};
        if let Ok(strategy) = choose_base_strategy() {
            return strategy.home_dir().join(rest);
        }
    }
    PathBuf::from(value)
}

fn absolutize(path: &Path) -> PathBuf {
    if path.is_absolute() {
        return path.to_path_buf();
    }
    std::env::current_dir()
        .map(|cwd| cwd.join(path))
        .unwrap_or_else(|_| path.to_path_buf())
}

async fn exists(path: &Path) -> bool {
    tokio::fs::metadata(path).await.is_ok()
}
