//! Repository discovery
//!
//! Scans exactly one directory level: every immediate subdirectory carrying a
//! `.git` marker is a repository. Nested layouts are out of scope.

use std::fs;
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::debug;

use super::config::{GITDIR_PREFIX, GITDIR_SCAN_LINES, GIT_MARKER};
use super::error::InvocationError;

/// A working copy found directly under the scan root
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryRef {
    /// Absolute path of the working copy
    pub path: PathBuf,
    /// Display identifier (the directory name)
    pub name: String,
}

/// Check if a .git file (for submodules/worktrees) contains gitdir reference
/// Only reads the first few lines - gitdir is typically in the first line
fn is_git_file(path: &Path) -> bool {
    match fs::File::open(path) {
        Ok(file) => BufReader::new(file)
            .lines()
            .take(GITDIR_SCAN_LINES)
            .map_while(|line| line.ok())
            .any(|line| line.trim_start().starts_with(GITDIR_PREFIX)),
        Err(_) => false,
    }
}

/// Returns true if `path` holds a `.git` directory or a `.git` file pointing at one
pub fn is_git_repo(path: &Path) -> bool {
    let marker = path.join(GIT_MARKER);
    match fs::metadata(&marker) {
        Ok(meta) if meta.is_dir() => true,
        Ok(meta) if meta.is_file() => is_git_file(&marker),
        _ => false,
    }
}

fn absolute_root(root: &Path) -> Result<PathBuf, InvocationError> {
    let joined = if root.is_absolute() {
        root.to_path_buf()
    } else {
        std::env::current_dir()
            .map_err(|source| InvocationError::Unreadable {
                path: root.to_path_buf(),
                source,
            })?
            .join(root)
    };
    // canonicalize fails for missing paths; the metadata check below reports those
    Ok(joined.canonicalize().unwrap_or(joined))
}

/// Lists the repositories directly under `root`, sorted by name (case-insensitive)
///
/// Files and plain directories are skipped. Symlinks to working copies are
/// followed. Scanning again simply re-reads the directory.
pub fn find_repos_from_path(root: impl AsRef<Path>) -> Result<Vec<RepositoryRef>, InvocationError> {
    let root = absolute_root(root.as_ref())?;

    let metadata = match fs::metadata(&root) {
        Ok(metadata) => metadata,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            return Err(InvocationError::NotFound(root));
        }
        Err(source) => return Err(InvocationError::Unreadable { path: root, source }),
    };
    if !metadata.is_dir() {
        return Err(InvocationError::NotADirectory(root));
    }

    let entries = fs::read_dir(&root).map_err(|source| InvocationError::Unreadable {
        path: root.clone(),
        source,
    })?;

    let mut repos = Vec::new();
    for entry in entries {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                debug!(root = %root.display(), error = %e, "skipping unreadable entry");
                continue;
            }
        };
        let path = entry.path();

        // fs::metadata follows symlinks, so a link to a working copy counts
        if !fs::metadata(&path).is_ok_and(|meta| meta.is_dir()) || !is_git_repo(&path) {
            continue;
        }

        let name = entry.file_name().to_string_lossy().into_owned();
        repos.push(RepositoryRef { path, name });
    }

    repos.sort_by(|a, b| {
        a.name
            .to_lowercase()
            .cmp(&b.name.to_lowercase())
            .then_with(|| a.name.cmp(&b.name))
    });

    debug!(root = %root.display(), count = repos.len(), "discovery finished");
    Ok(repos)
}

/// Runs discovery on the blocking pool
pub async fn discover_repositories(root: PathBuf) -> Result<Vec<RepositoryRef>> {
    let repos = tokio::task::spawn_blocking(move || find_repos_from_path(root))
        .await
        .context("repository discovery task failed")??;
    Ok(repos)
}
