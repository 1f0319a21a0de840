//! Test fixtures and builders

use anyhow::Result;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

use super::git::{clone_repo, create_test_commit, setup_git_repo};

/// A scan root plus a sibling directory of upstream repositories
///
/// Every clone under `root()` tracks an upstream under `upstream()`, so
/// fetches and pulls stay on the local filesystem.
pub struct SweepWorkspace {
    temp_dir: TempDir,
}

impl SweepWorkspace {
    pub fn new() -> Result<Self> {
        let temp_dir = TempDir::new()?;
        fs::create_dir(temp_dir.path().join("root"))?;
        fs::create_dir(temp_dir.path().join("upstream"))?;
        Ok(Self { temp_dir })
    }

    /// Directory handed to the sync command
    pub fn root(&self) -> PathBuf {
        self.temp_dir.path().join("root")
    }

    pub fn upstream(&self) -> PathBuf {
        self.temp_dir.path().join("upstream")
    }

    /// Path of the working clone named `name`
    pub fn clone_path(&self, name: &str) -> PathBuf {
        self.root().join(name)
    }

    /// Creates an upstream with one commit and clones it into the root
    pub fn add_tracked_repo(&self, name: &str) -> Result<PathBuf> {
        let upstream = self.upstream().join(name);
        fs::create_dir(&upstream)?;
        setup_git_repo(&upstream)?;
        create_test_commit(&upstream, "README.md", &format!("# {name}\n"), "Initial commit")?;

        let clone = self.clone_path(name);
        clone_repo(&upstream, &clone)?;
        Ok(clone)
    }

    /// Adds a commit upstream that the clone has not seen yet
    pub fn advance_upstream(&self, name: &str, file_name: &str) -> Result<()> {
        let upstream = self.upstream().join(name);
        create_test_commit(&upstream, file_name, "new content\n", &format!("Add {file_name}"))
    }

    /// A plain directory with content but no repository marker
    pub fn add_plain_dir(&self, name: &str) -> Result<PathBuf> {
        let dir = self.root().join(name);
        fs::create_dir(&dir)?;
        fs::write(dir.join("notes.txt"), "not a repository\n")?;
        Ok(dir)
    }

    /// A directory that only looks like a repository (empty `.git` dir)
    pub fn add_marked_dir(&self, name: &str) -> Result<PathBuf> {
        let dir = self.root().join(name);
        fs::create_dir_all(dir.join(".git"))?;
        Ok(dir)
    }

    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }
}
