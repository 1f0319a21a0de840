//! Public API for git operations.
//!
//! This module provides the stable public API for the per-repository work:
//! - Running a hardened `git fetch --dry-run` / `git pull` under a deadline
//! - Classifying the captured output into an [`Outcome`]
//!
//! ## Example: Checking one repository
//!
//! ```rust,no_run
//! use repo_sweep::core::{find_repos_from_path, RunConfig};
//! use repo_sweep::git::{classify, sync_repository};
//! use std::time::Duration;
//!
//! async fn check() -> anyhow::Result<()> {
//!     let config = RunConfig::new(".", true, false, 4, Duration::from_secs(15))?;
//!     for repo in find_repos_from_path(&config.root_path)? {
//!         let result = sync_repository(&repo, &config).await;
//!         println!("{}: {}", repo.name, classify(&result, config.dry_run).kind.text());
//!     }
//!     Ok(())
//! }
//! ```

// Task execution
pub use super::operations::{
    git_command, hardened_ssh_command, hardening_env, pick_ssh_base, resolve_ssh_base,
    run_with_deadline, sync_args, sync_repository, GitSync, ProcessCapture, ProcessError,
    RepoOperation, TaskResult,
};

// Classification
pub use super::classify::classify;

// Outcomes
pub use super::status::{Outcome, OutcomeKind};
