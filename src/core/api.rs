//! Public API for the core module.
//!
//! This module provides the stable public API for core functionality including:
//! - Repository discovery
//! - Run configuration and flag parsing
//! - The concurrency limiter
//! - Reporting and summary statistics
//!
//! Internal implementation details are not exposed through this API.

// Discovery
pub use super::discovery::{discover_repositories, find_repos_from_path, is_git_repo, RepositoryRef};

// Configuration
pub use super::config::{parse_concurrency, parse_duration, resolve_concurrency, RunConfig};
pub use super::config::{
    CONCURRENCY_ENV, DEFAULT_CONCURRENT_LIMIT, DEFAULT_TASK_TIMEOUT_SECS, LOG_ENV, TIMEOUT_ENV,
};
pub use super::config::SSH_CONNECT_TIMEOUT_SECS;

// User-facing messages
pub use super::config::NO_REPOS_MESSAGE;

// Errors
pub use super::error::InvocationError;

// Scheduling
pub use super::limiter::{ConcurrencyLimiter, LimiterPermit};

// Reporting
pub use super::progress::{progress_bar, LogLine, LogWriter, Reporter};
pub use super::stats::{AttentionEntry, RunSummary};
