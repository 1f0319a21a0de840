//! Configuration constants and settings

use anyhow::{Context, Result};
use std::path::PathBuf;
use std::time::Duration;

use super::error::InvocationError;

// Concurrency Configuration
//
// Every task holds a slot while its git process talks to the network, so the
// cap bounds both local process count and simultaneous remote connections.
pub const DEFAULT_CONCURRENT_LIMIT: usize = 10;

// Environment fallbacks for CLI flags
pub const CONCURRENCY_ENV: &str = "SWEEP_CONCURRENCY";
pub const TIMEOUT_ENV: &str = "SWEEP_TIMEOUT";
pub const LOG_ENV: &str = "SWEEP_LOG";

// Timeout constants
pub const DEFAULT_TASK_TIMEOUT_SECS: u64 = 15;
pub const SSH_CONNECT_TIMEOUT_SECS: u64 = 10;

// Repositories slower than this get their elapsed time appended to the report line
pub const SLOW_REPO_THRESHOLD_SECS: u64 = 10;

// UI Constants
pub const NO_REPOS_MESSAGE: &str = "No git repositories found.";
pub const PROGRESS_TEMPLATE: &str = "{spinner} {pos}/{len} {wide_msg}";

// Display formatting constants
pub const PATH_DISPLAY_WIDTH: usize = 30;
pub const DETAIL_MAX_LENGTH: usize = 60;
pub const SEPARATOR_WIDTH: usize = 70;

// Discovery
pub const GIT_MARKER: &str = ".git";
pub const GITDIR_PREFIX: &str = "gitdir:";
pub const GITDIR_SCAN_LINES: usize = 5;

/// Settings for one invocation, shared read-only by every task
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub root_path: PathBuf,
    pub dry_run: bool,
    pub verbose: bool,
    pub json: bool,
    pub concurrency_limit: usize,
    pub task_timeout: Duration,
}

impl RunConfig {
    /// Builds a validated config; the limit must be at least 1 and the timeout non-zero
    pub fn new(
        root_path: impl Into<PathBuf>,
        dry_run: bool,
        verbose: bool,
        concurrency_limit: usize,
        task_timeout: Duration,
    ) -> Result<Self, InvocationError> {
        if concurrency_limit == 0 {
            return Err(InvocationError::InvalidConcurrency(concurrency_limit));
        }
        if task_timeout.is_zero() {
            return Err(InvocationError::InvalidTimeout);
        }

        Ok(Self {
            root_path: root_path.into(),
            dry_run,
            verbose,
            json: false,
            concurrency_limit,
            task_timeout,
        })
    }

    /// Switches the report to one JSON object per line
    #[must_use]
    pub fn with_json(mut self, json: bool) -> Self {
        self.json = json;
        self
    }
}

/// Determines the concurrency limit based on CLI args
///
/// Priority order:
/// 1. --sequential flag → 1
/// 2. --concurrency N (or SWEEP_CONCURRENCY, resolved by clap) → N
/// 3. Default → 10
pub fn resolve_concurrency(jobs: Option<usize>, sequential: bool) -> usize {
    if sequential {
        return 1;
    }

    jobs.unwrap_or(DEFAULT_CONCURRENT_LIMIT)
}

/// Parses a concurrency value for clap, rejecting zero
pub fn parse_concurrency(s: &str) -> Result<usize> {
    let n: usize = s
        .trim()
        .parse()
        .with_context(|| format!("invalid concurrency '{s}'"))?;
    if n == 0 {
        anyhow::bail!("concurrency must be at least 1");
    }
    Ok(n)
}

/// Parse a duration string like "15s", "2m", "500ms" or a bare number of seconds.
pub fn parse_duration(s: &str) -> Result<Duration> {
    let s = s.trim().to_lowercase();

    let duration = if let Some(ms) = s.strip_suffix("ms") {
        let ms: u64 = ms.trim().parse().context("Invalid milliseconds")?;
        Duration::from_millis(ms)
    } else if let Some(secs) = s.strip_suffix('s') {
        let secs: u64 = secs.trim().parse().context("Invalid seconds")?;
        Duration::from_secs(secs)
    } else if let Some(mins) = s.strip_suffix('m') {
        let mins: u64 = mins.trim().parse().context("Invalid minutes")?;
        Duration::from_secs(mins.checked_mul(60).context("duration too large")?)
    } else {
        // Seconds by default
        let secs: u64 = s.parse().context("Invalid duration format")?;
        Duration::from_secs(secs)
    };

    if duration.is_zero() {
        anyhow::bail!("timeout must be greater than zero");
    }
    Ok(duration)
}
