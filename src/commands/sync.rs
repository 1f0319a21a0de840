//! Repository sync command implementation
//!
//! Discovers repositories under the root, runs one task per repository behind
//! the concurrency limiter, and funnels every result through a single
//! collection loop that classifies, records and prints it.

use anyhow::Result;
use futures::stream::{FuturesUnordered, StreamExt};
use indicatif::ProgressBar;
use std::io::Write;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::AcquireError;
use tokio::task::JoinError;
use tracing::{debug, info, warn};

use crate::core::{
    discover_repositories, ConcurrencyLimiter, RepositoryRef, Reporter, RunConfig, RunSummary,
};
use crate::git::{classify, GitSync, Outcome, OutcomeKind, RepoOperation, TaskResult};
use crate::utils::set_terminal_title;

/// Handles the sync command against the real terminal
///
/// `progress` is the bar the log writer suspends around each event.
pub async fn handle_sync_command(config: RunConfig, progress: ProgressBar) -> Result<RunSummary> {
    let show_title = !config.json;
    if show_title {
        update_title("🚀 sweep");
    }

    let mut reporter = Reporter::stdout(&config, progress);
    let limiter = ConcurrencyLimiter::new(config.concurrency_limit);
    let summary = run_sync(Arc::new(config), Arc::new(GitSync), limiter, &mut reporter).await?;

    if show_title {
        update_title("✅ sweep");
    }
    Ok(summary)
}

/// Runs `operation` over every repository under `config.root_path`
///
/// Only discovery can fail the run. Per-repository problems, including a
/// panicking task or a closed limiter, come back as `Failed` outcomes, so the
/// summary always counts every discovered repository.
pub async fn run_sync<O, W>(
    config: Arc<RunConfig>,
    operation: Arc<O>,
    limiter: ConcurrencyLimiter,
    reporter: &mut Reporter<W>,
) -> Result<RunSummary>
where
    O: RepoOperation + 'static,
    W: Write,
{
    let start = Instant::now();

    let repos = discover_repositories(config.root_path.clone()).await?;
    info!(
        count = repos.len(),
        root = %config.root_path.display(),
        limit = limiter.capacity(),
        "discovered repositories"
    );
    reporter.begin(&config, limiter.capacity(), &repos)?;

    let mut tasks = FuturesUnordered::new();
    for repo in repos {
        let handle = tokio::spawn(run_task(
            Arc::clone(&operation),
            limiter.clone(),
            repo.clone(),
            Arc::clone(&config),
        ));
        tasks.push(async move { (repo, handle.await) });
    }

    let mut summary = RunSummary::new();
    while let Some((repo, joined)) = tasks.next().await {
        let (result, outcome) = match joined {
            Ok(Ok(result)) => {
                let outcome = classify(&result, config.dry_run);
                (result, outcome)
            }
            Ok(Err(error)) => {
                warn!(repo = %repo.name, %error, "could not acquire a limiter slot");
                failed(repo, format!("limiter unavailable: {error}"))
            }
            Err(error) => {
                warn!(repo = %repo.name, %error, "repository task aborted");
                failed(repo, describe_join_error(&error))
            }
        };

        debug!(repo = %result.repo.name, outcome = outcome.kind.text(), "collected");
        summary.record(&result.repo, &outcome);
        reporter.report(&result, &outcome)?;
    }

    summary.finish(start.elapsed());
    debug!(
        peak = limiter.peak(),
        capacity = limiter.capacity(),
        elapsed = ?summary.elapsed,
        "run complete"
    );
    reporter.finish(&summary)?;

    Ok(summary)
}

/// Body of one spawned task: hold a slot for the whole operation
async fn run_task<O>(
    operation: Arc<O>,
    limiter: ConcurrencyLimiter,
    repo: RepositoryRef,
    config: Arc<RunConfig>,
) -> Result<TaskResult, AcquireError>
where
    O: RepoOperation + 'static,
{
    let _permit = limiter.acquire().await?;
    debug!(repo = %repo.name, op = operation.name(), active = limiter.active(), "slot acquired");
    Ok(operation.run(&repo, &config).await)
}

fn failed(repo: RepositoryRef, detail: String) -> (TaskResult, Outcome) {
    let result = TaskResult {
        repo,
        raw_output: String::new(),
        process_error: None,
        timed_out: false,
        elapsed: Duration::ZERO,
    };
    (result, Outcome::new(OutcomeKind::Failed, detail))
}

fn describe_join_error(error: &JoinError) -> String {
    if error.is_panic() {
        "task panicked".to_string()
    } else {
        "task cancelled".to_string()
    }
}

fn update_title(title: &str) {
    if let Err(error) = set_terminal_title(title) {
        debug!(%error, "could not set terminal title");
    }
}
