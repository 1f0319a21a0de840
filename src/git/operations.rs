//! Synchronization task: one git update per repository, bounded by a deadline

use async_trait::async_trait;
use std::io;
use std::path::Path;
use std::process::{ExitStatus, Stdio};
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::process::Command;
use tracing::{debug, instrument, warn};

use crate::core::{RepositoryRef, RunConfig, SSH_CONNECT_TIMEOUT_SECS};

// Git command arguments
const GIT_FETCH_DRY_RUN_ARGS: &[&str] = &["fetch", "--dry-run"];
const GIT_PULL_ARGS: &[&str] = &["pull"];
const GIT_SSH_CONFIG_ARGS: &[&str] = &["config", "--get", "core.sshCommand"];

/// Process-level failure of the wrapped tool
#[derive(Debug, Error)]
pub enum ProcessError {
    #[error("failed to launch {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("failed while waiting for {program}: {source}")]
    Wait {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("{program} exited with {status}")]
    Exit { program: String, status: ExitStatus },
}

/// Everything one task observed, handed to the classifier as-is
#[derive(Debug)]
pub struct TaskResult {
    pub repo: RepositoryRef,
    /// stdout followed by stderr
    pub raw_output: String,
    pub process_error: Option<ProcessError>,
    pub timed_out: bool,
    pub elapsed: Duration,
}

/// Output of [`run_with_deadline`]
#[derive(Debug, Default)]
pub struct ProcessCapture {
    pub output: String,
    pub error: Option<ProcessError>,
    pub timed_out: bool,
}

/// A repository-level operation the coordinator can schedule
///
/// Implementations must not print and must not fail outward: every problem
/// ends up inside the returned [`TaskResult`].
#[async_trait]
pub trait RepoOperation: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &str;

    /// Runs the operation against one repository
    async fn run(&self, repo: &RepositoryRef, config: &RunConfig) -> TaskResult;
}

/// `git fetch --dry-run` in dry-run mode, `git pull` otherwise
#[derive(Debug, Clone, Copy, Default)]
pub struct GitSync;

#[async_trait]
impl RepoOperation for GitSync {
    fn name(&self) -> &str {
        "git"
    }

    async fn run(&self, repo: &RepositoryRef, config: &RunConfig) -> TaskResult {
        sync_repository(repo, config).await
    }
}

/// Returns the git arguments for the requested mode
pub fn sync_args(dry_run: bool) -> &'static [&'static str] {
    if dry_run {
        GIT_FETCH_DRY_RUN_ARGS
    } else {
        GIT_PULL_ARGS
    }
}

/// Appends non-interactive options to the caller's ssh command (or plain `ssh`)
pub fn hardened_ssh_command(existing: Option<&str>) -> String {
    let base = existing
        .map(str::trim)
        .filter(|cmd| !cmd.is_empty())
        .unwrap_or("ssh");
    format!(
        "{base} -o ConnectTimeout={SSH_CONNECT_TIMEOUT_SECS} -o BatchMode=yes -o StrictHostKeyChecking=accept-new"
    )
}

/// Picks the ssh command to harden, in git's own precedence order:
/// `GIT_SSH_COMMAND`, then `core.sshCommand`, then `GIT_SSH`
pub fn pick_ssh_base(
    env_command: Option<&str>,
    configured: Option<&str>,
    git_ssh: Option<&str>,
) -> Option<String> {
    fn non_empty(value: Option<&str>) -> Option<&str> {
        value.map(str::trim).filter(|v| !v.is_empty())
    }

    if let Some(command) = non_empty(env_command).or_else(|| non_empty(configured)) {
        return Some(command.to_string());
    }
    // GIT_SSH names a program, not a shell command line
    non_empty(git_ssh).map(|program| format!("'{}'", program.replace('\'', r"'\''")))
}

/// Resolves the caller's ssh command for the repository at `path`
pub async fn resolve_ssh_base(path: &Path, deadline: Duration) -> Option<String> {
    let env_command = std::env::var("GIT_SSH_COMMAND").ok();
    let git_ssh = std::env::var("GIT_SSH").ok();

    let configured = if env_command.as_deref().is_some_and(|cmd| !cmd.trim().is_empty()) {
        None
    } else {
        // Exits 1 when the key is unset; that simply means no configured command
        let lookup = git_command(path, GIT_SSH_CONFIG_ARGS, None);
        let capture = run_with_deadline(lookup, "git", deadline).await;
        (capture.error.is_none() && !capture.timed_out).then_some(capture.output)
    };

    pick_ssh_base(env_command.as_deref(), configured.as_deref(), git_ssh.as_deref())
}

/// Environment overrides that make git fail fast instead of prompting
pub fn hardening_env(ssh_base: Option<&str>) -> Vec<(&'static str, String)> {
    vec![
        ("GIT_TERMINAL_PROMPT", "0".to_string()),
        ("GCM_INTERACTIVE", "never".to_string()),
        ("GIT_SSH_COMMAND", hardened_ssh_command(ssh_base)),
        // classification matches English git messages
        ("LC_ALL", "C".to_string()),
    ]
}

/// Builds a hardened git command rooted at `path`
///
/// Repository discovery is capped at `path` itself, so a broken marker
/// fails instead of reaching an enclosing repository.
pub fn git_command(path: &Path, args: &[&str], ssh_base: Option<&str>) -> Command {
    let mut command = Command::new("git");
    command.args(args).current_dir(path);
    for (key, value) in hardening_env(ssh_base) {
        command.env(key, value);
    }
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        command.env("GIT_CEILING_DIRECTORIES", parent);
    }
    command
}

/// Runs the synchronization for one repository and captures what happened
#[instrument(skip_all, fields(repo = %repo.name, dry_run = config.dry_run))]
pub async fn sync_repository(repo: &RepositoryRef, config: &RunConfig) -> TaskResult {
    let start = Instant::now();
    let args = sync_args(config.dry_run);

    let ssh_base = resolve_ssh_base(&repo.path, config.task_timeout).await;
    let remaining = config.task_timeout.saturating_sub(start.elapsed());

    debug!(?args, ssh = ?ssh_base, "spawning git");
    let command = git_command(&repo.path, args, ssh_base.as_deref());
    let capture = run_with_deadline(command, "git", remaining).await;
    let elapsed = start.elapsed();

    if capture.timed_out {
        warn!(?elapsed, "git exceeded its deadline and was killed");
    } else {
        debug!(?elapsed, failed = capture.error.is_some(), "git finished");
    }

    TaskResult {
        repo: repo.clone(),
        raw_output: capture.output,
        process_error: capture.error,
        timed_out: capture.timed_out,
        elapsed,
    }
}

/// Runs `command` to completion or until `deadline` passes
///
/// On expiry the child and everything it spawned are killed and
/// `timed_out` is set; output gathered so far is discarded.
pub async fn run_with_deadline(mut command: Command, program: &str, deadline: Duration) -> ProcessCapture {
    command
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);
    // Own process group so the deadline can take ssh and helpers down with git
    #[cfg(unix)]
    command.process_group(0);

    let child = match command.spawn() {
        Ok(child) => child,
        Err(source) => {
            return ProcessCapture {
                error: Some(ProcessError::Spawn {
                    program: program.to_string(),
                    source,
                }),
                ..ProcessCapture::default()
            };
        }
    };
    let pid = child.id();

    let wait = child.wait_with_output();
    tokio::pin!(wait);

    tokio::select! {
        result = &mut wait => match result {
            Ok(output) => {
                let mut text = String::from_utf8_lossy(&output.stdout).into_owned();
                text.push_str(&String::from_utf8_lossy(&output.stderr));
                let error = (!output.status.success()).then(|| ProcessError::Exit {
                    program: program.to_string(),
                    status: output.status,
                });
                ProcessCapture { output: text, error, timed_out: false }
            }
            Err(source) => ProcessCapture {
                error: Some(ProcessError::Wait {
                    program: program.to_string(),
                    source,
                }),
                ..ProcessCapture::default()
            },
        },
        () = tokio::time::sleep(deadline) => {
            // The child is still unreaped here, so its pid (and group id) cannot be reused yet
            terminate_process_group(pid);
            ProcessCapture { timed_out: true, ..ProcessCapture::default() }
        }
    }
}

#[cfg(unix)]
fn terminate_process_group(pid: Option<u32>) {
    let Some(pgid) = pid.and_then(|pid| libc::pid_t::try_from(pid).ok()) else {
        return;
    };
    // SAFETY: killpg only sends a signal. The group was created for this child
    // by process_group(0) and the leader has not been reaped yet.
    let rc = unsafe { libc::killpg(pgid, libc::SIGKILL) };
    if rc != 0 {
        debug!(pgid, error = %io::Error::last_os_error(), "killpg failed");
    }
}

#[cfg(not(unix))]
fn terminate_process_group(_pid: Option<u32>) {
    // kill_on_drop takes care of the direct child
}
