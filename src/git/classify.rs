//! Maps a raw task result onto the outcome taxonomy
//!
//! Precedence is fixed: timeout, then auth denial, then generic failure, then
//! the success variants. Matching is substring-based on git's English output,
//! which is why the task pins `LC_ALL=C`.

use std::time::Duration;

use super::operations::TaskResult;
use super::status::{Outcome, OutcomeKind};

/// Lowercased fragments git prints when it needed credentials or was refused
const AUTH_DENIAL_MARKERS: &[&str] = &[
    "terminal prompts disabled",
    "authentication failed",
    "permission denied",
    "could not read username",
    "host key verification failed",
];

/// `git pull` prints one of these when there was nothing to merge
const UP_TO_DATE_MARKERS: &[&str] = &["already up to date", "already up-to-date"];

const DETAIL_UP_TO_DATE: &str = "up to date";
const DETAIL_UPDATES_AVAILABLE: &str = "updates available";
const DETAIL_UPDATED: &str = "updated";

/// Classifies one task result. Pure and deterministic.
pub fn classify(result: &TaskResult, dry_run: bool) -> Outcome {
    if result.timed_out {
        return Outcome::new(
            OutcomeKind::TimedOut,
            format!("timed out after {}", format_elapsed(result.elapsed)),
        );
    }

    let output = result.raw_output.trim();

    if let Some(error) = &result.process_error {
        if let Some(line) = auth_denial_line(output) {
            return Outcome::new(OutcomeKind::AuthSkipped, line);
        }

        let detail = output
            .lines()
            .map(str::trim)
            .find(|line| !line.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| error.to_string());
        return Outcome::new(OutcomeKind::Failed, detail);
    }

    if dry_run {
        return if output.is_empty() {
            Outcome::new(OutcomeKind::UpToDate, DETAIL_UP_TO_DATE)
        } else {
            Outcome::new(OutcomeKind::UpdatesAvailable, DETAIL_UPDATES_AVAILABLE)
        };
    }

    let lowered = output.to_lowercase();
    if UP_TO_DATE_MARKERS.iter().any(|marker| lowered.contains(marker)) {
        Outcome::new(OutcomeKind::UpToDate, DETAIL_UP_TO_DATE)
    } else {
        Outcome::new(OutcomeKind::Updated, updated_detail(output))
    }
}

/// Returns the first output line carrying an auth/permission marker
fn auth_denial_line(output: &str) -> Option<String> {
    output
        .lines()
        .map(str::trim)
        .find(|line| {
            let lowered = line.to_lowercase();
            AUTH_DENIAL_MARKERS.iter().any(|marker| lowered.contains(marker))
        })
        .map(str::to_string)
}

/// Uses git's diffstat summary line ("3 files changed, ...") when present
fn updated_detail(output: &str) -> String {
    output
        .lines()
        .map(str::trim)
        .find(|line| line.contains("changed,") || line.ends_with("changed"))
        .map(|line| format!("{DETAIL_UPDATED}: {line}"))
        .unwrap_or_else(|| DETAIL_UPDATED.to_string())
}

fn format_elapsed(elapsed: Duration) -> String {
    if elapsed.as_millis() < 1000 {
        format!("{}ms", elapsed.as_millis())
    } else {
        format!("{:.1}s", elapsed.as_secs_f64())
    }
}
