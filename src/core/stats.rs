//! Run summary accumulated by the coordinator
//!
//! Only the coordinator's collection loop writes to a [`RunSummary`]; tasks
//! hand their results over instead of touching shared counters.

use std::collections::HashMap;
use std::time::Duration;

use crate::core::config::{DETAIL_MAX_LENGTH, PATH_DISPLAY_WIDTH};
use crate::core::discovery::RepositoryRef;
use crate::git::{Outcome, OutcomeKind};

/// A repository the operator should look at after the run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttentionEntry {
    pub kind: OutcomeKind,
    pub name: String,
    pub path: String,
    pub detail: String,
}

/// Aggregate results for one run
#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    pub total_repositories: usize,
    pub elapsed: Duration,
    counts: HashMap<OutcomeKind, usize>,
    attention: Vec<AttentionEntry>,
}

impl RunSummary {
    /// Creates a new summary with all counters initialized to zero
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one repository's outcome
    pub fn record(&mut self, repo: &RepositoryRef, outcome: &Outcome) {
        self.total_repositories += 1;
        *self.counts.entry(outcome.kind).or_insert(0) += 1;

        if outcome.kind.needs_attention() {
            self.attention.push(AttentionEntry {
                kind: outcome.kind,
                name: repo.name.clone(),
                path: repo.path.to_string_lossy().into_owned(),
                detail: condense_detail(&outcome.detail),
            });
        }
    }

    /// Stamps the total wall-clock time of the run
    pub fn finish(&mut self, elapsed: Duration) {
        self.elapsed = elapsed;
    }

    /// Number of repositories that ended in `kind`
    pub fn count(&self, kind: OutcomeKind) -> usize {
        self.counts.get(&kind).copied().unwrap_or(0)
    }

    /// Repositories needing attention, in completion order
    pub fn attention(&self) -> &[AttentionEntry] {
        &self.attention
    }

    /// One-line summary: count, elapsed time, then the non-zero categories
    pub fn generate_summary(&self) -> String {
        let repo_word = if self.total_repositories == 1 {
            "repository"
        } else {
            "repositories"
        };

        let mut summary = format!(
            "✅ {} {} processed in {:.1}s",
            self.total_repositories,
            repo_word,
            self.elapsed.as_secs_f64()
        );

        for kind in OutcomeKind::ALL {
            let count = self.count(kind);
            if count > 0 {
                summary.push_str(&format!(" • {} {}", count, kind.text()));
            }
        }

        summary
    }

    /// Generates detailed warning messages for repositories needing attention
    pub fn generate_detailed_summary(&self) -> String {
        let mut lines = Vec::new();

        let sections = [
            (OutcomeKind::Failed, "🔴 FAILED REPOS"),
            (OutcomeKind::TimedOut, "⏱️  TIMED OUT"),
            (OutcomeKind::AuthSkipped, "🟠 NEEDS CREDENTIALS"),
        ];

        for (kind, title) in sections {
            let entries: Vec<_> = self.attention.iter().filter(|e| e.kind == kind).collect();
            if entries.is_empty() {
                continue;
            }

            lines.push(format!("{} ({})", title, entries.len()));
            for (i, entry) in entries.iter().enumerate() {
                let tree_char = if i == entries.len() - 1 { "└─" } else { "├─" };
                let short_path = crate::utils::shorten_path(&entry.path, PATH_DISPLAY_WIDTH);
                lines.push(format!(
                    "   {} {:20} {:30} # {}",
                    tree_char, entry.name, short_path, entry.detail
                ));
            }
            lines.push(String::new()); // Add blank line
        }

        // Remove trailing blank line if it exists
        if lines.last() == Some(&String::new()) {
            lines.pop();
        }

        lines.join("\n")
    }
}

/// Collapses whitespace and truncates a detail string for single-line display
pub(crate) fn condense_detail(detail: &str) -> String {
    let cleaned = detail.split_whitespace().collect::<Vec<_>>().join(" ");

    if cleaned.chars().count() > DETAIL_MAX_LENGTH {
        let truncated: String = cleaned.chars().take(DETAIL_MAX_LENGTH - 3).collect();
        format!("{truncated}...")
    } else {
        cleaned
    }
}
