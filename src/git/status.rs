//! Outcome taxonomy for repository tasks

use serde::Serialize;

/// Category of a finished repository task
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum OutcomeKind {
    /// Nothing to fetch or pull
    UpToDate,
    /// Dry run saw remote changes that were not applied
    UpdatesAvailable,
    /// Remote changes were pulled into the working copy
    Updated,
    /// The remote wanted credentials or refused access
    AuthSkipped,
    /// The deadline fired before git returned
    TimedOut,
    /// Any other failure
    Failed,
}

impl OutcomeKind {
    /// All categories in report order
    pub const ALL: [OutcomeKind; 6] = [
        OutcomeKind::UpToDate,
        OutcomeKind::UpdatesAvailable,
        OutcomeKind::Updated,
        OutcomeKind::AuthSkipped,
        OutcomeKind::TimedOut,
        OutcomeKind::Failed,
    ];

    /// Returns the emoji symbol for this outcome
    pub fn symbol(&self) -> &'static str {
        match self {
            OutcomeKind::UpToDate | OutcomeKind::Updated => "🟢",
            OutcomeKind::UpdatesAvailable => "🟡",
            OutcomeKind::AuthSkipped => "🟠",
            OutcomeKind::TimedOut | OutcomeKind::Failed => "🔴",
        }
    }

    /// Returns the text representation of this outcome
    pub fn text(&self) -> &'static str {
        match self {
            OutcomeKind::UpToDate => "up-to-date",
            OutcomeKind::UpdatesAvailable => "updates-available",
            OutcomeKind::Updated => "updated",
            OutcomeKind::AuthSkipped => "auth-skipped",
            OutcomeKind::TimedOut => "timed-out",
            OutcomeKind::Failed => "failed",
        }
    }

    /// Whether the operator should look at this repository after the run
    pub fn needs_attention(&self) -> bool {
        matches!(
            self,
            OutcomeKind::AuthSkipped | OutcomeKind::TimedOut | OutcomeKind::Failed
        )
    }

    /// Whether `--v` should show the captured git output for this outcome
    pub fn shows_output(&self) -> bool {
        matches!(
            self,
            OutcomeKind::Updated
                | OutcomeKind::UpdatesAvailable
                | OutcomeKind::AuthSkipped
                | OutcomeKind::Failed
        )
    }

    /// One-time remediation hint printed after the run
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            OutcomeKind::AuthSkipped => Some(
                "Some remotes need credentials; retrying will not help until access is configured.",
            ),
            OutcomeKind::TimedOut => {
                Some("Some repositories hit the deadline; retry with a longer --timeout.")
            }
            OutcomeKind::Failed => Some("Rerun with --v to see the full git output for failures."),
            _ => None,
        }
    }
}

/// Classified result of one repository task
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Outcome {
    pub kind: OutcomeKind,
    pub detail: String,
}

impl Outcome {
    pub fn new(kind: OutcomeKind, detail: impl Into<String>) -> Self {
        Self {
            kind,
            detail: detail.into(),
        }
    }
}
