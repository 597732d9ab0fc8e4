use std::fmt;

use thiserror::Error;

use crate::source::SourceError;

/// Machine-readable error codes for agent-friendly decision making.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    ConfigParseError,
    SnapshotMissing,
    SnapshotInvalid,
    SeedNotFound,
    SeedFetchFailed,
    CycleDetected,
    InternalUnexpected,
}

impl ErrorCode {
    /// Stable code identifier (`E####`) for machine parsing.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::ConfigParseError => "E1002",
            Self::SnapshotMissing => "E1004",
            Self::SnapshotInvalid => "E1005",
            Self::SeedNotFound => "E2001",
            Self::CycleDetected => "E2003",
            Self::SeedFetchFailed => "E5003",
            Self::InternalUnexpected => "E9001",
        }
    }

    /// Short human-facing summary for logs and terminal output.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::ConfigParseError => "Config file parse error",
            Self::SnapshotMissing => "No tracker snapshot configured",
            Self::SnapshotInvalid => "Tracker snapshot could not be loaded",
            Self::SeedNotFound => "Seed ticket not found",
            Self::SeedFetchFailed => "Seed ticket could not be fetched",
            Self::CycleDetected => "Dependency cycle in ticket group",
            Self::InternalUnexpected => "Internal unexpected error",
        }
    }

    /// Optional remediation hint that can be surfaced to operators and agents.
    #[must_use]
    pub const fn hint(self) -> Option<&'static str> {
        match self {
            Self::ConfigParseError => Some("Fix syntax in .cohort/config.toml and retry."),
            Self::SnapshotMissing => {
                Some("Pass --snapshot or set tracker.snapshot in .cohort/config.toml.")
            }
            Self::SnapshotInvalid => Some("Check that the snapshot is valid JSON with unique ticket numbers."),
            Self::SeedNotFound => Some("Check the ticket number and tracker scope."),
            Self::SeedFetchFailed => Some("Retry once the tracker is reachable."),
            Self::CycleDetected => {
                Some("Remove a blocking link between the listed tickets to break the cycle.")
            }
            Self::InternalUnexpected => Some("Retry once. If persistent, report a bug with logs."),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Fatal outcomes of group detection.
///
/// Expansion fetch failures for non-seed tickets are not errors; they are
/// recorded in [`GroupResult::unresolved`](crate::model::GroupResult::unresolved).
#[derive(Debug, Error)]
pub enum GroupError {
    /// The seed ticket does not resolve in the tracker.
    #[error("seed ticket #{number} not found in {scope}")]
    SeedNotFound { number: u64, scope: String },

    /// The seed fetch failed for a reason other than not-found.
    #[error("could not fetch seed ticket #{number} from {scope}: {source}")]
    Source {
        number: u64,
        scope: String,
        #[source]
        source: SourceError,
    },

    /// Blocking links among group members form at least one cycle.
    ///
    /// `unordered` lists every member that could not be placed, ascending.
    /// `cycles` lists the strongly connected components among them.
    #[error("dependency cycle among tickets {}", format_numbers(.unordered))]
    Cycle {
        unordered: Vec<u64>,
        cycles: Vec<Vec<u64>>,
    },
}

impl GroupError {
    #[must_use]
    pub const fn error_code(&self) -> ErrorCode {
        match self {
            Self::SeedNotFound { .. } => ErrorCode::SeedNotFound,
            Self::Source { .. } => ErrorCode::SeedFetchFailed,
            Self::Cycle { .. } => ErrorCode::CycleDetected,
        }
    }

    /// Remediation text for this error.
    #[must_use]
    pub fn suggestion(&self) -> String {
        self.error_code()
            .hint()
            .unwrap_or_else(|| self.error_code().message())
            .to_string()
    }
}

/// Render ticket numbers as `#1, #2, #3`.
#[must_use]
pub fn format_numbers(numbers: &[u64]) -> String {
    numbers
        .iter()
        .map(|n| format!("#{n}"))
        .collect::<Vec<_>>()
        .join(", ")
}
