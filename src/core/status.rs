//! Execution status shared by every level of the flow hierarchy

use serde::{Deserialize, Serialize};
use std::fmt;

/// Status of a flow, stage, action or job
///
/// `Pending` is the only valid initial value. `Running` is entered once per
/// execution attempt, and `Success`, `Failure` and `Cancel` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    /// Not started yet
    #[default]
    Pending,
    /// Currently executing
    Running,
    /// Finished successfully
    Success,
    /// Finished with a failure
    Failure,
    /// Aborted before finishing
    Cancel,
}

impl Status {
    /// Check if the status is terminal
    pub fn is_terminal(self) -> bool {
        matches!(self, Status::Success | Status::Failure | Status::Cancel)
    }

    /// Whether a sequential traversal must stop after observing this status
    pub fn halts_traversal(self) -> bool {
        matches!(self, Status::Failure | Status::Cancel)
    }

    /// Rank used when combining sibling outcomes.
    fn dominance(self) -> u8 {
        match self {
            Status::Pending => 0,
            Status::Running => 1,
            Status::Success => 2,
            Status::Cancel => 3,
            Status::Failure => 4,
        }
    }

    /// Combine two outcomes: Failure dominates Cancel dominates Success
    pub fn combine(self, other: Status) -> Status {
        if other.dominance() > self.dominance() {
            other
        } else {
            self
        }
    }

    /// Aggregate children's outcomes into a parent status
    ///
    /// An empty set of children aggregates to `Success`.
    pub fn aggregate<I>(statuses: I) -> Status
    where
        I: IntoIterator<Item = Status>,
    {
        statuses.into_iter().fold(Status::Success, Status::combine)
    }

    /// Lowercase name used in documents and log lines
    pub fn as_str(self) -> &'static str {
        match self {
            Status::Pending => "pending",
            Status::Running => "running",
            Status::Success => "success",
            Status::Failure => "failure",
            Status::Cancel => "cancel",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Status {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Status::Pending),
            "running" => Ok(Status::Running),
            "success" => Ok(Status::Success),
            "failure" => Ok(Status::Failure),
            "cancel" => Ok(Status::Cancel),
            other => Err(format!("unknown status: {}", other)),
        }
    }
}
