//! Run outcome and fault trail

use crate::core::Status;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Which part of a run an in-run error came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FaultScope {
    /// Definition problem discovered while running (bad address, missing sequencing)
    Definition,
    /// A job's backend failed or returned a non-terminal status
    Dispatch,
    /// Storing the flow, its logs or its run statistics failed
    Persistence,
    /// Delivering the outcome to a receiver failed
    Notification,
}

impl fmt::Display for FaultScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FaultScope::Definition => "definition",
            FaultScope::Dispatch => "dispatch",
            FaultScope::Persistence => "persistence",
            FaultScope::Notification => "notification",
        };
        f.write_str(name)
    }
}

/// An error absorbed during a run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fault {
    pub scope: FaultScope,

    /// What the fault is about, e.g. "build/compile job 1" or a receiver address
    pub subject: String,

    pub message: String,
    pub at: DateTime<Utc>,
}

impl Fault {
    pub fn new(scope: FaultScope, subject: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            scope,
            subject: subject.into(),
            message: message.into(),
            at: Utc::now(),
        }
    }
}

impl fmt::Display for Fault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.scope, self.subject, self.message)
    }
}

/// Result of running a flow
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub execution_id: Uuid,
    pub flow_uri: String,

    /// Final status of the flow
    pub status: Status,

    /// Every in-run error, in the order it was recorded
    pub faults: Vec<Fault>,

    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl RunReport {
    pub fn is_success(&self) -> bool {
        self.status == Status::Success
    }

    pub fn faults_in(&self, scope: FaultScope) -> impl Iterator<Item = &Fault> {
        self.faults.iter().filter(move |f| f.scope == scope)
    }

    /// The final status, or the fault trail if anything went wrong along the way
    pub fn into_result(self) -> Result<Status, Vec<Fault>> {
        if self.faults.is_empty() {
            Ok(self.status)
        } else {
            Err(self.faults)
        }
    }
}
