//! Dispatch results and errors

use crate::core::Status;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error types for job dispatch
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("backend error: {0}")]
    Backend(String),

    #[error("job exited with code {code}: {stderr}")]
    Exited { code: i32, stderr: String },

    #[error("timeout after {0} seconds")]
    Timeout(u64),

    #[error("internal error: {0}")]
    Internal(String),
}

/// Outcome of one job as reported by a backend
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobReport {
    /// Terminal status of the job
    pub status: Status,

    /// Output lines captured from the job
    pub output: Vec<String>,
}

impl JobReport {
    pub fn new(status: Status) -> Self {
        Self {
            status,
            output: Vec::new(),
        }
    }

    pub fn success(output: Vec<String>) -> Self {
        Self {
            status: Status::Success,
            output,
        }
    }
}
