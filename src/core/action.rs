//! Action domain model

use crate::core::{
    job::Job,
    log::{LogBuffer, LogRecorder},
    status::Status,
};
use serde::{Deserialize, Serialize};

/// An ordered group of jobs within a normal stage
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Action {
    pub name: String,

    #[serde(default)]
    pub title: String,

    #[serde(default)]
    pub status: Status,

    #[serde(default, skip_serializing_if = "LogBuffer::is_empty")]
    pub logs: LogBuffer,

    #[serde(default)]
    pub jobs: Vec<Job>,
}

impl Action {
    pub fn new(name: impl Into<String>, jobs: Vec<Job>) -> Self {
        Self {
            name: name.into(),
            jobs,
            ..Self::default()
        }
    }

    /// Append to this action's own log
    pub fn log(&self, recorder: &LogRecorder, line: &str, verbose: bool) {
        recorder.log(&self.logs, line, verbose);
    }
}
