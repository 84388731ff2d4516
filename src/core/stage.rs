//! Stage domain model

use crate::core::{
    action::Action,
    log::{LogBuffer, LogRecorder},
    status::Status,
};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of a stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StageKind {
    /// Entry point of a flow, no work
    Start,
    /// Runs actions
    #[default]
    Normal,
    /// Reserved for suspend/resume, currently a pass-through
    Pause,
    /// Exit point of a flow, no work
    End,
}

impl fmt::Display for StageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StageKind::Start => "start",
            StageKind::Normal => "normal",
            StageKind::Pause => "pause",
            StageKind::End => "end",
        };
        f.write_str(name)
    }
}

/// How a normal stage dispatches its actions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Sequencing {
    /// One action at a time in declared order, stopping at the first failure
    #[serde(rename = "sequence", alias = "sequential")]
    Sequential,
    /// All actions at once, joined before aggregating
    #[serde(rename = "parallel", alias = "concurrent")]
    Concurrent,
}

/// A phase of a flow
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Stage {
    #[serde(rename = "type")]
    pub kind: StageKind,

    pub name: String,

    #[serde(default)]
    pub title: String,

    /// Only meaningful for normal stages
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sequencing: Option<Sequencing>,

    #[serde(default)]
    pub status: Status,

    #[serde(default, skip_serializing_if = "LogBuffer::is_empty")]
    pub logs: LogBuffer,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub actions: Vec<Action>,
}

impl Stage {
    pub fn start(name: impl Into<String>) -> Self {
        Self::marker(StageKind::Start, name)
    }

    pub fn end(name: impl Into<String>) -> Self {
        Self::marker(StageKind::End, name)
    }

    pub fn pause(name: impl Into<String>) -> Self {
        Self::marker(StageKind::Pause, name)
    }

    pub fn normal(name: impl Into<String>, sequencing: Sequencing, actions: Vec<Action>) -> Self {
        Self {
            kind: StageKind::Normal,
            name: name.into(),
            sequencing: Some(sequencing),
            actions,
            ..Self::default()
        }
    }

    fn marker(kind: StageKind, name: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
            ..Self::default()
        }
    }

    /// Append to this stage's own log
    pub fn log(&self, recorder: &LogRecorder, line: &str, verbose: bool) {
        recorder.log(&self.logs, line, verbose);
    }
}
