//! Flow domain model

use crate::core::{
    error::DefinitionError,
    log::LogBuffer,
    stage::Stage,
    status::Status,
};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;

/// How a flow run was started
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RunMode {
    /// One-shot run from the command line
    #[default]
    CliRun,
    /// Run triggered inside a daemon
    DaemonRun,
    /// Flow registered with a daemon, waiting for its start trigger
    DaemonStart,
}

impl fmt::Display for RunMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RunMode::CliRun => "CliRun",
            RunMode::DaemonRun => "DaemonRun",
            RunMode::DaemonStart => "DaemonStart",
        };
        f.write_str(name)
    }
}

/// Notification target for the final flow outcome
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Receiver {
    /// Notifier type, resolved against the notifier registry
    #[serde(rename = "type")]
    pub kind: String,

    pub address: String,
}

/// Resolved `namespace/repository/name` address of a flow
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlowUri {
    pub namespace: String,
    pub repository: String,
    pub name: String,
}

impl FlowUri {
    pub fn parse(uri: &str) -> Result<Self, DefinitionError> {
        let invalid = |reason: &str| DefinitionError::InvalidUri {
            uri: uri.to_string(),
            reason: reason.to_string(),
        };

        let parts: Vec<&str> = uri.split('/').collect();
        if parts.len() != 3 {
            return Err(invalid("expected namespace/repository/name"));
        }

        let segment = Regex::new(r"^[A-Za-z0-9][A-Za-z0-9._-]*$")
            .map_err(|e| DefinitionError::Invalid(e.to_string()))?;
        if let Some(bad) = parts.iter().find(|p| !segment.is_match(p)) {
            return Err(invalid(&format!("invalid segment '{}'", bad)));
        }

        Ok(FlowUri {
            namespace: parts[0].to_string(),
            repository: parts[1].to_string(),
            name: parts[2].to_string(),
        })
    }
}

impl fmt::Display for FlowUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.namespace, self.repository, self.name)
    }
}

/// One orchestration run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Flow {
    /// Persisted identity, assigned once the flow is stored
    #[serde(skip)]
    pub id: Option<i64>,

    #[serde(skip)]
    pub run_mode: RunMode,

    pub uri: String,

    /// Run sequence number
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub number: Option<i64>,

    #[serde(default)]
    pub title: String,

    #[serde(default)]
    pub version: i64,

    #[serde(default)]
    pub tag: String,

    /// Timeout budget in seconds
    #[serde(default)]
    pub timeout: i64,

    #[serde(default)]
    pub status: Status,

    #[serde(default, skip_serializing_if = "LogBuffer::is_empty")]
    pub logs: LogBuffer,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub stages: Vec<Stage>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub receivers: Vec<Receiver>,
}

impl Flow {
    pub fn new(uri: impl Into<String>, stages: Vec<Stage>) -> Self {
        Self {
            uri: uri.into(),
            stages,
            ..Self::default()
        }
    }

    /// Split the address into namespace, repository and name
    pub fn resolve_uri(&self) -> Result<FlowUri, DefinitionError> {
        FlowUri::parse(&self.uri)
    }

    pub fn to_json(&self) -> Result<String, DefinitionError> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn to_json_pretty(&self) -> Result<String, DefinitionError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn to_yaml(&self) -> Result<String, DefinitionError> {
        Ok(serde_yaml::to_string(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self, DefinitionError> {
        Ok(serde_json::from_str(json)?)
    }
}
