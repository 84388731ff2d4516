//! Job domain model - the leaf unit of work

use crate::core::status::Status;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Resource request for a job
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resources {
    /// CPU quantity, e.g. "500m" or "2"
    #[serde(default)]
    pub cpu: String,

    /// Memory quantity, e.g. "256Mi"
    #[serde(default)]
    pub memory: String,
}

impl Resources {
    pub fn is_empty(&self) -> bool {
        self.cpu.is_empty() && self.memory.is_empty()
    }
}

/// A single job dispatched to an execution backend
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Job {
    /// Job kind discriminator, e.g. "container"
    #[serde(rename = "type")]
    pub kind: String,

    /// Execution endpoint reference (container image for the kubectl backend)
    pub endpoint: String,

    /// Timeout in seconds, 0 means the backend default
    #[serde(default)]
    pub timeout: u64,

    #[serde(default)]
    pub resources: Resources,

    /// Environment variable mappings, applied in order
    #[serde(default)]
    pub environments: Vec<BTreeMap<String, String>>,

    /// Output captured from the backend
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub output: Vec<String>,

    #[serde(default)]
    pub status: Status,
}

impl Job {
    pub fn new(kind: impl Into<String>, endpoint: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            endpoint: endpoint.into(),
            ..Self::default()
        }
    }

    /// Flattened environment; later mappings override earlier ones
    pub fn environment(&self) -> BTreeMap<String, String> {
        self.environments
            .iter()
            .flat_map(|m| m.iter().map(|(k, v)| (k.clone(), v.clone())))
            .collect()
    }
}
