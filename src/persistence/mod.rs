//! Persistence layer for flows, run statistics and flow logs

#[cfg(feature = "sqlite")]
pub mod store;

#[cfg(feature = "sqlite")]
pub use store::SqliteFlowStore;

use crate::core::Status;
use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tokio::sync::RwLock;

/// A stored flow definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlowRecord {
    pub namespace: String,
    pub repository: String,
    pub name: String,
    pub tag: String,
    pub title: String,

    /// Serialized flow document
    pub content: String,

    pub version: i64,
    pub timeout: i64,
}

/// Statistics of one finished run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunRecord {
    pub flow_id: i64,

    /// Sequence number of the run within its flow
    pub number: i64,

    pub status: Status,
    pub started_at: DateTime<Utc>,
    pub ended_at: DateTime<Utc>,
}

/// One flow-level log line
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogRecord {
    pub flow_id: i64,
    pub level: String,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

impl LogRecord {
    pub fn info(flow_id: i64, message: impl Into<String>) -> Self {
        Self {
            flow_id,
            level: "INFO".to_string(),
            message: message.into(),
            created_at: Utc::now(),
        }
    }
}

/// Trait for persistence backends
#[async_trait::async_trait]
pub trait FlowStore: Send + Sync {
    /// Save a flow definition, returning its identity
    ///
    /// Saving the same namespace/repository/name/tag again updates the
    /// stored definition and keeps the identity.
    async fn put_flow(&self, flow: &FlowRecord) -> Result<i64>;

    /// Look up the identity of a stored flow
    async fn find_flow(
        &self,
        namespace: &str,
        repository: &str,
        name: &str,
        tag: &str,
    ) -> Result<Option<i64>>;

    /// Number of runs recorded for a flow
    async fn run_count(&self, flow_id: i64) -> Result<i64>;

    /// Record the statistics of a finished run
    async fn put_run(&self, run: &RunRecord) -> Result<()>;

    /// Runs of a flow, newest first
    async fn list_runs(&self, flow_id: i64) -> Result<Vec<RunRecord>>;

    /// Append a flow-level log line
    async fn append_log(&self, log: &LogRecord) -> Result<()>;
}

type FlowKey = (String, String, String, String);

/// In-memory persistence (for testing or ephemeral use)
#[derive(Default)]
pub struct InMemoryStore {
    flows: RwLock<HashMap<FlowKey, (i64, FlowRecord)>>,
    runs: RwLock<HashMap<i64, Vec<RunRecord>>>,
    logs: RwLock<Vec<LogRecord>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stored definition for an identity
    pub async fn flow(&self, flow_id: i64) -> Option<FlowRecord> {
        let flows = self.flows.read().await;
        flows
            .values()
            .find(|(id, _)| *id == flow_id)
            .map(|(_, record)| record.clone())
    }

    /// All log lines stored for a flow, in append order
    pub async fn logs(&self, flow_id: i64) -> Vec<LogRecord> {
        let logs = self.logs.read().await;
        logs.iter().filter(|l| l.flow_id == flow_id).cloned().collect()
    }
}

#[async_trait::async_trait]
impl FlowStore for InMemoryStore {
    async fn put_flow(&self, flow: &FlowRecord) -> Result<i64> {
        let mut flows = self.flows.write().await;
        let key = (
            flow.namespace.clone(),
            flow.repository.clone(),
            flow.name.clone(),
            flow.tag.clone(),
        );
        let next_id = flows.len() as i64 + 1;
        let entry = flows.entry(key).or_insert_with(|| (next_id, flow.clone()));
        entry.1 = flow.clone();
        Ok(entry.0)
    }

    async fn find_flow(
        &self,
        namespace: &str,
        repository: &str,
        name: &str,
        tag: &str,
    ) -> Result<Option<i64>> {
        let flows = self.flows.read().await;
        let key = (
            namespace.to_string(),
            repository.to_string(),
            name.to_string(),
            tag.to_string(),
        );
        Ok(flows.get(&key).map(|(id, _)| *id))
    }

    async fn run_count(&self, flow_id: i64) -> Result<i64> {
        let runs = self.runs.read().await;
        Ok(runs.get(&flow_id).map(|r| r.len() as i64).unwrap_or(0))
    }

    async fn put_run(&self, run: &RunRecord) -> Result<()> {
        let mut runs = self.runs.write().await;
        runs.entry(run.flow_id).or_default().push(run.clone());
        Ok(())
    }

    async fn list_runs(&self, flow_id: i64) -> Result<Vec<RunRecord>> {
        let runs = self.runs.read().await;
        let mut result = runs.get(&flow_id).cloned().unwrap_or_default();
        result.sort_by(|a, b| b.number.cmp(&a.number));
        Ok(result)
    }

    async fn append_log(&self, log: &LogRecord) -> Result<()> {
        self.logs.write().await.push(log.clone());
        Ok(())
    }
}
