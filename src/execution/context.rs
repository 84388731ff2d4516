//! Per-run context handed down the hierarchy

use crate::core::{Flow, LogBuffer, LogRecorder, RunMode};
use crate::execution::report::{Fault, FaultScope};
use crate::persistence::{FlowStore, LogRecord};
use std::sync::{Arc, Mutex, PoisonError};
use tracing::warn;

/// What a stage or action sees of the flow it runs in
///
/// Children never hold a reference to their parent flow. They get this
/// context instead, which writes to the flow's aggregate log and collects
/// faults for the run report.
pub struct RunContext {
    flow_uri: String,
    flow_id: Option<i64>,
    // First flow-log line written by this run
    run_start: usize,
    run_mode: RunMode,
    flow_log: LogBuffer,
    recorder: LogRecorder,
    verbose: bool,
    store: Arc<dyn FlowStore>,
    faults: Mutex<Vec<Fault>>,
}

impl RunContext {
    pub fn new(flow: &Flow, recorder: LogRecorder, verbose: bool, store: Arc<dyn FlowStore>) -> Self {
        Self {
            flow_uri: flow.uri.clone(),
            flow_id: flow.id,
            run_start: flow.logs.len(),
            run_mode: flow.run_mode,
            flow_log: flow.logs.share(),
            recorder,
            verbose,
            store,
            faults: Mutex::new(Vec::new()),
        }
    }

    pub fn flow_uri(&self) -> &str {
        &self.flow_uri
    }

    pub fn run_mode(&self) -> RunMode {
        self.run_mode
    }

    pub fn recorder(&self) -> &LogRecorder {
        &self.recorder
    }

    /// Attach the persisted identity and forward lines logged before it existed
    ///
    /// Only lines of the current run are forwarded, and only when they have
    /// not already gone out under the same identity.
    pub async fn attach_identity(&mut self, flow_id: i64) {
        if self.flow_id.replace(flow_id) == Some(flow_id) {
            return;
        }
        for line in self.flow_log.snapshot().into_iter().skip(self.run_start) {
            self.forward(flow_id, line).await;
        }
    }

    /// Log a line at flow scope
    ///
    /// The line goes into the flow's aggregate buffer, is mirrored when the
    /// run is verbose, and is forwarded to the persistent log store once the
    /// flow has an identity.
    pub async fn log(&self, line: &str) {
        let stored = self.recorder.log(&self.flow_log, line, self.verbose);
        if let Some(flow_id) = self.flow_id {
            self.forward(flow_id, stored).await;
        }
    }

    async fn forward(&self, flow_id: i64, line: String) {
        if let Err(e) = self.store.append_log(&LogRecord::info(flow_id, line)).await {
            warn!("Failed to store log line for flow {}: {:#}", self.flow_uri, e);
        }
    }

    /// Record an in-run error
    pub fn record_fault(&self, scope: FaultScope, subject: impl Into<String>, message: impl Into<String>) {
        let fault = Fault::new(scope, subject, message);
        self.faults
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(fault);
    }

    pub fn faults(&self) -> Vec<Fault> {
        self.faults
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn into_faults(self) -> Vec<Fault> {
        self.faults.into_inner().unwrap_or_else(PoisonError::into_inner)
    }
}
