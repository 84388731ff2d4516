//! Test utilities for devflow

#![allow(dead_code)]

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use devflow::core::{Action, Flow, Job, Receiver, Sequencing, Stage, Status};
use devflow::dispatch::{DispatchError, JobDispatcher, JobReport};
use devflow::execution::{FlowOrchestrator, RunOptions, RunReport};
use devflow::notify::{Notifier, NotifierRegistry, NotifyError};
use devflow::persistence::{FlowRecord, FlowStore, InMemoryStore, LogRecord, RunRecord};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Scripted result of a job, looked up by endpoint
#[derive(Debug, Clone)]
pub enum Outcome {
    Status(Status),
    Error(String),
}

/// Dispatcher that answers from a script keyed by job endpoint
///
/// Endpoints without a script entry succeed. Every call is recorded, and the
/// peak number of jobs in flight at once is tracked.
#[derive(Default)]
pub struct MockDispatcher {
    script: HashMap<String, Outcome>,
    delay: Option<Duration>,
    calls: Mutex<Vec<String>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl MockDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, endpoint: &str, outcome: Outcome) -> Self {
        self.script.insert(endpoint.to_string(), outcome);
        self
    }

    pub fn failing(self, endpoint: &str) -> Self {
        self.with(endpoint, Outcome::Status(Status::Failure))
    }

    pub fn cancelling(self, endpoint: &str) -> Self {
        self.with(endpoint, Outcome::Status(Status::Cancel))
    }

    pub fn erroring(self, endpoint: &str, message: &str) -> Self {
        self.with(endpoint, Outcome::Error(message.to_string()))
    }

    /// Hold every job for `delay` before answering
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Endpoints in the order they were dispatched
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn was_called(&self, endpoint: &str) -> bool {
        self.calls().iter().any(|c| c == endpoint)
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl JobDispatcher for MockDispatcher {
    async fn execute(&self, job: &Job) -> Result<JobReport, DispatchError> {
        self.calls.lock().unwrap().push(job.endpoint.clone());
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        match self.script.get(&job.endpoint) {
            Some(Outcome::Status(status)) => Ok(JobReport::new(*status)),
            Some(Outcome::Error(message)) => Err(DispatchError::Backend(message.clone())),
            None => Ok(JobReport::success(vec![format!("ran {}", job.endpoint)])),
        }
    }
}

/// One delivered notification
#[derive(Debug, Clone, PartialEq)]
pub struct Delivery {
    pub uri: String,
    pub status: Status,
    pub number: Option<i64>,
    pub addresses: Vec<String>,
}

/// Notifier that remembers every delivery
#[derive(Default)]
pub struct RecordingNotifier {
    deliveries: Mutex<Vec<Delivery>>,
}

impl RecordingNotifier {
    pub fn deliveries(&self) -> Vec<Delivery> {
        self.deliveries.lock().unwrap().clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(&self, flow: &Flow, addresses: &[String]) -> Result<(), NotifyError> {
        self.deliveries.lock().unwrap().push(Delivery {
            uri: flow.uri.clone(),
            status: flow.status,
            number: flow.number,
            addresses: addresses.to_vec(),
        });
        Ok(())
    }
}

/// Notifier whose deliveries always fail
pub struct FailingNotifier;

#[async_trait]
impl Notifier for FailingNotifier {
    async fn notify(&self, _flow: &Flow, addresses: &[String]) -> Result<(), NotifyError> {
        Err(NotifyError::Delivery {
            address: addresses.join(","),
            message: "connection refused".to_string(),
        })
    }
}

/// Store that fails the operations it is told to, and otherwise keeps data in memory
#[derive(Default)]
pub struct FailingStore {
    pub inner: InMemoryStore,
    pub fail_put_flow: AtomicBool,
    pub fail_run_count: AtomicBool,
    pub fail_put_run: AtomicBool,
    pub fail_append_log: AtomicBool,
}

impl FailingStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn check(flag: &AtomicBool, operation: &str) -> Result<()> {
        if flag.load(Ordering::SeqCst) {
            Err(anyhow!("{} unavailable", operation))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl FlowStore for FailingStore {
    async fn put_flow(&self, flow: &FlowRecord) -> Result<i64> {
        Self::check(&self.fail_put_flow, "put_flow")?;
        self.inner.put_flow(flow).await
    }

    async fn find_flow(
        &self,
        namespace: &str,
        repository: &str,
        name: &str,
        tag: &str,
    ) -> Result<Option<i64>> {
        self.inner.find_flow(namespace, repository, name, tag).await
    }

    async fn run_count(&self, flow_id: i64) -> Result<i64> {
        Self::check(&self.fail_run_count, "run_count")?;
        self.inner.run_count(flow_id).await
    }

    async fn put_run(&self, run: &RunRecord) -> Result<()> {
        Self::check(&self.fail_put_run, "put_run")?;
        self.inner.put_run(run).await
    }

    async fn list_runs(&self, flow_id: i64) -> Result<Vec<RunRecord>> {
        self.inner.list_runs(flow_id).await
    }

    async fn append_log(&self, log: &LogRecord) -> Result<()> {
        Self::check(&self.fail_append_log, "append_log")?;
        self.inner.append_log(log).await
    }
}

/// Action with one job per endpoint
pub fn action(name: &str, endpoints: &[&str]) -> Action {
    let jobs = endpoints.iter().map(|e| Job::new("container", *e)).collect();
    let mut action = Action::new(name, jobs);
    action.title = format!("Action {}", name);
    action
}

pub fn sequential(name: &str, actions: Vec<Action>) -> Stage {
    Stage::normal(name, Sequencing::Sequential, actions)
}

pub fn concurrent(name: &str, actions: Vec<Action>) -> Stage {
    Stage::normal(name, Sequencing::Concurrent, actions)
}

/// Flow framed by start and end stages
pub fn flow_with(stages: Vec<Stage>) -> Flow {
    let mut all = vec![Stage::start("start")];
    all.extend(stages);
    all.push(Stage::end("end"));

    let mut flow = Flow::new("containerops/pilotage/test-flow", all);
    flow.tag = "latest".to_string();
    flow.title = "Test flow".to_string();
    flow
}

pub fn receiver(kind: &str, address: &str) -> Receiver {
    Receiver {
        kind: kind.to_string(),
        address: address.to_string(),
    }
}

/// Everything a scenario needs to run a flow and inspect the outcome
pub struct Harness {
    pub dispatcher: Arc<MockDispatcher>,
    pub store: Arc<InMemoryStore>,
    pub notifier: Arc<RecordingNotifier>,
}

impl Harness {
    pub fn new(dispatcher: MockDispatcher) -> Self {
        Self {
            dispatcher: Arc::new(dispatcher),
            store: Arc::new(InMemoryStore::new()),
            notifier: Arc::new(RecordingNotifier::default()),
        }
    }

    /// Orchestrator with `record` and `fail` receiver types plus the defaults
    pub fn orchestrator(&self) -> FlowOrchestrator {
        let notifiers = NotifierRegistry::with_defaults()
            .with("record", self.notifier.clone())
            .with("fail", Arc::new(FailingNotifier));

        FlowOrchestrator::new(self.dispatcher.clone(), self.store.clone())
            .with_notifiers(notifiers)
            .with_options(RunOptions::default())
    }

    pub async fn run(&self, flow: &mut Flow) -> RunReport {
        self.orchestrator().run(flow).await
    }
}

/// Statuses of a stage's actions, in declared order
pub fn action_statuses(stage: &Stage) -> Vec<Status> {
    stage.actions.iter().map(|a| a.status).collect()
}

/// Stage statuses of a flow, in declared order
pub fn stage_statuses(flow: &Flow) -> Vec<Status> {
    flow.stages.iter().map(|s| s.status).collect()
}

/// Assert the run reached `expected` and report the fault trail if not
pub fn assert_flow_status(flow: &Flow, report: &RunReport, expected: Status) {
    assert_eq!(
        flow.status, expected,
        "Flow should be {}, but was {}\nfaults: {:?}\nlogs: {:#?}",
        expected, flow.status, report.faults, flow.logs
    );
    assert_eq!(report.status, flow.status, "report and flow disagree on status");
}

/// Assert a log line containing `needle` exists
pub fn assert_logged(lines: &[String], needle: &str) {
    assert!(
        lines.iter().any(|l| l.contains(needle)),
        "no log line contains {:?}\nlines: {:#?}",
        needle,
        lines
    );
}

/// Position of the first line containing `needle`
pub fn line_index(lines: &[String], needle: &str) -> usize {
    lines
        .iter()
        .position(|l| l.contains(needle))
        .unwrap_or_else(|| panic!("no log line contains {:?}\nlines: {:#?}", needle, lines))
}
