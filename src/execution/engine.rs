//! Flow orchestrator - drives a whole flow run and its bookkeeping

use crate::{
    core::{Flow, LogObserver, LogRecorder, Status},
    dispatch::JobDispatcher,
    execution::{
        context::RunContext,
        report::{FaultScope, RunReport},
        runner::ActionRunner,
        stage::StageExecutor,
    },
    notify::NotifierRegistry,
    persistence::{FlowRecord, FlowStore, RunRecord},
};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{error, info, warn};
use uuid::Uuid;

/// Events that can occur during a flow run
#[derive(Debug, Clone)]
pub enum FlowEvent {
    FlowStarted {
        execution_id: Uuid,
        uri: String,
    },
    StageStarted {
        index: usize,
        name: String,
    },
    StageFinished {
        index: usize,
        name: String,
        status: Status,
    },
    FlowFinished {
        execution_id: Uuid,
        status: Status,
    },
}

/// Type for event handlers
pub type EventHandler = Arc<dyn Fn(FlowEvent) + Send + Sync>;

/// Run-wide switches
#[derive(Debug, Clone, Copy, Default)]
pub struct RunOptions {
    /// Mirror flow-scope log lines to the observer
    pub verbose: bool,

    /// Prefix mirrored lines with their timestamp
    pub timestamp: bool,
}

/// Runs flows against a dispatcher, a store and a set of notifiers
pub struct FlowOrchestrator {
    stages: StageExecutor,
    store: Arc<dyn FlowStore>,
    notifiers: NotifierRegistry,
    options: RunOptions,
    observer: Option<Arc<dyn LogObserver>>,
    event_handlers: Vec<EventHandler>,
}

impl FlowOrchestrator {
    pub fn new(dispatcher: Arc<dyn JobDispatcher>, store: Arc<dyn FlowStore>) -> Self {
        Self {
            stages: StageExecutor::new(ActionRunner::new(dispatcher)),
            store,
            notifiers: NotifierRegistry::with_defaults(),
            options: RunOptions::default(),
            observer: None,
            event_handlers: Vec::new(),
        }
    }

    pub fn with_notifiers(mut self, notifiers: NotifierRegistry) -> Self {
        self.notifiers = notifiers;
        self
    }

    pub fn with_options(mut self, options: RunOptions) -> Self {
        self.options = options;
        self
    }

    /// Observer that receives verbose lines live
    pub fn with_observer(mut self, observer: Arc<dyn LogObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    /// Add an event handler
    pub fn on_event<F>(mut self, handler: F) -> Self
    where
        F: Fn(FlowEvent) + Send + Sync + 'static,
    {
        self.event_handlers.push(Arc::new(handler));
        self
    }

    fn emit_event(&self, event: FlowEvent) {
        for handler in &self.event_handlers {
            handler(event.clone());
        }
    }

    /// Run a flow to a terminal status
    ///
    /// Never fails: dispatch, persistence and notification errors end up in
    /// the flow's logs and in the fault trail of the returned report. Run
    /// statistics are recorded and receivers notified even when a stage fails.
    pub async fn run(&self, flow: &mut Flow) -> RunReport {
        let execution_id = Uuid::new_v4();
        let started_at = Utc::now();
        let recorder = LogRecorder::new(self.observer.clone(), self.options.timestamp);
        let mut ctx = RunContext::new(flow, recorder, self.options.verbose, self.store.clone());

        info!("Starting flow run: {} ({})", flow.uri, execution_id);
        self.emit_event(FlowEvent::FlowStarted {
            execution_id,
            uri: flow.uri.clone(),
        });

        // A flow without stages keeps its declared status
        if !flow.stages.is_empty() {
            flow.status = Status::Running;
            ctx.log(&format!("Flow [{}] status change to {}", flow.uri, flow.status))
                .await;
        }

        self.register(flow, &mut ctx).await;

        for (i, stage) in flow.stages.iter_mut().enumerate() {
            ctx.log(&format!("The Number [{}] stage is running: {}", i, stage.title))
                .await;
            self.emit_event(FlowEvent::StageStarted {
                index: i,
                name: stage.name.clone(),
            });

            let status = self.stages.run(stage, &ctx, i).await;
            flow.status = status;

            self.emit_event(FlowEvent::StageFinished {
                index: i,
                name: stage.name.clone(),
                status,
            });

            if status.halts_traversal() {
                info!("Stage {} ended with {}, stopping flow {}", stage.name, status, flow.uri);
                break;
            }
        }

        if !flow.stages.is_empty() {
            ctx.log(&format!("Flow [{}] status change to {}", flow.uri, flow.status))
                .await;
        }

        let finished_at = Utc::now();
        self.record_run(flow, &ctx, started_at, finished_at).await;
        self.notify_receivers(flow, &ctx).await;

        info!("Flow run finished: {} - {}", flow.uri, flow.status);
        self.emit_event(FlowEvent::FlowFinished {
            execution_id,
            status: flow.status,
        });

        RunReport {
            execution_id,
            flow_uri: flow.uri.clone(),
            status: flow.status,
            faults: ctx.into_faults(),
            started_at,
            finished_at,
        }
    }

    /// Store the definition and attach the persisted identity
    async fn register(&self, flow: &mut Flow, ctx: &mut RunContext) {
        let uri = match flow.resolve_uri() {
            Ok(uri) => uri,
            Err(e) => {
                error!("Flow {} has an invalid address: {}", flow.uri, e);
                ctx.log(&format!("Flow [{}] address error: {}", flow.uri, e)).await;
                ctx.record_fault(FaultScope::Definition, flow.uri.as_str(), e.to_string());
                return;
            }
        };

        let content = match flow.to_json() {
            Ok(content) => content,
            Err(e) => {
                ctx.log(&format!("Flow [{}] encode error: {}", flow.uri, e)).await;
                ctx.record_fault(FaultScope::Persistence, flow.uri.as_str(), e.to_string());
                return;
            }
        };

        let record = FlowRecord {
            namespace: uri.namespace,
            repository: uri.repository,
            name: uri.name,
            tag: flow.tag.clone(),
            title: flow.title.clone(),
            content,
            version: flow.version,
            timeout: flow.timeout,
        };

        match self.store.put_flow(&record).await {
            Ok(id) => {
                flow.id = Some(id);
                ctx.attach_identity(id).await;
            }
            Err(e) => {
                warn!("Failed to save flow {}: {:#}", flow.uri, e);
                ctx.log(&format!("Save flow [{}] error: {}", flow.uri, e)).await;
                ctx.record_fault(FaultScope::Persistence, flow.uri.as_str(), format!("{:#}", e));
            }
        }
    }

    /// Record start, end, sequence number and final status of this run
    async fn record_run(
        &self,
        flow: &mut Flow,
        ctx: &RunContext,
        started_at: DateTime<Utc>,
        ended_at: DateTime<Utc>,
    ) {
        let Some(flow_id) = flow.id else {
            ctx.log(&format!(
                "Flow [{}] has no stored identity, run data is not recorded",
                flow.uri
            ))
            .await;
            ctx.record_fault(
                FaultScope::Persistence,
                flow.uri.as_str(),
                "run data skipped: flow was not stored",
            );
            return;
        };

        let previous = match self.store.run_count(flow_id).await {
            Ok(count) => count,
            Err(e) => {
                warn!("Failed to count runs of {}: {:#}", flow.uri, e);
                ctx.log(&format!("Get flow [{}] numbers error: {}", flow.uri, e)).await;
                ctx.record_fault(FaultScope::Persistence, flow.uri.as_str(), format!("{:#}", e));
                0
            }
        };
        let number = previous + 1;
        flow.number = Some(number);

        let run = RunRecord {
            flow_id,
            number,
            status: flow.status,
            started_at,
            ended_at,
        };
        if let Err(e) = self.store.put_run(&run).await {
            warn!("Failed to record run {} of {}: {:#}", number, flow.uri, e);
            ctx.log(&format!("Save flow [{}] data error: {}", flow.uri, e)).await;
            ctx.record_fault(FaultScope::Persistence, flow.uri.as_str(), format!("{:#}", e));
        }
    }

    /// Deliver the final state to every receiver, one failure never stops the rest
    async fn notify_receivers(&self, flow: &Flow, ctx: &RunContext) {
        for receiver in &flow.receivers {
            match self.notifiers.notify(receiver, flow).await {
                Ok(()) => {
                    ctx.log(&format!(
                        "Notify receiver [{}] {} success",
                        receiver.kind, receiver.address
                    ))
                    .await;
                }
                Err(e) => {
                    warn!("Failed to notify {}: {}", receiver.address, e);
                    ctx.log(&format!("Notify User Error: {}", e)).await;
                    ctx.record_fault(
                        FaultScope::Notification,
                        receiver.address.as_str(),
                        e.to_string(),
                    );
                }
            }
        }
    }
}
