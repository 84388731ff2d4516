//! Action runner - runs an action's jobs with the dispatcher

use crate::{
    core::{Action, Status},
    dispatch::{DispatchError, JobDispatcher, JobReport},
    execution::{context::RunContext, report::FaultScope},
};
use std::sync::Arc;
use tokio::time::{timeout, Duration};
use tracing::{debug, error, info};

/// Runs the jobs of one action in declared order
#[derive(Clone)]
pub struct ActionRunner {
    dispatcher: Arc<dyn JobDispatcher>,
}

impl ActionRunner {
    pub fn new(dispatcher: Arc<dyn JobDispatcher>) -> Self {
        Self { dispatcher }
    }

    /// Run an action and return its terminal status
    ///
    /// Dispatch errors never escape: they mark the action as failed, are
    /// logged, and are recorded as faults on the run context.
    pub async fn run(&self, action: &mut Action, ctx: &RunContext) -> Status {
        let recorder = ctx.recorder();

        action.status = Status::Running;
        let line = format!("Action [{}] status change to {}", action.name, action.status);
        action.log(recorder, &line, false);
        ctx.log(&line).await;

        let Action {
            name,
            title,
            status,
            logs,
            jobs,
        } = &mut *action;

        for (i, job) in jobs.iter_mut().enumerate() {
            let line = format!("The Number [{}] job is running: {}", i, title);
            recorder.log(logs, &line, false);
            ctx.log(&line).await;

            info!("Dispatching job {} of action {} to {}", i, name, job.endpoint);
            job.status = Status::Running;

            let result = self.dispatch(job).await;
            match result {
                Ok(JobReport {
                    status: outcome,
                    output,
                }) if outcome.is_terminal() => {
                    debug!("Job {} of action {} finished: {}", i, name, outcome);
                    job.output = output;
                    job.status = outcome;
                    *status = outcome;
                }
                Ok(JobReport { status: outcome, .. }) => {
                    let message = format!("dispatcher returned non-terminal status {}", outcome);
                    self.fail_job(ctx, name, i, &message).await;
                    recorder.log(logs, &format!("Job [{}] run error: {}", i, message), false);
                    job.status = Status::Failure;
                    *status = Status::Failure;
                }
                Err(e) => {
                    let message = e.to_string();
                    self.fail_job(ctx, name, i, &message).await;
                    recorder.log(logs, &format!("Job [{}] run error: {}", i, message), false);
                    job.status = Status::Failure;
                    *status = Status::Failure;
                }
            }

            if status.halts_traversal() {
                break;
            }
        }

        // No jobs at all
        if *status == Status::Running {
            *status = Status::Success;
        }

        let line = format!("Action [{}] finished with status {}", action.name, action.status);
        action.log(recorder, &line, false);
        ctx.log(&line).await;

        action.status
    }

    async fn dispatch(&self, job: &crate::core::Job) -> Result<JobReport, DispatchError> {
        if job.timeout == 0 {
            return self.dispatcher.execute(job).await;
        }

        match timeout(Duration::from_secs(job.timeout), self.dispatcher.execute(job)).await {
            Ok(result) => result,
            Err(_) => Err(DispatchError::Timeout(job.timeout)),
        }
    }

    async fn fail_job(&self, ctx: &RunContext, action: &str, index: usize, message: &str) {
        error!("Job {} of action {} failed: {}", index, action, message);
        ctx.log(&format!("Job [{}] run error: {}", index, message)).await;
        ctx.record_fault(
            FaultScope::Dispatch,
            format!("{} job {}", action, index),
            message,
        );
    }
}
