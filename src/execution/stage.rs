//! Stage executor - runs a stage's actions according to its kind and sequencing

use crate::{
    core::{Action, LogBuffer, Sequencing, Stage, StageKind, Status},
    execution::{context::RunContext, report::FaultScope, runner::ActionRunner},
};
use futures::future::join_all;
use tracing::{debug, info, warn};

/// Runs one stage of a flow
#[derive(Clone)]
pub struct StageExecutor {
    runner: ActionRunner,
}

impl StageExecutor {
    pub fn new(runner: ActionRunner) -> Self {
        Self { runner }
    }

    /// Run a stage and return its terminal status
    pub async fn run(&self, stage: &mut Stage, ctx: &RunContext, index: usize) -> Status {
        let recorder = ctx.recorder();

        stage.status = Status::Running;
        let line = format!("Stage [{}] status change to {}", stage.name, stage.status);
        stage.log(recorder, &line, false);
        ctx.log(&line).await;

        debug!("Running stage {} ({}) of {}", index, stage.kind, ctx.flow_uri());

        let status = match stage.kind {
            StageKind::Start => {
                self.pass_through(
                    stage,
                    ctx,
                    &format!("Start stage don't need any trigger in {} mode.", ctx.run_mode()),
                )
                .await
            }
            StageKind::End => {
                self.pass_through(stage, ctx, "End stage don't trigger any other flow.")
                    .await
            }
            StageKind::Pause => {
                self.pass_through(stage, ctx, "Pause stage has no resume trigger, continuing.")
                    .await
            }
            StageKind::Normal => self.run_normal(stage, ctx).await,
        };

        stage.status = status;
        let line = format!("Stage [{}] status change to {}", stage.name, status);
        stage.log(recorder, &line, false);
        ctx.log(&line).await;

        status
    }

    async fn pass_through(&self, stage: &Stage, ctx: &RunContext, notice: &str) -> Status {
        stage.log(ctx.recorder(), notice, false);
        ctx.log(notice).await;
        Status::Success
    }

    async fn run_normal(&self, stage: &mut Stage, ctx: &RunContext) -> Status {
        let Stage {
            name,
            title,
            sequencing,
            logs,
            actions,
            ..
        } = stage;
        let logs: &LogBuffer = logs;

        match sequencing {
            Some(Sequencing::Sequential) => self.run_sequential(title, logs, actions, ctx).await,
            Some(Sequencing::Concurrent) => self.run_concurrent(title, logs, actions, ctx).await,
            None => {
                let message = "normal stage has no sequencing mode";
                warn!("Stage {} of {}: {}", name, ctx.flow_uri(), message);
                let line = format!("Stage [{}] run error: {}", name, message);
                ctx.recorder().log(logs, &line, false);
                ctx.log(&line).await;
                ctx.record_fault(FaultScope::Definition, name.as_str(), message);
                Status::Failure
            }
        }
    }

    /// One action at a time, stopping at the first failure or cancel
    async fn run_sequential(
        &self,
        title: &str,
        logs: &LogBuffer,
        actions: &mut [Action],
        ctx: &RunContext,
    ) -> Status {
        let recorder = ctx.recorder();
        let mut status = Status::Success;

        for (i, action) in actions.iter_mut().enumerate() {
            let line = format!("The Number [{}] action is running: {}", i, title);
            recorder.log(logs, &line, false);
            ctx.log(&line).await;

            status = self.runner.run(action, ctx).await;
            if status.halts_traversal() {
                info!("Action {} ended with {}, skipping the rest of the stage", action.name, status);
                break;
            }
        }

        status
    }

    /// All actions at once, joined before the outcomes are aggregated
    ///
    /// Each branch buffers its stage-scope lines and appends them as one
    /// batch, so lines of one action stay together in the stage log.
    async fn run_concurrent(
        &self,
        title: &str,
        logs: &LogBuffer,
        actions: &mut [Action],
        ctx: &RunContext,
    ) -> Status {
        let recorder = ctx.recorder();

        let branches = actions.iter_mut().enumerate().map(move |(i, action)| async move {
            let line = format!("The Number [{}] action is running: {}", i, title);
            let mut lines = vec![recorder.stamp(&line)];
            ctx.log(&line).await;

            let status = self.runner.run(action, ctx).await;

            lines.push(recorder.stamp(&format!(
                "Action [{}] status change to {}",
                action.name, status
            )));
            logs.append_batch(lines);
            status
        });

        let statuses = join_all(branches).await;
        Status::aggregate(statuses)
    }
}
