//! Test: Sequential stages - declared order and fail-fast

use crate::helpers::*;
use devflow::core::Status;
use devflow::execution::FaultScope;

/// Start, then a sequential stage whose second action fails
#[tokio::test]
async fn test_failure_stops_remaining_actions() {
    let harness = Harness::new(MockDispatcher::new().failing("img/a2"));
    let mut flow = flow_with(vec![sequential(
        "build",
        vec![
            action("a1", &["img/a1"]),
            action("a2", &["img/a2"]),
            action("a3", &["img/a3"]),
        ],
    )]);

    let report = harness.run(&mut flow).await;

    assert_flow_status(&flow, &report, Status::Failure);
    assert_eq!(harness.dispatcher.calls(), vec!["img/a1", "img/a2"]);
    assert!(!harness.dispatcher.was_called("img/a3"));

    let build = &flow.stages[1];
    assert_eq!(build.status, Status::Failure);
    assert_eq!(
        action_statuses(build),
        vec![Status::Success, Status::Failure, Status::Pending]
    );

    // The end stage is never reached
    assert_eq!(
        stage_statuses(&flow),
        vec![Status::Success, Status::Failure, Status::Pending]
    );
}

/// Stage status equals the status of the action that stopped it
#[tokio::test]
async fn test_cancel_stops_stage_with_cancel() {
    let harness = Harness::new(MockDispatcher::new().cancelling("img/a1"));
    let mut flow = flow_with(vec![sequential(
        "deploy",
        vec![action("a1", &["img/a1"]), action("a2", &["img/a2"])],
    )]);

    let report = harness.run(&mut flow).await;

    assert_flow_status(&flow, &report, Status::Cancel);
    assert_eq!(flow.stages[1].status, Status::Cancel);
    assert_eq!(harness.dispatcher.calls(), vec!["img/a1"]);
    assert!(report.faults.is_empty());
}

#[tokio::test]
async fn test_jobs_run_in_declared_order() {
    let harness = Harness::new(MockDispatcher::new());
    let mut flow = flow_with(vec![
        sequential(
            "build",
            vec![action("compile", &["img/1", "img/2"]), action("package", &["img/3"])],
        ),
        sequential("test", vec![action("unit", &["img/4"])]),
    ]);

    let report = harness.run(&mut flow).await;

    assert_flow_status(&flow, &report, Status::Success);
    assert_eq!(
        harness.dispatcher.calls(),
        vec!["img/1", "img/2", "img/3", "img/4"]
    );
    assert_eq!(flow.stages[1].actions[0].jobs[1].output, vec!["ran img/2"]);
    assert!(stage_statuses(&flow).iter().all(|s| *s == Status::Success));
}

/// A failing job inside an action skips the action's later jobs
#[tokio::test]
async fn test_dispatch_error_is_absorbed_as_failure() {
    let harness = Harness::new(MockDispatcher::new().erroring("img/2", "image pull backoff"));
    let mut flow = flow_with(vec![sequential(
        "build",
        vec![action("compile", &["img/1", "img/2", "img/3"])],
    )]);

    let report = harness.run(&mut flow).await;

    assert_flow_status(&flow, &report, Status::Failure);
    assert_eq!(harness.dispatcher.calls(), vec!["img/1", "img/2"]);

    let compile = &flow.stages[1].actions[0];
    assert_eq!(compile.jobs[2].status, Status::Pending);
    assert_logged(&compile.logs.snapshot(), "Job [1] run error: backend error: image pull backoff");

    let dispatch: Vec<_> = report.faults_in(FaultScope::Dispatch).collect();
    assert_eq!(dispatch.len(), 1);
    assert_eq!(dispatch[0].subject, "compile job 1");
}

/// Flow status is the aggregate of the stages run before and including the first failure
#[tokio::test]
async fn test_later_stages_do_not_run_after_failure() {
    let harness = Harness::new(MockDispatcher::new().failing("img/test"));
    let mut flow = flow_with(vec![
        sequential("build", vec![action("compile", &["img/build"])]),
        sequential("test", vec![action("unit", &["img/test"])]),
        sequential("release", vec![action("push", &["img/release"])]),
    ]);

    let report = harness.run(&mut flow).await;

    assert_flow_status(&flow, &report, Status::Failure);
    assert_eq!(
        stage_statuses(&flow),
        vec![
            Status::Success,
            Status::Success,
            Status::Failure,
            Status::Pending,
            Status::Pending
        ]
    );
    assert!(!harness.dispatcher.was_called("img/release"));
}
