//! Test: Concurrent stages - full join and dominance aggregation

use crate::helpers::*;
use devflow::core::Status;
use std::time::Duration;

#[tokio::test]
async fn test_cancel_dominates_success() {
    let harness = Harness::new(MockDispatcher::new().cancelling("img/a2"));
    let mut flow = flow_with(vec![concurrent(
        "test",
        vec![action("a1", &["img/a1"]), action("a2", &["img/a2"])],
    )]);

    let report = harness.run(&mut flow).await;

    assert_flow_status(&flow, &report, Status::Cancel);
    assert_eq!(
        action_statuses(&flow.stages[1]),
        vec![Status::Success, Status::Cancel]
    );
}

/// No sibling is cancelled when one branch fails
#[tokio::test]
async fn test_failure_dominates_and_every_action_finishes() {
    let harness = Harness::new(
        MockDispatcher::new()
            .cancelling("img/a1")
            .failing("img/a2"),
    );
    let mut flow = flow_with(vec![concurrent(
        "test",
        vec![
            action("a1", &["img/a1"]),
            action("a2", &["img/a2"]),
            action("a3", &["img/a3", "img/a3b"]),
        ],
    )]);

    let report = harness.run(&mut flow).await;

    assert_flow_status(&flow, &report, Status::Failure);
    let stage = &flow.stages[1];
    assert_eq!(
        action_statuses(stage),
        vec![Status::Cancel, Status::Failure, Status::Success]
    );
    assert!(harness.dispatcher.was_called("img/a3b"));
    assert!(stage.actions.iter().all(|a| a.status.is_terminal()));
}

#[tokio::test(start_paused = true)]
async fn test_actions_run_at_the_same_time() {
    let harness = Harness::new(MockDispatcher::new().with_delay(Duration::from_secs(5)));
    let mut flow = flow_with(vec![concurrent(
        "test",
        vec![
            action("a1", &["img/a1"]),
            action("a2", &["img/a2"]),
            action("a3", &["img/a3"]),
        ],
    )]);

    let started = tokio::time::Instant::now();
    let report = harness.run(&mut flow).await;

    assert_flow_status(&flow, &report, Status::Success);
    assert_eq!(harness.dispatcher.max_in_flight(), 3);
    assert!(started.elapsed() < Duration::from_secs(10));
}

#[tokio::test(start_paused = true)]
async fn test_sequential_stage_never_overlaps() {
    let harness = Harness::new(MockDispatcher::new().with_delay(Duration::from_secs(5)));
    let mut flow = flow_with(vec![sequential(
        "test",
        vec![action("a1", &["img/a1"]), action("a2", &["img/a2"])],
    )]);

    harness.run(&mut flow).await;

    assert_eq!(harness.dispatcher.max_in_flight(), 1);
}

/// Lines written at stage scope by one branch stay adjacent and ordered
#[tokio::test(start_paused = true)]
async fn test_stage_log_keeps_action_lines_together() {
    let harness = Harness::new(MockDispatcher::new().with_delay(Duration::from_millis(10)));
    let actions = (0..8)
        .map(|i| action(&format!("a{}", i), &[format!("img/{}", i).as_str()]))
        .collect();
    let mut flow = flow_with(vec![concurrent("fan-out", actions)]);

    harness.run(&mut flow).await;

    let lines = flow.stages[1].logs.snapshot();
    for i in 0..8 {
        let started = line_index(&lines, &format!("The Number [{}] action is running", i));
        let finished = line_index(&lines, &format!("Action [a{}] status change to success", i));
        assert_eq!(finished, started + 1, "lines of action a{} are interleaved", i);
    }
}
