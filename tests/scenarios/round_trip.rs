//! Test: Definitions - YAML loading and the structured document after a run

use crate::helpers::*;
use devflow::core::config::{load_flow_file, parse_flow};
use devflow::core::{Flow, RunMode, Sequencing, StageKind, Status};

const RELEASE_FLOW: &str = r#"
uri: containerops/pilotage/release
title: Release pipeline
version: 3
tag: stable
timeout: 7200
stages:
  - type: start
    name: start
  - type: normal
    name: build
    title: Build
    sequencing: sequence
    actions:
      - name: compile
        title: Compile
        jobs:
          - type: container
            endpoint: registry.local/rust:1.80
            timeout: 900
            resources:
              cpu: "2"
              memory: 4Gi
            environments:
              - CARGO_TERM_COLOR: always
              - RUSTFLAGS: -Dwarnings
  - type: normal
    name: verify
    sequencing: parallel
    actions:
      - name: unit
        jobs:
          - type: container
            endpoint: registry.local/test:1
      - name: lint
        jobs:
          - type: container
            endpoint: registry.local/lint:1
  - type: end
    name: end
receivers:
  - type: record
    address: release@example.com
"#;

#[test]
fn test_definition_is_parsed_in_declared_order() {
    let flow = parse_flow(RELEASE_FLOW).unwrap();

    assert_eq!(flow.uri, "containerops/pilotage/release");
    assert_eq!(flow.version, 3);
    assert_eq!(flow.timeout, 7200);

    let kinds: Vec<_> = flow.stages.iter().map(|s| s.kind).collect();
    assert_eq!(
        kinds,
        vec![StageKind::Start, StageKind::Normal, StageKind::Normal, StageKind::End]
    );
    assert_eq!(flow.stages[1].sequencing, Some(Sequencing::Sequential));
    assert_eq!(flow.stages[2].sequencing, Some(Sequencing::Concurrent));

    let job = &flow.stages[1].actions[0].jobs[0];
    assert_eq!(job.timeout, 900);
    assert_eq!(job.resources.memory, "4Gi");
    assert_eq!(job.environment().get("RUSTFLAGS").map(String::as_str), Some("-Dwarnings"));
}

#[test]
fn test_load_seeds_run() {
    let path = std::env::temp_dir().join(format!("devflow-{}.yaml", uuid::Uuid::new_v4()));
    std::fs::write(&path, RELEASE_FLOW).unwrap();

    let flow = load_flow_file(&path, RunMode::DaemonRun).unwrap();
    std::fs::remove_file(&path).unwrap();

    assert_eq!(flow.run_mode, RunMode::DaemonRun);
    assert_eq!(flow.number, Some(1));
    assert_eq!(flow.status, Status::Pending);
}

/// The executed flow, with statuses, outputs and logs, survives the document format
#[tokio::test]
async fn test_executed_flow_round_trips() {
    let harness = Harness::new(MockDispatcher::new().failing("registry.local/lint:1"));
    let mut flow = parse_flow(RELEASE_FLOW).unwrap();

    let report = harness.run(&mut flow).await;
    assert_flow_status(&flow, &report, Status::Failure);
    assert_eq!(harness.notifier.deliveries()[0].addresses, vec!["release@example.com"]);

    let back = Flow::from_json(&flow.to_json().unwrap()).unwrap();
    assert_eq!(back.stages, flow.stages);
    assert_eq!(back.receivers, flow.receivers);
    assert_eq!(back.status, Status::Failure);
    assert_eq!(back.number, flow.number);
    assert_eq!(back.logs.snapshot(), flow.logs.snapshot());

    let compile = &back.stages[1].actions[0];
    assert_eq!(compile.jobs[0].output, vec!["ran registry.local/rust:1.80"]);
    assert!(!compile.logs.is_empty());

    let yaml = flow.to_yaml().unwrap();
    assert!(yaml.contains("status: failure"));
    assert!(yaml.contains("sequencing: parallel"));
}
