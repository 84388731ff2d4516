//! Flow definitions from YAML

use crate::core::{
    error::DefinitionError,
    flow::{Flow, FlowUri, RunMode},
    stage::StageKind,
    status::Status,
};
use std::collections::HashSet;
use std::path::Path;

/// Load a flow definition file and seed it for a run in `mode`
pub fn load_flow_file<P: AsRef<Path>>(path: P, mode: RunMode) -> Result<Flow, DefinitionError> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|source| DefinitionError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let mut flow = parse_flow(&content)?;
    flow.run_mode = mode;
    flow.number = Some(1);
    flow.status = Status::Pending;
    Ok(flow)
}

/// Parse and validate a flow definition from a YAML string
pub fn parse_flow(yaml: &str) -> Result<Flow, DefinitionError> {
    let flow: Flow = serde_yaml::from_str(yaml)?;
    validate_flow(&flow)?;
    Ok(flow)
}

/// Validate a flow definition
pub fn validate_flow(flow: &Flow) -> Result<(), DefinitionError> {
    FlowUri::parse(&flow.uri)?;

    let mut seen_names = HashSet::new();
    let last = flow.stages.len().saturating_sub(1);

    for (i, stage) in flow.stages.iter().enumerate() {
        if stage.name.is_empty() {
            return Err(DefinitionError::Invalid(format!("stage {} has no name", i)));
        }
        if !seen_names.insert(stage.name.as_str()) {
            return Err(DefinitionError::Invalid(format!(
                "duplicate stage name: {}",
                stage.name
            )));
        }

        match stage.kind {
            StageKind::Start if i != 0 => {
                return Err(DefinitionError::Invalid(format!(
                    "start stage '{}' must be the first stage",
                    stage.name
                )));
            }
            StageKind::End if i != last => {
                return Err(DefinitionError::Invalid(format!(
                    "end stage '{}' must be the last stage",
                    stage.name
                )));
            }
            StageKind::Normal if stage.sequencing.is_none() => {
                return Err(DefinitionError::Invalid(format!(
                    "normal stage '{}' has no sequencing mode",
                    stage.name
                )));
            }
            _ => {}
        }

        if stage.kind != StageKind::Normal && !stage.actions.is_empty() {
            return Err(DefinitionError::Invalid(format!(
                "{} stage '{}' cannot declare actions",
                stage.kind, stage.name
            )));
        }

        for action in &stage.actions {
            if action.name.is_empty() {
                return Err(DefinitionError::Invalid(format!(
                    "stage '{}' has an action with no name",
                    stage.name
                )));
            }
            for (j, job) in action.jobs.iter().enumerate() {
                if job.kind.is_empty() || job.endpoint.is_empty() {
                    return Err(DefinitionError::Invalid(format!(
                        "job {} of action '{}' needs both a type and an endpoint",
                        j, action.name
                    )));
                }
            }
        }
    }

    Ok(())
}
