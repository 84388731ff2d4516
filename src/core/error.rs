//! Definition-time errors

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while loading, parsing or validating a flow definition
///
/// These are the only errors that stop a run from starting. Anything that
/// goes wrong once a flow is running is recorded as a fault instead.
#[derive(Debug, Error)]
pub enum DefinitionError {
    #[error("failed to read flow file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed flow document: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("malformed flow document: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid flow URI '{uri}': {reason}")]
    InvalidUri { uri: String, reason: String },

    #[error("invalid flow definition: {0}")]
    Invalid(String),
}
