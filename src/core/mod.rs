//! Core domain models for flows
//!
//! This module defines the four-level hierarchy (flow, stage, action, job),
//! the status vocabulary they share, and the per-entity log buffers.

pub mod action;
pub mod config;
pub mod error;
pub mod flow;
pub mod job;
pub mod log;
pub mod stage;
pub mod status;

pub use action::Action;
pub use error::DefinitionError;
pub use flow::{Flow, FlowUri, Receiver, RunMode};
pub use job::{Job, Resources};
pub use log::{ConsoleObserver, LogBuffer, LogObserver, LogRecorder};
pub use stage::{Sequencing, Stage, StageKind};
pub use status::Status;
