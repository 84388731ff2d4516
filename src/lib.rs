//! devflow - a staged flow orchestrator for containerized jobs

pub mod cli;
pub mod core;
pub mod dispatch;
pub mod execution;
pub mod notify;
pub mod persistence;

// Re-export commonly used types
pub use core::{Action, Flow, Job, Sequencing, Stage, StageKind, Status};
pub use dispatch::{DispatchError, JobDispatcher, JobReport};
pub use execution::{FlowEvent, FlowOrchestrator, RunOptions, RunReport};
pub use notify::{Notifier, NotifierRegistry, NotifyError};
pub use persistence::{FlowStore, InMemoryStore};
