//! Flow execution engine
//!
//! [`FlowOrchestrator`] walks the stages of a flow, [`StageExecutor`] runs a
//! stage's actions sequentially or concurrently, and [`ActionRunner`] hands
//! each job to the dispatcher.

pub mod context;
pub mod engine;
pub mod report;
pub mod runner;
pub mod stage;

pub use context::RunContext;
pub use engine::{EventHandler, FlowEvent, FlowOrchestrator, RunOptions};
pub use report::{Fault, FaultScope, RunReport};
pub use runner::ActionRunner;
pub use stage::StageExecutor;
