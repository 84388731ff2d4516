//! Job dispatch contract
//!
//! The engine never executes work itself. Each job is handed to a
//! [`JobDispatcher`], which may block up to the job's timeout and reports a
//! terminal status back.

pub mod client;
pub mod kubectl;
pub mod response;

use crate::core::Job;
use async_trait::async_trait;
pub use client::DispatcherConfig;
pub use kubectl::KubectlDispatcher;
pub use response::{DispatchError, JobReport};

/// Trait for job execution backends
#[async_trait]
pub trait JobDispatcher: Send + Sync {
    /// Execute one job to completion
    ///
    /// Implementations return a terminal status (never pending or running)
    /// and an error describing any failure of the backend itself.
    async fn execute(&self, job: &Job) -> Result<JobReport, DispatchError>;
}
