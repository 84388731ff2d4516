//! Notification of flow outcomes to receivers
//!
//! Receivers name a notifier type; the [`NotifierRegistry`] maps that type to
//! a [`Notifier`]. The registry is built explicitly when the orchestrator is
//! set up, there is no process-wide table.

use crate::core::{Flow, Receiver};
use async_trait::async_trait;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use tracing::info;

/// Error types for notification delivery
#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("no notifier registered for receiver type '{0}'")]
    UnknownReceiverType(String),

    #[error("failed to notify {address}: {message}")]
    Delivery { address: String, message: String },
}

/// Delivers a finished flow's outcome to a set of addresses
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, flow: &Flow, addresses: &[String]) -> Result<(), NotifyError>;
}

/// Mapping from receiver type to notifier
#[derive(Clone, Default)]
pub struct NotifierRegistry {
    notifiers: HashMap<String, Arc<dyn Notifier>>,
}

impl NotifierRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the built-in `log` notifier
    pub fn with_defaults() -> Self {
        Self::new().with("log", Arc::new(TracingNotifier))
    }

    /// Add a notifier for `kind`, replacing any previous one
    pub fn with(mut self, kind: impl Into<String>, notifier: Arc<dyn Notifier>) -> Self {
        self.register(kind, notifier);
        self
    }

    pub fn register(&mut self, kind: impl Into<String>, notifier: Arc<dyn Notifier>) {
        self.notifiers.insert(kind.into(), notifier);
    }

    pub fn resolve(&self, kind: &str) -> Result<Arc<dyn Notifier>, NotifyError> {
        self.notifiers
            .get(kind)
            .cloned()
            .ok_or_else(|| NotifyError::UnknownReceiverType(kind.to_string()))
    }

    /// Notify one receiver of the flow's current state
    pub async fn notify(&self, receiver: &Receiver, flow: &Flow) -> Result<(), NotifyError> {
        let notifier = self.resolve(&receiver.kind)?;
        notifier
            .notify(flow, std::slice::from_ref(&receiver.address))
            .await
    }

    /// Registered receiver types, sorted
    pub fn kinds(&self) -> Vec<&str> {
        let mut kinds: Vec<&str> = self.notifiers.keys().map(String::as_str).collect();
        kinds.sort_unstable();
        kinds
    }
}

impl fmt::Debug for NotifierRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NotifierRegistry")
            .field("kinds", &self.kinds())
            .finish()
    }
}

/// Notifier that reports the outcome through `tracing`
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

#[async_trait]
impl Notifier for TracingNotifier {
    async fn notify(&self, flow: &Flow, addresses: &[String]) -> Result<(), NotifyError> {
        for address in addresses {
            info!(
                flow = %flow.uri,
                status = %flow.status,
                number = ?flow.number,
                receiver = %address,
                "flow finished"
            );
        }
        Ok(())
    }
}
