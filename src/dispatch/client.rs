//! Dispatcher configuration

/// Configuration for the kubectl job backend
#[derive(Debug, Clone)]
pub struct DispatcherConfig {
    /// Path to the kubectl executable
    ///
    /// If not provided, defaults to "kubectl" (assumes it's on PATH).
    pub kubectl: Option<String>,

    /// Namespace jobs are scheduled in, kubectl's current context when unset
    pub namespace: Option<String>,

    /// Timeout in seconds for jobs that don't declare their own
    pub timeout_secs: u64,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            kubectl: None,
            namespace: None,
            timeout_secs: 3600,
        }
    }
}

impl DispatcherConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_kubectl(mut self, path: String) -> Self {
        self.kubectl = Some(path);
        self
    }

    pub fn with_namespace(mut self, namespace: String) -> Self {
        self.namespace = Some(namespace);
        self
    }

    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }
}
