//! kubectl job backend - runs each job as a one-shot pod

use crate::core::{Job, Status};
use crate::dispatch::{DispatchError, DispatcherConfig, JobDispatcher, JobReport};
use async_trait::async_trait;
use serde_json::json;
use std::time::Duration;
use tokio::process::Command;
use tokio::time::timeout;
use tracing::{debug, warn};
use uuid::Uuid;

/// Runs jobs through `kubectl run --rm --attach`
#[derive(Debug, Clone)]
pub struct KubectlDispatcher {
    kubectl: String,
    namespace: Option<String>,
    default_timeout_secs: u64,
}

impl KubectlDispatcher {
    pub fn new(config: DispatcherConfig) -> Self {
        Self {
            kubectl: config.kubectl.unwrap_or_else(|| "kubectl".to_string()),
            namespace: config.namespace,
            default_timeout_secs: config.timeout_secs,
        }
    }

    #[cfg(test)]
    pub fn kubectl_path(&self) -> &str {
        &self.kubectl
    }

    fn timeout_for(&self, job: &Job) -> u64 {
        if job.timeout > 0 {
            job.timeout
        } else {
            self.default_timeout_secs
        }
    }

    /// Command-line arguments for running `job` as pod `pod`
    pub fn build_args(&self, job: &Job, pod: &str) -> Vec<String> {
        let mut args = vec![
            "run".to_string(),
            pod.to_string(),
            format!("--image={}", job.endpoint),
            "--restart=Never".to_string(),
            "--rm".to_string(),
            "--attach".to_string(),
            "--quiet".to_string(),
            format!("--labels=devflow/kind={}", job.kind),
        ];

        if let Some(namespace) = &self.namespace {
            args.push(format!("--namespace={}", namespace));
        }

        for (key, value) in job.environment() {
            args.push(format!("--env={}={}", key, value));
        }

        if !job.resources.is_empty() {
            let mut requests = serde_json::Map::new();
            if !job.resources.cpu.is_empty() {
                requests.insert("cpu".to_string(), json!(job.resources.cpu));
            }
            if !job.resources.memory.is_empty() {
                requests.insert("memory".to_string(), json!(job.resources.memory));
            }
            let overrides = json!({
                "apiVersion": "v1",
                "spec": {
                    "containers": [{
                        "name": pod,
                        "resources": { "requests": requests }
                    }]
                }
            });
            args.push("--override-type=strategic".to_string());
            args.push(format!("--overrides={}", overrides));
        }

        args
    }
}

#[async_trait]
impl JobDispatcher for KubectlDispatcher {
    async fn execute(&self, job: &Job) -> Result<JobReport, DispatchError> {
        let pod = format!("devflow-{}", &Uuid::new_v4().simple().to_string()[..12]);
        let timeout_secs = self.timeout_for(job);
        let args = self.build_args(job, &pod);

        debug!("Spawning {} {}", self.kubectl, args.join(" "));

        let result = timeout(
            Duration::from_secs(timeout_secs),
            Command::new(&self.kubectl)
                .args(&args)
                .kill_on_drop(true)
                .output(),
        )
        .await
        .map_err(|_| DispatchError::Timeout(timeout_secs))?;

        let output = result.map_err(|e| {
            DispatchError::Internal(format!("failed to execute {}: {}", self.kubectl, e))
        })?;

        let lines: Vec<String> = String::from_utf8_lossy(&output.stdout)
            .lines()
            .map(str::to_string)
            .collect();

        match output.status.code() {
            Some(0) => {
                debug!("pod {} finished with {} output lines", pod, lines.len());
                Ok(JobReport::success(lines))
            }
            Some(code) => {
                let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
                warn!("pod {} exited with code {}: {}", pod, code, stderr);
                Err(DispatchError::Exited { code, stderr })
            }
            // Terminated by a signal, nobody let it finish
            None => Ok(JobReport {
                status: Status::Cancel,
                output: lines,
            }),
        }
    }
}
