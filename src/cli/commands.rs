//! CLI command definitions

use crate::core::RunMode;
use clap::Args;

/// Run a flow
#[derive(Debug, Args, Clone)]
pub struct RunCommand {
    /// Path to flow YAML file
    #[arg(short, long)]
    pub file: String,

    /// How the run was started
    #[arg(long, value_enum, default_value_t = RunModeArg::Cli)]
    pub mode: RunModeArg,

    /// Don't save the flow and its runs to history
    #[arg(long)]
    pub no_history: bool,

    /// Prefix mirrored log lines with their timestamp
    #[arg(long)]
    pub timestamp: bool,

    /// kubectl binary used to run jobs
    #[arg(long)]
    pub kubectl: Option<String>,

    /// Kubernetes namespace for job pods
    #[arg(long)]
    pub namespace: Option<String>,

    /// Default job timeout in seconds, used when a job declares none
    #[arg(long)]
    pub timeout: Option<u64>,
}

/// Validate a flow definition
#[derive(Debug, Args, Clone)]
pub struct ValidateCommand {
    /// Path to flow YAML file
    #[arg(short, long)]
    pub file: String,

    /// Output in JSON format
    #[arg(long)]
    pub json: bool,
}

/// Show run history of a flow
#[derive(Debug, Args, Clone)]
pub struct HistoryCommand {
    /// Flow address, namespace/repository/name
    #[arg(short, long)]
    pub uri: String,

    /// Flow tag
    #[arg(short, long, default_value = "")]
    pub tag: String,

    /// Number of recent runs to show
    #[arg(short, long, default_value_t = 10)]
    pub limit: usize,

    /// Output in JSON format
    #[arg(long)]
    pub json: bool,
}

/// Run mode argument
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum RunModeArg {
    Cli,
    #[clap(name = "daemon-run")]
    DaemonRun,
    #[clap(name = "daemon-start")]
    DaemonStart,
}

impl From<RunModeArg> for RunMode {
    fn from(arg: RunModeArg) -> Self {
        match arg {
            RunModeArg::Cli => RunMode::CliRun,
            RunModeArg::DaemonRun => RunMode::DaemonRun,
            RunModeArg::DaemonStart => RunMode::DaemonStart,
        }
    }
}
