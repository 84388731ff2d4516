use anyhow::{Context, Result};
use devflow::cli::commands::{HistoryCommand, RunCommand, ValidateCommand};
use devflow::cli::output::*;
use devflow::cli::terminal_output::TerminalOutput;
use devflow::cli::{Cli, Command};
use devflow::core::config::load_flow_file;
use devflow::core::{ConsoleObserver, FlowUri, RunMode};
use devflow::dispatch::{DispatcherConfig, KubectlDispatcher};
use devflow::execution::{FlowOrchestrator, RunOptions};
use devflow::notify::NotifierRegistry;
use devflow::persistence::{FlowStore, InMemoryStore};
use std::sync::Arc;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::from_args();

    // Initialize logging, RUST_LOG wins over --verbose
    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set logging subscriber")?;

    match &cli.command {
        Command::Run(cmd) => run_flow(cmd, cli.verbose).await?,
        Command::Validate(cmd) => validate_flow(cmd)?,
        Command::History(cmd) => show_history(cmd).await?,
    }

    Ok(())
}

#[cfg(feature = "sqlite")]
async fn history_store() -> Result<Arc<dyn FlowStore>> {
    let store = devflow::persistence::SqliteFlowStore::with_default_path().await?;
    Ok(Arc::new(store))
}

#[cfg(not(feature = "sqlite"))]
async fn history_store() -> Result<Arc<dyn FlowStore>> {
    tracing::warn!("Built without sqlite support, history is kept in memory only");
    Ok(Arc::new(InMemoryStore::new()))
}

async fn run_flow(cmd: &RunCommand, verbose: bool) -> Result<()> {
    let mode: RunMode = cmd.mode.into();
    let mut flow = load_flow_file(&cmd.file, mode)
        .with_context(|| format!("Failed to load flow definition {}", cmd.file))?;

    println!(
        "{} Loaded flow: {} ({} stages, {} mode)",
        INFO,
        style(&flow.uri).bold(),
        style(flow.stages.len()).cyan(),
        mode
    );

    let store: Arc<dyn FlowStore> = if cmd.no_history {
        Arc::new(InMemoryStore::new())
    } else {
        history_store().await?
    };

    let mut config = DispatcherConfig::new();
    if let Some(kubectl) = &cmd.kubectl {
        config = config.with_kubectl(kubectl.clone());
    }
    if let Some(namespace) = &cmd.namespace {
        config = config.with_namespace(namespace.clone());
    }
    if let Some(timeout) = cmd.timeout {
        config = config.with_timeout(timeout);
    }
    let dispatcher = Arc::new(KubectlDispatcher::new(config));

    let terminal = TerminalOutput::new(flow.stages.len());
    let orchestrator = FlowOrchestrator::new(dispatcher, store)
        .with_notifiers(NotifierRegistry::with_defaults())
        .with_options(RunOptions {
            verbose,
            timestamp: cmd.timestamp,
        })
        .with_observer(Arc::new(ConsoleObserver))
        .on_event(move |event| terminal.on_event(&event));

    let report = orchestrator.run(&mut flow).await;

    if !report.faults.is_empty() {
        println!("\n{} {} problem(s) during the run:", WARN, report.faults.len());
        for fault in &report.faults {
            println!("  {}", format_fault(fault));
        }
    }

    println!("\n{}", format_report(&report));
    if let Some(number) = flow.number {
        println!("  Run number: {}", style(number).cyan());
    }

    if !report.is_success() {
        std::process::exit(1);
    }

    Ok(())
}

fn validate_flow(cmd: &ValidateCommand) -> Result<()> {
    println!("{} Validating flow...", INFO);

    match load_flow_file(&cmd.file, RunMode::CliRun) {
        Ok(flow) => {
            println!("{} Flow definition is valid!", CHECK);
            println!("  URI: {}", style(&flow.uri).bold());
            println!("  Stages: {}", style(flow.stages.len()).cyan());
            println!("  Receivers: {}", style(flow.receivers.len()).cyan());

            if cmd.json {
                println!("\n{}", flow.to_json_pretty()?);
            }
            Ok(())
        }
        Err(e) => {
            println!("{} Validation failed:", CROSS);
            println!("  {}", style(e).red());
            std::process::exit(1);
        }
    }
}

async fn show_history(cmd: &HistoryCommand) -> Result<()> {
    let uri = FlowUri::parse(&cmd.uri)?;
    let store = history_store().await?;

    let Some(flow_id) = store
        .find_flow(&uri.namespace, &uri.repository, &uri.name, &cmd.tag)
        .await?
    else {
        println!("{} Flow {} not found in history", WARN, style(&uri).bold());
        return Ok(());
    };

    let runs: Vec<_> = store
        .list_runs(flow_id)
        .await?
        .into_iter()
        .take(cmd.limit)
        .collect();

    if cmd.json {
        let data = serde_json::json!({ "uri": uri.to_string(), "tag": cmd.tag, "runs": runs });
        println!("{}", serde_json::to_string_pretty(&data)?);
        return Ok(());
    }

    if runs.is_empty() {
        println!("{} No runs recorded for {}", INFO, style(&uri).bold());
        return Ok(());
    }

    println!(
        "{} Run history of {} (showing latest {}):",
        INFO,
        style(&uri).bold(),
        cmd.limit
    );
    for run in &runs {
        println!("  {}", format_run_record(run));
    }

    Ok(())
}
