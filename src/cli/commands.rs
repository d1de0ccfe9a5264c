//! Subcommand implementations

use super::{BatchArgs, Cli, Command, RunArgs, load_items};
use crate::config::{Config, FeatureOverrides};
use crate::core::batch::{
    BatchEvent, BatchManager, CancellationGate, ChunkOperation, FeatureKind, JobSpec, JobStatus,
    RunReport,
};
use crate::core::erp::{ErpChunkOperation, ErpClient, QueueStatusGate};
use crate::core::session::SessionContext;
use crate::core::webhooks::WebhookForwarder;
use crate::utils::format_duration;
use crate::utils::logging::init_tracing;
use anyhow::{Context, Result};
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, mpsc};
use tracing::{info, warn};

/// Exit status of a run stopped by the user
const EXIT_CANCELLED: u8 = 130;

/// Upper bound on waiting for queued webhook deliveries at exit
const WEBHOOK_DRAIN_TIMEOUT: Duration = Duration::from_secs(10);

/// Execute the parsed command line
pub async fn execute(cli: Cli) -> Result<ExitCode> {
    let config = match &cli.config {
        Some(path) => Config::from_file(path)
            .await
            .with_context(|| format!("loading {}", path.display()))?,
        None => Config::from_env().context("loading configuration from environment")?,
    };

    init_tracing(&config.logging)?;
    info!(
        "{} {} ({})",
        crate::NAME,
        crate::VERSION,
        crate::build_info().git_hash
    );

    match cli.command {
        Command::Run(args) => run(&config, args).await,
        Command::Status(args) => status(&config, args).await,
        Command::Cancel(args) => cancel(&config, args).await,
        Command::Features => {
            features(&config);
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn session(config: &Config, user: &str) -> SessionContext {
    let ctx = SessionContext::new(user);
    match &config.erp.token {
        Some(token) => ctx.with_token(token.clone()),
        None => ctx,
    }
}

async fn run(config: &Config, args: RunArgs) -> Result<ExitCode> {
    let items = load_items(&args.items).await?;
    let ctx = session(config, &args.user);

    let mut spec = JobSpec::new(args.feature);
    if let Some(batch_id) = args.batch_id {
        spec = spec.with_batch_id(batch_id);
    }
    if let Some(chunk_size) = args.chunk_size {
        spec = spec.with_chunk_size(chunk_size);
    }
    if let Some(branch) = args.branch {
        spec = spec.with_branch(branch);
    }

    let client = ErpClient::new(&config.erp)?;
    let operation: Arc<dyn ChunkOperation> = Arc::new(ErpChunkOperation::new(client.clone(), &spec));
    let external_gate: Option<Arc<dyn CancellationGate>> =
        if spec.feature.is_queue() && config.erp.poll_queue_status {
            Some(Arc::new(QueueStatusGate::new(client, ctx.clone())))
        } else {
            None
        };

    let manager = BatchManager::new(config.batch.clone());
    let printer = tokio::spawn(print_events(manager.subscribe()));

    let mut forwarder = None;
    if !config.webhooks.is_empty() {
        let webhooks = WebhookForwarder::new(config.webhooks.clone())?;
        if !webhooks.is_empty() {
            forwarder = Some(webhooks.start(manager.subscribe()));
        }
    }

    let mut spawned = manager
        .spawn(ctx, spec, items, operation, external_gate)
        .await?;

    let (signal_tx, signal_rx) = mpsc::channel(4);
    let listener = tokio::spawn(listen_ctrl_c(signal_tx));
    let mut watcher = tokio::spawn(watch_interrupts(
        manager.clone(),
        spawned.batch_id.clone(),
        signal_rx,
    ));

    let report = tokio::select! {
        joined = &mut spawned.handle => joined.context("batch task panicked")?,
        _ = &mut watcher => {
            warn!("Interrupted twice, exiting without waiting for the current chunk");
            listener.abort();
            return Ok(ExitCode::from(EXIT_CANCELLED));
        }
    };

    listener.abort();
    watcher.abort();
    let _ = watcher.await;

    // Last sender gone: printer and forwarder see the bus close
    drop(manager);
    if let Err(e) = printer.await {
        warn!("Progress printer stopped: {}", e);
    }
    if let Some(handle) = forwarder {
        match tokio::time::timeout(WEBHOOK_DRAIN_TIMEOUT, handle).await {
            Ok(Err(e)) => warn!("Webhook forwarder stopped: {}", e),
            Err(_) => warn!(
                "Webhook delivery still running after {:?}, giving up",
                WEBHOOK_DRAIN_TIMEOUT
            ),
            Ok(Ok(())) => {}
        }
    }

    print_report(&report, args.json)?;
    Ok(exit_code(&report))
}

async fn status(config: &Config, args: BatchArgs) -> Result<ExitCode> {
    let client = ErpClient::new(&config.erp)?;
    let ctx = session(config, &args.user);

    let status = client.get_queue_status(&ctx, &args.batch_id).await?;
    println!("{}", serde_json::to_string_pretty(&status)?);
    Ok(ExitCode::SUCCESS)
}

async fn cancel(config: &Config, args: BatchArgs) -> Result<ExitCode> {
    let client = ErpClient::new(&config.erp)?;
    let ctx = session(config, &args.user);

    let response = client.cancel_queue(&ctx, &args.batch_id).await?;
    println!(
        "Cancellation requested for {}{}",
        args.batch_id,
        response
            .message
            .map(|m| format!(": {}", m))
            .unwrap_or_default()
    );
    Ok(ExitCode::SUCCESS)
}

fn features(config: &Config) {
    println!(
        "{:<22} {:>6} {:>11} {:>9} {:>9}  {}",
        "FEATURE", "CHUNK", "BOUNDS", "ON ERROR", "DELAY", "ERP METHOD"
    );
    for kind in FeatureKind::ALL {
        let overrides: &FeatureOverrides = config.batch.overrides(kind);
        match kind.policy(overrides, None) {
            Ok(policy) => {
                let (min, max) = kind.chunk_bounds();
                println!(
                    "{:<22} {:>6} {:>11} {:>9} {:>9}  {}",
                    kind.as_str(),
                    policy.chunk_size,
                    format!("{}-{}", min, max),
                    format!("{:?}", policy.on_error).to_lowercase(),
                    format_duration(policy.inter_chunk_delay.as_millis() as u64),
                    kind.chunk_method()
                );
            }
            Err(e) => println!("{:<22} invalid override: {}", kind.as_str(), e),
        }
    }
}

/// Forward every Ctrl-C press into `presses`
async fn listen_ctrl_c(presses: mpsc::Sender<()>) {
    while tokio::signal::ctrl_c().await.is_ok() {
        if presses.send(()).await.is_err() {
            break;
        }
    }
}

/// The first press cancels the job at its next chunk boundary; returns on
/// the second press
async fn watch_interrupts(
    manager: BatchManager,
    batch_id: String,
    mut presses: mpsc::Receiver<()>,
) {
    if presses.recv().await.is_none() {
        futures::future::pending::<()>().await;
    }
    warn!("Interrupted, cancelling at the next chunk boundary (press Ctrl-C again to exit)");
    if let Err(e) = manager.cancel(&batch_id).await {
        warn!("Cancel failed: {}", e);
    }

    if presses.recv().await.is_none() {
        futures::future::pending::<()>().await;
    }
}

/// Print progress until the job's terminal event
async fn print_events(mut receiver: broadcast::Receiver<BatchEvent>) {
    loop {
        match receiver.recv().await {
            Ok(BatchEvent::Progress(snapshot)) => {
                let eta = snapshot
                    .eta_seconds
                    .map(|s| format!(" (eta {})", format_duration(s * 1000)))
                    .unwrap_or_default();
                println!("[{:>3}%] {}{}", snapshot.percent, snapshot.message, eta);
            }
            Ok(event) => {
                if event.is_terminal() {
                    break;
                }
            }
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                warn!("Progress output skipped {} events", skipped);
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}

fn print_report(report: &RunReport, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(report)?);
        return Ok(());
    }

    match report.status {
        JobStatus::Completed => println!(
            "Batch {} completed: {} of {} items applied, {} failed ({})",
            report.batch_id,
            report.processed_count,
            report.total_items,
            report.failed_count,
            format_duration(report.duration_ms)
        ),
        JobStatus::Cancelled => println!(
            "Batch {} cancelled: {} of {} items were processed before the stop",
            report.batch_id, report.processed_count, report.total_items
        ),
        _ => eprintln!(
            "Batch {} failed: {}",
            report.batch_id,
            report.error.as_deref().unwrap_or("unknown error")
        ),
    }
    Ok(())
}

fn exit_code(report: &RunReport) -> ExitCode {
    match report.status {
        JobStatus::Completed if report.failed_count == 0 => ExitCode::SUCCESS,
        JobStatus::Cancelled => ExitCode::from(EXIT_CANCELLED),
        _ => ExitCode::FAILURE,
    }
}
