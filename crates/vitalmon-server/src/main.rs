use anyhow::{Context, Result};
use chrono::Utc;
use std::sync::Arc;
use tokio::signal;
use vitalmon_common::types::Reading;
use vitalmon_notify::channels::SmtpTransport;
use vitalmon_notify::EmailTransport;

use vitalmon_server::app::{build_app, App};
use vitalmon_server::config::ServerConfig;
use vitalmon_server::logging;

#[allow(clippy::print_stderr)]
fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  vitalmon-server [config.toml]                                       Run the evaluation scheduler");
    eprintln!("  vitalmon-server evaluate <config.toml> <subject_id>                Run one evaluation pass");
    eprintln!("  vitalmon-server ingest <config.toml> <subject_id> <kind> <value>   Store a reading and evaluate it");
}

#[tokio::main]
async fn main() -> Result<()> {
    logging::init_tracing()?;

    let args: Vec<String> = std::env::args().collect();

    match args.get(1).map(|s| s.as_str()) {
        Some("evaluate") => {
            let (Some(config_path), Some(subject_id)) = (args.get(2), args.get(3)) else {
                print_usage();
                anyhow::bail!("evaluate requires <config.toml> and <subject_id> arguments");
            };
            run_evaluate(config_path, subject_id).await
        }
        Some("ingest") => {
            let (Some(config_path), Some(subject_id), Some(kind), Some(value)) =
                (args.get(2), args.get(3), args.get(4), args.get(5))
            else {
                print_usage();
                anyhow::bail!("ingest requires <config.toml> <subject_id> <kind> <value> arguments");
            };
            run_ingest(config_path, subject_id, kind, value, args.get(6).map(String::as_str)).await
        }
        Some("--help" | "-h") => {
            print_usage();
            Ok(())
        }
        _ => {
            let config_path = args
                .get(1)
                .map(|s| s.as_str())
                .unwrap_or("config/server.toml");
            run_server(config_path).await
        }
    }
}

async fn open(config_path: &str) -> Result<App> {
    let config = ServerConfig::load(config_path)
        .with_context(|| format!("Failed to load config '{config_path}'"))?;
    vitalmon_common::id::init(config.instance.machine_id, config.instance.node_id)
        .context("Invalid [instance] identity")?;
    let transport: Arc<dyn EmailTransport> = Arc::new(SmtpTransport::new(
        &config.smtp.settings(config.notify.max_attempts),
    )?);
    build_app(&config, transport).await
}

async fn run_evaluate(config_path: &str, subject_id: &str) -> Result<()> {
    let mut app = open(config_path).await?;
    let report = app.pipeline.evaluate_subject(subject_id, Utc::now()).await?;
    let notified = app.worker.drain().await;
    tracing::info!(
        subject_id,
        candidates = report.candidates,
        persisted = report.persisted,
        suppressed = report.suppressed,
        notified,
        "Evaluation complete"
    );
    Ok(())
}

/// Stores one reading given as raw JSON (e.g. `125` or
/// `{"systolic":150,"diastolic":85}`) and runs the ingest path for it.
async fn run_ingest(
    config_path: &str,
    subject_id: &str,
    kind: &str,
    value: &str,
    unit: Option<&str>,
) -> Result<()> {
    let raw: serde_json::Value =
        serde_json::from_str(value).with_context(|| format!("Invalid reading value '{value}'"))?;

    let mut app = open(config_path).await?;
    let reading = Reading::from_raw(subject_id, kind, &raw, unit, Utc::now())?;
    app.store.insert_reading(&reading).await?;
    let report = app.pipeline.on_reading_persisted(&reading).await?;
    let notified = app.worker.drain().await;
    tracing::info!(
        subject_id,
        reading_id = %reading.id,
        candidates = report.candidates,
        persisted = report.persisted,
        suppressed = report.suppressed,
        notified,
        "Reading ingested"
    );
    Ok(())
}

async fn run_server(config_path: &str) -> Result<()> {
    let App {
        scheduler, worker, ..
    } = open(config_path).await?;

    let worker_handle = tokio::spawn(worker.run());
    let scheduler_handle = tokio::spawn(async move {
        scheduler.run().await;
    });

    tracing::info!(config = %config_path, "Server started");

    signal::ctrl_c().await?;
    tracing::info!("Shutting down gracefully");

    scheduler_handle.abort();
    worker_handle.abort();
    tracing::info!("Server stopped");

    Ok(())
}
