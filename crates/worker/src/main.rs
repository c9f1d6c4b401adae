use clap::Parser;
use floe_worker::config::Settings;
use floe_worker::logging::init_logging;
use floe_worker::{run_work_item, LoggingProgressUpdater, WorkItem, WorkerError};
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

/// Reads one work item and writes its records to stdout, one per line.
#[derive(Debug, Parser)]
#[command(name = "floe-worker", version, about)]
struct Cli {
    /// JSON work item description.
    #[arg(long)]
    work_item: PathBuf,

    /// Settings file; defaults to $FLOE_WORKER_CONFIG_PATH.
    #[arg(long)]
    config: Option<String>,

    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[tokio::main]
async fn main() -> Result<(), WorkerError> {
    let cli = Cli::parse();
    let settings = match &cli.config {
        Some(path) => Settings::from_path(path)?,
        None => Settings::new()?,
    };
    init_logging(&settings, cli.verbose);

    let item = WorkItem::from_path(&cli.work_item)?;
    let worker_id = settings.resolved_worker_id();
    info!(worker_id = %worker_id, work_item = %item.id, "Starting work item");

    let mut stdout = std::io::stdout();
    let sink = move |record: Vec<u8>| -> floe_worker::Result<()> {
        stdout.write_all(&record)?;
        stdout.write_all(b"\n")?;
        Ok(())
    };

    let summary = run_work_item(
        item,
        worker_id,
        Arc::new(LoggingProgressUpdater),
        settings.progress_report_interval(),
        sink,
    )
    .await?;
    std::io::stdout().flush()?;

    info!(
        elements = summary.elements_read,
        bytes = summary.bytes_read,
        final_position = ?summary.final_progress.position,
        "Done"
    );
    Ok(())
}
