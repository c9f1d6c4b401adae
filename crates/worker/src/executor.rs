use crate::error::Result;
use crate::progress::{progress_loop, report_once, WorkContext, WorkProgressUpdater};
use crate::read_operation::ReadOperation;
use crate::work_item::{RecordEncoding, SourceSpec, WorkItem};
use floe_common::{Position, Progress};
use floe_connector_filesystem::TextLineSource;
use floe_connector_memory::InMemorySource;
use floe_source::{BytesCodec, Source};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;
use tracing::{info, warn};

/// Outcome of one executed work item.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WorkSummary {
    pub work_item_id: String,
    pub elements_read: u64,
    pub bytes_read: u64,
    pub final_progress: Progress,
    pub stop_position: Option<Position>,
}

/// Opens `source` and reads it to the end on a blocking thread while
/// reporting progress every `interval`, then sends one final report.
pub async fn execute_work_item<S, F>(
    ctx: WorkContext,
    source: S,
    updater: Arc<dyn WorkProgressUpdater>,
    interval: Duration,
    sink: F,
) -> Result<WorkSummary>
where
    S: Source,
    S::Iter: 'static,
    F: FnMut(S::Item) -> Result<()> + Send + 'static,
{
    let operation = Arc::new(ReadOperation::open(source)?);

    let (done_tx, done_rx) = oneshot::channel();
    let reporter = tokio::spawn(progress_loop(
        Arc::clone(&updater),
        Arc::clone(&operation),
        ctx.clone(),
        interval,
        done_rx,
    ));

    let reader = Arc::clone(&operation);
    let read = tokio::task::spawn_blocking(move || reader.run(sink)).await;

    let _ = done_tx.send(());
    if let Err(err) = reporter.await {
        warn!(work_item = %ctx.work_item_id, "Progress reporter ended abnormally: {err}");
    }

    // Final progress report.
    if let Err(err) = report_once(updater.as_ref(), &operation, &ctx).await {
        warn!(work_item = %ctx.work_item_id, "Failed to send final progress report: {err}");
    }

    let delivered = read??;
    let summary = WorkSummary {
        work_item_id: ctx.work_item_id,
        elements_read: operation.counters().elements(),
        bytes_read: operation.counters().bytes(),
        final_progress: operation.progress(),
        stop_position: operation.stop_position(),
    };
    info!(
        work_item = %summary.work_item_id,
        delivered,
        bytes = summary.bytes_read,
        stop_position = ?summary.stop_position,
        "Work item finished"
    );
    Ok(summary)
}

/// Builds the source a work item describes and executes it. Records reach
/// `sink` as raw bytes.
pub async fn run_work_item<F>(
    item: WorkItem,
    worker_id: String,
    updater: Arc<dyn WorkProgressUpdater>,
    interval: Duration,
    sink: F,
) -> Result<WorkSummary>
where
    F: FnMut(Vec<u8>) -> Result<()> + Send + 'static,
{
    let ctx = WorkContext { work_item_id: item.id, worker_id };

    match item.source {
        SourceSpec::InMemory { records, encoding, start_index, end_index } => {
            let source = match encoding {
                RecordEncoding::Utf8 => {
                    let records: Vec<Vec<u8>> =
                        records.into_iter().map(String::into_bytes).collect();
                    InMemorySource::new(records, start_index, end_index, BytesCodec)
                }
                RecordEncoding::ByteString => InMemorySource::from_encoded_strings(
                    &records,
                    start_index,
                    end_index,
                    BytesCodec,
                ),
            }?;
            info!(
                work_item = %ctx.work_item_id,
                start_index = source.start_index(),
                end_index = source.end_index(),
                "Reading in-memory range"
            );
            execute_work_item(ctx, source, updater, interval, sink).await
        }
        SourceSpec::TextFile { path, start_offset, end_offset } => {
            let source = TextLineSource::new(path, start_offset, end_offset, BytesCodec)?;
            info!(
                work_item = %ctx.work_item_id,
                path = %source.path().display(),
                start_offset = source.start_offset(),
                end_offset = source.end_offset(),
                "Reading text file range"
            );
            execute_work_item(ctx, source, updater, interval, sink).await
        }
    }
}
