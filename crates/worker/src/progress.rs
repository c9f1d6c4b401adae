//! Periodic progress reporting to the control plane.
//!
//! Each report may come back with a proposed stop position, which is applied
//! to the running read as a dynamic split.

use crate::error::Result;
use crate::read_operation::ReadOperation;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use floe_common::{Position, Progress};
use floe_source::SourceIterator;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;
use tracing::{info, warn};

/// Identifies the work a report is about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkContext {
    pub work_item_id: String,
    pub worker_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProgressReport {
    pub work_item_id: String,
    pub worker_id: String,
    pub progress: Progress,
    pub elements_read: u64,
    pub bytes_read: u64,
    pub stop_position: Option<Position>,
    pub finished: bool,
    pub reported_at: DateTime<Utc>,
}

/// The control plane's side of progress reporting.
#[async_trait]
pub trait WorkProgressUpdater: Send + Sync {
    /// Sends one report. A returned `Progress` is a proposed stop position
    /// for the reported work item.
    async fn report_progress(&self, report: ProgressReport) -> Result<Option<Progress>>;
}

/// Logs every report and never proposes a split.
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingProgressUpdater;

#[async_trait]
impl WorkProgressUpdater for LoggingProgressUpdater {
    async fn report_progress(&self, report: ProgressReport) -> Result<Option<Progress>> {
        info!(
            work_item = %report.work_item_id,
            position = ?report.progress.position,
            elements = report.elements_read,
            bytes = report.bytes_read,
            finished = report.finished,
            "Progress"
        );
        Ok(None)
    }
}

pub fn build_report<I>(operation: &ReadOperation<I>, ctx: &WorkContext) -> ProgressReport
where
    I: SourceIterator,
{
    ProgressReport {
        work_item_id: ctx.work_item_id.clone(),
        worker_id: ctx.worker_id.clone(),
        progress: operation.progress(),
        elements_read: operation.counters().elements(),
        bytes_read: operation.counters().bytes(),
        stop_position: operation.stop_position(),
        finished: operation.is_finished(),
        reported_at: Utc::now(),
    }
}

/// Sends one report and applies the proposed split, if any. Returns the
/// stop position that was accepted.
pub async fn report_once<I>(
    updater: &dyn WorkProgressUpdater,
    operation: &ReadOperation<I>,
    ctx: &WorkContext,
) -> Result<Option<Position>>
where
    I: SourceIterator,
{
    let report = build_report(operation, ctx);
    match updater.report_progress(report).await? {
        Some(proposed) => Ok(operation.request_dynamic_split(&proposed)),
        None => Ok(None),
    }
}

/// Reports every `interval` until `done` fires. Failed reports are logged
/// and retried on the next tick.
pub async fn progress_loop<I>(
    updater: Arc<dyn WorkProgressUpdater>,
    operation: Arc<ReadOperation<I>>,
    ctx: WorkContext,
    interval: Duration,
    mut done: oneshot::Receiver<()>,
) where
    I: SourceIterator,
{
    let mut ticker = tokio::time::interval(std::cmp::max(Duration::from_millis(1), interval));
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                if let Err(err) = report_once(updater.as_ref(), &operation, &ctx).await {
                    warn!(work_item = %ctx.work_item_id, "Failed to report progress: {err}");
                }
            }
            _ = &mut done => {
                return;
            }
        }
    }
}
