//! Worker crate
//!
//! Executes bounded-source work items: drives the read, reports progress to
//! the control plane and applies the dynamic splits it proposes.

pub mod config;
pub mod error;
pub mod executor;
pub mod logging;
pub mod progress;
pub mod read_operation;
pub mod work_item;

pub use error::{Result, WorkerError};
pub use executor::{execute_work_item, run_work_item, WorkSummary};
pub use progress::{LoggingProgressUpdater, ProgressReport, WorkContext, WorkProgressUpdater};
pub use read_operation::ReadOperation;
pub use work_item::{RecordEncoding, SourceSpec, WorkItem};
