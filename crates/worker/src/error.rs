use thiserror::Error;

#[derive(Error, Debug)]
pub enum WorkerError {
    #[error("Failed to load configuration")]
    Config(#[from] config::ConfigError),

    #[error("Source error: {0}")]
    Source(#[from] floe_common::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid work item: {0}")]
    WorkItem(#[from] serde_json::Error),

    #[error("Read task failed: {0}")]
    Join(#[from] tokio::task::JoinError),

    #[error("Progress update failed: {0}")]
    ProgressUpdate(String),

    #[error("An internal error occurred: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, WorkerError>;
