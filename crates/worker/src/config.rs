use serde::Deserialize;
use std::time::Duration;
use uuid::Uuid;

pub const DEFAULT_CONFIG_PATH: &str = "crates/worker/config/default.toml";

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub worker_id: Option<String>,
    #[serde(default = "default_progress_report_interval_ms")]
    pub progress_report_interval_ms: u64,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_progress_report_interval_ms() -> u64 {
    1000
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Settings {
    pub fn new() -> Result<Self, config::ConfigError> {
        let config_file_path = std::env::var("FLOE_WORKER_CONFIG_PATH")
            .unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        Self::from_path(&config_file_path)
    }

    pub fn from_path(config_file_path: &str) -> Result<Self, config::ConfigError> {
        let s = config::Config::builder()
            .add_source(config::File::with_name(config_file_path).required(false))
            .add_source(config::Environment::with_prefix("FLOE_WORKER").separator("__"))
            .build()?;
        s.try_deserialize()
    }

    pub fn progress_report_interval(&self) -> Duration {
        Duration::from_millis(self.progress_report_interval_ms.max(1))
    }

    /// The configured worker id, or a fresh random one.
    pub fn resolved_worker_id(&self) -> String {
        self.worker_id.clone().unwrap_or_else(|| Uuid::new_v4().to_string())
    }
}
