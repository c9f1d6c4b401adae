//! Tracing setup for the worker binary.

use crate::config::Settings;
use tracing::debug;
use tracing_subscriber::EnvFilter;

/// Installs the global subscriber. `RUST_LOG` wins over the configured level;
/// each `-v` raises the configured level by one step.
pub fn init_logging(settings: &Settings, verbose: u8) {
    let level = effective_level(&settings.log_level, verbose);
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(verbose >= 2)
        .with_thread_ids(verbose >= 3)
        .with_line_number(verbose >= 3)
        .init();

    debug!("floe-worker started with log level {level}");
}

fn effective_level(base: &str, verbose: u8) -> String {
    const LEVELS: [&str; 5] = ["error", "warn", "info", "debug", "trace"];
    match LEVELS.iter().position(|l| l.eq_ignore_ascii_case(base)) {
        Some(i) => LEVELS[(i + verbose as usize).min(LEVELS.len() - 1)].to_string(),
        // Not a bare level, e.g. a directive list; leave it to EnvFilter.
        None => base.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verbosity_raises_level() {
        assert_eq!(effective_level("info", 0), "info");
        assert_eq!(effective_level("info", 1), "debug");
        assert_eq!(effective_level("WARN", 1), "info");
        assert_eq!(effective_level("info", 9), "trace");
    }

    #[test]
    fn test_directives_pass_through() {
        assert_eq!(effective_level("floe_worker=debug", 2), "floe_worker=debug");
    }
}
