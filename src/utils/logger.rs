//! Tracing setup for the tracker daemon.
//!
//! Workers log one line per scan with the truncated order uuid as a field,
//! so a handful of tracked orders produces a steady stream. Stdout carries
//! the live view; when the work directory has a `logs/` folder, a
//! daily-rolled file keeps the history across daemon restarts.

use std::path::Path;

use crate::core::Config;

/// Install the subscriber on stdout only, with the configured level.
pub fn init_logger(config: &Config) {
    tracing_subscriber::fmt()
        .with_max_level(parse_level(&config.log_level))
        .with_target(false)
        .compact()
        .init();
}

/// Install the subscriber writing to a daily-rolled file under `log_dir`,
/// falling back to stdout when the directory does not exist.
pub fn init_logger_with_file(config: &Config, log_dir: &Path) {
    let level = parse_level(&config.log_level);

    if log_dir.exists() {
        let appender = tracing_appender::rolling::daily(log_dir, "tracker.log");
        tracing_subscriber::fmt()
            .with_max_level(level)
            .with_target(false)
            .with_ansi(false)
            .compact()
            .with_writer(appender)
            .init();
        return;
    }

    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .compact()
        .init();
}

/// `LOG_LEVEL` values outside the tracing set fall back to `info`.
fn parse_level(level: &str) -> tracing::Level {
    level.parse().unwrap_or(tracing::Level::INFO)
}
