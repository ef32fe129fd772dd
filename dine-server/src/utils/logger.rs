//! Logging Infrastructure
//!
//! Structured logging setup for development and production.

use std::path::Path;

use tracing_subscriber::EnvFilter;

/// Initialize the logger at `info`, console only
pub fn init_logger() {
    init_logger_with_file(None, false, None);
}

/// Initialize the logger with optional file output
///
/// `RUST_LOG` wins over `log_level` when set. Files roll daily under
/// `log_dir` when that directory exists.
pub fn init_logger_with_file(log_level: Option<&str>, json: bool, log_dir: Option<&str>) {
    let level = log_level.unwrap_or("info");
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_file(false)
        .with_line_number(false)
        .with_thread_ids(false)
        .with_target(false);

    if let Some(dir) = log_dir {
        let log_path = Path::new(dir);
        if log_path.is_dir() {
            let file_appender = tracing_appender::rolling::daily(log_path, "dine-server");
            let result = if json {
                subscriber.json().with_writer(file_appender).try_init()
            } else {
                subscriber.with_ansi(false).with_writer(file_appender).try_init()
            };
            if result.is_err() {
                eprintln!("Logger already initialized");
            }
            return;
        }
        eprintln!("Log directory {dir} does not exist, logging to stdout");
    }

    let result = if json {
        subscriber.json().try_init()
    } else {
        subscriber.try_init()
    };
    if result.is_err() {
        eprintln!("Logger already initialized");
    }
}
