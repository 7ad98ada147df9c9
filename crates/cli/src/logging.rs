use crate::config::LoggingConfig;
use std::io;
use tracing_subscriber::{fmt, prelude::*, EnvFilter, Layer};

/// Install the global subscriber. `RUST_LOG` wins over the configured level.
///
/// Logs go to stderr so stdout stays clean for JSON results.
pub fn init_logging(config: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    // Use Layer::boxed() to unify the types of the branches
    let fmt_layer = if config.json {
        fmt::layer()
            .json()
            .with_writer(io::stderr)
            .with_file(config.show_file)
            .with_line_number(config.show_line)
            .boxed()
    } else if !config.show_time {
        fmt::layer()
            .with_writer(io::stderr)
            .with_target(config.show_file)
            .with_file(config.show_file)
            .with_line_number(config.show_line)
            .with_thread_ids(false)
            .without_time()
            .boxed()
    } else {
        fmt::layer()
            .with_writer(io::stderr)
            .with_target(config.show_file)
            .with_file(config.show_file)
            .with_line_number(config.show_line)
            .with_thread_ids(false)
            .boxed()
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .init();
}
