use std::fs;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::filter::Directive;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::config::LoggingConfig;
use crate::error::Result;

pub const LOG_FILE_NAME: &str = "cleaner.log";

const CRATE_TARGET: &str = "rental_cleaner";
const FALLBACK_LEVEL: &str = "info";

/// `RUST_LOG` directives plus `rental_cleaner=<level>`. An unparseable level
/// falls back to `info`.
pub fn env_filter(level: &str) -> EnvFilter {
    let filter = EnvFilter::from_default_env();
    let directive = format!("{}={}", CRATE_TARGET, level)
        .parse::<Directive>()
        .or_else(|_| format!("{}={}", CRATE_TARGET, FALLBACK_LEVEL).parse::<Directive>());
    match directive {
        Ok(directive) => filter.add_directive(directive),
        Err(_) => filter,
    }
}

/// Install the global subscriber: JSON lines to a daily file under the
/// configured directory, plain text on stdout.
///
/// The returned guard flushes the file writer on drop; hold it until exit.
pub fn init_logging(config: &LoggingConfig) -> Result<WorkerGuard> {
    fs::create_dir_all(&config.directory)?;

    let file_appender = tracing_appender::rolling::daily(&config.directory, LOG_FILE_NAME);
    let (file_writer, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(env_filter(&config.level))
        .with(fmt::layer().json().with_writer(file_writer))
        .with(fmt::layer().with_target(false).with_writer(std::io::stdout))
        .init();

    Ok(guard)
}
