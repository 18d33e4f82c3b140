use crate::{CONSOLE_TARGET, Error};
use std::path::Path;
use tracing::info;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{
    EnvFilter,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

/// Log directory name
pub const LOG_DIR: &str = "logs";
/// Trigger log file name
pub const TRIGGER_LOG_FILE: &str = "automod";
/// You might add other log files here...

/// Initialize the logging system with console and file outputs
pub fn init() -> Result<(), Error> {
    // Create log directory if it doesn't exist
    if !Path::new(LOG_DIR).exists() {
        std::fs::create_dir_all(LOG_DIR)?;
    }

    // Set up file appenders with daily rotation
    let trigger_file = RollingFileAppender::new(Rotation::DAILY, LOG_DIR, TRIGGER_LOG_FILE);

    // Create a layer for console output (human-readable format)
    let console_layer = fmt::layer()
        .with_span_events(FmtSpan::CLOSE)
        .with_target(true)
        .with_ansi(true);

    // Create a layer for trigger logs (JSON format)
    let trigger_layer = fmt::layer()
        .with_span_events(FmtSpan::CLOSE)
        .with_target(true)
        .with_ansi(false)
        .json()
        .with_writer(trigger_file);

    // Set up the subscriber with all layers
    // Use env filter to allow runtime configuration of log levels
    tracing_subscriber::registry()
        .with(default_env_filter())
        .with(console_layer)
        .with(trigger_layer)
        .init();

    info!("Logging system initialized");
    Ok(())
}

/// Default to INFO level if not specified, but filter out serenity
/// heartbeat logs
fn default_env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new("info")
            // Filter out serenity logs
            .add_directive("serenity=error".parse().expect("valid directive"))
    })
}

pub fn log_console(message: String) {
    info!(
        target: CONSOLE_TARGET,
        message = %message,
        event = "console",
    );
}
