//! Logging to the console and to the append-only log file.
//!

use core::fmt;
use std::{fs::create_dir_all, io, path::Path};

use chrono::Local;
use thiserror::Error;
use tracing::{
    Event, Level, Subscriber, error, info,
    subscriber::{SetGlobalDefaultError, set_global_default},
    warn,
};
use tracing_appender::{
    non_blocking::WorkerGuard,
    rolling::{InitError, RollingFileAppender, Rotation},
};
use tracing_subscriber::{
    Layer,
    filter::{LevelFilter, Targets},
    fmt::{FmtContext, FormatEvent, FormatFields, MakeWriter, format::Writer},
    layer::SubscriberExt,
    registry::{LookupSpan, Registry},
};

/// Events with this target are written to the console but never to the log file.
pub const CONSOLE_TARGET: &str = "console";

/// The timestamp at the start of every log file line.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Create and set the global loggers.
///
/// Lines are appended to `log_file`, which is never truncated or rotated.
pub fn init_logger(log_file: &Path) -> Result<Vec<WorkerGuard>, LoggerError> {
    let directory = match log_file.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let file_name = log_file.file_name().ok_or(LoggerError::NoFileName)?;

    create_dir_all(directory).map_err(LoggerError::CreateDirectory)?;

    // File layer, written synchronously so no line is lost when the process is killed.
    let file_layer = {
        let appender = RollingFileAppender::builder()
            .rotation(Rotation::NEVER)
            .filename_prefix(file_name.to_string_lossy())
            .build(directory)?;

        file_layer(appender)
    };

    // Std layer
    let (std_guard, std_layer) = {
        let (writer, guard) = tracing_appender::non_blocking(io::stdout());

        (guard, console_layer(writer))
    };

    // Create registry
    let registry = Registry::default().with(file_layer).with(std_layer);

    // Set global subscriber
    set_global_default(registry)?;

    Ok(vec![std_guard])
}

/// Set a global logger that only writes to the console.
pub fn init_console_logger() -> Result<WorkerGuard, LoggerError> {
    let (writer, guard) = tracing_appender::non_blocking(io::stdout());

    let registry = Registry::default().with(console_layer(writer));
    set_global_default(registry)?;

    Ok(guard)
}

/// The log file layer, writes `[<timestamp>] <message>` lines.
pub fn file_layer<S, W>(writer: W) -> impl Layer<S>
where
    S: Subscriber + for<'span> LookupSpan<'span> + 'static,
    W: for<'writer> MakeWriter<'writer> + 'static,
{
    let filter = Targets::new()
        .with_target(CONSOLE_TARGET, LevelFilter::OFF)
        .with_default(Level::INFO);

    tracing_subscriber::fmt::layer()
        .with_writer(writer)
        .with_ansi(false)
        .event_format(LogLine)
        .with_filter(filter)
}

/// The console layer.
pub fn console_layer<S, W>(writer: W) -> impl Layer<S>
where
    S: Subscriber + for<'span> LookupSpan<'span> + 'static,
    W: for<'writer> MakeWriter<'writer> + 'static,
{
    let filter = Targets::new().with_default(Level::INFO);

    tracing_subscriber::fmt::layer()
        .with_writer(writer)
        .with_ansi(true)
        .with_target(false)
        .with_filter(filter)
}

/// Formats an event as a single log file line.
struct LogLine;

impl<S, N> FormatEvent<S, N> for LogLine
where
    S: Subscriber + for<'span> LookupSpan<'span>,
    N: for<'writer> FormatFields<'writer> + 'static,
{
    fn format_event(
        &self,
        context: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> fmt::Result {
        write!(writer, "[{}] ", Local::now().format(TIMESTAMP_FORMAT))?;
        context.field_format().format_fields(writer.by_ref(), event)?;
        writeln!(writer)
    }
}

/// Emits log events and remembers the last message, so a condition that
/// persists across polls can be reported once.
#[derive(Debug, Default)]
pub struct Journal {
    last_message: Option<String>,
}

impl Journal {
    /// Create an empty journal.
    pub fn new() -> Self {
        Self::default()
    }

    /// The most recently logged message.
    pub fn last_message(&self) -> Option<&str> {
        self.last_message.as_deref()
    }

    /// Log an info message.
    pub fn info(&mut self, message: impl Into<String>) {
        let message = message.into();
        info!("{message}");
        self.last_message = Some(message);
    }

    /// Log a warning.
    pub fn warn(&mut self, message: impl Into<String>) {
        let message = message.into();
        warn!("{message}");
        self.last_message = Some(message);
    }

    /// Log an error.
    pub fn error(&mut self, message: impl Into<String>) {
        let message = message.into();
        error!("{message}");
        self.last_message = Some(message);
    }

    /// Log a warning unless it is the same as the last message.
    ///
    /// Returns if the warning was logged.
    pub fn warn_once(&mut self, message: impl Into<String>) -> bool {
        let message = message.into();
        if self.last_message() == Some(message.as_str()) {
            return false;
        }

        self.warn(message);
        true
    }
}

#[allow(missing_docs)]
#[derive(Debug, Error)]
pub enum LoggerError {
    #[error("Failed to create log file appender:\n{0}")]
    CreateFileAppender(#[from] InitError),

    #[error("Failed to create log directory:\n{0}")]
    CreateDirectory(#[source] io::Error),

    #[error("The log file path has no file name")]
    NoFileName,

    #[error("Failed to set the global logger:\n{0}")]
    SetGlobal(#[from] SetGlobalDefaultError),
}

#[cfg(test)]
mod tests {
    use super::Journal;

    #[test]
    fn journal_remembers_last_message() {
        let mut journal = Journal::new();
        assert_eq!(journal.last_message(), None);

        journal.info("first");
        journal.error("second");
        assert_eq!(journal.last_message(), Some("second"));
    }

    #[test]
    fn warn_once_skips_repeats() {
        let mut journal = Journal::new();

        assert!(journal.warn_once("missing"));
        assert!(!journal.warn_once("missing"));
        assert!(!journal.warn_once("missing"));

        journal.info("something else");
        assert!(journal.warn_once("missing"));
    }
}
