//! # save-file
//! Keeps a copy of a single file in a configured directory.
//!

mod config;
mod copier;
mod instance_guard;
mod logger;
mod settings;

pub use config::{Config, LoadConfigError, SaveConfigError};
pub use copier::{CopyError, CopyLoop, Iteration};
pub use instance_guard::{GuardError, InstanceGuard};
pub use logger::{
    CONSOLE_TARGET, Journal, LoggerError, TIMESTAMP_FORMAT, console_layer, file_layer,
    init_console_logger, init_logger,
};
pub use settings::{CONFIG_FILE, LOG_FILE, POLL_INTERVAL, Settings};
