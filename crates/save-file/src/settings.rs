//! Program settings
//!

use core::time::Duration;
use std::path::PathBuf;

/// The file the copy configuration is read from.
pub const CONFIG_FILE: &str = "config.xml";

/// The file log lines are appended to.
pub const LOG_FILE: &str = "log.txt";

/// The time between two polls of the source file.
pub const POLL_INTERVAL: Duration = Duration::from_secs(5);

/// Where the program keeps its files and how often it polls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// The path to the XML configuration.
    pub config_file: PathBuf,

    /// The path to the append-only log.
    pub log_file: PathBuf,

    /// The time to sleep between iterations.
    pub poll_interval: Duration,
}

impl Settings {
    /// Settings that keep the program's files in a given directory.
    pub fn in_directory(directory: impl Into<PathBuf>) -> Self {
        let directory = directory.into();

        Self {
            config_file: directory.join(CONFIG_FILE),
            log_file: directory.join(LOG_FILE),
            poll_interval: POLL_INTERVAL,
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            config_file: PathBuf::from(CONFIG_FILE),
            log_file: PathBuf::from(LOG_FILE),
            poll_interval: POLL_INTERVAL,
        }
    }
}
