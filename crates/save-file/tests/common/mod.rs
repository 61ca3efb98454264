//! # common
//!

#![allow(dead_code)]

use std::{
    io,
    path::Path,
    sync::{Arc, Mutex},
};

use save_file::{Config, CopyLoop, InstanceGuard, Settings, file_layer};
use tracing::subscriber::{DefaultGuard, set_default};
use tracing_subscriber::{layer::SubscriberExt, registry::Registry};

/// A process name that nothing else runs under.
pub const UNUSED_PROCESS_NAME: &str = "save-file-test-no-such-process";

/// Log file lines captured in memory.
#[derive(Clone, Default)]
pub struct CapturedLog(Arc<Mutex<Vec<u8>>>);

impl CapturedLog {
    pub fn lines(&self) -> Vec<String> {
        let bytes = self.0.lock().unwrap();
        String::from_utf8_lossy(&bytes)
            .lines()
            .map(str::to_string)
            .collect()
    }

    pub fn position_containing(&self, needle: &str) -> Option<usize> {
        self.lines().iter().position(|line| line.contains(needle))
    }

    pub fn count_containing(&self, needle: &str) -> usize {
        self.lines()
            .iter()
            .filter(|line| line.contains(needle))
            .count()
    }
}

impl io::Write for CapturedLog {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Capture the log file lines written on this thread until the guard is dropped.
pub fn capture_log() -> (CapturedLog, DefaultGuard) {
    let log = CapturedLog::default();
    let writer = log.clone();

    let subscriber = Registry::default().with(file_layer(move || writer.clone()));
    let guard = set_default(subscriber);

    (log, guard)
}

/// A copy loop that keeps its files in `directory` and never terminates anything.
pub fn test_loop(directory: &Path) -> CopyLoop {
    CopyLoop::new(
        Settings::in_directory(directory),
        InstanceGuard::new(UNUSED_PROCESS_NAME),
    )
}

/// Write a config that copies `source` into `destination_directory`.
pub fn write_config(config_file: &Path, source: &Path, destination_directory: &Path) {
    let config = Config {
        source_file: source.to_string_lossy().into_owned(),
        destination_directory: destination_directory.to_string_lossy().into_owned(),
    };
    config.save_xml(config_file).unwrap();
}
