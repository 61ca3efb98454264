//! Tests for the log file format
//!

use chrono::NaiveDateTime;
use common::capture_log;
use save_file::{CONSOLE_TARGET, Journal, TIMESTAMP_FORMAT};
use tracing::info;

mod common;

#[test]
fn line_has_timestamp_and_message() {
    let (log, _guard) = capture_log();

    Journal::new().info("File copied to: out/report.txt");

    let lines = log.lines();
    assert_eq!(lines.len(), 1);

    let line = lines.first().unwrap();
    let (timestamp, message) = line
        .strip_prefix('[')
        .and_then(|line| line.split_once("] "))
        .unwrap();

    assert!(NaiveDateTime::parse_from_str(timestamp, TIMESTAMP_FORMAT).is_ok());
    assert_eq!(message, "File copied to: out/report.txt");
}

#[test]
fn console_events_skip_file() {
    let (log, _guard) = capture_log();

    info!(target: CONSOLE_TARGET, "Terminating save-file (PID: 1)...");
    info!("Written to the file");

    let lines = log.lines();
    assert_eq!(lines.len(), 1);
    assert!(lines.first().unwrap().ends_with("Written to the file"));
}

#[test]
fn journal_repeats_are_suppressed() {
    let (log, _guard) = capture_log();
    let mut journal = Journal::new();

    for _ in 0..3 {
        journal.warn_once("Source file not found: missing.txt");
    }
    assert_eq!(log.count_containing("Source file not found"), 1);

    journal.error("Failed to copy the file");
    journal.warn_once("Source file not found: missing.txt");
    assert_eq!(log.count_containing("Source file not found"), 2);
}
