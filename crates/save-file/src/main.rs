//! # save-file
//! Copies the configured file into the configured directory every few seconds.
//!

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

use mimalloc::MiMalloc;
use save_file::{CopyLoop, InstanceGuard, Settings, init_console_logger, init_logger};
use tracing::{error, info, warn};

fn main() {
    let settings = Settings::default();

    let _logger = match init_logger(&settings.log_file) {
        Ok(guards) => guards,
        Err(log_error) => {
            let guard = init_console_logger().ok();
            error!("Could not open the log file, logging to the console only: {log_error}");
            guard.into_iter().collect()
        }
    };

    let guard = match InstanceGuard::for_current_exe() {
        Ok(guard) => guard,
        Err(error) => {
            warn!("Could not get the program name, using the binary name: {error}");
            InstanceGuard::new(env!("CARGO_BIN_NAME"))
        }
    };

    info!(
        "Watching {:?}, only one {} will run at a time",
        settings.config_file,
        guard.process_name()
    );

    CopyLoop::new(settings, guard).run()
}
