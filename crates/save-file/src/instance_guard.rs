//! Keeps a single instance of the program running.
//!

use core::time::Duration;
use std::{
    env,
    ffi::{OsStr, OsString},
    io,
    path::Path,
    thread::sleep,
};

use sysinfo::{Pid, Process, ProcessRefreshKind, ProcessStatus, ProcessesToUpdate, System};
use thiserror::Error;
use tracing::{info, warn};

use crate::logger::CONSOLE_TARGET;

/// Linux keeps at most this many bytes of a process name.
const TRUNCATED_NAME_LENGTH: usize = 15;

const EXIT_POLL_INTERVAL: Duration = Duration::from_millis(20);

/// Terminates other processes that share this program's name.
#[derive(Debug, Clone)]
pub struct InstanceGuard {
    process_name: String,
}

impl InstanceGuard {
    /// Guard processes with the given name, without extension.
    pub fn new(process_name: impl Into<String>) -> Self {
        Self {
            process_name: process_name.into(),
        }
    }

    /// Guard processes named after the current executable.
    pub fn for_current_exe() -> Result<Self, GuardError> {
        let executable = env::current_exe().map_err(GuardError::CurrentExe)?;
        let process_name = executable
            .file_stem()
            .ok_or(GuardError::NoFileStem)?
            .to_string_lossy()
            .into_owned();

        Ok(Self { process_name })
    }

    /// The name of the guarded processes.
    pub fn process_name(&self) -> &str {
        &self.process_name
    }

    /// The running processes with the guarded name, including this one.
    pub fn instances(&self) -> Vec<Pid> {
        let mut system = System::new();
        self.find_instances(&mut system)
    }

    /// Kill every other process with the guarded name, waiting for each to exit.
    ///
    /// Returns how many processes were terminated.
    pub fn terminate_others(&self) -> Result<usize, GuardError> {
        let current_pid = sysinfo::get_current_pid().map_err(GuardError::CurrentPid)?;

        let mut system = System::new();
        let others: Vec<Pid> = self
            .find_instances(&mut system)
            .into_iter()
            .filter(|pid| *pid != current_pid)
            .collect();

        let mut terminated = 0;
        for pid in others {
            let Some(process) = system.process(pid) else {
                continue;
            };

            info!(
                target: CONSOLE_TARGET,
                "Terminating {} (PID: {pid})...", self.process_name
            );

            if !process.kill() {
                warn!(
                    target: CONSOLE_TARGET,
                    "Could not terminate {} (PID: {pid})", self.process_name
                );
                continue;
            }

            wait_for_exit(&mut system, pid);
            terminated += 1;

            info!(
                target: CONSOLE_TARGET,
                "Terminated {} (PID: {pid})", self.process_name
            );
        }

        Ok(terminated)
    }

    fn find_instances(&self, system: &mut System) -> Vec<Pid> {
        system.refresh_processes_specifics(
            ProcessesToUpdate::All,
            true,
            ProcessRefreshKind::everything(),
        );

        system
            .processes()
            .iter()
            // Threads are listed alongside processes on some platforms.
            .filter(|(_, process)| process.thread_kind().is_none())
            .filter(|(_, process)| !has_exited(process))
            .filter(|(_, process)| {
                self.matches(
                    process.name(),
                    process.exe(),
                    process.cmd().first().map(OsString::as_os_str),
                )
            })
            .map(|(pid, _)| *pid)
            .collect()
    }

    /// If a process refers to the guarded program.
    ///
    /// Names cut to the kernel's limit are checked against the executable and
    /// the first argument instead.
    fn matches(&self, name: &OsStr, exe: Option<&Path>, first_argument: Option<&OsStr>) -> bool {
        if self.is_stem_of(Path::new(name)) {
            return true;
        }

        if name.len() < TRUNCATED_NAME_LENGTH {
            return false;
        }

        exe.is_some_and(|exe| self.is_stem_of(exe))
            || first_argument.is_some_and(|argument| self.is_stem_of(Path::new(argument)))
    }

    fn is_stem_of(&self, path: &Path) -> bool {
        path.file_stem()
            .is_some_and(|stem| stem == OsStr::new(&self.process_name))
    }
}

/// Block until a killed process is gone or only waiting to be reaped by its parent.
fn wait_for_exit(system: &mut System, pid: Pid) {
    loop {
        system.refresh_processes(ProcessesToUpdate::Some(&[pid]), true);

        match system.process(pid) {
            Some(process) if !has_exited(process) => sleep(EXIT_POLL_INTERVAL),
            _ => return,
        }
    }
}

fn has_exited(process: &Process) -> bool {
    matches!(process.status(), ProcessStatus::Zombie | ProcessStatus::Dead)
}

#[allow(missing_docs)]
#[derive(Debug, Error)]
pub enum GuardError {
    #[error("Failed to get the current process ID: {0}")]
    CurrentPid(&'static str),

    #[error("Failed to get the current executable: {0}")]
    CurrentExe(#[source] io::Error),

    #[error("The current executable has no file name")]
    NoFileStem,
}

#[cfg(test)]
mod tests {
    use std::{ffi::OsStr, path::Path};

    use super::InstanceGuard;

    #[test]
    fn matches_ignores_extension() {
        let guard = InstanceGuard::new("save-file");

        assert!(guard.matches(OsStr::new("save-file"), None, None));
        assert!(guard.matches(OsStr::new("save-file.exe"), None, None));
        assert!(!guard.matches(OsStr::new("save-files"), None, None));
        assert!(!guard.matches(OsStr::new("other"), None, None));
    }

    #[test]
    fn matches_truncated_name() {
        let guard = InstanceGuard::new("save-file-nightly");
        let truncated = OsStr::new("save-file-night");

        assert!(guard.matches(
            truncated,
            Some(Path::new("/opt/save-file-nightly")),
            None
        ));
        assert!(guard.matches(
            truncated,
            None,
            Some(OsStr::new("./save-file-nightly"))
        ));
        assert!(!guard.matches(truncated, None, None));
        assert!(!guard.matches(
            truncated,
            Some(Path::new("/opt/save-file-nightly-2")),
            Some(OsStr::new("save-file-nightly-2"))
        ));
    }

    #[test]
    fn short_name_ignores_executable() {
        let guard = InstanceGuard::new("save-file");

        assert!(!guard.matches(
            OsStr::new("sleep"),
            Some(Path::new("/opt/save-file")),
            None
        ));
    }
}
