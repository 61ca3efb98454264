//! The poll loop that keeps the destination copy up to date.
//!

use std::{
    ffi::OsStr,
    fs, io,
    path::{Path, PathBuf},
    thread::sleep,
};

use thiserror::Error;
use tracing::warn;

use crate::{Config, InstanceGuard, Journal, Settings, logger::CONSOLE_TARGET};

/// What to do after an iteration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Iteration {
    /// The config was invalid and has been replaced, start the next iteration now.
    Restart,

    /// Sleep for the poll interval before the next iteration.
    Wait,
}

/// Copies the configured source file into the configured directory on every poll.
#[derive(Debug)]
pub struct CopyLoop {
    settings: Settings,
    guard: InstanceGuard,
    journal: Journal,
}

impl CopyLoop {
    /// Create a new copy loop.
    pub fn new(settings: Settings, guard: InstanceGuard) -> Self {
        Self {
            settings,
            guard,
            journal: Journal::new(),
        }
    }

    /// The loop's journal.
    pub fn journal(&self) -> &Journal {
        &self.journal
    }

    /// Run iterations forever.
    pub fn run(&mut self) -> ! {
        loop {
            if self.tick() == Iteration::Wait {
                sleep(self.settings.poll_interval);
            }
        }
    }

    /// Run a single iteration.
    pub fn tick(&mut self) -> Iteration {
        if let Err(error) = self.guard.terminate_others() {
            warn!(
                target: CONSOLE_TARGET,
                "Failed to terminate other instances of {}: {error}",
                self.guard.process_name()
            );
        }

        // Re-read every iteration so edits apply on the next poll.
        let config = match Config::load_xml(&self.settings.config_file, &mut self.journal) {
            Ok(config) => config,
            Err(error) => {
                self.journal.error(format!("Could not load config: {error}"));
                self.journal.warn("Invalid configuration, creating a new configuration file.");
                self.create_default_config();
                return Iteration::Restart;
            }
        };

        self.copy_source(&config);

        Iteration::Wait
    }

    fn create_default_config(&mut self) {
        let config_file = &self.settings.config_file;

        match Config::create_default(config_file) {
            Ok(()) => self.journal.info(format!(
                "Created a new configuration file: {}",
                config_file.display()
            )),
            Err(error) => self
                .journal
                .error(format!("Could not create a configuration file: {error}")),
        }
    }

    fn copy_source(&mut self, config: &Config) {
        let source = config.source_path();

        let file_name = match source.file_name() {
            Some(file_name) if source.is_file() => file_name,
            _ => {
                self.journal.warn_once(format!("Source file not found: {}", source.display()));
                return;
            }
        };

        if let Err(error) = self.copy(source, config.destination_path(), file_name) {
            self.journal.error(format!("Failed to copy the file: {error}"));
        }
    }

    fn copy(
        &mut self,
        source: &Path,
        directory: &Path,
        file_name: &OsStr,
    ) -> Result<(), CopyError> {
        if !directory.is_dir() {
            fs::create_dir_all(directory).map_err(|error| CopyError::CreateDirectory {
                path: directory.to_path_buf(),
                source: error,
            })?;
        }

        let destination = directory.join(file_name);

        // Copying a file onto itself truncates it.
        if resolve_destination(&destination, directory, file_name)? == resolve_path(source)? {
            return Err(CopyError::SameFile { path: destination });
        }

        // Reported before the copy, only when the destination is new.
        if !destination.exists() {
            self.journal.info(format!("File copied to: {}", destination.display()));
        }

        fs::copy(source, &destination).map_err(|error| CopyError::Copy {
            path: destination.to_path_buf(),
            source: error,
        })?;

        Ok(())
    }
}

/// The absolute path of an existing file or directory, with links resolved.
fn resolve_path(path: &Path) -> Result<PathBuf, CopyError> {
    path.canonicalize().map_err(|error| CopyError::Resolve {
        path: path.to_path_buf(),
        source: error,
    })
}

/// The absolute path a copy would be written to.
fn resolve_destination(
    destination: &Path,
    directory: &Path,
    file_name: &OsStr,
) -> Result<PathBuf, CopyError> {
    match destination.canonicalize() {
        Ok(path) => Ok(path),
        Err(_) => Ok(resolve_path(directory)?.join(file_name)),
    }
}

#[allow(missing_docs)]
#[derive(Debug, Error)]
pub enum CopyError {
    #[error("Failed to create directory {path:?}: {source}")]
    CreateDirectory {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to resolve {path:?}: {source}")]
    Resolve {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("{path:?} is the source file itself")]
    SameFile { path: PathBuf },

    #[error("Failed to copy to {path:?}: {source}")]
    Copy {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}
