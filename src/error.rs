//! Error types for asset preparation and emulator launches

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::platform::OsType;

/// Failure while unpacking the emulator, the TOS image or a payload
#[derive(Error, Debug)]
pub enum AssetError {
    #[error("Platform '{0}' is not yet supported")]
    UnsupportedPlatform(OsType),

    #[error("Bundled resource not found: {0}")]
    MissingResource(String),

    #[error("I/O error on {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to read archive: {0}")]
    Archive(#[from] zip::result::ZipError),

    #[error("Archive entry is outside of the target dir: {0}")]
    UnsafeEntry(String),

    #[error("Invalid language or country code '{0}': must be 2 characters")]
    InvalidLocaleCode(String),
}

impl AssetError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Failure of a launch, stop or automation request
#[derive(Error, Debug)]
pub enum LaunchError {
    #[error("Failed to prepare the emulator: {0}")]
    Asset(#[from] AssetError),

    #[error("Failed to stage payload {path:?}: {source}")]
    Payload {
        path: PathBuf,
        #[source]
        source: AssetError,
    },

    #[error("Failed to start the emulator: {0}")]
    Spawn(#[source] std::io::Error),

    #[error("Failed to obtain handle of emulator window within {timeout:?}")]
    WindowNotFound { timeout: Duration },

    #[error("Emulator exited during startup ({status})")]
    ExitedEarly { status: std::process::ExitStatus },

    #[error("Window system error: {0:#}")]
    WindowSystem(anyhow::Error),

    #[error("No verified emulator window for instance '{0}'")]
    NoWindow(String),

    #[error("Process registry lock poisoned")]
    LockPoisoned,
}

pub type LaunchResult<T> = std::result::Result<T, LaunchError>;
