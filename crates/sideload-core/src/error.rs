//! Tagged error taxonomy for every stage of a run.
//!
//! Each variant maps to one failure mode of the pipeline, so the
//! orchestrator can decide what is fatal (most things) and what is
//! recovered (a single package failing to install, which only ever
//! surfaces through the install log).

use std::path::PathBuf;

/// Errors produced by the provisioning / wait / install pipeline.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The adb executable could not be resolved, even after provisioning.
    #[error("adb executable not found on PATH or in the local install directory")]
    ToolMissing,

    /// The platform-tools archive could not be downloaded.
    #[error("failed to download {url}: {reason}")]
    DownloadFailed { url: String, reason: String },

    /// The downloaded archive could not be unpacked.
    #[error("failed to extract platform-tools archive: {0}")]
    ExtractFailed(String),

    /// No device reached the `device` state within the polling budget.
    #[error("no device connected after {attempts} poll attempts")]
    DeviceNotFound { attempts: usize },

    /// An adb invocation exited non-zero.
    #[error("adb {command} failed: {reason}")]
    Adb { command: String, reason: String },

    /// A single package failed to install. Recovered by the batch
    /// installer; only reaches callers of the one-shot install API.
    #[error("failed to install {apk}: {reason}")]
    InstallFailed { apk: String, reason: String },

    /// The install log could not be created or appended to.
    #[error("cannot write install log {path}: {source}")]
    LogWrite {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Any other filesystem failure (cleanup, log relocation, ...).
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
