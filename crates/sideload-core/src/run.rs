//! End-to-end orchestration: resolve adb (provisioning if needed),
//! wait for a device, run the batch, clean up, relocate the log.

use std::fs;
use std::path::{Path, PathBuf};

use log::{info, warn};

use crate::adb::Adb;
use crate::config::Config;
use crate::device::wait_for_device;
use crate::error::{Error, Result};
use crate::install::{BatchReport, InstallLog, collect_apks, install_all};
use crate::provision;

/// What a completed run did.
#[derive(Debug)]
pub struct RunOutcome {
    pub report: BatchReport,
    /// Final (relocated) location of the install log.
    pub log_path: PathBuf,
    /// Whether platform-tools had to be downloaded this run.
    pub provisioned: bool,
}

/// Device bridge surface the orchestrator needs. Lets tests drive the
/// flow without spawning adb.
pub trait Bridge {
    fn devices(&self) -> Result<Vec<(String, String)>>;
    /// One install attempt; `Err` carries adb's raw error text.
    fn install(&self, apk: &Path) -> std::result::Result<(), String>;
    fn kill_server(&self) -> Result<()>;
}

impl Bridge for Adb {
    fn devices(&self) -> Result<Vec<(String, String)>> {
        Self::devices(self)
    }

    fn install(&self, apk: &Path) -> std::result::Result<(), String> {
        match Self::install(self, apk) {
            Ok(_) => Ok(()),
            Err(Error::InstallFailed { reason, .. }) => Err(reason),
            Err(other) => Err(other.to_string()),
        }
    }

    fn kill_server(&self) -> Result<()> {
        Self::kill_server(self).map(drop)
    }
}

/// Resolve the adb executable, provisioning at most once.
pub fn resolve_adb(config: &Config) -> Result<(Adb, bool)> {
    let (exe, provisioned) = resolve_with(provision::locate(&config.install_dir()), || {
        info!("adb is not installed. Installing platform-tools...");
        provision::provision(config)
    })?;
    let adb = Adb::new(exe);
    if provisioned {
        // Availability re-check on the freshly extracted binary
        let version = adb.version()?;
        info!("adb version check:\n{version}");
    }
    Ok((adb, provisioned))
}

/// `located` short-circuits provisioning; otherwise `fetch` runs
/// exactly once and its result is the resolved path.
fn resolve_with(
    located: Option<PathBuf>,
    fetch: impl FnOnce() -> Result<PathBuf>,
) -> Result<(PathBuf, bool)> {
    match located {
        Some(exe) => Ok((exe, false)),
        None => fetch().map(|exe| (exe, true)),
    }
}

/// Wait for a device, then install every APK under the configured
/// folder, logging one line per attempt.
pub fn install_batch(config: &Config, bridge: &impl Bridge, log: &InstallLog) -> Result<BatchReport> {
    wait_for_device(
        || bridge.devices(),
        config.poll_interval,
        config.max_poll_attempts,
    )?;
    info!("Android device is connected. Installing APKs...");

    let apks = collect_apks(&config.apks_path())?;
    if apks.is_empty() {
        info!("No .apk files in {}", config.apks_path().display());
    } else if !config.auth_delay.is_zero() {
        info!(
            "Waiting {} seconds for USB debugging authorization...",
            config.auth_delay.as_secs()
        );
        std::thread::sleep(config.auth_delay);
    }

    let report = install_all(&apks, |apk| bridge.install(apk), log)?;

    if let Err(e) = bridge.kill_server() {
        warn!("adb kill-server failed: {e}");
    }
    Ok(report)
}

/// Remove the scratch directory and everything in it, including the
/// downloaded archive. Absence is not an error.
pub fn cleanup(config: &Config) -> Result<()> {
    match fs::remove_dir_all(&config.scratch_dir) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}

/// The whole pipeline. Individual install failures are recorded in the
/// log and do not fail the run; everything else is fatal.
pub fn run(config: &Config) -> Result<RunOutcome> {
    let log = InstallLog::new(config.log_file());
    log.ensure()?;

    let (adb, provisioned) = resolve_adb(config)?;
    info!("Using adb at {}", adb.exe().display());

    let report = install_batch(config, &adb, &log)?;

    cleanup(config)?;
    let log_path = log.relocate(&config.logs_dir())?;
    info!(
        "Installed {} of {} package(s); log at {}",
        report.succeeded,
        report.attempted,
        log_path.display()
    );
    Ok(RunOutcome {
        report,
        log_path,
        provisioned,
    })
}
