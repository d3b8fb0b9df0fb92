//! Implementations of the CLI subcommands.

use std::path::PathBuf;
use std::time::Duration;

use serde::Serialize;

use sideload_core::install::{InstallLog, install_all};
use sideload_core::run;
use sideload_core::{Config, Result};

use crate::outln;

/// Flags of the `run` subcommand, overlaid on the loaded config.
pub struct RunArgs {
    pub base_dir: Option<PathBuf>,
    pub apks_dir: Option<String>,
    pub no_auth_delay: bool,
    pub timeout_secs: Option<u64>,
}

fn load_config(args: &RunArgs) -> Config {
    let mut config = Config::load();
    if let Some(base) = &args.base_dir {
        config.base_dir = base.clone();
    }
    if let Some(apks) = &args.apks_dir {
        config.apks_dir = apks.clone();
    }
    if args.no_auth_delay {
        config.auth_delay = Duration::ZERO;
    }
    if let Some(secs) = args.timeout_secs {
        // Attempt budget derived from the overall timeout
        let interval = config.poll_interval.as_secs().max(1);
        config.max_poll_attempts = usize::try_from(secs.div_ceil(interval)).unwrap_or(1).max(1);
    }
    config
}

/// The full pipeline: provision if needed, wait, batch-install, clean
/// up, relocate the log.
pub fn run(args: &RunArgs) -> Result<()> {
    let config = load_config(args);
    let outcome = run::run(&config)?;

    if outcome.provisioned {
        outln!("platform-tools were downloaded for this run.");
    }
    outln!(
        "Installed {} of {} package(s), {} failed.",
        outcome.report.succeeded,
        outcome.report.attempted,
        outcome.report.failed
    );
    outln!("Install log: {}", outcome.log_path.display());
    Ok(())
}

#[derive(Serialize)]
struct DeviceEntry<'a> {
    serial: &'a str,
    state: &'a str,
}

/// List attached devices, human-readable or as JSON.
pub fn devices(json: bool) -> Result<()> {
    let config = Config::load();
    let (adb, _) = run::resolve_adb(&config)?;
    let devices = adb.devices()?;

    if json {
        let entries: Vec<DeviceEntry<'_>> = devices
            .iter()
            .map(|(serial, state)| DeviceEntry { serial, state })
            .collect();
        match serde_json::to_string_pretty(&entries) {
            Ok(rendered) => outln!("{rendered}"),
            Err(e) => log::error!("Cannot serialize device list: {e}"),
        }
    } else if devices.is_empty() {
        outln!("No devices attached.");
    } else {
        for (serial, state) in &devices {
            outln!("{serial}\t{state}");
        }
    }
    Ok(())
}

/// Show where adb resolved to and what `adb version` reports.
pub fn adb_info() -> Result<()> {
    let config = Config::load();
    let (adb, provisioned) = run::resolve_adb(&config)?;
    outln!("adb: {}", adb.exe().display());
    if provisioned {
        outln!("(downloaded this run)");
    }
    outln!("{}", adb.version()?);
    Ok(())
}

/// Force a provisioning pass even when adb is already reachable.
pub fn provision() -> Result<()> {
    let config = Config::load();
    let exe = sideload_core::provision::provision(&config)?;
    outln!("platform-tools extracted; adb at {}", exe.display());
    Ok(())
}

/// Install explicitly named APK files, logging like a batch run.
pub fn install(files: &[PathBuf]) -> Result<()> {
    let config = Config::load();
    let (adb, _) = run::resolve_adb(&config)?;

    let log = InstallLog::new(config.log_file());
    log.ensure()?;

    let report = install_all(files, |apk| run::Bridge::install(&adb, apk), &log)?;
    outln!(
        "Installed {} of {} package(s), {} failed.",
        report.succeeded,
        report.attempted,
        report.failed
    );
    Ok(())
}
