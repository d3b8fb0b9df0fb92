//! Thin wrapper around the system `adb` binary.
//!
//! Methods here keep a 1-to-1 mapping with adb sub-commands: no magic,
//! no custom commands, no chaining of existing commands. If a run needs
//! an adb feature this API doesn't expose, extend the API rather than
//! falling back to raw `Command` calls at the call site.
//!
//! The wrapper is built from an explicitly resolved executable path
//! (see [`crate::provision::locate`]) instead of trusting ambient
//! `PATH` state, so provisioning never has to mutate the process
//! environment.
//!
//! For comprehensive info about ADB,
//! [see this](https://android.googlesource.com/platform/packages/modules/adb/+/refs/heads/master/docs/)

use std::path::{Path, PathBuf};

#[cfg(target_os = "windows")]
use std::os::windows::process::CommandExt;

use log::{error, info};

use crate::error::{Error, Result};

/// Name of the adb executable on the current platform.
#[cfg(target_os = "windows")]
pub const ADB_EXE: &str = "adb.exe";
/// Name of the adb executable on the current platform.
#[cfg(not(target_os = "windows"))]
pub const ADB_EXE: &str = "adb";

/// Convert adb output bytes to a trimmed UTF-8 string.
/// Uses lossy conversion to prevent panics on non-UTF8 output from certain OEMs.
#[must_use]
pub fn to_trimmed_utf8(v: &[u8]) -> String {
    String::from_utf8_lossy(v).trim_end().to_string()
}

/// Handle on a resolved adb executable.
///
/// Every method spawns one adb process and blocks until it exits.
#[derive(Debug, Clone)]
pub struct Adb {
    exe: PathBuf,
}

impl Adb {
    #[must_use]
    pub fn new(exe: PathBuf) -> Self {
        Self { exe }
    }

    /// Path of the executable this handle spawns.
    #[must_use]
    pub fn exe(&self) -> &Path {
        &self.exe
    }

    /// Full `adb version` output (format varies by installation):
    /// ```txt
    /// Android Debug Bridge version 1.0.41
    /// Version 35.0.2-android-tools
    /// Installed as /usr/bin/adb
    /// Running on Linux 6.18 (x86_64)
    /// ```
    pub fn version(&self) -> Result<String> {
        self.run(&["version"])
    }

    /// Header-less list of attached devices (as serials) and their states:
    /// - USB
    /// - TCP/IP: WIFI, Ethernet, etc...
    /// - Local emulators
    ///
    /// State can be (but not limited to):
    /// - "unauthorized"
    /// - "offline"
    /// - "device"
    pub fn devices(&self) -> Result<Vec<(String, String)>> {
        self.run(&["devices"]).map(|out| parse_devices(&out))
    }

    /// `adb install -r <apk>`. The `-r` flag replaces an already
    /// installed package while keeping its data, matching what a
    /// re-run of the batch expects.
    pub fn install(&self, apk: &Path) -> Result<String> {
        let apk_str = apk.to_string_lossy();
        self.run(&["install", "-r", &apk_str])
            .map_err(|e| match e {
                Error::Adb { reason, .. } => Error::InstallFailed {
                    apk: apk
                        .file_name()
                        .map_or_else(|| apk_str.to_string(), |n| n.to_string_lossy().to_string()),
                    reason,
                },
                other => other,
            })
    }

    /// Stop the background adb server process.
    pub fn kill_server(&self) -> Result<String> {
        self.run(&["kill-server"])
    }

    fn run(&self, args: &[&str]) -> Result<String> {
        let mut cmd = std::process::Command::new(&self.exe);
        cmd.args(args);

        #[cfg(target_os = "windows")]
        cmd.creation_flags(0x0800_0000); // do not open a cmd window

        info!("Ran command: adb {}", args.join(" "));

        let output = cmd.output().map_err(|e| {
            error!("ADB: {e}");
            Error::ToolMissing
        })?;

        let stdout = to_trimmed_utf8(&output.stdout);
        if output.status.success() {
            Ok(stdout)
        } else {
            // adb sometimes writes errors to stdout instead of stderr
            let reason = if stdout.is_empty() {
                to_trimmed_utf8(&output.stderr)
            } else {
                stdout
            };
            Err(Error::Adb {
                command: args.first().copied().unwrap_or_default().to_string(),
                reason,
            })
        }
    }
}

/// Parse `adb devices` output into `(serial, state)` pairs,
/// skipping the `List of devices attached` header.
#[must_use]
pub fn parse_devices(out: &str) -> Vec<(String, String)> {
    out.lines()
        .skip(1) // header
        .filter_map(|line| {
            let (serial, state) = line.split_once('\t')?;
            Some((serial.to_string(), state.trim().to_string()))
        })
        .collect()
}

/// True when at least one attached device is in the `device` state,
/// i.e. connected and authorized. `unauthorized` and `offline` entries
/// do not count.
#[must_use]
pub fn any_device_ready(devices: &[(String, String)]) -> bool {
    devices.iter().any(|(_, state)| state == "device")
}
