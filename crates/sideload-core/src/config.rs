//! Run configuration: directory layout, download URL and timing knobs.
//!
//! Defaults reproduce the classic layout: an `apks/` folder next to the
//! binary, a local `ADB/platform-tools` install, an `adb.log` that ends
//! up under `Logs/`. An optional `config.toml` in the user config
//! directory overrides individual fields; CLI flags override both.

use std::path::{Path, PathBuf};
use std::time::Duration;

use log::warn;
use serde::Deserialize;

/// Per-OS Google download URL for the latest platform-tools ZIP.
#[cfg(target_os = "windows")]
pub const PLATFORM_TOOLS_URL: &str =
    "https://dl.google.com/android/repository/platform-tools-latest-windows.zip";
#[cfg(target_os = "macos")]
pub const PLATFORM_TOOLS_URL: &str =
    "https://dl.google.com/android/repository/platform-tools-latest-darwin.zip";
#[cfg(not(any(target_os = "windows", target_os = "macos")))]
pub const PLATFORM_TOOLS_URL: &str =
    "https://dl.google.com/android/repository/platform-tools-latest-linux.zip";

/// Name of the archive written into the scratch directory.
pub const ARCHIVE_NAME: &str = "adb.zip";

/// Resolved configuration for one run.
#[derive(Debug, Clone)]
pub struct Config {
    /// Directory holding `apks/`, `ADB/`, `Logs/` and the install log.
    pub base_dir: PathBuf,
    /// Name of the package folder under `base_dir`.
    pub apks_dir: String,
    /// Scratch directory for the downloaded archive.
    pub scratch_dir: PathBuf,
    /// Archive URL to fetch when adb is missing.
    pub download_url: String,
    /// Delay between device polls.
    pub poll_interval: Duration,
    /// Poll attempts before giving up on a device.
    pub max_poll_attempts: usize,
    /// Grace delay before the first install, waiting for the user to
    /// accept the USB-debugging authorization prompt on the device.
    pub auth_delay: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_dir: PathBuf::from("."),
            apks_dir: "apks".to_string(),
            scratch_dir: std::env::temp_dir().join("adb_installer_temp"),
            download_url: PLATFORM_TOOLS_URL.to_string(),
            poll_interval: Duration::from_secs(5),
            max_poll_attempts: 60,
            auth_delay: Duration::from_secs(30),
        }
    }
}

impl Config {
    /// `<base>/apks`
    #[must_use]
    pub fn apks_path(&self) -> PathBuf {
        self.base_dir.join(&self.apks_dir)
    }

    /// `<base>/ADB`, the extraction target.
    #[must_use]
    pub fn adb_dir(&self) -> PathBuf {
        self.base_dir.join("ADB")
    }

    /// `<base>/ADB/platform-tools`, where the adb binary lands.
    #[must_use]
    pub fn install_dir(&self) -> PathBuf {
        self.adb_dir().join("platform-tools")
    }

    /// `<base>/adb.log`, the working install log.
    #[must_use]
    pub fn log_file(&self) -> PathBuf {
        self.base_dir.join("adb.log")
    }

    /// `<base>/Logs`, the permanent home of relocated install logs.
    #[must_use]
    pub fn logs_dir(&self) -> PathBuf {
        self.base_dir.join("Logs")
    }

    /// `<scratch>/adb.zip`, the downloaded archive.
    #[must_use]
    pub fn archive_path(&self) -> PathBuf {
        self.scratch_dir.join(ARCHIVE_NAME)
    }

    /// Defaults overlaid with the user config file, when one exists.
    #[must_use]
    pub fn load() -> Self {
        let mut config = Self::default();
        if let Some(path) = config_file_path() {
            config.apply_file(&path);
        }
        config
    }

    fn apply_file(&mut self, path: &Path) {
        let Ok(raw) = std::fs::read_to_string(path) else {
            return;
        };
        match toml::from_str::<ConfigFile>(&raw) {
            Ok(file) => self.overlay(file),
            Err(e) => warn!("Ignoring malformed config {}: {e}", path.display()),
        }
    }

    fn overlay(&mut self, file: ConfigFile) {
        if let Some(v) = file.base_dir {
            self.base_dir = v;
        }
        if let Some(v) = file.apks_dir {
            self.apks_dir = v;
        }
        if let Some(v) = file.scratch_dir {
            self.scratch_dir = v;
        }
        if let Some(v) = file.download_url {
            self.download_url = v;
        }
        if let Some(v) = file.poll_interval_secs {
            self.poll_interval = Duration::from_secs(v);
        }
        if let Some(v) = file.max_poll_attempts {
            self.max_poll_attempts = v;
        }
        if let Some(v) = file.auth_delay_secs {
            self.auth_delay = Duration::from_secs(v);
        }
    }
}

/// `<config_dir>/sideload/config.toml`
#[must_use]
fn config_file_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("sideload").join("config.toml"))
}

/// On-disk shape of the config file. Every field optional, unknown
/// fields ignored.
#[derive(Debug, Default, Deserialize)]
struct ConfigFile {
    base_dir: Option<PathBuf>,
    apks_dir: Option<String>,
    scratch_dir: Option<PathBuf>,
    download_url: Option<String>,
    poll_interval_secs: Option<u64>,
    max_poll_attempts: Option<usize>,
    auth_delay_secs: Option<u64>,
}
