//! Batch APK installation and the append-only install log.
//!
//! One install attempt per `.apk` file, one timestamped log line per
//! attempt. A failing package is recorded and the batch moves on;
//! nothing here retries.

use std::fs::{self, OpenOptions};
use std::io::Write as _;
use std::path::{Path, PathBuf};

use chrono::Local;
use log::{info, warn};

use crate::error::{Error, Result};

/// Append-only log of install outcomes, one line per attempt:
/// `2024-05-01 12:00:00 - a.apk installed successfully`
#[derive(Debug, Clone)]
pub struct InstallLog {
    path: PathBuf,
}

impl InstallLog {
    #[must_use]
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Create the log file empty if it does not exist yet.
    pub fn ensure(&self) -> Result<()> {
        if !self.path.exists() {
            fs::write(&self.path, "").map_err(|e| self.write_err(e))?;
        }
        Ok(())
    }

    /// Append one timestamped outcome line.
    pub fn append(&self, message: &str) -> Result<()> {
        let line = format!("{} - {message}\n", Local::now().format("%Y-%m-%d %H:%M:%S"));
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| self.write_err(e))?;
        file.write_all(line.as_bytes()).map_err(|e| self.write_err(e))
    }

    /// Move the log into `logs_dir` (created if absent), its permanent
    /// home once the run is over.
    pub fn relocate(&self, logs_dir: &Path) -> Result<PathBuf> {
        fs::create_dir_all(logs_dir)?;
        let dest = logs_dir.join(self.path.file_name().unwrap_or_else(|| "adb.log".as_ref()));
        fs::rename(&self.path, &dest)?;
        Ok(dest)
    }

    fn write_err(&self, source: std::io::Error) -> Error {
        Error::LogWrite {
            path: self.path.clone(),
            source,
        }
    }
}

/// Files in `dir` with an `apk` extension (ASCII case-insensitive),
/// sorted by file name so install and log order are deterministic.
/// A missing directory yields an empty batch.
pub fn collect_apks(dir: &Path) -> Result<Vec<PathBuf>> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e.into()),
    };

    let mut apks: Vec<PathBuf> = entries
        .filter_map(|entry| {
            let path = entry.ok()?.path();
            let is_apk = path.is_file()
                && path
                    .extension()
                    .is_some_and(|ext| ext.eq_ignore_ascii_case("apk"));
            is_apk.then_some(path)
        })
        .collect();
    apks.sort_by_key(|p| p.file_name().map(std::ffi::OsStr::to_os_string));
    Ok(apks)
}

/// Result of a batch run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BatchReport {
    pub attempted: usize,
    pub succeeded: usize,
    pub failed: usize,
}

/// Install every file in `apks`, appending one log line per attempt.
///
/// `installer` performs a single install; its `Err` carries the raw
/// error text adb produced (spec of the log format requires the text
/// verbatim). A failed install never halts the batch.
pub fn install_all<F>(apks: &[PathBuf], mut installer: F, log: &InstallLog) -> Result<BatchReport>
where
    F: FnMut(&Path) -> std::result::Result<(), String>,
{
    let mut report = BatchReport::default();

    for apk in apks {
        let name = apk
            .file_name()
            .map_or_else(|| apk.display().to_string(), |n| n.to_string_lossy().to_string());
        info!("Installing {name}...");
        report.attempted += 1;

        match installer(apk) {
            Ok(()) => {
                report.succeeded += 1;
                log.append(&format!("{name} installed successfully"))?;
            }
            Err(reason) => {
                report.failed += 1;
                warn!("Failed to install {name}: {reason}");
                log.append(&format!("Failed to install {name}: {reason}"))?;
            }
        }
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn touch(path: &Path) {
        fs::write(path, b"").expect("touch");
    }

    #[test]
    fn collects_only_apks_sorted() {
        let dir = tempfile::tempdir().expect("tempdir");
        touch(&dir.path().join("b.apk"));
        touch(&dir.path().join("a.apk"));
        touch(&dir.path().join("readme.txt"));
        touch(&dir.path().join("UPPER.APK"));
        fs::create_dir(dir.path().join("nested.apk")).expect("dir named like an apk");

        let apks = collect_apks(dir.path()).expect("readable dir");
        let names: Vec<_> = apks
            .iter()
            .map(|p| p.file_name().expect("name").to_string_lossy().to_string())
            .collect();
        assert_eq!(names, ["UPPER.APK", "a.apk", "b.apk"]);
    }

    #[test]
    fn missing_dir_is_empty_batch() {
        let dir = tempfile::tempdir().expect("tempdir");
        let apks = collect_apks(&dir.path().join("no_such")).expect("tolerated");
        assert!(apks.is_empty());
    }

    #[test]
    fn one_invocation_and_log_line_per_apk() {
        let dir = tempfile::tempdir().expect("tempdir");
        let apks = vec![dir.path().join("a.apk"), dir.path().join("b.apk")];
        let log = InstallLog::new(dir.path().join("adb.log"));
        log.ensure().expect("log created");

        let mut invoked = Vec::new();
        let report = install_all(
            &apks,
            |apk| {
                invoked.push(apk.to_path_buf());
                if apk.ends_with("b.apk") {
                    Err("device offline".to_string())
                } else {
                    Ok(())
                }
            },
            &log,
        )
        .expect("batch runs");

        assert_eq!(invoked, apks);
        assert_eq!(
            report,
            BatchReport {
                attempted: 2,
                succeeded: 1,
                failed: 1
            }
        );

        let contents = fs::read_to_string(log.path()).expect("readable log");
        let lines: Vec<_> = contents.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].ends_with("a.apk installed successfully"));
        assert!(lines[1].ends_with("Failed to install b.apk: device offline"));
    }

    #[test]
    fn log_lines_are_timestamped() {
        let dir = tempfile::tempdir().expect("tempdir");
        let log = InstallLog::new(dir.path().join("adb.log"));
        log.append("x installed successfully").expect("append");

        let contents = fs::read_to_string(log.path()).expect("readable log");
        let line = contents.lines().next().expect("one line");
        let (stamp, message) = line.split_once(" - ").expect("separator");
        assert!(
            chrono::NaiveDateTime::parse_from_str(stamp, "%Y-%m-%d %H:%M:%S").is_ok(),
            "bad timestamp: {stamp}"
        );
        assert_eq!(message, "x installed successfully");
    }

    #[test]
    fn ensure_does_not_truncate() {
        let dir = tempfile::tempdir().expect("tempdir");
        let log = InstallLog::new(dir.path().join("adb.log"));
        log.append("first").expect("append");
        log.ensure().expect("ensure is idempotent");
        let contents = fs::read_to_string(log.path()).expect("readable log");
        assert!(contents.contains("first"));
    }

    #[test]
    fn relocate_moves_into_logs_dir() {
        let dir = tempfile::tempdir().expect("tempdir");
        let log = InstallLog::new(dir.path().join("adb.log"));
        log.append("kept line").expect("append");

        let logs_dir = dir.path().join("Logs");
        let dest = log.relocate(&logs_dir).expect("relocated");
        assert_eq!(dest, logs_dir.join("adb.log"));
        assert!(!log.path().exists());
        assert!(
            fs::read_to_string(&dest)
                .expect("readable relocated log")
                .contains("kept line")
        );
    }
}
