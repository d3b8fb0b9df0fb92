//! Locating the adb executable, and fetching platform-tools when it is
//! missing.
//!
//! Resolution never mutates `PATH`. `locate` returns the executable
//! path it found; `provision` downloads and unpacks Google's
//! platform-tools ZIP and returns the path of the extracted binary.
//! Callers thread that path into [`crate::adb::Adb`].

use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};

use log::{debug, info};

use crate::adb::ADB_EXE;
use crate::config::Config;
use crate::error::{Error, Result};

/// Resolve the adb executable: every `PATH` entry first, then the
/// local install directory. No side effects.
#[must_use]
pub fn locate(install_dir: &Path) -> Option<PathBuf> {
    let path_entries = std::env::var_os("PATH")
        .map(|raw| std::env::split_paths(&raw).collect::<Vec<_>>())
        .unwrap_or_default();
    search(path_entries.into_iter().chain([install_dir.to_path_buf()]))
}

/// `which`-style search over an explicit candidate directory list.
#[must_use]
pub fn search(dirs: impl IntoIterator<Item = PathBuf>) -> Option<PathBuf> {
    dirs.into_iter().map(|dir| dir.join(ADB_EXE)).find(|candidate| {
        let found = candidate.is_file();
        if found {
            debug!("Resolved adb at {}", candidate.display());
        }
        found
    })
}

/// Download and unpack platform-tools, returning the path of the
/// extracted adb binary.
///
/// Any pre-existing install directory is removed first so a re-run
/// never mixes two platform-tools versions.
pub fn provision(config: &Config) -> Result<PathBuf> {
    fs::create_dir_all(&config.scratch_dir)?;
    let archive = config.archive_path();

    info!("Downloading platform-tools from {}", config.download_url);
    download(&config.download_url, &archive)?;

    let target = config.adb_dir();
    if target.exists() {
        fs::remove_dir_all(&target)?;
    }

    info!("Extracting platform-tools to {}", target.display());
    extract_zip(&archive, &target)?;

    let exe = config.install_dir().join(ADB_EXE);
    if !exe.is_file() {
        return Err(Error::ToolMissing);
    }
    info!("adb provisioned at {}", exe.display());
    Ok(exe)
}

fn download(url: &str, dest: &Path) -> Result<()> {
    let mut response = ureq::get(url).call().map_err(|e| Error::DownloadFailed {
        url: url.to_string(),
        reason: e.to_string(),
    })?;

    let mut file = fs::File::create(dest)?;
    std::io::copy(&mut response.body_mut().as_reader(), &mut file).map_err(|e| {
        Error::DownloadFailed {
            url: url.to_string(),
            reason: e.to_string(),
        }
    })?;
    Ok(())
}

/// Unpack `archive` into `target`, restoring the unix executable bit
/// where the archive recorded one. Entries whose names escape the
/// target directory are rejected.
pub fn extract_zip(archive: &Path, target: &Path) -> Result<()> {
    let file = fs::File::open(archive)?;
    let mut zip =
        zip::ZipArchive::new(file).map_err(|e| Error::ExtractFailed(e.to_string()))?;

    for index in 0..zip.len() {
        let mut entry = zip
            .by_index(index)
            .map_err(|e| Error::ExtractFailed(e.to_string()))?;

        let Some(relative) = entry.enclosed_name() else {
            return Err(Error::ExtractFailed(format!(
                "archive entry escapes extraction dir: {}",
                entry.name()
            )));
        };
        let dest = target.join(relative);

        if entry.is_dir() {
            fs::create_dir_all(&dest)?;
            continue;
        }
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent)?;
        }

        let mut contents = Vec::with_capacity(usize::try_from(entry.size()).unwrap_or(0));
        entry
            .read_to_end(&mut contents)
            .map_err(|e| Error::ExtractFailed(e.to_string()))?;
        fs::write(&dest, contents)?;

        #[cfg(unix)]
        if let Some(mode) = entry.unix_mode() {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&dest, fs::Permissions::from_mode(mode))?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write as _;

    fn make_zip(entries: &[(&str, &[u8])]) -> Vec<u8> {
        let mut buf = std::io::Cursor::new(Vec::new());
        {
            let mut writer = zip::ZipWriter::new(&mut buf);
            let options = zip::write::SimpleFileOptions::default()
                .compression_method(zip::CompressionMethod::Stored)
                .unix_permissions(0o755);
            for (name, data) in entries {
                writer.start_file(*name, options).expect("start entry");
                writer.write_all(data).expect("write entry");
            }
            writer.finish().expect("finish zip");
        }
        buf.into_inner()
    }

    #[test]
    fn search_finds_first_match() {
        let a = tempfile::tempdir().expect("tempdir");
        let b = tempfile::tempdir().expect("tempdir");
        fs::write(b.path().join(ADB_EXE), b"").expect("touch");

        let found = search([a.path().to_path_buf(), b.path().to_path_buf()]);
        assert_eq!(found, Some(b.path().join(ADB_EXE)));
    }

    #[test]
    fn search_misses_when_absent() {
        let dir = tempfile::tempdir().expect("tempdir");
        assert_eq!(search([dir.path().to_path_buf()]), None);
    }

    #[test]
    fn extract_restores_tree() {
        let dir = tempfile::tempdir().expect("tempdir");
        let archive = dir.path().join("adb.zip");
        fs::write(
            &archive,
            make_zip(&[
                ("platform-tools/adb", b"#!fake"),
                ("platform-tools/NOTICE.txt", b"notice"),
            ]),
        )
        .expect("write archive");

        let target = dir.path().join("ADB");
        extract_zip(&archive, &target).expect("extract");

        assert!(target.join("platform-tools/adb").is_file());
        assert!(target.join("platform-tools/NOTICE.txt").is_file());

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = fs::metadata(target.join("platform-tools/adb"))
                .expect("metadata")
                .permissions()
                .mode();
            assert_eq!(mode & 0o111, 0o111);
        }
    }

    #[test]
    fn extract_rejects_traversal() {
        let dir = tempfile::tempdir().expect("tempdir");
        let archive = dir.path().join("evil.zip");
        fs::write(&archive, make_zip(&[("../escape.txt", b"nope")])).expect("write archive");

        let err = extract_zip(&archive, &dir.path().join("out")).expect_err("traversal rejected");
        assert!(matches!(err, Error::ExtractFailed(_)));
        assert!(!dir.path().join("escape.txt").exists());
    }
}
