//! Upstream installer download and extraction
//!
//! The outer Windows installer is a 7-Zip self-extractor, handed to the
//! external `7z` tool. The nested .nupkg package is a plain zip and is
//! unpacked natively.

use crate::download::{DownloadError, Fetcher, ensure_downloaded};
use crate::paths;
use crate::report;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::process::Command;
use thiserror::Error;
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("Download error: {0}")]
    Download(#[from] DownloadError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("7z extraction failed: {0}")]
    Extract(String),

    #[error("no nested .nupkg package found in {}", .0.display())]
    NupkgMissing(PathBuf),

    #[error("expected one .nupkg package in {}, found {}", .0.display(), .1)]
    NupkgAmbiguous(PathBuf, usize),

    #[error("package archive error: {0}")]
    Zip(#[from] zip::result::ZipError),
}

/// Download the upstream installer into the workspace, skipping the fetch
/// when a previous download is still there.
pub fn fetch_installer(fetcher: &dyn Fetcher, workspace: &Path) -> Result<PathBuf, FetchError> {
    let dest = paths::installer_exe_path(workspace);
    if ensure_downloaded(fetcher, crate::INSTALLER_URL, &dest)? {
        report::info("downloaded upstream installer");
    } else {
        report::info("upstream installer already present, skipping download");
    }
    Ok(dest)
}

/// Extract the outer installer archive with 7z
pub fn extract_installer(exe: &Path, dest: &Path) -> Result<(), FetchError> {
    fs::create_dir_all(dest)?;
    let output = Command::new("7z")
        .arg("x")
        .arg("-y")
        .arg(format!("-o{}", dest.display()))
        .arg(exe)
        .output()
        .map_err(|e| FetchError::Extract(format!("failed to run 7z: {e}")))?;

    if !output.status.success() {
        return Err(FetchError::Extract(
            String::from_utf8_lossy(&output.stderr).trim().to_string(),
        ));
    }
    Ok(())
}

/// Locate the single nested .nupkg by extension. Upstream naming embeds the
/// version, so the name itself is never matched.
pub fn find_nupkg(dir: &Path) -> Result<PathBuf, FetchError> {
    let mut matches: Vec<PathBuf> = Vec::new();
    for entry in WalkDir::new(dir).max_depth(2).into_iter().flatten() {
        let path = entry.path();
        if path.is_file() && path.extension().is_some_and(|e| e == "nupkg") {
            matches.push(path.to_path_buf());
        }
    }

    match matches.len() {
        0 => Err(FetchError::NupkgMissing(dir.to_path_buf())),
        1 => Ok(matches.remove(0)),
        n => Err(FetchError::NupkgAmbiguous(dir.to_path_buf(), n)),
    }
}

/// Unpack the .nupkg (a zip) into `dest`
pub fn extract_nupkg(nupkg: &Path, dest: &Path) -> Result<(), FetchError> {
    fs::create_dir_all(dest)?;
    let file = File::open(nupkg)?;
    let mut archive = zip::ZipArchive::new(file)?;

    for i in 0..archive.len() {
        let mut entry = archive.by_index(i)?;

        let outpath = match entry.enclosed_name() {
            Some(path) => dest.join(path),
            None => continue,
        };

        if entry.name().ends_with('/') {
            fs::create_dir_all(&outpath)?;
        } else {
            if let Some(p) = outpath.parent() {
                if !p.exists() {
                    fs::create_dir_all(p)?;
                }
            }
            let mut outfile = File::create(&outpath)?;
            std::io::copy(&mut entry, &mut outfile)?;
        }

        {
            use std::os::unix::fs::PermissionsExt;
            if let Some(mode) = entry.unix_mode() {
                fs::set_permissions(&outpath, fs::Permissions::from_mode(mode))?;
            }
        }
    }
    Ok(())
}
