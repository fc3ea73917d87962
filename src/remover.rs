//! Removal of an installed Claude Desktop
//!
//! Deletes every path the Installer writes, without complaint when a path
//! is already gone. Safe to run repeatedly and when nothing is installed.

use crate::paths::InstallTargets;
use crate::report;
use std::fs;
use std::process::Command;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RemoveError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Remove the installed application, launcher, desktop entry and icons,
/// and reset the URL-scheme handler registration
pub fn remove(targets: &InstallTargets) -> Result<(), RemoveError> {
    report::info("removing installed files...");

    if targets.lib_dir.exists() {
        fs::remove_dir_all(&targets.lib_dir)?;
    }
    if targets.launcher.exists() {
        fs::remove_file(&targets.launcher)?;
    }
    if targets.desktop_file.exists() {
        fs::remove_file(&targets.desktop_file)?;
    }
    for size in crate::ICON_SIZES {
        let icon = targets.icon_path(size);
        if icon.exists() {
            fs::remove_file(&icon)?;
        }
    }

    reset_url_scheme();
    report::info("removal complete");
    Ok(())
}

/// Best effort: a failure here leaves a dangling handler entry, nothing
/// worse
fn reset_url_scheme() {
    let _ = Command::new("xdg-mime")
        .args([
            "default",
            "",
            &format!("x-scheme-handler/{}", crate::URL_SCHEME),
        ])
        .output();
}
