//! External tool checking and installation

use crate::download::{DownloadError, download_string};
use crate::platform::Platform;
use crate::report;
use std::fs;
use std::process::{Command, Stdio};
use thiserror::Error;

/// Executables every build needs on PATH
pub const REQUIRED_TOOLS: &[&str] = &["7z", "wrestool", "icotool", "convert", "node", "npm"];

#[derive(Error, Debug)]
pub enum DepsError {
    #[error("required tools still missing after installation: {}", .0.join(", "))]
    StillMissing(Vec<String>),

    #[error("package installation exited with {0}")]
    PackageInstall(std::process::ExitStatus),

    #[error("failed to run {0}: {1}")]
    Spawn(String, std::io::Error),

    #[error("Node.js bootstrap script exited with {0}")]
    Bootstrap(std::process::ExitStatus),

    #[error("Download error: {0}")]
    Download(#[from] DownloadError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Subset of `tools` that cannot be found on PATH
pub fn missing_tools(tools: &[&str]) -> Vec<String> {
    tools
        .iter()
        .filter(|t| which::which(t).is_err())
        .map(|t| t.to_string())
        .collect()
}

/// Ensure all required tools are installed, installing OS packages and
/// bootstrapping Node.js as needed. Fatal if anything is still missing
/// after the installation attempts.
pub fn ensure(platform: &Platform) -> Result<(), DepsError> {
    let missing = missing_tools(REQUIRED_TOOLS);
    if missing.is_empty() {
        report::info("all required tools present");
        return Ok(());
    }

    report::info(format!(
        "missing tools: {}, installing packages...",
        missing.join(", ")
    ));
    install_packages(platform)?;

    if missing_tools(&["npm"]).len() == 1 {
        report::info("npm still missing, running Node.js bootstrap...");
        bootstrap_node(platform)?;
        install_packages(platform)?;
    }

    let still_missing = missing_tools(REQUIRED_TOOLS);
    if !still_missing.is_empty() {
        return Err(DepsError::StillMissing(still_missing));
    }
    Ok(())
}

/// Install the platform's package list with its package manager
fn install_packages(platform: &Platform) -> Result<(), DepsError> {
    let (program, prefix_args) = platform
        .package_install
        .split_first()
        .expect("platform descriptor has an install command");

    let status = Command::new(program)
        .args(prefix_args)
        .args(platform.packages)
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .status()
        .map_err(|e| DepsError::Spawn(program.to_string(), e))?;

    if !status.success() {
        return Err(DepsError::PackageInstall(status));
    }
    Ok(())
}

/// Fetch and run the distro's Node.js setup script
fn bootstrap_node(platform: &Platform) -> Result<(), DepsError> {
    let script = download_string(platform.node_bootstrap_url)?;
    let script_path = std::env::temp_dir().join("claude-desktop-node-setup.sh");
    fs::write(&script_path, script)?;

    let status = Command::new("sudo")
        .arg("bash")
        .arg(&script_path)
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .status()
        .map_err(|e| DepsError::Spawn("sudo".into(), e))?;

    fs::remove_file(&script_path).ok();

    if !status.success() {
        return Err(DepsError::Bootstrap(status));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn present_tools_are_not_reported_missing() {
        // sh is on PATH on any machine these tests run on
        assert!(missing_tools(&["sh"]).is_empty());
    }

    #[test]
    fn absent_tools_are_reported_by_name() {
        let missing = missing_tools(&["sh", "definitely-not-a-real-tool-0x7f"]);
        assert_eq!(missing, vec!["definitely-not-a-real-tool-0x7f".to_string()]);
    }

    #[test]
    fn still_missing_error_lists_every_tool() {
        let err = DepsError::StillMissing(vec!["wrestool".into(), "icotool".into()]);
        assert_eq!(
            err.to_string(),
            "required tools still missing after installation: wrestool, icotool"
        );
    }
}
