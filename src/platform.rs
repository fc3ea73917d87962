//! Distro capability descriptors
//!
//! One descriptor per supported distribution family instead of parallel
//! per-distro code paths: package-manager invocation, package names for the
//! required tools, and how to locate an Electron binary at install time.

use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PlatformError {
    #[error("Could not read /etc/os-release: {0}")]
    OsRelease(#[from] std::io::Error),

    #[error("Unsupported distribution: {0}")]
    Unsupported(String),
}

const OS_RELEASE: &str = "/etc/os-release";

/// How the Installer resolves the Electron binary for the launcher script
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElectronLookup {
    /// Query `npm root -g` and use `<root>/electron/dist/electron`
    NpmGlobalRoot,
    /// Locate `electron` on PATH
    PathLookup,
}

/// Everything that differs between distribution families
#[derive(Debug)]
pub struct Platform {
    pub id: &'static str,
    /// argv prefix for installing packages by name
    pub package_install: &'static [&'static str],
    /// OS packages providing the required external tools
    pub packages: &'static [&'static str],
    pub electron_lookup: ElectronLookup,
    /// Bootstrap script endpoint for Node.js when the distro packages
    /// don't provide npm
    pub node_bootstrap_url: &'static str,
}

pub const DEBIAN: Platform = Platform {
    id: "debian",
    package_install: &["sudo", "apt-get", "install", "-y"],
    packages: &["p7zip-full", "icoutils", "imagemagick", "nodejs", "npm"],
    electron_lookup: ElectronLookup::NpmGlobalRoot,
    node_bootstrap_url: "https://deb.nodesource.com/setup_20.x",
};

pub const ARCH: Platform = Platform {
    id: "arch",
    package_install: &["sudo", "pacman", "-S", "--noconfirm", "--needed"],
    packages: &["p7zip", "icoutils", "imagemagick", "nodejs", "npm"],
    electron_lookup: ElectronLookup::PathLookup,
    node_bootstrap_url: "https://deb.nodesource.com/setup_20.x",
};

pub const FEDORA: Platform = Platform {
    id: "fedora",
    package_install: &["sudo", "dnf", "install", "-y"],
    packages: &["p7zip", "p7zip-plugins", "icoutils", "ImageMagick", "nodejs", "npm"],
    electron_lookup: ElectronLookup::NpmGlobalRoot,
    node_bootstrap_url: "https://rpm.nodesource.com/setup_20.x",
};

/// Detect the running distribution from /etc/os-release
pub fn detect() -> Result<&'static Platform, PlatformError> {
    detect_from(Path::new(OS_RELEASE))
}

fn detect_from(os_release: &Path) -> Result<&'static Platform, PlatformError> {
    let content = std::fs::read_to_string(os_release)?;
    match_os_release(&content)
        .ok_or_else(|| PlatformError::Unsupported(os_release_id(&content).unwrap_or_default()))
}

/// Match ID= and ID_LIKE= tokens against the known families
pub fn match_os_release(content: &str) -> Option<&'static Platform> {
    let mut ids: Vec<String> = Vec::new();
    if let Some(id) = os_release_id(content) {
        ids.push(id);
    }
    for line in content.lines() {
        if let Some(value) = line.strip_prefix("ID_LIKE=") {
            for token in value.trim_matches('"').split_whitespace() {
                ids.push(token.to_string());
            }
        }
    }

    for id in &ids {
        match id.as_str() {
            "debian" | "ubuntu" => return Some(&DEBIAN),
            "arch" | "manjaro" => return Some(&ARCH),
            "fedora" | "rhel" | "centos" => return Some(&FEDORA),
            _ => {}
        }
    }
    None
}

fn os_release_id(content: &str) -> Option<String> {
    content
        .lines()
        .find_map(|l| l.strip_prefix("ID="))
        .map(|v| v.trim_matches('"').to_string())
}
