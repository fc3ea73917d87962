//! Directory path management for the installer
//!
//! Build scratch space lives under the user cache directory; install targets
//! live under `~/.local`. Every step takes the paths it touches as explicit
//! parameters, so nothing here depends on the process working directory.

use std::fs;
use std::path::{Path, PathBuf};

/// Get the build workspace (~/.cache/claude-desktop-installer/build)
pub fn workspace_dir() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("claude-desktop-installer")
        .join("build")
}

/// Lock file guarding the workspace, kept outside the wiped directory
pub fn lock_path(workspace: &Path) -> PathBuf {
    workspace.with_extension("lock")
}

/// Where the upstream installer executable is downloaded to
pub fn installer_exe_path(workspace: &Path) -> PathBuf {
    workspace.join("Claude-Setup-x64.exe")
}

/// Extraction directory for the outer installer archive
pub fn installer_extract_dir(workspace: &Path) -> PathBuf {
    workspace.join("installer")
}

/// Extraction directory for the nested .nupkg package
pub fn nupkg_dir(workspace: &Path) -> PathBuf {
    workspace.join("nupkg")
}

/// The application payload inside the extracted nupkg
pub fn nupkg_payload_dir(workspace: &Path) -> PathBuf {
    nupkg_dir(workspace).join("lib/net45")
}

/// Electron resources shipped inside the payload: app.asar, its unpacked
/// sibling, the Tray* assets and the i18n files
pub fn nupkg_resources_dir(workspace: &Path) -> PathBuf {
    nupkg_payload_dir(workspace).join("resources")
}

/// The Windows executable carrying the embedded icon group, next to (not
/// inside) the resources directory
pub fn claude_exe_path(workspace: &Path) -> PathBuf {
    nupkg_payload_dir(workspace).join("claude.exe")
}

/// Source tree for the stub claude-native module
pub fn stub_dir(workspace: &Path) -> PathBuf {
    workspace.join("claude-native")
}

/// Staging area for the .ico file and its decomposed frames
pub fn icon_work_dir(workspace: &Path) -> PathBuf {
    workspace.join("icons")
}

/// Staged output tree, copied wholesale into the user directories at install
pub fn output_dir(workspace: &Path) -> PathBuf {
    workspace.join("output")
}

/// Output subtree holding app.asar and its unpacked sibling
pub fn output_lib_dir(output: &Path) -> PathBuf {
    output.join("lib").join(crate::APP_NAME)
}

/// Output subtree holding the themed icon layout
pub fn output_icons_dir(output: &Path) -> PathBuf {
    output.join("share/icons/hicolor")
}

/// All per-user paths the Installer writes and the Remover deletes.
///
/// Threaded explicitly through install and remove so tests can root the
/// whole layout in a temporary directory.
#[derive(Debug, Clone)]
pub struct InstallTargets {
    /// ~/.local/lib/claude-desktop
    pub lib_dir: PathBuf,
    /// ~/.local/bin
    pub bin_dir: PathBuf,
    /// ~/.local/bin/claude-desktop
    pub launcher: PathBuf,
    /// ~/.local/share/applications
    pub applications_dir: PathBuf,
    /// ~/.local/share/applications/claude-desktop.desktop
    pub desktop_file: PathBuf,
    /// ~/.local/share/icons/hicolor
    pub icons_root: PathBuf,
    /// Shell startup files that get the PATH line appended
    pub shell_profiles: Vec<PathBuf>,
}

impl InstallTargets {
    /// Build the target layout rooted at a given home directory
    pub fn for_home(home: &Path) -> Self {
        let local = home.join(".local");
        let bin_dir = local.join("bin");
        let applications_dir = local.join("share/applications");
        Self {
            lib_dir: local.join("lib").join(crate::APP_NAME),
            launcher: bin_dir.join(crate::APP_NAME),
            bin_dir,
            desktop_file: applications_dir.join(format!("{}.desktop", crate::APP_NAME)),
            applications_dir,
            icons_root: local.join("share/icons/hicolor"),
            shell_profiles: vec![home.join(".bashrc"), home.join(".zshrc")],
        }
    }

    /// Target layout for the invoking user's home directory
    pub fn detect() -> std::io::Result<Self> {
        let home = dirs::home_dir().ok_or_else(|| {
            std::io::Error::new(std::io::ErrorKind::NotFound, "home directory not found")
        })?;
        Ok(Self::for_home(&home))
    }

    /// Installed icon path for one size
    pub fn icon_path(&self, size: u32) -> PathBuf {
        self.icons_root
            .join(format!("{size}x{size}/apps/claude.png"))
    }
}

/// Recursively copy a directory tree
pub fn copy_dir_all(src: &Path, dst: &Path) -> std::io::Result<()> {
    fs::create_dir_all(dst)?;
    for entry in fs::read_dir(src)? {
        let entry = entry?;
        let ty = entry.file_type()?;
        if ty.is_dir() {
            copy_dir_all(&entry.path(), &dst.join(entry.file_name()))?;
        } else {
            fs::copy(entry.path(), dst.join(entry.file_name()))?;
        }
    }
    Ok(())
}
