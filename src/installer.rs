//! Per-user installation
//!
//! Copies the staged output tree under ~/.local, writes the launcher script
//! and desktop entry, registers the claude:// scheme handler and keeps
//! ~/.local/bin on PATH in the user's shell profiles.

use crate::paths::{InstallTargets, copy_dir_all, output_icons_dir, output_lib_dir};
use crate::platform::{ElectronLookup, Platform};
use crate::report;
use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::process::Command;
use thiserror::Error;

/// Line appended to shell profiles so the launcher is reachable
pub const PATH_LINE: &str = r#"export PATH="$HOME/.local/bin:$PATH""#;

#[derive(Error, Debug)]
pub enum InstallError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Electron runtime not found ({0})")]
    ElectronMissing(String),

    #[error("URL scheme registration failed: {0}")]
    UrlScheme(String),
}

/// Resolve the Electron binary per the platform's lookup strategy
pub fn resolve_electron(platform: &Platform) -> Result<PathBuf, InstallError> {
    match platform.electron_lookup {
        ElectronLookup::NpmGlobalRoot => {
            let output = Command::new("npm")
                .args(["root", "-g"])
                .output()
                .map_err(|e| InstallError::ElectronMissing(format!("npm root -g: {e}")))?;
            if !output.status.success() {
                return Err(InstallError::ElectronMissing(
                    "npm root -g did not succeed".into(),
                ));
            }
            let root = String::from_utf8_lossy(&output.stdout).trim().to_string();
            let electron = Path::new(&root).join("electron/dist/electron");
            if !electron.exists() {
                return Err(InstallError::ElectronMissing(format!(
                    "no electron install under {root}, try: sudo npm install -g electron"
                )));
            }
            Ok(electron)
        }
        ElectronLookup::PathLookup => which::which("electron")
            .map_err(|e| InstallError::ElectronMissing(format!("electron not on PATH: {e}"))),
    }
}

/// Copy the output tree into the user directories and wire up desktop
/// integration
pub fn install(
    targets: &InstallTargets,
    output_dir: &Path,
    electron: &Path,
) -> Result<(), InstallError> {
    report::info(format!("installing to {}...", targets.lib_dir.display()));

    stage_files(targets, output_dir, electron)?;
    refresh_desktop_database(&targets.applications_dir);
    register_url_scheme(targets)?;

    for profile in &targets.shell_profiles {
        if ensure_path_entry(profile)? {
            report::info(format!("added ~/.local/bin to PATH in {}", profile.display()));
        }
    }

    Ok(())
}

/// The filesystem half of install: target directories, output-tree copy,
/// launcher and desktop entry
pub fn stage_files(
    targets: &InstallTargets,
    output_dir: &Path,
    electron: &Path,
) -> Result<(), InstallError> {
    fs::create_dir_all(&targets.bin_dir)?;
    fs::create_dir_all(&targets.applications_dir)?;

    copy_dir_all(&output_lib_dir(output_dir), &targets.lib_dir)?;

    let staged_icons = output_icons_dir(output_dir);
    if staged_icons.exists() {
        copy_dir_all(&staged_icons, &targets.icons_root)?;
    }

    write_launcher(targets, electron)?;
    write_desktop_entry(targets)?;
    Ok(())
}

/// Write the launcher script. Wayland detection happens inside the script
/// at launch time, not here: the session the app is eventually started
/// from may not be the session the installer ran in.
pub fn write_launcher(targets: &InstallTargets, electron: &Path) -> Result<(), InstallError> {
    let script = format!(
        r#"#!/bin/bash
# Launches the repackaged Claude Desktop archive under Electron.
ELECTRON="{electron}"
APP_ASAR="{asar}"

EXTRA_FLAGS=""
if [ -n "$WAYLAND_DISPLAY" ]; then
    EXTRA_FLAGS="--enable-features=WaylandWindowDecorations --ozone-platform-hint=auto"
fi

exec "$ELECTRON" "$APP_ASAR" $EXTRA_FLAGS "$@"
"#,
        electron = electron.display(),
        asar = targets.lib_dir.join("app.asar").display(),
    );

    fs::write(&targets.launcher, script)?;
    fs::set_permissions(&targets.launcher, fs::Permissions::from_mode(0o755))?;
    Ok(())
}

/// Write the desktop entry declaring the launcher, icon and URL-scheme
/// association
pub fn write_desktop_entry(targets: &InstallTargets) -> Result<(), InstallError> {
    let content = format!(
        r#"[Desktop Entry]
Name={name}
Comment={comment}
Exec={exec} %u
Icon=claude
Terminal=false
Type=Application
Categories=Office;Utility;Network;
MimeType=x-scheme-handler/{scheme};
StartupWMClass={wm_class}
"#,
        name = crate::APP_DISPLAY_NAME,
        comment = crate::APP_DESCRIPTION,
        exec = targets.launcher.display(),
        scheme = crate::URL_SCHEME,
        wm_class = crate::DESKTOP_WM_CLASS,
    );

    fs::write(&targets.desktop_file, content)?;
    Ok(())
}

/// Refresh the desktop database if the tool is around; skipping it only
/// delays menu updates
pub fn refresh_desktop_database(applications_dir: &Path) {
    if which::which("update-desktop-database").is_err() {
        report::warn("update-desktop-database not found, skipping database refresh");
        return;
    }
    let _ = Command::new("update-desktop-database")
        .arg(applications_dir)
        .output();
}

/// Register the desktop entry as the claude:// scheme handler
pub fn register_url_scheme(targets: &InstallTargets) -> Result<(), InstallError> {
    let desktop_name = targets
        .desktop_file
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| format!("{}.desktop", crate::APP_NAME));

    let output = Command::new("xdg-mime")
        .args([
            "default",
            &desktop_name,
            &format!("x-scheme-handler/{}", crate::URL_SCHEME),
        ])
        .output()
        .map_err(|e| InstallError::UrlScheme(format!("failed to run xdg-mime: {e}")))?;

    if !output.status.success() {
        return Err(InstallError::UrlScheme(
            String::from_utf8_lossy(&output.stderr).trim().to_string(),
        ));
    }
    Ok(())
}

/// Append the PATH line to a shell profile if the file exists and the line
/// is not already there. Returns true when a line was appended.
pub fn ensure_path_entry(profile: &Path) -> Result<bool, InstallError> {
    if !profile.exists() {
        return Ok(false);
    }
    let content = fs::read_to_string(profile)?;
    if content.lines().any(|l| l.trim() == PATH_LINE) {
        return Ok(false);
    }

    let mut updated = content;
    if !updated.is_empty() && !updated.ends_with('\n') {
        updated.push('\n');
    }
    updated.push_str(PATH_LINE);
    updated.push('\n');
    fs::write(profile, updated)?;
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn targets_in(dir: &Path) -> InstallTargets {
        let targets = InstallTargets::for_home(dir);
        fs::create_dir_all(&targets.bin_dir).unwrap();
        fs::create_dir_all(&targets.applications_dir).unwrap();
        fs::create_dir_all(&targets.lib_dir).unwrap();
        targets
    }

    #[test]
    fn desktop_entry_round_trips_the_exec_command() {
        let tmp = tempfile::tempdir().unwrap();
        let targets = targets_in(tmp.path());

        write_desktop_entry(&targets).unwrap();

        let content = fs::read_to_string(&targets.desktop_file).unwrap();
        let exec_line = content
            .lines()
            .find_map(|l| l.strip_prefix("Exec="))
            .unwrap();
        assert_eq!(exec_line, format!("{} %u", targets.launcher.display()));
        assert!(content.contains("MimeType=x-scheme-handler/claude;"));
        assert!(content.contains("StartupWMClass=Claude"));
    }

    #[test]
    fn launcher_is_executable_and_defers_wayland_detection() {
        let tmp = tempfile::tempdir().unwrap();
        let targets = targets_in(tmp.path());

        write_launcher(&targets, Path::new("/usr/bin/electron")).unwrap();

        let script = fs::read_to_string(&targets.launcher).unwrap();
        assert!(script.starts_with("#!/bin/bash"));
        assert!(script.contains(r#"if [ -n "$WAYLAND_DISPLAY" ]"#));
        assert!(script.contains("--ozone-platform-hint=auto"));
        assert!(script.contains(r#""$@""#));
        assert!(script.contains("app.asar"));

        let mode = fs::metadata(&targets.launcher).unwrap().permissions().mode();
        assert_eq!(mode & 0o111, 0o111);
    }

    #[test]
    fn path_entry_is_appended_once_per_profile() {
        let tmp = tempfile::tempdir().unwrap();
        let profile = tmp.path().join(".bashrc");
        fs::write(&profile, "alias ll='ls -l'\n").unwrap();

        assert!(ensure_path_entry(&profile).unwrap());
        assert!(!ensure_path_entry(&profile).unwrap());

        let content = fs::read_to_string(&profile).unwrap();
        assert_eq!(content.matches(PATH_LINE).count(), 1);
        assert!(content.starts_with("alias ll"));
    }

    #[test]
    fn absent_profile_is_left_alone() {
        let tmp = tempfile::tempdir().unwrap();
        let profile = tmp.path().join(".zshrc");

        assert!(!ensure_path_entry(&profile).unwrap());
        assert!(!profile.exists());
    }

    fn fake_output_tree(output: &Path, asar_contents: &[u8]) {
        let out_lib = output_lib_dir(output);
        fs::create_dir_all(out_lib.join("app.asar.unpacked")).unwrap();
        fs::write(out_lib.join("app.asar"), asar_contents).unwrap();
        for size in crate::ICON_SIZES {
            let icon = output_icons_dir(output).join(format!("{size}x{size}/apps/claude.png"));
            fs::create_dir_all(icon.parent().unwrap()).unwrap();
            fs::write(icon, b"png").unwrap();
        }
    }

    fn file_tree(root: &Path) -> Vec<String> {
        let mut files: Vec<String> = walkdir::WalkDir::new(root)
            .into_iter()
            .flatten()
            .filter(|e| e.path().is_file())
            .map(|e| {
                e.path()
                    .strip_prefix(root)
                    .unwrap()
                    .to_string_lossy()
                    .to_string()
            })
            .collect();
        files.sort();
        files
    }

    #[test]
    fn install_copies_the_output_tree_and_writes_all_targets() {
        let tmp = tempfile::tempdir().unwrap();
        let home = tmp.path().join("home");
        fs::create_dir_all(&home).unwrap();
        let targets = InstallTargets::for_home(&home);

        let output = tmp.path().join("output");
        fake_output_tree(&output, b"asar");

        // xdg-mime may not exist in the test environment, so exercise the
        // filesystem half of install() rather than the whole sequence.
        stage_files(&targets, &output, Path::new("/usr/bin/electron")).unwrap();

        assert!(targets.lib_dir.join("app.asar").exists());
        assert!(targets.launcher.exists());
        assert!(targets.desktop_file.exists());
        for size in crate::ICON_SIZES {
            assert!(targets.icon_path(size).exists());
        }
    }

    #[test]
    fn clean_install_matches_remove_then_fresh_install() {
        let tmp = tempfile::tempdir().unwrap();
        let output = tmp.path().join("output");
        fake_output_tree(&output, b"new payload");

        // Home A carries a stale install with different contents; home B
        // starts empty. Remove-then-install on A must land in the same
        // state as a fresh install on B.
        let home_a = tmp.path().join("home_a");
        let home_b = tmp.path().join("home_b");
        fs::create_dir_all(&home_a).unwrap();
        fs::create_dir_all(&home_b).unwrap();
        let targets_a = InstallTargets::for_home(&home_a);
        let targets_b = InstallTargets::for_home(&home_b);

        fs::create_dir_all(targets_a.lib_dir.join("stale-dir")).unwrap();
        fs::write(targets_a.lib_dir.join("app.asar"), b"old payload").unwrap();
        fs::create_dir_all(&targets_a.bin_dir).unwrap();
        fs::write(&targets_a.launcher, "#!/bin/bash\nold\n").unwrap();

        crate::remover::remove(&targets_a).unwrap();
        stage_files(&targets_a, &output, Path::new("/usr/bin/electron")).unwrap();
        stage_files(&targets_b, &output, Path::new("/usr/bin/electron")).unwrap();

        assert_eq!(file_tree(&home_a), file_tree(&home_b));
        assert_eq!(
            fs::read(targets_a.lib_dir.join("app.asar")).unwrap(),
            b"new payload"
        );
        assert!(!targets_a.lib_dir.join("stale-dir").exists());
    }
}
