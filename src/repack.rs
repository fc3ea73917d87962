//! Resource archive repackaging
//!
//! app.asar travels from the nupkg into the output tree, gets unpacked,
//! patched (stub binding injected, tray assets and missing locale file
//! added) and packed back over itself. Only the repacked archive matters at
//! runtime; the contents directory is scratch.

use crate::paths::copy_dir_all;
use crate::report;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use thiserror::Error;

/// Location of the native binding inside the archive
pub const NATIVE_MODULE_RELPATH: &str = "node_modules/claude-native/claude-native-binding.node";

/// Locale file the Windows bundle ships without; the app fails at launch
/// when it is absent
pub const LOCALE_RELPATH: &str = "resources/i18n/en-US.json";

#[derive(Error, Debug)]
pub enum RepackError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("missing upstream resource: {}", .0.display())]
    MissingResource(PathBuf),

    #[error("asar {0} exited with {1}")]
    Asar(&'static str, std::process::ExitStatus),

    #[error("failed to run npx: {0}")]
    Spawn(std::io::Error),
}

/// Copy app.asar and its unpacked sibling out of the extracted nupkg into
/// the output tree
pub fn stage_resources(resources_dir: &Path, output_lib: &Path) -> Result<(), RepackError> {
    let asar = resources_dir.join("app.asar");
    if !asar.exists() {
        return Err(RepackError::MissingResource(asar));
    }

    fs::create_dir_all(output_lib)?;
    fs::copy(&asar, output_lib.join("app.asar"))?;

    let unpacked = resources_dir.join("app.asar.unpacked");
    if !unpacked.exists() {
        return Err(RepackError::MissingResource(unpacked));
    }
    copy_dir_all(&unpacked, &output_lib.join("app.asar.unpacked"))?;
    Ok(())
}

/// Unpack, patch and repack app.asar in place inside the output tree
pub fn repack(
    output_lib: &Path,
    resources_dir: &Path,
    stub_artifact: &Path,
) -> Result<(), RepackError> {
    let asar = output_lib.join("app.asar");
    let contents = output_lib.join("app.asar.contents");
    let unpacked = output_lib.join("app.asar.unpacked");

    report::info("unpacking app.asar...");
    run_asar("extract", &asar, &contents)?;

    patch_contents(&contents, &unpacked, stub_artifact)?;
    stage_tray_assets(resources_dir, &contents)?;
    ensure_locale(&contents)?;

    report::info("repacking app.asar...");
    run_asar("pack", &contents, &asar)?;
    Ok(())
}

/// Overwrite the native binding placeholder in both the unpacked contents
/// and the unpacked sibling directory with the stub build
pub fn patch_contents(
    contents: &Path,
    unpacked: &Path,
    stub_artifact: &Path,
) -> Result<(), RepackError> {
    if !stub_artifact.exists() {
        return Err(RepackError::MissingResource(stub_artifact.to_path_buf()));
    }

    for root in [contents, unpacked] {
        let dest = root.join(NATIVE_MODULE_RELPATH);
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::copy(stub_artifact, &dest)?;
    }
    Ok(())
}

/// Copy the Tray* icon assets shipped next to the archive into the
/// unpacked contents
pub fn stage_tray_assets(resources_dir: &Path, contents: &Path) -> Result<(), RepackError> {
    let dest = contents.join("resources");
    fs::create_dir_all(&dest)?;

    for entry in fs::read_dir(resources_dir)? {
        let entry = entry?;
        let name = entry.file_name().to_string_lossy().to_string();
        if name.starts_with("Tray") && entry.path().is_file() {
            fs::copy(entry.path(), dest.join(&name))?;
        }
    }
    Ok(())
}

/// Synthesize an empty locale file when the bundle lacks one
pub fn ensure_locale(contents: &Path) -> Result<(), RepackError> {
    let locale = contents.join(LOCALE_RELPATH);
    if locale.exists() {
        return Ok(());
    }
    if let Some(parent) = locale.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(&locale, serde_json::json!({}).to_string())?;
    Ok(())
}

fn run_asar(verb: &'static str, from: &Path, to: &Path) -> Result<(), RepackError> {
    let status = Command::new("npx")
        .args(["--yes", "@electron/asar", verb])
        .arg(from)
        .arg(to)
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .status()
        .map_err(RepackError::Spawn)?;

    if !status.success() {
        return Err(RepackError::Asar(verb, status));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn patch_overwrites_binding_in_both_trees() {
        let tmp = tempfile::tempdir().unwrap();
        let contents = tmp.path().join("contents");
        let unpacked = tmp.path().join("unpacked");
        for root in [&contents, &unpacked] {
            let placeholder = root.join(NATIVE_MODULE_RELPATH);
            fs::create_dir_all(placeholder.parent().unwrap()).unwrap();
            fs::write(&placeholder, b"win32 binding").unwrap();
        }
        let stub = tmp.path().join("claude-native-binding.node");
        fs::write(&stub, b"linux stub").unwrap();

        patch_contents(&contents, &unpacked, &stub).unwrap();

        for root in [&contents, &unpacked] {
            assert_eq!(
                fs::read(root.join(NATIVE_MODULE_RELPATH)).unwrap(),
                b"linux stub"
            );
        }
    }

    #[test]
    fn patch_requires_the_stub_artifact() {
        let tmp = tempfile::tempdir().unwrap();
        let err = patch_contents(
            &tmp.path().join("contents"),
            &tmp.path().join("unpacked"),
            &tmp.path().join("nope.node"),
        );
        assert!(matches!(err, Err(RepackError::MissingResource(_))));
    }

    #[test]
    fn locale_is_synthesized_only_when_absent() {
        let tmp = tempfile::tempdir().unwrap();
        let contents = tmp.path().join("contents");

        ensure_locale(&contents).unwrap();
        assert_eq!(
            fs::read_to_string(contents.join(LOCALE_RELPATH)).unwrap(),
            "{}"
        );

        // An existing file is left alone
        fs::write(contents.join(LOCALE_RELPATH), r#"{"hello":"world"}"#).unwrap();
        ensure_locale(&contents).unwrap();
        assert_eq!(
            fs::read_to_string(contents.join(LOCALE_RELPATH)).unwrap(),
            r#"{"hello":"world"}"#
        );
    }

    #[test]
    fn tray_assets_are_copied_into_contents() {
        let tmp = tempfile::tempdir().unwrap();
        let resources = tmp.path().join("resources");
        fs::create_dir_all(&resources).unwrap();
        fs::write(resources.join("TrayIconTemplate.png"), b"tray").unwrap();
        fs::write(resources.join("app.asar"), b"asar").unwrap();

        let contents = tmp.path().join("contents");
        stage_tray_assets(&resources, &contents).unwrap();

        assert!(contents.join("resources/TrayIconTemplate.png").exists());
        assert!(!contents.join("resources/app.asar").exists());
    }

    #[test]
    fn stage_resources_fails_without_upstream_archive() {
        let tmp = tempfile::tempdir().unwrap();
        let resources = tmp.path().join("resources");
        fs::create_dir_all(&resources).unwrap();

        let err = stage_resources(&resources, &tmp.path().join("out"));
        assert!(matches!(err, Err(RepackError::MissingResource(_))));
    }

    #[test]
    fn stage_resources_reads_the_nupkg_resources_directory() {
        // Lay out an extracted nupkg the way upstream ships it: the archive
        // and its siblings live under lib/net45/resources, next to (not
        // containing) claude.exe.
        let tmp = tempfile::tempdir().unwrap();
        let workspace = tmp.path().join("build");
        let resources = crate::paths::nupkg_resources_dir(&workspace);
        fs::create_dir_all(resources.join("app.asar.unpacked")).unwrap();
        fs::write(resources.join("app.asar"), b"asar").unwrap();
        fs::write(resources.join("TrayIconTemplate@2x.png"), b"tray").unwrap();
        fs::write(crate::paths::claude_exe_path(&workspace), b"MZ").unwrap();

        let out = tmp.path().join("out");
        stage_resources(&resources, &out).unwrap();

        assert_eq!(fs::read(out.join("app.asar")).unwrap(), b"asar");
        assert!(out.join("app.asar.unpacked").exists());
    }

    #[test]
    fn stage_resources_copies_archive_and_sibling() {
        let tmp = tempfile::tempdir().unwrap();
        let resources = tmp.path().join("resources");
        fs::create_dir_all(resources.join("app.asar.unpacked/node_modules")).unwrap();
        fs::write(resources.join("app.asar"), b"asar").unwrap();
        fs::write(
            resources.join("app.asar.unpacked/node_modules/x.node"),
            b"n",
        )
        .unwrap();

        let out = tmp.path().join("out");
        stage_resources(&resources, &out).unwrap();

        assert_eq!(fs::read(out.join("app.asar")).unwrap(), b"asar");
        assert!(out.join("app.asar.unpacked/node_modules/x.node").exists());
    }
}
