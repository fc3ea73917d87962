//! Icon extraction and theming
//!
//! wrestool pulls the icon group resource out of the Windows executable,
//! icotool splits it into per-size PNG frames, and the frames are staged
//! into a hicolor theme layout. This is the only pipeline step that
//! tolerates partial failure: a missing size is a warning.

use crate::report;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum IconError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("wrestool failed: {0}")]
    Wrestool(String),

    #[error("icotool failed: {0}")]
    Icotool(String),

    #[error("convert failed: {0}")]
    Convert(String),

    #[error("no icon size could be staged from {}", .0.display())]
    NoneStaged(PathBuf),
}

/// Windows resource type for icon groups
const ICON_GROUP_RESOURCE: &str = "14";

/// Extract the embedded icon group from `exe` into a .ico container
pub fn extract_ico(exe: &Path, work_dir: &Path) -> Result<PathBuf, IconError> {
    fs::create_dir_all(work_dir)?;
    let ico = work_dir.join("claude.ico");

    let output = Command::new("wrestool")
        .args(["-x", "-t", ICON_GROUP_RESOURCE, "-o"])
        .arg(&ico)
        .arg(exe)
        .output()
        .map_err(|e| IconError::Wrestool(format!("failed to run wrestool: {e}")))?;

    if !output.status.success() || !ico.exists() {
        return Err(IconError::Wrestool(
            String::from_utf8_lossy(&output.stderr).trim().to_string(),
        ));
    }
    Ok(ico)
}

/// Decompose the .ico container into individual raster frames
pub fn decompose_ico(ico: &Path, frames_dir: &Path) -> Result<(), IconError> {
    fs::create_dir_all(frames_dir)?;
    let output = Command::new("icotool")
        .args(["-x", "-o"])
        .arg(frames_dir)
        .arg(ico)
        .output()
        .map_err(|e| IconError::Icotool(format!("failed to run icotool: {e}")))?;

    if !output.status.success() {
        return Err(IconError::Icotool(
            String::from_utf8_lossy(&output.stderr).trim().to_string(),
        ));
    }
    Ok(())
}

/// Stage each target size into `icons_root` as
/// `<size>x<size>/apps/claude.png`. Missing sizes warn and are skipped;
/// only staging nothing at all is an error. Returns the staged count.
pub fn stage_sizes(frames_dir: &Path, icons_root: &Path) -> Result<usize, IconError> {
    let mut staged = 0;
    for size in crate::ICON_SIZES {
        let Some(frame) = find_frame(frames_dir, size)? else {
            report::warn(format!("no {size}x{size} icon frame found, skipping"));
            continue;
        };

        let dest = icons_root.join(format!("{size}x{size}/apps/claude.png"));
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent)?;
        }

        if frame.extension().is_some_and(|e| e == "png") {
            fs::copy(&frame, &dest)?;
        } else if let Err(e) = convert_frame(&frame, &dest) {
            report::warn(format!("could not convert {size}x{size} icon: {e}"));
            continue;
        }
        staged += 1;
    }

    if staged == 0 {
        return Err(IconError::NoneStaged(frames_dir.to_path_buf()));
    }
    Ok(staged)
}

/// icotool names frames like `claude_4_32x32x32.png`; match on the
/// `<size>x<size>` token.
fn find_frame(frames_dir: &Path, size: u32) -> Result<Option<PathBuf>, IconError> {
    let token = format!("{size}x{size}x");
    for entry in fs::read_dir(frames_dir)? {
        let entry = entry?;
        let name = entry.file_name().to_string_lossy().to_string();
        if name.contains(&token) && entry.path().is_file() {
            return Ok(Some(entry.path()));
        }
    }
    Ok(None)
}

/// Non-PNG frames go through ImageMagick
fn convert_frame(frame: &Path, dest: &Path) -> Result<(), IconError> {
    let output = Command::new("convert")
        .arg(frame)
        .arg(dest)
        .output()
        .map_err(|e| IconError::Convert(format!("failed to run convert: {e}")))?;
    if !output.status.success() {
        return Err(IconError::Convert(
            String::from_utf8_lossy(&output.stderr).trim().to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn touch_frame(dir: &Path, size: u32) {
        fs::write(
            dir.join(format!("claude_1_{size}x{size}x32.png")),
            b"\x89PNG",
        )
        .unwrap();
    }

    #[test]
    fn stages_every_size_that_has_a_frame() {
        let tmp = tempfile::tempdir().unwrap();
        let frames = tmp.path().join("frames");
        fs::create_dir_all(&frames).unwrap();
        for size in crate::ICON_SIZES {
            touch_frame(&frames, size);
        }

        let icons_root = tmp.path().join("hicolor");
        let staged = stage_sizes(&frames, &icons_root).unwrap();

        assert_eq!(staged, crate::ICON_SIZES.len());
        for size in crate::ICON_SIZES {
            assert!(
                icons_root
                    .join(format!("{size}x{size}/apps/claude.png"))
                    .exists()
            );
        }
    }

    #[test]
    fn one_missing_size_is_not_fatal() {
        let tmp = tempfile::tempdir().unwrap();
        let frames = tmp.path().join("frames");
        fs::create_dir_all(&frames).unwrap();
        for size in crate::ICON_SIZES {
            if size != 24 {
                touch_frame(&frames, size);
            }
        }

        let icons_root = tmp.path().join("hicolor");
        let staged = stage_sizes(&frames, &icons_root).unwrap();

        assert_eq!(staged, crate::ICON_SIZES.len() - 1);
        assert!(!icons_root.join("24x24/apps/claude.png").exists());
        assert!(icons_root.join("256x256/apps/claude.png").exists());
    }

    #[test]
    fn staging_nothing_is_fatal() {
        let tmp = tempfile::tempdir().unwrap();
        let frames = tmp.path().join("frames");
        fs::create_dir_all(&frames).unwrap();

        let icons_root = tmp.path().join("hicolor");
        assert!(matches!(
            stage_sizes(&frames, &icons_root),
            Err(IconError::NoneStaged(_))
        ));
    }
}
