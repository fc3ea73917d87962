//! File download utilities

use indicatif::{ProgressBar, ProgressStyle};
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DownloadError {
    #[error("HTTP request failed: {0}")]
    HttpError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Download failed: {0}")]
    Failed(String),
}

/// Network seam for the pipeline. Steps only see this trait, so tests can
/// substitute a recording stub and observe whether a fetch happened at all.
pub trait Fetcher {
    fn fetch(&self, url: &str, dest: &Path) -> Result<(), DownloadError>;
}

/// Real HTTP fetcher backed by ureq
pub struct HttpFetcher {
    pub show_progress: bool,
}

impl Fetcher for HttpFetcher {
    fn fetch(&self, url: &str, dest: &Path) -> Result<(), DownloadError> {
        download_file(url, dest, self.show_progress)
    }
}

/// Download `url` to `dest` unless the file is already there.
///
/// Returns true when a fetch actually ran. There is no checksum on the
/// upstream payload, so an existing file is trusted as-is.
pub fn ensure_downloaded(
    fetcher: &dyn Fetcher,
    url: &str,
    dest: &Path,
) -> Result<bool, DownloadError> {
    if dest.exists() {
        return Ok(false);
    }
    fetcher.fetch(url, dest)?;
    Ok(true)
}

/// Download a file with progress bar
pub fn download_file(url: &str, dest: &Path, show_progress: bool) -> Result<(), DownloadError> {
    let mut resp = ureq::get(url)
        .header("User-Agent", crate::APP_NAME)
        .call()
        .map_err(|e| DownloadError::HttpError(e.to_string()))?;

    let total_size = resp
        .headers()
        .get("Content-Length")
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.parse::<u64>().ok())
        .unwrap_or(0);

    let pb = if show_progress && total_size > 0 {
        let pb = ProgressBar::new(total_size);
        pb.set_style(ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({eta})")
            .unwrap()
            .progress_chars("#>-"));
        Some(pb)
    } else {
        None
    };

    let mut out = File::create(dest)?;
    let mut reader = resp.body_mut().with_config().limit(1_000_000_000).reader();
    let mut buffer = vec![0u8; 8192];
    let mut downloaded = 0u64;

    loop {
        let n = reader.read(&mut buffer)?;
        if n == 0 {
            break;
        }
        out.write_all(&buffer[..n])?;
        downloaded += n as u64;

        if let Some(ref pb) = pb {
            pb.set_position(downloaded);
        }
    }

    if let Some(pb) = pb {
        pb.finish_with_message("Download complete");
    }

    Ok(())
}

/// Download content to string
pub fn download_string(url: &str) -> Result<String, DownloadError> {
    let mut resp = ureq::get(url)
        .header("User-Agent", crate::APP_NAME)
        .call()
        .map_err(|e| DownloadError::HttpError(e.to_string()))?;

    let content = resp
        .body_mut()
        .read_to_string()
        .map_err(|e| DownloadError::Failed(e.to_string()))?;

    Ok(content)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::fs;

    struct RecordingFetcher {
        calls: Cell<usize>,
    }

    impl Fetcher for RecordingFetcher {
        fn fetch(&self, _url: &str, dest: &Path) -> Result<(), DownloadError> {
            self.calls.set(self.calls.get() + 1);
            fs::write(dest, b"payload")?;
            Ok(())
        }
    }

    #[test]
    fn fetches_when_file_is_absent() {
        let tmp = tempfile::tempdir().unwrap();
        let dest = tmp.path().join("setup.exe");
        let fetcher = RecordingFetcher { calls: Cell::new(0) };

        let fetched = ensure_downloaded(&fetcher, "http://example/setup.exe", &dest).unwrap();

        assert!(fetched);
        assert_eq!(fetcher.calls.get(), 1);
        assert_eq!(fs::read(&dest).unwrap(), b"payload");
    }

    #[test]
    fn skips_fetch_when_file_already_exists() {
        let tmp = tempfile::tempdir().unwrap();
        let dest = tmp.path().join("setup.exe");
        fs::write(&dest, b"stale but trusted").unwrap();
        let fetcher = RecordingFetcher { calls: Cell::new(0) };

        let fetched = ensure_downloaded(&fetcher, "http://example/setup.exe", &dest).unwrap();

        assert!(!fetched);
        assert_eq!(fetcher.calls.get(), 0);
        assert_eq!(fs::read(&dest).unwrap(), b"stale but trusted");
    }
}
