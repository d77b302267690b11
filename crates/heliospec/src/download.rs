//! Batched file downloads into a local directory tree.

use std::path::{Path, PathBuf};

use reqwest::blocking::Client;

use crate::types::{HelioError, HelioResult};

/// One queued download.
#[derive(Debug, Clone)]
pub struct DownloadJob {
    pub url: String,
    pub directory: PathBuf,
    pub filename: String,
}

/// Result of flushing a download queue.
#[derive(Debug, Default)]
pub struct DownloadOutcome {
    /// Local paths of the files now on disk.
    pub done: Vec<PathBuf>,
    /// URLs that failed, with their errors.
    pub errors: Vec<(String, HelioError)>,
}

impl DownloadOutcome {
    pub fn is_success(&self) -> bool {
        self.errors.is_empty()
    }
}

/// A queue of files to download sequentially.
#[derive(Debug)]
pub struct Downloader {
    client: Client,
    overwrite: bool,
    queue: Vec<DownloadJob>,
}

impl Downloader {
    /// A downloader; with `overwrite` unset, files already on disk are
    /// kept as they are.
    pub fn new(client: Client, overwrite: bool) -> Self {
        Self {
            client,
            overwrite,
            queue: Vec::new(),
        }
    }

    /// Queue a file for download into a directory.
    pub fn enqueue_file(
        &mut self,
        url: impl Into<String>,
        directory: impl Into<PathBuf>,
        filename: impl Into<String>,
    ) {
        self.queue.push(DownloadJob {
            url: url.into(),
            directory: directory.into(),
            filename: filename.into(),
        });
    }

    /// Number of queued downloads.
    pub fn queued(&self) -> usize {
        self.queue.len()
    }

    /// Download every queued file, consuming the queue.
    pub fn download(&mut self) -> DownloadOutcome {
        let jobs = std::mem::take(&mut self.queue);
        let mut outcome = DownloadOutcome::default();
        for job in jobs {
            match fetch_to(
                &self.client,
                &job.url,
                &job.directory,
                &job.filename,
                self.overwrite,
            ) {
                Ok(path) => outcome.done.push(path),
                Err(err) => {
                    tracing::warn!(url = %job.url, error = %err, "download failed");
                    outcome.errors.push((job.url, err));
                }
            }
        }
        outcome
    }
}

/// Download a single URL into `directory/filename`, creating the directory
/// as needed. An existing file is kept unless `overwrite` is set.
pub fn fetch_to(
    client: &Client,
    url: &str,
    directory: &Path,
    filename: &str,
    overwrite: bool,
) -> HelioResult<PathBuf> {
    std::fs::create_dir_all(directory)?;
    let destination = directory.join(filename);
    if destination.exists() && !overwrite {
        tracing::debug!(path = %destination.display(), "already on disk, skipping");
        return Ok(destination);
    }
    let response = client.get(url).send()?;
    if !response.status().is_success() {
        return Err(HelioError::Download(format!(
            "HTTP {} for {url}",
            response.status()
        )));
    }
    let bytes = response.bytes()?;
    std::fs::write(&destination, &bytes)?;
    tracing::info!(url, path = %destination.display(), size = bytes.len(), "downloaded");
    Ok(destination)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enqueue() {
        let mut downloader = Downloader::new(Client::new(), false);
        assert_eq!(downloader.queued(), 0);
        downloader.enqueue_file("https://archive.invalid/a.fits", "/tmp", "a.fits");
        downloader.enqueue_file("https://archive.invalid/b.fits", "/tmp", "b.fits");
        assert_eq!(downloader.queued(), 2);
    }

    #[test]
    fn test_existing_file_is_kept() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.fits"), b"existing").unwrap();

        // the host does not resolve, so this only passes by skipping
        let client = Client::new();
        let path = fetch_to(
            &client,
            "https://archive.invalid/a.fits",
            dir.path(),
            "a.fits",
            false,
        )
        .unwrap();
        assert_eq!(std::fs::read(path).unwrap(), b"existing");
    }

    #[test]
    fn test_download_drains_queue_and_reports_errors() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.fits"), b"existing").unwrap();

        let mut downloader = Downloader::new(Client::new(), false);
        downloader.enqueue_file("https://archive.invalid/a.fits", dir.path(), "a.fits");
        downloader.enqueue_file("https://archive.invalid/b.fits", dir.path(), "b.fits");
        let outcome = downloader.download();
        assert_eq!(downloader.queued(), 0);
        assert_eq!(outcome.done.len(), 1);
        assert_eq!(outcome.errors.len(), 1);
        assert!(!outcome.is_success());
        assert!(outcome.errors[0].0.ends_with("b.fits"));
    }
}
