//! Per-file operations on catalog entries: URLs, caching, downloads.

use std::path::{Path, PathBuf};

use reqwest::blocking::Client;

use crate::cache::FileCache;
use crate::catalog::CatalogEntry;
use crate::download::{fetch_to, Downloader};
use crate::release::Release;
use crate::types::{HelioError, HelioResult};

/// SOAR TAP endpoint used when no archive location is given.
pub const SOAR_DATA_URL: &str = "http://soar.esac.esa.int/soar-sl-tap/data";

/// Where to fetch archive files from.
#[derive(Debug, Clone)]
pub enum FileSource {
    /// A tagged data release.
    Release(Release),
    /// Some other online file tree.
    BaseUrl(String),
    /// The SOAR product query fallback.
    Soar,
}

/// URL of a catalog entry under a file source.
///
/// There is no guarantee that the URL corresponds to an existing location.
pub fn file_url(entry: &CatalogEntry, source: &FileSource) -> HelioResult<String> {
    match source {
        FileSource::Release(release) => url_under_base(entry, &release.url()),
        FileSource::BaseUrl(base_url) => url_under_base(entry, base_url),
        FileSource::Soar => Ok(format!(
            "{SOAR_DATA_URL}?retrieval_type=ALL_PRODUCTS\
             &QUERY=SELECT+filepath,filename+FROM+soar.v_sc_repository_file\
             +WHERE+filename='{}'",
            entry.filename
        )),
    }
}

fn url_under_base(entry: &CatalogEntry, base_url: &str) -> HelioResult<String> {
    let file_path = entry.file_path.as_deref().ok_or_else(|| {
        HelioError::Catalog(format!("entry {} has no FILE_PATH", entry.filename))
    })?;
    let separator = if base_url.ends_with('/') { "" } else { "/" };
    Ok(format!(
        "{base_url}{separator}{file_path}/{}",
        entry.filename
    ))
}

/// Put a catalog entry's file in the local disk cache and return its path.
pub fn cache_file(
    entry: &CatalogEntry,
    client: &Client,
    cache: &FileCache,
    source: &FileSource,
    update: bool,
) -> HelioResult<PathBuf> {
    let url = file_url(entry, source)?;
    cache.fetch(client, &url, update)
}

/// Destination directory for an entry: the archive tree under `base_dir`
/// when `keep_tree` is set, `base_dir` itself otherwise.
fn destination(entry: &CatalogEntry, base_dir: &Path, keep_tree: bool) -> HelioResult<PathBuf> {
    if keep_tree {
        let file_path = entry.file_path.as_deref().ok_or_else(|| {
            HelioError::Catalog(format!("entry {} has no FILE_PATH", entry.filename))
        })?;
        Ok(base_dir.join(file_path))
    } else {
        Ok(base_dir.to_path_buf())
    }
}

/// Queue a catalog entry's file on a [`Downloader`] for a later batch
/// download.
pub fn enqueue_file(
    entry: &CatalogEntry,
    downloader: &mut Downloader,
    base_dir: &Path,
    source: &FileSource,
    keep_tree: bool,
) -> HelioResult<()> {
    let url = file_url(entry, source)?;
    let directory = destination(entry, base_dir, keep_tree)?;
    downloader.enqueue_file(url, directory, entry.filename.clone());
    Ok(())
}

/// Download a catalog entry's file under `base_dir`, optionally keeping
/// the `level/yyyy/mm/dd` tree structure. Files already on disk are kept.
pub fn download_file(
    entry: &CatalogEntry,
    client: &Client,
    base_dir: &Path,
    source: &FileSource,
    keep_tree: bool,
) -> HelioResult<PathBuf> {
    let url = file_url(entry, source)?;
    let directory = destination(entry, base_dir, keep_tree)?;
    fetch_to(client, &url, &directory, &entry.filename, false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Catalog;
    use crate::catalog::REQUIRED_COLUMNS;

    fn entry() -> CatalogEntry {
        let header = REQUIRED_COLUMNS.join(",") + ",FILE_PATH";
        let row = "12,100,41,1,0.0,L2,solo_L2_spice-n-exp_20211204T120022_V02.fits,\
                   2021-12-04T12:00:22,117440512,0,Standard,MIN,10.0,0.0,1.0,0.0,1.0,122,0.55,\
                   0.0,SSTE_T2,none,none,8,0,T,4.0,2023-01-01T00:00:00,parent.fits,2.1,-12.5,\
                   compression,jpeg,1.0,darkonly,level2/2021/12/04";
        let text = format!("{header}\n{row}");
        Catalog::read_csv(text.as_bytes()).unwrap().entries()[0].clone()
    }

    #[test]
    fn test_file_url_release() {
        let source = FileSource::Release(Release::new("2.0"));
        let url = file_url(&entry(), &source).unwrap();
        assert!(url.ends_with(
            "release-2.0/level2/2021/12/04/solo_L2_spice-n-exp_20211204T120022_V02.fits"
        ));
    }

    #[test]
    fn test_file_url_base_url() {
        let source = FileSource::BaseUrl("https://example.org/fits".to_string());
        let url = file_url(&entry(), &source).unwrap();
        assert_eq!(
            url,
            "https://example.org/fits/level2/2021/12/04/\
             solo_L2_spice-n-exp_20211204T120022_V02.fits"
        );
        // trailing slash does not double up
        let source = FileSource::BaseUrl("https://example.org/fits/".to_string());
        assert_eq!(file_url(&entry(), &source).unwrap(), url);
    }

    #[test]
    fn test_file_url_soar() {
        let url = file_url(&entry(), &FileSource::Soar).unwrap();
        assert!(url.starts_with(SOAR_DATA_URL));
        assert!(url.contains("filename='solo_L2_spice-n-exp_20211204T120022_V02.fits'"));
    }

    #[test]
    fn test_file_url_requires_file_path() {
        let mut entry = entry();
        entry.file_path = None;
        let source = FileSource::BaseUrl("https://example.org/fits".to_string());
        assert!(file_url(&entry, &source).is_err());
    }

    #[test]
    fn test_enqueue_keeps_tree() {
        let entry = entry();
        let mut downloader = Downloader::new(Client::new(), false);
        let source = FileSource::Release(Release::new("2.0"));
        enqueue_file(&entry, &mut downloader, Path::new("/data"), &source, true).unwrap();
        assert_eq!(downloader.queued(), 1);
    }

    #[test]
    fn test_destination() {
        let entry = entry();
        let tree = destination(&entry, Path::new("/data"), true).unwrap();
        assert_eq!(tree, PathBuf::from("/data/level2/2021/12/04"));
        let flat = destination(&entry, Path::new("/data"), false).unwrap();
        assert_eq!(flat, PathBuf::from("/data"));
    }

    #[test]
    fn test_batch_download_of_enqueued_entries() {
        let dir = tempfile::tempdir().unwrap();
        let entry = entry();
        let tree = dir.path().join("level2/2021/12/04");
        std::fs::create_dir_all(&tree).unwrap();
        std::fs::write(tree.join(&entry.filename), b"existing").unwrap();

        let mut downloader = Downloader::new(Client::new(), false);
        let source = FileSource::Release(Release::new("2.0"));
        enqueue_file(&entry, &mut downloader, dir.path(), &source, true).unwrap();
        let outcome = downloader.download();
        assert!(outcome.is_success());
        assert_eq!(outcome.done.len(), 1);
        assert_eq!(std::fs::read(&outcome.done[0]).unwrap(), b"existing");
    }

    #[test]
    fn test_download_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let entry = entry();
        let tree = dir.path().join("level2/2021/12/04");
        std::fs::create_dir_all(&tree).unwrap();
        std::fs::write(tree.join(&entry.filename), b"existing").unwrap();

        let source = FileSource::Release(Release::new("2.0"));
        let path = download_file(&entry, &Client::new(), dir.path(), &source, true).unwrap();
        assert_eq!(std::fs::read(path).unwrap(), b"existing");
    }
}
