//! Data-analysis utilities for the SPICE imaging spectrometer:
//! detector noise budgets, instrument response, release catalogs, and
//! download caching.

pub mod cache;
pub mod catalog;
pub mod download;
pub mod header;
pub mod instrument;
pub mod metadata;
pub mod observation;
pub mod release;
pub mod stats;
pub mod study;
pub mod types;
pub mod uncertainty;

pub use cache::FileCache;
pub use catalog::{parse_timestamp, relative_path, Catalog, CatalogEntry};
pub use download::{DownloadOutcome, Downloader};
pub use header::Header;
pub use instrument::{Detector, Spice};
pub use metadata::{cache_file, download_file, enqueue_file, file_url, FileSource};
pub use observation::{NoiseComponents, NoiseEstimate, Observation};
pub use release::Release;
pub use stats::{rss, rss_axis, sigma_clip, CenterFunc, SigmaClipConfig, SigmaClipResult};
pub use study::Study;
pub use types::{HelioError, HelioResult};
pub use uncertainty::noise_budget;
