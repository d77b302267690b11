//! The per-release file catalog.
//!
//! Each data release publishes a `catalog.csv` with one row per FITS file,
//! using FITS keyword names as column headers.

use std::collections::BTreeSet;
use std::io::Read;
use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use reqwest::blocking::Client;
use serde::{Deserialize, Deserializer, Serialize};

use crate::cache::FileCache;
use crate::release::Release;
use crate::types::{HelioError, HelioResult};

/// Columns a table must have to qualify as a file catalog.
pub const REQUIRED_COLUMNS: [&str; 35] = [
    "NAXIS1", "NAXIS2", "NAXIS3", "NAXIS4", "OBT_BEG", "LEVEL", "FILENAME", "DATE-BEG",
    "SPIOBSID", "RASTERNO", "STUDYTYP", "MISOSTUD", "XPOSURE", "CRVAL1", "CDELT1", "CRVAL2",
    "CDELT2", "STP", "DSUN_AU", "CROTA", "OBS_ID", "SOOPNAME", "SOOPTYPE", "NWIN", "DARKMAP",
    "COMPLETE", "SLIT_WID", "DATE", "PARENT", "HGLT_OBS", "HGLN_OBS", "PRSTEP1", "PRPROC1",
    "PRPVER1", "PRPARA1",
];

/// One file entry of a release catalog.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogEntry {
    #[serde(rename = "NAXIS1")]
    pub naxis1: Option<i64>,
    #[serde(rename = "NAXIS2")]
    pub naxis2: Option<i64>,
    #[serde(rename = "NAXIS3")]
    pub naxis3: Option<i64>,
    #[serde(rename = "NAXIS4")]
    pub naxis4: Option<i64>,
    #[serde(rename = "OBT_BEG")]
    pub obt_beg: Option<f64>,
    #[serde(rename = "LEVEL")]
    pub level: String,
    #[serde(rename = "FILENAME")]
    pub filename: String,
    #[serde(rename = "DATE-BEG", deserialize_with = "de_opt_timestamp")]
    pub date_beg: Option<NaiveDateTime>,
    #[serde(rename = "SPIOBSID")]
    pub spiobsid: Option<i64>,
    #[serde(rename = "RASTERNO")]
    pub rasterno: Option<i64>,
    #[serde(rename = "STUDYTYP")]
    pub studytyp: Option<String>,
    #[serde(rename = "MISOSTUD")]
    pub misostud: Option<String>,
    #[serde(rename = "XPOSURE")]
    pub xposure: Option<f64>,
    #[serde(rename = "CRVAL1")]
    pub crval1: Option<f64>,
    #[serde(rename = "CDELT1")]
    pub cdelt1: Option<f64>,
    #[serde(rename = "CRVAL2")]
    pub crval2: Option<f64>,
    #[serde(rename = "CDELT2")]
    pub cdelt2: Option<f64>,
    #[serde(rename = "STP")]
    pub stp: Option<i64>,
    #[serde(rename = "DSUN_AU")]
    pub dsun_au: Option<f64>,
    #[serde(rename = "CROTA")]
    pub crota: Option<f64>,
    #[serde(rename = "OBS_ID")]
    pub obs_id: Option<String>,
    #[serde(rename = "SOOPNAME")]
    pub soopname: Option<String>,
    #[serde(rename = "SOOPTYPE")]
    pub sooptype: Option<String>,
    #[serde(rename = "NWIN")]
    pub nwin: Option<i64>,
    #[serde(rename = "DARKMAP")]
    pub darkmap: Option<i64>,
    #[serde(rename = "COMPLETE")]
    pub complete: Option<String>,
    #[serde(rename = "SLIT_WID")]
    pub slit_wid: Option<f64>,
    #[serde(rename = "DATE", deserialize_with = "de_opt_timestamp")]
    pub date: Option<NaiveDateTime>,
    #[serde(rename = "PARENT")]
    pub parent: Option<String>,
    #[serde(rename = "HGLT_OBS")]
    pub hglt_obs: Option<f64>,
    #[serde(rename = "HGLN_OBS")]
    pub hgln_obs: Option<f64>,
    #[serde(rename = "PRSTEP1")]
    pub prstep1: Option<String>,
    #[serde(rename = "PRPROC1")]
    pub prproc1: Option<String>,
    #[serde(rename = "PRPVER1")]
    pub prpver1: Option<String>,
    #[serde(rename = "PRPARA1")]
    pub prpara1: Option<String>,
    #[serde(rename = "TIMAQUTC", default, deserialize_with = "de_opt_timestamp")]
    pub timaqutc: Option<NaiveDateTime>,
    #[serde(rename = "FILE_PATH", default)]
    pub file_path: Option<String>,
}

/// A file catalog: the parsed rows of a release `catalog.csv`.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    entries: Vec<CatalogEntry>,
}

impl Catalog {
    /// An empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// A catalog from rows already in memory.
    pub fn from_entries(entries: Vec<CatalogEntry>) -> Self {
        Self { entries }
    }

    /// Read a catalog from CSV text or any other reader.
    ///
    /// Empty input yields an empty catalog; input with headers must carry
    /// every required column.
    pub fn read_csv<R: Read>(reader: R) -> HelioResult<Self> {
        let mut csv_reader = csv::Reader::from_reader(reader);
        let headers = csv_reader.headers()?.clone();
        if headers.is_empty() {
            return Ok(Self::new());
        }
        validate_columns(&headers)?;
        let mut entries = Vec::new();
        for record in csv_reader.deserialize() {
            entries.push(record?);
        }
        Ok(Self { entries })
    }

    /// Read a catalog from a CSV file on disk.
    pub fn read_csv_path(path: &Path) -> HelioResult<Self> {
        if !path.exists() {
            return Err(HelioError::Catalog(format!(
                "file {} does not exist",
                path.display()
            )));
        }
        let file = std::fs::File::open(path)?;
        Self::read_csv(file)
    }

    /// Fetch the catalog of a release through the download cache.
    ///
    /// A `None` or `"latest"` tag resolves to the latest published release.
    pub fn from_release(
        client: &Client,
        cache: &FileCache,
        tag: Option<&str>,
        update_cache: bool,
    ) -> HelioResult<Self> {
        let release = match tag {
            None | Some("latest") => Release::latest(client)?,
            Some(tag) => Release::new(tag),
        };
        if !release.exists(client)? {
            return Err(HelioError::Release(format!(
                "release {} is not accessible at {}",
                release.tag,
                release.url()
            )));
        }
        let path = cache.fetch(client, &release.catalog_url(), update_cache)?;
        Self::read_csv_path(&path)
    }

    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, CatalogEntry> {
        self.entries.iter()
    }

    /// The entry of a given level whose `DATE-BEG` is nearest to a target
    /// date. Entries without `DATE-BEG` are skipped; ties resolve to the
    /// earlier entry in catalog order.
    pub fn find_file(&self, date: NaiveDateTime, level: &str) -> Option<&CatalogEntry> {
        self.entries
            .iter()
            .filter(|e| e.level == level)
            .filter_map(|e| e.date_beg.map(|d| (e, (d - date).abs())))
            .min_by_key(|(_, distance)| *distance)
            .map(|(entry, _)| entry)
    }

    /// Entries whose `DATE-BEG` falls inside `[start, end]`.
    pub fn in_date_range(&self, start: NaiveDateTime, end: NaiveDateTime) -> Vec<&CatalogEntry> {
        self.entries
            .iter()
            .filter(|e| e.date_beg.is_some_and(|d| d >= start && d <= end))
            .collect()
    }

    /// Entries matching an arbitrary predicate.
    pub fn select<F>(&self, predicate: F) -> Vec<&CatalogEntry>
    where
        F: Fn(&CatalogEntry) -> bool,
    {
        self.entries.iter().filter(|e| predicate(e)).collect()
    }
}

impl<'a> IntoIterator for &'a Catalog {
    type Item = &'a CatalogEntry;
    type IntoIter = std::slice::Iter<'a, CatalogEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

/// File path relative to the "fits" directory of the file archive:
/// `level{n}/yyyy/mm/dd`. Requires `DATE-BEG`, so does not work for L0.
pub fn relative_path(entry: &CatalogEntry) -> HelioResult<PathBuf> {
    let date = entry.date_beg.ok_or_else(|| {
        HelioError::Catalog(format!("entry {} has no DATE-BEG", entry.filename))
    })?;
    let level_digit = entry.level.chars().nth(1).ok_or_else(|| {
        HelioError::Catalog(format!("entry {} has no level digit", entry.filename))
    })?;
    Ok(PathBuf::from(format!(
        "level{}/{}",
        level_digit,
        date.format("%Y/%m/%d")
    )))
}

fn validate_columns(headers: &csv::StringRecord) -> HelioResult<()> {
    let present: BTreeSet<&str> = headers.iter().collect();
    let missing: Vec<&str> = REQUIRED_COLUMNS
        .iter()
        .copied()
        .filter(|c| !present.contains(c))
        .collect();
    if missing.is_empty() {
        Ok(())
    } else {
        Err(HelioError::Catalog(format!(
            "missing required columns: {}",
            missing.join(", ")
        )))
    }
}

/// Parse a catalog timestamp: RFC 3339, ISO 8601 without offset, or a bare
/// date.
pub fn parse_timestamp(text: &str) -> HelioResult<NaiveDateTime> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Ok(dt.naive_utc());
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(text, format) {
            return Ok(dt);
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(text, "%Y-%m-%d") {
        if let Some(dt) = date.and_hms_opt(0, 0, 0) {
            return Ok(dt);
        }
    }
    Err(HelioError::Catalog(format!("unparseable timestamp: {text}")))
}

/// Missing values ("MISSING", "NaT" or empty) become `None`.
fn de_opt_timestamp<'de, D>(deserializer: D) -> Result<Option<NaiveDateTime>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    match raw.as_deref() {
        None | Some("") | Some("MISSING") | Some("NaT") => Ok(None),
        Some(text) => parse_timestamp(text)
            .map(Some)
            .map_err(serde::de::Error::custom),
    }
}
