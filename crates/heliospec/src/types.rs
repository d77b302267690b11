//! Crate-wide error type and result alias.

/// Errors that can occur in the heliospec library.
#[derive(thiserror::Error, Debug)]
pub enum HelioError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Missing header keyword: {0}")]
    MissingKeyword(String),

    #[error("Invalid header keyword {keyword}: {reason}")]
    InvalidKeyword { keyword: String, reason: String },

    #[error("Unsupported data level: expected {expected}, got {got}")]
    UnsupportedLevel { expected: String, got: String },

    #[error("Catalog error: {0}")]
    Catalog(String),

    #[error("Release error: {0}")]
    Release(String),

    #[error("Download error: {0}")]
    Download(String),
}

/// Convenience result type.
pub type HelioResult<T> = Result<T, HelioError>;
