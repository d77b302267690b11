//! FITS-style keyword headers, without a FITS dependency.
//!
//! Level-2 data reaches the library as a numeric array plus the keyword
//! header of the HDU it came from. Headers are represented as a JSON
//! object, which is what instrument pipelines dump them to.

use serde_json::{Map, Value};

use crate::types::{HelioError, HelioResult};

/// A FITS-style keyword header.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Header(Map<String, Value>);

impl Header {
    /// Create an empty header.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a header from a JSON object string.
    pub fn from_json(text: &str) -> HelioResult<Self> {
        let value: Value = serde_json::from_str(text)?;
        match value {
            Value::Object(map) => Ok(Self(map)),
            other => Err(HelioError::InvalidKeyword {
                keyword: "<root>".to_string(),
                reason: format!("expected a JSON object, got {other}"),
            }),
        }
    }

    /// Set a keyword value.
    pub fn set(&mut self, keyword: &str, value: Value) {
        self.0.insert(keyword.to_string(), value);
    }

    /// Whether the header carries a keyword.
    pub fn contains(&self, keyword: &str) -> bool {
        self.0.contains_key(keyword)
    }

    fn get(&self, keyword: &str) -> HelioResult<&Value> {
        self.0
            .get(keyword)
            .ok_or_else(|| HelioError::MissingKeyword(keyword.to_string()))
    }

    /// Get a keyword as a float.
    pub fn f64(&self, keyword: &str) -> HelioResult<f64> {
        let value = self.get(keyword)?;
        value.as_f64().ok_or_else(|| HelioError::InvalidKeyword {
            keyword: keyword.to_string(),
            reason: format!("expected a number, got {value}"),
        })
    }

    /// Get a keyword as an integer.
    pub fn i64(&self, keyword: &str) -> HelioResult<i64> {
        let value = self.get(keyword)?;
        value.as_i64().ok_or_else(|| HelioError::InvalidKeyword {
            keyword: keyword.to_string(),
            reason: format!("expected an integer, got {value}"),
        })
    }

    /// Get a keyword as a string.
    pub fn str(&self, keyword: &str) -> HelioResult<&str> {
        let value = self.get(keyword)?;
        value.as_str().ok_or_else(|| HelioError::InvalidKeyword {
            keyword: keyword.to_string(),
            reason: format!("expected a string, got {value}"),
        })
    }
}

impl From<Map<String, Value>> for Header {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}
