//! City data model - the JSON snapshot produced by the extractor
//!
//! Schema:
//! ```json
//! { "packages": [ { "name": "a.b",
//!     "classes": [ { "name": "X", "linesOfCode": 150,
//!        "gitMetadata": { "commits": 3, "authors": 1, "lastModified": "2024-01-01T00:00:00Z" } } ] } ] }
//! ```
//!
//! Numeric fields are read permissively: missing, negative or non-numeric
//! values become 0. A `classes` that is not an array reads as empty, a
//! `gitMetadata` that is not an object reads as absent, and non-object
//! package or class entries are skipped. Only a missing or non-array
//! `packages` key is fatal.

use chrono::{DateTime, NaiveDate, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DataError {
    #[error("Invalid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),
    #[error("Missing required `packages` array")]
    MissingPackages,
    #[error("`packages` must be an array, found {0}")]
    PackagesNotArray(&'static str),
}

/// Git history summary for one class
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GitMetadata {
    #[serde(default, deserialize_with = "lenient_count")]
    pub commits: u64,
    #[serde(default, deserialize_with = "lenient_count")]
    pub authors: u64,
    #[serde(
        default,
        deserialize_with = "lenient_timestamp",
        skip_serializing_if = "Option::is_none"
    )]
    pub last_modified: Option<DateTime<Utc>>,
}

/// One class (or class-like declaration) from the source tree
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassRecord {
    #[serde(default, deserialize_with = "lenient_string")]
    pub name: String,
    #[serde(default, deserialize_with = "lenient_count")]
    pub lines_of_code: u64,
    #[serde(
        default,
        deserialize_with = "lenient_metadata",
        skip_serializing_if = "Option::is_none"
    )]
    pub git_metadata: Option<GitMetadata>,
}

/// A named group of classes
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PackageRecord {
    #[serde(default, deserialize_with = "lenient_string")]
    pub name: String,
    #[serde(default, deserialize_with = "lenient_records")]
    pub classes: Vec<ClassRecord>,
}

impl PackageRecord {
    /// Sum of lines of code across all classes
    pub fn mass(&self) -> u64 {
        self.classes.iter().map(|c| c.lines_of_code).sum()
    }
}

/// Back-reference from a placement to its source class
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct ClassRef {
    pub package: usize,
    pub class: usize,
}

impl ClassRef {
    pub fn new(package: usize, class: usize) -> Self {
        Self { package, class }
    }
}

/// The whole dataset
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CityData {
    #[serde(default, deserialize_with = "lenient_records")]
    pub packages: Vec<PackageRecord>,
}

impl CityData {
    /// Parse a snapshot, failing fast when `packages` is missing or malformed
    pub fn from_json_str(text: &str) -> Result<Self, DataError> {
        let value: Value = serde_json::from_str(text)?;
        Self::from_value(value)
    }

    pub fn from_value(value: Value) -> Result<Self, DataError> {
        match value.get("packages") {
            None | Some(Value::Null) => return Err(DataError::MissingPackages),
            Some(Value::Array(_)) => {}
            Some(other) => return Err(DataError::PackagesNotArray(json_type_name(other))),
        }
        Ok(serde_json::from_value(value)?)
    }

    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }

    pub fn class_count(&self) -> usize {
        self.packages.iter().map(|p| p.classes.len()).sum()
    }

    pub fn total_loc(&self) -> u64 {
        self.packages.iter().map(PackageRecord::mass).sum()
    }

    /// Look up a class together with its package
    pub fn class(&self, id: ClassRef) -> Option<(&PackageRecord, &ClassRecord)> {
        let package = self.packages.get(id.package)?;
        let class = package.classes.get(id.class)?;
        Some((package, class))
    }

    /// All classes in input order
    pub fn classes(&self) -> impl Iterator<Item = (ClassRef, &PackageRecord, &ClassRecord)> {
        self.packages.iter().enumerate().flat_map(|(pi, package)| {
            package
                .classes
                .iter()
                .enumerate()
                .map(move |(ci, class)| (ClassRef::new(pi, ci), package, class))
        })
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Coerce any JSON value into a non-negative integer
fn coerce_count(value: &Value) -> u64 {
    let from_float = |f: f64| if f.is_finite() && f > 0.0 { f as u64 } else { 0 };
    match value {
        Value::Number(n) => n.as_u64().unwrap_or_else(|| n.as_f64().map(from_float).unwrap_or(0)),
        Value::String(s) => s.trim().parse::<f64>().map(from_float).unwrap_or(0),
        _ => 0,
    }
}

fn lenient_count<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(coerce_count(&value))
}

fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::String(s) => s,
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => String::new(),
    })
}

/// Keep the object entries of an array; anything else reads as empty
fn lenient_records<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Array(items) => items
            .into_iter()
            .filter(Value::is_object)
            .filter_map(|item| serde_json::from_value(item).ok())
            .collect(),
        _ => Vec::new(),
    })
}

fn lenient_metadata<'de, D>(deserializer: D) -> Result<Option<GitMetadata>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Object(_) => serde_json::from_value(value).ok(),
        _ => None,
    })
}

/// Parse RFC 3339 timestamps, falling back to bare dates at midnight UTC
pub fn parse_timestamp(text: &str) -> Option<DateTime<Utc>> {
    let text = text.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(text) {
        return Some(ts.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
}

fn lenient_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::String(s) => parse_timestamp(&s),
        _ => None,
    })
}
