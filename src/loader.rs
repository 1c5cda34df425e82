//! Dataset loading from a URL or a local file
//!
//! The viewer starts from a configured source (usually the JSON served next
//! to the web page) and falls back to a local file when that fails.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;

use crate::model::{CityData, DataError};

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("request to {url} failed: {source}")]
    Network {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} returned status {status}")]
    Status { url: String, status: u16 },

    #[error("could not read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid dataset: {0}")]
    Data(#[from] DataError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataSource {
    Url(String),
    File(PathBuf),
}

impl FromStr for DataSource {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.starts_with("http://") || s.starts_with("https://") {
            Ok(DataSource::Url(s.to_string()))
        } else {
            Ok(DataSource::File(PathBuf::from(s)))
        }
    }
}

impl fmt::Display for DataSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataSource::Url(url) => f.write_str(url),
            DataSource::File(path) => write!(f, "{}", path.display()),
        }
    }
}

pub async fn fetch(url: &str) -> Result<CityData, LoadError> {
    tracing::debug!("Fetching dataset from: {}", url);

    let network = |source| LoadError::Network { url: url.to_string(), source };
    let client = reqwest::Client::new();
    let response = client
        .get(url)
        .header("User-Agent", "CodeCity/0.1")
        .send()
        .await
        .map_err(network)?;

    if !response.status().is_success() {
        return Err(LoadError::Status {
            url: url.to_string(),
            status: response.status().as_u16(),
        });
    }

    let body = response.text().await.map_err(network)?;
    tracing::debug!("Downloaded {} bytes of city data", body.len());
    Ok(CityData::from_json_str(&body)?)
}

pub fn read_file(path: &Path) -> Result<CityData, LoadError> {
    let text = std::fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(CityData::from_json_str(&text)?)
}

pub async fn load(source: &DataSource) -> Result<CityData, LoadError> {
    let data = match source {
        DataSource::Url(url) => fetch(url).await?,
        DataSource::File(path) => read_file(path)?,
    };
    tracing::info!(
        "Loaded {} packages, {} classes from {}",
        data.packages.len(),
        data.class_count(),
        source
    );
    Ok(data)
}

/// Try `primary`, then `fallback`. The error returned is the primary's when
/// there is no fallback, otherwise the fallback's.
pub async fn load_with_fallback(
    primary: &DataSource,
    fallback: Option<&Path>,
) -> Result<(CityData, DataSource), LoadError> {
    match load(primary).await {
        Ok(data) => Ok((data, primary.clone())),
        Err(e) => {
            let Some(path) = fallback else {
                return Err(e);
            };
            tracing::warn!("Could not load {}: {}. Trying {}", primary, e, path.display());
            let source = DataSource::File(path.to_path_buf());
            let data = load(&source).await?;
            Ok((data, source))
        }
    }
}
