//! Where the two wide tables come from.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::USER_AGENT;

use super::error::LoadError;
use super::loader;
use super::model::RawTable;

/// Default location of the cancer mortality table (ICD-10 coded deaths).
pub const MORTALITY_URL: &str =
    "https://raw.githubusercontent.com/hms-dbmi/bmi706-2022/main/cancer_data/cancer_ICD10.csv";

/// Default location of the population table.
pub const POPULATION_URL: &str =
    "https://raw.githubusercontent.com/hms-dbmi/bmi706-2022/main/cancer_data/population.csv";

/// A remote CSV endpoint or a local file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    Remote(String),
    File(PathBuf),
}

impl FromStr for Source {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err("source must not be empty".to_string());
        }
        if s.starts_with("http://") || s.starts_with("https://") {
            Ok(Source::Remote(s.to_string()))
        } else {
            Ok(Source::File(PathBuf::from(s)))
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Source::Remote(url) => f.write_str(url),
            Source::File(path) => write!(f, "{}", path.display()),
        }
    }
}

/// Fetches sources. One HTTP client is shared by both downloads.
pub struct Fetcher {
    client: Client,
}

impl Fetcher {
    pub fn new(timeout: Duration) -> Result<Self, LoadError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }

    /// Read and decode a source into a wide table. No retries.
    pub fn fetch(&self, source: &Source) -> Result<RawTable, LoadError> {
        match source {
            Source::Remote(url) => self.fetch_remote(url),
            Source::File(path) => loader::load_file(path),
        }
    }

    fn fetch_remote(&self, url: &str) -> Result<RawTable, LoadError> {
        log::debug!("GET {url}");
        let response = self
            .client
            .get(url)
            .header(
                USER_AGENT,
                format!("{}/{}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION")),
            )
            .send()?;

        let status = response.status();
        if !status.is_success() {
            return Err(LoadError::HttpStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response.bytes()?;
        log::info!("Fetched {} bytes from {url}", body.len());
        loader::decode_csv(body.as_ref())
    }
}
