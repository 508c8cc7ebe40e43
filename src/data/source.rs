//! Where a table comes from: a local file, an HTTP(S) URL, or stdin

use crate::errors::{OutbreakError, Result};
use async_trait::async_trait;
use bytes::Bytes;
use reqwest::Client;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;
use tokio::io::AsyncReadExt;

/// Location of a CSV table
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataSource {
    File(PathBuf),
    Url(String),
    Stdin,
}

impl DataSource {
    /// Interpret a command-line or config value
    pub fn parse(raw: &str) -> Self {
        let s = raw.trim();
        if s == "-" {
            DataSource::Stdin
        } else if s.starts_with("http://") || s.starts_with("https://") {
            DataSource::Url(s.to_string())
        } else {
            DataSource::File(PathBuf::from(s))
        }
    }

    /// Short label used in errors and logs, e.g. `forecasts.csv`
    pub fn label(&self) -> String {
        match self {
            DataSource::File(path) => path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| path.display().to_string()),
            DataSource::Url(url) => url
                .rsplit('/')
                .find(|seg| !seg.is_empty())
                .unwrap_or(url)
                .to_string(),
            DataSource::Stdin => "<stdin>".to_string(),
        }
    }
}

impl fmt::Display for DataSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataSource::File(path) => write!(f, "{}", path.display()),
            DataSource::Url(url) => f.write_str(url),
            DataSource::Stdin => f.write_str("<stdin>"),
        }
    }
}

/// Reads the raw bytes of a [`DataSource`]
#[async_trait]
pub trait SourceFetcher: Send + Sync {
    async fn fetch(&self, source: &DataSource) -> Result<Bytes>;
}

/// Fetcher backed by the filesystem, stdin and a `reqwest` client
pub struct DefaultFetcher {
    client: Client,
}

impl DefaultFetcher {
    pub fn new(timeout: Duration) -> Self {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| Client::new());

        Self { client }
    }

    async fn fetch_url(&self, url: &str) -> Result<Bytes> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| OutbreakError::FetchError {
                url: url.to_string(),
                reason: e.to_string(),
            })?;

        if !response.status().is_success() {
            return Err(OutbreakError::FetchError {
                url: url.to_string(),
                reason: format!("server returned {}", response.status()),
            });
        }

        Ok(response.bytes().await?)
    }
}

impl Default for DefaultFetcher {
    fn default() -> Self {
        Self::new(Duration::from_secs(30))
    }
}

#[async_trait]
impl SourceFetcher for DefaultFetcher {
    async fn fetch(&self, source: &DataSource) -> Result<Bytes> {
        tracing::debug!(%source, "fetching table");
        match source {
            DataSource::File(path) => {
                let data = tokio::fs::read(path).await.map_err(|e| {
                    OutbreakError::IoError(std::io::Error::new(
                        e.kind(),
                        format!("{}: {}", path.display(), e),
                    ))
                })?;
                Ok(Bytes::from(data))
            }
            DataSource::Url(url) => self.fetch_url(url).await,
            DataSource::Stdin => {
                let mut buf = Vec::new();
                tokio::io::stdin().read_to_end(&mut buf).await?;
                Ok(Bytes::from(buf))
            }
        }
    }
}
