use crate::config::Config;
use anyhow::{Context, Result};
use futures::StreamExt;
use reqwest::{Client, StatusCode};
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;
use tokio::fs::File;
use tokio::io::{AsyncBufRead, BufReader};
use tokio_util::io::StreamReader;
use url::Url;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("unsupported source scheme '{0}'")]
    UnsupportedScheme(String),
    #[error("invalid file URL '{0}'")]
    InvalidFileUrl(String),
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("{url} answered {status}")]
    Status { url: String, status: StatusCode },
    #[error("cannot open {}: {source}", .path.display())]
    Open {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("read failed: {0}")]
    Read(#[from] std::io::Error),
}

/// Where a list lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    Remote(Url),
    Local(PathBuf),
}

impl Source {
    /// `http(s)://` goes over the network, `file://` and plain paths are
    /// read from disk.
    pub fn parse(locator: &str) -> Result<Self, FetchError> {
        match Url::parse(locator) {
            Ok(url) => match url.scheme() {
                "http" | "https" => Ok(Source::Remote(url)),
                "file" => url
                    .to_file_path()
                    .map(Source::Local)
                    .map_err(|_| FetchError::InvalidFileUrl(locator.to_string())),
                other => Err(FetchError::UnsupportedScheme(other.to_string())),
            },
            // Relative and absolute paths both land here
            Err(_) => Ok(Source::Local(PathBuf::from(locator))),
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Source::Remote(url) => write!(f, "{}", url),
            Source::Local(path) => write!(f, "{}", path.display()),
        }
    }
}

pub type ListReader = Box<dyn AsyncBufRead + Send + Unpin>;

/// Opens sources as buffered line streams.
#[derive(Clone)]
pub struct SourceFetcher {
    client: Client,
}

impl SourceFetcher {
    pub fn new(config: &Config) -> Result<Self> {
        let mut builder = Client::builder().user_agent(config.user_agent.clone());
        if config.fetch_timeout_secs > 0 {
            builder = builder.timeout(Duration::from_secs(config.fetch_timeout_secs));
        }
        let client = builder.build().context("Failed to build HTTP client")?;
        Ok(Self { client })
    }

    pub async fn open(&self, source: &Source) -> Result<ListReader, FetchError> {
        match source {
            Source::Remote(url) => {
                let resp = self.client.get(url.clone()).send().await?;
                let status = resp.status();
                if !status.is_success() {
                    return Err(FetchError::Status {
                        url: url.to_string(),
                        status,
                    });
                }
                let stream = resp
                    .bytes_stream()
                    .map(|result| result.map_err(std::io::Error::other));
                Ok(Box::new(StreamReader::new(Box::pin(stream))))
            }
            Source::Local(path) => {
                let file = File::open(path).await.map_err(|source| FetchError::Open {
                    path: path.clone(),
                    source,
                })?;
                Ok(Box::new(BufReader::new(file)))
            }
        }
    }
}
