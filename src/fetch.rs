//! [`ShardSource`] implementations for the HTTP and filesystem transports.
//!
//! The base location is injected configuration (`client.base_url`, falling
//! back to `output.dir`): an `http://` or `https://` prefix selects HTTP,
//! anything else is read as a directory.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;

use postindex_core::source::ShardSource;
use postindex_core::FetchError;

/// Fetches index files over HTTP(S).
pub struct HttpShardSource {
    client: reqwest::Client,
    base: String,
    timeout: Duration,
}

impl HttpShardSource {
    pub fn new(base: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base: base.trim_end_matches('/').to_string(),
            timeout,
        })
    }

    fn url(&self, file_name: &str) -> String {
        format!("{}/{}", self.base, file_name)
    }
}

#[async_trait]
impl ShardSource for HttpShardSource {
    async fn fetch(&self, file_name: &str) -> Result<Vec<u8>, FetchError> {
        let transport = |e: reqwest::Error| {
            if e.is_timeout() {
                FetchError::Timeout {
                    resource: file_name.to_string(),
                    after_ms: self.timeout.as_millis() as u64,
                }
            } else {
                FetchError::Network {
                    resource: file_name.to_string(),
                    message: e.to_string(),
                }
            }
        };

        let resp = self
            .client
            .get(self.url(file_name))
            .send()
            .await
            .map_err(transport)?;

        let status = resp.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                resource: file_name.to_string(),
                status: status.as_u16(),
            });
        }

        let body = resp.bytes().await.map_err(transport)?;
        Ok(body.to_vec())
    }

    fn describe(&self) -> String {
        self.base.clone()
    }
}

/// Reads index files from a local directory, e.g. the build output.
pub struct FsShardSource {
    root: PathBuf,
}

impl FsShardSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

#[async_trait]
impl ShardSource for FsShardSource {
    async fn fetch(&self, file_name: &str) -> Result<Vec<u8>, FetchError> {
        match tokio::fs::read(self.root.join(file_name)).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(FetchError::Status {
                resource: file_name.to_string(),
                status: 404,
            }),
            Err(e) => Err(FetchError::Network {
                resource: file_name.to_string(),
                message: e.to_string(),
            }),
        }
    }

    fn describe(&self) -> String {
        self.root.display().to_string()
    }
}

/// Pick the transport for `base`.
pub fn open_source(base: &str, timeout: Duration) -> Result<Box<dyn ShardSource>> {
    if base.starts_with("http://") || base.starts_with("https://") {
        Ok(Box::new(HttpShardSource::new(base, timeout)?))
    } else {
        let path = base.strip_prefix("file://").unwrap_or(base);
        Ok(Box::new(FsShardSource::new(path)))
    }
}
