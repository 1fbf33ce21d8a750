use crate::error::{ContentError, Result};
use async_trait::async_trait;
use refdoc_protocol::ContentConfig;
use std::path::PathBuf;
use std::sync::Arc;

/// Retrieves the raw text behind a resource path (`{base}{key}{ext}`).
#[async_trait]
pub trait ContentSource: Send + Sync {
    async fn fetch(&self, resource: &str) -> Result<String>;

    fn describe(&self) -> String;
}

/// Reads topic documents from the local filesystem.
#[derive(Debug, Clone, Default)]
pub struct FileSource;

#[async_trait]
impl ContentSource for FileSource {
    async fn fetch(&self, resource: &str) -> Result<String> {
        let path = PathBuf::from(resource);
        tokio::fs::read_to_string(&path)
            .await
            .map_err(|err| ContentError::network(resource, err.to_string()))
    }

    fn describe(&self) -> String {
        "file".to_string()
    }
}

/// Plain `GET` over HTTP(S); any non-2xx status is a failure.
#[derive(Debug, Clone)]
pub struct HttpSource {
    client: reqwest::Client,
}

impl HttpSource {
    pub fn new() -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("refdoc/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|err| ContentError::network("<client>", err.to_string()))?;
        Ok(Self { client })
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ContentSource for HttpSource {
    async fn fetch(&self, resource: &str) -> Result<String> {
        let response = self
            .client
            .get(resource)
            .header(reqwest::header::ACCEPT, "text/markdown, text/plain, */*")
            .send()
            .await
            .map_err(|err| ContentError::network(resource, err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ContentError::network(resource, format!("HTTP {status}")));
        }

        response
            .text()
            .await
            .map_err(|err| ContentError::network(resource, err.to_string()))
    }

    fn describe(&self) -> String {
        "http".to_string()
    }
}

/// HTTP for `http://`/`https://` base paths, the filesystem otherwise.
pub fn source_for(config: &ContentConfig) -> Result<Arc<dyn ContentSource>> {
    if config.is_remote() {
        Ok(Arc::new(HttpSource::new()?))
    } else {
        Ok(Arc::new(FileSource))
    }
}
