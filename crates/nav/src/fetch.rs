//! Fragment sources
//!
//! The fetch step sits behind a trait so the pipeline runs the same
//! against HTTP, a local file, or a test double.
//!
//! Contract: `Ok(Some(body))` on success, `Ok(None)` when the fragment is
//! not available (non-2xx status, empty body, missing file), `Err` only
//! for transport failures. No retries, no caching.

use std::path::PathBuf;

use async_trait::async_trait;
use url::Url;

use crate::error::{NavError, Result};

#[async_trait]
pub trait FragmentSource: Send + Sync {
    /// Human-readable name for logging
    fn name(&self) -> &str;

    /// Fetch the fragment at `url`
    async fn fetch(&self, url: &Url) -> Result<Option<String>>;
}

/// Treat an empty body the same as no body
fn non_empty(body: String) -> Option<String> {
    (!body.is_empty()).then_some(body)
}

/// Plain HTTP GET via reqwest
pub struct HttpFragmentSource {
    client: reqwest::Client,
}

impl HttpFragmentSource {
    pub fn new() -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("nav/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| NavError::Fetch {
                url: String::new(),
                source: Box::new(e),
            })?;
        Ok(Self::with_client(client))
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl FragmentSource for HttpFragmentSource {
    fn name(&self) -> &str {
        "http"
    }

    async fn fetch(&self, url: &Url) -> Result<Option<String>> {
        let fetch_error = |e: reqwest::Error| NavError::Fetch {
            url: url.to_string(),
            source: Box::new(e),
        };

        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(fetch_error)?;

        let status = response.status();
        if !status.is_success() {
            tracing::debug!(%url, %status, "fragment not available");
            return Ok(None);
        }

        let body = response.text().await.map_err(fetch_error)?;
        tracing::debug!(%url, bytes = body.len(), "fetched fragment");
        Ok(non_empty(body))
    }
}

/// Reads the fragment from disk, ignoring the URL
///
/// Lets authors preview a local `nav.html` against a page before publishing.
pub struct FileFragmentSource {
    path: PathBuf,
}

impl FileFragmentSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl FragmentSource for FileFragmentSource {
    fn name(&self) -> &str {
        "file"
    }

    async fn fetch(&self, url: &Url) -> Result<Option<String>> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(body) => {
                tracing::debug!(path = %self.path.display(), %url, "read fragment from file");
                Ok(non_empty(body))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %self.path.display(), "fragment file missing");
                Ok(None)
            }
            Err(e) => Err(NavError::Fetch {
                url: self.path.display().to_string(),
                source: Box::new(e),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn any_url() -> Url {
        Url::parse("https://site.example/nav.html").unwrap()
    }

    #[tokio::test]
    async fn test_file_source_reads_body() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nav.html");
        std::fs::write(&path, "<main><div>x</div></main>").unwrap();
        let source = FileFragmentSource::new(&path);

        let body = source.fetch(&any_url()).await.unwrap();
        assert_eq!(body.as_deref(), Some("<main><div>x</div></main>"));
    }

    #[tokio::test]
    async fn test_file_source_missing_is_absent() {
        let dir = tempdir().unwrap();
        let source = FileFragmentSource::new(dir.path().join("nav.html"));
        assert_eq!(source.fetch(&any_url()).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_file_source_empty_is_absent() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nav.html");
        std::fs::write(&path, "").unwrap();
        let source = FileFragmentSource::new(&path);

        assert_eq!(source.fetch(&any_url()).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_file_source_unreadable_is_an_error() {
        // A directory exists but cannot be read as a file
        let dir = tempdir().unwrap();
        let source = FileFragmentSource::new(dir.path());

        let err = source.fetch(&any_url()).await.unwrap_err();
        assert!(matches!(err, NavError::Fetch { .. }));
    }

    #[tokio::test]
    async fn test_http_source_transport_error() {
        // Grab a free port, then close it so the connect is refused
        let port = std::net::TcpListener::bind("127.0.0.1:0")
            .unwrap()
            .local_addr()
            .unwrap()
            .port();
        let source = HttpFragmentSource::new().unwrap();
        let url = Url::parse(&format!("http://127.0.0.1:{port}/nav.html")).unwrap();

        let err = source.fetch(&url).await.unwrap_err();
        assert!(matches!(err, NavError::Fetch { .. }));
    }
}
