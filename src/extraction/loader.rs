use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;

use super::ExtractionError;

/// Fetches raw PDF bytes for a source string.
#[async_trait]
pub trait SourceLoader: Send + Sync {
    /// Load the full byte content of `source` into memory.
    async fn load(&self, source: &str) -> Result<Vec<u8>, ExtractionError>;
}

/// Loads `http(s)://` sources over the network and everything else from the local filesystem.
pub struct PdfSourceLoader {
    http: Client,
}

impl PdfSourceLoader {
    /// Build a loader whose downloads give up after `timeout`.
    pub fn new(timeout: Duration) -> Result<Self, ExtractionError> {
        let http = Client::builder()
            .user_agent(concat!("pdfdigest/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()
            .map_err(|error| ExtractionError::Download(error.to_string()))?;
        Ok(Self { http })
    }

    async fn download(&self, url: &str) -> Result<Vec<u8>, ExtractionError> {
        tracing::info!(url, "Downloading remote PDF");
        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|error| ExtractionError::Download(format!("{url}: {error}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ExtractionError::HttpStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|error| ExtractionError::Download(format!("{url}: {error}")))?;
        Ok(bytes.to_vec())
    }

    async fn read_local(&self, path: &str) -> Result<Vec<u8>, ExtractionError> {
        if !Path::new(path).is_file() {
            return Err(ExtractionError::NotFound(path.to_string()));
        }
        tracing::info!(path, "Reading local PDF");
        tokio::fs::read(path)
            .await
            .map_err(|source| ExtractionError::Io {
                path: path.to_string(),
                source,
            })
    }
}

#[async_trait]
impl SourceLoader for PdfSourceLoader {
    async fn load(&self, source: &str) -> Result<Vec<u8>, ExtractionError> {
        if is_remote(source) {
            self.download(source).await
        } else {
            self.read_local(source).await
        }
    }
}

pub(crate) fn is_remote(source: &str) -> bool {
    let lowered = source.trim_start().to_ascii_lowercase();
    lowered.starts_with("http://") || lowered.starts_with("https://")
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::{Method::GET, MockServer};
    use std::io::Write;

    fn loader() -> PdfSourceLoader {
        PdfSourceLoader::new(Duration::from_secs(5)).expect("loader")
    }

    #[test]
    fn detects_remote_sources() {
        assert!(is_remote("https://example.com/a.pdf"));
        assert!(is_remote("HTTP://example.com/a.pdf"));
        assert!(!is_remote("/tmp/a.pdf"));
        assert!(!is_remote("docs/https.pdf"));
    }

    #[tokio::test]
    async fn downloads_remote_bytes() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET).path("/paper.pdf");
                then.status(200).body("%PDF-1.4 fake");
            })
            .await;

        let bytes = loader()
            .load(&server.url("/paper.pdf"))
            .await
            .expect("download");

        mock.assert_async().await;
        assert_eq!(bytes, b"%PDF-1.4 fake");
    }

    #[tokio::test]
    async fn remote_error_status_is_reported() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/missing.pdf");
                then.status(404);
            })
            .await;

        let error = loader()
            .load(&server.url("/missing.pdf"))
            .await
            .expect_err("404");

        assert!(matches!(error, ExtractionError::HttpStatus { status: 404, .. }));
    }

    #[tokio::test]
    async fn reads_local_file() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        file.write_all(b"local bytes").expect("write");

        let path = file.path().to_string_lossy().to_string();
        let bytes = loader().load(&path).await.expect("read");

        assert_eq!(bytes, b"local bytes");
    }

    #[tokio::test]
    async fn missing_local_file_is_not_found() {
        let error = loader()
            .load("/definitely/not/here.pdf")
            .await
            .expect_err("missing");

        assert!(matches!(
            error,
            ExtractionError::NotFound(ref path) if path == "/definitely/not/here.pdf"
        ));
        assert_eq!(error.to_string(), "File not found: /definitely/not/here.pdf");
    }
}
