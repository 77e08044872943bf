//! Where the catalog document comes from

use async_trait::async_trait;
use std::path::PathBuf;

use crate::error::CatalogLoadError;

/// Fetches the raw catalog document
#[async_trait]
pub trait CatalogSource: Send + Sync {
    async fn fetch(&self) -> Result<String, CatalogLoadError>;

    /// Human-readable location for logs
    fn describe(&self) -> String;
}

/// Catalog served over HTTP
pub struct HttpSource {
    client: reqwest::Client,
    url: String,
}

impl HttpSource {
    pub fn new(client: reqwest::Client, url: &str) -> Self {
        Self {
            client,
            url: url.to_string(),
        }
    }
}

#[async_trait]
impl CatalogSource for HttpSource {
    async fn fetch(&self) -> Result<String, CatalogLoadError> {
        self.client
            .get(&self.url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| CatalogLoadError::Fetch(e.to_string()))?
            .text()
            .await
            .map_err(|e| CatalogLoadError::Fetch(e.to_string()))
    }

    fn describe(&self) -> String {
        self.url.clone()
    }
}

/// Catalog shipped next to the binary
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl CatalogSource for FileSource {
    async fn fetch(&self) -> Result<String, CatalogLoadError> {
        tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|e| CatalogLoadError::Fetch(format!("{}: {}", self.path.display(), e)))
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

/// Pick a source from a configured location
pub fn from_location(client: reqwest::Client, location: &str) -> Box<dyn CatalogSource> {
    if location.starts_with("http://") || location.starts_with("https://") {
        Box::new(HttpSource::new(client, location))
    } else {
        Box::new(FileSource::new(location))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[tokio::test]
    async fn test_file_source_reads_document() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{{\"products\": []}}").unwrap();

        let source = FileSource::new(file.path());
        assert_eq!(source.fetch().await.unwrap(), "{\"products\": []}");
    }

    #[tokio::test]
    async fn test_missing_file_is_fetch_error() {
        let source = FileSource::new("/definitely/not/here/products.json");
        assert!(matches!(source.fetch().await, Err(CatalogLoadError::Fetch(_))));
    }

    #[test]
    fn test_location_picks_source() {
        let client = reqwest::Client::new();
        let http = from_location(client.clone(), "https://cdn.example.com/products.json");
        assert_eq!(http.describe(), "https://cdn.example.com/products.json");
        let file = from_location(client, "data/products.json");
        assert_eq!(file.describe(), "data/products.json");
    }
}
