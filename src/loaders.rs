//! Resource loading utilities
//!
//! This module loads book, mechanics, objects and schema documents from the
//! locations described in [`crate::locations`].

use crate::error::{Error, Result};
use crate::limits::Limits;
use crate::locations::Location;
use std::fs;
use tracing::debug;

/// Resource loader for book data and schemas
#[derive(Debug, Clone)]
pub struct Loader {
    /// Resource limits
    limits: Limits,
    /// Whether to allow remote resources
    allow_remote: bool,
    /// Shared HTTP client
    client: reqwest::Client,
}

impl Loader {
    /// Create a new loader with default settings
    pub fn new() -> Self {
        Self {
            limits: Limits::default(),
            allow_remote: true,
            client: reqwest::Client::new(),
        }
    }

    /// Set the limits
    pub fn with_limits(mut self, limits: Limits) -> Self {
        self.limits = limits;
        self
    }

    /// Set whether to allow remote resources
    pub fn with_allow_remote(mut self, allow: bool) -> Self {
        self.allow_remote = allow;
        self
    }

    /// The limits applied by this loader
    pub fn limits(&self) -> &Limits {
        &self.limits
    }

    /// Load a local or in-memory resource synchronously
    pub fn load(&self, location: &Location) -> Result<String> {
        match location {
            Location::Path(path) => {
                let content = fs::read_to_string(path).map_err(|e| {
                    Error::Resource(format!("Failed to read file '{}': {}", path.display(), e))
                })?;
                self.limits.check_xml_size(content.len())?;
                Ok(content)
            }
            Location::Url(url) => Err(Error::Resource(format!(
                "Remote resource '{}' requires an asynchronous fetch",
                url
            ))),
            Location::String(s) => Ok(s.clone()),
        }
    }

    /// Fetch a resource, downloading it when the location is remote
    pub async fn fetch(&self, location: &Location) -> Result<String> {
        debug!(%location, "fetching resource");
        match location {
            Location::Path(path) => {
                let content = tokio::fs::read_to_string(path).await.map_err(|e| {
                    Error::Resource(format!("Failed to read file '{}': {}", path.display(), e))
                })?;
                self.limits.check_xml_size(content.len())?;
                Ok(content)
            }
            Location::Url(url) => {
                if !self.allow_remote {
                    return Err(Error::Resource(
                        "Remote resources are not allowed".to_string(),
                    ));
                }

                let response = self.client.get(url.clone()).send().await?;
                let status = response.status();
                if !status.is_success() {
                    return Err(Error::Resource(format!(
                        "Failed to download '{}': HTTP {}",
                        url, status
                    )));
                }
                if let Some(length) = response.content_length() {
                    self.limits.check_xml_size(length as usize)?;
                }

                let content = response.text().await?;
                self.limits.check_xml_size(content.len())?;
                Ok(content)
            }
            Location::String(s) => {
                self.limits.check_xml_size(s.len())?;
                Ok(s.clone())
            }
        }
    }
}

impl Default for Loader {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_load_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "<mechanics/>").unwrap();

        let location = Location::Path(file.path().to_path_buf());
        let content = Loader::new().load(&location).unwrap();

        assert!(content.contains("<mechanics/>"));
    }

    #[test]
    fn test_load_url_is_async_only() {
        let location: Location = "https://example.org/objects.xml".parse().unwrap();
        assert!(Loader::new().load(&location).is_err());
    }

    #[tokio::test]
    async fn test_fetch_from_string() {
        let location = Location::String("<objects/>".to_string());
        let content = Loader::new().fetch(&location).await.unwrap();
        assert_eq!(content, "<objects/>");
    }

    #[tokio::test]
    async fn test_fetch_missing_file() {
        let location = Location::Path("/nonexistent/mechanics-1.xml".into());
        let result = Loader::new().fetch(&location).await;
        assert!(matches!(result, Err(Error::Resource(_))));
    }

    #[tokio::test]
    async fn test_fetch_remote_disallowed() {
        let location: Location = "https://example.org/objects.xml".parse().unwrap();
        let loader = Loader::new().with_allow_remote(false);
        assert!(loader.fetch(&location).await.is_err());
    }

    #[tokio::test]
    async fn test_size_limit() {
        let mut file = NamedTempFile::new().unwrap();
        let large_content = "x".repeat(5 * 1024 * 1024);
        write!(file, "{}", large_content).unwrap();

        let location = Location::Path(file.path().to_path_buf());
        let loader = Loader::new().with_limits(Limits::strict());

        assert!(loader.fetch(&location).await.is_err());
    }
}
