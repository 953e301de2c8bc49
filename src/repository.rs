//! Book data repository
//!
//! Resolves the configured layout and downloads the files of one book.

use crate::book::{Book, Language};
use crate::config::RepositoryConfig;
use crate::error::Result;
use crate::limits::Limits;
use crate::loaders::Loader;
use crate::schema::SchemaCache;
use tracing::debug;

/// Downloads book, mechanics, objects and schema files
#[derive(Debug, Clone)]
pub struct BookRepository {
    config: RepositoryConfig,
    loader: Loader,
}

impl BookRepository {
    /// Create a repository using a loader with the configured limits
    pub fn new(config: RepositoryConfig) -> Self {
        let loader = Loader::new().with_limits(config.limits.clone());
        Self { config, loader }
    }

    /// Replace the loader. Its limits then apply to parsing as well.
    pub fn with_loader(mut self, loader: Loader) -> Self {
        self.loader = loader;
        self
    }

    /// Repository layout
    pub fn config(&self) -> &RepositoryConfig {
        &self.config
    }

    /// Limits applied to downloaded documents
    pub fn limits(&self) -> &Limits {
        self.loader.limits()
    }

    /// Download and parse a book
    pub async fn download_book(&self, number: u32, language: Language) -> Result<Book> {
        let location = self.config.book_location(number, language)?;
        let xml = self.loader.fetch(&location).await?;
        debug!(number, %language, bytes = xml.len(), "book downloaded");
        Book::from_xml_with_limits(number, language, &xml, self.limits())
    }

    /// Download the mechanics rules XML of a book
    pub async fn download_mechanics(&self, number: u32, language: Language) -> Result<String> {
        let location = self.config.mechanics_location(number, language)?;
        self.loader.fetch(&location).await
    }

    /// Download the object definitions XML
    pub async fn download_objects(&self, number: u32, language: Language) -> Result<String> {
        let location = self.config.objects_location(number, language)?;
        self.loader.fetch(&location).await
    }

    /// Download the mechanics schema into `cache`, unless already there
    pub async fn download_schema(&self, cache: &SchemaCache) -> Result<()> {
        let location = self.config.schema_location()?;
        cache.download(&self.loader, &location).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use std::fs;

    fn repository_in(dir: &std::path::Path) -> BookRepository {
        BookRepository::new(RepositoryConfig::default().with_base(dir.to_string_lossy()))
    }

    #[test]
    fn test_limits_follow_loader() {
        let dir = tempfile::tempdir().unwrap();
        let repository = repository_in(dir.path());
        assert_eq!(repository.limits(), &Limits::default());

        let repository = repository.with_loader(Loader::new().with_limits(Limits::strict()));
        assert_eq!(repository.limits(), &Limits::strict());
    }

    #[tokio::test]
    async fn test_download_book_parses_with_loader_limits() {
        let dir = tempfile::tempdir().unwrap();
        let book_dir = dir.path().join("projectAon").join("1");
        fs::create_dir_all(&book_dir).unwrap();
        fs::write(
            book_dir.join("en.xml"),
            r#"<gamebook><section id="sect1"><data><p>deep</p></data></section></gamebook>"#,
        )
        .unwrap();

        let repository = repository_in(dir.path());
        assert!(repository.download_book(1, Language::En).await.is_ok());

        let shallow = Limits {
            max_xml_depth: 2,
            ..Limits::default()
        };
        let repository = repository.with_loader(Loader::new().with_limits(shallow));
        let result = repository.download_book(1, Language::En).await;
        assert!(matches!(result, Err(Error::LimitExceeded(_))), "{:?}", result);
    }
}
