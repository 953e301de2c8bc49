//! Repository layout configuration
//!
//! Describes where book, mechanics, objects and schema files live relative
//! to a base directory or URL. Paths are templates: `{number}` and
//! `{language}` are substituted per book.

use crate::book::Language;
use crate::error::{Error, Result};
use crate::limits::Limits;
use crate::locations::Location;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Layout of the book data repository
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RepositoryConfig {
    /// Base directory or URL of the data repository
    pub base: String,
    /// Book XML path template
    pub book_path: String,
    /// Mechanics rules XML path template
    pub mechanics_path: String,
    /// Object definitions XML path
    pub objects_path: String,
    /// Mechanics XSD path
    pub schema_path: String,
    /// Limits applied to every downloaded document
    pub limits: Limits,
}

impl Default for RepositoryConfig {
    fn default() -> Self {
        Self {
            base: "data".to_string(),
            book_path: "projectAon/{number}/{language}.xml".to_string(),
            mechanics_path: "mechanics-{number}.xml".to_string(),
            objects_path: "objects.xml".to_string(),
            schema_path: "mechanics.xsd".to_string(),
            limits: Limits::default(),
        }
    }
}

impl RepositoryConfig {
    /// Load a configuration from a JSON file. Missing keys take defaults.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("cannot read '{}': {}", path.display(), e))
        })?;
        Self::from_json(&text)
    }

    /// Parse a configuration from JSON text
    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text).map_err(|e| Error::Config(e.to_string()))
    }

    /// Replace the base location
    pub fn with_base(mut self, base: impl Into<String>) -> Self {
        self.base = base.into();
        self
    }

    /// Base location of the repository
    pub fn base_location(&self) -> Result<Location> {
        self.base.parse()
    }

    /// Location of a book XML
    pub fn book_location(&self, number: u32, language: Language) -> Result<Location> {
        self.resolve(&self.book_path, number, language)
    }

    /// Location of a book's mechanics XML
    pub fn mechanics_location(&self, number: u32, language: Language) -> Result<Location> {
        self.resolve(&self.mechanics_path, number, language)
    }

    /// Location of the object definitions XML
    pub fn objects_location(&self, number: u32, language: Language) -> Result<Location> {
        self.resolve(&self.objects_path, number, language)
    }

    /// Location of the mechanics XSD
    pub fn schema_location(&self) -> Result<Location> {
        self.base_location()?.join(&self.schema_path)
    }

    fn resolve(&self, template: &str, number: u32, language: Language) -> Result<Location> {
        let relative = template
            .replace("{number}", &number.to_string())
            .replace("{language}", language.code());
        self.base_location()?.join(&relative)
    }
}
