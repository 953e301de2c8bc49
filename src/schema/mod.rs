//! Schema validation of mechanics documents
//!
//! The rules validator only needs a narrow seam: give a document and a
//! schema as text, get back a human readable report that is exactly
//! `"<file> validates"` on success. [`XsdValidator`] is the bundled
//! implementation; anything with the same contract can be plugged in.
//!
//! The schema text itself is downloaded once and kept in a [`SchemaCache`]
//! shared by every validator built from it.

mod xsd;

pub use xsd::XsdValidator;

use crate::error::Result;
use crate::loaders::Loader;
use crate::locations::Location;
use once_cell::sync::OnceCell;
use tracing::{debug, info};

/// Validate a document against a schema, xmllint style.
///
/// `args` follows the command line of the validator being wrapped; its last
/// entry names the document and appears in every reported line.
pub trait SchemaValidator: Send + Sync {
    /// Validate `xml` against `schema`, returning the validator's report
    fn validate(&self, xml: &str, schema: &str, args: &[&str]) -> String;
}

/// Write-once holder for the mechanics schema text
#[derive(Debug, Default)]
pub struct SchemaCache {
    text: OnceCell<String>,
}

impl SchemaCache {
    /// Create an empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a cache already holding `text`
    pub fn with_text(text: impl Into<String>) -> Self {
        let cache = Self::new();
        cache.set(text);
        cache
    }

    /// Store the schema text. Returns `false` if it was already set, in
    /// which case the stored text is kept.
    pub fn set(&self, text: impl Into<String>) -> bool {
        self.text.set(text.into()).is_ok()
    }

    /// The schema text, if it has been loaded
    pub fn get(&self) -> Option<&str> {
        self.text.get().map(String::as_str)
    }

    /// Whether the schema text has been loaded
    pub fn is_loaded(&self) -> bool {
        self.text.get().is_some()
    }

    /// Download the schema unless it is already cached
    pub async fn download(&self, loader: &Loader, location: &Location) -> Result<&str> {
        if let Some(text) = self.get() {
            debug!("schema already cached");
            return Ok(text);
        }

        let text = loader.fetch(location).await?;
        info!(%location, bytes = text.len(), "schema downloaded");
        self.set(text);
        Ok(self.get().unwrap_or_default())
    }
}

/// Characters the browser-side xmllint build mis-decodes. They are removed
/// from the document before validation so both backends agree.
pub const STRIPPED_CHARACTERS: &[char] = &[
    'á', 'é', 'í', 'ó', 'ú', 'Á', 'É', 'Í', 'Ó', 'Ú', 'ñ', 'Ñ', 'ü', 'Ü', '¡', '¿', '\u{2019}',
    '\u{201C}', '\u{201D}', '\u{2013}', '\u{2014}',
];

/// Remove [`STRIPPED_CHARACTERS`] from a document before schema validation.
///
/// This alters literal attribute and text values, so the validated text is
/// not byte-identical to the mechanics data.
pub fn sanitize_for_schema(text: &str) -> String {
    text.chars()
        .filter(|c| !STRIPPED_CHARACTERS.contains(c))
        .collect()
}
