//! Book content
//!
//! A [`Book`] wraps the Project Aon XML of one gamebook in one language and
//! answers the lookups the rules validator needs: section content by id and
//! the table of Kai disciplines.

use crate::documents::{Document, Element};
use crate::error::{Error, Result};
use crate::limits::Limits;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Languages the books are published in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    /// English
    En,
    /// Spanish
    Es,
}

impl Language {
    /// Language code as used in file names and rule attributes
    pub fn code(&self) -> &'static str {
        match self {
            Language::En => "en",
            Language::Es => "es",
        }
    }
}

impl FromStr for Language {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "en" => Ok(Language::En),
            "es" => Ok(Language::Es),
            other => Err(Error::Config(format!("unsupported language '{}'", other))),
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// One gamebook in one language
#[derive(Debug, Clone)]
pub struct Book {
    number: u32,
    language: Language,
    document: Document,
}

impl Book {
    /// Section where every playthrough starts
    pub const INITIAL_SECTION: &'static str = "sect1";

    /// Id of the section listing the Kai disciplines
    pub const DISCIPLINES_SECTION: &'static str = "discplnz";

    /// Parse the book XML
    pub fn from_xml(number: u32, language: Language, xml: &str) -> Result<Self> {
        Self::from_xml_with_limits(number, language, xml, &Limits::default())
    }

    /// Parse the book XML with explicit limits
    pub fn from_xml_with_limits(
        number: u32,
        language: Language,
        xml: &str,
        limits: &Limits,
    ) -> Result<Self> {
        let document = Document::parse(xml, limits)?;
        if document.root.is_none() {
            return Err(Error::Xml(format!("book {} XML has no root element", number)));
        }
        Ok(Self {
            number,
            language,
            document,
        })
    }

    /// Book number
    pub fn number(&self) -> u32 {
        self.number
    }

    /// Book language
    pub fn language(&self) -> Language {
        self.language
    }

    /// The content of a section, or `None` when it does not exist or is empty
    pub fn section_xml(&self, section_id: &str) -> Option<&Element> {
        self.document
            .root()?
            .find_descendant("section", "id", section_id)
            .filter(|section| !section.is_empty())
    }

    /// Disciplines defined by the book, keyed by id, with their titles
    pub fn disciplines_table(&self) -> IndexMap<String, String> {
        let Some(disciplines) = self.section_xml(Self::DISCIPLINES_SECTION) else {
            return IndexMap::new();
        };

        disciplines
            .descendants()
            .skip(1)
            .filter(|e| e.local_name() == "section")
            .filter_map(|section| {
                let id = section.attr("id")?;
                let title = section
                    .find_child("meta")
                    .and_then(|meta| meta.find_child("title"))
                    .and_then(|title| title.text.clone())
                    .unwrap_or_default();
                Some((id.to_string(), title))
            })
            .collect()
    }
}
