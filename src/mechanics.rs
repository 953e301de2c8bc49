//! Book mechanics
//!
//! The mechanics of a book are two documents: the rules XML, holding one
//! `section` element of rules per book section, and the object definitions
//! XML shared by all books.

use crate::documents::{Document, Element};
use crate::error::{Error, Result};
use crate::limits::Limits;

/// Rules and object definitions for one book
#[derive(Debug, Clone)]
pub struct Mechanics {
    rules: Document,
    objects: Document,
}

impl Mechanics {
    /// Parse the rules and objects XML
    pub fn from_xml(rules_xml: &str, objects_xml: &str) -> Result<Self> {
        Self::from_xml_with_limits(rules_xml, objects_xml, &Limits::default())
    }

    /// Parse the rules and objects XML with explicit limits
    pub fn from_xml_with_limits(rules_xml: &str, objects_xml: &str, limits: &Limits) -> Result<Self> {
        let rules = Document::parse(rules_xml, limits)?;
        if rules.root.is_none() {
            return Err(Error::Xml("mechanics XML has no root element".to_string()));
        }
        let objects = Document::parse(objects_xml, limits)?;
        Ok(Self { rules, objects })
    }

    /// Rules subtree of a section
    pub fn section(&self, section_id: &str) -> Option<&Element> {
        self.rules
            .root()?
            .find_descendant("section", "id", section_id)
    }

    /// Object definition (weapon, special item, backpack object...) by id
    pub fn object(&self, object_id: &str) -> Option<&Element> {
        self.objects
            .root()?
            .descendants()
            .skip(1)
            .find(|e| e.attr("id") == Some(object_id))
    }

    /// Id of the book's final section
    pub fn last_section_id(&self) -> Option<&str> {
        self.rules.root()?.attr("lastSection")
    }

    /// The parsed rules document
    pub fn rules_document(&self) -> &Document {
        &self.rules
    }

    /// Rules document serialized back to text
    pub fn to_xml_string(&self) -> Result<String> {
        self.rules.to_xml_string()
    }
}
