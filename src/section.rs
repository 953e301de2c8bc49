//! Runtime view over one book section

use crate::book::Book;
use crate::documents::Element;
use crate::mechanics::Mechanics;

/// A section of a book, with its content and rules
#[derive(Debug, Clone, Copy)]
pub struct Section<'a> {
    id: &'a str,
    content: Option<&'a Element>,
    rules: Option<&'a Element>,
}

impl<'a> Section<'a> {
    /// Resolve a section of `book` and its rules in `mechanics`
    pub fn new(book: &'a Book, section_id: &'a str, mechanics: &'a Mechanics) -> Self {
        Self {
            id: section_id,
            content: book.section_xml(section_id),
            rules: mechanics.section(section_id),
        }
    }

    /// Section id
    pub fn id(&self) -> &'a str {
        self.id
    }

    /// True if the book has content for this section
    pub fn exists(&self) -> bool {
        self.content.is_some()
    }

    /// Section content XML
    pub fn content(&self) -> Option<&'a Element> {
        self.content
    }

    /// Section rules, if the mechanics define any
    pub fn rules(&self) -> Option<&'a Element> {
        self.rules
    }

    /// Id of the next section in book order
    pub fn next_section_id(&self) -> Option<&'a str> {
        self.navigation_link("next")
    }

    /// Id of the previous section in book order
    pub fn previous_section_id(&self) -> Option<&'a str> {
        self.navigation_link("prev")
    }

    /// True if the section text offers a choice leading to `section_id`
    pub fn has_choice_to(&self, section_id: &str) -> bool {
        self.content
            .and_then(|content| content.find_descendant("choice", "idref", section_id))
            .is_some()
    }

    /// Number of links to the random number table in the section text
    pub fn random_table_links(&self) -> usize {
        self.content.map_or(0, |content| {
            content
                .descendants()
                .filter(|e| e.local_name() == "a" && e.attr("idref") == Some("random"))
                .count()
        })
    }

    fn navigation_link(&self, class: &str) -> Option<&'a str> {
        self.content?
            .find_child("meta")?
            .find_children("link")
            .into_iter()
            .find(|link| link.attr("class") == Some(class))?
            .attr("idref")
    }
}
