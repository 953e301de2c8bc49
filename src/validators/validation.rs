//! Rule validation context
//!
//! A [`RuleChecker`] walks the rules of one section and records every
//! problem it finds as a formatted error string. Nothing here fails: a
//! malformed rule is a finding, not an error.

use indexmap::IndexMap;
use once_cell::unsync::OnceCell;

use crate::book::Book;
use crate::documents::Element;
use crate::mechanics::Mechanics;
use crate::section::Section;

use super::rules::RuleKind;

/// Validation state for the rules of one section
pub struct RuleChecker<'a> {
    /// Book the section belongs to
    pub book: &'a Book,
    /// Mechanics of the book
    pub mechanics: &'a Mechanics,
    /// Section whose rules are being checked
    pub section: Section<'a>,
    errors: &'a mut Vec<String>,
    disciplines: OnceCell<IndexMap<String, String>>,
}

impl<'a> RuleChecker<'a> {
    /// Create a checker for `section_id`, appending to `errors`
    pub fn new(
        book: &'a Book,
        mechanics: &'a Mechanics,
        section_id: &'a str,
        errors: &'a mut Vec<String>,
    ) -> Self {
        Self {
            book,
            mechanics,
            section: Section::new(book, section_id, mechanics),
            errors,
            disciplines: OnceCell::new(),
        }
    }

    /// Check every rule of the section, if it has any
    pub fn check_section(&mut self) {
        if let Some(rules) = self.section.rules() {
            self.walk(rules);
        }
    }

    /// Check `node` if it is a known rule, then all its descendants.
    ///
    /// Children are visited whatever the outcome of their parent's check.
    pub fn walk(&mut self, node: &Element) {
        if let Some(kind) = RuleKind::from_tag(node.local_name()) {
            let check = kind.check();
            check(self, node);
        }
        for child in &node.children {
            self.walk(child);
        }
    }

    /// Record a problem found on `rule`
    pub fn add_error(&mut self, rule: &Element, message: impl AsRef<str>) {
        self.errors.push(format!(
            "Section {}, rule {}: {}",
            self.section.id(),
            rule.local_name(),
            message.as_ref()
        ));
    }

    /// Disciplines table of the book, computed on first use
    pub fn disciplines(&self) -> &IndexMap<String, String> {
        self.disciplines.get_or_init(|| self.book.disciplines_table())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::book::Language;

    const BOOK: &str = r#"<gamebook><section id="sect1"><data><p>x</p></data></section></gamebook>"#;

    #[test]
    fn test_error_format() {
        let book = Book::from_xml(1, Language::En, BOOK).unwrap();
        let mechanics = Mechanics::from_xml(
            r#"<mechanics><sections><section id="sect1"/></sections></mechanics>"#,
            "<objects/>",
        )
        .unwrap();
        let mut errors = Vec::new();

        let mut checker = RuleChecker::new(&book, &mechanics, "sect1", &mut errors);
        checker.add_error(&Element::new("pick"), "something is wrong");

        assert_eq!(errors, vec!["Section sect1, rule pick: something is wrong"]);
    }

    #[test]
    fn test_walk_visits_children_of_failed_rules() {
        let book = Book::from_xml(1, Language::En, BOOK).unwrap();
        let mechanics = Mechanics::from_xml(
            r#"<mechanics><sections><section id="sect1">
                <pick><unknownRule><case from="3" to="1"/></unknownRule></pick>
            </section></sections></mechanics>"#,
            "<objects/>",
        )
        .unwrap();
        let mut errors = Vec::new();

        RuleChecker::new(&book, &mechanics, "sect1", &mut errors).check_section();

        assert_eq!(errors.len(), 2);
        assert!(errors[0].starts_with("Section sect1, rule pick:"));
        assert_eq!(errors[1], "Section sect1, rule case: Wrong range");
    }
}
