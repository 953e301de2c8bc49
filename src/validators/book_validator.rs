//! Whole-book mechanics validation

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::book::{Book, Language};
use crate::error::{Error, Result};
use crate::mechanics::Mechanics;
use crate::repository::BookRepository;
use crate::schema::{sanitize_for_schema, SchemaCache, SchemaValidator, XsdValidator};
use crate::section::Section;

use super::validation::RuleChecker;

/// Name the mechanics document is validated under
pub const MECHANICS_FILENAME: &str = "mechanics.xml";

/// Name of the mechanics schema
pub const SCHEMA_FILENAME: &str = "mechanics.xsd";

/// Arguments handed to the schema validator
pub const SCHEMA_VALIDATOR_ARGS: [&str; 4] =
    ["--noout", "--schema", SCHEMA_FILENAME, MECHANICS_FILENAME];

/// Error recorded when schema validation is requested before the schema
/// text has been downloaded
pub const SCHEMA_NOT_LOADED: &str = "XSD for validation not loaded";

/// Validates the mechanics of one book against its content and the schema.
///
/// Findings are accumulated as strings in [`errors`](Self::errors), in
/// depth-first document order.
pub struct BookValidator {
    book: Book,
    mechanics: Mechanics,
    schema: Arc<SchemaCache>,
    schema_validator: Box<dyn SchemaValidator>,
    errors: Vec<String>,
}

impl BookValidator {
    /// Create a validator with an empty schema cache and the bundled XSD
    /// validator
    pub fn new(mechanics: Mechanics, book: Book) -> Self {
        Self {
            book,
            mechanics,
            schema: Arc::new(SchemaCache::new()),
            schema_validator: Box::new(XsdValidator::new()),
            errors: Vec::new(),
        }
    }

    /// Use a shared schema cache
    pub fn with_schema(mut self, schema: Arc<SchemaCache>) -> Self {
        self.schema = schema;
        self
    }

    /// Use another schema validation backend
    pub fn with_schema_validator(mut self, validator: impl SchemaValidator + 'static) -> Self {
        self.schema_validator = Box::new(validator);
        self
    }

    /// Download the book, its mechanics and the object definitions, and
    /// build a validator for them.
    ///
    /// The three downloads run concurrently. If any of them fails, no
    /// validator is built and [`Error::Download`] is returned.
    pub async fn download(
        repository: &BookRepository,
        number: u32,
        language: Language,
        schema: Arc<SchemaCache>,
    ) -> Result<Self> {
        info!(number, %language, "downloading book files");

        let (book, rules, objects) = tokio::try_join!(
            repository.download_book(number, language),
            repository.download_mechanics(number, language),
            repository.download_objects(number, language),
        )
        .map_err(Error::download)?;

        let mechanics = Mechanics::from_xml_with_limits(&rules, &objects, repository.limits())
            .map_err(Error::download)?;

        Ok(Self::new(mechanics, book).with_schema(schema))
    }

    /// Validate the schema and the rules of every section on the main path
    /// of the book, from the initial section up to the last one. The last
    /// section itself is not checked.
    ///
    /// Only sections reached through "next section" links are checked;
    /// sections reachable only through choices are not.
    pub fn validate_book(&mut self) {
        self.errors.clear();
        self.validate_xml();

        let last_section = self.mechanics.last_section_id().map(str::to_owned);
        if last_section.is_none() {
            warn!("mechanics have no lastSection, following next links to the end");
        }

        let mut visited = HashSet::new();
        let mut current = Book::INITIAL_SECTION.to_string();
        while last_section.as_deref() != Some(current.as_str()) {
            self.check_section(&current);
            visited.insert(current.clone());

            let next = Section::new(&self.book, &current, &self.mechanics)
                .next_section_id()
                .map(str::to_owned);
            match next {
                Some(next) if visited.contains(&next) => {
                    warn!(section = %current, next = %next, "section links loop back, stopping");
                    break;
                }
                Some(next) => current = next,
                None => {
                    if last_section.is_some() {
                        warn!(section = %current, "no next section before the last section");
                    }
                    break;
                }
            }
        }

        info!(
            sections = visited.len(),
            errors = self.errors.len(),
            "book validated"
        );
    }

    /// Validate the rules of a single section
    pub fn validate_section(&mut self, section_id: &str) {
        self.errors.clear();
        self.check_section(section_id);
    }

    /// Validate the mechanics document against the schema.
    ///
    /// The document is re-serialized before validation, so reported line
    /// numbers refer to the serialized text, not to the downloaded file.
    pub fn validate_xml(&mut self) {
        let Some(schema) = self.schema.get() else {
            self.errors.push(SCHEMA_NOT_LOADED.to_string());
            return;
        };

        let xml = match self.mechanics.to_xml_string() {
            Ok(xml) => sanitize_for_schema(&xml),
            Err(e) => {
                self.errors.push(e.to_string());
                return;
            }
        };

        let output = self
            .schema_validator
            .validate(&xml, schema, &SCHEMA_VALIDATOR_ARGS);
        if output != format!("{} validates", MECHANICS_FILENAME) {
            debug!(%output, "schema validation failed");
            self.errors.push(output);
        }
    }

    /// Findings of the last validation
    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    /// Consume the validator, returning its findings
    pub fn into_errors(self) -> Vec<String> {
        self.errors
    }

    /// Validated book
    pub fn book(&self) -> &Book {
        &self.book
    }

    /// Validated mechanics
    pub fn mechanics(&self) -> &Mechanics {
        &self.mechanics
    }

    fn check_section(&mut self, section_id: &str) {
        debug!(section = section_id, "checking section rules");
        RuleChecker::new(&self.book, &self.mechanics, section_id, &mut self.errors).check_section();
    }
}

impl fmt::Debug for BookValidator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BookValidator")
            .field("book", &self.book.number())
            .field("language", &self.book.language())
            .field("schema_loaded", &self.schema.is_loaded())
            .field("errors", &self.errors.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BOOK: &str = r#"<gamebook>
        <section id="sect1"><meta><link class="next" idref="sect2"/></meta><data><p>1</p></data></section>
        <section id="sect2"><meta><link class="next" idref="sect3"/></meta><data><p>2</p></data></section>
        <section id="sect3"><meta><link class="next" idref="sect4"/></meta><data><p>3</p></data></section>
        <section id="sect4"><meta/><data><p>4</p></data></section>
    </gamebook>"#;

    fn validator(rules: &str) -> BookValidator {
        let book = Book::from_xml(1, Language::En, BOOK).unwrap();
        let mechanics = Mechanics::from_xml(rules, "<objects/>").unwrap();
        BookValidator::new(mechanics, book)
    }

    /// Stub backend reporting a fixed output
    struct FixedOutput(&'static str);

    impl SchemaValidator for FixedOutput {
        fn validate(&self, _xml: &str, _schema: &str, _args: &[&str]) -> String {
            self.0.to_string()
        }
    }

    #[test]
    fn test_schema_not_loaded() {
        let mut v = validator(r#"<mechanics lastSection="sect1"/>"#);
        v.validate_xml();
        assert_eq!(v.errors(), [SCHEMA_NOT_LOADED]);
    }

    #[test]
    fn test_schema_output_recorded_verbatim() {
        let schema = Arc::new(SchemaCache::with_text("<xs:schema/>"));

        let mut v = validator(r#"<mechanics lastSection="sect1"/>"#)
            .with_schema(schema.clone())
            .with_schema_validator(FixedOutput("mechanics.xml validates"));
        v.validate_xml();
        assert!(v.errors().is_empty());

        let mut v = validator(r#"<mechanics lastSection="sect1"/>"#)
            .with_schema(schema)
            .with_schema_validator(FixedOutput("mechanics.xml:3: element foo: bad"));
        v.validate_xml();
        assert_eq!(v.errors(), ["mechanics.xml:3: element foo: bad"]);
    }

    #[test]
    fn test_validate_book_follows_next_links_to_last_section() {
        let mut v = validator(
            r#"<mechanics lastSection="sect4"><sections>
                <section id="sect1"><case from="2" to="1"/></section>
                <section id="sect3"><pick/></section>
                <section id="sect4"><pick/></section>
            </sections></mechanics>"#,
        );
        v.validate_book();

        assert_eq!(
            v.errors(),
            [
                SCHEMA_NOT_LOADED,
                "Section sect1, rule case: Wrong range",
                "Section sect3, rule pick: Attribute objectId or class is required",
            ]
        );
    }

    #[test]
    fn test_validate_book_skips_last_section() {
        let mut v = validator(
            r#"<mechanics lastSection="sect2"><sections>
                <section id="sect2"><pick/></section>
            </sections></mechanics>"#,
        );
        v.validate_book();

        assert_eq!(v.errors(), [SCHEMA_NOT_LOADED]);
    }

    #[test]
    fn test_validate_book_initial_section_is_last() {
        let mut v = validator(
            r#"<mechanics lastSection="sect1"><sections>
                <section id="sect1"><pick/></section>
            </sections></mechanics>"#,
        );
        v.validate_book();

        assert_eq!(v.errors(), [SCHEMA_NOT_LOADED]);
    }

    #[test]
    fn test_validate_book_stops_without_next_link() {
        let mut v = validator(
            r#"<mechanics lastSection="sect99"><sections>
                <section id="sect4"><pick/></section>
            </sections></mechanics>"#,
        );
        v.validate_book();
        assert_eq!(v.errors().len(), 2);
        assert!(v.errors()[1].starts_with("Section sect4"));
    }

    #[test]
    fn test_validate_section_resets_errors() {
        let mut v = validator(
            r#"<mechanics lastSection="sect4"><sections>
                <section id="sect1"><pick/></section>
                <section id="sect2"><pick objectId="x"/></section>
            </sections></mechanics>"#,
        );

        v.validate_section("sect1");
        assert_eq!(v.errors().len(), 1);

        v.validate_section("sect2");
        assert!(v.errors().is_empty());
    }
}
