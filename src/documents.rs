//! XML document handling
//!
//! A small owned element tree used for book content, mechanics rules and
//! object definitions. Parsing and serialization go through `quick-xml`.

use crate::error::{Error, Result};
use crate::limits::Limits;
use indexmap::IndexMap;
use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};

/// XML Element in the document tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    /// Element name as written (including any prefix)
    pub name: String,
    /// Element attributes, in document order
    pub attributes: IndexMap<String, String>,
    /// Text content (if any)
    pub text: Option<String>,
    /// Child elements
    pub children: Vec<Element>,
}

impl Element {
    /// Create a new element
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: IndexMap::new(),
            text: None,
            children: Vec::new(),
        }
    }

    /// Builder-style attribute setter
    pub fn with_attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    /// Builder-style child appender
    pub fn with_child(mut self, child: Element) -> Self {
        self.children.push(child);
        self
    }

    /// Get the local name of the element
    pub fn local_name(&self) -> &str {
        match self.name.split_once(':') {
            Some((_, local)) => local,
            None => &self.name,
        }
    }

    /// Get an attribute value by name
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    /// Check whether an attribute is present
    pub fn has_attr(&self, name: &str) -> bool {
        self.attributes.contains_key(name)
    }

    /// Add a child element
    pub fn add_child(&mut self, child: Element) {
        self.children.push(child);
    }

    /// Set text content
    pub fn set_text(&mut self, text: String) {
        self.text = Some(text);
    }

    /// True when the element carries neither text nor child elements
    pub fn is_empty(&self) -> bool {
        self.children.is_empty() && self.text.as_deref().map_or(true, |t| t.trim().is_empty())
    }

    /// Find child elements by local name
    pub fn find_children(&self, local_name: &str) -> Vec<&Element> {
        self.children
            .iter()
            .filter(|e| e.local_name() == local_name)
            .collect()
    }

    /// Find the first direct child with the given local name
    pub fn find_child(&self, local_name: &str) -> Option<&Element> {
        self.children.iter().find(|e| e.local_name() == local_name)
    }

    /// Iterate over this element and all its descendants, depth-first in
    /// document order
    pub fn descendants(&self) -> Descendants<'_> {
        Descendants { stack: vec![self] }
    }

    /// First descendant (or self) named `local_name` whose `attr` equals `value`
    pub fn find_descendant(&self, local_name: &str, attr: &str, value: &str) -> Option<&Element> {
        self.descendants()
            .find(|e| e.local_name() == local_name && e.attr(attr) == Some(value))
    }

    fn write_to<W: std::io::Write>(&self, writer: &mut Writer<W>) -> Result<()> {
        let start = BytesStart::new(self.name.as_str()).with_attributes(
            self.attributes
                .iter()
                .map(|(k, v)| (k.as_str(), v.as_str())),
        );

        if self.children.is_empty() && self.text.is_none() {
            return write_event(writer, Event::Empty(start));
        }

        write_event(writer, Event::Start(start))?;
        if let Some(ref text) = self.text {
            write_event(writer, Event::Text(BytesText::new(text)))?;
        }
        for child in &self.children {
            child.write_to(writer)?;
        }
        write_event(writer, Event::End(BytesEnd::new(self.name.as_str())))
    }
}

fn write_event<W: std::io::Write>(writer: &mut Writer<W>, event: Event<'_>) -> Result<()> {
    writer
        .write_event(event)
        .map_err(|e| Error::Xml(format!("Failed to serialize XML: {}", e)))
}

/// Depth-first iterator over an element subtree
pub struct Descendants<'a> {
    stack: Vec<&'a Element>,
}

impl<'a> Iterator for Descendants<'a> {
    type Item = &'a Element;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.stack.pop()?;
        self.stack.extend(current.children.iter().rev());
        Some(current)
    }
}

/// XML Document representation
#[derive(Debug, Clone, Default)]
pub struct Document {
    /// Root element of the document
    pub root: Option<Element>,
}

impl Document {
    /// Create a new empty document
    pub fn new() -> Self {
        Self { root: None }
    }

    /// Parse an XML document from a string with default limits
    pub fn from_string(xml: &str) -> Result<Self> {
        Self::parse(xml, &Limits::default())
    }

    /// Parse an XML document, enforcing nesting depth and attribute limits
    pub fn parse(xml: &str, limits: &Limits) -> Result<Self> {
        let mut reader = Reader::from_reader(xml.as_bytes());
        reader.trim_text(true);

        let mut doc = Document::new();
        let mut element_stack: Vec<Element> = Vec::new();
        let mut buf = Vec::new();

        loop {
            match reader.read_event_into(&mut buf) {
                Ok(Event::Start(e)) => {
                    let element = Self::parse_element(&e, limits)?;
                    element_stack.push(element);
                    limits.check_xml_depth(element_stack.len())?;
                }
                Ok(Event::End(_)) => {
                    if let Some(current) = element_stack.pop() {
                        if let Some(parent) = element_stack.last_mut() {
                            parent.add_child(current);
                        } else {
                            doc.root = Some(current);
                        }
                    }
                }
                Ok(Event::Empty(e)) => {
                    let element = Self::parse_element(&e, limits)?;
                    if let Some(parent) = element_stack.last_mut() {
                        parent.add_child(element);
                    } else {
                        doc.root = Some(element);
                    }
                }
                Ok(Event::Text(e)) => {
                    if let Some(current) = element_stack.last_mut() {
                        let text = e
                            .unescape_with(resolve_entity)
                            .map_err(|e| Error::Xml(format!("Failed to unescape text: {}", e)))?;
                        append_text(current, &text);
                    }
                }
                Ok(Event::CData(e)) => {
                    if let Some(current) = element_stack.last_mut() {
                        let text = String::from_utf8_lossy(&e.into_inner()).into_owned();
                        append_text(current, &text);
                    }
                }
                Ok(Event::Eof) => break,
                Err(e) => {
                    return Err(Error::Xml(format!(
                        "Error parsing XML at position {}: {}",
                        reader.buffer_position(),
                        e
                    )))
                }
                _ => {} // Comments, processing instructions, doctype
            }
            buf.clear();
        }

        if !element_stack.is_empty() {
            return Err(Error::Xml(format!(
                "Unclosed element '{}'",
                element_stack[element_stack.len() - 1].name
            )));
        }

        Ok(doc)
    }

    fn parse_element(start: &BytesStart, limits: &Limits) -> Result<Element> {
        let name = std::str::from_utf8(start.name().as_ref())
            .map_err(|e| Error::Xml(format!("Invalid element name: {}", e)))?
            .to_string();

        let mut element = Element::new(name);

        for attr_result in start.attributes() {
            let attr = attr_result
                .map_err(|e| Error::Xml(format!("Failed to parse attribute: {}", e)))?;

            let attr_name = std::str::from_utf8(attr.key.as_ref())
                .map_err(|e| Error::Xml(format!("Invalid attribute name: {}", e)))?
                .to_string();

            let attr_value = attr
                .unescape_value_with(resolve_entity)
                .map_err(|e| Error::Xml(format!("Failed to unescape attribute value: {}", e)))?
                .into_owned();

            element.attributes.insert(attr_name, attr_value);
        }
        limits.check_attributes(element.attributes.len())?;

        Ok(element)
    }

    /// Get the root element
    pub fn root(&self) -> Option<&Element> {
        self.root.as_ref()
    }

    /// Serialize the document back to indented XML text.
    ///
    /// Text is written ahead of an element's children, so interleaved mixed
    /// content does not round-trip in its original order.
    pub fn to_xml_string(&self) -> Result<String> {
        let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);
        if let Some(ref root) = self.root {
            root.write_to(&mut writer)?;
        }
        String::from_utf8(writer.into_inner())
            .map_err(|e| Error::Xml(format!("Serialized XML is not UTF-8: {}", e)))
    }
}

fn append_text(element: &mut Element, text: &str) {
    if text.trim().is_empty() {
        return;
    }
    match element.text {
        Some(ref mut existing) => {
            existing.push(' ');
            existing.push_str(text);
        }
        None => element.set_text(text.to_string()),
    }
}

/// Entities used by Project Aon book files. Their DTD is not loaded, so
/// unknown entities expand to nothing rather than failing the parse.
fn resolve_entity(name: &str) -> Option<&'static str> {
    let value = match name {
        "nbsp" | "ensp" | "emsp" | "thinspace" => " ",
        "ndash" => "\u{2013}",
        "mdash" => "\u{2014}",
        "lsquot" | "lsquo" => "\u{2018}",
        "rsquot" | "rsquo" | "apos" => "\u{2019}",
        "ldquot" | "ldquo" => "\u{201C}",
        "rdquot" | "rdquo" => "\u{201D}",
        "hellip" | "ellips" => "\u{2026}",
        "frac12" => "\u{00BD}",
        "copy" => "\u{00A9}",
        "eacute" => "\u{00E9}",
        "aacute" => "\u{00E1}",
        "iacute" => "\u{00ED}",
        "oacute" => "\u{00F3}",
        "uacute" => "\u{00FA}",
        "ntilde" => "\u{00F1}",
        _ => "",
    };
    Some(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple_xml() {
        let xml = r#"<root><child>text</child></root>"#;
        let doc = Document::from_string(xml).unwrap();

        let root = doc.root.unwrap();
        assert_eq!(root.local_name(), "root");
        assert_eq!(root.children.len(), 1);
        assert_eq!(root.children[0].local_name(), "child");
        assert_eq!(root.children[0].text.as_deref(), Some("text"));
    }

    #[test]
    fn test_parse_with_attributes() {
        let xml = r#"<pick objectId="sword" count="1"/>"#;
        let doc = Document::from_string(xml).unwrap();

        let root = doc.root.unwrap();
        assert_eq!(root.attr("objectId"), Some("sword"));
        assert_eq!(root.attr("count"), Some("1"));
        assert!(!root.has_attr("class"));
    }

    #[test]
    fn test_unknown_entities_do_not_fail() {
        let xml = r#"<p>Turn to &link.project.website; now &ndash; quickly</p>"#;
        let doc = Document::from_string(xml).unwrap();

        let text = doc.root.unwrap().text.unwrap();
        assert!(text.contains("Turn to"));
        assert!(text.contains('\u{2013}'));
    }

    #[test]
    fn test_descendants_document_order() {
        let xml = r#"<a><b><c/></b><d/></a>"#;
        let doc = Document::from_string(xml).unwrap();

        let names: Vec<&str> = doc.root().unwrap().descendants().map(|e| e.local_name()).collect();
        assert_eq!(names, vec!["a", "b", "c", "d"]);
    }

    #[test]
    fn test_find_descendant() {
        let xml = r#"<data><p><choice idref="sect2"/></p><choice idref="sect3"/></data>"#;
        let doc = Document::from_string(xml).unwrap();
        let root = doc.root().unwrap();

        assert!(root.find_descendant("choice", "idref", "sect3").is_some());
        assert!(root.find_descendant("choice", "idref", "sect4").is_none());
    }

    #[test]
    fn test_depth_limit() {
        let limits = Limits {
            max_xml_depth: 2,
            ..Limits::default()
        };
        let result = Document::parse("<a><b><c/></b></a>", &limits);
        assert!(result.is_ok());

        let result = Document::parse("<a><b><c><d/></c></b></a>", &limits);
        assert!(matches!(result, Err(Error::LimitExceeded(_))));
    }

    #[test]
    fn test_unclosed_element() {
        assert!(Document::from_string("<a><b></b>").is_err());
    }

    #[test]
    fn test_serialize_reparses_equal() {
        let xml = r#"<mechanics lastSection="sect3"><sections><section id="sect1"><pick class="weapon" count="1"/><message en="Fight &amp; win"/></section></sections></mechanics>"#;
        let doc = Document::from_string(xml).unwrap();

        let text = doc.to_xml_string().unwrap();
        let again = Document::from_string(&text).unwrap();

        assert_eq!(doc.root, again.root);
        assert!(text.contains('\n'));
    }
}
