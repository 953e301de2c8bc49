//! Structural XSD checker
//!
//! Interprets the schema tree directly with `roxmltree` instead of compiling
//! it. Supported: global and local element declarations, named and anonymous
//! complex types with sequence/choice/all groups, group and attributeGroup
//! references, complexContent/simpleContent extension, element and attribute
//! wildcards, member order and occurrence bounds in sequences, required and undeclared
//! attributes, enumeration and pattern facets, and the common numeric and
//! boolean builtins. Includes, imports and identity constraints are ignored.

use super::SchemaValidator;
use crate::XSD_1_0_NAMESPACE;
use regex::Regex;
use roxmltree::{Document, Node};
use std::collections::HashMap;
use std::fmt::Display;

/// Nesting bound for type derivation and group references
const MAX_SCHEMA_DEPTH: usize = 32;

/// Default [`SchemaValidator`] backed by `roxmltree`
#[derive(Debug, Default, Clone, Copy)]
pub struct XsdValidator;

impl XsdValidator {
    /// Create a new validator
    pub fn new() -> Self {
        Self
    }
}

impl SchemaValidator for XsdValidator {
    fn validate(&self, xml: &str, schema: &str, args: &[&str]) -> String {
        let filename = args.last().copied().unwrap_or("document.xml");

        let schema_doc = match Document::parse(schema) {
            Ok(doc) => doc,
            Err(e) => return format!("Schemas parser error : {}", e),
        };
        let grammar = match Grammar::from_document(&schema_doc) {
            Ok(grammar) => grammar,
            Err(e) => return format!("Schemas parser error : {}", e),
        };

        let doc = match Document::parse(xml) {
            Ok(doc) => doc,
            Err(e) => {
                return format!("{}:{}: parser error : {}", filename, e.pos().row, e);
            }
        };

        let mut run = Run {
            filename,
            doc: &doc,
            errors: Vec::new(),
        };
        grammar.validate_root(&mut run, doc.root_element());

        if run.errors.is_empty() {
            format!("{} validates", filename)
        } else {
            run.errors.push(format!("{} fails to validate", filename));
            run.errors.join("\n")
        }
    }
}

/// Error collector for one validation run
struct Run<'d, 'x> {
    filename: &'d str,
    doc: &'d Document<'x>,
    errors: Vec<String>,
}

impl Run<'_, '_> {
    fn line(&self, node: Node) -> u32 {
        self.doc.text_pos_at(node.range().start).row
    }

    fn element_error(&mut self, node: Node, detail: impl Display) {
        let name = node.tag_name().name();
        let line = self.line(node);
        self.errors.push(format!(
            "{}:{}: element {}: Schemas validity error : Element '{}': {}",
            self.filename, line, name, name, detail
        ));
    }

    fn attribute_error(&mut self, node: Node, attribute: &str, detail: impl Display) {
        let name = node.tag_name().name();
        let line = self.line(node);
        self.errors.push(format!(
            "{}:{}: element {}: Schemas validity error : Element '{}', attribute '{}': {}",
            self.filename, line, name, name, attribute, detail
        ));
    }
}

/// Type of an element declaration
enum TypeDef<'a, 'i> {
    Complex(Node<'a, 'i>),
    Simple(SimpleRef<'a, 'i>),
    Any,
}

/// Simple type reference: a builtin by local name or an `xs:simpleType` node
enum SimpleRef<'a, 'i> {
    Builtin(&'a str),
    Defined(Node<'a, 'i>),
}

/// Flattened view of a complex type
#[derive(Default)]
struct ContentModel<'a, 'i> {
    attributes: Vec<AttributeUse<'a, 'i>>,
    any_attribute: bool,
    children: Vec<Particle<'a, 'i>>,
    any_element: bool,
    mixed: bool,
    simple_content: bool,
}

struct AttributeUse<'a, 'i> {
    name: &'a str,
    required: bool,
    decl: Node<'a, 'i>,
}

struct Particle<'a, 'i> {
    name: &'a str,
    decl: Node<'a, 'i>,
    min: u32,
    max: Option<u32>,
    /// Inside a choice, an optional group or a repeated group: occurrence
    /// bounds are not checked
    relaxed: bool,
    /// Member of a sequence: must not appear before an earlier member
    ordered: bool,
}

/// Global components of a schema document
struct Grammar<'a, 'i> {
    elements: HashMap<&'a str, Node<'a, 'i>>,
    attributes: HashMap<&'a str, Node<'a, 'i>>,
    complex_types: HashMap<&'a str, Node<'a, 'i>>,
    simple_types: HashMap<&'a str, Node<'a, 'i>>,
    groups: HashMap<&'a str, Node<'a, 'i>>,
    attribute_groups: HashMap<&'a str, Node<'a, 'i>>,
}

fn is_xsd(node: &Node) -> bool {
    node.is_element() && node.tag_name().namespace() == Some(XSD_1_0_NAMESPACE)
}

fn xsd_children<'a, 'i>(node: Node<'a, 'i>) -> impl Iterator<Item = Node<'a, 'i>> {
    node.children().filter(is_xsd)
}

/// Strip the prefix of a QName attribute value
fn local_part(qname: &str) -> &str {
    qname.rsplit_once(':').map_or(qname, |(_, local)| local)
}

/// Occurrence bound; `None` is unbounded. Values are checked when the
/// grammar is built.
fn parse_occurs(value: Option<&str>) -> Option<u32> {
    match value {
        None => Some(1),
        Some("unbounded") => None,
        Some(v) => Some(v.trim().parse().unwrap_or(1)),
    }
}

/// Reject occurrence attributes that are not `xs:nonNegativeInteger`
/// (or `unbounded`, for `maxOccurs`)
fn check_occurs(node: Node) -> Result<(), String> {
    for (attribute, expected) in [
        ("minOccurs", "xs:nonNegativeInteger"),
        ("maxOccurs", "(xs:nonNegativeInteger | unbounded)"),
    ] {
        let Some(value) = node.attribute(attribute) else {
            continue;
        };
        let unbounded = attribute == "maxOccurs" && value == "unbounded";
        if !unbounded && value.trim().parse::<u32>().is_err() {
            return Err(format!(
                "Element '{{{}}}{}', attribute '{}': The value '{}' is not valid. Expected is '{}'.",
                XSD_1_0_NAMESPACE,
                node.tag_name().name(),
                attribute,
                value,
                expected
            ));
        }
    }
    Ok(())
}

impl<'a, 'i> Grammar<'a, 'i> {
    fn from_document(doc: &'a Document<'i>) -> Result<Self, String> {
        let root = doc.root_element();
        if !is_xsd(&root) || root.tag_name().name() != "schema" {
            return Err("The XML document is not a schema document.".to_string());
        }

        let mut grammar = Grammar {
            elements: HashMap::new(),
            attributes: HashMap::new(),
            complex_types: HashMap::new(),
            simple_types: HashMap::new(),
            groups: HashMap::new(),
            attribute_groups: HashMap::new(),
        };

        for child in xsd_children(root) {
            let Some(name) = child.attribute("name") else {
                continue;
            };
            let table = match child.tag_name().name() {
                "element" => &mut grammar.elements,
                "attribute" => &mut grammar.attributes,
                "complexType" => &mut grammar.complex_types,
                "simpleType" => &mut grammar.simple_types,
                "group" => &mut grammar.groups,
                "attributeGroup" => &mut grammar.attribute_groups,
                _ => continue,
            };
            table.insert(name, child);
        }

        for node in root.descendants().filter(is_xsd) {
            check_occurs(node)?;
        }

        Ok(grammar)
    }

    fn validate_root(&self, run: &mut Run, root: Node) {
        match self.elements.get(root.tag_name().name()) {
            Some(decl) => self.validate_element(run, root, *decl),
            None => run.element_error(
                root,
                "No matching global declaration available for the validation root.",
            ),
        }
    }

    // =========================================================================
    // Type resolution
    // =========================================================================

    fn element_type(&self, decl: Node<'a, 'i>) -> TypeDef<'a, 'i> {
        if let Some(type_name) = decl.attribute("type") {
            let local = local_part(type_name);
            if let Some(ct) = self.complex_types.get(local) {
                return TypeDef::Complex(*ct);
            }
            if local == "anyType" {
                return TypeDef::Any;
            }
            return TypeDef::Simple(self.simple_ref(type_name));
        }

        for child in xsd_children(decl) {
            match child.tag_name().name() {
                "complexType" => return TypeDef::Complex(child),
                "simpleType" => return TypeDef::Simple(SimpleRef::Defined(child)),
                _ => {}
            }
        }
        TypeDef::Any
    }

    fn simple_ref(&self, type_name: &'a str) -> SimpleRef<'a, 'i> {
        let local = local_part(type_name);
        match self.simple_types.get(local) {
            Some(st) => SimpleRef::Defined(*st),
            None => SimpleRef::Builtin(local),
        }
    }

    fn attribute_type(&self, decl: Node<'a, 'i>) -> Option<SimpleRef<'a, 'i>> {
        if let Some(type_name) = decl.attribute("type") {
            return Some(self.simple_ref(type_name));
        }
        xsd_children(decl)
            .find(|c| c.tag_name().name() == "simpleType")
            .map(SimpleRef::Defined)
    }

    // =========================================================================
    // Content models
    // =========================================================================

    fn content_model(&self, complex: Node<'a, 'i>) -> ContentModel<'a, 'i> {
        let mut model = ContentModel {
            mixed: complex.attribute("mixed") == Some("true"),
            ..ContentModel::default()
        };
        self.collect_complex(complex, &mut model, 0);
        model
    }

    fn collect_complex(&self, node: Node<'a, 'i>, model: &mut ContentModel<'a, 'i>, depth: usize) {
        if depth > MAX_SCHEMA_DEPTH {
            return;
        }

        for child in xsd_children(node) {
            match child.tag_name().name() {
                "sequence" | "all" | "choice" | "group" => {
                    self.collect_particle(child, model, false, false, depth + 1)
                }
                "attribute" => self.collect_attribute(child, model),
                "attributeGroup" => self.collect_attribute_group(child, model, depth + 1),
                "anyAttribute" => model.any_attribute = true,
                "complexContent" | "simpleContent" => {
                    if child.tag_name().name() == "simpleContent" {
                        model.simple_content = true;
                    }
                    if child.attribute("mixed") == Some("true") {
                        model.mixed = true;
                    }
                    for derivation in xsd_children(child) {
                        if derivation.tag_name().name() == "extension" {
                            let base = derivation
                                .attribute("base")
                                .and_then(|b| self.complex_types.get(local_part(b)));
                            if let Some(base) = base {
                                self.collect_complex(*base, model, depth + 1);
                            }
                        }
                        self.collect_complex(derivation, model, depth + 1);
                    }
                }
                _ => {}
            }
        }
    }

    fn collect_particle(
        &self,
        node: Node<'a, 'i>,
        model: &mut ContentModel<'a, 'i>,
        relaxed: bool,
        ordered: bool,
        depth: usize,
    ) {
        if depth > MAX_SCHEMA_DEPTH {
            return;
        }

        // Occurrence bounds of a group relax every particle below it
        let group_relaxed = relaxed
            || node.attribute("minOccurs") == Some("0")
            || parse_occurs(node.attribute("maxOccurs")) != Some(1);

        match node.tag_name().name() {
            "element" => {
                let (name, decl) = match (node.attribute("name"), node.attribute("ref")) {
                    (Some(name), _) => (name, node),
                    (None, Some(reference)) => {
                        let local = local_part(reference);
                        match self.elements.get(local) {
                            Some(decl) => (local, *decl),
                            None => return,
                        }
                    }
                    (None, None) => return,
                };
                let min = node
                    .attribute("minOccurs")
                    .and_then(|v| v.trim().parse().ok())
                    .unwrap_or(1);
                model.children.push(Particle {
                    name,
                    decl,
                    min,
                    max: parse_occurs(node.attribute("maxOccurs")),
                    relaxed,
                    ordered,
                });
            }
            "sequence" => {
                for child in xsd_children(node) {
                    self.collect_particle(child, model, group_relaxed, true, depth + 1);
                }
            }
            "all" => {
                for child in xsd_children(node) {
                    self.collect_particle(child, model, group_relaxed, false, depth + 1);
                }
            }
            "choice" => {
                for child in xsd_children(node) {
                    self.collect_particle(child, model, true, false, depth + 1);
                }
            }
            "group" => {
                let definition = node
                    .attribute("ref")
                    .and_then(|r| self.groups.get(local_part(r)));
                if let Some(definition) = definition {
                    for child in xsd_children(*definition) {
                        self.collect_particle(child, model, group_relaxed, ordered, depth + 1);
                    }
                }
            }
            "any" => model.any_element = true,
            _ => {}
        }
    }

    fn collect_attribute(&self, node: Node<'a, 'i>, model: &mut ContentModel<'a, 'i>) {
        let required = node.attribute("use") == Some("required");
        if node.attribute("use") == Some("prohibited") {
            return;
        }

        let (name, decl) = match (node.attribute("name"), node.attribute("ref")) {
            (Some(name), _) => (name, node),
            (None, Some(reference)) => {
                let local = local_part(reference);
                (local, self.attributes.get(local).copied().unwrap_or(node))
            }
            (None, None) => return,
        };
        model.attributes.push(AttributeUse {
            name,
            required,
            decl,
        });
    }

    fn collect_attribute_group(
        &self,
        node: Node<'a, 'i>,
        model: &mut ContentModel<'a, 'i>,
        depth: usize,
    ) {
        if depth > MAX_SCHEMA_DEPTH {
            return;
        }
        let definition = node
            .attribute("ref")
            .and_then(|r| self.attribute_groups.get(local_part(r)));
        if let Some(definition) = definition {
            for child in xsd_children(*definition) {
                match child.tag_name().name() {
                    "attribute" => self.collect_attribute(child, model),
                    "attributeGroup" => self.collect_attribute_group(child, model, depth + 1),
                    "anyAttribute" => model.any_attribute = true,
                    _ => {}
                }
            }
        }
    }

    // =========================================================================
    // Instance validation
    // =========================================================================

    fn validate_element(&self, run: &mut Run, node: Node, decl: Node<'a, 'i>) {
        match self.element_type(decl) {
            TypeDef::Any => {}
            TypeDef::Simple(simple) => {
                if node.children().any(|c| c.is_element()) {
                    run.element_error(
                        node,
                        "Element content is not allowed, because the content type is a simple type definition.",
                    );
                }
                for attr in node.attributes().filter(|a| a.namespace().is_none()) {
                    run.attribute_error(
                        node,
                        attr.name(),
                        format!("The attribute '{}' is not allowed.", attr.name()),
                    );
                }
                let text = text_content(node);
                if let Some(detail) = self.check_simple(&simple, text.trim(), 0) {
                    run.element_error(node, detail);
                }
            }
            TypeDef::Complex(complex) => {
                let model = self.content_model(complex);
                self.validate_attributes(run, node, &model);
                self.validate_children(run, node, &model);
            }
        }
    }

    fn validate_attributes(&self, run: &mut Run, node: Node, model: &ContentModel<'a, 'i>) {
        for attr in node.attributes() {
            // xsi:*, xml:* and other qualified attributes
            if attr.namespace().is_some() {
                continue;
            }
            match model.attributes.iter().find(|a| a.name == attr.name()) {
                Some(usage) => {
                    let detail = self
                        .attribute_type(usage.decl)
                        .and_then(|simple| self.check_simple(&simple, attr.value().trim(), 0));
                    if let Some(detail) = detail {
                        run.attribute_error(node, attr.name(), detail);
                    }
                }
                None if model.any_attribute => {}
                None => run.attribute_error(
                    node,
                    attr.name(),
                    format!("The attribute '{}' is not allowed.", attr.name()),
                ),
            }
        }

        for usage in model.attributes.iter().filter(|a| a.required) {
            if node.attribute(usage.name).is_none() {
                run.element_error(
                    node,
                    format!("The attribute '{}' is required but missing.", usage.name),
                );
            }
        }
    }

    fn validate_children(&self, run: &mut Run, node: Node, model: &ContentModel<'a, 'i>) {
        let text_allowed = model.mixed || model.simple_content;
        let has_text = node
            .children()
            .any(|c| c.is_text() && !c.text().unwrap_or("").trim().is_empty());
        if has_text && !text_allowed {
            let detail = if model.children.is_empty() && !model.any_element {
                "Character content is not allowed, because the content type is empty."
            } else {
                "Character content other than whitespace is not allowed because the content type is 'element-only'."
            };
            run.element_error(node, detail);
        }

        let mut counts: HashMap<&str, u32> = HashMap::new();
        // Position of the furthest sequence member seen so far
        let mut position = 0;
        for child in node.children().filter(|c| c.is_element()) {
            let name = child.tag_name().name();
            match model.children.iter().enumerate().find(|(_, p)| p.name == name) {
                Some((index, particle)) => {
                    let count = counts.entry(particle.name).or_insert(0);
                    *count += 1;
                    let exceeded = particle.max.is_some_and(|max| *count > max);
                    let in_order = particle.relaxed || !particle.ordered || index >= position;
                    if particle.ordered && !particle.relaxed {
                        position = position.max(index);
                    }
                    if (exceeded && !particle.relaxed) || !in_order {
                        run.element_error(child, "This element is not expected.");
                    } else {
                        self.validate_element(run, child, particle.decl);
                    }
                }
                None if model.any_element => {}
                None => run.element_error(child, "This element is not expected."),
            }
        }

        let missing: Vec<&str> = model
            .children
            .iter()
            .filter(|p| !p.relaxed && counts.get(p.name).copied().unwrap_or(0) < p.min)
            .map(|p| p.name)
            .collect();
        if !missing.is_empty() {
            run.element_error(
                node,
                format!("Missing child element(s). Expected is ( {} ).", missing.join(", ")),
            );
        }
    }

    // =========================================================================
    // Simple values
    // =========================================================================

    fn check_simple(&self, simple: &SimpleRef<'a, 'i>, value: &str, depth: usize) -> Option<String> {
        if depth > MAX_SCHEMA_DEPTH {
            return None;
        }

        let definition = match simple {
            SimpleRef::Builtin(name) => return check_builtin(name, value),
            SimpleRef::Defined(node) => *node,
        };

        // Lists and unions are not checked
        let restriction = xsd_children(definition).find(|c| c.tag_name().name() == "restriction")?;

        let base = match restriction.attribute("base") {
            Some(base) => Some(self.simple_ref(base)),
            None => xsd_children(restriction)
                .find(|c| c.tag_name().name() == "simpleType")
                .map(SimpleRef::Defined),
        };
        if let Some(base) = base {
            if let Some(detail) = self.check_simple(&base, value, depth + 1) {
                return Some(detail);
            }
        }

        let enumeration: Vec<&str> = xsd_children(restriction)
            .filter(|c| c.tag_name().name() == "enumeration")
            .filter_map(|c| c.attribute("value"))
            .collect();
        if !enumeration.is_empty() && !enumeration.contains(&value) {
            let set: Vec<String> = enumeration.iter().map(|e| format!("'{}'", e)).collect();
            return Some(format!(
                "[facet 'enumeration'] The value '{}' is not an element of the set {{{}}}.",
                value,
                set.join(", ")
            ));
        }

        for pattern in xsd_children(restriction)
            .filter(|c| c.tag_name().name() == "pattern")
            .filter_map(|c| c.attribute("value"))
        {
            // XSD regular expressions that the regex crate rejects are skipped
            let Ok(re) = Regex::new(&format!("^(?:{})$", pattern)) else {
                continue;
            };
            if !re.is_match(value) {
                return Some(format!(
                    "[facet 'pattern'] The value '{}' is not accepted by the pattern '{}'.",
                    value, pattern
                ));
            }
        }

        None
    }
}

fn text_content(node: Node) -> String {
    node.children()
        .filter(|c| c.is_text())
        .filter_map(|c| c.text())
        .collect()
}

fn check_builtin(name: &str, value: &str) -> Option<String> {
    let valid = match name {
        "integer" | "int" | "long" | "short" | "byte" => value.parse::<i64>().is_ok(),
        "nonNegativeInteger" | "unsignedLong" | "unsignedInt" | "unsignedShort" => {
            value.parse::<u64>().is_ok()
        }
        "positiveInteger" => value.parse::<u64>().map_or(false, |v| v > 0),
        "boolean" => matches!(value, "true" | "false" | "1" | "0"),
        "decimal" | "float" | "double" => value.parse::<f64>().is_ok(),
        _ => true,
    };
    if valid {
        None
    } else {
        Some(format!(
            "'{}' is not a valid value of the atomic type 'xs:{}'.",
            value, name
        ))
    }
}
