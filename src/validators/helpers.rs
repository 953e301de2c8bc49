//! Attribute helpers shared by the rule checks
//!
//! Each reference check records one error per unresolved id.

use crate::documents::Element;

use super::validation::RuleChecker;

/// Separator of multi-valued rule attributes (`hasObject="sword|axe"`)
pub const LIST_SEPARATOR: char = '|';

/// Read a rule attribute as a list of values.
///
/// With `allow_multiple` the attribute is split on [`LIST_SEPARATOR`];
/// otherwise the whole value is one entry. Absent attributes give an empty
/// list.
pub fn values_as_list<'e>(rule: &'e Element, property: &str, allow_multiple: bool) -> Vec<&'e str> {
    let Some(value) = rule.attr(property) else {
        return Vec::new();
    };
    if allow_multiple {
        value
            .split(LIST_SEPARATOR)
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .collect()
    } else {
        vec![value]
    }
}

/// Numeric bounds of a random table `case`: `value`, or the `from`/`to` pair
pub fn case_bounds(rule: &Element) -> Option<(i64, i64)> {
    if let Some(value) = rule.attr("value") {
        let value = value.trim().parse().ok()?;
        return Some((value, value));
    }
    let from = rule.attr("from")?.trim().parse().ok()?;
    let to = rule.attr("to")?.trim().parse().ok()?;
    Some((from, to))
}

impl RuleChecker<'_> {
    /// Check object ids against the object definitions
    pub fn check_objects(&mut self, rule: &Element, object_ids: &[&str]) {
        for id in object_ids {
            if self.mechanics.object(id).is_none() {
                self.add_error(rule, format!("Object id {} not found", id));
            }
        }
    }

    /// Check discipline ids against the book disciplines
    pub fn check_disciplines(&mut self, rule: &Element, discipline_ids: &[&str]) {
        if discipline_ids.is_empty() {
            return;
        }
        let unknown: Vec<&str> = discipline_ids
            .iter()
            .copied()
            .filter(|id| !self.disciplines().contains_key(*id))
            .collect();
        for id in unknown {
            self.add_error(rule, format!("Wrong discipline id: {}", id));
        }
    }

    /// Check section ids against the book sections
    pub fn check_sections(&mut self, rule: &Element, section_ids: &[&str]) {
        for id in section_ids {
            if self.book.section_xml(id).is_none() {
                self.add_error(rule, format!("Wrong section id: {}", id));
            }
        }
    }

    /// Check the current section text offers a choice to `section_id`
    pub fn check_section_choice(&mut self, rule: &Element, section_id: &str) {
        if !self.section.has_choice_to(section_id) {
            self.add_error(rule, format!("No choice to section {}", section_id));
        }
    }

    /// Numeric or boolean expression attributes are accepted as they are.
    // TODO: parse expressions once the evaluator grammar lives in this crate
    pub fn check_expression(&mut self, rule: &Element, property: &str) {
        let _ = rule.attr(property);
    }
}
