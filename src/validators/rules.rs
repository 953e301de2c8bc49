//! Rule kinds and their checks
//!
//! Only the rule kinds listed in [`RuleKind`] have checks of their own. Any
//! other rule element is still walked so the rules nested inside it get
//! checked.

use crate::book::Language;
use crate::documents::Element;

use super::helpers::{case_bounds, values_as_list};
use super::ranges::{check_coverage, RANDOM_RANGE, RANDOM_RANGE_ZERO_AS_TEN};
use super::validation::RuleChecker;

/// Check function for one rule element
pub type RuleCheck = fn(&mut RuleChecker<'_>, &Element);

/// Rule elements with a dedicated check
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RuleKind {
    /// Pick an object (`pick`)
    Pick,
    /// Random number table (`randomTable`)
    RandomTable,
    /// Case of a random table (`case`)
    Case,
    /// Conditional rules (`test`)
    Test,
}

impl RuleKind {
    /// Every kind with a check
    pub const ALL: [RuleKind; 4] = [
        RuleKind::Pick,
        RuleKind::RandomTable,
        RuleKind::Case,
        RuleKind::Test,
    ];

    /// Rule kind of an element tag
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "pick" => Some(RuleKind::Pick),
            "randomTable" => Some(RuleKind::RandomTable),
            "case" => Some(RuleKind::Case),
            "test" => Some(RuleKind::Test),
            _ => None,
        }
    }

    /// Element tag of this kind
    pub fn tag(&self) -> &'static str {
        match self {
            RuleKind::Pick => "pick",
            RuleKind::RandomTable => "randomTable",
            RuleKind::Case => "case",
            RuleKind::Test => "test",
        }
    }

    /// Check function of this kind
    pub fn check(&self) -> RuleCheck {
        match self {
            RuleKind::Pick => check_pick,
            RuleKind::RandomTable => check_random_table,
            RuleKind::Case => check_case,
            RuleKind::Test => check_test,
        }
    }
}

/// `objectId` and `class` are exclusive, and `class` needs a `count`
fn check_pick(checker: &mut RuleChecker<'_>, rule: &Element) {
    let has_object = rule.has_attr("objectId");
    let has_class = rule.has_attr("class");

    if !has_object && !has_class {
        checker.add_error(rule, "Attribute objectId or class is required");
    } else if has_object && has_class {
        checker.add_error(rule, "Attributes objectId and class cannot be used together");
    }

    if has_class {
        if rule.has_attr("count") {
            checker.check_expression(rule, "count");
        } else {
            checker.add_error(rule, "Attribute count is required with class");
        }
    }
}

fn check_random_table(checker: &mut RuleChecker<'_>, rule: &Element) {
    // Without its own text, the table is rolled from a link in the section
    let text_attribute = format!("text-{}", checker.book.language());
    if !rule.has_attr(&text_attribute) {
        let index: usize = rule
            .attr("index")
            .and_then(|i| i.trim().parse().ok())
            .unwrap_or(0);
        if checker.section.random_table_links() <= index {
            checker.add_error(rule, format!("Link to random table not found (index {})", index));
        }
    }

    let cases = rule.find_children("case");
    if cases.is_empty() {
        return;
    }

    let ranges: Vec<(i64, i64)> = cases.iter().filter_map(|case| case_bounds(case)).collect();
    let expected = if rule.attr("zeroAsTen") == Some("true") {
        RANDOM_RANGE_ZERO_AS_TEN
    } else {
        RANDOM_RANGE
    };

    let coverage = check_coverage(&ranges, expected);
    if coverage.overlapped {
        checker.add_error(rule, "Overlapped numbers");
    }
    if coverage.missing {
        checker.add_error(rule, "Missing numbers");
    }
}

fn check_case(checker: &mut RuleChecker<'_>, rule: &Element) {
    match case_bounds(rule) {
        None => checker.add_error(rule, "Attribute value or from / to are required"),
        Some((from, to)) if from > to => checker.add_error(rule, "Wrong range"),
        Some(_) => {}
    }
}

fn check_test(checker: &mut RuleChecker<'_>, rule: &Element) {
    checker.check_disciplines(rule, &values_as_list(rule, "hasDiscipline", true));
    checker.check_objects(rule, &values_as_list(rule, "hasObject", true));
    checker.check_objects(rule, &values_as_list(rule, "currentWeapon", false));
    checker.check_sections(rule, &values_as_list(rule, "sectionVisited", true));

    if let Some(section_id) = rule.attr("hasChoice") {
        checker.check_section_choice(rule, section_id);
    }

    if let Some(language) = rule.attr("bookLanguage") {
        if language.parse::<Language>().is_err() {
            checker.add_error(rule, format!("Wrong language: {}", language));
        }
    }

    checker.check_expression(rule, "expression");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::book::Book;
    use crate::mechanics::Mechanics;

    const BOOK: &str = r#"<gamebook>
        <section id="discplnz"><data>
            <section id="camflage"><meta><title>Camouflage</title></meta><data><p>.</p></data></section>
            <section id="sixthsns"><meta><title>Sixth Sense</title></meta><data><p>.</p></data></section>
        </data></section>
        <section id="sect1">
            <meta><link class="next" idref="sect2"/></meta>
            <data>
                <p>Use the <a idref="random">Random Number Table</a>.</p>
                <choice idref="sect2">Turn to 2.</choice>
            </data>
        </section>
        <section id="sect2"><data><p>End.</p></data></section>
    </gamebook>"#;

    const OBJECTS: &str = r#"<objects><weapons><weapon id="sword"/></weapons><special><object id="map"/></special></objects>"#;

    /// Errors produced by the rules of a one-section mechanics document
    fn check(rules: &str) -> Vec<String> {
        let book = Book::from_xml(1, Language::En, BOOK).unwrap();
        let mechanics = Mechanics::from_xml(
            &format!(
                r#"<mechanics lastSection="sect2"><sections><section id="sect1">{}</section></sections></mechanics>"#,
                rules
            ),
            OBJECTS,
        )
        .unwrap();
        let mut errors = Vec::new();
        RuleChecker::new(&book, &mechanics, "sect1", &mut errors).check_section();
        errors
    }

    #[test]
    fn test_dispatch_table_is_closed() {
        for kind in RuleKind::ALL {
            assert_eq!(RuleKind::from_tag(kind.tag()), Some(kind));
        }
        assert_eq!(RuleKind::from_tag("combat"), None);
    }

    #[test]
    fn test_pick() {
        assert!(check(r#"<pick objectId="sword"/>"#).is_empty());
        assert!(check(r#"<pick class="money" count="10"/>"#).is_empty());

        assert_eq!(
            check("<pick/>"),
            vec!["Section sect1, rule pick: Attribute objectId or class is required"]
        );
        assert_eq!(check(r#"<pick objectId="sword" class="money" count="1"/>"#).len(), 1);
        assert_eq!(
            check(r#"<pick class="money"/>"#),
            vec!["Section sect1, rule pick: Attribute count is required with class"]
        );
        assert_eq!(check(r#"<pick objectId="sword" class="money"/>"#).len(), 2);
    }

    #[test]
    fn test_case_ranges() {
        assert_eq!(
            check(r#"<case from="5" to="2"/>"#),
            vec!["Section sect1, rule case: Wrong range"]
        );
        assert!(check(r#"<case from="2" to="5"/>"#).is_empty());
        assert!(check(r#"<case value="3"/>"#).is_empty());
        assert_eq!(
            check(r#"<case from="2"/>"#),
            vec!["Section sect1, rule case: Attribute value or from / to are required"]
        );
    }

    #[test]
    fn test_random_table_complete() {
        let errors = check(
            r#"<randomTable><case from="0" to="4"/><case from="5" to="9"/></randomTable>"#,
        );
        assert!(errors.is_empty(), "{:?}", errors);
    }

    #[test]
    fn test_random_table_overlap_reported_once() {
        let errors = check(
            r#"<randomTable>
                <case from="0" to="5"/><case from="3" to="7"/><case from="6" to="9"/>
            </randomTable>"#,
        );
        assert_eq!(errors, vec!["Section sect1, rule randomTable: Overlapped numbers"]);
    }

    #[test]
    fn test_random_table_missing_numbers() {
        let errors = check(r#"<randomTable><case from="1" to="9"/></randomTable>"#);
        assert_eq!(errors, vec!["Section sect1, rule randomTable: Missing numbers"]);

        let errors = check(
            r#"<randomTable zeroAsTen="true"><case from="1" to="10"/></randomTable>"#,
        );
        assert!(errors.is_empty(), "{:?}", errors);
    }

    #[test]
    fn test_random_table_without_cases_skips_coverage() {
        assert!(check(r#"<randomTable zeroAsTen="true"/>"#).is_empty());
    }

    #[test]
    fn test_random_table_inverted_case_reported_by_case_only() {
        let errors = check(
            r#"<randomTable><case from="0" to="9"/><case from="7" to="3"/></randomTable>"#,
        );
        assert_eq!(errors, vec!["Section sect1, rule case: Wrong range"]);
    }

    #[test]
    fn test_random_table_link() {
        let errors = check(r#"<randomTable index="1"><case from="0" to="9"/></randomTable>"#);
        assert_eq!(
            errors,
            vec!["Section sect1, rule randomTable: Link to random table not found (index 1)"]
        );

        let errors = check(
            r#"<randomTable index="1" text-en="Pick a number"><case from="0" to="9"/></randomTable>"#,
        );
        assert!(errors.is_empty());
    }

    #[test]
    fn test_test_references() {
        assert!(check(
            r#"<test hasDiscipline="camflage|sixthsns" hasObject="map" currentWeapon="sword" sectionVisited="sect2" hasChoice="sect2"/>"#
        )
        .is_empty());

        let errors = check(
            r#"<test hasDiscipline="healing" hasObject="map|shield" currentWeapon="axe" sectionVisited="sect400" hasChoice="sect3"/>"#,
        );
        assert_eq!(
            errors,
            vec![
                "Section sect1, rule test: Wrong discipline id: healing",
                "Section sect1, rule test: Object id shield not found",
                "Section sect1, rule test: Object id axe not found",
                "Section sect1, rule test: Wrong section id: sect400",
                "Section sect1, rule test: No choice to section sect3",
            ]
        );
    }

    #[test]
    fn test_book_language() {
        assert_eq!(
            check(r#"<test bookLanguage="fr"/>"#),
            vec!["Section sect1, rule test: Wrong language: fr"]
        );
        assert!(check(r#"<test bookLanguage="en"/>"#).is_empty());
        assert!(check(r#"<test expression="[ENDURANCE] > 10"/>"#).is_empty());
    }

    #[test]
    fn test_nested_rules_follow_document_order() {
        let errors = check(r#"<test bookLanguage="fr"><pick/><choiceState/><case value="x"/></test>"#);
        assert_eq!(errors.len(), 3);
        assert!(errors[0].contains("rule test"));
        assert!(errors[1].contains("rule pick"));
        assert!(errors[2].contains("rule case"));
    }
}
