//! Pattern compiler tests
//!
//! Tests tree structure, slot flags, marks, error reasons and the
//! normalised printing of compiled patterns.

use proptest::prelude::*;
use quill_foundation::ErrorKind;
use quill_pattern::{Mark, PatternElement};

use crate::compile;

fn reason(source: &str) -> (usize, String) {
    match compile(source).unwrap_err().kind {
        ErrorKind::PatternCompile {
            position, reason, ..
        } => (position, reason),
        other => panic!("unexpected error: {other:?}"),
    }
}

// =============================================================================
// Structure
// =============================================================================

#[test]
fn optional_words_split_the_text() {
    let p = compile("cancel [the] event").unwrap();
    assert_eq!(p.elements().len(), 3);
    assert!(matches!(p.elements()[1], PatternElement::Optional { mark: None, .. }));
    assert_eq!(p.keywords(), vec!["cancel", "event"]);
}

#[test]
fn top_level_alternatives_form_a_choice() {
    let p = compile("1:foo %number% bar|2:foo %number% baz").unwrap();
    let PatternElement::Choice(choices) = p.root() else {
        panic!("expected a choice");
    };
    assert_eq!(choices.len(), 2);
    assert_eq!(choices[1].mark, Some(Mark::Numeric(2)));
    assert_eq!(p.slots().len(), 2);
}

#[test]
fn slots_resolve_surface_forms() {
    let p = compile("damage %entities% by %-number% with %=strings%").unwrap();
    let slots = p.slots();
    assert_eq!(slots[0].types[0].name.as_ref(), "entity");
    assert!(slots[0].is_plural());
    assert!(slots[1].optional);
    assert!(!slots[1].is_plural());
    assert!(slots[2].literal_only);
    assert_eq!(slots[2].describe(), "strings");
}

#[test]
fn multi_type_slot() {
    let p = compile("print %number/string%").unwrap();
    assert_eq!(p.slots()[0].describe(), "number or string");
}

#[test]
fn named_marks() {
    let p = compile(":(display|custom) name").unwrap();
    let PatternElement::Choice(choices) = &p.elements()[0] else {
        panic!("expected a choice");
    };
    assert_eq!(choices[0].mark, Some(Mark::named("display")));
    assert_eq!(choices[0].mark.as_ref().and_then(Mark::as_int), None);
}

#[test]
fn regex_groups_compile() {
    let p = compile("page <[0-9]+>").unwrap();
    assert!(matches!(p.elements()[1], PatternElement::Regex(_)));
}

// =============================================================================
// Errors
// =============================================================================

#[test]
fn malformed_patterns_report_position_and_reason() {
    assert_eq!(reason("cancel [the event"), (7, "unclosed '['".to_string()));
    assert_eq!(reason("a)").1, "unexpected ')'");
    assert_eq!(reason("give %widget%").1, "unknown type 'widget'");
    assert_eq!(reason("[]").1, "empty optional group");
    assert_eq!(reason("(1:a|1:b)").1, "duplicate mark '1'");
    assert!(reason("bad <[a-z>").1.starts_with("invalid regex"));
    assert_eq!(
        reason("%number%%number%").1,
        "adjacent slots need a literal or a mark between them"
    );
}

// =============================================================================
// Printing
// =============================================================================

#[test]
fn printing_normalises_groups() {
    let p = compile("a ((b c)) d").unwrap();
    assert_eq!(p.to_string(), "a b c d");
    let p = compile(r"100\% [1:not] %-number%").unwrap();
    assert_eq!(p.to_string(), r"100\% [1:not] %-number%");
}

fn pattern_source() -> impl Strategy<Value = String> {
    let word = prop::sample::select(vec!["cancel", "the", "event", "of", "give", "to"]);
    let piece = prop_oneof![
        word.clone().prop_map(|w| w.to_string()),
        word.clone().prop_map(|w| format!("[{w}]")),
        (word.clone(), word).prop_map(|(a, b)| format!("({a}|{b})")),
        Just("%number%".to_string()),
        Just("%strings%".to_string()),
    ];
    prop::collection::vec(piece, 1..6).prop_map(|pieces| pieces.join(" "))
}

proptest! {
    #[test]
    fn compiler_never_panics(source in "\\PC{0,40}") {
        let _ = compile(&source);
    }

    #[test]
    fn printed_patterns_compile_to_the_same_tree(source in pattern_source()) {
        let p = compile(&source).unwrap();
        let again = compile(&p.to_string()).unwrap();
        prop_assert_eq!(p.root(), again.root());
    }
}
