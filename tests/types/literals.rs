//! Literal parsing and serialization tests
//!
//! Tests the shared literal helpers and per-type serializers.

use proptest::prelude::*;
use quill_foundation::{ErrorKind, Value, ValueKind};
use quill_types::literal::{parse_integer, parse_number, parse_quoted, quote};
use quill_types::{TypeInfo, TypeNames, TypeRegistry};

fn registry() -> TypeRegistry {
    let mut types = TypeRegistry::new();
    types
        .register(TypeInfo::new("number@s", ValueKind::Float).with_parser(|s| parse_number(s).map(Value::Float)))
        .unwrap();
    types
        .register(
            TypeInfo::new("string@s", ValueKind::String)
                .with_parser(|s| parse_quoted(s).map(Value::from))
                .with_serializer(|v| v.as_str().map_or_else(|| v.to_string(), quote)),
        )
        .unwrap();
    types
}

// =============================================================================
// Names
// =============================================================================

#[test]
fn type_name_patterns() {
    let names = TypeNames::parse("entit@y@ies").unwrap();
    assert_eq!(names.singular().as_ref(), "entity");
    assert_eq!(names.plural().as_ref(), "entities");
    let names = TypeNames::parse("Player").unwrap();
    assert_eq!(names.plural().as_ref(), "players");
    assert!(TypeNames::parse("two words").is_err());
    assert!(TypeNames::parse("a@b@c@d").is_err());
}

#[test]
fn duplicate_surface_forms_are_rejected() {
    let mut types = registry();
    let err = types
        .register(TypeInfo::new("strings@es", ValueKind::String))
        .unwrap_err();
    assert!(matches!(err.kind, ErrorKind::DuplicateType(ref t) if t == "strings"));
}

#[test]
fn lookup_is_case_insensitive() {
    let types = registry();
    let (number, plural) = types.lookup_surface("Numbers").unwrap();
    assert_eq!(number.name().as_ref(), "number");
    assert!(plural);
}

// =============================================================================
// Literals
// =============================================================================

#[test]
fn number_literals() {
    assert_eq!(parse_number("-2.5"), Some(-2.5));
    assert_eq!(parse_number("inf"), None);
    assert_eq!(parse_number("1e3"), None);
    assert_eq!(parse_integer("42"), Some(42));
    assert_eq!(parse_integer("4.2"), None);
    assert_eq!(parse_integer("-"), None);
}

#[test]
fn quoted_literals() {
    assert_eq!(parse_quoted("\"a \"\"b\"\"\"").as_deref(), Some("a \"b\""));
    assert_eq!(parse_quoted("\"a\" \"b\""), None);
    assert_eq!(quote("say \"hi\""), "\"say \"\"hi\"\"\"");
}

#[test]
fn serializer_by_kind() {
    let types = registry();
    assert_eq!(types.to_text(&Value::from("x")), "\"x\"");
    assert_eq!(types.to_text(&Value::Float(0.5)), "0.5");
    assert_eq!(types.serialize("number", &Value::Float(3.0)).unwrap(), "3");
}

proptest! {
    #[test]
    fn numbers_round_trip(n in -1.0e12f64..1.0e12) {
        let types = registry();
        let text = types.serialize("number", &Value::Float(n)).unwrap();
        prop_assert_eq!(types.parse_literal("number", &text), Some(Value::Float(n)));
    }

    #[test]
    fn strings_round_trip(s in "\\PC{0,30}") {
        let types = registry();
        let text = types.serialize("string", &Value::from(s.as_str())).unwrap();
        prop_assert_eq!(types.parse_literal("string", &text), Some(Value::from(s)));
    }
}
