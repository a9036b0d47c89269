//! Converter chain tests
//!
//! Tests shortest-path lookup, composition and the hop bound.

use proptest::prelude::*;
use quill_foundation::{ErrorKind, Value, ValueKind};
use quill_types::{TypeInfo, TypeRegistry};

/// `meters -> feet -> inches -> label` plus a direct `meters -> label`.
fn units() -> TypeRegistry {
    let mut types = TypeRegistry::new();
    types
        .register(
            TypeInfo::new("meter@s", ValueKind::Float)
                .with_converter("foot", |v| v.as_number().map(|m| Value::Float(m * 3.25))),
        )
        .unwrap();
    types
        .register(TypeInfo::new("f@oot@eet", ValueKind::Int))
        .unwrap();
    types
        .register(TypeInfo::new("inch@es", ValueKind::object("inch")))
        .unwrap();
    types
        .register(TypeInfo::new("label@s", ValueKind::String))
        .unwrap();
    types
        .register_converter("foot", "inch", |v| v.as_number().map(|f| Value::Float(f * 12.0)))
        .unwrap();
    types
        .register_converter("inches", "label", |v| {
            v.as_number().map(|i| Value::from(format!("{i} in")))
        })
        .unwrap();
    types
}

#[test]
fn paths_are_shortest_and_inclusive() {
    let types = units();
    let path = types.conversion_path("meters", "label").unwrap();
    let names: Vec<&str> = path.iter().map(AsRef::as_ref).collect();
    assert_eq!(names, vec!["meter", "foot", "inch", "label"]);
    assert_eq!(types.conversion_path("foot", "foot").unwrap().len(), 1);
    assert!(types.conversion_path("label", "meter").is_none());
}

#[test]
fn hop_bound_limits_chains() {
    let types = units().with_max_hops(2);
    assert!(types.can_convert("meter", "inch"));
    assert!(!types.can_convert("meter", "label"));
    let err = types.convert(&Value::Float(1.0), "meter", "label").unwrap_err();
    assert!(matches!(err.kind, ErrorKind::NoConversion { .. }));
}

#[test]
fn direct_edge_beats_chain() {
    let mut types = units();
    types
        .register_converter("meter", "label", |v| {
            v.as_number().map(|m| Value::from(format!("{m} m")))
        })
        .unwrap();
    assert_eq!(
        types.convert(&Value::Float(2.0), "meter", "label").unwrap(),
        Value::from("2 m")
    );
}

#[test]
fn unknown_types() {
    let mut types = units();
    let err = types.convert(&Value::Float(1.0), "meter", "parsec").unwrap_err();
    assert!(matches!(err.kind, ErrorKind::UnknownType(ref t) if t == "parsec"));
    let err = types
        .register_converter("parsec", "meter", |v| Some(v.clone()))
        .unwrap_err();
    assert!(matches!(err.kind, ErrorKind::UnknownType(_)));
}

#[test]
fn converter_may_reject_a_value() {
    let mut types = TypeRegistry::new();
    types.register(TypeInfo::new("number@s", ValueKind::Float)).unwrap();
    types
        .register(
            TypeInfo::new("digit@s", ValueKind::Int).with_converter("number", |v| v.as_number().map(Value::Float)),
        )
        .unwrap();
    types
        .register_converter("number", "digit", |v| {
            v.as_int().filter(|d| (0..10).contains(d)).map(Value::Int)
        })
        .unwrap();
    let err = types.convert(&Value::Float(3.0), "number", "digit").unwrap_err();
    assert!(matches!(err.kind, ErrorKind::NoConversion { .. }));
}

proptest! {
    #[test]
    fn conversion_composes_along_the_path(m in -1.0e6f64..1.0e6) {
        let types = units();
        let direct = types.convert(&Value::Float(m), "meter", "inch").unwrap();
        let feet = types.convert(&Value::Float(m), "meter", "foot").unwrap();
        let stepwise = types.convert(&feet, "foot", "inch").unwrap();
        prop_assert_eq!(direct, stepwise);
    }
}
