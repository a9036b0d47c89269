//! Integration tests for Value and ValueKind
//!
//! Tests value accessors, equality, ordering and kind compatibility.

use quill_foundation::{Object, Value, ValueKind};

// =============================================================================
// Accessors
// =============================================================================

#[test]
fn accessors() {
    assert_eq!(Value::Bool(true).as_bool(), Some(true));
    assert_eq!(Value::Int(3).as_int(), Some(3));
    assert_eq!(Value::Int(3).as_number(), Some(3.0));
    assert_eq!(Value::Float(2.5).as_float(), Some(2.5));
    assert_eq!(Value::from("hi").as_str(), Some("hi"));
    assert_eq!(Value::from("hi").as_number(), None);
}

#[test]
fn truthiness() {
    assert!(!Value::Bool(false).is_truthy());
    assert!(Value::Bool(true).is_truthy());
    assert!(Value::Int(0).is_truthy());
    assert!(Value::from("").is_truthy());
}

#[test]
fn kinds() {
    assert_eq!(Value::Int(1).kind(), ValueKind::Int);
    assert_eq!(Value::from("x").kind(), ValueKind::String);
    let obj = Object::new("player", 7_u32);
    assert_eq!(Value::Object(obj).kind(), ValueKind::object("player"));
}

// =============================================================================
// Equality and Ordering
// =============================================================================

#[test]
fn nan_equals_itself() {
    assert_eq!(Value::Float(f64::NAN), Value::Float(f64::NAN));
}

#[test]
fn int_and_float_are_distinct_but_ordered() {
    assert_ne!(Value::Int(1), Value::Float(1.0));
    assert!(Value::Int(1) < Value::Float(1.5));
    assert!(Value::from("a") < Value::from("b"));
    assert_eq!(Value::Bool(true).partial_cmp(&Value::Int(1)), None);
}

#[test]
fn objects_compare_by_identity() {
    let a = Object::new("player", String::from("alice"));
    let b = Object::new("player", String::from("alice"));
    assert_eq!(Value::Object(a.clone()), Value::Object(a.clone()));
    assert_ne!(Value::Object(a.clone()), Value::Object(b));
    assert_eq!(a.downcast_ref::<String>().map(String::as_str), Some("alice"));
    assert_eq!(a.type_name(), "player");
}

#[test]
fn display() {
    assert_eq!(Value::from("plain").to_string(), "plain");
    assert_eq!(Value::Float(5.0).to_string(), "5");
    assert_eq!(Value::Object(Object::new("player", ())).to_string(), "<player>");
}

// =============================================================================
// Kind Compatibility
// =============================================================================

#[test]
fn kind_acceptance() {
    assert!(ValueKind::Any.accepts(&ValueKind::String));
    assert!(ValueKind::Float.accepts(&ValueKind::Int));
    assert!(!ValueKind::Int.accepts(&ValueKind::Float));
    assert!(ValueKind::object("player").accepts(&ValueKind::object("player")));
    assert!(!ValueKind::object("player").accepts(&ValueKind::object("entity")));
}
