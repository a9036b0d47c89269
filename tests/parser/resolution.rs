//! Expression resolution tests
//!
//! Tests literals, conversions, list literals, tie-breaking, ambiguity
//! warnings and the error reported when nothing fits.

use std::sync::Arc;
use std::time::{Duration, Instant};

use proptest::prelude::*;
use quill_foundation::{Error, ErrorKind, Value};
use quill_parser::{
    Arity, EngineConfig, EventInfo, ExpressionList, Literal, ParserState, Resolver, SlotResolver,
};
use quill_pattern::{ExpressionElement, TypeRef};

use crate::{Host, Noted, constant, engine, registration, single, with_sum};

fn number(text: &str) -> Option<Value> {
    let engine = engine();
    let expr = engine.parse_expression(text, "number", &ParserState::new()).unwrap();
    single(&expr)
}

// =============================================================================
// Literals and conversions
// =============================================================================

#[test]
fn literals_take_the_fast_path() {
    let engine = engine();
    let expr = engine.parse_expression("2.5", "number", &ParserState::new()).unwrap();
    assert!(expr.is_literal());
    assert_eq!(single(&expr), Some(Value::Float(2.5)));
}

#[test]
fn sums_nest_to_the_right() {
    assert_eq!(number("1 plus 2"), Some(Value::Float(3.0)));
    let engine = engine();
    let expr = engine
        .parse_expression("1 plus 2 plus 3", "number", &ParserState::new())
        .unwrap();
    assert_eq!(expr.describe(), "1 plus 2 plus 3");
    assert_eq!(single(&expr), Some(Value::Float(6.0)));
}

#[test]
fn literals_convert_at_parse_time() {
    let mut reg = registration(EngineConfig::default());
    reg.register_expression(&["the answer"], "integer", Arity::Single, |m, _| {
        Ok(Arc::new(Literal::new("integer", vec![Value::Int(42)], m.text.clone())))
    })
    .unwrap();
    with_sum(&mut reg);
    let engine = reg.finish();
    let state = ParserState::new();

    let expr = engine.parse_expression("the answer", "number", &state).unwrap();
    assert_eq!(expr.return_type(), "number");
    assert_eq!(single(&expr), Some(Value::Float(42.0)));

    let expr = engine.parse_expression("the answer plus 1", "number", &state).unwrap();
    assert_eq!(single(&expr), Some(Value::Float(43.0)));

    let expr = engine.parse_expression("the answer", "string", &state).unwrap();
    assert_eq!(single(&expr), Some(Value::from("42")));
}

#[test]
fn hop_bound_limits_conversions() {
    let mut reg = registration(EngineConfig::default().with_max_conversion_hops(1));
    constant(&mut reg, "the answer", 42.0);
    reg.register_expression(&["the count"], "integer", Arity::Single, |m, _| {
        Ok(Arc::new(Literal::new("integer", vec![Value::Int(7)], m.text.clone())))
    })
    .unwrap();
    let engine = reg.finish();
    let state = ParserState::new();

    assert!(engine.parse_expression("the answer", "string", &state).is_ok());
    assert!(engine.parse_expression("the count", "number", &state).is_ok());
    assert!(engine.parse_expression("the count", "string", &state).is_err());
}

#[test]
fn unknown_text_is_a_no_match() {
    let engine = engine();
    let err = engine
        .parse_expression("a bag of holding", "number", &ParserState::new())
        .unwrap_err();
    assert!(matches!(err.kind, ErrorKind::NoMatch { .. }));

    let err = engine
        .parse_expression("1", "widget", &ParserState::new())
        .unwrap_err();
    assert!(matches!(err.kind, ErrorKind::UnknownType(_)));
}

// =============================================================================
// List literals
// =============================================================================

#[test]
fn list_literals_fill_plural_slots() {
    let engine = engine();
    let state = ParserState::new();
    let expr = engine
        .parse_expression("1, 2 plus 3 and 4", "numbers", &state)
        .unwrap();
    assert!(!expr.is_single());
    assert_eq!(
        expr.values(&Host).unwrap(),
        vec![Value::Float(1.0), Value::Float(5.0), Value::Float(4.0)]
    );

    assert!(engine.parse_expression("1, 2 and 3", "number", &state).is_err());
}

#[test]
fn or_lists_yield_the_first_item() {
    let engine = engine();
    let expr = engine
        .parse_expression("1 or 2", "numbers", &ParserState::new())
        .unwrap();
    assert_eq!(expr.values(&Host).unwrap(), vec![Value::Float(1.0)]);
}

#[test]
fn quoted_separators_stay_in_items() {
    let engine = engine();
    let expr = engine
        .parse_expression("\"a, b\" and \"c\"", "strings", &ParserState::new())
        .unwrap();
    assert_eq!(
        expr.values(&Host).unwrap(),
        vec![Value::from("a, b"), Value::from("c")]
    );
}

#[test]
fn list_literals_can_be_disabled() {
    let mut reg = registration(EngineConfig::default().with_list_literals(false));
    with_sum(&mut reg);
    let engine = reg.finish();
    assert!(engine
        .parse_expression("1, 2 and 3", "numbers", &ParserState::new())
        .is_err());
}

fn plural_slot(types: &[&str]) -> ExpressionElement {
    ExpressionElement {
        types: types
            .iter()
            .map(|t| TypeRef::new(*t, format!("{t}s"), true))
            .collect(),
        optional: false,
        literal_only: false,
        mark: None,
    }
}

#[test]
fn mixed_lists_convert_to_a_shared_type() {
    let engine = engine();
    let state = ParserState::new();
    let resolver = Resolver::new(&engine, &state);

    let expr = resolver
        .resolve_slot("1 and \"a\"", &plural_slot(&["number", "string"]))
        .unwrap()
        .unwrap();
    assert_eq!(expr.return_type(), "string");
    assert_eq!(
        expr.values(&Host).unwrap(),
        vec![Value::from("1"), Value::from("a")]
    );

    assert!(resolver
        .resolve_slot("apple and 1", &plural_slot(&["number", "item"]))
        .is_err());
}

#[test]
fn list_items_keep_their_order() {
    let list = ExpressionList::new(
        vec![
            Arc::new(Literal::new("number", vec![Value::Float(2.0)], "2")),
            Arc::new(Literal::new("number", vec![Value::Float(1.0)], "1")),
        ],
        true,
        "number",
    );
    assert!(list.is_and_list());
    assert_eq!(list.items().len(), 2);
    assert_eq!(list.items()[0].describe(), "2");
}

// =============================================================================
// Tie-breaking and ambiguity
// =============================================================================

#[test]
fn earlier_registration_wins_ties() {
    let mut reg = registration(EngineConfig::default());
    constant(&mut reg, "lucky number", 7.0);
    constant(&mut reg, "lucky number", 13.0);
    let engine = reg.finish();
    for _ in 0..3 {
        let expr = engine
            .parse_expression("lucky number", "number", &ParserState::new())
            .unwrap();
        assert_eq!(single(&expr), Some(Value::Float(7.0)));
    }
}

#[test]
fn priority_beats_registration_order() {
    let mut reg = registration(EngineConfig::default());
    constant(&mut reg, "lucky number", 7.0);
    constant(&mut reg, "lucky number", 13.0).set_priority(1);
    let engine = reg.finish();
    let expr = engine
        .parse_expression("lucky number", "number", &ParserState::new())
        .unwrap();
    assert_eq!(single(&expr), Some(Value::Float(13.0)));
}

#[test]
fn ambiguity_is_reported_not_fatal() {
    let mut reg = registration(EngineConfig::strict());
    constant(&mut reg, "lucky number", 7.0);
    constant(&mut reg, "lucky number", 13.0);
    with_sum(&mut reg);
    let engine = reg.finish();

    assert_eq!(engine.warnings().len(), 1);
    assert!(matches!(engine.warnings()[0].kind, ErrorKind::AmbiguousMatch { .. }));

    let state = ParserState::new();
    let resolver = Resolver::new(&engine, &state);
    let slot = ExpressionElement {
        types: vec![TypeRef::new("number", "number", false)],
        optional: false,
        literal_only: false,
        mark: None,
    };
    let expr = resolver
        .resolve_slot("lucky number", &slot)
        .unwrap()
        .unwrap();
    assert_eq!(single(&expr), Some(Value::Float(7.0)));

    let warnings = resolver.take_warnings();
    assert_eq!(warnings.len(), 1);
    let ErrorKind::AmbiguousMatch { text, .. } = &warnings[0].kind else {
        panic!("expected an ambiguity warning");
    };
    assert_eq!(text, "lucky number");
    assert!(resolver.take_warnings().is_empty());
}

#[test]
fn distinct_priorities_are_not_ambiguous() {
    let mut reg = registration(EngineConfig::strict());
    constant(&mut reg, "lucky number", 7.0);
    constant(&mut reg, "lucky number", 13.0).set_priority(-1);
    let engine = reg.finish();
    assert!(engine.warnings().is_empty());
}

// =============================================================================
// Context
// =============================================================================

#[test]
fn factories_may_reject_by_context() {
    let mut reg = registration(EngineConfig::default());
    reg.register_effect(&["cancel [the] event"], |m, state| {
        if state.is_cancellable() {
            Ok(Arc::new(Noted("cancel".into())))
        } else {
            Err(Error::rejected(m.text.as_str(), "not cancellable"))
        }
    })
    .unwrap();
    let engine = reg.finish();

    let err = engine
        .parse_effect("cancel the event", &ParserState::new())
        .err()
        .unwrap();
    assert!(matches!(err.kind, ErrorKind::Rejected { .. }));

    let state = ParserState::for_event(EventInfo::new("damage").with_cancellable(true));
    assert!(engine.parse_effect("cancel the event", &state).is_ok());
}

#[test]
fn context_values_need_their_event() {
    let mut reg = registration(EngineConfig::default());
    reg.register_context_value("tick", &["[the] tick count"], "integer", Arity::Single, |_| {
        Ok(vec![Value::Int(3)])
    })
    .unwrap();
    let engine = reg.finish();

    assert!(engine
        .parse_expression("the tick count", "integer", &ParserState::new())
        .is_err());
    let state = ParserState::for_event(EventInfo::new("tick"));
    let expr = engine.parse_expression("the tick count", "number", &state).unwrap();
    assert_eq!(single(&expr), Some(Value::Float(3.0)));
}

#[test]
fn runaway_recursion_is_bounded() {
    let mut reg = registration(EngineConfig::default().with_max_depth(2));
    with_sum(&mut reg);
    let engine = reg.finish();
    let state = ParserState::new();
    assert!(engine.parse_expression("1 plus 2", "number", &state).is_ok());
    assert!(engine
        .parse_expression("1 plus 2 plus 3 plus 4", "number", &state)
        .is_ok());
    assert!(engine
        .parse_expression("1 plus 2 plus 3 plus 4 plus 5", "number", &state)
        .is_err());
}

#[test]
fn failing_chains_resolve_in_polynomial_time() {
    let engine = engine();
    let state = ParserState::new();
    let terms: Vec<String> = (1..=20).map(|n| n.to_string()).collect();
    let chain = format!("{} plus zzz", terms.join(" plus "));

    let started = Instant::now();
    assert!(engine.parse_expression(&chain, "number", &state).is_err());
    assert!(started.elapsed() < Duration::from_secs(5));

    let good = terms.join(" plus ");
    let expr = engine.parse_expression(&good, "number", &state).unwrap();
    assert_eq!(single(&expr), Some(Value::Float(210.0)));
}

// =============================================================================
// Properties
// =============================================================================

proptest! {
    #[test]
    fn parsing_is_deterministic(text in "[0-9a-z ,]{0,24}") {
        let engine = engine();
        let state = ParserState::new();
        let first = engine.parse_expression(&text, "numbers", &state);
        let second = engine.parse_expression(&text, "numbers", &state);
        match (first, second) {
            (Ok(a), Ok(b)) => {
                prop_assert_eq!(a.describe(), b.describe());
                prop_assert_eq!(a.values(&Host).unwrap(), b.values(&Host).unwrap());
            }
            (Err(a), Err(b)) => prop_assert_eq!(a.to_string(), b.to_string()),
            _ => prop_assert!(false, "results differ for {:?}", text),
        }
    }

    #[test]
    fn sums_add_up(a in 0i32..1000, b in 0i32..1000) {
        let value = number(&format!("{a} plus {b}"));
        prop_assert_eq!(value, Some(Value::Float(f64::from(a) + f64::from(b))));
    }
}
