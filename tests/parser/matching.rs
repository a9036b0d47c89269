//! Backtracking matcher tests
//!
//! Tests optional parts, choice backtracking, slot span selection, marks
//! and regex captures against patterns compiled for a real engine.

use std::sync::Arc;

use quill_foundation::Value;
use quill_parser::{
    Engine, EngineConfig, MatchContext, ParserState, Resolver, SyntaxMatch, match_full,
};
use quill_pattern::{Mark, Pattern, PatternCompiler};

use crate::{Noted, engine, registration, single};

fn compile(engine: &Engine, source: &str) -> Pattern {
    PatternCompiler::new(&**engine.types()).compile(source).unwrap()
}

/// Matches `text` against `source`, returning the match if it is full.
fn try_match(engine: &Engine, source: &str, text: &str) -> Option<SyntaxMatch> {
    let pattern = compile(engine, source);
    let state = ParserState::new();
    let resolver = Resolver::new(engine, &state);
    let mut ctx = MatchContext::new(text, &resolver);
    match_full(&pattern, &mut ctx).then(|| ctx.into_match(0))
}

// =============================================================================
// Optional parts and choices
// =============================================================================

#[test]
fn optional_parts_never_cause_failure() {
    let engine = engine();
    assert!(try_match(&engine, "stop [now]", "stop").is_some());
    assert!(try_match(&engine, "stop [now]", "stop now").is_some());
    assert!(try_match(&engine, "[please] stop", "stop").is_some());
    assert!(try_match(&engine, "[please] stop", "stop now").is_none());
}

#[test]
fn optional_marks_only_when_taken() {
    let engine = engine();
    let m = try_match(&engine, "[1:please] stop", "please stop").unwrap();
    assert_eq!(m.numeric_mark(), 1);
    let m = try_match(&engine, "[1:please] stop", "stop").unwrap();
    assert_eq!(m.numeric_mark(), 0);
    assert!(m.marks.is_empty());
}

#[test]
fn failed_branches_leave_no_trace() {
    let engine = engine();
    let m = try_match(&engine, "(1:foo %number% bar|2:foo %number% baz)", "foo 5 baz").unwrap();
    assert_eq!(m.marks, vec![Mark::Numeric(2)]);
    assert_eq!(m.expressions.len(), 1);
    assert_eq!(single(&m.require(0).unwrap()), Some(Value::Float(5.0)));
}

#[test]
fn matching_ignores_case_and_extra_whitespace() {
    let engine = engine();
    assert!(try_match(&engine, "cancel [the] event", "Cancel THE  event ").is_some());
    assert!(try_match(&engine, "cancel [the] event", "cancel the events").is_none());
}

#[test]
fn named_marks_are_reported() {
    let engine = engine();
    let m = try_match(&engine, ":(display|custom) name", "custom name").unwrap();
    assert!(m.has_named_mark("custom"));
    assert!(!m.has_named_mark("display"));
}

// =============================================================================
// Slots
// =============================================================================

#[test]
fn optional_word_between_slots() {
    let engine = engine();
    for text in ["5 of diamonds", "5 diamonds"] {
        let m = try_match(&engine, "%number% [of] %items%", text).unwrap();
        assert_eq!(single(&m.require(0).unwrap()), Some(Value::Float(5.0)));
        assert_eq!(single(&m.require(1).unwrap()), Some(Value::from("diamonds")));
    }
}

#[test]
fn optional_slot_may_be_skipped() {
    let engine = engine();
    let m = try_match(&engine, "wait [%-number%] ticks", "wait ticks").unwrap();
    assert_eq!(m.expressions.len(), 1);
    assert!(m.expression(0).is_none());

    let m = try_match(&engine, "wait [%-number%] ticks", "wait 3 ticks").unwrap();
    assert_eq!(single(m.expression(0).unwrap()), Some(Value::Float(3.0)));
}

#[test]
fn literal_only_slots_reject_expressions() {
    let engine = engine();
    assert!(try_match(&engine, "give %=number%", "give 4").is_some());
    assert!(try_match(&engine, "give %=number%", "give 1 plus 2").is_none());
    assert!(try_match(&engine, "give %number%", "give 1 plus 2").is_some());
}

#[test]
fn slots_recurse_through_expressions() {
    let engine = engine();
    let m = try_match(&engine, "give %number% to %item%", "give 1 plus 2 to alex").unwrap();
    assert_eq!(single(&m.require(0).unwrap()), Some(Value::Float(3.0)));
    assert_eq!(single(&m.require(1).unwrap()), Some(Value::from("alex")));
}

#[test]
fn regex_groups_capture_text() {
    let engine = engine();
    let m = try_match(&engine, "page <([0-9]+)(st|nd|rd|th)?>", "page 42").unwrap();
    assert_eq!(m.regex_matches.len(), 1);
    assert_eq!(m.regex_matches[0].text, "42");
    assert_eq!(m.regex_matches[0].groups, vec![Some("42".to_string()), None]);
}

// =============================================================================
// Statements
// =============================================================================

#[test]
fn pattern_index_identifies_the_alternative() {
    let mut reg = registration(EngineConfig::default());
    reg.register_effect(&["cancel [the] event", "uncancel [the] event"], |m, _| {
        Ok(Arc::new(Noted(m.pattern_index.to_string())))
    })
    .unwrap();
    let engine = reg.finish();
    let state = ParserState::new();

    assert_eq!(engine.parse_effect("cancel the event", &state).unwrap().describe(), "0");
    assert_eq!(engine.parse_effect("uncancel event", &state).unwrap().describe(), "1");
    assert!(engine.parse_effect("recancel event", &state).is_err());
}

#[test]
fn numeric_marks_combine() {
    let mut reg = registration(EngineConfig::default());
    reg.register_effect(&["[1:quietly] [2:now] stop"], |m, _| {
        Ok(Arc::new(Noted(m.numeric_mark().to_string())))
    })
    .unwrap();
    let engine = reg.finish();
    let state = ParserState::new();

    let mark = |text: &str| engine.parse_effect(text, &state).unwrap().describe();
    assert_eq!(mark("stop"), "0");
    assert_eq!(mark("quietly stop"), "1");
    assert_eq!(mark("now stop"), "2");
    assert_eq!(mark("quietly now stop"), "3");
}
