//! Integration tests for Error types
//!
//! Tests error construction, display, context, and error kinds.

use quill_foundation::{Error, ErrorContext, ErrorKind};

// =============================================================================
// Error Construction
// =============================================================================

#[test]
fn error_pattern_compile() {
    let err = Error::pattern_compile("cancel [the event", 7, "unclosed '['");
    assert!(matches!(err.kind, ErrorKind::PatternCompile { position: 7, .. }));
    let msg = format!("{err}");
    assert!(msg.contains("unclosed '['"));
    assert!(msg.contains("cancel [the event"));
}

#[test]
fn error_no_match() {
    let err = Error::no_match("number", "five");
    assert!(matches!(err.kind, ErrorKind::NoMatch { .. }));
    let msg = format!("{err}");
    assert!(msg.contains("five"));
    assert!(msg.contains("number"));
}

#[test]
fn error_no_conversion() {
    let err = Error::no_conversion("string", "number");
    assert_eq!(err.to_string(), "can't convert string to number");
}

#[test]
fn error_rejected() {
    let err = Error::rejected("cancel the event", "the event can't be cancelled");
    assert!(matches!(err.kind, ErrorKind::Rejected { .. }));
    assert!(err.to_string().contains("can't be cancelled"));
}

#[test]
fn error_unknown_type() {
    let err = Error::unknown_type("widget");
    assert!(matches!(err.kind, ErrorKind::UnknownType(ref t) if t == "widget"));
}

// =============================================================================
// Warnings
// =============================================================================

#[test]
fn only_ambiguity_is_a_warning() {
    assert!(Error::ambiguous("a b", "a %x%", "%x% b").is_warning());
    assert!(!Error::no_match("effect", "a b").is_warning());
    assert!(!Error::runtime("boom").is_warning());
}

#[test]
fn ambiguity_names_both_syntaxes() {
    let msg = Error::ambiguous("x plus y", "%number% plus %number%", "%string% plus %string%")
        .to_string();
    assert!(msg.contains("chose %number% plus %number%"));
    assert!(msg.contains("%string% plus %string%"));
}

// =============================================================================
// Error Context
// =============================================================================

#[test]
fn context_carries_script_and_line() {
    let err = Error::no_match("effect", "jump")
        .with_context(ErrorContext::new().with_script("main.sk").with_line(12));
    assert_eq!(err.line(), Some(12));
    let ctx = err.context.unwrap();
    assert_eq!(ctx.script.as_deref(), Some("main.sk"));
    assert_eq!(ctx.to_string(), "at main.sk:12");
}

#[test]
fn context_display_with_position_and_frames() {
    let ctx = ErrorContext::new()
        .with_script("main.sk")
        .with_position(3, 9)
        .with_frame("%number% plus %number%");
    let text = ctx.to_string();
    assert!(text.starts_with("at main.sk:3:9"));
    assert!(text.contains("  in %number% plus %number%"));
}

#[test]
fn error_without_context_has_no_line() {
    assert_eq!(Error::runtime("boom").line(), None);
}
