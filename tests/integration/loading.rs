//! Script loading tests
//!
//! Tests per-line diagnostics, parallel loading and report ordering.

use quill_foundation::{Error, ErrorKind};
use quill_parser::{EngineConfig, LoadReport, ScriptSource};
use quill_stdlib::{LoadContext, default_engine};

use crate::{engine, greeting, leaf, node};

fn broken() -> ScriptSource {
    ScriptSource::new(
        "broken",
        vec![
            node(
                1,
                "on load:",
                vec![
                    leaf(2, "print \"ok\""),
                    leaf(3, "frobnicate the widget"),
                    leaf(4, "cancel the event"),
                ],
            ),
            node(5, "on sunrise:", vec![leaf(6, "print \"x\"")]),
            leaf(7, "print \"loose\""),
            node(8, "on load", vec![leaf(9, "print \"no colon\"")]),
        ],
    )
}

#[test]
fn bad_lines_are_skipped_and_reported() {
    let engine = engine();
    let report = engine.compile_script(&broken());
    assert!(!report.is_ok());

    let lines: Vec<Option<usize>> = report.errors.iter().map(Error::line).collect();
    assert_eq!(lines, vec![Some(3), Some(4), Some(5), Some(7), Some(8)]);
    for err in &report.errors {
        let script = err.context.as_ref().and_then(|c| c.script.as_deref());
        assert_eq!(script, Some("broken"));
    }
    assert!(matches!(report.errors[0].kind, ErrorKind::NoMatch { .. }));
    assert!(matches!(report.errors[1].kind, ErrorKind::Rejected { .. }));

    assert_eq!(report.script.triggers().len(), 1);
    let ctx = LoadContext::default();
    assert_eq!(report.script.run(&ctx).unwrap(), 1);
    assert_eq!(ctx.output(), vec!["ok"]);
}

#[test]
fn empty_triggers_are_rejected() {
    let engine = engine();
    let source = ScriptSource::new("empty", vec![leaf(1, "on load:")]);
    let report = engine.compile_script(&source);
    assert_eq!(report.errors.len(), 1);
    assert!(report.script.triggers().is_empty());
}

#[test]
fn reports_keep_input_order() {
    let engine = engine();
    let sources: Vec<ScriptSource> = (0..16)
        .map(|i| greeting(&format!("script-{i}"), &format!("hello {i}")))
        .collect();
    let reports = engine.load_scripts(&sources);
    assert_eq!(reports.len(), 16);
    for (i, report) in reports.iter().enumerate() {
        assert!(report.is_ok());
        assert_eq!(report.script.name(), format!("script-{i}"));
        let ctx = LoadContext::default();
        report.script.run(&ctx).unwrap();
        assert_eq!(ctx.output(), vec![format!("hello {i}")]);
    }
}

#[test]
fn sequential_loading_matches_parallel() {
    let sources = vec![greeting("a", "one"), broken(), greeting("c", "three")];
    let parallel = engine().load_scripts(&sources);
    let sequential = default_engine(EngineConfig::debug())
        .unwrap()
        .load_scripts(&sources);

    let summary = |reports: &[LoadReport]| -> Vec<(String, usize, usize)> {
        reports
            .iter()
            .map(|r| (r.script.name().to_string(), r.script.triggers().len(), r.errors.len()))
            .collect()
    };
    assert_eq!(summary(&parallel), summary(&sequential));
}

#[test]
fn standard_scripts_load_without_warnings() {
    let engine = default_engine(EngineConfig::strict()).unwrap();
    assert!(engine.warnings().is_empty());
    let source = ScriptSource::new(
        "strict",
        vec![node(
            1,
            "on load:",
            vec![
                leaf(2, "print \"a\" and \"b\""),
                leaf(3, "print the length of \"abc\""),
                node(4, "if 1 + 1 is 2:", vec![leaf(5, "print \"two\"")]),
            ],
        )],
    );
    let report = engine.compile_script(&source);
    assert!(report.is_ok(), "{:?}", report.errors);
    assert!(report.warnings.is_empty(), "{:?}", report.warnings);
}
