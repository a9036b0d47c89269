//! Script execution tests
//!
//! Tests compiled triggers, nested sections, context values, command
//! arguments and runtime errors.

use std::any::Any;

use quill_foundation::{ErrorKind, Result, Value};
use quill_parser::{ScriptNode, ScriptSource, TriggerContext};
use quill_stdlib::{CommandContext, LoadContext};

use crate::{engine, leaf, node};

fn run(nodes: Vec<ScriptNode>, ctx: &LoadContext) -> Result<usize> {
    let report = engine().compile_script(&ScriptSource::new("test", nodes));
    assert!(report.is_ok(), "{:?}", report.errors);
    report.script.run(ctx)
}

#[test]
fn sections_nest() {
    let ctx = LoadContext::default();
    let ran = run(
        vec![node(
            1,
            "on load:",
            vec![
                leaf(2, "print \"hello\""),
                node(3, "if 2 is greater than 1:", vec![leaf(4, "print \"yes\"")]),
                node(5, "if 2 is less than 1:", vec![leaf(6, "print \"no\"")]),
                node(
                    7,
                    "repeat 2 times:",
                    vec![leaf(8, "print the length of \"abc\"")],
                ),
            ],
        )],
        &ctx,
    )
    .unwrap();
    assert_eq!(ran, 1);
    assert_eq!(ctx.output(), vec!["hello", "yes", "3", "3"]);
}

#[test]
fn arguments_reach_the_script() {
    let ctx = LoadContext::new(vec!["alpha".into(), "beta".into()]);
    run(
        vec![node(
            1,
            "on script load:",
            vec![
                leaf(2, "print the arguments"),
                leaf(3, "print arguments joined with \"+\""),
            ],
        )],
        &ctx,
    )
    .unwrap();
    assert_eq!(ctx.output(), vec!["alpha", "beta", "alpha+beta"]);
}

#[test]
fn command_triggers_read_their_arguments() {
    let report = engine().compile_script(&ScriptSource::new(
        "commands",
        vec![
            node(
                1,
                "command /roll <number> [<string>]:",
                vec![
                    leaf(2, "print argument 1 + 1"),
                    leaf(3, "print the last argument"),
                ],
            ),
            node(4, "on load:", vec![leaf(5, "print argument 1")]),
        ],
    ));
    assert_eq!(report.errors.len(), 1);
    assert_eq!(report.errors[0].line(), Some(5));

    let ctx = CommandContext::new("roll", vec![vec![Value::Float(2.0)], vec![Value::from("d6")]]);
    assert_eq!(report.script.run(&ctx).unwrap(), 1);
    assert_eq!(ctx.output(), vec!["3", "d6"]);

    let other = CommandContext::new("flip", Vec::new());
    assert_eq!(report.script.run(&other).unwrap(), 0);
}

struct Sunrise;

impl TriggerContext for Sunrise {
    fn name(&self) -> &str {
        "sunrise"
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[test]
fn triggers_only_run_for_their_event() {
    let report = engine().compile_script(&ScriptSource::new(
        "load-only",
        vec![node(1, "on load:", vec![leaf(2, "print \"hi\"")])],
    ));
    assert_eq!(report.script.run(&Sunrise).unwrap(), 0);
}

#[test]
fn runtime_errors_name_the_script() {
    let ctx = LoadContext::default();
    let err = run(
        vec![node(
            1,
            "on load:",
            vec![
                leaf(2, "print \"before\""),
                node(
                    3,
                    "repeat 9223372036854775807 * 2 times:",
                    vec![leaf(4, "print \"never\"")],
                ),
            ],
        )],
        &ctx,
    )
    .unwrap_err();
    assert!(matches!(err.kind, ErrorKind::Runtime(_)));
    assert_eq!(
        err.context.as_ref().and_then(|c| c.script.as_deref()),
        Some("test")
    );
    assert_eq!(ctx.output(), vec!["before"]);
}

#[test]
fn tracing_can_be_initialised_twice() {
    quill::init_tracing();
    quill::init_tracing();
}
