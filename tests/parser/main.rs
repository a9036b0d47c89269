//! Integration tests for Layer 2: Parser
//!
//! Tests for backtracking matching, expression resolution, tie-breaking
//! and ambiguity reporting through the public engine API.

mod matching;
mod resolution;

use std::any::Any;
use std::sync::Arc;

use quill_foundation::{Result, Value, ValueKind};
use quill_parser::{
    Arity, Effect, Engine, EngineConfig, ExprRef, Expression, Literal, Registration, SyntaxInfo,
    TriggerContext,
};
use quill_types::TypeInfo;
use quill_types::literal::{parse_integer, parse_number, parse_quoted};

/// A context for evaluating expressions outside of any event.
pub struct Host;

impl TriggerContext for Host {
    fn name(&self) -> &str {
        "host"
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// An effect that only remembers how it was built.
pub struct Noted(pub String);

impl Effect for Noted {
    fn execute(&self, _ctx: &dyn TriggerContext) -> Result<()> {
        Ok(())
    }

    fn describe(&self) -> String {
        self.0.clone()
    }
}

/// Adds two numbers.
pub struct Sum(pub ExprRef, pub ExprRef);

impl Expression for Sum {
    fn return_type(&self) -> &str {
        "number"
    }

    fn values(&self, ctx: &dyn TriggerContext) -> Result<Vec<Value>> {
        let left = self.0.single(ctx)?.and_then(|v| v.as_number()).unwrap_or(0.0);
        let right = self.1.single(ctx)?.and_then(|v| v.as_number()).unwrap_or(0.0);
        Ok(vec![Value::Float(left + right)])
    }

    fn describe(&self) -> String {
        format!("{} plus {}", self.0.describe(), self.1.describe())
    }
}

/// A registration with `integer`, `number`, `string` and `item` types.
///
/// Items are single alphabetic words.
pub fn registration(config: EngineConfig) -> Registration {
    let mut reg = Registration::with_config(config);
    reg.register_type(
        TypeInfo::new("integer@s", ValueKind::Int).with_parser(|s| parse_integer(s).map(Value::Int)),
    )
    .unwrap();
    reg.register_type(
        TypeInfo::new("number@s", ValueKind::Float).with_parser(|s| parse_number(s).map(Value::Float)),
    )
    .unwrap();
    reg.register_type(
        TypeInfo::new("string@s", ValueKind::String).with_parser(|s| parse_quoted(s).map(Value::from)),
    )
    .unwrap();
    reg.register_type(TypeInfo::new("item@s", ValueKind::String).with_parser(|s| {
        (!s.is_empty() && s.chars().all(char::is_alphabetic)).then(|| Value::from(s))
    }))
    .unwrap();
    reg.register_converter("integer", "number", |v| v.as_number().map(Value::Float))
        .unwrap();
    reg.register_converter("number", "string", |v| Some(Value::from(v.to_string())))
        .unwrap();
    reg
}

/// Registers `pattern` as a number expression with a constant value.
pub fn constant<'r>(reg: &'r mut Registration, pattern: &str, value: f64) -> &'r mut SyntaxInfo {
    reg.register_expression(&[pattern], "number", Arity::Single, move |m, _| {
        Ok(Arc::new(Literal::new("number", vec![Value::Float(value)], m.text.clone())))
    })
    .unwrap()
}

/// Registers `%number% plus %number%`.
pub fn with_sum(reg: &mut Registration) {
    reg.register_expression(&["%number% plus %number%"], "number", Arity::Single, |m, _| {
        Ok(Arc::new(Sum(m.require(0)?, m.require(1)?)))
    })
    .unwrap();
}

/// An engine with the test types and `plus`.
pub fn engine() -> Engine {
    let mut reg = registration(EngineConfig::default());
    with_sum(&mut reg);
    reg.finish()
}

/// Evaluates a single-valued expression.
pub fn single(expr: &ExprRef) -> Option<Value> {
    expr.single(&Host).unwrap()
}
