//! Cross-layer integration tests for Quill
//!
//! Tests that compile and run whole scripts against the standard library.

mod loading;
mod running;

use quill_parser::{Engine, EngineConfig, ScriptNode, ScriptSource};

/// The standard library engine.
pub fn engine() -> Engine {
    quill_stdlib::default_engine(EngineConfig::default()).unwrap()
}

/// Builds a node from `(line, text)` with children.
pub fn node(line: usize, text: &str, children: Vec<ScriptNode>) -> ScriptNode {
    ScriptNode::new(line, text).with_children(children)
}

/// Builds a childless node.
pub fn leaf(line: usize, text: &str) -> ScriptNode {
    ScriptNode::new(line, text)
}

/// A script whose load trigger prints `message`.
pub fn greeting(name: &str, message: &str) -> ScriptSource {
    ScriptSource::new(
        name,
        vec![node(1, "on load:", vec![leaf(2, &format!("print \"{message}\""))])],
    )
}
