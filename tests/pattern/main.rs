//! Integration tests for Layer 1: Patterns
//!
//! Tests for the pattern compiler, the pattern tree and pretty printing.

mod compiler;

use quill_foundation::ValueKind;
use quill_pattern::{Pattern, PatternCompiler};
use quill_types::{TypeInfo, TypeRegistry};

/// A registry with a few common types.
pub fn types() -> TypeRegistry {
    let mut types = TypeRegistry::new();
    types.register(TypeInfo::new("number@s", ValueKind::Float)).unwrap();
    types.register(TypeInfo::new("string@s", ValueKind::String)).unwrap();
    types
        .register(TypeInfo::new("entit@y@ies", ValueKind::object("entity")))
        .unwrap();
    types
}

/// Compiles `source` against [`types`].
pub fn compile(source: &str) -> quill_foundation::Result<Pattern> {
    PatternCompiler::new(&types()).compile(source)
}
