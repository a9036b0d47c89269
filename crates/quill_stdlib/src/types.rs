//! Standard types and converters.

use quill_foundation::{Result, Value, ValueKind};
use quill_parser::Registration;
use quill_types::TypeInfo;
use quill_types::literal::{parse_integer, parse_number, parse_quoted, quote};

/// Registers the standard types and their converters.
///
/// Numbers are registered before integers, so an untyped literal such as
/// `5` in an `object` slot becomes a number.
///
/// # Errors
///
/// Returns `DuplicateType` if a standard type name is already taken.
pub fn register(reg: &mut Registration) -> Result<()> {
    reg.register_type(TypeInfo::new("object@s", ValueKind::Any))?;
    reg.register_type(
        TypeInfo::new("boolean@s", ValueKind::Bool)
            .with_parser(parse_boolean)
            .with_converter("string", |v| v.as_bool().map(|b| Value::from(b.to_string()))),
    )?;
    reg.register_type(
        TypeInfo::new("number@s", ValueKind::Float)
            .with_parser(|s| parse_number(s).map(Value::Float))
            .with_converter("string", |v| v.as_number().map(|n| Value::from(n.to_string()))),
    )?;
    reg.register_type(
        TypeInfo::new("integer@s", ValueKind::Int)
            .with_parser(|s| parse_integer(s).map(Value::Int))
            .with_converter("number", |v| v.as_number().map(Value::Float))
            .with_converter("string", |v| v.as_int().map(|n| Value::from(n.to_string()))),
    )?;
    reg.register_type(
        TypeInfo::new("string@s", ValueKind::String)
            .with_parser(|s| parse_quoted(s).map(Value::from))
            .with_serializer(|v| v.as_str().map_or_else(|| v.to_string(), quote)),
    )?;
    Ok(())
}

fn parse_boolean(text: &str) -> Option<Value> {
    match text.to_lowercase().as_str() {
        "true" | "yes" | "on" => Some(Value::Bool(true)),
        "false" | "no" | "off" => Some(Value::Bool(false)),
        _ => None,
    }
}
