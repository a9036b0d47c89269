//! Standard library of types and syntaxes for Quill.
//!
//! This crate provides the default registrations, organized by category:
//! - Types (object, boolean, number, integer, string) and their converters
//! - Expressions (arithmetic, text, comparisons, script arguments)
//! - Effects (output, event cancellation, changes)
//! - Sections (conditionals, loops)
//! - Events (script load)
//! - Commands (command triggers and their arguments)
//!
//! # Example
//!
//! ```
//! use quill_foundation::Value;
//! use quill_parser::{EngineConfig, ParserState};
//! use quill_stdlib::{LoadContext, default_engine};
//!
//! let engine = default_engine(EngineConfig::default()).unwrap();
//! let expr = engine
//!     .parse_expression("the length of \"quill\"", "integer", &ParserState::new())
//!     .unwrap();
//! let ctx = LoadContext::new(Vec::new());
//! assert_eq!(expr.single(&ctx).unwrap(), Some(Value::Int(5)));
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod commands;
pub mod effects;
pub mod events;
pub mod expressions;
pub mod sections;
pub mod types;

pub use commands::CommandContext;
pub use events::LoadContext;

use quill_foundation::Result;
use quill_parser::{Engine, EngineConfig, Registration};
use tracing::debug;

/// Registers every standard type and syntax, in dependency order.
///
/// # Errors
///
/// Returns the first registration error; none are expected on a fresh
/// registration.
pub fn register_defaults(reg: &mut Registration) -> Result<()> {
    types::register(reg)?;
    expressions::register(reg)?;
    effects::register(reg)?;
    sections::register(reg)?;
    events::register(reg)?;
    commands::register(reg)?;
    debug!(types = reg.types().len(), "registered standard library");
    Ok(())
}

/// Builds an engine holding only the standard library.
///
/// # Errors
///
/// Returns the first registration error.
pub fn default_engine(config: EngineConfig) -> Result<Engine> {
    let mut reg = Registration::with_config(config);
    register_defaults(&mut reg)?;
    Ok(reg.finish())
}
