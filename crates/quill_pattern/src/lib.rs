//! Pattern compiler for Quill.
//!
//! Patterns are hand-authored grammar fragments describing one accepted
//! surface form of a syntax element:
//!
//! ```text
//! [the] (1:first|2:last) occurrence of %string% in %string%
//! ```
//!
//! This crate provides:
//! - [`PatternCompiler`] - Turns pattern source into a [`Pattern`]
//! - [`PatternElement`] - The pattern AST
//! - [`Mark`] - Tags recorded when a choice alternative is selected
//! - [`possible_inputs`] - Starting elements of a sequence, for span pruning
//!
//! Slot type names are resolved through the [`TypeLookup`] seam so the
//! compiler does not depend on the type registry.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod ast;
pub mod compiler;
pub mod pretty;

pub use ast::{
    Choice, ExpressionElement, Mark, PatternElement, PossibleInput, RegexGroup, TextElement,
    TypeRef, possible_inputs,
};
pub use compiler::{Pattern, PatternCompiler, TypeLookup};
