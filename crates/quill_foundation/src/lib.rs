//! Core values, backing kinds, and errors for Quill.
//!
//! This crate provides:
//! - [`Value`] - The runtime value type produced by expressions
//! - [`ValueKind`] - Backing kinds that registered types are built on
//! - [`Error`] - Rich error types with script/line context
//! - Persistent collections ([`PVec`], [`PSet`]) used for O(1) match snapshots

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod collections;
pub mod error;
pub mod types;
pub mod value;

pub use collections::{PSet, PVec};
pub use error::{Error, ErrorContext, ErrorKind};
pub use types::ValueKind;
pub use value::{Object, Value};

/// Result type alias using the Quill error type.
pub type Result<T> = std::result::Result<T, Error>;
