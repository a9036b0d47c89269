//! Type and converter registry for Quill.
//!
//! Types are registered once at startup and read-only afterwards. Each
//! type has singular and plural surface forms, a backing [`ValueKind`],
//! an optional literal parser and serializer, an optional [`Changer`], and
//! direct converter edges to other types. Conversions compose transitively
//! up to a hop bound.
//!
//! [`ValueKind`]: quill_foundation::ValueKind

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod changer;
pub mod info;
pub mod literal;
pub mod names;
pub mod registry;

pub use changer::{ChangeMode, Changer};
pub use info::{ConverterFn, LiteralParser, Serializer, TypeInfo};
pub use names::TypeNames;
pub use registry::{DEFAULT_MAX_HOPS, RegisteredType, TypeRegistry};
