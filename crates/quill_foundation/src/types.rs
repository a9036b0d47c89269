//! Backing kinds for registered types.

use std::fmt;
use std::sync::Arc;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// The kind of runtime value a registered type is backed by.
///
/// Several registered types may share a backing kind (for example two
/// host object types); lookups by kind return the first registration.
#[derive(Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ValueKind {
    /// Boolean values.
    Bool,
    /// 64-bit signed integers.
    Int,
    /// 64-bit floating point numbers.
    Float,
    /// Strings.
    String,
    /// Host objects tagged with the given type name.
    Object(Arc<str>),
    /// Any value (the top type).
    Any,
}

impl ValueKind {
    /// Creates an object kind for the given host type name.
    #[must_use]
    pub fn object(name: impl Into<Arc<str>>) -> Self {
        Self::Object(name.into())
    }

    /// Returns true if this kind is `Any`.
    #[must_use]
    pub const fn is_any(&self) -> bool {
        matches!(self, Self::Any)
    }

    /// Checks if a value of kind `actual` can be stored where `self` is expected.
    ///
    /// - `Any` accepts everything
    /// - `Float` accepts `Int` (numeric promotion)
    /// - Objects must carry the same type name
    #[must_use]
    pub fn accepts(&self, actual: &ValueKind) -> bool {
        match (self, actual) {
            (Self::Any, _)
            | (Self::Bool, Self::Bool)
            | (Self::Int | Self::Float, Self::Int)
            | (Self::Float, Self::Float)
            | (Self::String, Self::String) => true,
            (Self::Object(expected), Self::Object(actual)) => expected == actual,
            _ => false,
        }
    }
}

impl fmt::Debug for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool => write!(f, "bool"),
            Self::Int => write!(f, "int"),
            Self::Float => write!(f, "float"),
            Self::String => write!(f, "string"),
            Self::Object(name) => write!(f, "object<{name}>"),
            Self::Any => write!(f, "any"),
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}
