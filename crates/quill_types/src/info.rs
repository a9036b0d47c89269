//! Type registration descriptors.

use std::fmt;
use std::sync::Arc;

use quill_foundation::{Value, ValueKind};

use crate::changer::Changer;

/// Parses literal text into a value.
pub type LiteralParser = Arc<dyn Fn(&str) -> Option<Value> + Send + Sync>;

/// Renders a value as literal text.
pub type Serializer = Arc<dyn Fn(&Value) -> String + Send + Sync>;

/// Converts a value of one type to another; `None` if this value cannot be converted.
pub type ConverterFn = Arc<dyn Fn(&Value) -> Option<Value> + Send + Sync>;

/// Describes a type to register.
///
/// # Example
///
/// ```
/// use quill_foundation::{Value, ValueKind};
/// use quill_types::TypeInfo;
///
/// let info = TypeInfo::new("integer@s", ValueKind::Int)
///     .with_parser(|s| s.parse::<i64>().ok().map(Value::Int))
///     .with_converter("number", |v| v.as_number().map(Value::Float));
/// assert_eq!(info.name_pattern(), "integer@s");
/// ```
#[derive(Clone)]
pub struct TypeInfo {
    pub(crate) name_pattern: String,
    pub(crate) kind: ValueKind,
    pub(crate) parser: Option<LiteralParser>,
    pub(crate) serializer: Option<Serializer>,
    pub(crate) changer: Option<Arc<dyn Changer>>,
    pub(crate) converters: Vec<(String, ConverterFn)>,
}

impl TypeInfo {
    /// Starts a descriptor from a name pattern (see [`TypeNames`]) and backing kind.
    ///
    /// [`TypeNames`]: crate::TypeNames
    #[must_use]
    pub fn new(name_pattern: impl Into<String>, kind: ValueKind) -> Self {
        Self {
            name_pattern: name_pattern.into(),
            kind,
            parser: None,
            serializer: None,
            changer: None,
            converters: Vec::new(),
        }
    }

    /// Sets the literal parser.
    #[must_use]
    pub fn with_parser(mut self, parser: impl Fn(&str) -> Option<Value> + Send + Sync + 'static) -> Self {
        self.parser = Some(Arc::new(parser));
        self
    }

    /// Sets the serializer. Without one, values render with `Display`.
    #[must_use]
    pub fn with_serializer(mut self, serializer: impl Fn(&Value) -> String + Send + Sync + 'static) -> Self {
        self.serializer = Some(Arc::new(serializer));
        self
    }

    /// Sets the changer used by change effects on values of this type.
    #[must_use]
    pub fn with_changer(mut self, changer: impl Changer + 'static) -> Self {
        self.changer = Some(Arc::new(changer));
        self
    }

    /// Adds a direct converter edge to the named type.
    #[must_use]
    pub fn with_converter(
        mut self,
        to: impl Into<String>,
        convert: impl Fn(&Value) -> Option<Value> + Send + Sync + 'static,
    ) -> Self {
        self.converters.push((to.into(), Arc::new(convert)));
        self
    }

    /// Returns the name pattern this descriptor was created with.
    #[must_use]
    pub fn name_pattern(&self) -> &str {
        &self.name_pattern
    }

    /// Returns the backing kind.
    #[must_use]
    pub fn kind(&self) -> &ValueKind {
        &self.kind
    }
}

impl fmt::Debug for TypeInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeInfo")
            .field("name_pattern", &self.name_pattern)
            .field("kind", &self.kind)
            .field("parser", &self.parser.is_some())
            .field("serializer", &self.serializer.is_some())
            .field("changer", &self.changer.is_some())
            .field("converters", &self.converters.iter().map(|(to, _)| to).collect::<Vec<_>>())
            .finish()
    }
}
