//! Singular and plural surface forms of type names.

use std::sync::Arc;

use quill_foundation::{Error, ErrorKind, Result};

/// The surface forms of a registered type.
///
/// Declared with the `@` notation: `stem@singular@plural` or
/// `stem@plural`. `entit@y@ies` gives `entity`/`entities`, `player@s`
/// gives `player`/`players`. A name without `@` takes an `s` plural.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TypeNames {
    singular: Arc<str>,
    plural: Arc<str>,
}

impl TypeNames {
    /// Parses a name pattern.
    ///
    /// # Errors
    ///
    /// Returns an `Unsupported` error if the pattern is empty, contains
    /// whitespace or more than two `@` separators.
    pub fn parse(pattern: &str) -> Result<Self> {
        let invalid = |why: &str| {
            Error::new(ErrorKind::Unsupported(format!(
                "invalid type name {pattern:?}: {why}"
            )))
        };
        if pattern.is_empty() {
            return Err(invalid("empty"));
        }
        if pattern.chars().any(char::is_whitespace) {
            return Err(invalid("contains whitespace"));
        }

        let parts: Vec<&str> = pattern.split('@').collect();
        let (singular, plural) = match parts.as_slice() {
            [name] => ((*name).to_string(), format!("{name}s")),
            [stem, plural] => ((*stem).to_string(), format!("{stem}{plural}")),
            [stem, singular, plural] => (format!("{stem}{singular}"), format!("{stem}{plural}")),
            _ => return Err(invalid("too many '@'")),
        };
        if singular.is_empty() || singular == plural {
            return Err(invalid("singular and plural forms must differ"));
        }

        Ok(Self {
            singular: singular.to_lowercase().into(),
            plural: plural.to_lowercase().into(),
        })
    }

    /// Returns the singular form, which is also the type's canonical name.
    #[must_use]
    pub fn singular(&self) -> &Arc<str> {
        &self.singular
    }

    /// Returns the plural form.
    #[must_use]
    pub fn plural(&self) -> &Arc<str> {
        &self.plural
    }
}
