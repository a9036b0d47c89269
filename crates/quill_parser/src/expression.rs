//! Bound expression trees.
//!
//! Expressions are built by syntax factories after a successful match and
//! are immutable afterwards. Evaluation happens later, when the host runs a
//! trigger against a [`TriggerContext`].

use std::fmt;
use std::sync::Arc;

use quill_foundation::{Error, ErrorKind, Result, Value};
use quill_types::{ChangeMode, TypeRegistry};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::runtime::TriggerContext;

/// Shared handle to a bound expression.
pub type ExprRef = Arc<dyn Expression>;

/// Reads the values of a context expression from the running trigger.
pub type ContextGetter = Arc<dyn Fn(&dyn TriggerContext) -> Result<Vec<Value>> + Send + Sync>;

/// How many values an expression syntax produces.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Arity {
    /// Exactly one value; fills singular slots only.
    Single,
    /// Any number of values; fills plural slots only.
    Plural,
    /// Fills both; the built expression reports its own arity.
    Either,
}

impl Arity {
    /// Returns true if a syntax of this arity may fill the slot.
    #[must_use]
    pub const fn fits(self, plural_slot: bool) -> bool {
        match self {
            Self::Single => !plural_slot,
            Self::Plural => plural_slot,
            Self::Either => true,
        }
    }
}

/// A bound, typed expression.
pub trait Expression: Send + Sync {
    /// Canonical name of the type this expression produces.
    fn return_type(&self) -> &str;

    /// Returns true if the expression produces at most one value.
    fn is_single(&self) -> bool {
        true
    }

    /// Evaluates the expression.
    ///
    /// # Errors
    ///
    /// Returns a `Runtime` error if evaluation fails.
    fn values(&self, ctx: &dyn TriggerContext) -> Result<Vec<Value>>;

    /// Renders the expression for diagnostics.
    fn describe(&self) -> String;

    /// Returns the constant values of a literal.
    fn literal_values(&self) -> Option<&[Value]> {
        None
    }

    /// Returns the delta types accepted for `mode`, or `None` if the
    /// expression cannot be changed that way.
    fn accepts_change(&self, _mode: ChangeMode) -> Option<Vec<Arc<str>>> {
        None
    }

    /// Changes the value behind this expression.
    ///
    /// # Errors
    ///
    /// Returns `Unsupported` unless the expression overrides it.
    fn change(&self, _ctx: &dyn TriggerContext, _delta: &[Value], mode: ChangeMode) -> Result<()> {
        Err(Error::new(ErrorKind::Unsupported(format!(
            "can't {mode} {}",
            self.describe()
        ))))
    }
}

impl dyn Expression {
    /// Evaluates the expression and returns its first value.
    ///
    /// # Errors
    ///
    /// Propagates evaluation errors.
    pub fn single(&self, ctx: &dyn TriggerContext) -> Result<Option<Value>> {
        Ok(self.values(ctx)?.into_iter().next())
    }

    /// Returns true if the expression is a literal.
    #[must_use]
    pub fn is_literal(&self) -> bool {
        self.literal_values().is_some()
    }
}

impl fmt::Debug for dyn Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.describe(), self.return_type())
    }
}

// =============================================================================
// Literal
// =============================================================================

/// Constant values parsed from script text.
#[derive(Clone, Debug)]
pub struct Literal {
    type_name: Arc<str>,
    values: Vec<Value>,
    text: String,
}

impl Literal {
    /// Creates a literal of the given type.
    #[must_use]
    pub fn new(type_name: impl Into<Arc<str>>, values: Vec<Value>, text: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            values,
            text: text.into(),
        }
    }
}

impl Expression for Literal {
    fn return_type(&self) -> &str {
        &self.type_name
    }

    fn is_single(&self) -> bool {
        self.values.len() <= 1
    }

    fn values(&self, _ctx: &dyn TriggerContext) -> Result<Vec<Value>> {
        Ok(self.values.clone())
    }

    fn describe(&self) -> String {
        self.text.clone()
    }

    fn literal_values(&self) -> Option<&[Value]> {
        Some(&self.values)
    }
}

// =============================================================================
// Converted
// =============================================================================

/// Converts another expression's values at evaluation time.
pub struct Converted {
    inner: ExprRef,
    to: Arc<str>,
    types: Arc<TypeRegistry>,
}

impl Converted {
    /// Wraps `inner` so that its values are converted to `to`.
    #[must_use]
    pub fn new(inner: ExprRef, to: impl Into<Arc<str>>, types: Arc<TypeRegistry>) -> Self {
        Self {
            inner,
            to: to.into(),
            types,
        }
    }

    /// Returns the wrapped expression.
    #[must_use]
    pub fn inner(&self) -> &ExprRef {
        &self.inner
    }
}

impl Expression for Converted {
    fn return_type(&self) -> &str {
        &self.to
    }

    fn is_single(&self) -> bool {
        self.inner.is_single()
    }

    fn values(&self, ctx: &dyn TriggerContext) -> Result<Vec<Value>> {
        let from = self.inner.return_type();
        self.inner
            .values(ctx)?
            .iter()
            .map(|v| self.types.convert(v, from, &self.to))
            .collect()
    }

    fn describe(&self) -> String {
        self.inner.describe()
    }

    fn accepts_change(&self, mode: ChangeMode) -> Option<Vec<Arc<str>>> {
        self.inner.accepts_change(mode)
    }

    fn change(&self, ctx: &dyn TriggerContext, delta: &[Value], mode: ChangeMode) -> Result<()> {
        self.inner.change(ctx, delta, mode)
    }
}

// =============================================================================
// Lists
// =============================================================================

/// A literal list of expressions, `a, b and c` or `a, b or c`.
pub struct ExpressionList {
    items: Vec<ExprRef>,
    and: bool,
    return_type: Arc<str>,
}

impl ExpressionList {
    /// Creates a list. `and` lists yield every item's values; `or` lists
    /// yield the values of the first item that has any.
    #[must_use]
    pub fn new(items: Vec<ExprRef>, and: bool, return_type: impl Into<Arc<str>>) -> Self {
        Self {
            items,
            and,
            return_type: return_type.into(),
        }
    }

    /// Returns the list items.
    #[must_use]
    pub fn items(&self) -> &[ExprRef] {
        &self.items
    }

    /// Returns true for an `and` list.
    #[must_use]
    pub fn is_and_list(&self) -> bool {
        self.and
    }
}

impl Expression for ExpressionList {
    fn return_type(&self) -> &str {
        &self.return_type
    }

    fn is_single(&self) -> bool {
        self.items.len() == 1 && self.items[0].is_single()
    }

    fn values(&self, ctx: &dyn TriggerContext) -> Result<Vec<Value>> {
        if self.and {
            let mut out = Vec::new();
            for item in &self.items {
                out.extend(item.values(ctx)?);
            }
            return Ok(out);
        }
        for item in &self.items {
            let values = item.values(ctx)?;
            if !values.is_empty() {
                return Ok(values);
            }
        }
        Ok(Vec::new())
    }

    fn describe(&self) -> String {
        let connective = if self.and { "and" } else { "or" };
        let mut parts: Vec<String> = self.items.iter().map(|i| i.describe()).collect();
        match parts.pop() {
            Some(last) if !parts.is_empty() => format!("{} {connective} {last}", parts.join(", ")),
            Some(last) => last,
            None => String::new(),
        }
    }
}

// =============================================================================
// Context values
// =============================================================================

/// A value read from the running trigger's context, e.g. `the arguments`.
pub struct ContextValue {
    description: String,
    return_type: Arc<str>,
    single: bool,
    getter: ContextGetter,
}

impl ContextValue {
    /// Creates a context value expression.
    #[must_use]
    pub fn new(
        description: impl Into<String>,
        return_type: impl Into<Arc<str>>,
        single: bool,
        getter: ContextGetter,
    ) -> Self {
        Self {
            description: description.into(),
            return_type: return_type.into(),
            single,
            getter,
        }
    }
}

impl Expression for ContextValue {
    fn return_type(&self) -> &str {
        &self.return_type
    }

    fn is_single(&self) -> bool {
        self.single
    }

    fn values(&self, ctx: &dyn TriggerContext) -> Result<Vec<Value>> {
        (self.getter)(ctx)
    }

    fn describe(&self) -> String {
        self.description.clone()
    }
}
