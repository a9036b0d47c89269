//! Mutation of host values through change effects.

use std::fmt;
use std::sync::Arc;

use quill_foundation::{Result, Value};

/// How a change effect mutates its target.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ChangeMode {
    /// `set X to Y`
    Set,
    /// `add Y to X`
    Add,
    /// `remove Y from X`
    Remove,
    /// `remove all Y from X`
    RemoveAll,
    /// `delete X` / `clear X`
    Delete,
    /// `reset X`
    Reset,
}

impl ChangeMode {
    /// Returns true if the mode takes a delta value.
    #[must_use]
    pub const fn takes_delta(self) -> bool {
        matches!(self, Self::Set | Self::Add | Self::Remove | Self::RemoveAll)
    }
}

impl fmt::Display for ChangeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Set => "set",
            Self::Add => "add",
            Self::Remove => "remove",
            Self::RemoveAll => "remove all",
            Self::Delete => "delete",
            Self::Reset => "reset",
        };
        f.write_str(name)
    }
}

/// Describes and performs the changes a type or expression supports.
pub trait Changer: Send + Sync {
    /// Returns the type names a delta may have for `mode`.
    ///
    /// `None` means the mode is illegal; an empty list means the mode is
    /// legal and takes no delta.
    fn accepts_change(&self, mode: ChangeMode) -> Option<Vec<Arc<str>>>;

    /// Applies the change to every target.
    ///
    /// # Errors
    ///
    /// Returns an error if a target cannot be changed at runtime.
    fn change(&self, targets: &[Value], delta: &[Value], mode: ChangeMode) -> Result<()>;
}
