//! Runtime contexts supplied by the host when triggers run.

use std::any::Any;

use tracing::info;

/// The object a trigger runs against.
///
/// Carries event-specific data that context expressions read from. Hosts
/// implement this for each kind of event they fire.
pub trait TriggerContext {
    /// Name of the event this context belongs to, e.g. `load`.
    fn name(&self) -> &str;

    /// Allows expressions to downcast to the concrete context.
    fn as_any(&self) -> &dyn Any;

    /// Returns the cancellable view of this context, if it has one.
    fn as_cancellable(&self) -> Option<&dyn Cancellable> {
        None
    }

    /// Receives text produced by output effects such as `print`.
    fn emit(&self, message: &str) {
        info!(context = self.name(), "{message}");
    }
}

/// A context whose event can be cancelled by scripts.
pub trait Cancellable {
    /// Returns true if the event is currently cancelled.
    fn is_cancelled(&self) -> bool;

    /// Cancels or uncancels the event.
    fn set_cancelled(&self, cancelled: bool);
}

/// Downcasts a context to a concrete type.
#[must_use]
pub fn downcast<T: Any>(ctx: &dyn TriggerContext) -> Option<&T> {
    ctx.as_any().downcast_ref::<T>()
}
