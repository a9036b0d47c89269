//! Ambient parser state for context-sensitive syntax.

use std::sync::Arc;

/// Describes an event that triggers can be bound to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EventInfo {
    /// Name of the runtime contexts this event handles.
    pub name: Arc<str>,
    /// Whether scripts may cancel the event.
    pub cancellable: bool,
}

impl EventInfo {
    /// Creates a non-cancellable event description.
    #[must_use]
    pub fn new(name: impl Into<Arc<str>>) -> Self {
        Self {
            name: name.into(),
            cancellable: false,
        }
    }

    /// Builder method to mark the event cancellable.
    #[must_use]
    pub fn with_cancellable(mut self, cancellable: bool) -> Self {
        self.cancellable = cancellable;
        self
    }
}

/// A typed parameter declared in a trigger header, e.g. `<number>` in
/// `command /roll <number>`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CommandParameter {
    /// Canonical name of the parameter's type.
    pub type_name: Arc<str>,
    /// Whether the parameter takes several values.
    pub plural: bool,
    /// Whether the parameter may be left out.
    pub optional: bool,
}

impl CommandParameter {
    /// Creates a required single-valued parameter.
    #[must_use]
    pub fn new(type_name: impl Into<Arc<str>>) -> Self {
        Self {
            type_name: type_name.into(),
            plural: false,
            optional: false,
        }
    }

    /// Builder method to make the parameter plural.
    #[must_use]
    pub fn with_plural(mut self, plural: bool) -> Self {
        self.plural = plural;
        self
    }

    /// Builder method to make the parameter optional.
    #[must_use]
    pub fn with_optional(mut self, optional: bool) -> Self {
        self.optional = optional;
        self
    }
}

/// What is open around the statement being parsed.
///
/// Factories receive this to reject syntax that makes no sense in the
/// current position, e.g. `cancel the event` outside a cancellable event.
#[derive(Clone, Debug, Default)]
pub struct ParserState {
    events: Vec<EventInfo>,
    sections: Vec<Arc<str>>,
    parameters: Vec<CommandParameter>,
}

impl ParserState {
    /// Creates a state with nothing open.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a state inside a trigger for the given event.
    #[must_use]
    pub fn for_event(event: EventInfo) -> Self {
        Self {
            events: vec![event],
            sections: Vec::new(),
            parameters: Vec::new(),
        }
    }

    /// Builder method to declare the parameters of the enclosing trigger.
    #[must_use]
    pub fn with_parameters(mut self, parameters: Vec<CommandParameter>) -> Self {
        self.parameters = parameters;
        self
    }

    /// Returns the parameters the enclosing trigger declared, in order.
    #[must_use]
    pub fn parameters(&self) -> &[CommandParameter] {
        &self.parameters
    }

    /// Returns the events currently open.
    #[must_use]
    pub fn current_events(&self) -> &[EventInfo] {
        &self.events
    }

    /// Returns true if an event with the given name is open.
    #[must_use]
    pub fn has_event(&self, name: &str) -> bool {
        self.events.iter().any(|e| e.name.as_ref() == name)
    }

    /// Returns true if any open event is cancellable.
    #[must_use]
    pub fn is_cancellable(&self) -> bool {
        self.events.iter().any(|e| e.cancellable)
    }

    /// Returns the names of the open sections, outermost first.
    #[must_use]
    pub fn sections(&self) -> &[Arc<str>] {
        &self.sections
    }

    /// Enters a section.
    pub fn enter_section(&mut self, name: impl Into<Arc<str>>) {
        self.sections.push(name.into());
    }

    /// Leaves the innermost section.
    pub fn exit_section(&mut self) {
        self.sections.pop();
    }
}
