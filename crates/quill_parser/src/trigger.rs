//! Statements and triggers.
//!
//! A trigger is an event plus the ordered statements that run when the
//! event fires. Statements are effects, or sections that drive a body of
//! nested statements.

use std::fmt;
use std::sync::Arc;

use quill_foundation::{ErrorContext, Result};

use crate::runtime::TriggerContext;
use crate::state::CommandParameter;

/// A statement that does something.
pub trait Effect: Send + Sync {
    /// Runs the effect.
    ///
    /// # Errors
    ///
    /// Returns an error if evaluation fails.
    fn execute(&self, ctx: &dyn TriggerContext) -> Result<()>;

    /// Renders the effect for diagnostics.
    fn describe(&self) -> String;
}

/// A statement that owns a body and decides how often it runs.
pub trait Section: Send + Sync {
    /// Runs the section, executing `body` zero or more times.
    ///
    /// # Errors
    ///
    /// Returns an error if evaluation fails.
    fn run(&self, ctx: &dyn TriggerContext, body: &Body) -> Result<()>;

    /// Renders the section header for diagnostics.
    fn describe(&self) -> String;
}

/// The event a trigger is bound to.
pub trait Event: Send + Sync {
    /// Returns true if the trigger should run for this context.
    fn check(&self, ctx: &dyn TriggerContext) -> bool;

    /// Renders the event for diagnostics.
    fn describe(&self) -> String;

    /// Returns the parameters the trigger header declared.
    fn parameters(&self) -> &[CommandParameter] {
        &[]
    }
}

impl fmt::Debug for dyn Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.describe())
    }
}

/// An event that accepts every context with its name.
#[derive(Clone, Debug)]
pub struct ContextEvent {
    name: Arc<str>,
}

impl ContextEvent {
    /// Creates an event matching contexts named `name`.
    #[must_use]
    pub fn new(name: impl Into<Arc<str>>) -> Self {
        Self { name: name.into() }
    }
}

impl Event for ContextEvent {
    fn check(&self, ctx: &dyn TriggerContext) -> bool {
        ctx.name() == self.name.as_ref()
    }

    fn describe(&self) -> String {
        format!("on {}", self.name)
    }
}

/// A compiled statement.
#[derive(Clone)]
pub enum Statement {
    /// A single effect.
    Effect {
        /// The effect.
        effect: Arc<dyn Effect>,
        /// Source line.
        line: usize,
    },
    /// A section with its nested body.
    Section {
        /// The section.
        section: Arc<dyn Section>,
        /// The nested statements.
        body: Body,
        /// Source line of the header.
        line: usize,
    },
}

impl Statement {
    /// Returns the source line.
    #[must_use]
    pub fn line(&self) -> usize {
        match self {
            Self::Effect { line, .. } | Self::Section { line, .. } => *line,
        }
    }

    /// Runs the statement.
    ///
    /// # Errors
    ///
    /// Returns the first evaluation error, tagged with the statement's line.
    pub fn execute(&self, ctx: &dyn TriggerContext) -> Result<()> {
        let result = match self {
            Self::Effect { effect, .. } => effect.execute(ctx),
            Self::Section { section, body, .. } => section.run(ctx, body),
        };
        result.map_err(|e| {
            if e.context.is_some() {
                e
            } else {
                e.with_context(ErrorContext::new().with_line(self.line()))
            }
        })
    }
}

impl fmt::Debug for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Effect { effect, line } => write!(f, "{line}: {}", effect.describe()),
            Self::Section {
                section,
                body,
                line,
            } => {
                write!(f, "{line}: {} ", section.describe())?;
                f.debug_list().entries(body.statements()).finish()
            }
        }
    }
}

/// An ordered list of statements.
#[derive(Clone, Debug, Default)]
pub struct Body {
    statements: Vec<Statement>,
}

impl Body {
    /// Creates a body.
    #[must_use]
    pub fn new(statements: Vec<Statement>) -> Self {
        Self { statements }
    }

    /// Returns the statements.
    #[must_use]
    pub fn statements(&self) -> &[Statement] {
        &self.statements
    }

    /// Returns true if the body has no statements.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }

    /// Runs every statement in order, stopping at the first error.
    ///
    /// # Errors
    ///
    /// Returns the first statement error.
    pub fn execute(&self, ctx: &dyn TriggerContext) -> Result<()> {
        for statement in &self.statements {
            statement.execute(ctx)?;
        }
        Ok(())
    }
}

/// An event bound to the statements that run when it fires.
#[derive(Clone)]
pub struct Trigger {
    event: Arc<dyn Event>,
    event_name: Arc<str>,
    body: Body,
    line: usize,
}

impl Trigger {
    /// Creates a trigger.
    #[must_use]
    pub fn new(event: Arc<dyn Event>, event_name: impl Into<Arc<str>>, body: Body, line: usize) -> Self {
        Self {
            event,
            event_name: event_name.into(),
            body,
            line,
        }
    }

    /// Returns the name of the contexts this trigger handles.
    #[must_use]
    pub fn event_name(&self) -> &str {
        &self.event_name
    }

    /// Returns the body.
    #[must_use]
    pub fn body(&self) -> &Body {
        &self.body
    }

    /// Returns the source line of the trigger header.
    #[must_use]
    pub fn line(&self) -> usize {
        self.line
    }

    /// Runs the trigger if its event accepts the context.
    ///
    /// Returns whether the body ran.
    ///
    /// # Errors
    ///
    /// Returns the first statement error.
    pub fn execute(&self, ctx: &dyn TriggerContext) -> Result<bool> {
        if ctx.name() != self.event_name.as_ref() || !self.event.check(ctx) {
            return Ok(false);
        }
        self.body.execute(ctx)?;
        Ok(true)
    }
}

impl fmt::Debug for Trigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Trigger")
            .field("event", &self.event.describe())
            .field("line", &self.line)
            .field("body", &self.body)
            .finish()
    }
}
