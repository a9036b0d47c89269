//! The script load event and its context.

use std::any::Any;
use std::cell::RefCell;
use std::sync::Arc;

use quill_foundation::{Result, Value};
use quill_parser::{Arity, ContextEvent, EventInfo, Registration, TriggerContext, downcast};
use tracing::info;

/// Name of the event fired once a script has loaded.
pub const LOAD: &str = "load";

/// Context of the load event: the script's arguments plus everything the
/// script printed.
#[derive(Debug, Default)]
pub struct LoadContext {
    arguments: Vec<String>,
    output: RefCell<Vec<String>>,
}

impl LoadContext {
    /// Creates a load context with the given arguments.
    #[must_use]
    pub fn new(arguments: Vec<String>) -> Self {
        Self {
            arguments,
            output: RefCell::new(Vec::new()),
        }
    }

    /// Returns the script arguments.
    #[must_use]
    pub fn arguments(&self) -> &[String] {
        &self.arguments
    }

    /// Returns the messages emitted so far.
    #[must_use]
    pub fn output(&self) -> Vec<String> {
        self.output.borrow().clone()
    }
}

impl TriggerContext for LoadContext {
    fn name(&self) -> &str {
        LOAD
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn emit(&self, message: &str) {
        info!(context = LOAD, "{message}");
        self.output.borrow_mut().push(message.to_string());
    }
}

/// Registers the load event and the `arguments` context value.
///
/// # Errors
///
/// Returns an error if the `string` type is not registered yet.
pub fn register(reg: &mut Registration) -> Result<()> {
    reg.register_event(EventInfo::new(LOAD), &["[on] [script] load"], |_, _| {
        Ok(Arc::new(ContextEvent::new(LOAD)))
    })?;
    reg.register_context_value(
        LOAD,
        &["[the] [script] arguments"],
        "string",
        Arity::Plural,
        arguments,
    )?;
    Ok(())
}

fn arguments(ctx: &dyn TriggerContext) -> Result<Vec<Value>> {
    Ok(downcast::<LoadContext>(ctx)
        .map(|load| load.arguments.iter().map(|a| Value::from(a.as_str())).collect())
        .unwrap_or_default())
}
