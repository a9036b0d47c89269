//! Standard sections.

use std::sync::Arc;

use quill_foundation::{Result, Value};
use quill_parser::{Body, ExprRef, Registration, Section, TriggerContext};

/// Registers `if` and `repeat`.
///
/// # Errors
///
/// Returns an error if a standard type is not registered yet.
pub fn register(reg: &mut Registration) -> Result<()> {
    reg.register_section(&["if %boolean%"], |m, _| Ok(Arc::new(If(m.require(0)?))))?;
    reg.register_section(&["repeat %integer% time[s]"], |m, _| {
        Ok(Arc::new(Repeat(m.require(0)?)))
    })?;
    Ok(())
}

/// Runs its body once when the condition is true.
struct If(ExprRef);

impl Section for If {
    fn run(&self, ctx: &dyn TriggerContext, body: &Body) -> Result<()> {
        if self.0.single(ctx)? == Some(Value::Bool(true)) {
            body.execute(ctx)?;
        }
        Ok(())
    }

    fn describe(&self) -> String {
        format!("if {}", self.0.describe())
    }
}

/// Runs its body a number of times; zero for a negative or missing count.
struct Repeat(ExprRef);

impl Section for Repeat {
    fn run(&self, ctx: &dyn TriggerContext, body: &Body) -> Result<()> {
        let times = self.0.single(ctx)?.and_then(|v| v.as_int()).unwrap_or(0);
        for _ in 0..times.max(0) {
            body.execute(ctx)?;
        }
        Ok(())
    }

    fn describe(&self) -> String {
        format!("repeat {} times", self.0.describe())
    }
}
