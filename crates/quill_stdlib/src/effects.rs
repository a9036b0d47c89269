//! Standard effects: output, event cancellation and changes.

use std::sync::Arc;

use quill_foundation::{Error, ErrorKind, Result, Value};
use quill_parser::{
    Effect, ExprRef, ParserState, Registration, SyntaxMatch, TriggerContext, TypesHandle,
};
use quill_types::ChangeMode;
use tracing::debug;

/// Registers the standard effects.
///
/// # Errors
///
/// Returns an error if a standard type is not registered yet.
pub fn register(reg: &mut Registration) -> Result<()> {
    reg.register_effect(&["(print|broadcast) %strings%"], |m, _| {
        Ok(Arc::new(Print(m.require(0)?)))
    })?;
    reg.register_effect(&["cancel [the] event", "uncancel [the] event"], cancel)?;

    let types = reg.types_handle();
    reg.register_effect(
        &[
            "set %objects% to %objects%",
            "add %objects% to %objects%",
            "remove [1:all] %objects% from %objects%",
            "(delete|clear) %objects%",
            "reset %objects%",
        ],
        move |m, _| Change::from_match(m, types.clone()).map(|c| Arc::new(c) as Arc<dyn Effect>),
    )?;
    Ok(())
}

// =============================================================================
// Output
// =============================================================================

struct Print(ExprRef);

impl Effect for Print {
    fn execute(&self, ctx: &dyn TriggerContext) -> Result<()> {
        for value in self.0.values(ctx)? {
            match value.as_str() {
                Some(s) => ctx.emit(s),
                None => ctx.emit(&value.to_string()),
            }
        }
        Ok(())
    }

    fn describe(&self) -> String {
        format!("print {}", self.0.describe())
    }
}

// =============================================================================
// Cancellation
// =============================================================================

fn cancel(m: &SyntaxMatch, state: &ParserState) -> Result<Arc<dyn Effect>> {
    if !state.is_cancellable() {
        let event = state
            .current_events()
            .first()
            .map_or_else(|| "outside of an event".to_string(), |e| format!("in a {} event", e.name));
        return Err(Error::rejected(
            m.text.as_str(),
            format!("the event can't be cancelled {event}"),
        ));
    }
    Ok(Arc::new(Cancel {
        cancel: m.pattern_index == 0,
    }))
}

struct Cancel {
    cancel: bool,
}

impl Effect for Cancel {
    fn execute(&self, ctx: &dyn TriggerContext) -> Result<()> {
        let Some(event) = ctx.as_cancellable() else {
            return Err(Error::runtime(format!("{} can't be cancelled", ctx.name())));
        };
        event.set_cancelled(self.cancel);
        Ok(())
    }

    fn describe(&self) -> String {
        if self.cancel {
            "cancel the event".to_string()
        } else {
            "uncancel the event".to_string()
        }
    }
}

// =============================================================================
// Changes
// =============================================================================

/// `set`, `add`, `remove`, `delete` or `reset` a target.
///
/// The target expression's own changer is used when it has one; otherwise
/// the changer registered for the target's type.
struct Change {
    mode: ChangeMode,
    target: ExprRef,
    delta: Option<ExprRef>,
    types: TypesHandle,
}

impl Change {
    fn from_match(m: &SyntaxMatch, types: TypesHandle) -> Result<Self> {
        let (mode, target, delta) = match m.pattern_index {
            0 => (ChangeMode::Set, m.require(0)?, Some(m.require(1)?)),
            1 => (ChangeMode::Add, m.require(1)?, Some(m.require(0)?)),
            2 if m.numeric_mark() == 1 => (ChangeMode::RemoveAll, m.require(1)?, Some(m.require(0)?)),
            2 => (ChangeMode::Remove, m.require(1)?, Some(m.require(0)?)),
            3 => (ChangeMode::Delete, m.require(0)?, None),
            _ => (ChangeMode::Reset, m.require(0)?, None),
        };
        let change = Self {
            mode,
            target,
            delta,
            types,
        };

        let Some(accepted) = change.accepted() else {
            return Err(Error::rejected(
                m.text.as_str(),
                format!("{} can't be {}", change.target.describe(), past_tense(mode)),
            ));
        };
        if let Some(delta) = &change.delta {
            if !change.accepts_delta(&accepted, delta.return_type()) {
                return Err(Error::rejected(
                    m.text.as_str(),
                    format!(
                        "{} can't be {} with {}",
                        change.target.describe(),
                        past_tense(mode),
                        delta.return_type()
                    ),
                ));
            }
        }
        debug!(mode = %mode, target = %change.target.describe(), "bound change");
        Ok(change)
    }

    /// Delta types the target accepts for the mode, from its own changer
    /// or its type's.
    fn accepted(&self) -> Option<Vec<Arc<str>>> {
        self.target.accepts_change(self.mode).or_else(|| {
            let types = self.types.get()?;
            types
                .get(self.target.return_type())?
                .changer()?
                .accepts_change(self.mode)
        })
    }

    fn accepts_delta(&self, accepted: &[Arc<str>], delta_type: &str) -> bool {
        if accepted.is_empty() {
            return true;
        }
        accepted.iter().any(|t| {
            t.as_ref() == delta_type
                || self
                    .types
                    .get()
                    .is_some_and(|types| types.can_convert(delta_type, t))
        })
    }
}

impl Effect for Change {
    fn execute(&self, ctx: &dyn TriggerContext) -> Result<()> {
        let delta = match &self.delta {
            Some(delta) => delta.values(ctx)?,
            None => Vec::new(),
        };
        if self.target.accepts_change(self.mode).is_some() {
            return self.target.change(ctx, &delta, self.mode);
        }

        let changer = self
            .types
            .get()
            .and_then(|types| types.get(self.target.return_type()))
            .and_then(|t| t.changer().cloned());
        let Some(changer) = changer else {
            return Err(Error::new(ErrorKind::Unsupported(format!(
                "can't {} {}",
                self.mode,
                self.target.describe()
            ))));
        };
        let targets: Vec<Value> = self.target.values(ctx)?;
        changer.change(&targets, &delta, self.mode)
    }

    fn describe(&self) -> String {
        let target = self.target.describe();
        match (&self.delta, self.mode) {
            (Some(delta), ChangeMode::Set) => format!("set {target} to {}", delta.describe()),
            (Some(delta), ChangeMode::Add) => format!("add {} to {target}", delta.describe()),
            (Some(delta), mode) => format!("{mode} {} from {target}", delta.describe()),
            (None, mode) => format!("{mode} {target}"),
        }
    }
}

fn past_tense(mode: ChangeMode) -> &'static str {
    match mode {
        ChangeMode::Set => "set",
        ChangeMode::Add => "added to",
        ChangeMode::Remove | ChangeMode::RemoveAll => "removed from",
        ChangeMode::Delete => "deleted",
        ChangeMode::Reset => "reset",
    }
}
