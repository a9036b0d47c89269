//! Command triggers and their arguments.
//!
//! A command header declares typed parameters, e.g.
//! `command /give <number> [<string>]`. Inside the trigger, arguments are
//! read by position (`argument 1`, `the 2nd argument`, `the last argument`)
//! or by type (`the number argument`, `the string-argument 2`).

use std::any::Any;
use std::cell::RefCell;
use std::sync::Arc;

use quill_foundation::{Error, ErrorKind, Result, Value};
use quill_parser::{
    Arity, CommandParameter, Event, EventInfo, Expression, ParserState, Registration,
    SyntaxMatch, TriggerContext, TypesHandle, downcast,
};
use quill_types::TypeRegistry;
use tracing::{debug, info};

/// Name of the event fired when a script command runs.
pub const COMMAND: &str = "command";

/// Context of a command run: the command name, one list of values per
/// declared parameter, and everything the trigger printed.
#[derive(Debug, Default)]
pub struct CommandContext {
    command: String,
    arguments: Vec<Vec<Value>>,
    output: RefCell<Vec<String>>,
}

impl CommandContext {
    /// Creates a context for `command` with already-parsed arguments.
    ///
    /// An omitted optional argument is an empty list.
    #[must_use]
    pub fn new(command: impl Into<String>, arguments: Vec<Vec<Value>>) -> Self {
        Self {
            command: command.into(),
            arguments,
            output: RefCell::new(Vec::new()),
        }
    }

    /// Returns the name of the command that ran, without its slash.
    #[must_use]
    pub fn command(&self) -> &str {
        &self.command
    }

    /// Returns the values given for the parameter at `index`.
    #[must_use]
    pub fn argument(&self, index: usize) -> &[Value] {
        self.arguments.get(index).map_or(&[], Vec::as_slice)
    }

    /// Returns the messages emitted so far.
    #[must_use]
    pub fn output(&self) -> Vec<String> {
        self.output.borrow().clone()
    }
}

impl TriggerContext for CommandContext {
    fn name(&self) -> &str {
        COMMAND
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn emit(&self, message: &str) {
        info!(context = COMMAND, command = %self.command, "{message}");
        self.output.borrow_mut().push(message.to_string());
    }
}

/// Registers the command event and the argument expressions.
///
/// # Errors
///
/// Returns an error if the `object` type is not registered yet.
pub fn register(reg: &mut Registration) -> Result<()> {
    let types = reg.types_handle();
    reg.register_event(
        EventInfo::new(COMMAND),
        &["command /<[\\w-]+>[ <.+>]"],
        move |m, _| Ok(Arc::new(CommandEvent::from_match(m, &types)?)),
    )?;

    let types = reg.types_handle();
    reg.register_expression(
        &[
            "[the] last arg[ument]",
            "[the] arg[ument](-| )<(\\d+)>",
            "[the] <(\\d*1)st|(\\d*2)nd|(\\d*3)rd|(\\d*[04-9])th> arg[ument]",
            "[the] <[A-Za-z]+>( |-)arg[ument][( |-)<(\\d+)>]",
        ],
        "object",
        Arity::Either,
        move |m, state| Ok(Arc::new(Argument::from_match(m, state, &types)?)),
    )?;
    Ok(())
}

// =============================================================================
// Event
// =============================================================================

/// A trigger bound to one script command.
#[derive(Debug)]
pub struct CommandEvent {
    name: String,
    parameters: Vec<CommandParameter>,
}

impl CommandEvent {
    fn from_match(m: &SyntaxMatch, types: &TypesHandle) -> Result<Self> {
        let Some(name) = m.regex_matches.first() else {
            return Err(Error::rejected(m.text.as_str(), "missing command name"));
        };
        let Some(types) = types.get() else {
            return Err(Error::new(ErrorKind::Internal(
                "command parsed before the engine was built".to_string(),
            )));
        };
        let parameters = match m.regex_matches.get(1) {
            Some(list) => parse_parameters(&m.text, &list.text, types)?,
            None => Vec::new(),
        };
        debug!(command = %name.text, parameters = parameters.len(), "bound command");
        Ok(Self {
            name: name.text.to_lowercase(),
            parameters,
        })
    }

    /// Returns the command name, without its slash.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl Event for CommandEvent {
    fn check(&self, ctx: &dyn TriggerContext) -> bool {
        downcast::<CommandContext>(ctx).is_some_and(|c| c.command.eq_ignore_ascii_case(&self.name))
    }

    fn describe(&self) -> String {
        format!("command /{}", self.name)
    }

    fn parameters(&self) -> &[CommandParameter] {
        &self.parameters
    }
}

/// Parses a parameter list such as `<number> [<strings>]`.
///
/// Every parameter type needs a literal parser, and only the last
/// parameter may be plural.
fn parse_parameters(header: &str, list: &str, types: &TypeRegistry) -> Result<Vec<CommandParameter>> {
    let mut parameters: Vec<CommandParameter> = Vec::new();
    for token in list.split_whitespace() {
        let (inner, optional) = match token.strip_prefix('[').and_then(|t| t.strip_suffix(']')) {
            Some(inner) => (inner, true),
            None => (token, false),
        };
        let Some(surface) = inner.strip_prefix('<').and_then(|t| t.strip_suffix('>')) else {
            return Err(Error::rejected(header, format!("malformed parameter '{token}'")));
        };
        let Some((ty, plural)) = types.lookup_surface(surface) else {
            return Err(Error::rejected(header, format!("unknown parameter type '{surface}'")));
        };
        if !ty.has_parser() {
            return Err(Error::rejected(
                header,
                format!("{} parameters can't be parsed from input", ty.name()),
            ));
        }
        if parameters.last().is_some_and(|p| p.plural) {
            return Err(Error::rejected(header, "only the last parameter may be plural"));
        }
        parameters.push(
            CommandParameter::new(ty.name().clone())
                .with_plural(plural)
                .with_optional(optional),
        );
    }
    Ok(parameters)
}

// =============================================================================
// Arguments
// =============================================================================

/// The value of one declared parameter.
///
/// Bound at parse time to a parameter index, so it takes that parameter's
/// type and plurality.
struct Argument {
    index: usize,
    parameter: CommandParameter,
    text: String,
}

impl Argument {
    fn from_match(m: &SyntaxMatch, state: &ParserState, types: &TypesHandle) -> Result<Self> {
        let reject = |reason: String| Error::rejected(m.text.as_str(), reason);
        if !state.has_event(COMMAND) {
            return Err(reject("arguments only exist inside a command".to_string()));
        }
        let parameters = state.parameters();
        if parameters.is_empty() {
            return Err(reject("the command declares no parameters".to_string()));
        }

        let index = match m.pattern_index {
            0 => parameters.len() - 1,
            1 | 2 => {
                let Some(position) = captured_number(m, 0).filter(|&n| n > 0) else {
                    return Err(reject("invalid argument position".to_string()));
                };
                if position > parameters.len() {
                    return Err(reject(format!(
                        "the command has {} parameter(s), not {position}",
                        parameters.len()
                    )));
                }
                position - 1
            }
            _ => {
                let surface = m.regex_matches.first().map_or("", |r| r.text.as_str());
                let Some(ty) = types.get().and_then(|types| types.get(surface)) else {
                    return Err(reject(format!("unknown type '{surface}'")));
                };
                let nth = match m.regex_matches.get(1) {
                    Some(_) => captured_number(m, 1).filter(|&n| n > 0),
                    None => Some(1),
                };
                let Some(nth) = nth else {
                    return Err(reject("invalid argument position".to_string()));
                };
                let found = parameters
                    .iter()
                    .enumerate()
                    .filter(|(_, p)| p.type_name == *ty.name())
                    .nth(nth - 1);
                let Some((index, _)) = found else {
                    return Err(reject(format!("the command has no {} parameter {nth}", ty.name())));
                };
                index
            }
        };
        Ok(Self {
            index,
            parameter: parameters[index].clone(),
            text: m.text.clone(),
        })
    }
}

impl Expression for Argument {
    fn return_type(&self) -> &str {
        &self.parameter.type_name
    }

    fn is_single(&self) -> bool {
        !self.parameter.plural
    }

    fn values(&self, ctx: &dyn TriggerContext) -> Result<Vec<Value>> {
        Ok(downcast::<CommandContext>(ctx)
            .map(|command| command.argument(self.index).to_vec())
            .unwrap_or_default())
    }

    fn describe(&self) -> String {
        self.text.clone()
    }
}

/// Parses the first group captured by the regex match at `at`.
fn captured_number(m: &SyntaxMatch, at: usize) -> Option<usize> {
    m.regex_matches.get(at)?.groups.iter().flatten().next()?.parse().ok()
}
