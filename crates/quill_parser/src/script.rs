//! Script compilation.
//!
//! The host hands over an indentation tree per script; this module turns
//! it into triggers. A line that cannot be understood is reported and
//! skipped, everything else still loads.

use quill_foundation::{Error, ErrorContext, Result};
use tracing::{instrument, warn};

use crate::engine::Engine;
use crate::resolver::Resolver;
use crate::runtime::TriggerContext;
use crate::state::ParserState;
use crate::trigger::{Body, Statement, Trigger};

/// One logical line with the lines indented below it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScriptNode {
    /// 1-based source line.
    pub line: usize,
    /// The line text, without indentation.
    pub text: String,
    /// Nested lines.
    pub children: Vec<ScriptNode>,
}

impl ScriptNode {
    /// Creates a node without children.
    #[must_use]
    pub fn new(line: usize, text: impl Into<String>) -> Self {
        Self {
            line,
            text: text.into(),
            children: Vec::new(),
        }
    }

    /// Builder method to set the nested lines.
    #[must_use]
    pub fn with_children(mut self, children: Vec<ScriptNode>) -> Self {
        self.children = children;
        self
    }
}

/// The parsed indentation tree of one script file.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScriptSource {
    /// Script name used in diagnostics.
    pub name: String,
    /// Top-level nodes; each must be a trigger header.
    pub nodes: Vec<ScriptNode>,
}

impl ScriptSource {
    /// Creates a script source.
    #[must_use]
    pub fn new(name: impl Into<String>, nodes: Vec<ScriptNode>) -> Self {
        Self {
            name: name.into(),
            nodes,
        }
    }
}

/// A compiled script.
#[derive(Clone, Debug)]
pub struct Script {
    name: String,
    triggers: Vec<Trigger>,
}

impl Script {
    /// Returns the script name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the compiled triggers in source order.
    #[must_use]
    pub fn triggers(&self) -> &[Trigger] {
        &self.triggers
    }

    /// Runs every trigger whose event accepts the context.
    ///
    /// Returns how many triggers ran.
    ///
    /// # Errors
    ///
    /// Returns the first runtime error, tagged with the script name.
    pub fn run(&self, ctx: &dyn TriggerContext) -> Result<usize> {
        let mut ran = 0;
        for trigger in &self.triggers {
            let executed = trigger.execute(ctx).map_err(|mut e| {
                let context = e.context.take().unwrap_or_default().with_script(self.name.as_str());
                e.with_context(context)
            })?;
            if executed {
                ran += 1;
            }
        }
        Ok(ran)
    }
}

/// The outcome of compiling one script.
#[derive(Debug)]
pub struct LoadReport {
    /// Everything that compiled.
    pub script: Script,
    /// Lines that were skipped, with script and line attached.
    pub errors: Vec<Error>,
    /// Ambiguity warnings, with script and line attached.
    pub warnings: Vec<Error>,
}

impl LoadReport {
    /// Returns true if nothing was skipped.
    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }
}

#[instrument(level = "debug", skip_all, fields(script = %source.name))]
pub(crate) fn compile(engine: &Engine, source: &ScriptSource) -> LoadReport {
    let mut loader = Loader {
        engine,
        script: &source.name,
        errors: Vec::new(),
        warnings: Vec::new(),
    };
    let triggers = source
        .nodes
        .iter()
        .filter_map(|node| loader.trigger(node))
        .collect();
    LoadReport {
        script: Script {
            name: source.name.clone(),
            triggers,
        },
        errors: loader.errors,
        warnings: loader.warnings,
    }
}

struct Loader<'e> {
    engine: &'e Engine,
    script: &'e str,
    errors: Vec<Error>,
    warnings: Vec<Error>,
}

impl Loader<'_> {
    fn trigger(&mut self, node: &ScriptNode) -> Option<Trigger> {
        let text = node.text.trim();
        let Some(header) = text.strip_suffix(':') else {
            self.fail(node.line, Error::no_match("trigger header", text));
            return None;
        };
        if node.children.is_empty() {
            self.fail(node.line, Error::rejected(header, "trigger has no statements"));
            return None;
        }

        let state = ParserState::new();
        let resolver = Resolver::new(self.engine, &state);
        let parsed = resolver.parse_event(header);
        self.note(node.line, resolver.take_warnings());
        let (event, info) = match parsed {
            Ok(parsed) => parsed,
            Err(err) => {
                self.fail(node.line, err);
                return None;
            }
        };

        let mut state = ParserState::for_event(info.clone()).with_parameters(event.parameters().to_vec());
        let body = self.body(&node.children, &mut state);
        Some(Trigger::new(event, info.name, body, node.line))
    }

    fn body(&mut self, nodes: &[ScriptNode], state: &mut ParserState) -> Body {
        let statements = nodes
            .iter()
            .filter_map(|node| self.statement(node, state))
            .collect();
        Body::new(statements)
    }

    fn statement(&mut self, node: &ScriptNode, state: &mut ParserState) -> Option<Statement> {
        let text = node.text.trim();
        if node.children.is_empty() {
            let resolver = Resolver::new(self.engine, state);
            let parsed = resolver.parse_effect(text);
            self.note(node.line, resolver.take_warnings());
            return match parsed {
                Ok(effect) => Some(Statement::Effect {
                    effect,
                    line: node.line,
                }),
                Err(err) => {
                    self.fail(node.line, err);
                    None
                }
            };
        }

        let header = text.strip_suffix(':').unwrap_or(text);
        let (parsed, warnings) = {
            let resolver = Resolver::new(self.engine, state);
            (resolver.parse_section(header), resolver.take_warnings())
        };
        self.note(node.line, warnings);
        let (section, name) = match parsed {
            Ok(parsed) => parsed,
            Err(err) => {
                self.fail(node.line, err);
                return None;
            }
        };

        state.enter_section(name);
        let body = self.body(&node.children, state);
        state.exit_section();
        Some(Statement::Section {
            section,
            body,
            line: node.line,
        })
    }

    fn locate(&self, err: Error, line: usize) -> Error {
        err.with_context(ErrorContext::new().with_script(self.script).with_line(line))
    }

    fn fail(&mut self, line: usize, err: Error) {
        let err = self.locate(err, line);
        warn!(script = self.script, line, error = %err, "skipping line");
        self.errors.push(err);
    }

    fn note(&mut self, line: usize, warnings: Vec<Error>) {
        for warning in warnings {
            let warning = self.locate(warning, line);
            warn!(script = self.script, line, %warning, "ambiguous line");
            self.warnings.push(warning);
        }
    }
}
