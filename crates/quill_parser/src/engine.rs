//! The frozen parsing engine.

use std::sync::Arc;

use quill_foundation::{Error, Result};
use quill_pattern::{ExpressionElement, TypeLookup};
use quill_types::TypeRegistry;
use rayon::prelude::*;
use tracing::{info, warn};

use crate::config::EngineConfig;
use crate::expression::ExprRef;
use crate::matcher::SlotResolver;
use crate::resolver::Resolver;
use crate::script::{self, LoadReport, ScriptSource};
use crate::state::{EventInfo, ParserState};
use crate::syntax::SyntaxRegistry;
use crate::trigger::{Effect, Event, Section};

/// Registered types and syntaxes, read-only after
/// [`Registration::finish`](crate::Registration::finish).
///
/// The engine is `Send + Sync`; scripts can be compiled against it from
/// several threads at once.
#[derive(Debug)]
pub struct Engine {
    pub(crate) types: Arc<TypeRegistry>,
    pub(crate) syntaxes: SyntaxRegistry,
    pub(crate) config: EngineConfig,
    pub(crate) warnings: Vec<Error>,
}

impl Engine {
    /// Returns the type registry.
    #[must_use]
    pub fn types(&self) -> &Arc<TypeRegistry> {
        &self.types
    }

    /// Returns the syntax registry.
    #[must_use]
    pub fn syntaxes(&self) -> &SyntaxRegistry {
        &self.syntaxes
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Returns the warnings of the registration-time ambiguity pass.
    #[must_use]
    pub fn warnings(&self) -> &[Error] {
        &self.warnings
    }

    /// Parses `text` as an expression of the type named by `type_surface`
    /// (singular or plural form).
    ///
    /// # Errors
    ///
    /// Returns `UnknownType` for an unregistered type, `NoMatch` or
    /// `NoConversion` if the text cannot be understood as that type.
    pub fn parse_expression(&self, text: &str, type_surface: &str, state: &ParserState) -> Result<ExprRef> {
        let Some(type_ref) = self.types.lookup_type(type_surface) else {
            return Err(Error::unknown_type(type_surface));
        };
        let slot = ExpressionElement {
            types: vec![type_ref],
            optional: false,
            literal_only: false,
            mark: None,
        };
        let resolver = Resolver::new(self, state);
        let resolved = resolver.resolve_slot(text, &slot);
        log_warnings(resolver.take_warnings());
        resolved?.ok_or_else(|| Error::no_match(slot.describe(), text))
    }

    /// Parses an effect line.
    ///
    /// # Errors
    ///
    /// Returns `NoMatch` if no effect matches, or the first factory rejection.
    pub fn parse_effect(&self, text: &str, state: &ParserState) -> Result<Arc<dyn Effect>> {
        let resolver = Resolver::new(self, state);
        let parsed = resolver.parse_effect(text);
        log_warnings(resolver.take_warnings());
        parsed
    }

    /// Parses a section header.
    ///
    /// # Errors
    ///
    /// Returns `NoMatch` if no section matches, or the first factory rejection.
    pub fn parse_section(&self, text: &str, state: &ParserState) -> Result<Arc<dyn Section>> {
        let resolver = Resolver::new(self, state);
        let parsed = resolver.parse_section(text);
        log_warnings(resolver.take_warnings());
        parsed.map(|(section, _)| section)
    }

    /// Parses a trigger header (without its trailing colon).
    ///
    /// # Errors
    ///
    /// Returns `NoMatch` if no event matches, or the first factory rejection.
    pub fn parse_event(&self, text: &str) -> Result<(Arc<dyn Event>, EventInfo)> {
        let state = ParserState::new();
        let resolver = Resolver::new(self, &state);
        let parsed = resolver.parse_event(text);
        log_warnings(resolver.take_warnings());
        parsed
    }

    /// Compiles one script, collecting every diagnostic.
    #[must_use]
    pub fn compile_script(&self, source: &ScriptSource) -> LoadReport {
        script::compile(self, source)
    }

    /// Compiles independent scripts, in parallel unless disabled by the
    /// configuration. Reports are returned in input order.
    #[must_use]
    pub fn load_scripts(&self, sources: &[ScriptSource]) -> Vec<LoadReport> {
        let reports: Vec<LoadReport> = if self.config.parallel_loading {
            sources.par_iter().map(|s| self.compile_script(s)).collect()
        } else {
            sources.iter().map(|s| self.compile_script(s)).collect()
        };
        let errors: usize = reports.iter().map(|r| r.errors.len()).sum();
        let triggers: usize = reports.iter().map(|r| r.script.triggers().len()).sum();
        info!(scripts = reports.len(), triggers, errors, "loaded scripts");
        reports
    }
}

fn log_warnings(warnings: Vec<Error>) {
    for warning in warnings {
        warn!(%warning, "parse warning");
    }
}
