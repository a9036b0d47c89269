//! Registration API.
//!
//! Types, converters and syntaxes are registered in explicit order, then
//! frozen into an [`Engine`]. Each `register_*` call compiles its patterns
//! immediately; a bad pattern fails only that call.

use std::sync::{Arc, OnceLock};

use quill_foundation::{Error, ErrorKind, Result, Value};
use quill_pattern::{Pattern, PatternCompiler};
use quill_types::{TypeInfo, TypeRegistry};
use tracing::{debug, info, warn};

use crate::ambiguity;
use crate::config::EngineConfig;
use crate::engine::Engine;
use crate::expression::{Arity, ContextGetter, ContextValue, ExprRef};
use crate::runtime::TriggerContext;
use crate::state::{EventInfo, ParserState};
use crate::syntax::{Factory, SyntaxInfo, SyntaxMatch, SyntaxRegistry};
use crate::trigger::{Effect, Event, Section};

/// The type registry of an engine that is still being registered.
///
/// Factories capture a handle so that, once [`Registration::finish`] has
/// run, they can reach type changers and serializers while parsing.
#[derive(Clone, Debug, Default)]
pub struct TypesHandle(Arc<OnceLock<Arc<TypeRegistry>>>);

impl TypesHandle {
    /// Returns the frozen registry, or `None` before `finish`.
    #[must_use]
    pub fn get(&self) -> Option<&Arc<TypeRegistry>> {
        self.0.get()
    }
}

/// Collects registrations before the engine is frozen.
pub struct Registration {
    types: TypeRegistry,
    syntaxes: SyntaxRegistry,
    config: EngineConfig,
    handle: TypesHandle,
    next_id: usize,
}

impl Default for Registration {
    fn default() -> Self {
        Self::new()
    }
}

impl Registration {
    /// Creates a registration with the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(EngineConfig::default())
    }

    /// Creates a registration with the given configuration.
    #[must_use]
    pub fn with_config(config: EngineConfig) -> Self {
        Self {
            types: TypeRegistry::new().with_max_hops(config.max_conversion_hops),
            syntaxes: SyntaxRegistry::new(),
            config,
            handle: TypesHandle::default(),
            next_id: 0,
        }
    }

    /// Returns the types registered so far.
    #[must_use]
    pub fn types(&self) -> &TypeRegistry {
        &self.types
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Returns a handle that resolves to the type registry once the
    /// engine is built.
    #[must_use]
    pub fn types_handle(&self) -> TypesHandle {
        self.handle.clone()
    }

    /// Registers a type.
    ///
    /// # Errors
    ///
    /// Returns `DuplicateType` if a surface form is taken, or `Unsupported`
    /// for a malformed name pattern.
    pub fn register_type(&mut self, info: TypeInfo) -> Result<()> {
        self.types.register(info)
    }

    /// Registers a converter between two registered types.
    ///
    /// # Errors
    ///
    /// Returns `UnknownType` if either type is not registered.
    pub fn register_converter(
        &mut self,
        from: &str,
        to: &str,
        convert: impl Fn(&Value) -> Option<Value> + Send + Sync + 'static,
    ) -> Result<()> {
        self.types.register_converter(from, to, convert)
    }

    /// Registers an expression syntax.
    ///
    /// The returned entry can be given a priority with
    /// [`SyntaxInfo::set_priority`].
    ///
    /// # Errors
    ///
    /// Returns `UnknownType` for an unregistered return type, or the
    /// `PatternCompile` error of the first bad pattern.
    pub fn register_expression(
        &mut self,
        patterns: &[&str],
        return_type: &str,
        arity: Arity,
        factory: impl Fn(&SyntaxMatch, &ParserState) -> Result<ExprRef> + Send + Sync + 'static,
    ) -> Result<&mut SyntaxInfo> {
        let return_type = self.canonical(return_type)?;
        self.add(
            patterns,
            Factory::Expression {
                factory: Arc::new(factory),
                return_type,
                arity,
                required_event: None,
            },
        )
    }

    /// Registers an expression that reads a value from the running
    /// trigger's context. It only applies inside triggers of `event`.
    ///
    /// # Errors
    ///
    /// Returns `UnknownType` for an unregistered return type, or the
    /// `PatternCompile` error of the first bad pattern.
    pub fn register_context_value(
        &mut self,
        event: &str,
        patterns: &[&str],
        return_type: &str,
        arity: Arity,
        getter: impl Fn(&dyn TriggerContext) -> Result<Vec<Value>> + Send + Sync + 'static,
    ) -> Result<&mut SyntaxInfo> {
        let return_type = self.canonical(return_type)?;
        let getter: ContextGetter = Arc::new(getter);
        let single = arity != Arity::Plural;
        let value_type = return_type.clone();
        let factory = move |m: &SyntaxMatch, _: &ParserState| -> Result<ExprRef> {
            Ok(Arc::new(ContextValue::new(
                m.text.clone(),
                value_type.clone(),
                single,
                getter.clone(),
            )))
        };
        self.add(
            patterns,
            Factory::Expression {
                factory: Arc::new(factory),
                return_type,
                arity,
                required_event: Some(event.into()),
            },
        )
    }

    /// Registers an effect syntax.
    ///
    /// # Errors
    ///
    /// Returns the `PatternCompile` error of the first bad pattern.
    pub fn register_effect(
        &mut self,
        patterns: &[&str],
        factory: impl Fn(&SyntaxMatch, &ParserState) -> Result<Arc<dyn Effect>> + Send + Sync + 'static,
    ) -> Result<&mut SyntaxInfo> {
        self.add(patterns, Factory::Effect(Arc::new(factory)))
    }

    /// Registers a section syntax.
    ///
    /// # Errors
    ///
    /// Returns the `PatternCompile` error of the first bad pattern.
    pub fn register_section(
        &mut self,
        patterns: &[&str],
        factory: impl Fn(&SyntaxMatch, &ParserState) -> Result<Arc<dyn Section>> + Send + Sync + 'static,
    ) -> Result<&mut SyntaxInfo> {
        self.add(patterns, Factory::Section(Arc::new(factory)))
    }

    /// Registers an event syntax for the contexts described by `info`.
    ///
    /// # Errors
    ///
    /// Returns the `PatternCompile` error of the first bad pattern.
    pub fn register_event(
        &mut self,
        info: EventInfo,
        patterns: &[&str],
        factory: impl Fn(&SyntaxMatch, &ParserState) -> Result<Arc<dyn Event>> + Send + Sync + 'static,
    ) -> Result<&mut SyntaxInfo> {
        self.add(
            patterns,
            Factory::Event {
                factory: Arc::new(factory),
                info,
            },
        )
    }

    /// Freezes the registrations into an engine.
    ///
    /// With `validate_on_finish`, runs the ambiguity pass and keeps its
    /// findings as [`Engine::warnings`].
    #[must_use]
    pub fn finish(mut self) -> Engine {
        self.syntaxes.sort();
        let types = Arc::new(self.types);
        // A fresh registration's handle is always unset
        let _ = self.handle.0.set(Arc::clone(&types));
        let mut engine = Engine {
            types,
            syntaxes: self.syntaxes,
            config: self.config,
            warnings: Vec::new(),
        };
        if engine.config.validate_on_finish {
            engine.warnings = ambiguity::validate(&engine);
            for warning in &engine.warnings {
                warn!(%warning, "ambiguous patterns");
            }
        }
        info!(
            types = engine.types.len(),
            syntaxes = engine.syntaxes.len(),
            warnings = engine.warnings.len(),
            "engine ready"
        );
        engine
    }

    fn canonical(&self, type_name: &str) -> Result<Arc<str>> {
        self.types
            .get(type_name)
            .map(|t| t.name().clone())
            .ok_or_else(|| Error::unknown_type(type_name))
    }

    fn compile(&self, patterns: &[&str]) -> Result<Vec<Pattern>> {
        if patterns.is_empty() {
            return Err(Error::new(ErrorKind::Unsupported(
                "a syntax needs at least one pattern".to_string(),
            )));
        }
        let compiler = PatternCompiler::new(&self.types);
        patterns.iter().map(|p| compiler.compile(p)).collect()
    }

    fn add(&mut self, patterns: &[&str], factory: Factory) -> Result<&mut SyntaxInfo> {
        let compiled = self.compile(patterns)?;
        let id = self.next_id;
        self.next_id += 1;
        let category = factory.category();
        debug!(%category, id, pattern = patterns[0], "registered syntax");
        Ok(self.syntaxes.add(SyntaxInfo::new(id, compiled, factory)))
    }
}
