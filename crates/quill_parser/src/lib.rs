//! Matcher, resolver and syntax registry for Quill.
//!
//! This crate provides:
//! - [`Registration`] - Explicit, ordered registration of types and syntaxes
//! - [`Engine`] - The frozen registries, used to parse and compile scripts
//! - [`match_full`] / [`match_element`] - The backtracking pattern matcher
//! - [`Resolver`] - Fills typed slots with literals or nested expressions
//! - [`Expression`], [`Effect`], [`Section`], [`Event`] - Bound nodes
//! - [`Script`] / [`Trigger`] - Compiled scripts and their triggers
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use quill_foundation::{Value, ValueKind};
//! use quill_parser::{Arity, Expression, Literal, ParserState, Registration};
//! use quill_types::TypeInfo;
//!
//! let mut reg = Registration::new();
//! reg.register_type(TypeInfo::new("number", ValueKind::Float)).unwrap();
//! reg.register_expression(&["the answer"], "number", Arity::Single, |m, _| {
//!     Ok(Arc::new(Literal::new("number", vec![Value::Float(42.0)], m.text.clone())))
//! })
//! .unwrap();
//!
//! let engine = reg.finish();
//! let expr = engine
//!     .parse_expression("The Answer", "number", &ParserState::new())
//!     .unwrap();
//! assert_eq!(expr.return_type(), "number");
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

mod ambiguity;
pub mod config;
pub mod engine;
pub mod expression;
pub mod matcher;
pub mod registration;
pub mod resolver;
pub mod runtime;
pub mod script;
pub mod state;
pub mod syntax;
pub mod trigger;

pub use config::EngineConfig;
pub use engine::Engine;
pub use expression::{
    Arity, ContextGetter, ContextValue, Converted, ExprRef, Expression, ExpressionList, Literal,
};
pub use matcher::{MatchContext, MatchState, SlotResolver, match_element, match_full};
pub use registration::{Registration, TypesHandle};
pub use resolver::Resolver;
pub use runtime::{Cancellable, TriggerContext, downcast};
pub use script::{LoadReport, Script, ScriptNode, ScriptSource};
pub use state::{CommandParameter, EventInfo, ParserState};
pub use syntax::{
    EffectFactory, EventFactory, ExpressionFactory, Factory, RegexMatch, SectionFactory,
    SyntaxCategory, SyntaxInfo, SyntaxMatch, SyntaxRegistry,
};
pub use trigger::{Body, ContextEvent, Effect, Event, Section, Statement, Trigger};
