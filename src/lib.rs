//! Quill - Free-text syntax engine
//!
//! This crate re-exports all layers of the Quill system for convenient access.
//! For detailed documentation, see the individual layer crates.
//!
//! # Architecture
//!
//! ```text
//! Layer 3: quill_stdlib     Standard types, expressions, effects, sections, events
//! Layer 2: quill_parser     Matcher, resolver, syntax registry, script loading
//! Layer 1: quill_types      Type registry, converters, changers
//!          quill_pattern    Pattern compiler and pattern tree
//! Layer 0: quill_foundation Core types (Value, ValueKind, Error)
//! ```

use std::sync::Once;

use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt;
use tracing_subscriber::prelude::*;

pub use quill_foundation as foundation;
pub use quill_parser as parser;
pub use quill_pattern as pattern;
pub use quill_stdlib as stdlib;
pub use quill_types as types;

static TRACING: Once = Once::new();

/// Installs a formatted `tracing` subscriber filtered by `RUST_LOG`.
///
/// Does nothing when `RUST_LOG` is unset or a global subscriber is already
/// installed; safe to call more than once.
pub fn init_tracing() {
    if std::env::var_os("RUST_LOG").is_none() {
        return;
    }
    TRACING.call_once(|| {
        let _ = tracing_subscriber::registry()
            .with(fmt::layer().with_target(true))
            .with(EnvFilter::from_default_env())
            .try_init();
    });
}
