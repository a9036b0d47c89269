//! Configuration for the parsing engine.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use quill_types::DEFAULT_MAX_HOPS;

/// Configuration for pattern resolution and script loading.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct EngineConfig {
    /// Maximum number of converter edges composed for one conversion.
    pub max_conversion_hops: usize,

    /// Maximum nesting of slot resolutions within one statement.
    pub max_depth: usize,

    /// Whether plural slots accept `a, b and c` list literals.
    pub list_literals: bool,

    /// Whether equal-priority full matches are reported as warnings.
    pub detect_ambiguity: bool,

    /// Whether `Registration::finish` runs the pattern ambiguity pass.
    pub validate_on_finish: bool,

    /// Whether `Engine::load_scripts` compiles scripts in parallel.
    pub parallel_loading: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_conversion_hops: DEFAULT_MAX_HOPS,
            max_depth: 32,
            list_literals: true,
            detect_ambiguity: false,
            validate_on_finish: false,
            parallel_loading: true,
        }
    }
}

impl EngineConfig {
    /// Creates a configuration that reports every ambiguity it can find.
    #[must_use]
    pub fn strict() -> Self {
        Self {
            detect_ambiguity: true,
            validate_on_finish: true,
            ..Self::default()
        }
    }

    /// Creates a configuration for debugging: strict checks, sequential
    /// loading so log output follows script order.
    #[must_use]
    pub fn debug() -> Self {
        Self {
            max_depth: 64,
            detect_ambiguity: true,
            validate_on_finish: true,
            parallel_loading: false,
            ..Self::default()
        }
    }

    /// Builder method to set the conversion hop bound.
    #[must_use]
    pub fn with_max_conversion_hops(mut self, hops: usize) -> Self {
        self.max_conversion_hops = hops;
        self
    }

    /// Builder method to set the resolution depth bound.
    #[must_use]
    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }

    /// Builder method to enable/disable list literals.
    #[must_use]
    pub fn with_list_literals(mut self, enabled: bool) -> Self {
        self.list_literals = enabled;
        self
    }

    /// Builder method to enable/disable ambiguity warnings during parsing.
    #[must_use]
    pub fn with_detect_ambiguity(mut self, enabled: bool) -> Self {
        self.detect_ambiguity = enabled;
        self
    }

    /// Builder method to enable/disable the registration-time ambiguity pass.
    #[must_use]
    pub fn with_validate_on_finish(mut self, enabled: bool) -> Self {
        self.validate_on_finish = enabled;
        self
    }

    /// Builder method to enable/disable parallel script loading.
    #[must_use]
    pub fn with_parallel_loading(mut self, enabled: bool) -> Self {
        self.parallel_loading = enabled;
        self
    }
}
