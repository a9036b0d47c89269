//! Syntax registry.
//!
//! Holds, per category, the registered patterns and the factories that turn
//! a successful match into a node.

use std::fmt;
use std::sync::Arc;

use quill_foundation::{Error, ErrorKind, Result};
use quill_pattern::{Mark, Pattern};

use crate::expression::{Arity, ExprRef};
use crate::state::{EventInfo, ParserState};
use crate::trigger::{Effect, Event, Section};

/// Syntax categories.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SyntaxCategory {
    /// Typed expressions filling slots.
    Expression,
    /// Statements that do something.
    Effect,
    /// Statements with a nested body.
    Section,
    /// Trigger headers.
    Event,
}

impl fmt::Display for SyntaxCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Expression => "expression",
            Self::Effect => "effect",
            Self::Section => "section",
            Self::Event => "event",
        };
        f.write_str(name)
    }
}

/// Text captured by a regex group.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RegexMatch {
    /// The whole matched text.
    pub text: String,
    /// Capture groups, `None` where a group did not participate.
    pub groups: Vec<Option<String>>,
}

/// The result of a successful match, handed to the syntax factory.
#[derive(Clone, Debug)]
pub struct SyntaxMatch {
    /// Index of the matched pattern within its registration.
    pub pattern_index: usize,
    /// The matched text.
    pub text: String,
    /// Bound slot expressions in match order; `None` for absent optional slots.
    pub expressions: Vec<Option<ExprRef>>,
    /// Recorded marks, in mark order.
    pub marks: Vec<Mark>,
    /// Regex captures in match order.
    pub regex_matches: Vec<RegexMatch>,
}

impl SyntaxMatch {
    /// Returns the integer view of the recorded marks: all numeric marks XORed.
    #[must_use]
    pub fn numeric_mark(&self) -> i64 {
        self.marks
            .iter()
            .filter_map(Mark::as_int)
            .fold(0, |acc, m| acc ^ m)
    }

    /// Returns true if the mark was recorded.
    #[must_use]
    pub fn has_mark(&self, mark: &Mark) -> bool {
        self.marks.contains(mark)
    }

    /// Returns true if a named mark was recorded.
    #[must_use]
    pub fn has_named_mark(&self, name: &str) -> bool {
        self.marks.iter().any(|m| m.as_name() == Some(name))
    }

    /// Returns the slot expression at `index`, if present.
    #[must_use]
    pub fn expression(&self, index: usize) -> Option<&ExprRef> {
        self.expressions.get(index).and_then(Option::as_ref)
    }

    /// Returns the slot expression at `index`.
    ///
    /// # Errors
    ///
    /// Returns an `Internal` error if the slot is absent.
    pub fn require(&self, index: usize) -> Result<ExprRef> {
        self.expression(index).cloned().ok_or_else(|| {
            Error::new(ErrorKind::Internal(format!(
                "slot {index} missing in match of {:?}",
                self.text
            )))
        })
    }
}

/// Builds an expression from a match.
pub type ExpressionFactory = Arc<dyn Fn(&SyntaxMatch, &ParserState) -> Result<ExprRef> + Send + Sync>;
/// Builds an effect from a match.
pub type EffectFactory = Arc<dyn Fn(&SyntaxMatch, &ParserState) -> Result<Arc<dyn Effect>> + Send + Sync>;
/// Builds a section from a match.
pub type SectionFactory = Arc<dyn Fn(&SyntaxMatch, &ParserState) -> Result<Arc<dyn Section>> + Send + Sync>;
/// Builds an event from a match.
pub type EventFactory = Arc<dyn Fn(&SyntaxMatch, &ParserState) -> Result<Arc<dyn Event>> + Send + Sync>;

/// The node factory of a registration, with its category-specific data.
#[derive(Clone)]
pub enum Factory {
    /// Expression syntax.
    Expression {
        /// The factory.
        factory: ExpressionFactory,
        /// Canonical name of the declared return type.
        return_type: Arc<str>,
        /// Declared arity.
        arity: Arity,
        /// Event that must be open for this syntax to apply (context values).
        required_event: Option<Arc<str>>,
    },
    /// Effect syntax.
    Effect(EffectFactory),
    /// Section syntax.
    Section(SectionFactory),
    /// Event syntax.
    Event {
        /// The factory.
        factory: EventFactory,
        /// The event the trigger binds to.
        info: EventInfo,
    },
}

impl Factory {
    /// Returns the category this factory belongs to.
    #[must_use]
    pub const fn category(&self) -> SyntaxCategory {
        match self {
            Self::Expression { .. } => SyntaxCategory::Expression,
            Self::Effect(_) => SyntaxCategory::Effect,
            Self::Section(_) => SyntaxCategory::Section,
            Self::Event { .. } => SyntaxCategory::Event,
        }
    }
}

/// A syntax registration entry.
#[derive(Clone)]
pub struct SyntaxInfo {
    id: usize,
    patterns: Vec<Pattern>,
    keywords: Vec<Vec<String>>,
    priority: i32,
    factory: Factory,
}

impl SyntaxInfo {
    /// Creates an entry. `id` is the registration order.
    #[must_use]
    pub fn new(id: usize, patterns: Vec<Pattern>, factory: Factory) -> Self {
        let keywords = patterns.iter().map(Pattern::keywords).collect();
        Self {
            id,
            patterns,
            keywords,
            priority: 0,
            factory,
        }
    }

    /// Sets the tie-break priority; higher wins.
    pub fn set_priority(&mut self, priority: i32) -> &mut Self {
        self.priority = priority;
        self
    }

    /// Returns the registration order.
    #[must_use]
    pub fn id(&self) -> usize {
        self.id
    }

    /// Returns the source of the first pattern, used to name the syntax.
    #[must_use]
    pub fn name(&self) -> &str {
        self.patterns.first().map_or("", Pattern::source)
    }

    /// Returns the compiled patterns.
    #[must_use]
    pub fn patterns(&self) -> &[Pattern] {
        &self.patterns
    }

    /// Returns the priority.
    #[must_use]
    pub fn priority(&self) -> i32 {
        self.priority
    }

    /// Returns the factory.
    #[must_use]
    pub fn factory(&self) -> &Factory {
        &self.factory
    }

    /// Returns the category.
    #[must_use]
    pub fn category(&self) -> SyntaxCategory {
        self.factory.category()
    }

    /// Returns true if the lowercased text contains every keyword of the pattern.
    #[must_use]
    pub fn keywords_present(&self, pattern_index: usize, lowercase_text: &str) -> bool {
        self.keywords
            .get(pattern_index)
            .is_none_or(|words| words.iter().all(|w| lowercase_text.contains(w.as_str())))
    }
}

impl fmt::Debug for SyntaxInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SyntaxInfo")
            .field("id", &self.id)
            .field("category", &self.category())
            .field("patterns", &self.patterns)
            .field("priority", &self.priority)
            .finish_non_exhaustive()
    }
}

/// All registered syntaxes, ordered for matching.
///
/// Within a category, candidates are tried by priority (descending), then
/// registration order (ascending); within a registration, patterns are
/// tried in declaration order.
#[derive(Clone, Debug, Default)]
pub struct SyntaxRegistry {
    expressions: Vec<SyntaxInfo>,
    effects: Vec<SyntaxInfo>,
    sections: Vec<SyntaxInfo>,
    events: Vec<SyntaxInfo>,
}

impl SyntaxRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an entry and returns it for further configuration.
    pub fn add(&mut self, info: SyntaxInfo) -> &mut SyntaxInfo {
        let list = self.list_mut(info.category());
        list.push(info);
        let last = list.len() - 1;
        &mut list[last]
    }

    /// Orders every category for matching.
    pub fn sort(&mut self) {
        for list in [
            &mut self.expressions,
            &mut self.effects,
            &mut self.sections,
            &mut self.events,
        ] {
            list.sort_by(|a, b| b.priority.cmp(&a.priority).then(a.id.cmp(&b.id)));
        }
    }

    /// Returns the entries of a category in matching order.
    #[must_use]
    pub fn get(&self, category: SyntaxCategory) -> &[SyntaxInfo] {
        match category {
            SyntaxCategory::Expression => &self.expressions,
            SyntaxCategory::Effect => &self.effects,
            SyntaxCategory::Section => &self.sections,
            SyntaxCategory::Event => &self.events,
        }
    }

    /// Returns the total number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.expressions.len() + self.effects.len() + self.sections.len() + self.events.len()
    }

    /// Returns true if nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn list_mut(&mut self, category: SyntaxCategory) -> &mut Vec<SyntaxInfo> {
        match category {
            SyntaxCategory::Expression => &mut self.expressions,
            SyntaxCategory::Effect => &mut self.effects,
            SyntaxCategory::Section => &mut self.sections,
            SyntaxCategory::Event => &mut self.events,
        }
    }
}
