//! Pattern AST.
//!
//! A compiled pattern is a tree of [`PatternElement`]s. The compiler keeps
//! two shape invariants: a [`PatternElement::Compound`] never contains
//! another compound (children are spliced in), and a
//! [`PatternElement::Choice`] always has at least two alternatives.

use std::fmt;
use std::sync::Arc;

use regex::Regex;

/// A tag recorded when a marked alternative, optional group or slot matches.
///
/// Factories usually dispatch on the integer view (see [`Mark::as_int`]);
/// named marks exist for patterns like `:(display|custom|user) name`.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Mark {
    /// Integer mark, written `N:`.
    Numeric(i64),
    /// Named mark, written `name:` or produced by `:(a|b)`.
    Named(Arc<str>),
}

impl Mark {
    /// Creates a named mark.
    #[must_use]
    pub fn named(name: impl Into<Arc<str>>) -> Self {
        Self::Named(name.into())
    }

    /// Returns the integer view of this mark.
    #[must_use]
    pub const fn as_int(&self) -> Option<i64> {
        match self {
            Self::Numeric(n) => Some(*n),
            Self::Named(_) => None,
        }
    }

    /// Returns the name of a named mark.
    #[must_use]
    pub fn as_name(&self) -> Option<&str> {
        match self {
            Self::Numeric(_) => None,
            Self::Named(name) => Some(name),
        }
    }
}

impl fmt::Display for Mark {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Numeric(n) => write!(f, "{n}"),
            Self::Named(name) => write!(f, "{name}"),
        }
    }
}

/// A literal piece of text.
///
/// Matching is case-insensitive and whitespace-flexible: a run of
/// whitespace in the literal matches one or more whitespace characters in
/// the input, or none at a word boundary.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TextElement {
    text: String,
}

impl TextElement {
    /// Creates a text element.
    #[must_use]
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    /// Returns the literal text.
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Returns true if the text is only whitespace.
    #[must_use]
    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }

    /// Returns the first non-whitespace word of the literal.
    ///
    /// Any input position where this literal can start must be followed
    /// (after optional whitespace) by this word.
    #[must_use]
    pub fn leading_word(&self) -> &str {
        self.text.split_whitespace().next().unwrap_or("")
    }

    pub(crate) fn push_str(&mut self, s: &str) {
        self.text.push_str(s);
    }
}

/// An inline regular expression, anchored at the match position.
#[derive(Clone)]
pub struct RegexGroup {
    source: String,
    regex: Regex,
}

impl RegexGroup {
    /// Compiles a regex group from its source (without the angle brackets).
    ///
    /// # Errors
    ///
    /// Returns the regex crate's error if the source is not a valid regex.
    pub fn new(source: impl Into<String>) -> Result<Self, regex::Error> {
        let source = source.into();
        let regex = Regex::new(&format!("^(?:{source})"))?;
        Ok(Self { source, regex })
    }

    /// Returns the regex source as written in the pattern.
    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Returns the anchored compiled regex.
    #[must_use]
    pub fn regex(&self) -> &Regex {
        &self.regex
    }
}

impl fmt::Debug for RegexGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RegexGroup(<{}>)", self.source)
    }
}

impl PartialEq for RegexGroup {
    fn eq(&self, other: &Self) -> bool {
        self.source == other.source
    }
}

impl Eq for RegexGroup {}

/// A resolved type reference inside a slot.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TypeRef {
    /// Base name of the registered type.
    pub name: Arc<str>,
    /// The surface form written in the pattern.
    pub surface: Arc<str>,
    /// True if the surface form was the plural one.
    pub plural: bool,
}

impl TypeRef {
    /// Creates a type reference.
    #[must_use]
    pub fn new(name: impl Into<Arc<str>>, surface: impl Into<Arc<str>>, plural: bool) -> Self {
        Self {
            name: name.into(),
            surface: surface.into(),
            plural,
        }
    }
}

/// A typed slot (`%type%`).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExpressionElement {
    /// Accepted types, in declaration order. Never empty.
    pub types: Vec<TypeRef>,
    /// `%-type%`: an empty span resolves to an absent expression.
    pub optional: bool,
    /// `%=type%`: only literals are accepted.
    pub literal_only: bool,
    /// Mark recorded when the slot is filled.
    pub mark: Option<Mark>,
}

impl ExpressionElement {
    /// Returns true if the slot accepts several values.
    #[must_use]
    pub fn is_plural(&self) -> bool {
        self.types.iter().any(|t| t.plural)
    }

    /// Returns a readable description of the accepted types, e.g. `number or string`.
    #[must_use]
    pub fn describe(&self) -> String {
        self.types
            .iter()
            .map(|t| t.surface.as_ref())
            .collect::<Vec<_>>()
            .join(" or ")
    }
}

/// One alternative of a choice group.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Choice {
    /// The alternative's content.
    pub element: PatternElement,
    /// Mark recorded when this alternative wins.
    pub mark: Option<Mark>,
}

/// A node of the pattern AST.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PatternElement {
    /// Literal text.
    Text(TextElement),
    /// Ordered sequence.
    Compound(Vec<PatternElement>),
    /// Zero-or-one occurrence, with an optional mark recorded on presence.
    Optional {
        /// The optional content.
        element: Box<PatternElement>,
        /// Mark recorded when the content matched.
        mark: Option<Mark>,
    },
    /// Ordered choice; the first alternative that leads to a match wins.
    Choice(Vec<Choice>),
    /// Anchored regular expression.
    Regex(RegexGroup),
    /// Typed slot.
    Expression(ExpressionElement),
}

impl PatternElement {
    /// Returns the element as a flat list of sequence items.
    #[must_use]
    pub fn flatten(&self) -> &[PatternElement] {
        match self {
            Self::Compound(children) => children,
            other => std::slice::from_ref(other),
        }
    }

    /// Returns the lowercased literal words present in every match.
    ///
    /// Words inside optional groups, choices and regexes are skipped, so
    /// a text that lacks any of these words can never match.
    #[must_use]
    pub fn keywords(&self) -> Vec<String> {
        let mut words = Vec::new();
        self.collect_keywords(&mut words);
        words
    }

    fn collect_keywords(&self, words: &mut Vec<String>) {
        match self {
            Self::Text(t) => {
                for word in t.text().split_whitespace() {
                    let word = word.to_lowercase();
                    if !words.contains(&word) {
                        words.push(word);
                    }
                }
            }
            Self::Compound(children) => {
                for child in children {
                    child.collect_keywords(words);
                }
            }
            Self::Optional { .. } | Self::Choice(_) | Self::Regex(_) | Self::Expression(_) => {}
        }
    }

    /// Visits every slot in the tree in source order.
    pub fn for_each_slot<'a>(&'a self, f: &mut impl FnMut(&'a ExpressionElement)) {
        match self {
            Self::Expression(e) => f(e),
            Self::Compound(children) => {
                for child in children {
                    child.for_each_slot(f);
                }
            }
            Self::Optional { element, .. } => element.for_each_slot(f),
            Self::Choice(choices) => {
                for choice in choices {
                    choice.element.for_each_slot(f);
                }
            }
            Self::Text(_) | Self::Regex(_) => {}
        }
    }
}

// =============================================================================
// Possible inputs
// =============================================================================

/// An element a sequence can start with.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PossibleInput<'a> {
    /// A non-blank literal.
    Text(&'a TextElement),
    /// A regex group.
    Regex(&'a RegexGroup),
    /// A slot, which can start with anything.
    Expression(&'a ExpressionElement),
    /// The sequence can match the empty string.
    EndOfLine,
}

/// Computes the ordered set of elements a sequence can start with.
///
/// Walks the sequence, folding the contents of optional groups (and of
/// choices or groups that can be empty) into the possibilities of the next
/// mandatory element. Blank literals are skipped. If the whole sequence can
/// be empty, [`PossibleInput::EndOfLine`] is appended.
#[must_use]
pub fn possible_inputs(elements: &[PatternElement]) -> Vec<PossibleInput<'_>> {
    let mut acc = Vec::new();
    for element in elements {
        match element {
            PatternElement::Text(t) => {
                if t.is_blank() {
                    continue;
                }
                push_unique(&mut acc, PossibleInput::Text(t));
                return acc;
            }
            PatternElement::Regex(r) => {
                push_unique(&mut acc, PossibleInput::Regex(r));
                return acc;
            }
            PatternElement::Expression(e) => {
                push_unique(&mut acc, PossibleInput::Expression(e));
                return acc;
            }
            PatternElement::Optional { element, .. } => {
                fold_open(&mut acc, possible_inputs(element.flatten()));
            }
            PatternElement::Compound(children) => {
                if fold(&mut acc, possible_inputs(children)) {
                    return acc;
                }
            }
            PatternElement::Choice(choices) => {
                let mut closed = true;
                for choice in choices {
                    closed &= fold(&mut acc, possible_inputs(choice.element.flatten()));
                }
                if closed {
                    return acc;
                }
            }
        }
    }
    acc.push(PossibleInput::EndOfLine);
    acc
}

/// Adds `inputs` to `acc` and returns true if they cannot be empty.
fn fold<'a>(acc: &mut Vec<PossibleInput<'a>>, inputs: Vec<PossibleInput<'a>>) -> bool {
    let closed = !inputs.contains(&PossibleInput::EndOfLine);
    fold_open(acc, inputs);
    closed
}

fn fold_open<'a>(acc: &mut Vec<PossibleInput<'a>>, inputs: Vec<PossibleInput<'a>>) {
    for input in inputs {
        if input != PossibleInput::EndOfLine {
            push_unique(acc, input);
        }
    }
}

fn push_unique<'a>(acc: &mut Vec<PossibleInput<'a>>, input: PossibleInput<'a>) {
    if !acc.contains(&input) {
        acc.push(input);
    }
}
