//! Pattern source compiler.
//!
//! Converts pattern source text into a [`Pattern`].
//!
//! | Token | Meaning |
//! |---|---|
//! | `[x]` | optional group |
//! | `(a\|b)` | ordered choice; a single alternative is plain grouping |
//! | `N:` / `name:` | mark at the start of an alternative, or before a slot |
//! | `:(a\|b)` | every alternative is marked with its own text |
//! | `<regex>` | anchored regex capture |
//! | `%type%` / `%types%` | singular / plural slot |
//! | `%-type%` | optional slot |
//! | `%=type%` | literal-only slot |
//! | `%a/b%` | slot accepting several types |
//! | `\x` | literal `x` |

use std::fmt;
use std::sync::Arc;

use quill_foundation::{Error, Result};

use crate::ast::{Choice, ExpressionElement, Mark, PatternElement, RegexGroup, TextElement, TypeRef};

/// Resolves slot type names while compiling.
pub trait TypeLookup {
    /// Resolves a singular or plural surface form to a type reference.
    fn lookup_type(&self, surface: &str) -> Option<TypeRef>;
}

/// A compiled pattern.
#[derive(Clone, PartialEq, Eq)]
pub struct Pattern {
    source: Arc<str>,
    root: PatternElement,
}

impl Pattern {
    /// Returns the pattern source as written.
    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Returns the root element.
    #[must_use]
    pub fn root(&self) -> &PatternElement {
        &self.root
    }

    /// Returns the root as a flat sequence.
    #[must_use]
    pub fn elements(&self) -> &[PatternElement] {
        self.root.flatten()
    }

    /// Returns the lowercased words every match must contain.
    #[must_use]
    pub fn keywords(&self) -> Vec<String> {
        self.root.keywords()
    }

    /// Returns every slot in source order.
    #[must_use]
    pub fn slots(&self) -> Vec<&ExpressionElement> {
        let mut slots = Vec::new();
        self.root.for_each_slot(&mut |s| slots.push(s));
        slots
    }
}

impl fmt::Debug for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Pattern({:?})", self.source)
    }
}

/// Compiles pattern source against a type lookup.
pub struct PatternCompiler<'a> {
    types: &'a dyn TypeLookup,
}

impl<'a> PatternCompiler<'a> {
    /// Creates a compiler resolving slot types through `types`.
    #[must_use]
    pub fn new(types: &'a dyn TypeLookup) -> Self {
        Self { types }
    }

    /// Compiles a pattern.
    ///
    /// # Errors
    ///
    /// Returns a `PatternCompile` error naming the byte position and reason
    /// for malformed source, unknown slot types, invalid regexes, duplicate
    /// marks, misplaced marks, and directly adjacent unmarked slots.
    pub fn compile(&self, source: &str) -> Result<Pattern> {
        let mut parser = Parser {
            source,
            pos: 0,
            types: self.types,
        };
        let alternatives = parser.alternatives(None)?;
        let root = if alternatives.len() == 1 {
            let Some(alt) = alternatives.into_iter().next() else {
                return Err(parser.error(0, "empty alternative list"));
            };
            if alt.mark.is_some() {
                return Err(parser.error(alt.position, "mark on a pattern with a single alternative"));
            }
            alt.element
        } else {
            parser.choice(alternatives)?
        };
        Ok(Pattern {
            source: source.into(),
            root,
        })
    }
}

// =============================================================================
// Parser
// =============================================================================

struct Alternative {
    element: PatternElement,
    mark: Option<Mark>,
    /// Byte offset of the alternative (including its mark prefix).
    position: usize,
    /// Source text of the alternative, without its mark prefix.
    text: String,
}

struct Parser<'s, 't> {
    source: &'s str,
    pos: usize,
    types: &'t dyn TypeLookup,
}

impl Parser<'_, '_> {
    fn error(&self, position: usize, reason: impl Into<String>) -> Error {
        Error::pattern_compile(self.source, position, reason)
    }

    fn peek(&self) -> Option<char> {
        self.source[self.pos..].chars().next()
    }

    fn peek_nth(&self, n: usize) -> Option<char> {
        self.source[self.pos..].chars().nth(n)
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    /// Parses `|`-separated alternatives up to the closing delimiter, or to
    /// the end of input when `open` is `None`.
    fn alternatives(&mut self, open: Option<(char, usize)>) -> Result<Vec<Alternative>> {
        let close = open.map(|(c, _)| if c == '[' { ']' } else { ')' });
        let mut alternatives = Vec::new();
        loop {
            let position = self.pos;
            let mark = self.mark_prefix();
            let text_start = self.pos;
            let elements = self.sequence()?;
            alternatives.push(Alternative {
                element: sequence_element(elements),
                mark,
                position,
                text: self.source[text_start..self.pos].to_string(),
            });

            match self.peek() {
                Some('|') => {
                    self.bump();
                }
                Some(c) if Some(c) == close => {
                    self.bump();
                    return Ok(alternatives);
                }
                Some(c) => return Err(self.error(self.pos, format!("unexpected '{c}'"))),
                None => {
                    return match open {
                        None => Ok(alternatives),
                        Some((c, at)) => Err(self.error(at, format!("unclosed '{c}'"))),
                    };
                }
            }
        }
    }

    /// Consumes an `N:` or `name:` prefix at the start of an alternative.
    fn mark_prefix(&mut self) -> Option<Mark> {
        let rest = &self.source[self.pos..];
        let len = mark_len(rest)?;
        let mark = parse_mark(&rest[..len])?;
        self.pos += len + 1;
        Some(mark)
    }

    /// Parses a sequence up to `|`, `)`, `]` or the end of input.
    fn sequence(&mut self) -> Result<Vec<PatternElement>> {
        let mut elements = Vec::new();
        let mut text = String::new();
        // Bytes of `text` written by escapes; mark detection ignores them.
        let mut escaped = 0;

        while let Some(c) = self.peek() {
            match c {
                '|' | ')' | ']' => break,
                '\\' => {
                    let at = self.pos;
                    self.bump();
                    let Some(e) = self.bump() else {
                        return Err(self.error(at, "dangling escape"));
                    };
                    text.push(e);
                    escaped = text.len();
                }
                '[' => {
                    flush_text(&mut elements, &mut text, &mut escaped);
                    let open = self.pos;
                    self.bump();
                    let alternatives = self.alternatives(Some(('[', open)))?;
                    let optional = self.optional(alternatives, open)?;
                    push_element(&mut elements, optional);
                }
                '(' => {
                    flush_text(&mut elements, &mut text, &mut escaped);
                    let open = self.pos;
                    self.bump();
                    let alternatives = self.alternatives(Some(('(', open)))?;
                    let group = self.group(alternatives, open)?;
                    push_element(&mut elements, group);
                }
                ':' if self.peek_nth(1) == Some('(') => {
                    flush_text(&mut elements, &mut text, &mut escaped);
                    let open = self.pos;
                    self.bump();
                    self.bump();
                    let alternatives = self.alternatives(Some(('(', open)))?;
                    let choice = self.self_marked_choice(alternatives, open)?;
                    push_element(&mut elements, choice);
                }
                '<' => {
                    flush_text(&mut elements, &mut text, &mut escaped);
                    let regex = self.regex()?;
                    push_element(&mut elements, regex);
                }
                '%' => {
                    let at = self.pos;
                    let mark = take_slot_mark(&mut text, escaped);
                    let adjacent = text.is_empty() && follows_unmarked_slot(&elements);
                    flush_text(&mut elements, &mut text, &mut escaped);
                    let slot = self.slot(mark)?;
                    if adjacent && slot.mark.is_none() {
                        return Err(self.error(at, "adjacent slots need a literal or a mark between them"));
                    }
                    push_element(&mut elements, PatternElement::Expression(slot));
                }
                _ => {
                    self.bump();
                    text.push(c);
                }
            }
        }

        flush_text(&mut elements, &mut text, &mut escaped);
        Ok(elements)
    }

    fn optional(&self, alternatives: Vec<Alternative>, open: usize) -> Result<PatternElement> {
        if alternatives.len() == 1 {
            let Some(alt) = alternatives.into_iter().next() else {
                return Err(self.error(open, "empty optional group"));
            };
            if is_empty(&alt.element) {
                return Err(self.error(open, "empty optional group"));
            }
            return Ok(PatternElement::Optional {
                element: Box::new(alt.element),
                mark: alt.mark,
            });
        }
        Ok(PatternElement::Optional {
            element: Box::new(self.choice(alternatives)?),
            mark: None,
        })
    }

    fn group(&self, alternatives: Vec<Alternative>, open: usize) -> Result<PatternElement> {
        if alternatives.len() == 1 {
            let Some(alt) = alternatives.into_iter().next() else {
                return Err(self.error(open, "empty group"));
            };
            if alt.mark.is_some() {
                return Err(self.error(alt.position, "mark on a group with a single alternative"));
            }
            return Ok(alt.element);
        }
        self.choice(alternatives)
    }

    fn self_marked_choice(
        &self,
        alternatives: Vec<Alternative>,
        open: usize,
    ) -> Result<PatternElement> {
        if alternatives.len() < 2 {
            return Err(self.error(open, "':(...)' needs at least two alternatives"));
        }
        let mut marked = Vec::with_capacity(alternatives.len());
        for mut alt in alternatives {
            if alt.mark.is_some() {
                return Err(self.error(alt.position, "explicit mark inside ':(...)'"));
            }
            let name = alt.text.trim();
            if name.is_empty() {
                return Err(self.error(alt.position, "empty alternative inside ':(...)'"));
            }
            alt.mark = Some(Mark::named(name));
            marked.push(alt);
        }
        self.choice(marked)
    }

    fn choice(&self, alternatives: Vec<Alternative>) -> Result<PatternElement> {
        let mut choices: Vec<Choice> = Vec::with_capacity(alternatives.len());
        for alt in alternatives {
            if let Some(mark) = &alt.mark {
                if choices.iter().any(|c| c.mark.as_ref() == Some(mark)) {
                    return Err(self.error(alt.position, format!("duplicate mark '{mark}'")));
                }
            }
            choices.push(Choice {
                element: alt.element,
                mark: alt.mark,
            });
        }
        Ok(PatternElement::Choice(choices))
    }

    fn regex(&mut self) -> Result<PatternElement> {
        let open = self.pos;
        self.bump();
        let mut source = String::new();
        let mut depth = 0usize;
        loop {
            match self.bump() {
                None => return Err(self.error(open, "unclosed '<'")),
                Some('\\') => {
                    source.push('\\');
                    match self.bump() {
                        Some(c) => source.push(c),
                        None => return Err(self.error(open, "unclosed '<'")),
                    }
                }
                Some('<') => {
                    depth += 1;
                    source.push('<');
                }
                Some('>') if depth == 0 => break,
                Some('>') => {
                    depth -= 1;
                    source.push('>');
                }
                Some(c) => source.push(c),
            }
        }
        if source.is_empty() {
            return Err(self.error(open, "empty regex"));
        }
        RegexGroup::new(source)
            .map(PatternElement::Regex)
            .map_err(|e| self.error(open, format!("invalid regex: {e}")))
    }

    fn slot(&mut self, mark: Option<Mark>) -> Result<ExpressionElement> {
        let open = self.pos;
        self.bump();
        let Some(len) = self.source[self.pos..].find('%') else {
            return Err(self.error(open, "unclosed '%'"));
        };
        let content = &self.source[self.pos..self.pos + len];
        self.pos += len + 1;

        let mut optional = false;
        let mut literal_only = false;
        let mut names = content;
        loop {
            if let Some(rest) = names.strip_prefix('-') {
                optional = true;
                names = rest;
            } else if let Some(rest) = names.strip_prefix('=') {
                literal_only = true;
                names = rest;
            } else {
                break;
            }
        }
        if names.trim().is_empty() {
            return Err(self.error(open, "empty slot"));
        }

        let mut types = Vec::new();
        for name in names.split('/') {
            let name = name.trim();
            if name.is_empty() {
                return Err(self.error(open, "empty type name in slot"));
            }
            let Some(found) = self.types.lookup_type(name) else {
                return Err(self.error(open, format!("unknown type '{name}'")));
            };
            types.push(found);
        }

        Ok(ExpressionElement {
            types,
            optional,
            literal_only,
            mark,
        })
    }
}

// =============================================================================
// Helpers
// =============================================================================

/// Returns the length of a mark name at the start of `s` if it is followed by `:`.
fn mark_len(s: &str) -> Option<usize> {
    let len = s
        .char_indices()
        .find(|&(i, c)| !(c.is_ascii_alphanumeric() || c == '_' || (i == 0 && c == '-')))
        .map_or(s.len(), |(i, _)| i);
    (len > 0 && s[len..].starts_with(':') && !s[len..].starts_with(":(")).then_some(len)
}

fn parse_mark(name: &str) -> Option<Mark> {
    if let Ok(n) = name.parse::<i64>() {
        return Some(Mark::Numeric(n));
    }
    let mut chars = name.chars();
    let first = chars.next()?;
    (first.is_ascii_alphabetic() || first == '_').then(|| Mark::named(name))
}

/// Strips a trailing `N:` / `name:` from pending text, returning it as a slot mark.
fn take_slot_mark(text: &mut String, escaped: usize) -> Option<Mark> {
    let body = text.strip_suffix(':')?;
    let start = body
        .char_indices()
        .rev()
        .find(|&(_, c)| !(c.is_ascii_alphanumeric() || c == '_' || c == '-'))
        .map_or(0, |(i, c)| i + c.len_utf8());
    if start < escaped {
        return None;
    }
    let mark = parse_mark(&body[start..])?;
    text.truncate(start);
    Some(mark)
}

fn flush_text(elements: &mut Vec<PatternElement>, text: &mut String, escaped: &mut usize) {
    if !text.is_empty() {
        push_element(elements, PatternElement::Text(TextElement::new(std::mem::take(text))));
    }
    *escaped = 0;
}

/// Appends to a sequence, splicing compounds and merging adjacent text.
fn push_element(elements: &mut Vec<PatternElement>, element: PatternElement) {
    match element {
        PatternElement::Compound(children) => {
            for child in children {
                push_element(elements, child);
            }
        }
        PatternElement::Text(t) => {
            if let Some(PatternElement::Text(last)) = elements.last_mut() {
                last.push_str(t.text());
            } else {
                elements.push(PatternElement::Text(t));
            }
        }
        other => elements.push(other),
    }
}

fn sequence_element(mut elements: Vec<PatternElement>) -> PatternElement {
    match elements.len() {
        1 => elements.pop().unwrap_or(PatternElement::Compound(Vec::new())),
        _ => PatternElement::Compound(elements),
    }
}

/// Whether the sequence ends in an unmarked slot, looking past optionals
/// that can only ever match whitespace.
fn follows_unmarked_slot(elements: &[PatternElement]) -> bool {
    let last = elements
        .iter()
        .rev()
        .find(|e| !(matches!(e, PatternElement::Optional { .. }) && is_blank(e)));
    matches!(
        last,
        Some(PatternElement::Expression(ExpressionElement { mark: None, .. }))
    )
}

fn is_blank(element: &PatternElement) -> bool {
    match element {
        PatternElement::Text(t) => t.text().trim().is_empty(),
        PatternElement::Optional { element, .. } => is_blank(element),
        PatternElement::Compound(children) => children.iter().all(is_blank),
        PatternElement::Choice(choices) => choices.iter().all(|c| is_blank(&c.element)),
        _ => false,
    }
}

fn is_empty(element: &PatternElement) -> bool {
    matches!(element, PatternElement::Compound(children) if children.is_empty())
}
