//! Backtracking pattern matcher.
//!
//! Elements are matched in continuation-passing style: each element is
//! tried together with everything that must follow it, so a later failure
//! backtracks into earlier choices, optional groups and slot spans. Every
//! attempt that fails restores the [`MatchContext`] to the state it had
//! before the attempt.

use quill_foundation::{PSet, PVec, Result};
use quill_pattern::{ExpressionElement, Mark, Pattern, PatternElement, PossibleInput, RegexGroup, possible_inputs};
use tracing::trace;

use crate::expression::ExprRef;
use crate::syntax::{RegexMatch, SyntaxMatch};

/// Fills typed slots during matching.
pub trait SlotResolver {
    /// Resolves `span` into an expression accepted by `slot`.
    ///
    /// Returns `Ok(None)` for an absent optional slot.
    ///
    /// # Errors
    ///
    /// Returns an error if nothing registered can fill the slot.
    fn resolve_slot(&self, span: &str, slot: &ExpressionElement) -> Result<Option<ExprRef>>;
}

/// Everything a match has recorded so far.
///
/// Cloning is O(1), which is what makes snapshots cheap.
#[derive(Clone, Default)]
pub struct MatchState {
    marks: PSet<Mark>,
    expressions: PVec<Option<ExprRef>>,
    regex_matches: PVec<RegexMatch>,
}

/// Mutable state of one match attempt.
pub struct MatchContext<'a> {
    text: &'a str,
    resolver: &'a dyn SlotResolver,
    state: MatchState,
}

impl<'a> MatchContext<'a> {
    /// Creates a context for matching `text`.
    #[must_use]
    pub fn new(text: &'a str, resolver: &'a dyn SlotResolver) -> Self {
        Self {
            text,
            resolver,
            state: MatchState::default(),
        }
    }

    /// Returns the input text.
    #[must_use]
    pub fn text(&self) -> &'a str {
        self.text
    }

    /// Captures the current state.
    #[must_use]
    pub fn snapshot(&self) -> MatchState {
        self.state.clone()
    }

    /// Restores a previously captured state.
    pub fn restore(&mut self, state: MatchState) {
        self.state = state;
    }

    /// Returns the recorded marks in mark order.
    pub fn marks(&self) -> impl Iterator<Item = &Mark> {
        self.state.marks.iter()
    }

    /// Returns the bound slot expressions in match order.
    pub fn expressions(&self) -> impl Iterator<Item = &Option<ExprRef>> {
        self.state.expressions.iter()
    }

    /// Returns the regex captures in match order.
    pub fn regex_matches(&self) -> impl Iterator<Item = &RegexMatch> {
        self.state.regex_matches.iter()
    }

    /// Turns the recorded state into the match handed to a factory.
    #[must_use]
    pub fn into_match(self, pattern_index: usize) -> SyntaxMatch {
        SyntaxMatch {
            pattern_index,
            text: self.text.to_string(),
            expressions: self.state.expressions.into_iter().collect(),
            marks: self.state.marks.iter().cloned().collect(),
            regex_matches: self.state.regex_matches.into_iter().collect(),
        }
    }

    fn add_mark(&mut self, mark: &Mark) {
        self.state.marks = self.state.marks.insert(mark.clone());
    }

    fn push_expression(&mut self, expression: Option<ExprRef>) {
        self.state.expressions = self.state.expressions.push_back(expression);
    }

    fn push_regex_match(&mut self, regex_match: RegexMatch) {
        self.state.regex_matches = self.state.regex_matches.push_back(regex_match);
    }
}

/// Matches `element` at byte `index` and returns the index after it.
///
/// Trailing input is allowed. On `None` the context is unchanged.
pub fn match_element(element: &PatternElement, index: usize, ctx: &mut MatchContext<'_>) -> Option<usize> {
    if index > ctx.text.len() || !ctx.text.is_char_boundary(index) {
        return None;
    }
    seq(element.flatten(), index, None, Goal::Any, ctx)
}

/// Matches `pattern` against the whole input, ignoring trailing whitespace.
///
/// On `false` the context is unchanged.
pub fn match_full(pattern: &Pattern, ctx: &mut MatchContext<'_>) -> bool {
    let matched = seq(pattern.elements(), 0, None, Goal::End, ctx).is_some();
    trace!(pattern = pattern.source(), text = ctx.text, matched, "match attempt");
    matched
}

// =============================================================================
// Continuations
// =============================================================================

#[derive(Clone, Copy)]
enum Goal {
    /// Stop wherever the pattern ends.
    Any,
    /// Only the end of input (modulo whitespace) is acceptable.
    End,
}

/// What must match after the current element.
struct Cont<'a> {
    rest: &'a [PatternElement],
    next: Option<&'a Cont<'a>>,
}

fn seq<'a>(
    elements: &'a [PatternElement],
    pos: usize,
    next: Option<&'a Cont<'a>>,
    goal: Goal,
    ctx: &mut MatchContext<'_>,
) -> Option<usize> {
    let Some((first, rest)) = elements.split_first() else {
        return match next {
            Some(k) => seq(k.rest, pos, k.next, goal, ctx),
            None => finish(pos, goal, ctx.text),
        };
    };
    let k = Cont { rest, next };
    element(first, pos, &k, goal, ctx)
}

fn resume<'a>(k: &'a Cont<'a>, pos: usize, goal: Goal, ctx: &mut MatchContext<'_>) -> Option<usize> {
    seq(k.rest, pos, k.next, goal, ctx)
}

fn finish(pos: usize, goal: Goal, text: &str) -> Option<usize> {
    match goal {
        Goal::Any => Some(pos),
        Goal::End if text[pos..].trim().is_empty() => Some(text.len()),
        Goal::End => None,
    }
}

fn element<'a>(
    el: &'a PatternElement,
    pos: usize,
    k: &'a Cont<'a>,
    goal: Goal,
    ctx: &mut MatchContext<'_>,
) -> Option<usize> {
    match el {
        PatternElement::Text(t) => {
            let end = match_text(t.text(), ctx.text, pos)?;
            resume(k, end, goal, ctx)
        }
        PatternElement::Compound(children) => seq(children, pos, Some(k), goal, ctx),
        PatternElement::Optional { element, mark } => {
            let snapshot = ctx.snapshot();
            if let Some(mark) = mark {
                ctx.add_mark(mark);
            }
            if let Some(end) = seq(element.flatten(), pos, Some(k), goal, ctx) {
                return Some(end);
            }
            ctx.restore(snapshot);
            resume(k, pos, goal, ctx)
        }
        PatternElement::Choice(choices) => {
            for choice in choices {
                let snapshot = ctx.snapshot();
                if let Some(mark) = &choice.mark {
                    ctx.add_mark(mark);
                }
                if let Some(end) = seq(choice.element.flatten(), pos, Some(k), goal, ctx) {
                    return Some(end);
                }
                ctx.restore(snapshot);
            }
            None
        }
        PatternElement::Regex(r) => {
            let captures = r.regex().captures(&ctx.text[pos..])?;
            let whole = captures.get(0)?;
            let end = pos + whole.end();
            let snapshot = ctx.snapshot();
            ctx.push_regex_match(RegexMatch {
                text: whole.as_str().to_string(),
                groups: captures
                    .iter()
                    .skip(1)
                    .map(|g| g.map(|m| m.as_str().to_string()))
                    .collect(),
            });
            if let Some(end) = resume(k, end, goal, ctx) {
                return Some(end);
            }
            ctx.restore(snapshot);
            None
        }
        PatternElement::Expression(slot) => match_slot(slot, pos, k, goal, ctx),
    }
}

// =============================================================================
// Slots
// =============================================================================

fn match_slot<'a>(
    slot: &'a ExpressionElement,
    pos: usize,
    k: &'a Cont<'a>,
    goal: Goal,
    ctx: &mut MatchContext<'_>,
) -> Option<usize> {
    if slot.optional {
        let snapshot = ctx.snapshot();
        ctx.push_expression(None);
        if let Some(end) = resume(k, pos, goal, ctx) {
            return Some(end);
        }
        ctx.restore(snapshot);
    }

    let text = ctx.text;
    let follow = follow_set(k, goal);
    let mut cached: Option<(usize, Option<ExprRef>)> = None;

    for (offset, c) in text[pos..].char_indices() {
        let end = pos + offset + c.len_utf8();
        if !follow.allows(text, end) {
            continue;
        }
        let span = &text[pos..end];
        if span.trim().is_empty() {
            continue;
        }

        let trimmed_end = pos + span.trim_end().len();
        let resolved = match &cached {
            Some((at, expr)) if *at == trimmed_end => expr.clone(),
            _ => {
                let expr = match ctx.resolver.resolve_slot(span, slot) {
                    Ok(expr) => expr,
                    Err(err) => {
                        trace!(span, slot = %slot.describe(), error = %err, "slot span rejected");
                        None
                    }
                };
                cached = Some((trimmed_end, expr.clone()));
                expr
            }
        };
        let Some(expr) = resolved else {
            continue;
        };

        let snapshot = ctx.snapshot();
        ctx.push_expression(Some(expr));
        if let Some(mark) = &slot.mark {
            ctx.add_mark(mark);
        }
        if let Some(end) = resume(k, end, goal, ctx) {
            return Some(end);
        }
        ctx.restore(snapshot);
    }
    None
}

/// Where a slot's span may end.
enum Follow<'a> {
    Anything,
    Only(Vec<Boundary<'a>>),
}

enum Boundary<'a> {
    Word(&'a str),
    Regex(&'a RegexGroup),
    End,
}

impl Follow<'_> {
    fn allows(&self, text: &str, end: usize) -> bool {
        let Self::Only(boundaries) = self else {
            return true;
        };
        let after = &text[end..];
        let stripped = after.trim_start();
        boundaries.iter().any(|b| match b {
            Boundary::Word(word) => starts_with_ignore_case(stripped, word),
            Boundary::Regex(r) => r.regex().is_match(after) || r.regex().is_match(stripped),
            Boundary::End => stripped.is_empty(),
        })
    }
}

fn follow_set<'a>(k: &Cont<'a>, goal: Goal) -> Follow<'a> {
    let mut boundaries = Vec::new();
    let mut level = Some(k);
    while let Some(cont) = level {
        let mut open = false;
        for input in possible_inputs(cont.rest) {
            match input {
                PossibleInput::Text(t) => boundaries.push(Boundary::Word(t.leading_word())),
                PossibleInput::Regex(r) => boundaries.push(Boundary::Regex(r)),
                PossibleInput::Expression(_) => return Follow::Anything,
                PossibleInput::EndOfLine => open = true,
            }
        }
        if !open {
            return Follow::Only(boundaries);
        }
        level = cont.next;
    }
    match goal {
        Goal::Any => Follow::Anything,
        Goal::End => {
            boundaries.push(Boundary::End);
            Follow::Only(boundaries)
        }
    }
}

// =============================================================================
// Text
// =============================================================================

/// Matches a literal at `start`, returning the end index.
fn match_text(literal: &str, text: &str, start: usize) -> Option<usize> {
    let mut pos = start;
    let mut chars = literal.chars().peekable();
    while let Some(c) = chars.next() {
        if c.is_whitespace() {
            while chars.peek().is_some_and(|c| c.is_whitespace()) {
                chars.next();
            }
            let run: usize = text[pos..]
                .chars()
                .take_while(|c| c.is_whitespace())
                .map(char::len_utf8)
                .sum();
            if run == 0 && !at_boundary(text, pos) {
                return None;
            }
            pos += run;
        } else {
            let input = text[pos..].chars().next()?;
            if !chars_eq(c, input) {
                return None;
            }
            pos += input.len_utf8();
        }
    }
    Some(pos)
}

fn at_boundary(text: &str, pos: usize) -> bool {
    pos == 0 || pos == text.len() || text[..pos].chars().next_back().is_some_and(char::is_whitespace)
}

fn chars_eq(a: char, b: char) -> bool {
    a == b || a.to_lowercase().eq(b.to_lowercase())
}

fn starts_with_ignore_case(text: &str, prefix: &str) -> bool {
    let mut chars = text.chars();
    prefix.chars().all(|p| chars.next().is_some_and(|c| chars_eq(p, c)))
}
