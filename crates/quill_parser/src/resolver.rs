//! Expression resolver.
//!
//! Turns a span of text into a bound expression for a typed slot, and a
//! statement line into an effect, section or event. Candidate syntaxes
//! are tried in registry order; the matcher calls back into the resolver
//! for nested slots.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::sync::Arc;

use quill_foundation::{Error, ErrorKind, Result};
use quill_pattern::ExpressionElement;
use tracing::{debug, trace, warn};

use crate::engine::Engine;
use crate::expression::{Converted, ExprRef, ExpressionList, Literal};
use crate::matcher::{MatchContext, SlotResolver, match_full};
use crate::state::{EventInfo, ParserState};
use crate::syntax::{ExpressionFactory, Factory, SyntaxCategory, SyntaxInfo, SyntaxMatch};
use crate::trigger::{Effect, Event, Section};

/// A (span, types, plurality) resolution in progress.
#[derive(PartialEq, Eq)]
struct ActiveKey {
    span: String,
    types: Vec<Arc<str>>,
    plural: bool,
}

/// A finished slot resolution, keyed by the exact span and slot shape.
#[derive(PartialEq, Eq, Hash)]
struct MemoKey {
    span: String,
    types: Vec<Arc<str>>,
    plural: bool,
    literal_only: bool,
    optional: bool,
}

impl MemoKey {
    fn new(span: &str, slot: &ExpressionElement) -> Self {
        Self {
            span: span.to_string(),
            types: slot.types.iter().map(|t| t.name.clone()).collect(),
            plural: slot.is_plural(),
            literal_only: slot.literal_only,
            optional: slot.optional,
        }
    }
}

struct MemoEntry {
    result: Result<Option<ExprRef>>,
    /// Active-stack depth the result was computed at.
    depth: usize,
}

/// Resolves the slots and statements of one logical line.
///
/// Finished slot resolutions are memoized for the lifetime of the resolver,
/// so a span is resolved at most once per slot shape however often the
/// matcher backtracks over it.
pub struct Resolver<'e> {
    engine: &'e Engine,
    state: &'e ParserState,
    active: RefCell<Vec<ActiveKey>>,
    memo: RefCell<HashMap<MemoKey, MemoEntry>>,
    /// Lowest active-stack index a guard refusal depended on since the
    /// innermost pending resolution started. `usize::MAX` when none did.
    refused_at: Cell<usize>,
    warnings: RefCell<Vec<Error>>,
}

impl<'e> Resolver<'e> {
    /// Creates a resolver for statements parsed under `state`.
    #[must_use]
    pub fn new(engine: &'e Engine, state: &'e ParserState) -> Self {
        Self {
            engine,
            state,
            active: RefCell::new(Vec::new()),
            memo: RefCell::new(HashMap::new()),
            refused_at: Cell::new(usize::MAX),
            warnings: RefCell::new(Vec::new()),
        }
    }

    /// Returns and clears the ambiguity warnings collected so far.
    pub fn take_warnings(&self) -> Vec<Error> {
        self.warnings.take()
    }

    /// Parses an effect line.
    ///
    /// # Errors
    ///
    /// Returns `NoMatch` if no effect matches, or the first factory rejection.
    pub fn parse_effect(&self, text: &str) -> Result<Arc<dyn Effect>> {
        self.parse_statement(SyntaxCategory::Effect, text, |syntax, matched| match syntax.factory() {
            Factory::Effect(factory) => factory(matched, self.state),
            _ => Err(misplaced(syntax)),
        })
    }

    /// Parses a section header, returning the section and the name of the
    /// syntax that built it.
    ///
    /// # Errors
    ///
    /// Returns `NoMatch` if no section matches, or the first factory rejection.
    pub fn parse_section(&self, text: &str) -> Result<(Arc<dyn Section>, Arc<str>)> {
        self.parse_statement(SyntaxCategory::Section, text, |syntax, matched| match syntax.factory() {
            Factory::Section(factory) => Ok((factory(matched, self.state)?, Arc::from(syntax.name()))),
            _ => Err(misplaced(syntax)),
        })
    }

    /// Parses a trigger header (without its trailing colon).
    ///
    /// # Errors
    ///
    /// Returns `NoMatch` if no event matches, or the first factory rejection.
    pub fn parse_event(&self, text: &str) -> Result<(Arc<dyn Event>, EventInfo)> {
        self.parse_statement(SyntaxCategory::Event, text, |syntax, matched| match syntax.factory() {
            Factory::Event { factory, info } => Ok((factory(matched, self.state)?, info.clone())),
            _ => Err(misplaced(syntax)),
        })
    }

    fn parse_statement<T>(
        &self,
        category: SyntaxCategory,
        text: &str,
        build: impl Fn(&SyntaxInfo, &SyntaxMatch) -> Result<T>,
    ) -> Result<T> {
        let text = text.trim();
        let lower = text.to_lowercase();
        let candidates = self.engine.syntaxes().get(category);
        let mut rejection = None;

        for (position, syntax) in candidates.iter().enumerate() {
            for (index, pattern) in syntax.patterns().iter().enumerate() {
                if !syntax.keywords_present(index, &lower) {
                    continue;
                }
                let mut ctx = MatchContext::new(text, self);
                if !match_full(pattern, &mut ctx) {
                    continue;
                }
                match build(syntax, &ctx.into_match(index)) {
                    Ok(node) => {
                        debug!(%category, syntax = syntax.name(), pattern = index, text, "parsed statement");
                        if self.engine.config().detect_ambiguity {
                            self.report_ambiguity(category, position, text, |_| true);
                        }
                        return Ok(node);
                    }
                    Err(err) => {
                        debug!(%category, syntax = syntax.name(), error = %err, "factory rejected match");
                        rejection.get_or_insert(err);
                    }
                }
            }
        }
        Err(rejection.unwrap_or_else(|| Error::no_match(category.to_string(), text)))
    }

    // =========================================================================
    // Expressions
    // =========================================================================

    fn resolve_syntax(&self, span: &str, slot: &ExpressionElement) -> Result<ExprRef> {
        let lower = span.to_lowercase();
        let plural = slot.is_plural();
        let candidates = self.engine.syntaxes().get(SyntaxCategory::Expression);
        let mut rejection = None;
        let mut conversion = None;

        for (position, syntax) in candidates.iter().enumerate() {
            let Some((factory, target)) = self.usable(syntax, slot) else {
                continue;
            };
            for (index, pattern) in syntax.patterns().iter().enumerate() {
                if !syntax.keywords_present(index, &lower) {
                    continue;
                }
                let mut ctx = MatchContext::new(span, self);
                if !match_full(pattern, &mut ctx) {
                    continue;
                }
                let expr = match factory(&ctx.into_match(index), self.state) {
                    Ok(expr) => expr,
                    Err(err) => {
                        debug!(syntax = syntax.name(), span, error = %err, "factory rejected match");
                        rejection.get_or_insert(err);
                        continue;
                    }
                };
                if !plural && !expr.is_single() {
                    trace!(syntax = syntax.name(), span, "plural expression in singular slot");
                    continue;
                }
                let Some(target) = target.clone().or_else(|| self.slot_type(expr.return_type(), slot)) else {
                    trace!(syntax = syntax.name(), span, bound = expr.return_type(), "bound type fits no slot type");
                    conversion.get_or_insert(Error::no_conversion(expr.return_type(), slot.describe()));
                    continue;
                };
                match self.coerce(expr, &target) {
                    Ok(expr) => {
                        debug!(syntax = syntax.name(), pattern = index, span, "resolved expression");
                        if self.engine.config().detect_ambiguity {
                            self.report_ambiguity(SyntaxCategory::Expression, position, span, |other| {
                                self.usable(other, slot).is_some()
                            });
                        }
                        return Ok(expr);
                    }
                    Err(err) => {
                        trace!(syntax = syntax.name(), span, error = %err, "conversion failed");
                        conversion.get_or_insert(err);
                    }
                }
            }
        }
        Err(rejection
            .or(conversion)
            .unwrap_or_else(|| Error::no_match(slot.describe(), span)))
    }

    /// Returns the factory and target type if `syntax` may fill `slot` here.
    ///
    /// Syntaxes declared with an any-kind return type may fill every slot.
    /// Their target is `None` and is picked from the type of the expression
    /// the factory binds.
    fn usable<'s>(
        &self,
        syntax: &'s SyntaxInfo,
        slot: &ExpressionElement,
    ) -> Option<(&'s ExpressionFactory, Option<Arc<str>>)> {
        let Factory::Expression {
            factory,
            return_type,
            arity,
            required_event,
        } = syntax.factory()
        else {
            return None;
        };
        if required_event.as_ref().is_some_and(|e| !self.state.has_event(e)) {
            return None;
        }
        if !arity.fits(slot.is_plural()) {
            return None;
        }
        if self.engine.types().get(return_type).is_some_and(|t| t.kind().is_any()) {
            return Some((factory, None));
        }
        self.slot_type(return_type, slot).map(|t| (factory, Some(t)))
    }

    /// Picks the slot type that `from` fills, exactly or by conversion.
    fn slot_type(&self, from: &str, slot: &ExpressionElement) -> Option<Arc<str>> {
        let types = self.engine.types();
        slot.types
            .iter()
            .find(|t| t.name.as_ref() == from)
            .or_else(|| slot.types.iter().find(|t| types.can_convert(from, &t.name)))
            .map(|t| t.name.clone())
    }

    /// Adapts `expr` to `target`, converting literals immediately.
    fn coerce(&self, expr: ExprRef, target: &str) -> Result<ExprRef> {
        let types = self.engine.types();
        let from = expr.return_type();
        if from == target || types.get(target).is_some_and(|t| t.kind().is_any()) {
            return Ok(expr);
        }
        if let Some(values) = expr.literal_values() {
            let converted = values
                .iter()
                .map(|v| types.convert(v, from, target))
                .collect::<Result<Vec<_>>>()?;
            return Ok(Arc::new(Literal::new(target, converted, expr.describe())));
        }
        if types.conversion_path(from, target).is_none() {
            return Err(Error::no_conversion(from, target));
        }
        Ok(Arc::new(Converted::new(expr, target, Arc::clone(types))))
    }

    fn literal(&self, span: &str, slot: &ExpressionElement) -> Option<ExprRef> {
        let types = self.engine.types();
        for type_ref in &slot.types {
            let Some(ty) = types.get(&type_ref.name) else {
                continue;
            };
            if let Some(value) = ty.parse(span) {
                return Some(Arc::new(Literal::new(ty.name().clone(), vec![value], span)));
            }
            if ty.kind().is_any() && !ty.has_parser() {
                for other in types.iter() {
                    if let Some(value) = other.parse(span) {
                        return Some(Arc::new(Literal::new(other.name().clone(), vec![value], span)));
                    }
                }
            }
        }
        None
    }

    /// Resolves `a, b and c` / `a, b or c` for a plural slot.
    fn list_literal(&self, span: &str, slot: &ExpressionElement) -> Option<ExprRef> {
        if !slot.is_plural() || !self.engine.config().list_literals {
            return None;
        }
        let (parts, and) = split_list(span)?;
        let item_slot = ExpressionElement {
            types: slot
                .types
                .iter()
                .map(|t| {
                    let mut t = t.clone();
                    t.plural = false;
                    t
                })
                .collect(),
            optional: false,
            literal_only: slot.literal_only,
            mark: None,
        };

        let mut items = Vec::with_capacity(parts.len());
        for part in parts {
            match self.resolve_slot(part, &item_slot) {
                Ok(Some(item)) => items.push(item),
                Ok(None) => return None,
                Err(err) => {
                    debug!(span, item = part, error = %err, "list item rejected");
                    return None;
                }
            }
        }
        let first = items.first()?.return_type().to_string();
        if items.iter().all(|i| i.return_type() == first) {
            return Some(Arc::new(ExpressionList::new(items, and, first)));
        }
        // Mixed items take the first slot type all of them convert to.
        for target in &slot.types {
            let coerced = items
                .iter()
                .map(|item| self.coerce(Arc::clone(item), &target.name))
                .collect::<Result<Vec<_>>>();
            match coerced {
                Ok(coerced) => {
                    return Some(Arc::new(ExpressionList::new(coerced, and, target.name.clone())));
                }
                Err(err) => trace!(span, target = %target.name, error = %err, "mixed list not convertible"),
            }
        }
        debug!(span, "list items share no slot type");
        None
    }

    /// Returns a memoized result usable at `depth`.
    ///
    /// Failures hold at any depth. A success computed without hitting the
    /// depth limit is only reused at the same depth or shallower.
    fn memoized(&self, key: &MemoKey, depth: usize) -> Option<Result<Option<ExprRef>>> {
        let memo = self.memo.borrow();
        let entry = memo.get(key)?;
        (entry.result.is_err() || depth <= entry.depth).then(|| entry.result.clone())
    }

    fn resolve_fresh(&self, span: &str, slot: &ExpressionElement) -> Result<Option<ExprRef>> {
        let _guard = self.enter(span, slot)?;
        let resolved = if slot.literal_only {
            Err(Error::no_match(slot.describe(), span))
        } else {
            self.resolve_syntax(span, slot)
        };
        match resolved {
            Ok(expr) => Ok(Some(expr)),
            Err(err) => self.list_literal(span, slot).map(Some).ok_or(err),
        }
    }

    // =========================================================================
    // Guards and diagnostics
    // =========================================================================

    fn enter(&self, span: &str, slot: &ExpressionElement) -> Result<ActiveGuard<'_>> {
        let key = ActiveKey {
            span: span.to_lowercase(),
            types: slot.types.iter().map(|t| t.name.clone()).collect(),
            plural: slot.is_plural(),
        };
        let mut active = self.active.borrow_mut();
        if active.len() >= self.engine.config().max_depth {
            debug!(span, depth = active.len(), "resolution depth exceeded");
            self.refused_at.set(0);
            return Err(Error::no_match(slot.describe(), span));
        }
        if let Some(index) = active.iter().position(|k| *k == key) {
            trace!(span, "left-recursive resolution");
            self.refused_at.set(self.refused_at.get().min(index));
            return Err(Error::no_match(slot.describe(), span));
        }
        active.push(key);
        Ok(ActiveGuard {
            active: &self.active,
        })
    }

    /// Reports later equal-priority syntaxes that also match `text`.
    fn report_ambiguity(
        &self,
        category: SyntaxCategory,
        winner: usize,
        text: &str,
        accepts: impl Fn(&SyntaxInfo) -> bool,
    ) {
        let candidates = self.engine.syntaxes().get(category);
        let Some(chosen) = candidates.get(winner) else {
            return;
        };
        let lower = text.to_lowercase();
        for other in &candidates[winner + 1..] {
            if other.priority() != chosen.priority() {
                break;
            }
            if !accepts(other) {
                continue;
            }
            for (index, pattern) in other.patterns().iter().enumerate() {
                if !other.keywords_present(index, &lower) {
                    continue;
                }
                let mut ctx = MatchContext::new(text, self);
                if match_full(pattern, &mut ctx) {
                    let warning = Error::ambiguous(text, chosen.name(), other.name());
                    warn!(%warning, "ambiguous match");
                    self.warnings.borrow_mut().push(warning);
                    return;
                }
            }
        }
    }
}

impl SlotResolver for Resolver<'_> {
    fn resolve_slot(&self, span: &str, slot: &ExpressionElement) -> Result<Option<ExprRef>> {
        let span = span.trim();
        if span.is_empty() {
            return if slot.optional {
                Ok(None)
            } else {
                Err(Error::no_match(slot.describe(), span))
            };
        }
        if let Some(literal) = self.literal(span, slot) {
            return Ok(Some(literal));
        }

        let key = MemoKey::new(span, slot);
        let depth = self.active.borrow().len();
        if let Some(result) = self.memoized(&key, depth) {
            trace!(span, "memoized resolution");
            return result;
        }

        let outer = self.refused_at.replace(usize::MAX);
        let result = self.resolve_fresh(span, slot);
        let refused_at = self.refused_at.get();
        self.refused_at.set(outer.min(refused_at));
        // Refusals of this resolution's own key or deeper ones do not depend
        // on the caller's stack.
        if refused_at >= depth {
            self.memo.borrow_mut().insert(
                key,
                MemoEntry {
                    result: result.clone(),
                    depth,
                },
            );
        }
        result
    }
}

/// Pops the active resolution when dropped.
struct ActiveGuard<'r> {
    active: &'r RefCell<Vec<ActiveKey>>,
}

impl Drop for ActiveGuard<'_> {
    fn drop(&mut self) {
        self.active.borrow_mut().pop();
    }
}

fn misplaced(syntax: &SyntaxInfo) -> Error {
    Error::new(ErrorKind::Internal(format!(
        "{} syntax {:?} registered in the wrong category",
        syntax.category(),
        syntax.name()
    )))
}

// =============================================================================
// List literals
// =============================================================================

/// Splits a list literal into its items, outside of quotes.
///
/// Returns the trimmed items and whether the list is an `and` list, or
/// `None` if the span is not a list of at least two non-empty items.
fn split_list(span: &str) -> Option<(Vec<&str>, bool)> {
    let mut parts = Vec::new();
    let mut start = 0;
    let mut quoted = false;
    for (i, c) in span.char_indices() {
        match c {
            '"' => quoted = !quoted,
            ',' if !quoted => {
                parts.push(&span[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    let last = &span[start..];

    let mut and = true;
    match find_connective(last) {
        Some((from, to, is_and)) => {
            and = is_and;
            if !last[..from].trim().is_empty() {
                parts.push(&last[..from]);
            }
            parts.push(&last[to..]);
        }
        None => parts.push(last),
    }

    let parts: Vec<&str> = parts.into_iter().map(str::trim).collect();
    if parts.len() < 2 || parts.iter().any(|p| p.is_empty()) {
        return None;
    }
    Some((parts, and))
}

/// Finds the last ` and ` / ` or ` outside quotes, returning its byte
/// range and whether it is `and`.
fn find_connective(text: &str) -> Option<(usize, usize, bool)> {
    let mut found = None;
    let mut quoted = false;
    for (i, c) in text.char_indices() {
        if c == '"' {
            quoted = !quoted;
            continue;
        }
        if quoted || !c.is_whitespace() {
            continue;
        }
        let rest = text[i..].trim_start();
        let word_start = text.len() - rest.len();
        for (word, is_and) in [("and", true), ("or", false)] {
            let Some(head) = rest.get(..word.len()) else {
                continue;
            };
            if !head.eq_ignore_ascii_case(word) {
                continue;
            }
            let after = &rest[word.len()..];
            if after.starts_with(char::is_whitespace) {
                let end = word_start + word.len() + (after.len() - after.trim_start().len());
                found = Some((i, end, is_and));
            }
        }
    }
    found
}
