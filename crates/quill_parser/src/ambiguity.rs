//! Registration-time ambiguity pass.
//!
//! For each pair of equal-priority syntaxes in a category, a canonical
//! sample of one pattern (first alternatives, no optional parts, a
//! placeholder word per slot) is matched against the other's patterns.
//! Slots accept any non-empty span during this pass.

use std::sync::Arc;

use quill_foundation::{Error, Result};
use quill_pattern::{ExpressionElement, PatternElement};

use crate::engine::Engine;
use crate::expression::{ExprRef, Literal};
use crate::matcher::{MatchContext, SlotResolver, match_full};
use crate::syntax::{SyntaxCategory, SyntaxInfo};

const CATEGORIES: [SyntaxCategory; 4] = [
    SyntaxCategory::Expression,
    SyntaxCategory::Effect,
    SyntaxCategory::Section,
    SyntaxCategory::Event,
];

/// Returns an `AmbiguousMatch` warning for every overlapping pair.
pub(crate) fn validate(engine: &Engine) -> Vec<Error> {
    let mut warnings = Vec::new();
    for category in CATEGORIES {
        let syntaxes = engine.syntaxes().get(category);
        let samples: Vec<Vec<String>> = syntaxes
            .iter()
            .map(|s| s.patterns().iter().filter_map(|p| sample(p.root())).collect())
            .collect();

        for (i, first) in syntaxes.iter().enumerate() {
            for (j, second) in syntaxes.iter().enumerate().skip(i + 1) {
                if first.priority() != second.priority() {
                    continue;
                }
                let overlap = find_overlap(&samples[j], first).or_else(|| find_overlap(&samples[i], second));
                if let Some(text) = overlap {
                    warnings.push(Error::ambiguous(text, first.name(), second.name()));
                }
            }
        }
    }
    warnings
}

/// Returns the first sample matched by one of the syntax's patterns.
fn find_overlap(samples: &[String], syntax: &SyntaxInfo) -> Option<String> {
    samples
        .iter()
        .find(|text| {
            syntax.patterns().iter().any(|pattern| {
                let mut ctx = MatchContext::new(text, &Permissive);
                match_full(pattern, &mut ctx)
            })
        })
        .cloned()
}

/// Builds the canonical sample text of a pattern.
///
/// Returns `None` for patterns whose mandatory part contains a regex, or
/// that can match the empty string.
pub(crate) fn sample(element: &PatternElement) -> Option<String> {
    let mut out = String::new();
    write_sample(element, &mut out)?;
    let text = out.split_whitespace().collect::<Vec<_>>().join(" ");
    (!text.is_empty()).then_some(text)
}

fn write_sample(element: &PatternElement, out: &mut String) -> Option<()> {
    match element {
        PatternElement::Text(t) => out.push_str(t.text()),
        PatternElement::Compound(children) => {
            for child in children {
                write_sample(child, out)?;
            }
        }
        PatternElement::Optional { .. } => {}
        PatternElement::Choice(choices) => write_sample(&choices.first()?.element, out)?,
        PatternElement::Regex(_) => return None,
        PatternElement::Expression(slot) => {
            if !slot.optional {
                out.push_str(" x ");
            }
        }
    }
    Some(())
}

/// Fills every slot with a typeless placeholder.
struct Permissive;

impl SlotResolver for Permissive {
    fn resolve_slot(&self, span: &str, slot: &ExpressionElement) -> Result<Option<ExprRef>> {
        let span = span.trim();
        if span.is_empty() {
            return if slot.optional {
                Ok(None)
            } else {
                Err(Error::no_match(slot.describe(), span))
            };
        }
        let type_name: Arc<str> = slot
            .types
            .first()
            .map_or_else(|| Arc::from("object"), |t| t.name.clone());
        Ok(Some(Arc::new(Literal::new(type_name, Vec::new(), span))))
    }
}
