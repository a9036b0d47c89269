//! Renders pattern ASTs back to normalised pattern source.
//!
//! The output compiles to an equal AST, so it doubles as a canonical form
//! for diagnostics:
//!
//! ```text
//! cancel [the] event      =>  cancel [the] event
//! a ((b c)) d             =>  a b c d
//! ```

use std::fmt::{self, Write};

use crate::ast::{ExpressionElement, Mark, PatternElement};
use crate::compiler::Pattern;

const METACHARACTERS: &[char] = &['[', ']', '(', ')', '|', '<', '>', '%', '\\', ':'];

impl fmt::Display for PatternElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(t) => {
                for c in t.text().chars() {
                    if METACHARACTERS.contains(&c) {
                        f.write_char('\\')?;
                    }
                    f.write_char(c)?;
                }
                Ok(())
            }
            Self::Compound(children) => {
                for child in children {
                    write!(f, "{child}")?;
                }
                Ok(())
            }
            Self::Optional { element, mark } => {
                f.write_char('[')?;
                write_mark(f, mark.as_ref())?;
                write!(f, "{element}]")
            }
            Self::Choice(choices) => {
                f.write_char('(')?;
                for (i, choice) in choices.iter().enumerate() {
                    if i > 0 {
                        f.write_char('|')?;
                    }
                    write_mark(f, choice.mark.as_ref())?;
                    write!(f, "{}", choice.element)?;
                }
                f.write_char(')')
            }
            Self::Regex(r) => write!(f, "<{}>", r.source()),
            Self::Expression(e) => write!(f, "{e}"),
        }
    }
}

impl fmt::Display for ExpressionElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_mark(f, self.mark.as_ref())?;
        f.write_char('%')?;
        if self.optional {
            f.write_char('-')?;
        }
        if self.literal_only {
            f.write_char('=')?;
        }
        for (i, t) in self.types.iter().enumerate() {
            if i > 0 {
                f.write_char('/')?;
            }
            f.write_str(&t.surface)?;
        }
        f.write_char('%')
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // A top-level choice is written without its parentheses
        match self.root() {
            PatternElement::Choice(choices) => {
                for (i, choice) in choices.iter().enumerate() {
                    if i > 0 {
                        f.write_char('|')?;
                    }
                    write_mark(f, choice.mark.as_ref())?;
                    write!(f, "{}", choice.element)?;
                }
                Ok(())
            }
            root => write!(f, "{root}"),
        }
    }
}

fn write_mark(f: &mut fmt::Formatter<'_>, mark: Option<&Mark>) -> fmt::Result {
    match mark {
        Some(mark) => write!(f, "{mark}:"),
        None => Ok(()),
    }
}
