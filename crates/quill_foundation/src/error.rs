//! Error types for the Quill engine.
//!
//! Uses `thiserror` for ergonomic error definition with rich context.

use std::fmt;

use thiserror::Error;

/// The main error type for Quill operations.
#[derive(Debug, Clone, Error)]
#[error("{kind}")]
pub struct Error {
    /// The kind of error that occurred.
    pub kind: ErrorKind,
    /// Optional context about where the error occurred.
    pub context: Option<ErrorContext>,
}

impl Error {
    /// Creates a new error with the given kind.
    #[must_use]
    pub fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            context: None,
        }
    }

    /// Adds context to this error.
    #[must_use]
    pub fn with_context(mut self, context: ErrorContext) -> Self {
        self.context = Some(context);
        self
    }

    /// Creates a pattern compilation error.
    #[must_use]
    pub fn pattern_compile(
        pattern: impl Into<String>,
        position: usize,
        reason: impl Into<String>,
    ) -> Self {
        Self::new(ErrorKind::PatternCompile {
            pattern: pattern.into(),
            position,
            reason: reason.into(),
        })
    }

    /// Creates a "nothing matched" error.
    #[must_use]
    pub fn no_match(expected: impl Into<String>, text: impl Into<String>) -> Self {
        Self::new(ErrorKind::NoMatch {
            expected: expected.into(),
            text: text.into(),
        })
    }

    /// Creates a missing conversion error.
    #[must_use]
    pub fn no_conversion(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self::new(ErrorKind::NoConversion {
            from: from.into(),
            to: to.into(),
        })
    }

    /// Creates an ambiguity report.
    #[must_use]
    pub fn ambiguous(
        text: impl Into<String>,
        chosen: impl Into<String>,
        other: impl Into<String>,
    ) -> Self {
        Self::new(ErrorKind::AmbiguousMatch {
            text: text.into(),
            chosen: chosen.into(),
            other: other.into(),
        })
    }

    /// Creates an unknown type error.
    #[must_use]
    pub fn unknown_type(name: impl Into<String>) -> Self {
        Self::new(ErrorKind::UnknownType(name.into()))
    }

    /// Creates a rejected-syntax error.
    #[must_use]
    pub fn rejected(syntax: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::new(ErrorKind::Rejected {
            syntax: syntax.into(),
            reason: reason.into(),
        })
    }

    /// Creates a runtime evaluation error.
    #[must_use]
    pub fn runtime(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Runtime(message.into()))
    }

    /// Returns true if this error only describes a tolerated condition.
    #[must_use]
    pub const fn is_warning(&self) -> bool {
        matches!(self.kind, ErrorKind::AmbiguousMatch { .. })
    }

    /// Returns the line this error is attached to, if any.
    #[must_use]
    pub fn line(&self) -> Option<usize> {
        self.context.as_ref().and_then(|c| c.line)
    }
}

/// Categorized error kinds for pattern matching.
#[derive(Debug, Clone, Error)]
pub enum ErrorKind {
    /// Malformed pattern source, reported at registration time.
    #[error("invalid pattern {pattern:?} at {position}: {reason}")]
    PatternCompile {
        /// The pattern source.
        pattern: String,
        /// Byte offset of the problem in the source.
        position: usize,
        /// What is wrong.
        reason: String,
    },

    /// No registered pattern fully matches the text.
    #[error("can't understand {text:?} as {expected}")]
    NoMatch {
        /// What was expected (type or syntax category).
        expected: String,
        /// The offending text.
        text: String,
    },

    /// A value's type has no converter path to the expected type.
    #[error("can't convert {from} to {to}")]
    NoConversion {
        /// The source type name.
        from: String,
        /// The target type name.
        to: String,
    },

    /// Several equal-priority syntaxes matched; a fixed rule picked one.
    #[error("{text:?} is ambiguous: chose {chosen} over {other}")]
    AmbiguousMatch {
        /// The ambiguous text.
        text: String,
        /// The syntax that won the tie-break.
        chosen: String,
        /// A syntax that also matched.
        other: String,
    },

    /// A type name is not registered.
    #[error("unknown type: {0}")]
    UnknownType(String),

    /// A type name was registered twice.
    #[error("duplicate type: {0}")]
    DuplicateType(String),

    /// A syntax matched but its factory refused the match.
    #[error("{reason} (in {syntax})")]
    Rejected {
        /// The syntax that refused.
        syntax: String,
        /// Why it refused.
        reason: String,
    },

    /// The operation is not supported by the target.
    #[error("unsupported: {0}")]
    Unsupported(String),

    /// Evaluation of a compiled trigger failed.
    #[error("runtime error: {0}")]
    Runtime(String),

    /// Internal error (should not happen).
    #[error("internal error: {0}")]
    Internal(String),
}

/// Context about where an error occurred.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ErrorContext {
    /// Script name.
    pub script: Option<String>,
    /// Line number in the script (1-based).
    pub line: Option<usize>,
    /// Column number in the line (1-based).
    pub column: Option<usize>,
    /// Stack of syntaxes being resolved when the error happened.
    pub stack: Vec<String>,
}

impl ErrorContext {
    /// Creates a new empty context.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the script name.
    #[must_use]
    pub fn with_script(mut self, script: impl Into<String>) -> Self {
        self.script = Some(script.into());
        self
    }

    /// Sets the line.
    #[must_use]
    pub fn with_line(mut self, line: usize) -> Self {
        self.line = Some(line);
        self
    }

    /// Sets the line and column.
    #[must_use]
    pub fn with_position(mut self, line: usize, column: usize) -> Self {
        self.line = Some(line);
        self.column = Some(column);
        self
    }

    /// Adds a stack frame.
    #[must_use]
    pub fn with_frame(mut self, frame: impl Into<String>) -> Self {
        self.stack.push(frame.into());
        self
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(script) = &self.script {
            write!(f, "at {script}")?;
            match (self.line, self.column) {
                (Some(line), Some(col)) => write!(f, ":{line}:{col}")?,
                (Some(line), None) => write!(f, ":{line}")?,
                _ => {}
            }
        }
        if !self.stack.is_empty() {
            writeln!(f)?;
            for frame in &self.stack {
                writeln!(f, "  in {frame}")?;
            }
        }
        Ok(())
    }
}
