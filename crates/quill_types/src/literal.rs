//! Literal text helpers shared by the standard type parsers.

/// Parses a quoted string literal, `"..."`, where `""` is an escaped quote.
///
/// Returns `None` if the text is not exactly one quoted literal.
#[must_use]
pub fn parse_quoted(text: &str) -> Option<String> {
    let inner = text.strip_prefix('"')?.strip_suffix('"')?;
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '"' {
            // A lone quote would have closed the literal
            if chars.next() != Some('"') {
                return None;
            }
        }
        out.push(c);
    }
    Some(out)
}

/// Quotes a string so that [`parse_quoted`] returns it unchanged.
#[must_use]
pub fn quote(s: &str) -> String {
    format!("\"{}\"", s.replace('"', "\"\""))
}

/// Parses a decimal number literal such as `5`, `-2` or `3.25`.
///
/// Words like `inf` or `nan` are not numbers in scripts.
#[must_use]
pub fn parse_number(text: &str) -> Option<f64> {
    let digits = text.strip_prefix('-').unwrap_or(text);
    if !digits.starts_with(|c: char| c.is_ascii_digit()) {
        return None;
    }
    if !digits.chars().all(|c| c.is_ascii_digit() || c == '.') {
        return None;
    }
    text.parse().ok()
}

/// Parses an integer literal.
#[must_use]
pub fn parse_integer(text: &str) -> Option<i64> {
    let digits = text.strip_prefix('-').unwrap_or(text);
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    text.parse().ok()
}
