//! Shell-ready rendering of argument vectors for display
//!
//! Tokens made only of shell-safe characters (plus `\` and `"`) are written
//! bare with backslash escapes. Anything else is wrapped in double quotes
//! with `\`, `"`, `$` and `` ` `` escaped. The result splits back into the
//! original tokens under POSIX word splitting.

use std::borrow::Cow;

fn is_safe(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | '/' | '=' | ':' | '@' | ',' | '+' | '%')
}

fn needs_escape_bare(c: char) -> bool {
    matches!(c, '\\' | '"')
}

fn needs_escape_quoted(c: char) -> bool {
    matches!(c, '\\' | '"' | '$' | '`')
}

/// Quote one token for display
pub fn quote(token: &str) -> Cow<'_, str> {
    if token.is_empty() {
        return Cow::Borrowed("\"\"");
    }

    if token.chars().all(|c| is_safe(c) || needs_escape_bare(c)) {
        if !token.chars().any(needs_escape_bare) {
            return Cow::Borrowed(token);
        }
        return Cow::Owned(escape_with(token, needs_escape_bare));
    }

    Cow::Owned(format!("\"{}\"", escape_with(token, needs_escape_quoted)))
}

/// Quote and space-join a token sequence
pub fn join<I, S>(tokens: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    tokens
        .into_iter()
        .map(|t| quote(t.as_ref()).into_owned())
        .collect::<Vec<_>>()
        .join(" ")
}

fn escape_with(token: &str, needs_escape: fn(char) -> bool) -> String {
    let mut escaped = String::with_capacity(token.len() + 4);
    for c in token.chars() {
        if needs_escape(c) {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}
