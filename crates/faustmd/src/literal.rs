//! C string literals and C identifiers.

use thiserror::Error;

/// Why a quoted literal could not be decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum LiteralError {
    /// Missing opening or closing quote.
    #[error("literal is not enclosed in double quotes")]
    Unquoted,
    /// Backslash right before the closing quote.
    #[error("escape sequence at end of literal")]
    TrailingEscape,
}

/// Decodes a double-quoted C string literal, quotes included.
///
/// Recognized escapes are `\0 \a \b \t \n \v \f \r`; a backslash before any
/// other character yields that character.
pub fn unescape(literal: &str) -> Result<String, LiteralError> {
    let inner = literal
        .strip_prefix('"')
        .and_then(|rest| rest.strip_suffix('"'))
        .ok_or(LiteralError::Unquoted)?;

    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(ch) = chars.next() {
        if ch != '\\' {
            out.push(ch);
            continue;
        }
        let escaped = chars.next().ok_or(LiteralError::TrailingEscape)?;
        out.push(match escaped {
            '0' => '\0',
            'a' => '\x07',
            'b' => '\x08',
            't' => '\t',
            'n' => '\n',
            'v' => '\x0b',
            'f' => '\x0c',
            'r' => '\r',
            other => other,
        });
    }
    Ok(out)
}

/// Escapes `text` for use between the quotes of a C string literal.
#[must_use]
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '\0' => out.push_str("\\0"),
            '\x07' => out.push_str("\\a"),
            '\x08' => out.push_str("\\b"),
            '\t' => out.push_str("\\t"),
            '\n' => out.push_str("\\n"),
            '\x0b' => out.push_str("\\v"),
            '\x0c' => out.push_str("\\f"),
            '\r' => out.push_str("\\r"),
            '"' | '\\' => {
                out.push('\\');
                out.push(ch);
            }
            _ => out.push(ch),
        }
    }
    out
}

/// Renders `text` as a UTF-8 C++ string literal (`u8"..."`).
#[must_use]
pub fn cpp_string(text: &str) -> String {
    format!("u8\"{}\"", escape(text))
}

/// Maps `name` onto a C identifier.
///
/// ASCII letters are kept, digits are kept except in leading position, and
/// every other character becomes `_`.
#[must_use]
pub fn mangle(name: &str) -> String {
    name.chars()
        .enumerate()
        .map(|(index, ch)| {
            if ch.is_ascii_alphabetic() || (index > 0 && ch.is_ascii_digit()) {
                ch
            } else {
                '_'
            }
        })
        .collect()
}
