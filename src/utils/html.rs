//! HTML utility functions.
//!
//! Provides common HTML processing functions:
//! - `escape_attr()` - Attribute value escaping
//! - `parse_attributes()` - HTML attribute string parsing

use std::borrow::Cow;

// =============================================================================
// HTML Escaping
// =============================================================================

/// Characters that require HTML escaping.
const ESCAPE_CHARS: [char; 5] = ['<', '>', '&', '"', '\''];

/// Get the HTML entity for a special character.
#[inline]
fn escape_char(c: char) -> Option<&'static str> {
    match c {
        '<' => Some("&lt;"),
        '>' => Some("&gt;"),
        '&' => Some("&amp;"),
        '"' => Some("&quot;"),
        '\'' => Some("&#39;"),
        _ => None,
    }
}

/// Escape HTML attribute values.
///
/// Uses `Cow` to avoid allocation when no escaping is needed.
pub fn escape_attr(s: &str) -> Cow<'_, str> {
    if !s.contains(ESCAPE_CHARS) {
        return Cow::Borrowed(s);
    }

    let mut result = String::with_capacity(s.len());
    for c in s.chars() {
        match escape_char(c) {
            Some(entity) => result.push_str(entity),
            None => result.push(c),
        }
    }
    Cow::Owned(result)
}

// =============================================================================
// Attribute Parsing
// =============================================================================

/// Parse HTML-style attributes from a string.
///
/// Input: `type="module" src='a.js' defer`
/// Output: `vec![("type", "module"), ("src", "a.js"), ("defer", "")]`
pub fn parse_attributes(s: &str) -> Vec<(String, String)> {
    let mut attrs = Vec::new();
    let mut chars = s.chars().peekable();

    while let Some(c) = chars.next() {
        if c.is_whitespace() || c == '/' {
            continue;
        }

        // Read attribute name
        let mut name = String::from(c);
        while let Some(next) = chars.next_if(|&n| n != '=' && !n.is_whitespace()) {
            name.push(next);
        }

        while chars.next_if(|c| c.is_whitespace()).is_some() {}

        if chars.next_if_eq(&'=').is_none() {
            // Boolean attribute (no value)
            attrs.push((name, String::new()));
            continue;
        }

        while chars.next_if(|c| c.is_whitespace()).is_some() {}

        let mut value = String::new();
        if let Some(quote) = chars.next_if(|&c| c == '"' || c == '\'') {
            for c in chars.by_ref() {
                if c == quote {
                    break;
                }
                value.push(c);
            }
        } else {
            while let Some(c) = chars.next_if(|c| !c.is_whitespace()) {
                value.push(c);
            }
        }
        attrs.push((name, value));
    }

    attrs
}

// =============================================================================
// Tests
// =============================================================================
