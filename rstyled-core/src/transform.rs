//! Template transformer.
//!
//! Splits raw template text into a root rule body and nested rules.
//! Nested rule is anything in form `&<selector>{<content>}` at root level of a template.
//! Only one level of nesting is supported, deeper blocks are kept as a part of nested rule content.
//!
//! Output is [`CanonicalText`], where parent selector is still referenced by [`PLACEHOLDER`].
//! It is resolved later, when class name for that text is known.
//!
//! Policies:
//! - `&` that is not followed by `{` (or has `;`/`}` in between) is plain text.
//! - Nested block without closing bracket is [`Error::UnterminatedBlock`].
//! - Text after the last nested block is a part of root body.
//! - `&`, `{` and `}` inside `"..."` or `'...'` strings are plain text. Unclosed string
//!   inside a nested block is [`Error::UnterminatedBlock`].
//! - Template that contains [`PLACEHOLDER`] is rejected with [`Error::ReservedToken`].
use std::{borrow::Borrow, fmt};

use crate::{Error, Result};

/// Reserved token that stand for parent class selector in canonical text.
pub const PLACEHOLDER: &str = "__RSTYLED_PARENT__";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NestedRule {
    /// Everything between `&` and `{`, leading whitespace is kept (`& .child` is a descendant).
    pub selector: String,
    pub content: String,
}

/// Structured form of a template.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RuleSet {
    pub root: String,
    pub nested: Vec<NestedRule>,
}

impl RuleSet {
    pub fn to_canonical(&self) -> CanonicalText {
        let mut text = String::new();
        push_rule(&mut text, "", &self.root);
        for rule in &self.nested {
            text.push('\n');
            push_rule(&mut text, &rule.selector, &rule.content);
        }
        CanonicalText(text)
    }
}

fn push_rule(out: &mut String, selector: &str, body: &str) {
    out.push_str(PLACEHOLDER);
    out.push_str(selector);
    out.push('{');
    out.push_str(body);
    out.push('}');
}

/// Normalized rule text of a template.
/// Equal templates always produce equal canonical text, so it is used as a cache key.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CanonicalText(String);

impl CanonicalText {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Replace placeholder with `.` + class_name.
    pub fn resolve(&self, class_name: &str) -> String {
        self.0.replace(PLACEHOLDER, &format!(".{class_name}"))
    }
}

impl fmt::Display for CanonicalText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for CanonicalText {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for CanonicalText {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Transform raw template text into canonical rule text.
pub fn transform(raw: &str) -> Result<CanonicalText> {
    parse_rules(raw).map(|rules| rules.to_canonical())
}

/// Split raw template into root body and nested rules.
pub fn parse_rules(raw: &str) -> Result<RuleSet> {
    if let Some(offset) = raw.find(PLACEHOLDER) {
        return Err(Error::ReservedToken { offset });
    }

    let mut root = String::with_capacity(raw.len());
    let mut nested = vec![];
    // Start of root text that is not yet copied.
    let mut root_start = 0;
    let mut cursor = 0;

    while let Some(amp) = find_unquoted(raw, cursor, '&') {
        let Some(open) = find_unquoted(raw, amp, '{') else {
            break;
        };
        let selector = &raw[amp + 1..open];
        if selector.contains([';', '}']) {
            // `&` is a part of some declaration, not a selector.
            cursor = amp + 1;
            continue;
        }
        let close = matching_bracket(raw, open).ok_or(Error::UnterminatedBlock { offset: amp })?;

        root.push_str(&raw[root_start..amp]);
        nested.push(NestedRule {
            selector: selector.trim_end().to_owned(),
            content: raw[open + 1..close].trim().to_owned(),
        });
        cursor = close + 1;
        root_start = cursor;
    }
    root.push_str(&raw[root_start..]);

    Ok(RuleSet {
        root: root.trim().to_owned(),
        nested,
    })
}

// `open` should point to `{`.
fn matching_bracket(raw: &str, open: usize) -> Option<usize> {
    let mut depth = 0usize;
    let mut chars = raw[open..].char_indices();
    while let Some((i, c)) = chars.next() {
        match c {
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(open + i);
                }
            }
            '"' | '\'' => {
                skip_quoted(&mut chars, c)?;
            }
            _ => {}
        }
    }
    None
}

// Position of `target` at or after `from`, that is not inside a quoted string.
fn find_unquoted(raw: &str, from: usize, target: char) -> Option<usize> {
    let mut chars = raw[from..].char_indices();
    while let Some((i, c)) = chars.next() {
        match c {
            c if c == target => return Some(from + i),
            '"' | '\'' => {
                skip_quoted(&mut chars, c)?;
            }
            _ => {}
        }
    }
    None
}

/// Advance `chars` past the closing `quote`, backslash escapes are honored.
/// Returns position of closing quote, or `None` if literal is not closed.
pub(crate) fn skip_quoted(chars: &mut std::str::CharIndices<'_>, quote: char) -> Option<usize> {
    let mut escaped = false;
    loop {
        let (i, c) = chars.next()?;
        match c {
            '\\' if !escaped => escaped = true,
            c if c == quote && !escaped => return Some(i),
            _ => escaped = false,
        }
    }
}
