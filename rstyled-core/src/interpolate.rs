use std::{borrow::Cow, fmt, rc::Rc};

use crate::{transform::skip_quoted, Error, Result};

/// Value placed between two literal segments of a [`Template`].
/// - Static: text that was known when template was built.
/// - Dynamic: computed from props on each render.
pub enum Insertion<P> {
    Static(String),
    Dynamic(Rc<dyn Fn(&P) -> String>),
}

impl<P> Insertion<P> {
    pub fn text(value: impl fmt::Display) -> Self {
        Self::Static(value.to_string())
    }

    pub fn dynamic<F, R>(func: F) -> Self
    where
        F: Fn(&P) -> R + 'static,
        R: fmt::Display,
    {
        Self::Dynamic(Rc::new(move |props| func(props).to_string()))
    }

    fn render_into(&self, props: &P, out: &mut String) {
        match self {
            Self::Static(text) => out.push_str(text),
            Self::Dynamic(func) => out.push_str(&func(props)),
        }
    }
}

impl<P> Clone for Insertion<P> {
    fn clone(&self) -> Self {
        match self {
            Self::Static(text) => Self::Static(text.clone()),
            Self::Dynamic(func) => Self::Dynamic(func.clone()),
        }
    }
}

impl<P> fmt::Debug for Insertion<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Static(text) => f.debug_tuple("Static").field(text).finish(),
            Self::Dynamic(_) => f.write_str("Dynamic(..)"),
        }
    }
}

/// Literal segments interleaved with insertions.
///
/// Rendering goes `segments[0]`, `insertions[0]`, `segments[1]`, ...
/// Missing insertion renders as empty text, insertions without following segment are ignored.
///
/// Usually created by `rstyled::css!` macro:
/// ```no_build
/// let color = "red";
/// let template: Template = css!("color: ${color}; &:hover{ color: blue; }");
/// ```
pub struct Template<P = ()> {
    segments: Vec<Cow<'static, str>>,
    insertions: Vec<Insertion<P>>,
}

impl<P> Template<P> {
    pub fn new() -> Self {
        Self {
            segments: vec![],
            insertions: vec![],
        }
    }

    pub fn from_parts<S>(segments: impl IntoIterator<Item = S>, insertions: Vec<Insertion<P>>) -> Self
    where
        S: Into<Cow<'static, str>>,
    {
        Self {
            segments: segments.into_iter().map(Into::into).collect(),
            insertions,
        }
    }

    pub fn segment(mut self, segment: impl Into<Cow<'static, str>>) -> Self {
        self.segments.push(segment.into());
        self
    }

    pub fn insertion(mut self, insertion: Insertion<P>) -> Self {
        self.insertions.push(insertion);
        self
    }

    /// Returns true if any of insertions depends on props.
    pub fn is_dynamic(&self) -> bool {
        self.insertions
            .iter()
            .any(|i| matches!(i, Insertion::Dynamic(_)))
    }

    /// Flatten template into raw text, evaluating dynamic insertions against props.
    pub fn render(&self, props: &P) -> String {
        let mut result = String::new();
        for (index, segment) in self.segments.iter().enumerate() {
            result.push_str(segment);
            if let Some(insertion) = self.insertions.get(index) {
                insertion.render_into(props, &mut result);
            }
        }
        result
    }
}

impl Template<()> {
    pub fn flatten(&self) -> String {
        self.render(&())
    }
}

impl<P> Default for Template<P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P> Clone for Template<P> {
    fn clone(&self) -> Self {
        Self {
            segments: self.segments.clone(),
            insertions: self.insertions.clone(),
        }
    }
}

impl<P> fmt::Debug for Template<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Template")
            .field("segments", &self.segments)
            .field("insertions", &self.insertions)
            .finish()
    }
}

impl<P> From<&'static str> for Template<P> {
    fn from(text: &'static str) -> Self {
        Self::from_parts([text], vec![])
    }
}

impl<P> From<String> for Template<P> {
    fn from(text: String) -> Self {
        Self::from_parts([text], vec![])
    }
}

/// Source text split by `${..}` tokens.
/// `segments.len()` is always `expressions.len() + 1`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Interpolation {
    pub segments: Vec<String>,
    /// Source of each expression, without `${` and `}`.
    pub expressions: Vec<String>,
}

/// Find any occurrences of `${..}` in source string.
/// Brackets inside expression are balanced, string and char literals are skipped,
/// so closures with block body can be used as expression.
pub fn split_interpolations(source: &str) -> Result<Interpolation> {
    let mut state = Interpolation {
        segments: vec![],
        expressions: vec![],
    };
    let mut rest = source;
    let mut consumed = 0;
    while let Some(start) = rest.find("${") {
        let expression_start = start + 2;
        let end = expression_end(&rest[expression_start..])
            .ok_or(Error::UnterminatedInterpolation {
                offset: consumed + start,
            })?
            + expression_start;

        state.segments.push(rest[..start].to_owned());
        state
            .expressions
            .push(rest[expression_start..end].trim().to_owned());
        consumed += end + 1;
        rest = &rest[end + 1..];
    }
    state.segments.push(rest.to_owned());
    Ok(state)
}

// Returns position of `}` that close the expression.
fn expression_end(source: &str) -> Option<usize> {
    let mut depth = 0usize;
    let mut chars = source.char_indices();
    while let Some((i, c)) = chars.next() {
        match c {
            '{' => depth += 1,
            '}' if depth == 0 => return Some(i),
            '}' => depth -= 1,
            '"' => {
                skip_quoted(&mut chars, '"')?;
            }
            '\'' => {
                let mut next = source[i + 1..].chars();
                match (next.next(), next.next()) {
                    (Some('\\'), _) => {
                        skip_quoted(&mut chars, '\'')?;
                    }
                    // char literal
                    (Some(_), Some('\'')) => {
                        chars.next();
                        chars.next();
                    }
                    // lifetime
                    _ => {}
                }
            }
            _ => {}
        }
    }
    None
}
