//! Core of rstyled: runtime styles written as text templates.
//!
//! A template is plain css declarations with optional one level nested rules
//! that start with `&` (`&:hover { .. }`, `& .child { .. }`).
//! The text is transformed into canonical rule text (see [`transform()`]),
//! which is used as a key in [`StyleRegistry`]. Each key gets one generated class name
//! and one `<style>` container, which is kept in the document while anyone holds a
//! [`StyleLease`] for it.
//!
//! ```rust
//! use rstyled_core::{transform, PLACEHOLDER};
//!
//! let canonical = transform("background: red; &:hover{ color: blue; }").unwrap();
//! assert_eq!(
//!     canonical.as_str(),
//!     format!("{PLACEHOLDER}{{background: red;}}\n{PLACEHOLDER}:hover{{color: blue;}}")
//! );
//! assert_eq!(
//!     canonical.resolve("css-abc"),
//!     ".css-abc{background: red;}\n.css-abc:hover{color: blue;}"
//! );
//! ```
//!
//! The crate is framework agnostic, document access goes through [`StyleHost`].
//! Check out rstyled-leptos for integration with leptos and browser DOM.

pub mod class_name;
pub mod interpolate;
pub mod registry;
pub mod transform;

pub use interpolate::{Insertion, Template};
pub use registry::{RegistryOptions, StyleHost, StyleLease, StyleRegistry};
pub use transform::{parse_rules, transform, CanonicalText, NestedRule, RuleSet, PLACEHOLDER};

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("Nested block that starts at {offset} has no closing bracket")]
    UnterminatedBlock { offset: usize },
    #[error("Template contains reserved token \"{}\" at {offset}", PLACEHOLDER)]
    ReservedToken { offset: usize },
    #[error("No closing bracket found for interpolation token at {offset}")]
    UnterminatedInterpolation { offset: usize },
    #[error("No style registered for this rule text")]
    UnknownStyle,
    #[error("Style \"{class_name}\" was released more times than acquired")]
    UnbalancedRelease { class_name: String },
}

pub type Result<T> = std::result::Result<T, Error>;

/// Props that carry a class attribute.
/// Used by `styled` wrappers to merge generated class with the one caller provided.
pub trait ClassProp {
    fn class(&self) -> Option<&str>;
    fn set_class(&mut self, class: String);
}

/// Join class names with a single space.
/// Empty and missing names are skipped, order is preserved.
pub fn merge_classes<'a>(classes: impl IntoIterator<Item = Option<&'a str>>) -> String {
    let mut result = String::new();
    for class in classes.into_iter().flatten().map(str::trim) {
        if class.is_empty() {
            continue;
        }
        if !result.is_empty() {
            result.push(' ');
        }
        result.push_str(class);
    }
    result
}
