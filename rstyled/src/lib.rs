//! Runtime css templates.
//!
//! The purpose of this library is to let components of wasm frameworks
//! and other rust driven web apps keep their styles next to the code,
//! as a text template with one level of nested `&` rules.
//!
//! Each distinct template gets a generated class name and a single `<style>` element,
//! shared by every component instance that uses the same template.
//! Element stays in the document only while it is used.
//!
//! Check out rstyled-leptos (feature = "leptos") for integration with leptos.
//!
pub use rstyled_core::*;

/// Build [`Template`] from string literal.
/// `${expr}` inserts value of any `Display` expression,
/// `${|props: &Props| ..}` inserts value computed from props of the styled component.
///
/// Example:
/// ```rust
/// let size = 4;
/// let template = rstyled::css!("padding: ${size}px; &:hover { color: blue; }");
/// assert_eq!(template.flatten(), "padding: 4px; &:hover { color: blue; }");
///
/// let canonical = rstyled::transform(&template.flatten()).unwrap();
/// assert_eq!(
///     canonical.resolve("css-abc"),
///     ".css-abc{padding: 4px;}\n.css-abc:hover{color: blue;}"
/// );
/// ```
pub use rstyled_macro::css;

#[cfg(feature = "leptos")]
pub use rstyled_leptos as leptos;

// Allow `css!` expansion inside this crate.
extern crate self as rstyled;
