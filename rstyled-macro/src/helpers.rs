use proc_macro2::{Literal, TokenStream};
use quote::quote;
use rstyled_core::interpolate::Interpolation;

use crate::MacroError;

/// Generate template constructor from split macro input.
///
/// Example:
/// `"left: ${offset}px; color: ${|p: &Props| p.color};"` expands to
/// ```no_build
/// ::rstyled::Template::from_parts(
///     ["left: ", "px; color: ", ";"],
///     vec![
///         ::rstyled::Insertion::text(&(offset)),
///         ::rstyled::Insertion::dynamic(|p: &Props| p.color),
///     ],
/// )
/// ```
pub fn generate(interpolation: &Interpolation) -> Result<TokenStream, MacroError> {
    let segments = interpolation
        .segments
        .iter()
        .map(|segment| Literal::string(segment));

    let insertions = interpolation
        .expressions
        .iter()
        .map(|text| {
            let expr: syn::Expr = syn::parse_str(text).map_err(|error| MacroError::Expression {
                text: text.clone(),
                error,
            })?;
            Ok(match expr {
                syn::Expr::Closure(closure) => quote! {
                    ::rstyled::Insertion::dynamic(#closure)
                },
                expr => quote! {
                    ::rstyled::Insertion::text(&(#expr))
                },
            })
        })
        .collect::<Result<Vec<_>, MacroError>>()?;

    Ok(quote! {
        ::rstyled::Template::from_parts(
            [#(#segments),*],
            ::std::vec![#(#insertions),*],
        )
    })
}
