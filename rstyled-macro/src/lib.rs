use proc_macro::TokenStream;
use syn::LitStr;

mod helpers;

/// Build `rstyled::Template` from a string literal with `${expr}` interpolations.
/// Closure expressions are evaluated against props on render, everything else is captured by reference.
/// Don't use this macro directly, use rstyled crate instead, since generated code refers to `::rstyled`.
#[proc_macro]
pub fn css(tokens: TokenStream) -> TokenStream {
    let literal = syn::parse_macro_input!(tokens as LitStr);
    match css_inner(&literal) {
        Ok(output) => output.into(),
        Err(e) => syn::Error::new(literal.span(), e.to_string())
            .to_compile_error()
            .into(),
    }
}

#[derive(thiserror::Error, Debug)]
enum MacroError {
    #[error("Failed to parse css template: {0}")]
    Template(#[from] rstyled_core::Error),
    #[error("Failed to parse interpolation \"{text}\": {error}")]
    Expression { text: String, error: syn::Error },
}

fn css_inner(literal: &LitStr) -> Result<proc_macro2::TokenStream, MacroError> {
    let text = literal.value();
    let interpolation = rstyled_core::interpolate::split_interpolations(&text)?;
    // Template without insertions is known already, so check it before runtime.
    if interpolation.expressions.is_empty() {
        rstyled_core::transform(&text)?;
    }
    helpers::generate(&interpolation)
}
