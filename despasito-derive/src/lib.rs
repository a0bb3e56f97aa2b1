//! Derive macros for the `ResidualModel` enum of despasito.
//!
//! Every variant has to wrap exactly one model. The macros forward the
//! trait methods of `despasito_core` to the wrapped model.
use components::expand_components;
use proc_macro::TokenStream;
use residual::expand_residual;
use syn::{parse_macro_input, DeriveInput};

mod components;
mod residual;

type Variants = syn::punctuated::Punctuated<syn::Variant, syn::token::Comma>;

fn variants(input: &DeriveInput) -> syn::Result<&Variants> {
    match &input.data {
        syn::Data::Enum(syn::DataEnum { variants, .. }) => {
            for v in variants {
                if !matches!(&v.fields, syn::Fields::Unnamed(f) if f.unnamed.len() == 1) {
                    return Err(syn::Error::new_spanned(
                        v,
                        "expected a variant with a single unnamed field",
                    ));
                }
            }
            Ok(variants)
        }
        _ => Err(syn::Error::new_spanned(
            &input.ident,
            "this derive macro only works on enums",
        )),
    }
}

#[proc_macro_derive(Components)]
pub fn derive_components(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    expand_components(input)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}

/// Implements `Residual` and `MolarWeight`.
#[proc_macro_derive(Residual)]
pub fn derive_residual(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    expand_residual(input)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}
