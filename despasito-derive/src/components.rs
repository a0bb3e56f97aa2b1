use super::{variants, Variants};
use quote::quote;
use syn::DeriveInput;

pub(crate) fn expand_components(input: DeriveInput) -> syn::Result<proc_macro2::TokenStream> {
    let variants = variants(&input)?;
    Ok(impl_components(&input.ident, variants))
}

fn impl_components(ident: &syn::Ident, variants: &Variants) -> proc_macro2::TokenStream {
    let components = variants.iter().map(|v| {
        let name = &v.ident;
        quote! {
            Self::#name(model) => ::despasito_core::Components::components(model)
        }
    });
    let subset = variants.iter().map(|v| {
        let name = &v.ident;
        quote! {
            Self::#name(model) => Self::#name(::despasito_core::Components::subset(model, component_list)?)
        }
    });

    quote! {
        impl ::despasito_core::Components for #ident {
            fn components(&self) -> usize {
                match self {
                    #(#components,)*
                }
            }
            fn subset(&self, component_list: &[usize]) -> ::despasito_core::EosResult<Self> {
                Ok(match self {
                    #(#subset,)*
                })
            }
        }
    }
}
