use super::{variants, Variants};
use quote::quote;
use syn::DeriveInput;

pub(crate) fn expand_residual(input: DeriveInput) -> syn::Result<proc_macro2::TokenStream> {
    let variants = variants(&input)?;
    let residual = impl_residual(&input.ident, variants);
    let molar_weight = impl_molar_weight(&input.ident, variants);
    Ok(quote! {
        #residual
        #molar_weight
    })
}

fn impl_residual(ident: &syn::Ident, variants: &Variants) -> proc_macro2::TokenStream {
    let compute_max_density = variants.iter().map(|v| {
        let name = &v.ident;
        quote! {
            Self::#name(model) => ::despasito_core::Residual::compute_max_density(model, moles)
        }
    });
    let contributions = variants.iter().map(|v| {
        let name = &v.ident;
        quote! {
            Self::#name(model) => ::despasito_core::Residual::residual_helmholtz_energy_contributions(model, state)
        }
    });

    quote! {
        impl ::despasito_core::Residual for #ident {
            fn compute_max_density(&self, moles: &::ndarray::Array1<f64>) -> f64 {
                match self {
                    #(#compute_max_density,)*
                }
            }

            fn residual_helmholtz_energy_contributions<
                D: ::num_dual::DualNum<f64> + Copy + ::ndarray::ScalarOperand,
            >(
                &self,
                state: &::despasito_core::StateHD<D>,
            ) -> Vec<(String, D)> {
                match self {
                    #(#contributions,)*
                }
            }
        }
    }
}

fn impl_molar_weight(ident: &syn::Ident, variants: &Variants) -> proc_macro2::TokenStream {
    let molar_weight = variants.iter().map(|v| {
        let name = &v.ident;
        quote! {
            Self::#name(model) => ::despasito_core::MolarWeight::molar_weight(model)
        }
    });

    quote! {
        impl ::despasito_core::MolarWeight for #ident {
            fn molar_weight(&self) -> ::ndarray::Array1<f64> {
                match self {
                    #(#molar_weight,)*
                }
            }
        }
    }
}
