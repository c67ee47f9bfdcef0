//! Procedural macros for the simstep stepping coordinator.
//!
//! - `#[derive(Grain)]`: Implements `simstep::Grain` for your type, preserving generics and bounds.
//!   For enums, also generates `label()` returning the variant name.
//!
//! Usage:
//! ```rust,ignore
//! use simstep::Grain;
//!
//! #[derive(Clone, Debug, PartialEq, Grain)]
//! enum Tick { Cycle, Trial, Epoch }
//! ```
use proc_macro::TokenStream;
use quote::quote;
use syn::{Data, DeriveInput, Fields, parse_macro_input};

/// Derives `simstep::Grain` for a step-point tag type.
///
/// For enums, the generated `label()` returns the variant name, so logs and
/// snapshots show `Trial` rather than the full `Debug` output. Variants with
/// fields are matched by name only. Structs keep the default `Debug`-based
/// label.
///
/// # Requirements
///
/// The type must also derive or implement:
/// - `Clone`, `PartialEq` (grains are stored and compared against step points)
/// - `Debug` (default label)
/// - `Send + Sync + 'static` (shared between the worker and controllers)
///
/// # Example
///
/// ```rust,ignore
/// use simstep::{Config, Grain, Stepper};
///
/// #[derive(Clone, Copy, Debug, PartialEq, Grain)]
/// enum Tick {
///     Cycle,
///     Trial,
///     Epoch,
/// }
///
/// let stepper = Stepper::new(Tick::Cycle, Config::default());
/// assert_eq!(Tick::Trial.label(), "Trial");
/// ```
#[proc_macro_derive(Grain)]
pub fn derive_grain(input: TokenStream) -> proc_macro::TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    let ident = input.ident.clone();
    let generics = input.generics.clone();

    let (impl_generics, ty_generics, where_clause) = generics.split_for_impl();

    let label_impl = match &input.data {
        Data::Enum(data_enum) => {
            let match_arms = data_enum.variants.iter().map(|variant| {
                let variant_ident = &variant.ident;
                let variant_name = variant_ident.to_string();

                let pattern = match &variant.fields {
                    Fields::Unit => quote! { Self::#variant_ident },
                    Fields::Unnamed(_) => quote! { Self::#variant_ident(..) },
                    Fields::Named(_) => quote! { Self::#variant_ident { .. } },
                };

                quote! {
                    #pattern => ::std::borrow::Cow::Borrowed(#variant_name)
                }
            });

            quote! {
                fn label(&self) -> ::std::borrow::Cow<'static, str> {
                    match self {
                        #(#match_arms),*
                    }
                }
            }
        }
        // Structs fall back to the Debug rendering
        _ => quote! {},
    };

    let expanded = quote! {
        impl #impl_generics simstep::Grain for #ident #ty_generics #where_clause {
            #label_impl
        }
    };
    TokenStream::from(expanded)
}
