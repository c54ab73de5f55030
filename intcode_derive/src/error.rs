//! Derive macro for error enums.
//!
//! Generates `std::fmt::Display` and `std::error::Error` implementations, and a
//! `From` conversion for every variant whose single field is marked `#[from]`.
//!
//! # Usage
//!
//! ```ignore
//! use intcode_derive::Error;
//!
//! #[derive(Debug, Error)]
//! pub enum MyError {
//!     #[error("unknown opcode {opcode} at {pc}")]
//!     InvalidOpcode { opcode: i64, pc: usize },
//!
//!     #[error("node {node} faulted: {source}")]
//!     Machine { node: usize, source: InnerError },
//!
//!     #[error("channel error: {0}")]
//!     Channel(#[from] ChannelError),
//!
//!     #[error("network deadlocked")]
//!     Deadlock,
//! }
//! ```
//!
//! # Supported Features
//!
//! - Unit variants: `#[error("message")]`
//! - Tuple variants with positional args: `#[error("error: {0}")]`
//! - Struct variants with named args, including format specs: `#[error("{pc:#x}")]`
//! - Fields the message does not mention are not bound.
//! - `#[from]` on the only field of a variant generates `From<Field>`.
//! - A `#[from]` field or a field named `source` is returned by `Error::source`.

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::{format_ident, quote};
use syn::{Data, DeriveInput, Field, Fields, Lit, Meta, Variant, parse_macro_input};

/// Derives `Display`, `Error` and the requested `From` conversions for an enum.
///
/// Each variant must have an `#[error("...")]` attribute specifying the display
/// message. Supports field interpolation using `{0}`, `{1}` for tuple fields or
/// `{field_name}` for struct fields.
pub fn derive_error(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    match expand_error_derive(&input) {
        Ok(tokens) => TokenStream::from(tokens),
        Err(err) => err.to_compile_error().into(),
    }
}

fn expand_error_derive(input: &DeriveInput) -> syn::Result<TokenStream2> {
    let name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let Data::Enum(data_enum) = &input.data else {
        return Err(syn::Error::new_spanned(
            input,
            "Error derive only supports enums; wrap the payload in a single-variant enum",
        ));
    };

    let mut display_arms = Vec::new();
    let mut source_arms = Vec::new();
    let mut from_impls = Vec::new();

    for variant in &data_enum.variants {
        let variant_name = &variant.ident;
        let message = extract_error_message(variant)?;

        let display_arm = match &variant.fields {
            Fields::Unit => quote! {
                Self::#variant_name => write!(f, #message),
            },
            Fields::Unnamed(fields) => {
                let count = fields.unnamed.len();
                let used: Vec<usize> = (0..count)
                    .filter(|i| references(&message, &i.to_string()))
                    .collect();
                let bindings = (0..count).map(|i| {
                    if used.contains(&i) {
                        let ident = format_ident!("f{}", i);
                        quote! { #ident }
                    } else {
                        quote! { _ }
                    }
                });
                let args: Vec<_> = used.iter().map(|i| format_ident!("f{}", i)).collect();
                let format_str = convert_positional_to_named(&message, count);
                quote! {
                    Self::#variant_name(#(#bindings),*) => write!(f, #format_str #(, #args = #args)*),
                }
            }
            Fields::Named(fields) => {
                let used: Vec<_> = fields
                    .named
                    .iter()
                    .filter_map(|field| field.ident.as_ref())
                    .filter(|ident| references(&message, &ident.to_string()))
                    .collect();
                quote! {
                    Self::#variant_name { #(#used,)* .. } => write!(f, #message #(, #used = #used)*),
                }
            }
        };
        display_arms.push(display_arm);

        if let Some((index, field)) = find_from_field(variant)? {
            let ty = &field.ty;
            let construct = match &field.ident {
                Some(ident) => quote! { Self::#variant_name { #ident: source } },
                None => quote! { Self::#variant_name(source) },
            };
            from_impls.push(quote! {
                impl #impl_generics ::core::convert::From<#ty> for #name #ty_generics #where_clause {
                    fn from(source: #ty) -> Self {
                        #construct
                    }
                }
            });
            source_arms.push(source_arm(variant_name, field, index));
        } else if let Some((index, field)) = find_named_source(variant) {
            source_arms.push(source_arm(variant_name, field, index));
        }
    }

    let source_fn = if source_arms.is_empty() {
        quote! {}
    } else {
        quote! {
            #[allow(unreachable_patterns)]
            fn source(&self) -> ::core::option::Option<&(dyn ::std::error::Error + 'static)> {
                match self {
                    #(#source_arms)*
                    _ => ::core::option::Option::None,
                }
            }
        }
    };

    Ok(quote! {
        impl #impl_generics ::std::fmt::Display for #name #ty_generics #where_clause {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                match self {
                    #(#display_arms)*
                }
            }
        }

        impl #impl_generics ::std::error::Error for #name #ty_generics #where_clause {
            #source_fn
        }

        #(#from_impls)*
    })
}

/// Builds the `Error::source` match arm returning the field at `index`.
fn source_arm(variant_name: &syn::Ident, field: &Field, index: usize) -> TokenStream2 {
    match &field.ident {
        Some(ident) => quote! {
            Self::#variant_name { #ident: source, .. } => {
                ::core::option::Option::Some(source as &(dyn ::std::error::Error + 'static))
            }
        },
        None => {
            let skipped = (0..index).map(|_| quote! { _ });
            quote! {
                Self::#variant_name(#(#skipped,)* source, ..) => {
                    ::core::option::Option::Some(source as &(dyn ::std::error::Error + 'static))
                }
            }
        }
    }
}

/// Returns the field marked `#[from]`, rejecting it unless it is the variant's only field.
fn find_from_field(variant: &Variant) -> syn::Result<Option<(usize, &Field)>> {
    let marked = variant
        .fields
        .iter()
        .enumerate()
        .find(|(_, field)| field.attrs.iter().any(|attr| attr.path().is_ident("from")));

    match marked {
        Some((_, field)) if variant.fields.len() != 1 => Err(syn::Error::new_spanned(
            field,
            format!(
                "#[from] on variant `{}` requires it to have exactly one field",
                variant.ident
            ),
        )),
        other => Ok(other),
    }
}

/// Returns the struct field literally named `source`, if any.
fn find_named_source(variant: &Variant) -> Option<(usize, &Field)> {
    variant
        .fields
        .iter()
        .enumerate()
        .find(|(_, field)| field.ident.as_ref().is_some_and(|ident| ident == "source"))
}

/// Extracts the error message from a variant's `#[error("...")]` attribute.
fn extract_error_message(variant: &Variant) -> syn::Result<String> {
    for attr in &variant.attrs {
        if !attr.path().is_ident("error") {
            continue;
        }

        let Meta::List(meta_list) = &attr.meta else {
            return Err(syn::Error::new_spanned(
                &attr.meta,
                "invalid #[error] attribute; use #[error(\"message\")] to describe the error",
            ));
        };

        let lit = syn::parse2::<Lit>(meta_list.tokens.clone()).map_err(|_| {
            syn::Error::new_spanned(
                &attr.meta,
                "failed to parse #[error] attribute; expected a string literal like #[error(\"bad mode {mode}\")]",
            )
        })?;

        return match lit {
            Lit::Str(lit_str) => Ok(lit_str.value()),
            _ => Err(syn::Error::new_spanned(
                &attr.meta,
                "invalid #[error] attribute: message must be a string literal",
            )),
        };
    }

    Err(syn::Error::new_spanned(
        &variant.ident,
        format!(
            "missing #[error(\"...\")] attribute on variant `{}`; every error variant must declare a display message",
            variant.ident
        ),
    ))
}

/// Returns whether `message` interpolates the argument `name` (`{name}` or `{name:...}`).
fn references(message: &str, name: &str) -> bool {
    message.contains(&format!("{{{name}}}")) || message.contains(&format!("{{{name}:"))
}

/// Converts positional format args `{0}`, `{1:?}` to named args `{f0}`, `{f1:?}`.
fn convert_positional_to_named(format_str: &str, field_count: usize) -> String {
    let mut result = format_str.to_string();
    for i in (0..field_count).rev() {
        result = result
            .replace(&format!("{{{i}}}"), &format!("{{f{i}}}"))
            .replace(&format!("{{{i}:"), &format!("{{f{i}:"));
    }
    result
}
