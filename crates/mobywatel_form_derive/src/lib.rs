use std::collections::BTreeSet;

use proc_macro::TokenStream;
use proc_macro2::{Ident, Span, TokenStream as TokenStream2};
use proc_macro_crate::{FoundCrate, crate_name};
use quote::quote;
use syn::{Data, DeriveInput, Fields, LitStr, Variant, parse_macro_input};

#[proc_macro_derive(FormField, attributes(field))]
pub fn derive_form_field(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    if !input.generics.params.is_empty() {
        return syn::Error::new_spanned(
            input.ident,
            "FormField derive currently supports only non-generic enums",
        )
        .to_compile_error()
        .into();
    }

    let enum_ident = input.ident;
    let variants = match input.data {
        Data::Enum(data) => data.variants,
        _ => {
            return syn::Error::new(
                Span::call_site(),
                "FormField derive is only supported on fieldless enums",
            )
            .to_compile_error()
            .into();
        }
    };

    let krate = form_crate_path();
    let mut seen = BTreeSet::new();
    let mut idents = Vec::new();
    let mut names = Vec::new();

    for variant in variants {
        if !matches!(variant.fields, Fields::Unit) {
            return syn::Error::new_spanned(variant, "FormField variants cannot carry data")
                .to_compile_error()
                .into();
        }
        let name = match wire_name(&variant) {
            Ok(name) => name,
            Err(error) => return error.to_compile_error().into(),
        };
        if !seen.insert(name.clone()) {
            return syn::Error::new_spanned(
                &variant.ident,
                format!("duplicate form field name `{name}`"),
            )
            .to_compile_error()
            .into();
        }
        idents.push(variant.ident);
        names.push(name);
    }

    quote! {
        impl #krate::form::FormField for #enum_ident {
            const ALL: &'static [Self] = &[#(Self::#idents),*];

            fn name(self) -> &'static str {
                match self {
                    #(Self::#idents => #names,)*
                }
            }

            fn from_name(name: &str) -> ::core::option::Option<Self> {
                match name {
                    #(#names => ::core::option::Option::Some(Self::#idents),)*
                    _ => ::core::option::Option::None,
                }
            }
        }
    }
    .into()
}

fn wire_name(variant: &Variant) -> syn::Result<String> {
    let mut rename = None;
    for attr in &variant.attrs {
        if !attr.path().is_ident("field") {
            continue;
        }
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("rename") {
                let value: LitStr = meta.value()?.parse()?;
                rename = Some(value.value());
                Ok(())
            } else {
                Err(meta.error("unsupported field attribute, expected `rename`"))
            }
        })?;
    }
    Ok(rename.unwrap_or_else(|| to_lower_camel_case(&variant.ident.to_string())))
}

// `extern crate self as mobywatel_form` in the library makes the absolute path valid there too.
fn form_crate_path() -> TokenStream2 {
    match crate_name("mobywatel_form") {
        Ok(FoundCrate::Name(name)) => {
            let ident = Ident::new(&name, Span::call_site());
            quote!(::#ident)
        }
        Ok(FoundCrate::Itself) | Err(_) => quote!(::mobywatel_form),
    }
}

fn to_lower_camel_case(input: &str) -> String {
    let mut chars = input.chars();
    let mut out = String::with_capacity(input.len());
    if let Some(first) = chars.next() {
        out.push(first.to_ascii_lowercase());
        out.push_str(chars.as_str());
    }
    out
}
