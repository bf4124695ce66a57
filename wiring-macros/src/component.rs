//! Implementation of #[derive(Component)] proc-macro.

use proc_macro::TokenStream;
use quote::quote;
use syn::{parse_macro_input, Data, DeriveInput, Fields, Ident, LitStr};

pub fn derive_component_impl(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    match expand(&input) {
        Ok(expanded) => TokenStream::from(expanded),
        Err(err) => err.to_compile_error().into(),
    }
}

fn expand(input: &DeriveInput) -> syn::Result<proc_macro2::TokenStream> {
    let name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(fields) => &fields.named,
            _ => {
                return Err(syn::Error::new_spanned(
                    input,
                    "Component can only be derived for structs with named fields",
                ));
            }
        },
        _ => {
            return Err(syn::Error::new_spanned(
                input,
                "Component can only be derived for structs",
            ));
        }
    };

    // One match arm per #[inject] field
    let mut property_arms = Vec::new();
    for field in fields {
        let Some(member) = parse_inject(field)? else {
            continue;
        };
        let Some(field_name) = field.ident.as_ref() else {
            continue;
        };
        let field_type = &field.ty;
        let key = member.unwrap_or_else(|| field_name.to_string());

        property_arms.push(quote! {
            #key => {
                self.#field_name =
                    <#field_type as ::wiring::component::FromInstance>::from_instance(value)?;
                Ok(())
            }
        });
    }

    let setter_arms = parse_setters(input)?.into_iter().map(|setter| {
        let key = setter.to_string();
        quote! {
            #key => self.#setter(value),
        }
    });

    Ok(quote! {
        impl #impl_generics ::wiring::component::Component for #name #ty_generics #where_clause {
            fn set_property(
                &mut self,
                field: &str,
                value: ::wiring::component::Instance,
            ) -> ::wiring::component::BindResult {
                match field {
                    #(#property_arms)*
                    _ => {
                        let _ = value;
                        Err(::wiring::component::unknown_property(
                            ::std::any::type_name::<Self>(),
                            field,
                        ))
                    }
                }
            }

            fn invoke(
                &mut self,
                method: &str,
                value: ::wiring::component::Instance,
            ) -> ::wiring::component::BindResult {
                match method {
                    #(#setter_arms)*
                    _ => {
                        let _ = value;
                        Err(::wiring::component::unknown_method(
                            ::std::any::type_name::<Self>(),
                            method,
                        ))
                    }
                }
            }
        }
    })
}

/// Parses `#[inject]` / `#[inject(rename = "name")]` on a field.
///
/// Returns `None` for fields without the attribute, `Some(None)` for a plain
/// `#[inject]`, and `Some(Some(name))` when renamed.
fn parse_inject(field: &syn::Field) -> syn::Result<Option<Option<String>>> {
    for attr in &field.attrs {
        if !attr.path().is_ident("inject") {
            continue;
        }

        // Plain #[inject]
        if matches!(attr.meta, syn::Meta::Path(_)) {
            return Ok(Some(None));
        }

        let mut rename = None;
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("rename") {
                let value: LitStr = meta.value()?.parse()?;
                rename = Some(value.value());
                Ok(())
            } else {
                Err(meta.error("expected `rename = \"...\"`"))
            }
        })?;
        return Ok(Some(rename));
    }

    Ok(None)
}

/// Parses `#[component(setters(a, b))]` on the struct.
fn parse_setters(input: &DeriveInput) -> syn::Result<Vec<Ident>> {
    let mut setters = Vec::new();

    for attr in &input.attrs {
        if !attr.path().is_ident("component") {
            continue;
        }

        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("setters") {
                meta.parse_nested_meta(|setter| {
                    let ident = setter
                        .path
                        .get_ident()
                        .cloned()
                        .ok_or_else(|| setter.error("expected a method name"))?;
                    setters.push(ident);
                    Ok(())
                })
            } else {
                Err(meta.error("expected `setters(...)`"))
            }
        })?;
    }

    Ok(setters)
}
