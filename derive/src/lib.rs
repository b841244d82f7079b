//! `#[derive(Bindings)]` for `flagtree-core`.
//!
//! Field attributes, all under `#[cli(...)]`:
//!
//! - `name = "..."` and `description = "..."`: register the field as a flag.
//!   Both are needed; a field with only one of them is skipped.
//! - `default = "..."`: parsed into the field before registration. A value
//!   that does not parse is ignored.
//! - `validate = "..."`: a rule string such as `"required,range=1-10"`.
//! - `position = N`: bind the field to the N-th positional token.
//! - `flatten`: register the fields of a nested `Bindings` struct.

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::{format_ident, quote};
use syn::spanned::Spanned;
use syn::{Data, DataStruct, DeriveInput, Fields, LitInt, LitStr, parse_macro_input};

#[derive(Default)]
struct FieldOpts {
    name: Option<String>,
    description: Option<String>,
    default: Option<String>,
    validate: Option<String>,
    position: Option<usize>,
    flatten: bool,
}

impl FieldOpts {
    fn from_attrs(attrs: &[syn::Attribute]) -> syn::Result<Self> {
        let mut opts = Self::default();
        for attr in attrs.iter().filter(|attr| attr.path().is_ident("cli")) {
            attr.parse_nested_meta(|meta| {
                let string = |meta: &syn::meta::ParseNestedMeta<'_>| -> syn::Result<String> {
                    Ok(meta.value()?.parse::<LitStr>()?.value())
                };
                if meta.path.is_ident("name") {
                    opts.name = Some(string(&meta)?);
                } else if meta.path.is_ident("description") {
                    opts.description = Some(string(&meta)?);
                } else if meta.path.is_ident("default") {
                    opts.default = Some(string(&meta)?);
                } else if meta.path.is_ident("validate") {
                    opts.validate = Some(string(&meta)?);
                } else if meta.path.is_ident("position") {
                    opts.position = Some(meta.value()?.parse::<LitInt>()?.base10_parse()?);
                } else if meta.path.is_ident("flatten") {
                    opts.flatten = true;
                } else {
                    return Err(meta.error("unknown cli attribute"));
                }
                Ok(())
            })?;
        }
        Ok(opts)
    }
}

#[proc_macro_derive(Bindings, attributes(cli))]
pub fn derive_bindings(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    expand(input).unwrap_or_else(syn::Error::into_compile_error).into()
}

fn expand(input: DeriveInput) -> syn::Result<TokenStream2> {
    let ident = &input.ident;
    if !input.generics.params.is_empty() {
        return Err(syn::Error::new(
            input.generics.span(),
            "Bindings cannot be derived for generic structs",
        ));
    }
    let fields = match &input.data {
        Data::Struct(DataStruct {
            fields: Fields::Named(fields),
            ..
        }) => &fields.named,
        _ => {
            return Err(syn::Error::new(
                ident.span(),
                "Bindings can only be derived for structs with named fields",
            ));
        }
    };

    let mut flags = Vec::new();
    let mut positionals = Vec::new();

    for field in fields {
        let opts = FieldOpts::from_attrs(&field.attrs)?;
        let Some(member) = &field.ident else {
            continue;
        };
        let ty = &field.ty;
        let project = format_ident!("project_{}", member);
        let projector = quote! {
            fn #project(outer: &mut #ident) -> &mut #ty {
                &mut outer.#member
            }
        };

        if opts.flatten {
            flags.push(quote! {{
                #projector
                <#ty as ::flagtree_core::Bindings>::register_flags(&target.project(#project), command);
            }});
            positionals.push(quote! {{
                #projector
                <#ty as ::flagtree_core::Bindings>::register_positionals(&target.project(#project), command);
            }});
            continue;
        }

        if let (Some(name), Some(description)) = (&opts.name, &opts.description) {
            if !name.is_empty() && !description.is_empty() {
                let apply_default = opts.default.as_ref().filter(|d| !d.is_empty()).map(|default| {
                    quote! {
                        field.with(|value| ::flagtree_core::FlagType::assign_lenient(value, #default));
                    }
                });
                let rules = opts.validate.clone().unwrap_or_default();
                flags.push(quote! {{
                    #projector
                    let field = target.project(#project);
                    #apply_default
                    command.flag(#name, #description, &field, ::flagtree_core::validate::parse_tags(#rules));
                }});
            }
        }

        if let Some(position) = opts.position {
            positionals.push(quote! {{
                #projector
                command.positional(#position, &target.project(#project));
            }});
        }
    }

    Ok(quote! {
        #[automatically_derived]
        impl ::flagtree_core::Bindings for #ident {
            #[allow(unused_variables)]
            fn register_flags(
                target: &::flagtree_core::Binding<Self>,
                command: &mut ::flagtree_core::Command,
            ) {
                #(#flags)*
            }

            #[allow(unused_variables)]
            fn register_positionals(
                target: &::flagtree_core::Binding<Self>,
                command: &mut ::flagtree_core::Command,
            ) {
                #(#positionals)*
            }
        }
    })
}
