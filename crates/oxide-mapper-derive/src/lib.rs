//! Derive macro describing record shapes for `oxide-mapper`.
//!
//! This crate provides the `#[derive(Model)]` macro, re-exported as
//! `oxide_mapper::Model`.

use std::collections::HashSet;

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::ext::IdentExt;
use syn::{parse_macro_input, Attribute, Data, DeriveInput, Fields, Ident, LitStr, Type};

/// Derives `oxide_mapper::model::Model` for a struct with named fields.
///
/// # Attributes
///
/// - `#[table(name = "table_name")]` - Overrides the SQL table name
///   (optional, defaults to `snake_case` of the struct name)
///
/// # Field Attributes
///
/// - `#[column(name = "column_name")]` - Overrides the SQL column name
///   (optional, defaults to `snake_case` of the field name)
///
/// Every field type must be one of the supported scalar types (`bool`,
/// `i8`..`i64`, `u8`..`u32`, `f32`, `f64`, `String`, `Vec<u8>`) or an
/// `Option` of one of them.
///
/// # Generated Items
///
/// The implementation records, for every field, its name, column override,
/// value type and byte offset, and provides match-based accessors used by
/// the reflective field access strategy.
#[proc_macro_derive(Model, attributes(table, column))]
pub fn derive_model(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    derive_model_impl(input)
        .unwrap_or_else(|e| e.to_compile_error())
        .into()
}

struct FieldInfo {
    ident: Ident,
    name: String,
    ty: Type,
    column: Option<String>,
}

fn derive_model_impl(input: DeriveInput) -> syn::Result<TokenStream2> {
    let struct_name = &input.ident;
    if !input.generics.params.is_empty() {
        return Err(syn::Error::new_spanned(
            &input.generics,
            "Model derive does not support generic structs",
        ));
    }
    let table_name = parse_table_name(&input.attrs)?;

    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(fields) => &fields.named,
            _ => {
                return Err(syn::Error::new_spanned(
                    &input,
                    "Model derive only supports structs with named fields",
                ));
            }
        },
        _ => {
            return Err(syn::Error::new_spanned(
                &input,
                "Model derive only supports structs",
            ));
        }
    };

    let mut infos = Vec::with_capacity(fields.len());
    for field in fields {
        let Some(ident) = field.ident.clone() else {
            return Err(syn::Error::new_spanned(field, "expected a named field"));
        };
        infos.push(FieldInfo {
            name: ident.unraw().to_string(),
            ident,
            ty: field.ty.clone(),
            column: parse_column_name(&field.attrs)?,
        });
    }

    check_unique_columns(&infos)?;

    let type_name = struct_name.unraw().to_string();
    let table_tokens = option_tokens(table_name.as_deref());

    let field_defs = infos.iter().map(|info| {
        let FieldInfo {
            ident,
            name,
            ty,
            column,
        } = info;
        let column = option_tokens(column.as_deref());
        quote! {
            ::oxide_mapper::model::FieldDef {
                name: #name,
                column: #column,
                ty: <#ty as ::oxide_mapper::value::SqlType>::FIELD_TYPE,
                offset: ::core::mem::offset_of!(#struct_name, #ident),
            }
        }
    });

    let read_arms = infos.iter().map(|FieldInfo { ident, name, .. }| {
        quote! {
            #name => ::core::option::Option::Some(
                ::oxide_mapper::value::ToSqlValue::to_sql_value(
                    ::core::clone::Clone::clone(&self.#ident),
                ),
            ),
        }
    });

    let write_arms = infos.iter().map(|FieldInfo { ident, name, ty, .. }| {
        quote! {
            #name => {
                self.#ident = <#ty as ::oxide_mapper::value::FromSqlValue>::from_sql_value(value)?;
                ::core::result::Result::Ok(true)
            }
        }
    });

    let expanded = quote! {
        // SAFETY: every `FieldDef` takes its offset from `offset_of!` on the
        // field it names and its type descriptor from the field's own type.
        #[allow(unsafe_code)]
        unsafe impl ::oxide_mapper::model::Model for #struct_name {
            const TYPE_NAME: &'static str = #type_name;
            const TABLE_NAME: ::core::option::Option<&'static str> = #table_tokens;
            const FIELDS: &'static [::oxide_mapper::model::FieldDef] = &[
                #(#field_defs),*
            ];

            #[allow(clippy::match_single_binding)]
            fn field_value(
                &self,
                field: &str,
            ) -> ::core::option::Option<::oxide_mapper::value::SqlValue> {
                match field {
                    #(#read_arms)*
                    _ => ::core::option::Option::None,
                }
            }

            #[allow(unused_variables, clippy::match_single_binding)]
            fn set_field_value(
                &mut self,
                field: &str,
                value: ::oxide_mapper::value::SqlValue,
            ) -> ::core::result::Result<bool, ::oxide_mapper::value::ValueError> {
                match field {
                    #(#write_arms)*
                    _ => ::core::result::Result::Ok(false),
                }
            }
        }
    };

    Ok(expanded)
}

/// Rejects two fields resolving to the same column, whether named by
/// `#[column(name)]` or derived from the field name.
fn check_unique_columns(infos: &[FieldInfo]) -> syn::Result<()> {
    let mut seen = HashSet::new();
    for info in infos {
        let column = info
            .column
            .clone()
            .unwrap_or_else(|| to_snake_case(&info.name));
        if !seen.insert(column.clone()) {
            return Err(syn::Error::new_spanned(
                &info.ident,
                format!("column `{column}` is already mapped by another field"),
            ));
        }
    }
    Ok(())
}

/// Same naming rule as `oxide_mapper::model::underscore_name`.
fn to_snake_case(s: &str) -> String {
    let mut result = String::new();
    for (i, c) in s.chars().enumerate() {
        if c.is_uppercase() {
            if i != 0 {
                result.push('_');
            }
            result.extend(c.to_lowercase());
        } else {
            result.push(c);
        }
    }
    result
}

fn option_tokens(value: Option<&str>) -> TokenStream2 {
    match value {
        Some(v) => quote! { ::core::option::Option::Some(#v) },
        None => quote! { ::core::option::Option::None },
    }
}

fn parse_table_name(attrs: &[Attribute]) -> syn::Result<Option<String>> {
    let mut table_name = None;
    for attr in attrs {
        if attr.path().is_ident("table") {
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("name") {
                    let value: LitStr = meta.value()?.parse()?;
                    if value.value().is_empty() {
                        return Err(meta.error("table name must not be empty"));
                    }
                    table_name = Some(value.value());
                    Ok(())
                } else {
                    Err(meta.error("unsupported table attribute, expected `name`"))
                }
            })?;
        }
    }
    Ok(table_name)
}

fn parse_column_name(attrs: &[Attribute]) -> syn::Result<Option<String>> {
    let mut column_name = None;
    for attr in attrs {
        if attr.path().is_ident("column") {
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("name") {
                    let value: LitStr = meta.value()?.parse()?;
                    // An empty name falls back to the derived column.
                    column_name = Some(value.value()).filter(|name| !name.is_empty());
                    Ok(())
                } else {
                    Err(meta.error("unsupported column attribute, expected `name`"))
                }
            })?;
        }
    }
    Ok(column_name)
}
