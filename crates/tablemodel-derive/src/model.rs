//! Model derive macro implementation.

mod attrs;

use attrs::parse_model_attrs;
use proc_macro2::TokenStream;
use quote::quote;
use syn::{Data, DeriveInput, Fields, Member, Result};

pub fn expand(input: DeriveInput) -> Result<TokenStream> {
    let name = &input.ident;
    let attrs = parse_model_attrs(&input)?;
    let member = record_member(&input)?;

    let table = &attrs.table;
    let primary_key = attrs.primary_key.as_deref().unwrap_or("id");
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let validate = attrs.validate.as_ref().map(|path| {
        quote! {
            fn validate(record: &::tablemodel::Record) -> ::tablemodel::OrmResult<()> {
                #path(record)
            }
        }
    });

    Ok(quote! {
        impl #impl_generics ::tablemodel::Model for #name #ty_generics #where_clause {
            const TABLE: &'static str = #table;
            const PRIMARY_KEY: &'static str = #primary_key;

            fn from_record(record: ::tablemodel::Record) -> Self {
                Self { #member: record }
            }

            fn record(&self) -> &::tablemodel::Record {
                &self.#member
            }

            fn record_mut(&mut self) -> &mut ::tablemodel::Record {
                &mut self.#member
            }

            #validate
        }
    })
}

/// The single field holding the `Record`.
fn record_member(input: &DeriveInput) -> Result<Member> {
    let fields = match &input.data {
        Data::Struct(data) => &data.fields,
        _ => {
            return Err(syn::Error::new_spanned(
                input,
                "Model can only be derived for structs",
            ));
        }
    };

    let field = match fields {
        Fields::Named(named) if named.named.len() == 1 => &named.named[0],
        Fields::Unnamed(unnamed) if unnamed.unnamed.len() == 1 => &unnamed.unnamed[0],
        _ => {
            return Err(syn::Error::new_spanned(
                fields,
                "Model requires exactly one field, of type `Record`",
            ));
        }
    };

    if !is_record_type(&field.ty) {
        return Err(syn::Error::new_spanned(
            &field.ty,
            "Model field must have type `Record`",
        ));
    }

    Ok(match &field.ident {
        Some(ident) => Member::Named(ident.clone()),
        None => Member::Unnamed(syn::Index::from(0usize)),
    })
}

fn is_record_type(ty: &syn::Type) -> bool {
    match ty {
        syn::Type::Path(p) => p
            .path
            .segments
            .last()
            .is_some_and(|seg| seg.ident == "Record" && seg.arguments.is_none()),
        _ => false,
    }
}
