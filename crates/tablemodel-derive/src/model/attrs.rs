//! Attribute parsing for the Model derive macro.

use syn::{DeriveInput, Result};

/// Struct-level `#[orm(...)]` settings.
pub(super) struct ModelAttrs {
    pub table: String,
    pub primary_key: Option<String>,
    pub validate: Option<syn::Path>,
}

/// Collect every `#[orm(key = "value", ...)]` on the struct.
pub(super) fn parse_model_attrs(input: &DeriveInput) -> Result<ModelAttrs> {
    let mut table = None;
    let mut primary_key = None;
    let mut validate = None;

    for attr in &input.attrs {
        if !attr.path().is_ident("orm") {
            continue;
        }
        attr.parse_nested_meta(|meta| {
            let value: syn::LitStr = meta.value()?.parse()?;
            if meta.path.is_ident("table") {
                table = Some(value.value());
            } else if meta.path.is_ident("primary_key") {
                primary_key = Some(value.value());
            } else if meta.path.is_ident("validate") {
                validate = Some(value.parse::<syn::Path>()?);
            } else {
                return Err(meta.error("unsupported orm attribute, expected `table`, `primary_key` or `validate`"));
            }
            Ok(())
        })?;
    }

    let table = table.ok_or_else(|| {
        syn::Error::new_spanned(
            &input.ident,
            "Model requires #[orm(table = \"table_name\")] attribute",
        )
    })?;
    if table.is_empty() {
        return Err(syn::Error::new_spanned(&input.ident, "table name must not be empty"));
    }

    Ok(ModelAttrs {
        table,
        primary_key,
        validate,
    })
}
