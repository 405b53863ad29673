//! Derive macros for tablemodel
//!
//! Provides `#[derive(Model)]`.

use proc_macro::TokenStream;
use syn::{DeriveInput, parse_macro_input};

mod model;

/// Derive `Model` for a struct wrapping a `Record`.
///
/// # Example
///
/// ```ignore
/// use tablemodel::{Model, OrmResult, Record};
///
/// #[derive(Debug, Model)]
/// #[orm(table = "categories", validate = "check_name")]
/// struct Category(Record);
///
/// fn check_name(record: &Record) -> OrmResult<()> {
///     // ...
///     Ok(())
/// }
/// ```
///
/// # Generated
///
/// - `TABLE` / `PRIMARY_KEY` constants
/// - `from_record`, `record`, `record_mut` accessors for the wrapped field
/// - `validate` forwarding to the given function, when set
///
/// # Attributes
///
/// - `#[orm(table = "name")]` - Specify table name (required)
/// - `#[orm(primary_key = "column")]` - Primary key column (default `id`)
/// - `#[orm(validate = "path::to::fn")]` - `fn(&Record) -> OrmResult<()>` run before writes
#[proc_macro_derive(Model, attributes(orm))]
pub fn derive_model(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    model::expand(input)
        .unwrap_or_else(|e| e.to_compile_error())
        .into()
}
