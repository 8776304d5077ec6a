//! Derive macro for `packstream` structures.
//!
//! `#[derive(Structure)]` on a struct carrying `#[packstream(signature = N)]` implements
//! `Structure`, `Pack`, `FromStructure` and `TryFromValue`, plus `From<T> for Value` so the
//! type can nest inside other values. Fields are encoded in declaration order; fields marked
//! `#[packstream(skip)]` are left off the wire and rebuilt with `Default`.
//!
//! The type must be `Clone + Debug + Send + Sync + 'static`, and every encoded field must be
//! `Clone + Into<Value> + TryFromValue`.

extern crate proc_macro;

mod attrs;
mod expand;
mod util;

use proc_macro::TokenStream;
use syn::{parse_macro_input, spanned::Spanned, Data, DeriveInput};

#[proc_macro_derive(Structure, attributes(packstream))]
pub fn derive_structure(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    let out = match &input.data {
        Data::Struct(data) => attrs::parse_signature(&input.attrs, input.ident.span())
            .and_then(|sig| expand::expand_structure(&input.ident, &input.generics, data, sig)),
        Data::Enum(e) => Err(syn::Error::new(
            e.enum_token.span(),
            "Structure can only be derived for structs",
        )),
        Data::Union(u) => Err(syn::Error::new(
            u.union_token.span(),
            "Structure can only be derived for structs",
        )),
    };
    TokenStream::from(out.unwrap_or_else(syn::Error::into_compile_error))
}
