use proc_macro2::{Literal, TokenStream};
use quote::{format_ident, quote};
use syn::{DataStruct, Fields, Generics, Ident, Type};

use crate::attrs::parse_field_attrs;
use crate::util::{add_where_bound, empty_where_clause};

struct Field<'a> {
    member: TokenStream,
    ident: Option<&'a Ident>,
    ty: &'a Type,
    skip: bool,
}

fn collect_fields(fields: &Fields) -> syn::Result<Vec<Field<'_>>> {
    let mut out = Vec::new();
    for (idx, field) in fields.iter().enumerate() {
        let attr = parse_field_attrs(&field.attrs)?;
        let member = field.ident.as_ref().map_or_else(
            || {
                let index = syn::Index::from(idx);
                quote!(#index)
            },
            |ident| quote!(#ident),
        );
        out.push(Field {
            member,
            ident: field.ident.as_ref(),
            ty: &field.ty,
            skip: attr.skip,
        });
    }
    Ok(out)
}

fn has_type_params(generics: &Generics) -> bool {
    generics.type_params().next().is_some()
}

fn bounded_where_clause<'a>(
    generics: &Generics,
    fields: impl Iterator<Item = &'a Type>,
    bound: &TokenStream,
) -> Option<syn::WhereClause> {
    let mut wc = generics.where_clause.clone();
    if has_type_params(generics) {
        let clause = wc.get_or_insert_with(empty_where_clause);
        for ty in fields {
            add_where_bound(clause, ty, bound.clone());
        }
    }
    wc
}

fn signature_tokens(signature: i8) -> TokenStream {
    let byte = Literal::u8_suffixed(signature.to_be_bytes()[0]);
    quote!(i8::from_be_bytes([#byte]))
}

fn construct(fields: &Fields, values: &[TokenStream]) -> TokenStream {
    match fields {
        Fields::Named(_) => quote!(Self { #(#values),* }),
        Fields::Unnamed(_) => quote!(Self(#(#values),*)),
        Fields::Unit => quote!(Self),
    }
}

pub(crate) fn expand_structure(
    name: &Ident,
    generics: &Generics,
    data: &DataStruct,
    signature: i8,
) -> syn::Result<TokenStream> {
    let (impl_generics, ty_generics, _) = generics.split_for_impl();
    let fields = collect_fields(&data.fields)?;
    let wire: Vec<&Field<'_>> = fields.iter().filter(|f| !f.skip).collect();
    let len = wire.len();
    let sig = signature_tokens(signature);

    let encode_wc = bounded_where_clause(
        generics,
        wire.iter().map(|f| f.ty),
        &quote!(::core::clone::Clone + ::core::convert::Into<::packstream::Value>),
    );
    let pushes = wire.iter().map(|f| {
        let member = &f.member;
        quote! {
            fields.push(::core::convert::Into::<::packstream::Value>::into(
                ::core::clone::Clone::clone(&self.#member),
            ));
        }
    });

    let mut decode_wc = bounded_where_clause(
        generics,
        wire.iter().map(|f| f.ty),
        &quote!(::packstream::TryFromValue),
    );
    if has_type_params(generics) {
        let clause = decode_wc.get_or_insert_with(empty_where_clause);
        for f in fields.iter().filter(|f| f.skip) {
            add_where_bound(clause, f.ty, quote!(::core::default::Default));
        }
    }

    let mut lets = Vec::new();
    let mut values = Vec::new();
    for (idx, f) in fields.iter().enumerate() {
        let var = format_ident!("__f{idx}");
        if f.skip {
            lets.push(quote! { let #var = ::core::default::Default::default(); });
        } else {
            lets.push(quote! {
                let #var = ::packstream::TryFromValue::try_from_value(
                    iter.next().ok_or_else(invalid)?,
                )?;
            });
        }
        values.push(f.ident.map_or_else(|| quote!(#var), |ident| quote!(#ident: #var)));
    }
    let ctor = construct(&data.fields, &values);

    let mut value_from_wc = generics
        .where_clause
        .clone()
        .unwrap_or_else(empty_where_clause);
    value_from_wc
        .predicates
        .push(syn::parse_quote!(#name #ty_generics: ::packstream::DomainStructure));

    let mut try_from_wc = decode_wc.clone().unwrap_or_else(empty_where_clause);
    try_from_wc
        .predicates
        .push(syn::parse_quote!(Self: ::core::clone::Clone + 'static));

    Ok(quote! {
        impl #impl_generics ::packstream::Structure for #name #ty_generics #encode_wc {
            fn signature(&self) -> i8 {
                #sig
            }

            fn fields(&self) -> ::packstream::__packstream_macro::Cow<'_, [::packstream::Value]> {
                let mut fields = ::packstream::__packstream_macro::Vec::with_capacity(#len);
                #(#pushes)*
                ::packstream::__packstream_macro::Cow::Owned(fields)
            }
        }

        impl #impl_generics ::packstream::Pack for #name #ty_generics #encode_wc {
            fn pack(&self, enc: &mut ::packstream::Packer) -> ::core::result::Result<(), ::packstream::PackStreamError> {
                enc.structure(self)
            }
        }

        impl #impl_generics ::packstream::FromStructure for #name #ty_generics #decode_wc {
            fn from_structure(
                signature: i8,
                fields: ::packstream::__packstream_macro::Vec<::packstream::Value>,
            ) -> ::core::result::Result<Self, ::packstream::PackStreamError> {
                let invalid = || ::packstream::PackStreamError::convert(::packstream::ErrorCode::InvalidStructure);
                if signature != #sig || fields.len() != #len {
                    return ::core::result::Result::Err(invalid());
                }
                #[allow(unused_mut, unused_variables)]
                let mut iter = fields.into_iter();
                #(#lets)*
                ::core::result::Result::Ok(#ctor)
            }
        }

        impl #impl_generics ::packstream::TryFromValue for #name #ty_generics #try_from_wc {
            fn try_from_value(value: ::packstream::Value) -> ::core::result::Result<Self, ::packstream::PackStreamError> {
                match value {
                    ::packstream::Value::Domain(d) => d
                        .downcast_ref::<Self>()
                        .cloned()
                        .ok_or_else(|| ::packstream::PackStreamError::convert(::packstream::ErrorCode::TypeMismatch)),
                    ::packstream::Value::Struct(s) => {
                        <Self as ::packstream::FromStructure>::from_structure(s.signature, s.fields)
                    }
                    _ => ::core::result::Result::Err(
                        ::packstream::PackStreamError::convert(::packstream::ErrorCode::TypeMismatch),
                    ),
                }
            }
        }

        impl #impl_generics ::core::convert::From<#name #ty_generics> for ::packstream::Value #value_from_wc {
            fn from(v: #name #ty_generics) -> Self {
                Self::domain(v)
            }
        }
    })
}
