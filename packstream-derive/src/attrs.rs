use proc_macro2::Span;
use syn::{Attribute, LitInt, Token};

#[derive(Default, Clone, Copy)]
pub(crate) struct FieldAttr {
    pub(crate) skip: bool,
}

/// Parse `#[packstream(signature = N)]` on the container.
///
/// `N` may be written signed (`-1`) or as an unsigned byte (`0xFF`); both name the same
/// signature.
pub(crate) fn parse_signature(attrs: &[Attribute], span: Span) -> syn::Result<i8> {
    let mut out: Option<i8> = None;
    for attr in attrs {
        if !attr.path().is_ident("packstream") {
            continue;
        }
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("signature") {
                if out.is_some() {
                    return Err(meta.error("duplicate `packstream(signature = ...)`"));
                }
                let stream = meta.value()?;
                let neg: Option<Token![-]> = stream.parse()?;
                let lit: LitInt = stream.parse()?;
                let raw: i16 = lit.base10_parse()?;
                let v = if neg.is_some() { -raw } else { raw };
                let sig = match v {
                    -128..=127 => i8::try_from(v).ok(),
                    128..=255 => i8::try_from(v - 256).ok(),
                    _ => None,
                };
                let Some(sig) = sig else {
                    return Err(syn::Error::new(
                        lit.span(),
                        "structure signature must fit in one byte (-128..=255)",
                    ));
                };
                out = Some(sig);
                return Ok(());
            }
            Err(meta.error("unsupported `packstream(...)` attribute (allowed: signature)"))
        })?;
    }
    out.ok_or_else(|| {
        syn::Error::new(
            span,
            "missing `#[packstream(signature = ...)]` on a `Structure` derive",
        )
    })
}

pub(crate) fn parse_field_attrs(attrs: &[Attribute]) -> syn::Result<FieldAttr> {
    let mut out = FieldAttr::default();
    for attr in attrs {
        if !attr.path().is_ident("packstream") {
            continue;
        }
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("skip") {
                if out.skip {
                    return Err(meta.error("duplicate `packstream(skip)`"));
                }
                out.skip = true;
                return Ok(());
            }
            if meta.path.is_ident("signature") {
                return Err(meta.error("`packstream(signature)` belongs on the struct, not a field"));
            }
            Err(meta.error("unsupported `packstream(...)` field attribute (allowed: skip)"))
        })?;
    }
    Ok(out)
}
