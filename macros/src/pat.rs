use std::collections::HashSet;

use convert_case::{Case, Casing};
use either::Either::{self, Left, Right};
use proc_macro2::{Span, TokenStream};
use quote::{quote, ToTokens};
use syn::{parse::Parse, *};

struct VariantArm {
    name: String,
    name_span: Span,
    payload: Pat,
}

pub struct TagArm {
    kind: Either<VariantArm, Token![_]>,
    body: Box<Expr>,
}

fn wildcard() -> Pat {
    Pat::Wild(PatWild {
        attrs: Vec::new(),
        underscore_token: Default::default(),
    })
}

fn variant_name(path: &Path) -> syn::Result<String> {
    path.get_ident().map(Ident::to_string).ok_or_else(|| {
        syn::Error::new_spanned(
            path,
            "variant names must be a single identifier or a string literal",
        )
    })
}

fn classify(pat: &Pat) -> syn::Result<Either<VariantArm, Token![_]>> {
    let unit = |name: String, spanned: &dyn ToTokens| {
        Left(VariantArm {
            name,
            name_span: spanned_of(spanned),
            payload: wildcard(),
        })
    };

    match pat {
        Pat::Wild(wild) => Ok(Right(wild.underscore_token)),

        Pat::Ident(PatIdent { ident, by_ref: None, mutability: None, subpat: None, .. }) => {
            let name = ident.to_string();
            if name.is_case(Case::Pascal) {
                Ok(unit(name, ident))
            } else {
                Err(syn::Error::new_spanned(
                    ident,
                    "bindings cannot stand for a variant; write the variant in PascalCase, quote \
                     it as a string, or use `_` for the catch-all",
                ))
            }
        }

        Pat::Path(PatPath { qself: None, path, .. }) => Ok(unit(variant_name(path)?, path)),

        Pat::TupleStruct(PatTupleStruct { qself: None, path, elems, .. }) => {
            let name = variant_name(path)?;
            let mut elems = elems.iter();
            let payload = match (elems.next(), elems.next()) {
                (None, _) => wildcard(),
                (Some(payload), None) => payload.clone(),
                (Some(_), Some(extra)) => {
                    return Err(syn::Error::new_spanned(
                        extra,
                        "a variant carries exactly one payload; \
                         bind several values with a tuple pattern",
                    ));
                }
            };
            Ok(Left(VariantArm {
                name,
                name_span: spanned_of(path),
                payload,
            }))
        }

        Pat::Lit(ExprLit { lit: Lit::Str(name), .. }) => Ok(unit(name.value(), name)),

        _ => Err(syn::Error::new_spanned(
            pat,
            format_args!("pattern {} is not supported", pat.to_token_stream()),
        )),
    }
}

fn spanned_of(tokens: &dyn ToTokens) -> Span {
    tokens
        .to_token_stream()
        .into_iter()
        .next()
        .map_or_else(Span::call_site, |token| token.span())
}

impl Parse for TagArm {
    fn parse(input: syn::parse::ParseStream<'_>) -> syn::Result<Self> {
        let Arm { attrs, pat, guard, body, .. } = input.parse()?;

        if let Some(attr) = attrs.first() {
            return Err(syn::Error::new_spanned(
                attr,
                "custom attributes are not supported on match arms",
            ));
        }

        if let Some((if_token, cond)) = guard {
            return Err(syn::Error::new_spanned(
                quote!(#if_token #cond),
                "guards are not supported; inspect the payload inside the arm instead",
            ));
        }

        Ok(TagArm {
            kind: classify(&pat)?,
            body,
        })
    }
}

pub struct TagMatch {
    union: Box<Expr>,
    tag: Box<Expr>,
    arms: Vec<TagArm>,
}

impl Parse for TagMatch {
    fn parse(input: syn::parse::ParseStream<'_>) -> syn::Result<Self> {
        let union = input.parse()?;
        input.parse::<Token![,]>()?;
        let tag = Box::new(Expr::parse_without_eager_brace(input)?);

        let content;
        syn::braced!(content in input);

        let mut arms = Vec::new();
        while !content.is_empty() {
            arms.push(content.parse()?);
        }

        Ok(TagMatch { union, tag, arms })
    }
}

/// Reject arms that a handler table cannot represent: the same variant twice,
/// or more than one catch-all.
fn check_arms(arms: &[TagArm]) -> Option<syn::Error> {
    let mut seen = HashSet::new();
    let mut catch_all = None;
    arms.iter().find_map(|arm| match &arm.kind {
        Left(VariantArm { name, name_span, .. }) => (!seen.insert(name.as_str())).then(|| {
            let message = format!("variant \"{name}\" is matched more than once");
            syn::Error::new(*name_span, message)
        }),
        Right(underscore) => catch_all
            .replace(underscore)
            .map(|_| syn::Error::new_spanned(underscore, "only one catch-all arm is allowed")),
    })
}

pub fn expand_match(data: TagMatch) -> TokenStream {
    let TagMatch { union, tag, arms } = data;

    if let Some(err) = check_arms(&arms) {
        return err.to_compile_error();
    }

    let tag_ident = Ident::new("__tunion_tag", Span::mixed_site());
    let table_ident = Ident::new("__tunion_table", Span::mixed_site());

    let entries = arms.iter().map(|TagArm { kind, body }| match kind {
        Left(VariantArm { name, payload, .. }) => quote! {
            .on(#name, |#payload| #body)
        },
        Right(_) => quote! {
            .otherwise(|| #body)
        },
    });

    quote! {{
        let #tag_ident = #tag;
        let #table_ident = ::tunion::HandlerTable::for_tag(&#tag_ident) #(#entries)*;
        (#union).match_tag(#tag_ident, &#table_ident)
    }}
}
