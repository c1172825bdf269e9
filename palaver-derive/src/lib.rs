//! Derive macros for the Palaver tool-calling client

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::ext::IdentExt;
use syn::meta::ParseNestedMeta;
use syn::{
    parse_macro_input, token, Attribute, Data, DeriveInput, Expr, ExprLit, Fields, Lit, LitStr,
    Meta, Path, Token, Type,
};

/// Derive macro for the `ToolParameters` trait
///
/// Describes each named field of a struct as a tool parameter, so the struct
/// can be the argument of a tool function. The struct also becomes usable as
/// an `object` typed field of another parameter struct.
///
/// # Example
///
/// ```rust,ignore
/// use palaver_tools::{Optional, ToolParameters};
/// use serde::Deserialize;
///
/// #[derive(Deserialize, ToolParameters)]
/// struct Forecast {
///     #[tool(description = "city to report on")]
///     city: String,
///     /// Number of days ahead
///     days: Optional<u8>,
///     #[tool(rename = "")]
///     internal: Optional<String>,
/// }
/// ```
///
/// Field attributes, under `#[tool(..)]`:
///
/// - `rename = "name"`: advertised parameter name; arguments under this name
///   are decoded into the field. An empty name skips the field
/// - `description = "text"`: parameter description (doc comments are the fallback)
/// - `type = "name"`: explicit parameter type instead of the inferred one
/// - `flatten`: merge the parameters of an embedded struct
/// - `skip`: leave the field out
///
/// `#[serde(rename = "..")]`, `#[serde(flatten)]` and `#[serde(skip)]` are
/// honored as well. Generated code refers to `::palaver_tools`; use
/// `#[tool(crate = "palaver::tools")]` on the struct when depending on the
/// facade crate only.
#[proc_macro_derive(ToolParameters, attributes(tool))]
pub fn derive_tool_parameters(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    expand(input)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}

fn expand(input: DeriveInput) -> syn::Result<TokenStream2> {
    let krate = crate_path(&input.attrs)?;
    let name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(fields) => &fields.named,
            Fields::Unit => {
                return Ok(quote! {
                    impl #impl_generics #krate::ToolParameters for #name #ty_generics #where_clause {
                        fn parameters() -> ::std::vec::Vec<#krate::ParameterField> {
                            ::std::vec::Vec::new()
                        }
                    }
                })
            }
            Fields::Unnamed(_) => {
                return Err(syn::Error::new_spanned(
                    &input,
                    "ToolParameters can only be derived for structs with named fields",
                ))
            }
        },
        _ => {
            return Err(syn::Error::new_spanned(
                &input,
                "ToolParameters can only be derived for structs",
            ))
        }
    };

    let mut pushes = Vec::new();
    for field in fields {
        let attrs = FieldAttrs::parse(&field.attrs)?;
        if attrs.skip {
            continue;
        }
        let ty = &field.ty;

        if attrs.flatten {
            pushes.push(quote! {
                fields.extend(<#ty as #krate::ToolParameters>::parameters());
            });
            continue;
        }

        // serde's name is what arguments decode from; `tool(rename)` only
        // changes what the model is told.
        let decode_key = match (attrs.serde_rename, &field.ident) {
            (Some(rename), _) => rename,
            (None, Some(ident)) => ident.unraw().to_string(),
            (None, None) => continue,
        };
        let param_name = match attrs.rename {
            Some(rename) if rename.is_empty() => continue,
            Some(rename) => rename,
            None => decode_key.clone(),
        };
        let key = if param_name == decode_key {
            quote! { ::std::option::Option::None }
        } else {
            quote! { ::std::option::Option::Some(::std::string::String::from(#decode_key)) }
        };

        let description = match attrs.description.or(attrs.doc) {
            Some(text) => quote! { ::std::option::Option::Some(::std::string::String::from(#text)) },
            None => quote! { ::std::option::Option::None },
        };

        // An explicit type lets fields of foreign types skip `ParamType`.
        let (kind, optional) = match attrs.kind {
            Some(kind) => {
                let optional = is_optional_syntax(ty);
                (
                    quote! { ::std::option::Option::Some(#krate::PropertyType::from(#kind)) },
                    quote! { #optional },
                )
            }
            None => (
                quote! { <#ty as #krate::ParamType>::param_type() },
                quote! { <#ty as #krate::ParamType>::is_optional() },
            ),
        };

        pushes.push(quote! {
            fields.push(#krate::ParameterField {
                name: ::std::string::String::from(#param_name),
                kind: #kind,
                description: #description,
                optional: #optional,
                key: #key,
            });
        });
    }

    let body = if pushes.is_empty() {
        quote! { ::std::vec::Vec::new() }
    } else {
        quote! {
            let mut fields = ::std::vec::Vec::new();
            #(#pushes)*
            fields
        }
    };

    Ok(quote! {
        impl #impl_generics #krate::ToolParameters for #name #ty_generics #where_clause {
            fn parameters() -> ::std::vec::Vec<#krate::ParameterField> {
                #body
            }
        }

        impl #impl_generics #krate::ParamType for #name #ty_generics #where_clause {
            fn param_type() -> ::std::option::Option<#krate::PropertyType> {
                ::std::option::Option::Some(#krate::PropertyType::Object)
            }
        }
    })
}

#[derive(Default)]
struct FieldAttrs {
    rename: Option<String>,
    serde_rename: Option<String>,
    description: Option<String>,
    doc: Option<String>,
    kind: Option<String>,
    flatten: bool,
    skip: bool,
}

impl FieldAttrs {
    fn parse(attrs: &[Attribute]) -> syn::Result<Self> {
        let mut out = FieldAttrs::default();
        let mut tool_rename = None;
        let mut serde_rename = None;
        let mut doc_lines = Vec::new();

        for attr in attrs {
            if attr.path().is_ident("tool") {
                attr.parse_nested_meta(|meta| {
                    if meta.path.is_ident("rename") {
                        tool_rename = Some(string_value(&meta)?);
                    } else if meta.path.is_ident("description") {
                        out.description = Some(string_value(&meta)?);
                    } else if meta.path.is_ident("type") {
                        out.kind = Some(string_value(&meta)?);
                    } else if meta.path.is_ident("flatten") {
                        out.flatten = true;
                    } else if meta.path.is_ident("skip") {
                        out.skip = true;
                    } else {
                        return Err(meta.error("unsupported tool attribute"));
                    }
                    Ok(())
                })?;
            } else if attr.path().is_ident("serde") {
                attr.parse_nested_meta(|meta| {
                    if meta.path.is_ident("rename") && meta.input.peek(Token![=]) {
                        serde_rename = Some(string_value(&meta)?);
                    } else if meta.path.is_ident("flatten") {
                        out.flatten = true;
                    } else if meta.path.is_ident("skip") || meta.path.is_ident("skip_deserializing")
                    {
                        out.skip = true;
                    } else {
                        skip_value(&meta)?;
                    }
                    Ok(())
                })?;
            } else if attr.path().is_ident("doc") {
                if let Meta::NameValue(nv) = &attr.meta {
                    if let Expr::Lit(ExprLit {
                        lit: Lit::Str(line),
                        ..
                    }) = &nv.value
                    {
                        doc_lines.push(line.value().trim().to_string());
                    }
                }
            }
        }

        out.rename = tool_rename;
        out.serde_rename = serde_rename;
        let doc = doc_lines.join(" ").trim().to_string();
        if !doc.is_empty() {
            out.doc = Some(doc);
        }
        Ok(out)
    }
}

fn crate_path(attrs: &[Attribute]) -> syn::Result<Path> {
    let mut path = None;
    for attr in attrs {
        if attr.path().is_ident("tool") {
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("crate") {
                    let lit: LitStr = meta.value()?.parse()?;
                    path = Some(lit.parse::<Path>()?);
                    Ok(())
                } else {
                    Err(meta.error("unsupported tool attribute"))
                }
            })?;
        }
    }
    Ok(path.unwrap_or_else(|| syn::parse_quote!(::palaver_tools)))
}

fn string_value(meta: &ParseNestedMeta) -> syn::Result<String> {
    let lit: LitStr = meta.value()?.parse()?;
    Ok(lit.value())
}

// Consume the value of a serde option we do not interpret.
fn skip_value(meta: &ParseNestedMeta) -> syn::Result<()> {
    if meta.input.peek(Token![=]) {
        let _: Expr = meta.value()?.parse()?;
    } else if meta.input.peek(token::Paren) {
        meta.parse_nested_meta(|inner| skip_value(&inner))?;
    }
    Ok(())
}

fn is_optional_syntax(ty: &Type) -> bool {
    if let Type::Path(type_path) = ty {
        if let Some(segment) = type_path.path.segments.last() {
            return segment.ident == "Option" || segment.ident == "Optional";
        }
    }
    false
}
