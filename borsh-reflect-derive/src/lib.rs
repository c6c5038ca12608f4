//! # borsh-reflect Derive Macro
//!
//! Implements `BorshSchema` and `BorshReflect` for structs and enums.
//!
//! The macro only forwards what it sees: field names, field types and the
//! `#[borsh(skip)]` / `#[borsh(discriminant)]` markers. Whether a combination
//! of markers makes sense is decided by the annotation processor when the
//! descriptor is first built.
//!
//! Compatible with `syn 2.0`.

use proc_macro::TokenStream;
use proc_macro2::{Span, TokenStream as TokenStream2};
use quote::{format_ident, quote};
use syn::{
    Attribute, Data, DataEnum, DeriveInput, Fields, GenericParam, Generics, Ident, Index, Member,
    Type, parse_macro_input, parse_quote,
};

/// Derives `BorshSchema` and `BorshReflect`.
///
/// Supported field attributes:
/// - `#[borsh(skip)]`: not encoded; restored with `Default::default()`.
/// - `#[borsh(discriminant)]`: turns a struct into a union selecting one of
///   its other fields.
#[proc_macro_derive(Borsh, attributes(borsh))]
pub fn derive_borsh(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    match expand(input) {
        Ok(tokens) => tokens.into(),
        Err(e) => e.to_compile_error().into(),
    }
}

// --- Internal Data Structures ---

struct FieldInfo {
    member: Member,
    name: String,
    ty: Type,
    skip: bool,
    discriminant: bool,
}

impl FieldInfo {
    fn is_wire(&self) -> bool {
        !self.skip && !self.discriminant
    }

    /// Binding used when destructuring an enum variant.
    fn binding(&self) -> Ident {
        format_ident!("__{}", self.name)
    }
}

fn collect_fields(fields: &Fields) -> syn::Result<Vec<FieldInfo>> {
    fields
        .iter()
        .enumerate()
        .map(|(i, field)| {
            let (skip, discriminant) = parse_attributes(&field.attrs)?;
            let (member, name) = match &field.ident {
                Some(ident) => (Member::Named(ident.clone()), ident.to_string()),
                None => (Member::Unnamed(Index::from(i)), i.to_string()),
            };
            Ok(FieldInfo {
                member,
                name,
                ty: field.ty.clone(),
                skip,
                discriminant,
            })
        })
        .collect()
}

/// Parses attributes. Returns (skip, discriminant).
fn parse_attributes(attrs: &[Attribute]) -> syn::Result<(bool, bool)> {
    let mut skip = false;
    let mut discriminant = false;

    for attr in attrs {
        if attr.path().is_ident("borsh") {
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("skip") {
                    skip = true;
                    return Ok(());
                }

                if meta.path.is_ident("discriminant") {
                    discriminant = true;
                    return Ok(());
                }
                Err(meta.error("Unknown borsh attribute key. Supported: skip, discriminant"))
            })?;
        }
    }
    Ok((skip, discriminant))
}

fn add_bounds(mut generics: Generics) -> syn::Result<Generics> {
    for param in &mut generics.params {
        match param {
            GenericParam::Type(ty) => {
                ty.bounds.push(parse_quote!(::borsh_reflect::BorshReflect));
            }
            GenericParam::Lifetime(lt) => {
                return Err(syn::Error::new_spanned(
                    lt,
                    "Borsh types must be 'static; borrowed fields are not supported",
                ));
            }
            GenericParam::Const(_) => {}
        }
    }
    Ok(generics)
}

fn expand(input: DeriveInput) -> syn::Result<TokenStream2> {
    let name = &input.ident;
    let type_name = if input.generics.params.is_empty() {
        let s = name.to_string();
        quote! { #s }
    } else {
        quote! { ::borsh_reflect::rt::type_name::<Self>() }
    };

    let (schema_body, to_value_body, from_value_body) = match &input.data {
        Data::Struct(ds) => {
            let fields = collect_fields(&ds.fields)?;
            let schema = generate_struct_schema(&type_name, &fields);
            // A single discriminant makes a union. Any other marker count is
            // rejected when the descriptor is built, before a value is lowered.
            let selectors: Vec<&FieldInfo> =
                fields.iter().filter(|f| f.discriminant && !f.skip).collect();
            if let [selector] = selectors.as_slice() {
                (
                    schema,
                    generate_union_to_value(selector, &fields),
                    generate_union_from_value(&type_name, selector, &fields),
                )
            } else {
                (
                    schema,
                    generate_record_to_value(&fields),
                    generate_record_from_value(&type_name, &fields),
                )
            }
        }
        Data::Enum(de) => generate_enum(&type_name, de)?,
        Data::Union(_) => {
            return Err(syn::Error::new(
                name.span(),
                "Borsh cannot be derived for untagged unions; use an enum or a discriminant field",
            ));
        }
    };

    let generics = add_bounds(input.generics.clone())?;
    let (impl_generics, ty_generics, where_clause) = generics.split_for_impl();

    Ok(quote! {
        impl #impl_generics ::borsh_reflect::rt::BorshSchema for #name #ty_generics #where_clause {
            fn build_descriptor(
                builder: &mut ::borsh_reflect::rt::DescriptorBuilder,
            ) -> ::borsh_reflect::rt::Result<::borsh_reflect::rt::Descriptor> {
                #schema_body
            }
        }

        impl #impl_generics ::borsh_reflect::rt::BorshReflect for #name #ty_generics #where_clause {
            fn to_value(&self) -> ::borsh_reflect::rt::Value {
                #to_value_body
            }

            fn from_value(
                value: ::borsh_reflect::rt::Value,
            ) -> ::borsh_reflect::rt::Result<Self> {
                #from_value_body
            }
        }
    })
}

// --- Generator: descriptors ---

fn field_decls(fields: &[FieldInfo]) -> Vec<TokenStream2> {
    fields
        .iter()
        .map(|f| {
            let fname = &f.name;
            let ty = &f.ty;
            let skip = f.skip;
            let discriminant = f.discriminant;
            let markers = quote! {
                ::borsh_reflect::rt::Markers { skip: #skip, discriminant: #discriminant }
            };
            if f.skip {
                // The type of a skipped field is never described.
                quote! { ::borsh_reflect::rt::FieldDecl::undescribed(#fname, #markers) }
            } else {
                quote! { builder.field::<#ty>(#fname, #markers)? }
            }
        })
        .collect()
}

fn generate_struct_schema(type_name: &TokenStream2, fields: &[FieldInfo]) -> TokenStream2 {
    let decls = field_decls(fields);
    quote! {
        let fields = ::std::vec![#(#decls),*];
        builder.record(#type_name, fields)
    }
}

// --- Generator: records ---

fn generate_record_to_value(fields: &[FieldInfo]) -> TokenStream2 {
    let values = fields.iter().filter(|f| !f.skip).map(|f| {
        let member = &f.member;
        quote! { ::borsh_reflect::rt::BorshReflect::to_value(&self.#member) }
    });
    quote! {
        ::borsh_reflect::rt::Value::Record(::std::vec![#(#values),*])
    }
}

fn record_constructor(
    path: TokenStream2,
    type_name: &TokenStream2,
    fields: &[FieldInfo],
) -> TokenStream2 {
    let on_wire = fields.iter().filter(|f| !f.skip).count();
    let inits = fields.iter().map(|f| {
        let member = &f.member;
        let fname = &f.name;
        if f.skip {
            quote! { #member: ::core::default::Default::default() }
        } else {
            quote! { #member: ::borsh_reflect::rt::next_field(&mut fields, #fname)? }
        }
    });

    if on_wire == 0 {
        quote! {
            value.into_record(0, #type_name)?;
            Ok(#path { #(#inits),* })
        }
    } else {
        quote! {
            let mut fields = value.into_record(#on_wire, #type_name)?.into_iter();
            Ok(#path { #(#inits),* })
        }
    }
}

fn generate_record_from_value(type_name: &TokenStream2, fields: &[FieldInfo]) -> TokenStream2 {
    record_constructor(quote! { Self }, type_name, fields)
}

// --- Generator: union structs ---

fn generate_union_to_value(selector: &FieldInfo, fields: &[FieldInfo]) -> TokenStream2 {
    let selector_member = &selector.member;
    let selector_ty = &selector.ty;
    let arms = fields.iter().filter(|f| f.is_wire()).enumerate().map(|(i, f)| {
        let index = i as u64;
        let member = &f.member;
        quote! { #index => ::borsh_reflect::rt::BorshReflect::to_value(&self.#member) }
    });

    // An index with no variant is lowered anyway; the encoder rejects it.
    quote! {
        let index = <#selector_ty as ::borsh_reflect::rt::Discriminant>::to_index(&self.#selector_member);
        let payload = match index {
            #(#arms,)*
            _ => ::borsh_reflect::rt::Value::UNIT,
        };
        ::borsh_reflect::rt::Value::Union {
            discriminant: index,
            payload: ::std::boxed::Box::new(payload),
        }
    }
}

fn generate_union_from_value(
    type_name: &TokenStream2,
    selector: &FieldInfo,
    fields: &[FieldInfo],
) -> TokenStream2 {
    let selector_ty = &selector.ty;
    let variants: Vec<&FieldInfo> = fields.iter().filter(|f| f.is_wire()).collect();

    // Each arm decodes the selected payload; every other field takes its default.
    let arms = variants.iter().enumerate().map(|(i, selected)| {
        let index = i as u64;
        let inits = fields.iter().map(|f| {
            let member = &f.member;
            if f.name == selector.name {
                quote! { #member: <#selector_ty as ::borsh_reflect::rt::Discriminant>::from_index(index)? }
            } else if f.name == selected.name {
                quote! { #member: ::borsh_reflect::rt::BorshReflect::from_value(payload)? }
            } else {
                quote! { #member: ::core::default::Default::default() }
            }
        });
        quote! { #index => Ok(Self { #(#inits),* }) }
    });

    let payload = if variants.is_empty() {
        quote! { _ }
    } else {
        quote! { payload }
    };

    quote! {
        let (index, #payload) = value.into_union()?;
        match index {
            #(#arms,)*
            _ => Err(::borsh_reflect::rt::unknown_variant(#type_name, index)),
        }
    }
}

// --- Generator: enums ---

fn generate_enum(
    type_name: &TokenStream2,
    data: &DataEnum,
) -> syn::Result<(TokenStream2, TokenStream2, TokenStream2)> {
    if data.variants.len() > 256 {
        return Err(syn::Error::new(
            Span::call_site(),
            "Borsh enums are limited to 256 variants (u8 discriminant)",
        ));
    }

    let mut schema_variants = Vec::new();
    let mut to_value_arms = Vec::new();
    let mut from_value_arms = Vec::new();

    for (i, variant) in data.variants.iter().enumerate() {
        if let Some((_, expr)) = &variant.discriminant {
            return Err(syn::Error::new_spanned(
                expr,
                "explicit discriminant values are not supported; variants are numbered by position",
            ));
        }

        let ident = &variant.ident;
        let vname = ident.to_string();
        let fields = collect_fields(&variant.fields)?;
        if let Some(f) = fields.iter().find(|f| f.discriminant) {
            return Err(syn::Error::new_spanned(
                &f.ty,
                "#[borsh(discriminant)] is not allowed inside an enum variant",
            ));
        }

        let index = i as u64;

        let decls = field_decls(&fields);
        schema_variants.push(quote! { (#vname, ::std::vec![#(#decls),*]) });

        let patterns = fields.iter().filter(|f| f.is_wire()).map(|f| {
            let member = &f.member;
            let binding = f.binding();
            quote! { #member: #binding }
        });
        let values = fields.iter().filter(|f| f.is_wire()).map(|f| {
            let binding = f.binding();
            quote! { ::borsh_reflect::rt::BorshReflect::to_value(#binding) }
        });
        to_value_arms.push(quote! {
            Self::#ident { #(#patterns,)* .. } => ::borsh_reflect::rt::Value::Union {
                discriminant: #index,
                payload: ::std::boxed::Box::new(
                    ::borsh_reflect::rt::Value::Record(::std::vec![#(#values),*]),
                ),
            }
        });

        let payload_name = quote! { &::std::format!("{}::{}", #type_name, #vname) };
        let construct = record_constructor(quote! { Self::#ident }, &payload_name, &fields);
        from_value_arms.push(quote! {
            #index => {
                let value = payload;
                #construct
            }
        });
    }

    let schema = quote! {
        let variants = ::std::vec![#(#schema_variants),*];
        builder.enumeration(#type_name, variants)
    };

    // An empty enum has no values to lower.
    let to_value = if data.variants.is_empty() {
        quote! { match *self {} }
    } else {
        quote! {
            match self {
                #(#to_value_arms,)*
            }
        }
    };

    let payload = if data.variants.is_empty() {
        quote! { _ }
    } else {
        quote! { payload }
    };
    let from_value = quote! {
        let (index, #payload) = value.into_union()?;
        match index {
            #(#from_value_arms,)*
            _ => Err(::borsh_reflect::rt::unknown_variant(#type_name, index)),
        }
    };

    Ok((schema, to_value, from_value))
}
