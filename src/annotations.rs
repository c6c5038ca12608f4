// src/annotations.rs

//! Interprets the per-field markers declared on a record.
//!
//! The derive macro forwards `#[borsh(skip)]` and `#[borsh(discriminant)]`
//! as [`Markers`] without judging them; this module partitions the fields and
//! rejects inconsistent combinations, so a bad annotation fails descriptor
//! construction instead of an individual encode or decode call.

use crate::descriptor::{Descriptor, Field, FieldRole, Kind};
use crate::error::{BorshError, Result};
use std::sync::Arc;

/// Markers declared on one field.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Markers {
    /// Exclude the field from the wire.
    pub skip: bool,
    /// The field selects the active union variant.
    pub discriminant: bool,
}

impl Markers {
    /// No markers.
    pub const NONE: Self = Self {
        skip: false,
        discriminant: false,
    };

    /// `#[borsh(skip)]`.
    pub const SKIP: Self = Self {
        skip: true,
        discriminant: false,
    };

    /// `#[borsh(discriminant)]`.
    pub const DISCRIMINANT: Self = Self {
        skip: false,
        discriminant: true,
    };
}

/// A field as declared, before validation.
#[derive(Debug, Clone)]
pub struct FieldDecl {
    /// Declared name.
    pub name: String,
    /// Descriptor of the field type; skipped fields may omit it.
    pub descriptor: Option<Arc<Descriptor>>,
    /// Declared markers.
    pub markers: Markers,
}

impl FieldDecl {
    /// A field whose type has been described.
    pub fn new(name: impl Into<String>, descriptor: Arc<Descriptor>, markers: Markers) -> Self {
        Self {
            name: name.into(),
            descriptor: Some(descriptor),
            markers,
        }
    }

    /// A field whose type is never described.
    pub fn undescribed(name: impl Into<String>, markers: Markers) -> Self {
        Self {
            name: name.into(),
            descriptor: None,
            markers,
        }
    }
}

/// Partitions `decls` into skip fields, at most one discriminant and wire fields.
///
/// Returns [`Kind::Union`] when a discriminant is present, [`Kind::Record`]
/// otherwise.
///
/// # Errors
///
/// [`BorshError::Descriptor`] when a field is both skipped and a discriminant,
/// when more than one discriminant is declared, when the discriminant is not
/// an unsigned integer, when a union has no variants or more variants than its
/// discriminant can select, or when a wire field has no descriptor.
pub fn process(type_name: &str, decls: Vec<FieldDecl>) -> Result<Kind> {
    let mut fields = Vec::with_capacity(decls.len());
    let mut discriminant_at: Option<usize> = None;

    for decl in decls {
        let FieldDecl {
            name,
            descriptor,
            markers,
        } = decl;

        if markers.skip && markers.discriminant {
            return Err(invalid(
                type_name,
                format!("field `{name}` cannot be both skipped and a discriminant"),
            ));
        }

        if markers.skip {
            fields.push(Field {
                name,
                descriptor,
                role: FieldRole::Skip,
            });
            continue;
        }

        let Some(descriptor) = descriptor else {
            return Err(invalid(type_name, format!("field `{name}` has no descriptor")));
        };

        let role = if markers.discriminant {
            if let Some(first) = discriminant_at.and_then(|i| fields.get(i)) {
                return Err(invalid(
                    type_name,
                    format!(
                        "fields `{}` and `{name}` are both marked as discriminant",
                        first.name
                    ),
                ));
            }
            if !matches!(descriptor.kind(), Kind::Integer { signed: false, .. }) {
                return Err(invalid(
                    type_name,
                    format!(
                        "discriminant `{name}` must be an unsigned integer, found {}",
                        descriptor.kind_name()
                    ),
                ));
            }
            discriminant_at = Some(fields.len());
            FieldRole::Discriminant
        } else {
            FieldRole::Wire
        };

        fields.push(Field {
            name,
            descriptor: Some(descriptor),
            role,
        });
    }

    let Some(at) = discriminant_at else {
        return Ok(Kind::Record { fields });
    };

    let discriminant = fields.remove(at);
    let (variants, skipped): (Vec<Field>, Vec<Field>) =
        fields.into_iter().partition(Field::is_wire);

    if variants.is_empty() {
        return Err(invalid(
            type_name,
            format!("union selected by `{}` has no variant fields", discriminant.name),
        ));
    }

    let width = match discriminant.descriptor.as_deref().map(Descriptor::kind) {
        Some(Kind::Integer { width, .. }) => u32::from(*width),
        _ => 0,
    };
    let selectable = 1u128.checked_shl(width * 8).unwrap_or(u128::MAX);
    if variants.len() as u128 > selectable {
        return Err(invalid(
            type_name,
            format!(
                "{} variants cannot be selected by a {width}-byte discriminant",
                variants.len()
            ),
        ));
    }

    Ok(Kind::Union {
        discriminant,
        variants,
        skipped,
    })
}

fn invalid(type_name: &str, reason: String) -> BorshError {
    tracing::warn!(type_name, %reason, "rejected field annotations");
    BorshError::Descriptor(format!("{type_name}: {reason}"))
}
