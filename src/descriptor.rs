// src/descriptor.rs

//! The type-shape model shared by the encoder and the decoder.
//!
//! A [`Descriptor`] is the engine's plan for one type: which wire layout it
//! uses and, for composites, the descriptors of its parts. Descriptors are
//! immutable once built and shared through `Arc`, so a composite never owns
//! its children exclusively.
//!
//! ## Layouts
//!
//! ```text
//! Integer(W)      W bytes, little-endian, two's complement when signed
//! Float(W)        IEEE-754, little-endian
//! Bool            1 byte, 0x00 | 0x01
//! String          u32 length N, N UTF-8 bytes
//! Array[N] of T   N encodings of T, no prefix
//! Sequence of T   u32 count N, N encodings of T
//! Optional T      u8 flag, encoding of T iff flag == 1
//! Map K -> V      u32 count N, N (K, V) pairs
//! Set of K        u32 count N, N encodings of K
//! Record          wire fields in declaration order
//! Union           discriminant, then the selected variant only
//! Ref             the layout of the type it links to
//! ```
//!
//! A recursive type such as `struct Node { next: Option<Box<Node>> }` reaches
//! itself through a [`Kind::Ref`]: a link created while `Node` was still being
//! built and resolved once its descriptor is finished.

use crate::error::{BorshError, Result};
use serde::Serialize;
use std::fmt;
use std::sync::{Arc, OnceLock};

/// The closed set of wire layouts.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Kind {
    /// Fixed-width integer. `width` is in bytes.
    Integer {
        /// Width in bytes (1, 2, 4, 8 or 16).
        width: u8,
        /// Two's complement when `true`.
        signed: bool,
    },
    /// IEEE-754 float. `width` is in bytes (4 or 8).
    Float {
        /// Width in bytes.
        width: u8,
    },
    /// One byte, 0 or 1.
    Bool,
    /// Length-prefixed UTF-8.
    String,
    /// Fixed number of elements, no prefix.
    Array {
        /// Element count, part of the type.
        len: usize,
        /// Element descriptor.
        element: Arc<Descriptor>,
    },
    /// Count-prefixed elements.
    Sequence {
        /// Element descriptor.
        element: Arc<Descriptor>,
    },
    /// Presence byte followed by the inner value when present.
    Optional {
        /// Descriptor of the present value.
        inner: Arc<Descriptor>,
    },
    /// Count-prefixed key/value pairs.
    Map {
        /// Key descriptor.
        key: Arc<Descriptor>,
        /// Value descriptor.
        value: Arc<Descriptor>,
    },
    /// Count-prefixed keys.
    Set {
        /// Element descriptor.
        element: Arc<Descriptor>,
    },
    /// Ordered fields.
    Record {
        /// Fields in declaration order, skipped ones included.
        fields: Vec<Field>,
    },
    /// Record with a discriminant selecting exactly one payload field.
    Union {
        /// The selector. Its descriptor is always an unsigned integer.
        discriminant: Field,
        /// Payload fields; discriminant `N` selects `variants[N]`.
        variants: Vec<Field>,
        /// Fields excluded from the wire.
        skipped: Vec<Field>,
    },
    /// Link to an enclosing type that refers to itself through indirection.
    Ref(DescriptorRef),
}

/// A late-bound link to the descriptor of a recursive type.
///
/// Clones share one slot, filled once when the linked type finishes building.
#[derive(Clone, Serialize)]
pub struct DescriptorRef {
    target: String,
    #[serde(skip)]
    slot: Arc<OnceLock<Arc<Descriptor>>>,
}

impl DescriptorRef {
    pub(crate) fn new(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            slot: Arc::new(OnceLock::new()),
        }
    }

    /// Name of the linked type.
    pub fn target(&self) -> &str {
        &self.target
    }

    /// The linked descriptor, once it has been built.
    pub fn get(&self) -> Option<&Arc<Descriptor>> {
        self.slot.get()
    }

    /// The linked descriptor.
    ///
    /// # Errors
    ///
    /// [`BorshError::Descriptor`] if the linked type never finished building.
    pub fn resolve(&self) -> Result<&Descriptor> {
        self.slot.get().map(|d| &**d).ok_or_else(|| {
            BorshError::Descriptor(format!("unresolved link to {}", self.target))
        })
    }

    pub(crate) fn fill(&self, descriptor: Arc<Descriptor>) {
        // A second fill would come from a rebuilt descriptor of the same type.
        let _ = self.slot.set(descriptor);
    }
}

// Links compare by slot identity: comparing the linked trees would recurse.
impl PartialEq for DescriptorRef {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.slot, &other.slot)
    }
}

impl fmt::Debug for DescriptorRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DescriptorRef")
            .field("target", &self.target)
            .field("resolved", &self.slot.get().is_some())
            .finish()
    }
}

/// Role of a field inside a record, fixed at descriptor-build time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldRole {
    /// Ordinary field (or union variant payload).
    Wire,
    /// Excluded from the wire; default value on decode.
    Skip,
    /// The union selector.
    Discriminant,
}

/// One named field of a record or union.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Field {
    /// Field name as declared (`"0"`, `"1"`, ... for tuple fields).
    pub name: String,
    /// The field's descriptor. `None` only for skipped fields.
    pub descriptor: Option<Arc<Descriptor>>,
    /// What the field does on the wire.
    pub role: FieldRole,
}

impl Field {
    /// Returns `true` if the field contributes bytes.
    pub fn is_wire(&self) -> bool {
        self.role != FieldRole::Skip
    }

    /// Returns `true` if the field carries the skip marker.
    pub fn is_skip(&self) -> bool {
        self.role == FieldRole::Skip
    }

    /// Returns `true` if the field is a union discriminant.
    pub fn is_discriminant(&self) -> bool {
        self.role == FieldRole::Discriminant
    }
}

/// An immutable, shareable plan for encoding and decoding one type.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Descriptor {
    name: String,
    #[serde(flatten)]
    kind: Kind,
    min_size: usize,
}

impl Descriptor {
    /// Creates a descriptor and precomputes its minimal wire size.
    pub fn new(name: impl Into<String>, kind: Kind) -> Self {
        let min_size = min_wire_size(&kind);
        Self {
            name: name.into(),
            kind,
            min_size,
        }
    }

    /// Unsigned integer of `width` bytes.
    pub fn unsigned(name: impl Into<String>, width: u8) -> Self {
        Self::new(
            name,
            Kind::Integer {
                width,
                signed: false,
            },
        )
    }

    /// Signed integer of `width` bytes.
    pub fn signed(name: impl Into<String>, width: u8) -> Self {
        Self::new(
            name,
            Kind::Integer {
                width,
                signed: true,
            },
        )
    }

    /// The type name the descriptor was built for.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The wire layout.
    pub fn kind(&self) -> &Kind {
        &self.kind
    }

    /// The fewest bytes any value of this type can encode to.
    ///
    /// The decoder uses it to reject length prefixes that cannot fit in the
    /// remaining input before allocating. A link reports its target's size.
    pub fn min_size(&self) -> usize {
        match &self.kind {
            Kind::Ref(link) => link.get().map_or(0, |d| d.min_size),
            _ => self.min_size,
        }
    }

    /// Short name of the layout, used in diagnostics.
    pub fn kind_name(&self) -> &'static str {
        match self.kind {
            Kind::Integer { signed: true, .. } => "signed integer",
            Kind::Integer { signed: false, .. } => "unsigned integer",
            Kind::Float { .. } => "float",
            Kind::Bool => "bool",
            Kind::String => "string",
            Kind::Array { .. } => "array",
            Kind::Sequence { .. } => "sequence",
            Kind::Optional { .. } => "optional",
            Kind::Map { .. } => "map",
            Kind::Set { .. } => "set",
            Kind::Record { .. } => "record",
            Kind::Union { .. } => "union",
            Kind::Ref(_) => "link",
        }
    }

    /// Iterates over the fields that contribute bytes, in wire order.
    ///
    /// Empty for non-record kinds.
    pub fn wire_fields(&self) -> impl Iterator<Item = &Field> {
        let fields: &[Field] = match &self.kind {
            Kind::Record { fields } => fields,
            _ => &[],
        };
        fields.iter().filter(|f| f.is_wire())
    }
}

fn field_min(field: &Field) -> usize {
    field.descriptor.as_ref().map_or(0, |d| d.min_size)
}

fn min_wire_size(kind: &Kind) -> usize {
    match kind {
        Kind::Integer { width, .. } | Kind::Float { width } => usize::from(*width),
        Kind::Bool | Kind::Optional { .. } => 1,
        Kind::String | Kind::Sequence { .. } | Kind::Map { .. } | Kind::Set { .. } => 4,
        Kind::Array { len, element } => len.saturating_mul(element.min_size),
        Kind::Record { fields } => fields
            .iter()
            .filter(|f| f.is_wire())
            .map(field_min)
            .fold(0, usize::saturating_add),
        Kind::Union {
            discriminant,
            variants,
            ..
        } => field_min(discriminant)
            .saturating_add(variants.iter().map(field_min).min().unwrap_or(0)),
        // Unknown until the link is filled; `Descriptor::min_size` looks through it.
        Kind::Ref(_) => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field(name: &str, descriptor: Descriptor, role: FieldRole) -> Field {
        Field {
            name: name.into(),
            descriptor: Some(Arc::new(descriptor)),
            role,
        }
    }

    #[test]
    fn min_size_follows_layout() {
        let i32d = Arc::new(Descriptor::signed("i32", 4));
        let array = Descriptor::new(
            "[i32; 3]",
            Kind::Array {
                len: 3,
                element: i32d.clone(),
            },
        );
        assert_eq!(array.min_size(), 12);

        let seq = Descriptor::new("Vec<i32>", Kind::Sequence { element: i32d });
        assert_eq!(seq.min_size(), 4);
    }

    #[test]
    fn record_min_size_ignores_skipped_fields() {
        let record = Descriptor::new(
            "Skipped",
            Kind::Record {
                fields: vec![
                    field("a", Descriptor::signed("i64", 8), FieldRole::Wire),
                    Field {
                        name: "b".into(),
                        descriptor: None,
                        role: FieldRole::Skip,
                    },
                    field("c", Descriptor::signed("i64", 8), FieldRole::Wire),
                ],
            },
        );
        assert_eq!(record.min_size(), 16);
        assert_eq!(record.wire_fields().count(), 2);
    }

    #[test]
    fn union_min_size_takes_smallest_variant() {
        let union = Descriptor::new(
            "U",
            Kind::Union {
                discriminant: field("tag", Descriptor::unsigned("u8", 1), FieldRole::Discriminant),
                variants: vec![
                    field("big", Descriptor::unsigned("u64", 8), FieldRole::Wire),
                    field("small", Descriptor::new("bool", Kind::Bool), FieldRole::Wire),
                ],
                skipped: Vec::new(),
            },
        );
        assert_eq!(union.min_size(), 2);
    }

    #[test]
    fn link_reports_its_target_once_filled() {
        let link = DescriptorRef::new("Node");
        let d = Descriptor::new("Node", Kind::Ref(link.clone()));
        assert_eq!(d.min_size(), 0);
        assert!(matches!(link.resolve(), Err(BorshError::Descriptor(_))));

        link.fill(Arc::new(Descriptor::unsigned("u32", 4)));
        assert_eq!(d.min_size(), 4);
        assert_eq!(link.resolve().unwrap().name(), "u32");
        assert_eq!(d.kind(), &Kind::Ref(link));
        assert_ne!(d.kind(), &Kind::Ref(DescriptorRef::new("Node")));
    }
}
