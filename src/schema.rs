// src/schema.rs

//! Traits connecting Rust types to the descriptor-driven engine.
//!
//! The engine never inspects a Rust value directly. A type describes its
//! shape once through [`BorshSchema`] and converts itself to and from the
//! engine's [`Value`] tree through [`BorshReflect`]. `#[derive(Borsh)]`
//! implements both.

use crate::builder::DescriptorBuilder;
use crate::descriptor::Descriptor;
use crate::error::{BorshError, Result};
use crate::value::Value;

/// A type with a known wire shape.
///
/// Implementations describe their parts through the builder so that nested
/// descriptors are shared and cycles are caught.
pub trait BorshSchema: 'static {
    /// Builds the descriptor for `Self`.
    ///
    /// Called at most once per type in the common case; use
    /// [`describe`](crate::describe) to obtain the cached result.
    fn build_descriptor(builder: &mut DescriptorBuilder) -> Result<Descriptor>;
}

/// A type that can be lowered to, and rebuilt from, a [`Value`].
pub trait BorshReflect: BorshSchema + Sized {
    /// Lowers `self` into a value tree matching its descriptor.
    fn to_value(&self) -> Value;

    /// Rebuilds `Self` from a value tree produced by the decoder.
    ///
    /// # Errors
    ///
    /// [`BorshError::Mismatch`] if the value does not have `Self`'s shape,
    /// [`BorshError::Malformed`] if it is shaped right but impossible (e.g.
    /// duplicate map keys).
    fn from_value(value: Value) -> Result<Self>;
}

/// An unsigned integer type usable as a union selector.
pub trait Discriminant: BorshSchema + Sized {
    /// Position of the selected variant.
    fn to_index(&self) -> u64;

    /// Converts a decoded position back into the field type.
    fn from_index(index: u64) -> Result<Self>;
}

macro_rules! impl_discriminant {
    ($($t:ty),*) => {
        $(
            impl Discriminant for $t {
                fn to_index(&self) -> u64 {
                    u64::from(*self)
                }

                fn from_index(index: u64) -> Result<Self> {
                    <$t>::try_from(index).map_err(|_| {
                        BorshError::Malformed(format!(
                            "discriminant {index} does not fit in {}",
                            stringify!($t)
                        ))
                    })
                }
            }
        )*
    }
}

impl_discriminant!(u8, u16, u32, u64);
