// src/api.rs

//! The public entry points.
//!
//! [`Borsh`] exposes the common operations with default settings;
//! [`Borsh::builder`] returns a [`BorshOptions`] for the configurable ones.
//!
//! ```rust
//! use borsh_reflect::Borsh;
//!
//! let bytes = Borsh::serialize(&(1i64, 32i32))?;
//! assert_eq!(bytes.len(), 12);
//!
//! let back: (i64, i32) = Borsh::from_slice(&bytes)?;
//! assert_eq!(back, (1, 32));
//! # Ok::<(), borsh_reflect::BorshError>(())
//! ```

use crate::builder;
use crate::decoder::Decoder;
use crate::descriptor::Descriptor;
use crate::encoder::Encoder;
use crate::error::{BorshError, Result};
use crate::inspector::{Inspection, Inspector};
use crate::schema::BorshReflect;
use crate::value::Value;
use std::hash::Hasher;
use std::sync::Arc;
use twox_hash::XxHash64;

/// Default cap on the count of a collection whose elements encode to zero bytes.
pub const DEFAULT_MAX_ZERO_SIZED_LEN: usize = 64 * 1024;

/// Default cap on how deep a recursive type may nest.
pub const DEFAULT_MAX_DEPTH: usize = 256;

/// Configuration shared by encode and decode calls.
#[derive(Debug, Clone)]
pub struct BorshOptions {
    pub(crate) canonical_maps: bool,
    pub(crate) max_zero_sized_len: usize,
    pub(crate) max_depth: usize,
}

impl Default for BorshOptions {
    fn default() -> Self {
        Self {
            canonical_maps: true,
            max_zero_sized_len: DEFAULT_MAX_ZERO_SIZED_LEN,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl BorshOptions {
    /// Default options: canonical map ordering, 64 Ki zero-sized elements,
    /// recursive types nested up to 256 deep.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sort map pairs and set elements by their encoded key bytes.
    ///
    /// When disabled, entries are written in traversal order, so two maps
    /// with equal contents may encode differently.
    pub fn canonical_maps(mut self, enabled: bool) -> Self {
        self.canonical_maps = enabled;
        self
    }

    /// Caps the count of collections whose elements have no minimal size.
    ///
    /// Longer collections fail to encode with `Unsupported` and to decode
    /// with `Malformed`.
    pub fn max_zero_sized_len(mut self, limit: usize) -> Self {
        self.max_zero_sized_len = limit;
        self
    }

    /// Caps how many times a recursive type may contain itself along one path.
    ///
    /// Only links into recursive types count, so ordinary nesting is free.
    pub fn max_depth(mut self, limit: usize) -> Self {
        self.max_depth = limit;
        self
    }

    /// Encodes `value` into a new buffer.
    pub fn serialize<T: BorshReflect>(&self, value: &T) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        self.serialize_into(value, &mut out)?;
        Ok(out)
    }

    /// Appends the encoding of `value` to `out`.
    ///
    /// On error `out` is restored to its previous length.
    pub fn serialize_into<T: BorshReflect>(&self, value: &T, out: &mut Vec<u8>) -> Result<()> {
        let descriptor = builder::describe::<T>()?;
        self.encode_value_into(&value.to_value(), &descriptor, out)
    }

    /// Decodes a `T` from the start of `bytes` into `target`.
    ///
    /// Returns the number of bytes consumed; trailing input is left for the
    /// caller to judge. `target` is only written on success.
    pub fn deserialize<T: BorshReflect>(&self, target: &mut T, bytes: &[u8]) -> Result<usize> {
        let (value, consumed) = self.from_prefix::<T>(bytes)?;
        *target = value;
        Ok(consumed)
    }

    /// Decodes a `T` from the start of `bytes`, returning it with the byte count consumed.
    pub fn from_prefix<T: BorshReflect>(&self, bytes: &[u8]) -> Result<(T, usize)> {
        let descriptor = builder::describe::<T>()?;
        let (value, consumed) = self.decode_value(bytes, &descriptor)?;
        Ok((T::from_value(value)?, consumed))
    }

    /// Decodes a `T` that must occupy all of `bytes`.
    pub fn from_slice<T: BorshReflect>(&self, bytes: &[u8]) -> Result<T> {
        let (value, consumed) = self.from_prefix::<T>(bytes)?;
        if consumed != bytes.len() {
            return Err(BorshError::TrailingBytes {
                consumed,
                total: bytes.len(),
            });
        }
        Ok(value)
    }

    /// Encodes a dynamic value against an explicit descriptor.
    pub fn encode_value(&self, value: &Value, descriptor: &Descriptor) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        self.encode_value_into(value, descriptor, &mut out)?;
        Ok(out)
    }

    fn encode_value_into(
        &self,
        value: &Value,
        descriptor: &Descriptor,
        out: &mut Vec<u8>,
    ) -> Result<()> {
        let start = out.len();
        let result = Encoder::new(out, self).encode(value, descriptor);
        if let Err(e) = &result {
            tracing::debug!(type_name = descriptor.name(), error = %e, "encode failed");
            out.truncate(start);
        } else {
            tracing::trace!(type_name = descriptor.name(), bytes = out.len() - start, "encoded");
        }
        result
    }

    /// Decodes a dynamic value from the start of `bytes`.
    ///
    /// Returns the value and the number of bytes consumed.
    pub fn decode_value(&self, bytes: &[u8], descriptor: &Descriptor) -> Result<(Value, usize)> {
        let mut decoder = Decoder::new(bytes, self);
        match decoder.decode(descriptor) {
            Ok(value) => {
                tracing::trace!(
                    type_name = descriptor.name(),
                    consumed = decoder.position(),
                    "decoded"
                );
                Ok((value, decoder.position()))
            }
            Err(e) => {
                tracing::debug!(
                    type_name = descriptor.name(),
                    offset = decoder.position(),
                    error = %e,
                    "decode failed"
                );
                Err(e)
            }
        }
    }

    /// Hashes the encoding of `value` with XxHash64 (seed 0).
    ///
    /// Only stable across map instances while canonical maps are enabled.
    pub fn fingerprint<T: BorshReflect>(&self, value: &T) -> Result<u64> {
        let bytes = self.serialize(value)?;
        let mut hasher = XxHash64::with_seed(0);
        hasher.write(&bytes);
        Ok(hasher.finish())
    }

    /// Produces a byte-span report of `bytes` read as a `T`.
    pub fn inspect<T: BorshReflect>(&self, bytes: &[u8]) -> Result<Inspection> {
        let descriptor = builder::describe::<T>()?;
        Inspector::new(self).inspect(bytes, &descriptor)
    }
}

/// The main entry point, using default [`BorshOptions`].
#[derive(Debug)]
pub struct Borsh;

impl Borsh {
    /// Starts a configured pipeline.
    ///
    /// ```rust
    /// use borsh_reflect::Borsh;
    /// use std::collections::HashMap;
    ///
    /// let map: HashMap<u8, bool> = [(2, true), (1, false)].into();
    /// let bytes = Borsh::builder().canonical_maps(true).serialize(&map)?;
    /// assert_eq!(bytes, [2, 0, 0, 0, 1, 0, 2, 1]);
    /// # Ok::<(), borsh_reflect::BorshError>(())
    /// ```
    pub fn builder() -> BorshOptions {
        BorshOptions::new()
    }

    /// Encodes `value`.
    pub fn serialize<T: BorshReflect>(value: &T) -> Result<Vec<u8>> {
        BorshOptions::default().serialize(value)
    }

    /// Appends the encoding of `value` to `out`.
    pub fn serialize_into<T: BorshReflect>(value: &T, out: &mut Vec<u8>) -> Result<()> {
        BorshOptions::default().serialize_into(value, out)
    }

    /// Decodes into `target` from the start of `bytes`, returning bytes consumed.
    pub fn deserialize<T: BorshReflect>(target: &mut T, bytes: &[u8]) -> Result<usize> {
        BorshOptions::default().deserialize(target, bytes)
    }

    /// Decodes a `T` from the start of `bytes`, returning it with the bytes consumed.
    pub fn from_prefix<T: BorshReflect>(bytes: &[u8]) -> Result<(T, usize)> {
        BorshOptions::default().from_prefix(bytes)
    }

    /// Decodes a `T` that must occupy all of `bytes`.
    pub fn from_slice<T: BorshReflect>(bytes: &[u8]) -> Result<T> {
        BorshOptions::default().from_slice(bytes)
    }

    /// Returns the cached descriptor for `T`.
    pub fn describe<T: BorshReflect>() -> Result<Arc<Descriptor>> {
        builder::describe::<T>()
    }

    /// Encodes a dynamic value against an explicit descriptor.
    pub fn encode_value(value: &Value, descriptor: &Descriptor) -> Result<Vec<u8>> {
        BorshOptions::default().encode_value(value, descriptor)
    }

    /// Decodes a dynamic value, returning it with the bytes consumed.
    pub fn decode_value(bytes: &[u8], descriptor: &Descriptor) -> Result<(Value, usize)> {
        BorshOptions::default().decode_value(bytes, descriptor)
    }

    /// Hashes the canonical encoding of `value`.
    pub fn fingerprint<T: BorshReflect>(value: &T) -> Result<u64> {
        BorshOptions::default().fingerprint(value)
    }

    /// Produces a byte-span report of `bytes` read as a `T`.
    pub fn inspect<T: BorshReflect>(bytes: &[u8]) -> Result<Inspection> {
        BorshOptions::default().inspect::<T>(bytes)
    }
}
