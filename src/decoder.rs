// src/decoder.rs

//! The read-side engine.
//!
//! Walks a [`Descriptor`] over an input buffer with a single forward cursor
//! shared by the whole recursive decode. Every read is bounds-checked, and
//! every length prefix is checked against the bytes that remain before any
//! allocation happens. Links into recursive types are followed at most
//! `max_depth` times deep, so hostile nesting cannot exhaust the stack.

use crate::api::BorshOptions;
use crate::descriptor::{Descriptor, DescriptorRef, Field, Kind};
use crate::error::{BorshError, Result};
use crate::value::Value;
use crate::wire::Reader;

/// Decodes values from an in-memory buffer.
#[derive(Debug)]
pub struct Decoder<'a> {
    reader: Reader<'a>,
    options: &'a BorshOptions,
    depth: usize,
}

impl<'a> Decoder<'a> {
    /// Creates a decoder positioned at the start of `bytes`.
    pub fn new(bytes: &'a [u8], options: &'a BorshOptions) -> Self {
        Self {
            reader: Reader::new(bytes),
            options,
            depth: 0,
        }
    }

    /// Bytes consumed so far.
    pub fn position(&self) -> usize {
        self.reader.position()
    }

    /// Bytes not yet consumed.
    pub fn remaining(&self) -> usize {
        self.reader.remaining()
    }

    /// Decodes one value of the shape `descriptor` describes.
    ///
    /// # Errors
    ///
    /// [`BorshError::Truncated`] when the input ends early (or a count claims
    /// more elements than could fit), [`BorshError::Malformed`] for impossible
    /// bytes such as a discriminant with no variant, invalid UTF-8 or nesting
    /// past the configured depth.
    pub fn decode(&mut self, descriptor: &Descriptor) -> Result<Value> {
        match descriptor.kind() {
            Kind::Integer {
                width,
                signed: false,
            } => self.reader.read_uint(*width).map(Value::UInt),
            Kind::Integer {
                width,
                signed: true,
            } => self.reader.read_int(*width).map(Value::Int),
            Kind::Float { width } => self.reader.read_float(*width).map(Value::Float),
            Kind::Bool => match self.reader.read_u8()? {
                0 => Ok(Value::Bool(false)),
                1 => Ok(Value::Bool(true)),
                other => Err(BorshError::Malformed(format!(
                    "invalid bool byte {other:#04x}"
                ))),
            },
            Kind::String => {
                let len = self.reader.read_len()?;
                let bytes = self.reader.take(len)?;
                let s = std::str::from_utf8(bytes)
                    .map_err(|e| BorshError::Malformed(format!("invalid UTF-8 in string: {e}")))?;
                Ok(Value::String(s.to_owned()))
            }
            Kind::Array { len, element } => {
                // Array lengths come from the type, not the input.
                if element.min_size() > 0 {
                    self.check_fits(*len, element.min_size())?;
                }
                self.decode_elements(*len, element).map(Value::Array)
            }
            Kind::Sequence { element } => {
                let count = self.read_count(element.min_size())?;
                self.decode_elements(count, element).map(Value::Sequence)
            }
            Kind::Optional { inner } => {
                if self.read_presence()? {
                    let v = self.decode(inner)?;
                    Ok(Value::Optional(Some(Box::new(v))))
                } else {
                    Ok(Value::Optional(None))
                }
            }
            Kind::Map { key, value } => {
                let count = self.read_count(key.min_size().saturating_add(value.min_size()))?;
                let mut entries = Vec::with_capacity(count);
                for _ in 0..count {
                    let k = self.decode(key)?;
                    let v = self.decode(value)?;
                    entries.push((k, v));
                }
                Ok(Value::Map(entries))
            }
            Kind::Set { element } => {
                let count = self.read_count(element.min_size())?;
                self.decode_elements(count, element).map(Value::Set)
            }
            Kind::Record { .. } => {
                let mut values = Vec::new();
                for field in descriptor.wire_fields() {
                    values.push(self.decode_field(field)?);
                }
                Ok(Value::Record(values))
            }
            Kind::Union {
                discriminant,
                variants,
                ..
            } => {
                let (index, variant) = self.read_discriminant(descriptor, discriminant, variants)?;
                let payload = self.decode_field(variant)?;
                Ok(Value::Union {
                    discriminant: index,
                    payload: Box::new(payload),
                })
            }
            Kind::Ref(link) => {
                let target = self.enter(link)?;
                let result = self.decode(target);
                self.leave();
                result
            }
        }
    }

    /// Follows a link into a recursive type. Pair with [`Decoder::leave`].
    pub(crate) fn enter<'d>(&mut self, link: &'d DescriptorRef) -> Result<&'d Descriptor> {
        let limit = self.options.max_depth;
        if self.depth >= limit {
            return Err(BorshError::Malformed(format!(
                "{} nests deeper than the limit of {limit}",
                link.target()
            )));
        }
        let target = link.resolve()?;
        self.depth += 1;
        Ok(target)
    }

    pub(crate) fn leave(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }

    pub(crate) fn decode_field(&mut self, field: &Field) -> Result<Value> {
        let descriptor = field.descriptor.as_deref().ok_or_else(|| {
            BorshError::Descriptor(format!("wire field `{}` has no descriptor", field.name))
        })?;
        self.decode(descriptor)
    }

    fn decode_elements(&mut self, count: usize, element: &Descriptor) -> Result<Vec<Value>> {
        let mut items = Vec::with_capacity(count);
        for _ in 0..count {
            items.push(self.decode(element)?);
        }
        Ok(items)
    }

    /// Reads a `u32` count prefix and checks that `count` elements of at
    /// least `element_min` bytes each can still fit in the input.
    pub(crate) fn read_count(&mut self, element_min: usize) -> Result<usize> {
        let count = self.reader.read_len()?;
        self.check_fits(count, element_min)?;
        Ok(count)
    }

    fn check_fits(&self, count: usize, element_min: usize) -> Result<()> {
        if element_min == 0 {
            let limit = self.options.max_zero_sized_len;
            if count > limit {
                return Err(BorshError::Malformed(format!(
                    "{count} zero-sized elements exceed the limit of {limit}"
                )));
            }
            return Ok(());
        }
        let remaining = self.reader.remaining();
        let needed = count.saturating_mul(element_min);
        if needed > remaining {
            return Err(BorshError::Truncated { needed, remaining });
        }
        Ok(())
    }

    /// Reads an optional presence flag.
    pub(crate) fn read_presence(&mut self) -> Result<bool> {
        match self.reader.read_u8()? {
            0 => Ok(false),
            1 => Ok(true),
            other => Err(BorshError::Malformed(format!(
                "invalid presence byte {other:#04x}"
            ))),
        }
    }

    /// Reads a union discriminant and resolves the variant it selects.
    pub(crate) fn read_discriminant<'d>(
        &mut self,
        union: &Descriptor,
        discriminant: &Field,
        variants: &'d [Field],
    ) -> Result<(u64, &'d Field)> {
        let Value::UInt(raw) = self.decode_field(discriminant)? else {
            return Err(BorshError::Descriptor(format!(
                "{}: discriminant `{}` is not unsigned",
                union.name(),
                discriminant.name
            )));
        };
        let out_of_range = || {
            BorshError::Malformed(format!(
                "{}: discriminant {raw} selects none of {} variants",
                union.name(),
                variants.len()
            ))
        };
        let index = u64::try_from(raw).map_err(|_| out_of_range())?;
        let variant = usize::try_from(index)
            .ok()
            .and_then(|i| variants.get(i))
            .ok_or_else(out_of_range)?;
        Ok((index, variant))
    }
}
