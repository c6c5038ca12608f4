// src/encoder.rs

//! The write-side engine.
//!
//! Walks a [`Value`] alongside its [`Descriptor`] and appends the wire bytes
//! to an output buffer. The descriptor alone decides widths, prefixes and
//! which fields are present; the value only has to have the right shape.
//!
//! The decode limits in [`BorshOptions`] are enforced here as well, so the
//! encoder never produces bytes the decoder with the same options rejects.

use crate::api::BorshOptions;
use crate::descriptor::{Descriptor, DescriptorRef, Field, Kind};
use crate::error::{BorshError, Result};
use crate::value::Value;
use crate::wire;

/// Appends the encoding of values to a caller-owned buffer.
#[derive(Debug)]
pub struct Encoder<'o> {
    out: &'o mut Vec<u8>,
    options: &'o BorshOptions,
    depth: usize,
}

impl<'o> Encoder<'o> {
    /// Creates an encoder appending to `out`.
    pub fn new(out: &'o mut Vec<u8>, options: &'o BorshOptions) -> Self {
        Self {
            out,
            options,
            depth: 0,
        }
    }

    /// Encodes `value` according to `descriptor`.
    ///
    /// # Errors
    ///
    /// [`BorshError::Mismatch`] when the value's shape differs from the
    /// descriptor. [`BorshError::Unsupported`] when a primitive does not fit
    /// its declared width, a union discriminant selects no variant, or a
    /// count or nesting depth exceeds the configured limits.
    /// [`BorshError::Malformed`] for duplicate canonical map keys. On error
    /// the buffer may hold a partial encoding.
    pub fn encode(&mut self, value: &Value, descriptor: &Descriptor) -> Result<()> {
        match (descriptor.kind(), value) {
            (Kind::Integer { width, signed: false }, Value::UInt(n)) => {
                wire::write_uint(self.out, *n, *width)
            }
            (Kind::Integer { width, signed: true }, Value::Int(n)) => {
                wire::write_int(self.out, *n, *width)
            }
            // Cross-signedness values are accepted when they fit the target.
            (Kind::Integer { width, signed: false }, Value::Int(n)) => {
                let n = Value::Int(*n).into_u128()?;
                wire::write_uint(self.out, n, *width)
            }
            (Kind::Integer { width, signed: true }, Value::UInt(n)) => {
                let n = Value::UInt(*n).into_i128()?;
                wire::write_int(self.out, n, *width)
            }
            (Kind::Float { width }, Value::Float(f)) => wire::write_float(self.out, *f, *width),
            (Kind::Bool, Value::Bool(b)) => {
                self.out.push(u8::from(*b));
                Ok(())
            }
            (Kind::String, Value::String(s)) => {
                wire::write_len(self.out, s.len())?;
                self.out.extend_from_slice(s.as_bytes());
                Ok(())
            }
            (Kind::Array { len, element }, Value::Array(items) | Value::Sequence(items)) => {
                if items.len() != *len {
                    return Err(BorshError::Mismatch(format!(
                        "{} expects {len} elements, value has {}",
                        descriptor.name(),
                        items.len()
                    )));
                }
                items.iter().try_for_each(|item| self.encode(item, element))
            }
            (Kind::Sequence { element }, Value::Sequence(items) | Value::Array(items)) => {
                self.check_count(descriptor, items.len(), element.min_size())?;
                wire::write_len(self.out, items.len())?;
                items.iter().try_for_each(|item| self.encode(item, element))
            }
            (Kind::Optional { inner }, Value::Optional(present)) => match present {
                None => {
                    self.out.push(0);
                    Ok(())
                }
                Some(v) => {
                    self.out.push(1);
                    self.encode(v, inner)
                }
            },
            (Kind::Map { key, value: val }, Value::Map(entries)) => {
                let pair_min = key.min_size().saturating_add(val.min_size());
                self.check_count(descriptor, entries.len(), pair_min)?;
                wire::write_len(self.out, entries.len())?;
                if self.options.canonical_maps {
                    let encoded = entries
                        .iter()
                        .map(|(k, v)| self.encode_entry(k, key, Some((v, &**val))))
                        .collect::<Result<Vec<_>>>()?;
                    self.append_sorted(encoded, descriptor)
                } else {
                    entries.iter().try_for_each(|(k, v)| {
                        self.encode(k, key)?;
                        self.encode(v, val)
                    })
                }
            }
            (Kind::Set { element }, Value::Set(items) | Value::Sequence(items)) => {
                self.check_count(descriptor, items.len(), element.min_size())?;
                wire::write_len(self.out, items.len())?;
                if self.options.canonical_maps {
                    let encoded = items
                        .iter()
                        .map(|k| self.encode_entry(k, element, None))
                        .collect::<Result<Vec<_>>>()?;
                    self.append_sorted(encoded, descriptor)
                } else {
                    items.iter().try_for_each(|item| self.encode(item, element))
                }
            }
            (Kind::Record { .. }, Value::Record(values)) => {
                let fields: Vec<&Field> = descriptor.wire_fields().collect();
                if fields.len() != values.len() {
                    return Err(BorshError::Mismatch(format!(
                        "{} has {} wire fields, value has {}",
                        descriptor.name(),
                        fields.len(),
                        values.len()
                    )));
                }
                fields
                    .into_iter()
                    .zip(values)
                    .try_for_each(|(field, v)| self.encode_field(v, field))
            }
            (
                Kind::Union {
                    discriminant,
                    variants,
                    ..
                },
                Value::Union {
                    discriminant: index,
                    payload,
                },
            ) => {
                let variant = usize::try_from(*index)
                    .ok()
                    .and_then(|i| variants.get(i))
                    .ok_or_else(|| {
                        BorshError::Unsupported(format!(
                            "{}: discriminant {index} selects none of {} variants",
                            descriptor.name(),
                            variants.len()
                        ))
                    })?;
                self.encode_field(&Value::UInt(u128::from(*index)), discriminant)?;
                self.encode_field(payload, variant)
            }
            (Kind::Ref(link), _) => {
                let target = self.enter(link)?;
                let result = self.encode(value, target);
                self.depth = self.depth.saturating_sub(1);
                result
            }
            (_, v) => Err(BorshError::mismatch(descriptor.kind_name(), v.kind_name())),
        }
    }

    // Follows a link into a recursive type, counting the nesting.
    fn enter<'d>(&mut self, link: &'d DescriptorRef) -> Result<&'d Descriptor> {
        let limit = self.options.max_depth;
        if self.depth >= limit {
            return Err(BorshError::Unsupported(format!(
                "{} nests deeper than the limit of {limit}",
                link.target()
            )));
        }
        let target = link.resolve()?;
        self.depth += 1;
        Ok(target)
    }

    fn check_count(&self, descriptor: &Descriptor, count: usize, element_min: usize) -> Result<()> {
        let limit = self.options.max_zero_sized_len;
        if element_min == 0 && count > limit {
            return Err(BorshError::Unsupported(format!(
                "{}: {count} zero-sized elements exceed the limit of {limit}",
                descriptor.name()
            )));
        }
        Ok(())
    }

    fn encode_field(&mut self, value: &Value, field: &Field) -> Result<()> {
        let descriptor = field.descriptor.as_deref().ok_or_else(|| {
            BorshError::Descriptor(format!("wire field `{}` has no descriptor", field.name))
        })?;
        self.encode(value, descriptor)
    }

    // Encodes one map entry (or set element) into its own buffer, returning
    // the key length so entries can be ordered by their key bytes.
    fn encode_entry(
        &self,
        key: &Value,
        key_descriptor: &Descriptor,
        value: Option<(&Value, &Descriptor)>,
    ) -> Result<(usize, Vec<u8>)> {
        let mut buf = Vec::new();
        let mut sub = Encoder {
            out: &mut buf,
            options: self.options,
            depth: self.depth,
        };
        sub.encode(key, key_descriptor)?;
        let key_len = sub.out.len();
        if let Some((v, d)) = value {
            sub.encode(v, d)?;
        }
        Ok((key_len, buf))
    }

    fn append_sorted(
        &mut self,
        mut entries: Vec<(usize, Vec<u8>)>,
        descriptor: &Descriptor,
    ) -> Result<()> {
        entries.sort_by(|(a_len, a), (b_len, b)| a[..*a_len].cmp(&b[..*b_len]));
        if let Some(pair) = entries
            .windows(2)
            .find(|w| w[0].1[..w[0].0] == w[1].1[..w[1].0])
        {
            return Err(BorshError::Malformed(format!(
                "{}: duplicate key {:?}",
                descriptor.name(),
                &pair[0].1[..pair[0].0]
            )));
        }
        for (_, bytes) in entries {
            self.out.extend_from_slice(&bytes);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::FieldRole;
    use std::sync::Arc;

    fn encode(value: &Value, descriptor: &Descriptor) -> Result<Vec<u8>> {
        let options = BorshOptions::default();
        let mut out = Vec::new();
        Encoder::new(&mut out, &options).encode(value, descriptor)?;
        Ok(out)
    }

    fn wire_field(name: &str, descriptor: Descriptor) -> Field {
        Field {
            name: name.into(),
            descriptor: Some(Arc::new(descriptor)),
            role: FieldRole::Wire,
        }
    }

    #[test]
    fn string_is_length_prefixed() {
        let d = Descriptor::new("String", Kind::String);
        let bytes = encode(&Value::String("héllo".into()), &d).unwrap();
        assert_eq!(&bytes[..4], &6u32.to_le_bytes());
        assert_eq!(bytes.len(), 4 + 6);
    }

    #[test]
    fn optional_absent_is_one_byte() {
        let d = Descriptor::new(
            "Option<u64>",
            Kind::Optional {
                inner: Arc::new(Descriptor::unsigned("u64", 8)),
            },
        );
        assert_eq!(encode(&Value::Optional(None), &d).unwrap(), [0]);
        let present = Value::Optional(Some(Box::new(Value::UInt(5))));
        assert_eq!(encode(&present, &d).unwrap(), [1, 5, 0, 0, 0, 0, 0, 0, 0]);
    }

    #[test]
    fn union_writes_only_selected_variant() {
        let d = Descriptor::new(
            "U",
            Kind::Union {
                discriminant: Field {
                    name: "tag".into(),
                    descriptor: Some(Arc::new(Descriptor::unsigned("u8", 1))),
                    role: FieldRole::Discriminant,
                },
                variants: vec![
                    wire_field("a", Descriptor::signed("i32", 4)),
                    wire_field("b", Descriptor::new("bool", Kind::Bool)),
                ],
                skipped: Vec::new(),
            },
        );
        let value = Value::Union {
            discriminant: 1,
            payload: Box::new(Value::Bool(true)),
        };
        assert_eq!(encode(&value, &d).unwrap(), [1, 1]);

        let out_of_range = Value::Union {
            discriminant: 2,
            payload: Box::new(Value::UNIT),
        };
        assert!(matches!(
            encode(&out_of_range, &d),
            Err(BorshError::Unsupported(_))
        ));
    }

    #[test]
    fn zero_sized_counts_follow_the_decode_limit() {
        let options = BorshOptions::new().max_zero_sized_len(2);
        let unit = Arc::new(Descriptor::new("()", Kind::Record { fields: Vec::new() }));
        let seq = Descriptor::new("Vec<()>", Kind::Sequence { element: unit.clone() });
        let set = Descriptor::new("Set<()>", Kind::Set { element: unit.clone() });
        let map = Descriptor::new(
            "Map<(), ()>",
            Kind::Map {
                key: unit.clone(),
                value: unit,
            },
        );

        let mut out = Vec::new();
        let mut encoder = Encoder::new(&mut out, &options);
        encoder.encode(&Value::Sequence(vec![Value::UNIT; 2]), &seq).unwrap();
        for (value, d) in [
            (Value::Sequence(vec![Value::UNIT; 3]), &seq),
            (Value::Set(vec![Value::UNIT; 3]), &set),
            (Value::Map(vec![(Value::UNIT, Value::UNIT); 3]), &map),
        ] {
            assert!(matches!(encoder.encode(&value, d), Err(BorshError::Unsupported(_))));
        }
        assert_eq!(out, [2, 0, 0, 0]);
    }

    #[test]
    fn links_are_followed_up_to_the_depth_limit() {
        let link = DescriptorRef::new("Chain");
        let chain = Descriptor::new(
            "Chain",
            Kind::Optional {
                inner: Arc::new(Descriptor::new("Chain", Kind::Ref(link.clone()))),
            },
        );
        link.fill(Arc::new(chain.clone()));

        let nested = |depth: usize| {
            (0..depth).fold(Value::Optional(None), |inner, _| {
                Value::Optional(Some(Box::new(inner)))
            })
        };
        let options = BorshOptions::new().max_depth(3);
        let mut out = Vec::new();
        Encoder::new(&mut out, &options).encode(&nested(3), &chain).unwrap();
        assert_eq!(out, [1, 1, 1, 0]);

        let err = Encoder::new(&mut Vec::new(), &options)
            .encode(&nested(4), &chain)
            .unwrap_err();
        assert!(matches!(err, BorshError::Unsupported(_)));
    }

    #[test]
    fn canonical_set_orders_by_key_bytes() {
        let d = Descriptor::new(
            "Set<u16>",
            Kind::Set {
                element: Arc::new(Descriptor::unsigned("u16", 2)),
            },
        );
        let value = Value::Set(vec![Value::UInt(0x0100), Value::UInt(0x0002)]);
        assert_eq!(encode(&value, &d).unwrap(), [2, 0, 0, 0, 0x00, 0x01, 0x02, 0x00]);

        let duplicate = Value::Set(vec![Value::UInt(3), Value::UInt(3)]);
        assert!(matches!(encode(&duplicate, &d), Err(BorshError::Malformed(_))));
    }

    #[test]
    fn shape_mismatch_is_an_error_not_a_panic() {
        let err = encode(&Value::Bool(true), &Descriptor::new("String", Kind::String)).unwrap_err();
        assert_eq!(err, BorshError::mismatch("string", "bool"));
    }
}
