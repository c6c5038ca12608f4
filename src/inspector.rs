// src/inspector.rs

//! Tools for inspecting the byte layout of an encoded buffer.
//!
//! The inspector walks a descriptor over the bytes the same way the decoder
//! does (it reuses the decoder's bounds-checked reads) and records which byte
//! range each field, element and prefix occupies. Useful when comparing the
//! output against another Borsh implementation.

use crate::api::BorshOptions;
use crate::decoder::Decoder;
use crate::descriptor::{Descriptor, Kind};
use crate::error::Result;
use crate::value::Value;
use crate::wire::LEN_PREFIX;
use serde::Serialize;
use std::fmt;

/// A structural report of an encoded buffer.
#[derive(Debug, Serialize)]
pub struct Inspection {
    /// Length of the inspected input.
    pub total_len: usize,
    /// Bytes the top-level value occupies.
    pub consumed: usize,
    /// The top-level value.
    pub root: Span,
}

/// The byte range of one node.
#[derive(Debug, Serialize)]
pub struct Span {
    /// Absolute offset of the first byte.
    pub offset: usize,
    /// Bytes occupied, prefixes included.
    pub length: usize,
    /// Field name, element index or `"root"`.
    pub label: String,
    /// Name of the descriptor the node was read with.
    pub type_name: String,
    /// Leaf value, element count or selected variant.
    pub detail: Option<String>,
    /// Nested nodes, in wire order.
    pub children: Vec<Span>,
}

/// Walks descriptors over encoded bytes.
#[derive(Debug)]
pub struct Inspector<'o> {
    options: &'o BorshOptions,
}

impl<'o> Inspector<'o> {
    /// Creates an inspector using the decode limits in `options`.
    pub fn new(options: &'o BorshOptions) -> Self {
        Self { options }
    }

    /// Inspects `bytes` read as `descriptor`.
    ///
    /// # Errors
    ///
    /// Exactly the errors [`Decoder::decode`] would return for the same input.
    pub fn inspect(&self, bytes: &[u8], descriptor: &Descriptor) -> Result<Inspection> {
        let mut decoder = Decoder::new(bytes, self.options);
        let root = Self::walk(&mut decoder, descriptor, "root".into())?;
        Ok(Inspection {
            total_len: bytes.len(),
            consumed: decoder.position(),
            root,
        })
    }

    fn walk(decoder: &mut Decoder<'_>, descriptor: &Descriptor, label: String) -> Result<Span> {
        if let Kind::Ref(link) = descriptor.kind() {
            let target = decoder.enter(link)?;
            let span = Self::walk(decoder, target, label);
            decoder.leave();
            return span;
        }

        let offset = decoder.position();
        let mut children = Vec::new();

        let detail = match descriptor.kind() {
            Kind::Integer { .. } | Kind::Float { .. } | Kind::Bool | Kind::String => {
                Some(leaf_detail(&decoder.decode(descriptor)?))
            }
            Kind::Array { len, element } => {
                for i in 0..*len {
                    children.push(Self::walk(decoder, element, format!("[{i}]"))?);
                }
                Some(format!("{len} elements"))
            }
            Kind::Sequence { element } | Kind::Set { element } => {
                let count = decoder.read_count(element.min_size())?;
                for i in 0..count {
                    children.push(Self::walk(decoder, element, format!("[{i}]"))?);
                }
                Some(format!("count {count} ({LEN_PREFIX}-byte prefix)"))
            }
            Kind::Optional { inner } => {
                if decoder.read_presence()? {
                    children.push(Self::walk(decoder, inner, "some".into())?);
                    Some("present".into())
                } else {
                    Some("absent".into())
                }
            }
            Kind::Map { key, value } => {
                let count = decoder.read_count(key.min_size().saturating_add(value.min_size()))?;
                for i in 0..count {
                    children.push(Self::walk(decoder, key, format!("key[{i}]"))?);
                    children.push(Self::walk(decoder, value, format!("value[{i}]"))?);
                }
                Some(format!("{count} pairs ({LEN_PREFIX}-byte prefix)"))
            }
            Kind::Record { fields } => {
                for field in fields.iter().filter(|f| f.is_wire()) {
                    if let Some(d) = field.descriptor.as_deref() {
                        children.push(Self::walk(decoder, d, field.name.clone())?);
                    }
                }
                let skipped = fields.len() - children.len();
                (skipped > 0).then(|| format!("{skipped} skipped"))
            }
            Kind::Union {
                discriminant,
                variants,
                ..
            } => {
                let (index, variant) = decoder.read_discriminant(descriptor, discriminant, variants)?;
                if let Some(d) = variant.descriptor.as_deref() {
                    children.push(Self::walk(decoder, d, variant.name.clone())?);
                }
                Some(format!("variant {index} `{}`", variant.name))
            }
            Kind::Ref(_) => None,
        };

        Ok(Span {
            offset,
            length: decoder.position() - offset,
            label,
            type_name: descriptor.name().to_owned(),
            detail,
            children,
        })
    }
}

fn leaf_detail(value: &Value) -> String {
    match value {
        Value::Bool(b) => b.to_string(),
        Value::UInt(n) => n.to_string(),
        Value::Int(n) => n.to_string(),
        Value::Float(f) => f.to_string(),
        Value::String(s) => format!("{s:?}"),
        other => other.kind_name().to_owned(),
    }
}

impl fmt::Display for Inspection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== BORSH INSPECTOR REPORT ===")?;
        writeln!(f, "Input:    {} bytes", self.total_len)?;
        writeln!(f, "Consumed: {} bytes", self.consumed)?;
        writeln!(f, "\n[LAYOUT]")?;
        self.root.fmt_recursive(f, "", true)
    }
}

impl Span {
    fn fmt_recursive(&self, f: &mut fmt::Formatter<'_>, prefix: &str, is_last: bool) -> fmt::Result {
        let connector = if is_last { "└── " } else { "├── " };
        let child_prefix = if is_last { "    " } else { "│   " };
        let detail = self
            .detail
            .as_deref()
            .map(|d| format!(" = {d}"))
            .unwrap_or_default();

        writeln!(
            f,
            "{}{}{} @{}+{} : {}{}",
            prefix, connector, self.label, self.offset, self.length, self.type_name, detail
        )?;

        for (i, child) in self.children.iter().enumerate() {
            let is_last_child = i == self.children.len() - 1;
            child.fmt_recursive(f, &format!("{prefix}{child_prefix}"), is_last_child)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::{Field, FieldRole};
    use std::sync::Arc;

    #[test]
    fn spans_cover_prefixes_and_fields() {
        let name = Field {
            name: "name".into(),
            descriptor: Some(Arc::new(Descriptor::new("String", Kind::String))),
            role: FieldRole::Wire,
        };
        let id = Field {
            name: "id".into(),
            descriptor: Some(Arc::new(Descriptor::unsigned("u16", 2))),
            role: FieldRole::Wire,
        };
        let record = Descriptor::new("User", Kind::Record { fields: vec![id, name] });
        let bytes = [7, 0, 2, 0, 0, 0, b'h', b'i'];

        let options = BorshOptions::default();
        let report = Inspector::new(&options).inspect(&bytes, &record).unwrap();

        assert_eq!(report.consumed, 8);
        assert_eq!(report.root.children.len(), 2);
        assert_eq!(report.root.children[0].detail.as_deref(), Some("7"));
        let name_span = &report.root.children[1];
        assert_eq!((name_span.offset, name_span.length), (2, 6));
        assert_eq!(name_span.detail.as_deref(), Some("\"hi\""));
        assert!(report.to_string().contains("name @2+6 : String"));
    }
}
