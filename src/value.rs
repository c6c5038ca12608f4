// src/value.rs

//! The in-memory value tree walked by both engines.
//!
//! A `Value` carries no widths or names; its descriptor supplies them. The
//! encoder checks each node against the descriptor it is paired with, and
//! the decoder produces exactly the node kinds listed below for each layout:
//!
//! | Layout | Value |
//! |---|---|
//! | unsigned integer | `UInt` |
//! | signed integer | `Int` |
//! | float | `Float` |
//! | array | `Array` |
//! | sequence | `Sequence` |
//! | record | `Record` (wire fields only) |
//! | union | `Union` |

use crate::error::{BorshError, Result};
use serde::Serialize;

/// A structured value with no type information attached.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Value {
    /// Boolean.
    Bool(bool),
    /// Any unsigned integer up to 128 bits.
    UInt(u128),
    /// Any signed integer up to 128 bits.
    Int(i128),
    /// Either float width; `f32` values widen losslessly.
    Float(f64),
    /// UTF-8 text.
    String(String),
    /// Fixed-length elements.
    Array(Vec<Value>),
    /// Variable-length elements.
    Sequence(Vec<Value>),
    /// Present or absent value.
    Optional(Option<Box<Value>>),
    /// Key/value pairs in traversal order.
    Map(Vec<(Value, Value)>),
    /// Keys in traversal order.
    Set(Vec<Value>),
    /// One entry per wire field, in declaration order.
    Record(Vec<Value>),
    /// The selected variant and its payload.
    Union {
        /// Position of the selected variant.
        discriminant: u64,
        /// Payload of the selected variant.
        payload: Box<Value>,
    },
}

impl Value {
    /// The empty record, which encodes to zero bytes.
    pub const UNIT: Value = Value::Record(Vec::new());

    /// Short name of the node kind, used in diagnostics.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Bool(_) => "bool",
            Self::UInt(_) => "unsigned integer",
            Self::Int(_) => "signed integer",
            Self::Float(_) => "float",
            Self::String(_) => "string",
            Self::Array(_) => "array",
            Self::Sequence(_) => "sequence",
            Self::Optional(_) => "optional",
            Self::Map(_) => "map",
            Self::Set(_) => "set",
            Self::Record(_) => "record",
            Self::Union { .. } => "union",
        }
    }

    fn mismatch<T>(&self, expected: &str) -> Result<T> {
        Err(BorshError::mismatch(expected, self.kind_name()))
    }

    /// Extracts a boolean.
    pub fn into_bool(self) -> Result<bool> {
        match self {
            Self::Bool(b) => Ok(b),
            other => other.mismatch("bool"),
        }
    }

    /// Extracts an integer as `u128`, accepting non-negative signed values.
    pub fn into_u128(self) -> Result<u128> {
        match self {
            Self::UInt(v) => Ok(v),
            Self::Int(v) => u128::try_from(v)
                .map_err(|_| BorshError::Malformed(format!("{v} is not a valid unsigned value"))),
            other => other.mismatch("unsigned integer"),
        }
    }

    /// Extracts an integer as `i128`, accepting unsigned values that fit.
    pub fn into_i128(self) -> Result<i128> {
        match self {
            Self::Int(v) => Ok(v),
            Self::UInt(v) => i128::try_from(v)
                .map_err(|_| BorshError::Malformed(format!("{v} is not a valid signed value"))),
            other => other.mismatch("signed integer"),
        }
    }

    /// Extracts a float.
    pub fn into_f64(self) -> Result<f64> {
        match self {
            Self::Float(v) => Ok(v),
            other => other.mismatch("float"),
        }
    }

    /// Extracts a string.
    pub fn into_string(self) -> Result<String> {
        match self {
            Self::String(s) => Ok(s),
            other => other.mismatch("string"),
        }
    }

    /// Extracts the elements of an array, sequence or set.
    pub fn into_elements(self) -> Result<Vec<Value>> {
        match self {
            Self::Array(items) | Self::Sequence(items) | Self::Set(items) => Ok(items),
            other => other.mismatch("array, sequence or set"),
        }
    }

    /// Extracts the inner value of an optional.
    pub fn into_optional(self) -> Result<Option<Value>> {
        match self {
            Self::Optional(inner) => Ok(inner.map(|b| *b)),
            other => other.mismatch("optional"),
        }
    }

    /// Extracts map entries.
    pub fn into_entries(self) -> Result<Vec<(Value, Value)>> {
        match self {
            Self::Map(entries) => Ok(entries),
            other => other.mismatch("map"),
        }
    }

    /// Extracts the wire fields of a record, checking their count.
    pub fn into_record(self, expected: usize, type_name: &str) -> Result<Vec<Value>> {
        match self {
            Self::Record(fields) if fields.len() == expected => Ok(fields),
            Self::Record(fields) => Err(BorshError::Mismatch(format!(
                "{type_name} has {expected} wire fields, value has {}",
                fields.len()
            ))),
            other => other.mismatch("record"),
        }
    }

    /// Extracts the discriminant and payload of a union.
    pub fn into_union(self) -> Result<(u64, Value)> {
        match self {
            Self::Union {
                discriminant,
                payload,
            } => Ok((discriminant, *payload)),
            other => other.mismatch("union"),
        }
    }
}
