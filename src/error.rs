// src/error.rs

//! Centralized error handling for borsh-reflect.
//!
//! Every failure is returned as a [`BorshError`] through the crate's [`Result`]
//! alias. The library never panics on malformed input: truncated buffers, hostile
//! length prefixes and impossible discriminants all surface as values.
//!
//! ## Error Categories
//!
//! - **Unsupported** ([`BorshError::Unsupported`]): a shape with no wire layout
//! - **Truncated** ([`BorshError::Truncated`]): the input ran out before a read completed
//! - **Malformed** ([`BorshError::Malformed`]): a decoded byte, count or discriminant is impossible
//! - **Descriptor** ([`BorshError::Descriptor`]): inconsistent field annotations or a cyclic type
//! - **Mismatch** ([`BorshError::Mismatch`]): a [`Value`](crate::Value) does not fit its descriptor
//! - **Trailing bytes** ([`BorshError::TrailingBytes`]): input left over after a full decode
//!
//! ## Usage
//!
//! ```rust
//! use borsh_reflect::{Borsh, BorshError};
//!
//! match Borsh::from_slice::<u32>(&[1, 2]) {
//!     Err(BorshError::Truncated { needed, remaining }) => {
//!         assert_eq!((needed, remaining), (4, 2));
//!     }
//!     other => panic!("unexpected: {other:?}"),
//! }
//! ```
//!
//! A failed decode never hands back a partial value: `Borsh::deserialize`
//! leaves its target untouched when it returns an error.

use std::fmt;

/// A specialized `Result` type for borsh-reflect operations.
pub type Result<T> = std::result::Result<T, BorshError>;

/// The master error enum covering all failure domains.
///
/// The type is `Clone` so that a failed descriptor build can be reported to
/// several callers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BorshError {
    /// A value or type has no defined wire layout.
    ///
    /// ## Common Causes
    ///
    /// - An integer descriptor with a width other than 1, 2, 4, 8 or 16 bytes
    /// - An integer value outside the range of its declared width
    /// - A collection longer than `u32::MAX` elements
    Unsupported(String),

    /// The buffer was exhausted before a primitive, length prefix or field was fully read.
    ///
    /// Also raised when a length prefix claims more elements than the remaining
    /// bytes could possibly hold.
    Truncated {
        /// Bytes the read required.
        needed: usize,
        /// Bytes left in the buffer at that point.
        remaining: usize,
    },

    /// A decoded value is structurally impossible.
    ///
    /// Examples: a discriminant that selects no variant, a boolean byte other
    /// than 0 or 1, invalid UTF-8 in a string, duplicate map keys, a
    /// recursive type nested past the configured depth.
    Malformed(String),

    /// A type's descriptor could not be built.
    ///
    /// Raised at first use of a type whose annotations are inconsistent, or
    /// which contains itself by value. The failure is cached with the type.
    Descriptor(String),

    /// A [`Value`](crate::Value) does not have the shape its descriptor requires.
    Mismatch(String),

    /// A full decode succeeded but did not consume the whole input.
    TrailingBytes {
        /// Bytes consumed by the decode.
        consumed: usize,
        /// Total length of the input.
        total: usize,
    },
}

impl BorshError {
    pub(crate) fn mismatch(expected: &str, found: &str) -> Self {
        Self::Mismatch(format!("expected {expected}, found {found}"))
    }
}

impl fmt::Display for BorshError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unsupported(s) => write!(f, "Unsupported Type: {s}"),
            Self::Truncated { needed, remaining } => write!(
                f,
                "Truncated Input: needed {needed} bytes, {remaining} remaining"
            ),
            Self::Malformed(s) => write!(f, "Malformed Input: {s}"),
            Self::Descriptor(s) => write!(f, "Invalid Descriptor: {s}"),
            Self::Mismatch(s) => write!(f, "Value Mismatch: {s}"),
            Self::TrailingBytes { consumed, total } => write!(
                f,
                "Trailing Bytes: consumed {consumed} of {total} bytes"
            ),
        }
    }
}

impl std::error::Error for BorshError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_names_the_category() {
        let err = BorshError::Truncated {
            needed: 8,
            remaining: 3,
        };
        assert_eq!(err.to_string(), "Truncated Input: needed 8 bytes, 3 remaining");
        assert!(
            BorshError::mismatch("bool", "string")
                .to_string()
                .contains("expected bool, found string")
        );
    }
}
