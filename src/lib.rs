// src/lib.rs

//! # borsh-reflect
//!
//! A descriptor-driven implementation of the Borsh binary format.
//!
//! ## Overview
//!
//! Borsh is a compact, deterministic encoding: little-endian fixed-width
//! integers, `u32` length prefixes, fields in declaration order and no
//! self-description on the wire. Two peers agree on the bytes only if they
//! agree on the type, so this crate makes the type explicit.
//!
//! Every Rust type is first turned into a [`Descriptor`]: a small tree that
//! says which integers have which widths, where the length prefixes go, which
//! fields are on the wire and which field selects a union variant. Descriptors
//! are built once per type and cached for the life of the process. The
//! [`Encoder`](encoder::Encoder) and [`Decoder`](decoder::Decoder) then walk a
//! descriptor alongside a dynamic [`Value`].
//!
//! ### Key Features
//!
//! *   **Derive support:** `#[derive(Borsh)]` for structs and enums, with
//!     `#[borsh(skip)]` and `#[borsh(discriminant)]` field markers.
//! *   **Canonical output:** map pairs and set elements are sorted by their
//!     encoded key bytes, so equal maps always produce equal bytes.
//! *   **Recursive types:** lists and trees such as `Option<Box<Self>>` or
//!     `Vec<Self>` fields are linked, not unrolled; nesting depth is capped.
//! *   **Hostile input safety:** every read is bounds-checked and every length
//!     prefix is checked against the remaining input before allocating.
//! *   **Inspection:** [`Borsh::inspect`] reports the byte range of every field.
//!
//! ## Usage
//!
//! ```rust
//! use borsh_reflect::Borsh;
//!
//! #[derive(Borsh, Debug, PartialEq, Default)]
//! struct Account {
//!     id: u64,
//!     owner: String,
//!     #[borsh(skip)]
//!     dirty: bool,
//! }
//!
//! let account = Account { id: 7, owner: "ana".into(), dirty: true };
//! let bytes = Borsh::serialize(&account)?;
//! assert_eq!(bytes.len(), 8 + 4 + 3);
//!
//! let back: Account = Borsh::from_slice(&bytes)?;
//! assert_eq!(back, Account { dirty: false, ..account });
//! # Ok::<(), borsh_reflect::BorshError>(())
//! ```
//!
//! ### Unions
//!
//! A struct with a `#[borsh(discriminant)]` field encodes the discriminant
//! followed by only the field it selects. Rust enums always encode this way,
//! with a one-byte discriminant.
//!
//! ```rust
//! use borsh_reflect::Borsh;
//!
//! #[derive(Borsh, Debug, PartialEq, Default)]
//! struct Payment {
//!     #[borsh(discriminant)]
//!     method: u8,
//!     card: u64,
//!     iban: String,
//! }
//!
//! let p = Payment { method: 1, card: 0, iban: "DE00".into() };
//! assert_eq!(Borsh::serialize(&p)?, [1, 4, 0, 0, 0, b'D', b'E', b'0', b'0']);
//! # Ok::<(), borsh_reflect::BorshError>(())
//! ```
//!
//! ## Safety and Error Handling
//!
//! * **No Unsafe:** the crate forbids `unsafe` code.
//! * **No Panics:** no `unwrap()` or `panic!()` in the library (enforced by clippy lints).
//! * **Comprehensive Errors:** every failure is a [`BorshError`].

#![deny(unsafe_code)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::panic)]
#![warn(missing_docs)]

// Generated code names this crate by its absolute path.
extern crate self as borsh_reflect;

// --- PUBLIC API MODULES ---
pub mod annotations;
pub mod api;
pub mod builder;
pub mod decoder;
pub mod descriptor;
pub mod encoder;
pub mod error;
pub mod inspector;
pub mod schema;
pub mod value;

// --- INTERNAL IMPLEMENTATION MODULES (Hidden from Docs) ---
#[doc(hidden)]
pub mod rt;

// Private modules
mod schema_impls;
mod wire;

// --- RE-EXPORTS ---
pub use annotations::{FieldDecl, Markers};
pub use api::{Borsh, BorshOptions, DEFAULT_MAX_DEPTH, DEFAULT_MAX_ZERO_SIZED_LEN};
pub use builder::{DescriptorBuilder, describe};
pub use descriptor::{Descriptor, DescriptorRef, Field, FieldRole, Kind};
pub use error::{BorshError, Result};
pub use inspector::{Inspection, Span};
pub use schema::{BorshReflect, BorshSchema, Discriminant};
pub use value::Value;

pub use borsh_reflect_derive::Borsh;
