// src/builder.rs

//! Builds descriptors on first use and memoizes them for the process lifetime.
//!
//! The cache is keyed by `TypeId` and guarded by a read-mostly `RwLock`.
//! Builds run outside the lock, so two threads describing the same new type
//! may both build it; the first insert wins and both receive the same `Arc`.
//! Failed builds are cached too, so an invalid type is rejected (and logged)
//! once.
//!
//! A type met again while it is still being built gets a [`Kind::Ref`] link,
//! filled when its outer build finishes. Recursion is accepted when every path
//! back to the type crosses an `Option`, a collection or a union variant. A
//! type that holds itself through records or arrays alone has no finite
//! encoding and fails fast.
//!
//! Descriptors built while an enclosing type was unfinished point at that
//! type's link, so they are handed to the caller but not cached.

use crate::annotations::{self, FieldDecl, Markers};
use crate::descriptor::{Descriptor, DescriptorRef, Field, Kind};
use crate::error::{BorshError, Result};
use crate::schema::BorshSchema;
use std::any::{TypeId, type_name};
use std::collections::HashMap;
use std::sync::{Arc, OnceLock, RwLock};

type Cache = RwLock<HashMap<TypeId, Result<Arc<Descriptor>>>>;

fn cache() -> &'static Cache {
    static CACHE: OnceLock<Cache> = OnceLock::new();
    CACHE.get_or_init(|| RwLock::new(HashMap::new()))
}

/// Returns the descriptor for `T`, building and caching it on first use.
///
/// # Errors
///
/// Returns [`BorshError::Descriptor`] if `T` (or any type it contains) has
/// inconsistent annotations or contains itself by value.
pub fn describe<T: BorshSchema>() -> Result<Arc<Descriptor>> {
    DescriptorBuilder::new().describe::<T>()
}

/// Number of descriptors currently cached, failures excluded.
pub fn cached_count() -> usize {
    cache()
        .read()
        .unwrap_or_else(|p| p.into_inner())
        .values()
        .filter(|entry| entry.is_ok())
        .count()
}

/// One type whose build has started but not finished.
#[derive(Debug)]
struct Frame {
    id: TypeId,
    link: Option<DescriptorRef>,
    // Refers to an unfinished type further down the stack.
    tainted: bool,
}

/// Context threaded through one top-level [`describe`] call.
///
/// `BorshSchema` implementations use it to describe their parts.
#[derive(Debug, Default)]
pub struct DescriptorBuilder {
    in_progress: Vec<Frame>,
}

impl DescriptorBuilder {
    /// Creates a builder with an empty in-progress stack.
    pub fn new() -> Self {
        Self::default()
    }

    /// Describes `T`, consulting the cache first.
    pub fn describe<T: BorshSchema>(&mut self) -> Result<Arc<Descriptor>> {
        let id = TypeId::of::<T>();

        if let Some(hit) = cache()
            .read()
            .unwrap_or_else(|p| p.into_inner())
            .get(&id)
        {
            return hit.clone();
        }

        if let Some(pos) = self.in_progress.iter().position(|f| f.id == id) {
            return Ok(self.link_back(pos, type_name::<T>()));
        }

        self.in_progress.push(Frame {
            id,
            link: None,
            tainted: false,
        });
        let built = T::build_descriptor(self);
        let (link, tainted) = self
            .in_progress
            .pop()
            .map_or((None, false), |f| (f.link, f.tainted));

        let result = built.and_then(|d| {
            let descriptor = Arc::new(d);
            if let Some(link) = link {
                if holds_inline(&descriptor, &link) {
                    return Err(BorshError::Descriptor(format!(
                        "{} contains itself by value",
                        type_name::<T>()
                    )));
                }
                link.fill(Arc::clone(&descriptor));
            }
            Ok(descriptor)
        });

        if tainted {
            return result;
        }

        let mut guard = cache().write().unwrap_or_else(|p| p.into_inner());
        let entry = guard.entry(id).or_insert_with(|| {
            match &result {
                Ok(descriptor) => tracing::debug!(
                    type_name = descriptor.name(),
                    kind = descriptor.kind_name(),
                    min_size = descriptor.min_size(),
                    "cached descriptor"
                ),
                Err(e) => tracing::debug!(
                    type_name = type_name::<T>(),
                    error = %e,
                    "cached descriptor failure"
                ),
            }
            result
        });
        entry.clone()
    }

    // Links back to the unfinished type at `pos`. Everything built on top of
    // it now depends on that link.
    fn link_back(&mut self, pos: usize, name: &'static str) -> Arc<Descriptor> {
        for frame in &mut self.in_progress[pos + 1..] {
            frame.tainted = true;
        }
        let link = self.in_progress[pos]
            .link
            .get_or_insert_with(|| DescriptorRef::new(name))
            .clone();
        tracing::trace!(type_name = name, "linked recursive type");
        Arc::new(Descriptor::new(name, Kind::Ref(link)))
    }

    /// Describes the type of one record field.
    pub fn field<T: BorshSchema>(
        &mut self,
        name: impl Into<String>,
        markers: Markers,
    ) -> Result<FieldDecl> {
        let descriptor = self.describe::<T>()?;
        Ok(FieldDecl::new(name, descriptor, markers))
    }

    /// Runs the annotation processor over `fields` and wraps the result.
    pub fn record(&mut self, name: impl Into<String>, fields: Vec<FieldDecl>) -> Result<Descriptor> {
        let name = name.into();
        let kind = annotations::process(&name, fields)?;
        Ok(Descriptor::new(name, kind))
    }

    /// Builds a union for a Rust enum: a `u8` discriminant selecting one
    /// payload record per variant.
    pub fn enumeration(
        &mut self,
        name: impl Into<String>,
        variants: Vec<(&'static str, Vec<FieldDecl>)>,
    ) -> Result<Descriptor> {
        let name = name.into();
        let mut decls = Vec::with_capacity(variants.len() + 1);
        decls.push(self.field::<u8>("variant", Markers::DISCRIMINANT)?);
        for (variant, fields) in variants {
            let payload_name = format!("{name}::{variant}");
            let payload = match annotations::process(&payload_name, fields)? {
                kind @ Kind::Record { .. } => Descriptor::new(payload_name, kind),
                _ => {
                    return Err(BorshError::Descriptor(format!(
                        "{payload_name}: enum variants cannot declare a discriminant"
                    )));
                }
            };
            decls.push(FieldDecl::new(variant, Arc::new(payload), Markers::NONE));
        }
        self.record(name, decls)
    }
}

// Follows the parts stored inline (record fields, array elements, the union
// discriminant) looking for `link`.
fn holds_inline(descriptor: &Descriptor, link: &DescriptorRef) -> bool {
    let inline = |field: &Field| {
        field
            .descriptor
            .as_deref()
            .is_some_and(|d| holds_inline(d, link))
    };
    match descriptor.kind() {
        Kind::Ref(other) => other == link,
        Kind::Array { len, element } => *len > 0 && holds_inline(element, link),
        Kind::Record { fields } => fields.iter().any(inline),
        Kind::Union { discriminant, .. } => inline(discriminant),
        _ => false,
    }
}
