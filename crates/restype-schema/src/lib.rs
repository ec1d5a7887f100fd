#![deny(rust_2018_idioms)]
#![deny(unsafe_op_in_unsafe_fn)]
#![warn(clippy::all)]

//! # restype-schema
//!
//! Canonical type-descriptor model and the closed reference registry for
//! resource-type schemas.
//!
//! A [`TypeDescriptor`] is the validated, reference-resolved and immutable
//! form of one schema node. Subtrees reached through a `$ref` are shared with
//! the [`TypeRegistry`] through `Arc`, so two properties that reference the
//! same built-in type point at the same descriptor.

/// Canonical descriptor tree: kinds, properties, handles and origins.
pub mod model;
/// Reference registry contract and the in-process implementation.
pub mod registry;

pub use model::{Kind, Origin, Property, TypeDescriptor, TypeHandle, ValidationAttributes};
pub use registry::{ReferenceGraph, ReferenceRegistry, RegistryEntry, TypeRegistry};

use thiserror::Error;

/// Errors that can occur when building a registry
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("Registry entry already exists: {id}")]
    DuplicateEntry { id: String },

    #[error("Registering '{id}' would create a reference cycle through '{via}'")]
    CyclicEntry { id: String, via: String },

    #[error("Invalid registry entry '{id}': {reason}")]
    InvalidEntry { id: String, reason: String },
}

impl Error {
    /// Build a duplicate-entry error.
    pub fn duplicate_entry(id: impl Into<String>) -> Self {
        Self::DuplicateEntry { id: id.into() }
    }

    /// Build a cyclic-entry error naming the edge that closes the cycle.
    pub fn cyclic_entry(id: impl Into<String>, via: impl Into<String>) -> Self {
        Self::CyclicEntry {
            id: id.into(),
            via: via.into(),
        }
    }

    /// Build an invalid-entry error.
    pub fn invalid_entry(id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidEntry {
            id: id.into(),
            reason: reason.into(),
        }
    }
}

/// Crate-local result type for registry operations.
pub type Result<T> = std::result::Result<T, Error>;
