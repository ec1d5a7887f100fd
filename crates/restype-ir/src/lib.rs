#![deny(rust_2018_idioms)]
#![deny(unsafe_op_in_unsafe_fn)]
#![warn(clippy::all)]

//! # restype-ir
//!
//! Intermediate representation for resource-type schemas.
//!
//! The [`parser`] turns an already-decoded schema value into a tree of
//! [`SchemaNode`]s. Each node keeps its raw keyword set, including keywords
//! the restricted grammar rejects, plus the [`SchemaPath`] it was found at, so
//! that later phases can report every violation against the author's source.

/// Keyword classification and kind-compatibility table.
pub mod keyword;
/// Intermediate node tree.
pub mod node;
/// Schema parser producing the intermediate tree.
pub mod parser;
/// Paths from the document root used in diagnostics.
pub mod path;

pub use keyword::KeywordClass;
pub use node::{AdditionalProperties, PropertyNode, Reference, SchemaNode, TypeKeyword};
pub use parser::{Parser, parse};
pub use path::{PathToken, SchemaPath};

use thiserror::Error;

/// Errors that can occur when building the intermediate tree
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// The input is not a schema-shaped tree at all
    #[error("Malformed schema at {path}: {message}")]
    Malformed { path: SchemaPath, message: String },
}

impl Error {
    /// Build a malformed-input error at `path`.
    pub fn malformed(path: SchemaPath, message: impl Into<String>) -> Self {
        Self::Malformed {
            path,
            message: message.into(),
        }
    }

    /// Path of the offending node.
    #[must_use]
    pub fn path(&self) -> &SchemaPath {
        match self {
            Self::Malformed { path, .. } => path,
        }
    }
}

/// Crate-local result type for IR operations.
pub type Result<T> = std::result::Result<T, Error>;
