#![deny(rust_2018_idioms)]
#![deny(unsafe_op_in_unsafe_fn)]
#![warn(clippy::all)]

//! # restype-validation
//!
//! Validation and normalization pipeline for resource-type schemas.
//!
//! A pass runs four phases in order:
//!
//! 1. [`restype_ir::parse`] builds the intermediate tree
//! 2. [`ConstraintValidator`] checks the restricted grammar
//! 3. [`ReferenceResolver`] binds every `$ref` to a registry entry
//! 4. [`ModelBuilder`] emits the canonical [`TypeDescriptor`](restype_schema::TypeDescriptor)
//!
//! Grammar and reference failures are collected into a [`FailureReport`]
//! rather than stopping at the first problem. [`SchemaEngine`] wires the
//! phases together and [`RegistryLoader`] fills a registry from a catalog
//! file.
//!
//! ```
//! use restype_schema::TypeRegistry;
//! use restype_validation::SchemaEngine;
//! use serde_json::json;
//! use std::sync::Arc;
//!
//! let engine = SchemaEngine::new(Arc::new(TypeRegistry::new(["https://radapp.io/schemas/v1#"])));
//! let descriptor = engine
//!     .compile(&json!({
//!         "type": "object",
//!         "properties": {"size": {"type": "string", "enum": ["S", "M", "L"]}},
//!         "required": ["size"]
//!     }))
//!     .unwrap();
//! assert!(descriptor.property("size").unwrap().is_required());
//! ```

/// Canonical model builder.
pub mod builder;
/// Pipeline orchestration, configuration and compile cache.
pub mod engine;
/// Registry catalog loading.
pub mod loader;
/// Failure taxonomy and reports.
pub mod reporter;
/// Reference resolution against the registry.
pub mod resolver;
/// Grammar rules.
pub mod rules;

pub use builder::ModelBuilder;
pub use engine::{EngineConfig, SchemaEngine};
pub use loader::{CatalogEntry, RegistryCatalog, RegistryLoader};
pub use reporter::{FailureReport, Rule, ValidationFailure};
pub use resolver::ReferenceResolver;
pub use rules::ConstraintValidator;

use restype_ir::SchemaPath;
use std::fmt;
use thiserror::Error;

/// Errors that can occur while compiling schemas
#[derive(Error, Debug)]
pub enum Error {
    /// The input is not schema-shaped; nothing else was checked
    #[error("Malformed input: {0}")]
    Malformed(ValidationFailure),

    /// The schema was checked and rejected
    #[error("Schema rejected with {} failure(s)", .0.len())]
    Rejected(FailureReport),

    /// A pipeline phase received input an earlier phase should have rejected
    #[error("Internal error at {path}: {message}")]
    Internal { path: SchemaPath, message: String },

    #[error("Registry error: {0}")]
    Registry(#[from] restype_schema::Error),

    #[error("Invalid format: {0}")]
    InvalidFormat(String),

    /// Catalog entries that never became resolvable
    #[error("{} catalog entries could not be registered: {}", .0.len(), entry_ids(.0))]
    Unregistered(Vec<RejectedEntry>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Build an internal-defect error at `path`.
    pub fn internal(path: SchemaPath, message: impl Into<String>) -> Self {
        Self::Internal {
            path,
            message: message.into(),
        }
    }

    /// The failure report when the schema was rejected or malformed
    #[must_use]
    pub fn report(&self) -> Option<FailureReport> {
        match self {
            Self::Rejected(report) => Some(report.clone()),
            Self::Malformed(failure) => Some(FailureReport::from(vec![failure.clone()])),
            _ => None,
        }
    }

    /// A report that is never empty, so a failed pipeline cannot read as
    /// accepted; errors without a report become one `InternalError` entry
    #[must_use]
    pub fn into_report(self) -> FailureReport {
        match self {
            Self::Rejected(report) => report,
            Self::Malformed(failure) => FailureReport::from(vec![failure]),
            Self::Internal { path, message } => {
                FailureReport::from(vec![ValidationFailure::new(path, Rule::InternalError, message)])
            }
            other => FailureReport::from(vec![ValidationFailure::new(
                SchemaPath::root(),
                Rule::InternalError,
                other.to_string(),
            )]),
        }
    }
}

impl From<restype_ir::Error> for Error {
    fn from(err: restype_ir::Error) -> Self {
        match err {
            restype_ir::Error::Malformed { path, message } => {
                Self::Malformed(ValidationFailure::new(path, Rule::MalformedInput, message))
            }
        }
    }
}

/// A catalog entry the loader gave up on, with the last error it produced
#[derive(Debug)]
pub struct RejectedEntry {
    pub id: String,
    pub error: Box<Error>,
}

impl fmt::Display for RejectedEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.id, self.error)
    }
}

fn entry_ids(entries: &[RejectedEntry]) -> String {
    entries
        .iter()
        .map(|entry| entry.id.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Crate-local result type for pipeline operations.
pub type Result<T> = std::result::Result<T, Error>;
