//! Validation engine
//!
//! Runs the full pipeline for one schema document and optionally memoises
//! compiled documents by id.

use crate::builder::ModelBuilder;
use crate::reporter::FailureReport;
use crate::resolver::ReferenceResolver;
use crate::rules::ConstraintValidator;
use crate::{Error, Result};
use dashmap::DashMap;
use restype_ir::parser::DEFAULT_MAX_DEPTH;
use restype_ir::{Parser, SchemaNode};
use restype_schema::{ReferenceRegistry, TypeDescriptor};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, trace};

/// Engine configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Maximum schema nesting depth accepted by the parser
    pub max_depth: usize,
    /// Memoise compiled documents by id
    pub cache_documents: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            cache_documents: true,
        }
    }
}

impl EngineConfig {
    #[must_use]
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    #[must_use]
    pub fn with_cache_documents(mut self, cache_documents: bool) -> Self {
        self.cache_documents = cache_documents;
        self
    }
}

struct CachedDocument {
    input: Value,
    descriptor: Arc<TypeDescriptor>,
}

/// Compiles schema documents against a shared registry
///
/// The engine is `Send + Sync`; passes share nothing but the read-only
/// registry and the compile cache.
pub struct SchemaEngine {
    registry: Arc<dyn ReferenceRegistry>,
    config: EngineConfig,
    cache: DashMap<String, CachedDocument>,
}

impl SchemaEngine {
    /// Create an engine with the default configuration
    pub fn new(registry: Arc<dyn ReferenceRegistry>) -> Self {
        Self::with_config(registry, EngineConfig::default())
    }

    /// Create with specific configuration
    pub fn with_config(registry: Arc<dyn ReferenceRegistry>, config: EngineConfig) -> Self {
        Self {
            registry,
            config,
            cache: DashMap::new(),
        }
    }

    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    #[must_use]
    pub fn registry(&self) -> &dyn ReferenceRegistry {
        self.registry.as_ref()
    }

    /// Compile an anonymous schema document.
    ///
    /// # Errors
    ///
    /// [`Error::Malformed`] for input that is not schema-shaped and
    /// [`Error::Rejected`] with every grammar or reference failure found.
    pub fn compile(&self, schema: &Value) -> Result<TypeDescriptor> {
        compile_with(self.registry.as_ref(), &self.config, schema, None)
    }

    /// Compile a document that would itself be referenced as `document_id`.
    ///
    /// References leading back to `document_id` are rejected as cycles. With
    /// caching enabled, compiling the same id and input again returns the
    /// same `Arc`.
    ///
    /// # Errors
    ///
    /// See [`compile`](Self::compile).
    pub fn compile_document(
        &self,
        document_id: &str,
        schema: &Value,
    ) -> Result<Arc<TypeDescriptor>> {
        if self.config.cache_documents {
            if let Some(cached) = self.cache.get(document_id) {
                if cached.input == *schema {
                    debug!("Cache hit for document: {}", document_id);
                    return Ok(Arc::clone(&cached.descriptor));
                }
            }
        }

        let descriptor = Arc::new(compile_with(
            self.registry.as_ref(),
            &self.config,
            schema,
            Some(document_id),
        )?);

        if self.config.cache_documents {
            self.cache.insert(
                document_id.to_string(),
                CachedDocument {
                    input: schema.clone(),
                    descriptor: Arc::clone(&descriptor),
                },
            );
        }
        Ok(descriptor)
    }

    /// Check a schema without building it; an empty report means accepted
    #[must_use]
    pub fn validate(&self, schema: &Value) -> FailureReport {
        report_of(check(self.registry.as_ref(), &self.config, schema, None))
    }

    /// Like [`validate`](Self::validate), with cycle detection against `document_id`
    #[must_use]
    pub fn validate_document(&self, document_id: &str, schema: &Value) -> FailureReport {
        report_of(check(
            self.registry.as_ref(),
            &self.config,
            schema,
            Some(document_id),
        ))
    }

    /// Number of memoised documents
    #[must_use]
    pub fn cached_documents(&self) -> usize {
        self.cache.len()
    }

    pub fn clear_cache(&self) {
        self.cache.clear();
    }
}

impl fmt::Debug for SchemaEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SchemaEngine")
            .field("config", &self.config)
            .field("allowed_namespaces", &self.registry.allowed_namespaces())
            .field("cached_documents", &self.cache.len())
            .finish()
    }
}

/// Parse, validate and resolve; stops after the first phase that fails
pub(crate) fn check(
    registry: &dyn ReferenceRegistry,
    config: &EngineConfig,
    schema: &Value,
    document_id: Option<&str>,
) -> Result<SchemaNode> {
    let mut root = Parser::new().with_max_depth(config.max_depth).parse(schema)?;

    let failures = ConstraintValidator::new().validate(&root);
    if !failures.is_empty() {
        trace!(failures = failures.len(), "Schema failed constraint validation");
        return Err(Error::Rejected(failures.into()));
    }

    let resolver = match document_id {
        Some(id) => ReferenceResolver::for_document(registry, id),
        None => ReferenceResolver::new(registry),
    };
    let failures = resolver.resolve(&mut root);
    if !failures.is_empty() {
        trace!(failures = failures.len(), "Schema failed reference resolution");
        return Err(Error::Rejected(failures.into()));
    }

    Ok(root)
}

/// Run the full pipeline against `registry`
pub(crate) fn compile_with(
    registry: &dyn ReferenceRegistry,
    config: &EngineConfig,
    schema: &Value,
    document_id: Option<&str>,
) -> Result<TypeDescriptor> {
    let root = check(registry, config, schema, document_id)?;
    ModelBuilder::new().build(&root)
}

fn report_of(result: Result<SchemaNode>) -> FailureReport {
    match result {
        Ok(_) => FailureReport::new(),
        Err(err) => err.into_report(),
    }
}
