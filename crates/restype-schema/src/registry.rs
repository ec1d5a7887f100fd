//! Closed reference registry
//!
//! The registry maps reference ids (URL-shaped strings such as
//! `https://radapp.io/schemas/v1#RecipeStatus`) to pre-validated descriptors.
//! It is built once and then shared read-only between validation passes.

use crate::model::TypeDescriptor;
use crate::{Error, Result};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::debug;

/// A registered built-in type
#[derive(Debug, Clone)]
pub struct RegistryEntry {
    id: String,
    resolved_type: Arc<TypeDescriptor>,
    references: Vec<String>,
}

impl RegistryEntry {
    /// Create an entry; outgoing reference edges are taken from the descriptor.
    pub fn new(id: impl Into<String>, resolved_type: TypeDescriptor) -> Self {
        let references = resolved_type
            .direct_references()
            .into_iter()
            .map(str::to_string)
            .collect();
        Self {
            id: id.into(),
            resolved_type: Arc::new(resolved_type),
            references,
        }
    }

    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// The shared descriptor every reference to this id resolves to
    #[must_use]
    pub fn resolved_type(&self) -> &Arc<TypeDescriptor> {
        &self.resolved_type
    }

    /// Ids this entry references directly
    #[must_use]
    pub fn references(&self) -> &[String] {
        &self.references
    }
}

/// Lookup contract the validation engine relies on
///
/// Implementations must be immutable for the lifetime of the engine.
pub trait ReferenceRegistry: Send + Sync {
    /// Resolve an id to its entry
    fn resolve(&self, id: &str) -> Option<&RegistryEntry>;

    /// Id prefixes that references may be drawn from
    fn allowed_namespaces(&self) -> &[String];

    /// Whether an id lies inside one of the allowed namespaces
    fn is_allowed(&self, id: &str) -> bool {
        self.allowed_namespaces()
            .iter()
            .any(|ns| in_namespace(ns, id))
    }

    /// Outgoing reference edges of an entry (empty for unknown ids)
    fn references(&self, id: &str) -> &[String] {
        match self.resolve(id) {
            Some(entry) => entry.references(),
            None => &[],
        }
    }
}

/// Prefix match that stops at a `#` or `/` boundary.
///
/// A namespace written without a trailing delimiter only admits ids that
/// continue with one, so `https://host/v1` does not admit `https://host/v1.x#T`.
fn in_namespace(namespace: &str, id: &str) -> bool {
    if namespace.is_empty() {
        return false;
    }
    let Some(rest) = id.strip_prefix(namespace) else {
        return false;
    };
    if namespace.ends_with(['#', '/']) {
        return !rest.is_empty();
    }
    rest.starts_with(['#', '/']) && rest.len() > 1
}

/// Tracks reference edges between registry entries to keep them acyclic
#[derive(Debug, Default)]
pub struct ReferenceGraph {
    edges: HashMap<String, Vec<String>>,
}

impl ReferenceGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_edge(&mut self, from: impl Into<String>, to: impl Into<String>) {
        self.edges.entry(from.into()).or_default().push(to.into());
    }

    /// Detect if adding `from -> to` would create a cycle
    #[must_use]
    pub fn would_create_cycle(&self, from: &str, to: &str) -> bool {
        if from == to {
            return true;
        }

        // Does `to` already reach `from`?
        let mut to_visit = vec![to];
        let mut visited = HashSet::new();

        while let Some(current) = to_visit.pop() {
            if current == from {
                return true;
            }
            if visited.insert(current) {
                if let Some(targets) = self.edges.get(current) {
                    to_visit.extend(targets.iter().map(String::as_str));
                }
            }
        }

        false
    }
}

/// In-process registry of built-in types
#[derive(Debug, Default)]
pub struct TypeRegistry {
    entries: HashMap<String, RegistryEntry>,
    namespaces: Vec<String>,
    graph: ReferenceGraph,
}

impl TypeRegistry {
    /// Create an empty registry accepting references from the given namespaces
    pub fn new<I, S>(namespaces: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            entries: HashMap::new(),
            namespaces: namespaces.into_iter().map(Into::into).collect(),
            graph: ReferenceGraph::new(),
        }
    }

    /// Register a descriptor under `id`.
    ///
    /// # Errors
    ///
    /// Fails when `id` is empty or already registered, or when the entry's
    /// references would close a cycle with existing entries.
    pub fn register(&mut self, id: impl Into<String>, descriptor: TypeDescriptor) -> Result<()> {
        let entry = RegistryEntry::new(id, descriptor);
        self.insert(entry)
    }

    /// Register a prepared entry.
    ///
    /// # Errors
    ///
    /// See [`register`](Self::register).
    pub fn insert(&mut self, entry: RegistryEntry) -> Result<()> {
        if entry.id.is_empty() {
            return Err(Error::invalid_entry("", "id must not be empty"));
        }
        if self.entries.contains_key(&entry.id) {
            return Err(Error::duplicate_entry(entry.id));
        }
        if let Some(via) = entry
            .references
            .iter()
            .find(|target| self.graph.would_create_cycle(&entry.id, target))
        {
            return Err(Error::cyclic_entry(&entry.id, via));
        }

        for target in &entry.references {
            self.graph.add_edge(&entry.id, target);
        }
        debug!(id = %entry.id, references = entry.references.len(), "Registered built-in type");
        self.entries.insert(entry.id.clone(), entry);
        Ok(())
    }

    /// Get an entry by id
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&RegistryEntry> {
        self.entries.get(id)
    }

    /// Check if an id is registered
    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }

    /// Registered ids, sorted
    #[must_use]
    pub fn ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.entries.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl ReferenceRegistry for TypeRegistry {
    fn resolve(&self, id: &str) -> Option<&RegistryEntry> {
        self.entries.get(id)
    }

    fn allowed_namespaces(&self) -> &[String] {
        &self.namespaces
    }
}
