//! Reference resolver
//!
//! Binds every `$ref` in a structurally valid tree to the registry's shared
//! descriptor. Cycle detection walks registry reference edges depth-first
//! with the document being validated at the bottom of the stack, so a chain
//! of built-in types that leads back to the document is caught as well as a
//! direct self-reference.

use crate::reporter::{Rule, ValidationFailure};
use restype_ir::{AdditionalProperties, Reference, SchemaNode};
use restype_schema::ReferenceRegistry;
use std::collections::HashSet;
use tracing::{debug, trace};

/// Resolves `$ref` nodes against a [`ReferenceRegistry`]
#[derive(Clone, Copy)]
pub struct ReferenceResolver<'r> {
    registry: &'r dyn ReferenceRegistry,
    document_id: Option<&'r str>,
}

impl<'r> ReferenceResolver<'r> {
    /// Resolver for an anonymous document
    #[must_use]
    pub fn new(registry: &'r dyn ReferenceRegistry) -> Self {
        Self {
            registry,
            document_id: None,
        }
    }

    /// Resolver for a document that would itself be referenced as `document_id`
    #[must_use]
    pub fn for_document(registry: &'r dyn ReferenceRegistry, document_id: &'r str) -> Self {
        Self {
            registry,
            document_id: Some(document_id),
        }
    }

    /// Resolve every reference in `root`.
    ///
    /// Resolved references are rewritten in place. The returned list holds a
    /// failure for every reference that could not be bound; it is empty when
    /// the whole tree resolved.
    pub fn resolve(&self, root: &mut SchemaNode) -> Vec<ValidationFailure> {
        let mut pass = Pass {
            resolver: self,
            cleared: HashSet::new(),
            failures: Vec::new(),
        };
        pass.visit(root);
        pass.failures
    }

    /// The reference chain leading from `id` back onto the stack, if any
    fn find_cycle(
        &self,
        id: &'r str,
        stack: &mut Vec<&'r str>,
        cleared: &mut HashSet<&'r str>,
    ) -> Option<Vec<&'r str>> {
        if let Some(start) = stack.iter().position(|entry| *entry == id) {
            let mut cycle = stack[start..].to_vec();
            cycle.push(id);
            return Some(cycle);
        }
        if cleared.contains(id) {
            return None;
        }

        let registry: &'r dyn ReferenceRegistry = self.registry;
        stack.push(id);
        for next in registry.references(id) {
            if let Some(cycle) = self.find_cycle(next, stack, cleared) {
                return Some(cycle);
            }
        }
        stack.pop();
        cleared.insert(id);
        None
    }
}

impl std::fmt::Debug for ReferenceResolver<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReferenceResolver")
            .field("allowed_namespaces", &self.registry.allowed_namespaces())
            .field("document_id", &self.document_id)
            .finish()
    }
}

/// State for one resolution pass
struct Pass<'p, 'r> {
    resolver: &'p ReferenceResolver<'r>,
    /// Ids explored without reaching the stack; valid for this pass only
    cleared: HashSet<&'r str>,
    failures: Vec<ValidationFailure>,
}

impl<'r> Pass<'_, 'r> {
    fn visit(&mut self, node: &mut SchemaNode) {
        if let Some(Reference::Unresolved(id)) = &node.reference {
            let id = id.clone();
            match self.bind(&id, node) {
                Some(reference) => node.reference = Some(reference),
                None => trace!(%id, path = %node.path, "Reference left unresolved"),
            }
        }

        for property in node.properties.iter_mut().flatten() {
            self.visit(&mut property.schema);
        }
        if let Some(AdditionalProperties::Schema(value)) = &mut node.additional_properties {
            self.visit(value);
        }
        if let Some(items) = &mut node.items {
            self.visit(items);
        }
    }

    fn bind(&mut self, id: &str, node: &SchemaNode) -> Option<Reference> {
        let resolver = self.resolver;
        let registry = resolver.registry;

        if !registry.is_allowed(id) {
            self.fail(
                node,
                Rule::DisallowedReference,
                format!("'{id}' is outside the allowed reference namespaces"),
            );
            return None;
        }
        if resolver.document_id == Some(id) {
            self.fail(
                node,
                Rule::CyclicReference,
                format!("schema references itself: {id} -> {id}"),
            );
            return None;
        }
        let Some(entry) = registry.resolve(id) else {
            self.fail(
                node,
                Rule::UnknownReference,
                format!("'{id}' is not a registered type"),
            );
            return None;
        };

        let mut stack: Vec<&'r str> = resolver.document_id.into_iter().collect();
        if let Some(cycle) = resolver.find_cycle(entry.id(), &mut stack, &mut self.cleared) {
            debug!(%id, cycle = cycle.len(), "Reference cycle detected");
            self.fail(
                node,
                Rule::CyclicReference,
                format!("reference cycle: {}", cycle.join(" -> ")),
            );
            return None;
        }

        trace!(%id, path = %node.path, "Resolved reference");
        Some(Reference::Resolved {
            id: id.to_string(),
            target: entry.resolved_type().clone(),
        })
    }

    fn fail(&mut self, node: &SchemaNode, rule: Rule, message: String) {
        self.failures
            .push(ValidationFailure::new(node.path.clone(), rule, message));
    }
}
