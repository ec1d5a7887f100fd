//! Intermediate schema nodes

use crate::keyword;
use crate::path::SchemaPath;
use restype_schema::{Kind, TypeDescriptor};
use serde_json::{Map, Value};
use std::sync::Arc;

/// Raw value of a `type` keyword
#[derive(Debug, Clone, PartialEq)]
pub enum TypeKeyword {
    /// One of the six spellable kinds
    Known(Kind),
    /// Anything else, kept verbatim for the diagnostic
    Unsupported(Value),
}

/// Raw value of an `additionalProperties` keyword
#[derive(Debug, Clone, PartialEq)]
pub enum AdditionalProperties {
    Allowed(bool),
    Schema(Box<SchemaNode>),
}

/// A `$ref` before and after resolution
#[derive(Debug, Clone, PartialEq)]
pub enum Reference {
    Unresolved(String),
    Resolved {
        id: String,
        target: Arc<TypeDescriptor>,
    },
}

impl Reference {
    /// The reference id as authored
    #[must_use]
    pub fn id(&self) -> &str {
        match self {
            Self::Unresolved(id) | Self::Resolved { id, .. } => id,
        }
    }

    #[must_use]
    pub fn is_resolved(&self) -> bool {
        matches!(self, Self::Resolved { .. })
    }
}

/// A named entry of a `properties` keyword
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyNode {
    pub name: String,
    pub schema: SchemaNode,
}

/// One node of the intermediate tree
///
/// Nothing here is validated: the node mirrors the keywords found in the
/// source, including ones the grammar rejects.
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaNode {
    /// Location in the source document
    pub path: SchemaPath,
    pub type_keyword: Option<TypeKeyword>,
    /// Declared properties in source order
    pub properties: Option<Vec<PropertyNode>>,
    pub additional_properties: Option<AdditionalProperties>,
    pub items: Option<Box<SchemaNode>>,
    pub reference: Option<Reference>,
    pub required: Option<Vec<String>>,
    pub read_only: Option<bool>,
    pub description: Option<String>,
    /// Polymorphism keywords present on this node
    pub polymorphism: Vec<String>,
    /// Validation keywords with their opaque values
    pub validation: Map<String, Value>,
    /// Keywords outside the grammar
    pub unknown: Vec<String>,
}

impl SchemaNode {
    /// Create an empty node at `path`
    #[must_use]
    pub fn new(path: SchemaPath) -> Self {
        Self {
            path,
            type_keyword: None,
            properties: None,
            additional_properties: None,
            items: None,
            reference: None,
            required: None,
            read_only: None,
            description: None,
            polymorphism: Vec::new(),
            validation: Map::new(),
            unknown: Vec::new(),
        }
    }

    /// True when the node carries `$ref`
    #[must_use]
    pub fn is_ref(&self) -> bool {
        self.reference.is_some()
    }

    /// Declared kind, if the `type` keyword names a known one
    #[must_use]
    pub fn declared_kind(&self) -> Option<Kind> {
        match &self.type_keyword {
            Some(TypeKeyword::Known(kind)) => Some(*kind),
            _ => None,
        }
    }

    /// Map value schema, when `additionalProperties` is a schema
    #[must_use]
    pub fn map_value(&self) -> Option<&SchemaNode> {
        match &self.additional_properties {
            Some(AdditionalProperties::Schema(node)) => Some(&**node),
            _ => None,
        }
    }

    /// Kind after applying the map-shape rule
    ///
    /// An object whose `additionalProperties` is a schema is a map.
    #[must_use]
    pub fn effective_kind(&self) -> Option<Kind> {
        match self.declared_kind()? {
            Kind::Object if self.map_value().is_some() => Some(Kind::Map),
            kind => Some(kind),
        }
    }

    /// Keywords on this node other than `$ref` and metadata, in a stable order
    #[must_use]
    pub fn non_reference_keywords(&self) -> Vec<&str> {
        let mut present = Vec::new();
        if self.type_keyword.is_some() {
            present.push(keyword::TYPE);
        }
        if self.properties.is_some() {
            present.push(keyword::PROPERTIES);
        }
        if self.additional_properties.is_some() {
            present.push(keyword::ADDITIONAL_PROPERTIES);
        }
        if self.items.is_some() {
            present.push(keyword::ITEMS);
        }
        if self.required.is_some() {
            present.push(keyword::REQUIRED);
        }
        present.extend(self.polymorphism.iter().map(String::as_str));
        present.extend(self.validation.keys().map(String::as_str));
        present.extend(self.unknown.iter().map(String::as_str));
        present
    }

    /// Direct child schemas: properties, map value and items, in that order
    pub fn children(&self) -> impl Iterator<Item = &SchemaNode> {
        self.properties
            .iter()
            .flatten()
            .map(|p| &p.schema)
            .chain(self.map_value())
            .chain(self.items.as_deref())
    }

    /// Every reference id in the subtree, in document order
    #[must_use]
    pub fn reference_ids(&self) -> Vec<&str> {
        let mut ids = Vec::new();
        self.collect_reference_ids(&mut ids);
        ids
    }

    fn collect_reference_ids<'a>(&'a self, ids: &mut Vec<&'a str>) {
        if let Some(reference) = &self.reference {
            ids.push(reference.id());
        }
        for child in self.children() {
            child.collect_reference_ids(ids);
        }
    }
}
