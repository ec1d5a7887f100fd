//! Canonical model builder
//!
//! Converts a validated, resolved tree into a [`TypeDescriptor`]. No rules
//! are enforced here; anything the earlier phases should have rejected is an
//! internal defect.

use crate::{Error, Result};
use restype_ir::{Reference, SchemaNode};
use restype_schema::{Kind, Property, TypeDescriptor, TypeHandle, ValidationAttributes};
use tracing::trace;

/// Builds canonical descriptors from resolved trees
#[derive(Debug, Clone, Copy, Default)]
pub struct ModelBuilder;

impl ModelBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Build the root descriptor.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Internal`] when the tree still holds an unresolved
    /// reference or an untyped node.
    pub fn build(&self, root: &SchemaNode) -> Result<TypeDescriptor> {
        if root.is_ref() {
            return Err(Error::internal(
                root.path.clone(),
                "the root cannot be a reference",
            ));
        }
        self.build_descriptor(root)
    }

    /// Handle for an `items` or map value position, where `$ref` metadata
    /// has no property to live on
    fn build_handle(&self, node: &SchemaNode) -> Result<TypeHandle> {
        let handle = self.build_target(node)?;
        Ok(handle.with_reference_metadata(
            node.description.as_deref(),
            node.read_only.unwrap_or(false),
        ))
    }

    fn build_target(&self, node: &SchemaNode) -> Result<TypeHandle> {
        match &node.reference {
            Some(Reference::Resolved { id, target }) => {
                Ok(TypeHandle::referenced(id.as_str(), target.clone()))
            }
            Some(Reference::Unresolved(id)) => Err(Error::internal(
                node.path.clone(),
                format!("reference '{id}' reached the builder unresolved"),
            )),
            None => self.build_descriptor(node).map(TypeHandle::authored),
        }
    }

    fn build_descriptor(&self, node: &SchemaNode) -> Result<TypeDescriptor> {
        let kind = node
            .declared_kind()
            .ok_or_else(|| Error::internal(node.path.clone(), "node has no supported type"))?;
        trace!(path = %node.path, %kind, "Building descriptor");

        let descriptor = match kind {
            Kind::Object => match node.map_value() {
                Some(value) => TypeDescriptor::map(self.build_handle(value)?),
                None => TypeDescriptor::object(self.build_properties(node)?),
            },
            Kind::Array => {
                let items = node.items.as_deref().ok_or_else(|| {
                    Error::internal(node.path.clone(), "array has no items schema")
                })?;
                TypeDescriptor::array(self.build_handle(items)?)
            }
            scalar => TypeDescriptor::scalar(scalar).ok_or_else(|| {
                Error::internal(node.path.clone(), format!("'{scalar}' is not a scalar kind"))
            })?,
        };

        let validation: ValidationAttributes = node
            .validation
            .iter()
            .map(|(keyword, value)| (keyword.clone(), value.clone()))
            .collect();
        let descriptor = descriptor
            .with_validation(validation)
            .with_read_only(node.read_only.unwrap_or(false));

        Ok(match &node.description {
            Some(description) => descriptor.with_description(description.as_str()),
            None => descriptor,
        })
    }

    fn build_properties(&self, node: &SchemaNode) -> Result<Vec<Property>> {
        let required = node.required.as_deref().unwrap_or_default();

        node.properties
            .iter()
            .flatten()
            .map(|entry| {
                let schema = &entry.schema;
                let property = Property::new(entry.name.as_str(), self.build_target(schema)?)
                    .required(required.contains(&entry.name))
                    .read_only(schema.read_only.unwrap_or(false));
                Ok(match &schema.description {
                    Some(description) => property.with_description(description.as_str()),
                    None => property,
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use restype_ir::parse;
    use restype_schema::Origin;
    use serde_json::json;
    use std::sync::Arc;

    #[test]
    fn test_builds_object_in_declaration_order() {
        let root = parse(&json!({
            "type": "object",
            "description": "A widget",
            "properties": {
                "size": {"type": "string", "enum": ["S", "M"], "description": "Size"},
                "count": {"type": "integer", "minimum": 0, "readOnly": true}
            },
            "required": ["size"]
        }))
        .unwrap();

        let descriptor = ModelBuilder::new().build(&root).unwrap();
        assert_eq!(descriptor.kind(), Kind::Object);
        assert_eq!(descriptor.description(), Some("A widget"));

        let names: Vec<&str> = descriptor.properties().iter().map(Property::name).collect();
        assert_eq!(names, ["size", "count"]);

        let size = descriptor.property("size").unwrap();
        assert!(size.is_required());
        assert_eq!(size.description(), Some("Size"));
        assert_eq!(size.ty().origin(), Origin::Authored);
        assert_eq!(
            size.ty().validation().enum_values(),
            Some(&[json!("S"), json!("M")][..])
        );

        let count = descriptor.property("count").unwrap();
        assert!(!count.is_required());
        assert!(count.is_read_only());
        assert_eq!(count.ty().validation().get("minimum"), Some(&json!(0)));
    }

    #[test]
    fn test_map_shape_becomes_map() {
        let root = parse(&json!({
            "type": "object",
            "properties": {
                "labels": {"type": "object", "additionalProperties": {"type": "string"}}
            }
        }))
        .unwrap();

        let descriptor = ModelBuilder::new().build(&root).unwrap();
        let labels = descriptor.property("labels").unwrap().ty();
        assert_eq!(labels.kind(), Kind::Map);
        assert_eq!(labels.element_type().unwrap().kind(), Kind::String);
        assert!(labels.properties().is_empty());
    }

    #[test]
    fn test_resolved_reference_is_shared() {
        let mut root = parse(&json!({
            "type": "object",
            "properties": {"status": {"$ref": "ns#Status", "description": "Current status"}}
        }))
        .unwrap();
        let shared = Arc::new(TypeDescriptor::scalar(Kind::String).unwrap());
        if let Some(properties) = root.properties.as_mut() {
            properties[0].schema.reference = Some(Reference::Resolved {
                id: "ns#Status".into(),
                target: shared.clone(),
            });
        }

        let descriptor = ModelBuilder::new().build(&root).unwrap();
        let status = descriptor.property("status").unwrap();
        assert!(status.ty().shares(&shared));
        assert_eq!(status.ty().origin(), Origin::Referenced("ns#Status"));
        assert_eq!(status.description(), Some("Current status"));
    }

    #[test]
    fn test_reference_metadata_kept_for_items_and_map_values() {
        let mut root = parse(&json!({
            "type": "object",
            "properties": {
                "list": {
                    "type": "array",
                    "items": {"$ref": "ns#S", "description": "item doc", "readOnly": true}
                },
                "m": {
                    "type": "object",
                    "additionalProperties": {"$ref": "ns#S", "description": "value doc"}
                }
            }
        }))
        .unwrap();
        let shared = Arc::new(TypeDescriptor::scalar(Kind::String).unwrap());
        let resolved = Reference::Resolved {
            id: "ns#S".into(),
            target: shared.clone(),
        };
        if let Some(properties) = root.properties.as_mut() {
            if let Some(items) = properties[0].schema.items.as_mut() {
                items.reference = Some(resolved.clone());
            }
            if let Some(restype_ir::AdditionalProperties::Schema(value)) =
                properties[1].schema.additional_properties.as_mut()
            {
                value.reference = Some(resolved);
            }
        }

        let descriptor = ModelBuilder::new().build(&root).unwrap();
        let item = descriptor.property("list").unwrap().ty().element_type().unwrap();
        assert!(item.shares(&shared));
        assert_eq!(item.description(), Some("item doc"));
        assert!(item.is_read_only());

        let value = descriptor.property("m").unwrap().ty().element_type().unwrap();
        assert_eq!(value.description(), Some("value doc"));
        assert!(!value.is_read_only());

        let rendered = serde_json::to_string(&descriptor).unwrap();
        assert!(rendered.contains("item doc"));
        assert!(rendered.contains("value doc"));
        assert_eq!(shared.description(), None);
    }

    #[test]
    fn test_unresolved_reference_is_internal_error() {
        let root = parse(&json!({
            "type": "object",
            "properties": {"status": {"$ref": "ns#Status"}}
        }))
        .unwrap();

        let err = ModelBuilder::new().build(&root).unwrap_err();
        assert!(matches!(err, Error::Internal { .. }));
    }

    #[test]
    fn test_untyped_node_is_internal_error() {
        let root = parse(&json!({"properties": {}})).unwrap();
        let err = ModelBuilder::new().build(&root).unwrap_err();
        assert!(err.to_string().contains("(root)"));
    }
}
