//! Constraint validator for the restricted grammar
//!
//! Walks the intermediate tree depth-first and collects every violation in a
//! single pass. Failures are pushed onto an explicit accumulator; nothing
//! here returns early on the first problem.

use crate::reporter::{Rule, ValidationFailure};
use restype_ir::keyword::{self, validation_kinds};
use restype_ir::{AdditionalProperties, SchemaNode, TypeKeyword};
use restype_schema::Kind;
use serde_json::Value;
use tracing::trace;

/// Structural checks applied before reference resolution
#[derive(Debug, Clone, Copy, Default)]
pub struct ConstraintValidator;

impl ConstraintValidator {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Validate a whole document; an empty list means accepted
    #[must_use]
    pub fn validate(&self, root: &SchemaNode) -> Vec<ValidationFailure> {
        let mut failures = Vec::new();
        self.check_root(root, &mut failures);
        self.check_node(root, Rule::TypeRequired, &mut failures);
        trace!(failures = failures.len(), "Constraint validation finished");
        failures
    }

    fn check_root(&self, root: &SchemaNode, out: &mut Vec<ValidationFailure>) {
        if root.is_ref() {
            out.push(ValidationFailure::new(
                root.path.clone(),
                Rule::RootMustBeObject,
                "the document root must be an inline object, not a reference",
            ));
            return;
        }
        match root.effective_kind() {
            Some(Kind::Object) | None => {}
            Some(Kind::Map) => out.push(ValidationFailure::new(
                root.path.clone(),
                Rule::RootMustBeObject,
                "the document root must declare properties, not a map value type",
            )),
            Some(kind) => out.push(ValidationFailure::new(
                root.path.clone(),
                Rule::RootMustBeObject,
                format!("the document root must be an object, found '{kind}'"),
            )),
        }
    }

    /// `untyped` is the rule reported when this node lacks a `type`
    fn check_node(&self, node: &SchemaNode, untyped: Rule, out: &mut Vec<ValidationFailure>) {
        for name in &node.polymorphism {
            out.push(ValidationFailure::new(
                node.path.clone(),
                Rule::PolymorphismNotAllowed,
                format!("'{name}' is not allowed; polymorphic schemas are not supported"),
            ));
        }
        for name in &node.unknown {
            out.push(ValidationFailure::new(
                node.path.clone(),
                Rule::UnknownKeyword,
                format!("'{name}' is not a recognized schema keyword"),
            ));
        }

        if node.is_ref() {
            let extra = node.non_reference_keywords();
            if !extra.is_empty() {
                out.push(ValidationFailure::new(
                    node.path.clone(),
                    Rule::RefMustBeExclusive,
                    format!("'$ref' cannot be combined with: {}", extra.join(", ")),
                ));
            }
        } else {
            match &node.type_keyword {
                None => out.push(ValidationFailure::new(
                    node.path.clone(),
                    untyped,
                    match untyped {
                        Rule::ArrayItemTypeRequired => "array items must declare a type",
                        _ => "schema must declare a type",
                    },
                )),
                Some(TypeKeyword::Unsupported(value)) => out.push(ValidationFailure::new(
                    node.path.clone(),
                    Rule::UnsupportedType,
                    format!(
                        "type {value} is not supported; use one of object, array, string, number, integer, boolean"
                    ),
                )),
                Some(TypeKeyword::Known(kind)) => self.check_kind(node, *kind, out),
            }
        }

        self.check_children(node, out);
    }

    fn check_children(&self, node: &SchemaNode, out: &mut Vec<ValidationFailure>) {
        for property in node.properties.iter().flatten() {
            self.check_node(&property.schema, Rule::TypeRequired, out);
        }
        if let Some(value) = node.map_value() {
            self.check_node(value, Rule::TypeRequired, out);
        }
        if let Some(items) = &node.items {
            self.check_node(items, Rule::ArrayItemTypeRequired, out);
        }
    }

    fn check_kind(&self, node: &SchemaNode, kind: Kind, out: &mut Vec<ValidationFailure>) {
        let effective = node.effective_kind().unwrap_or(kind);

        if kind != Kind::Object {
            let misplaced = [
                (keyword::PROPERTIES, node.properties.is_some()),
                (keyword::ADDITIONAL_PROPERTIES, node.additional_properties.is_some()),
                (keyword::REQUIRED, node.required.is_some()),
            ];
            for (name, _) in misplaced.iter().filter(|(_, present)| *present) {
                out.push(incompatible(node, name, kind));
            }
        }
        if kind != Kind::Array && node.items.is_some() {
            out.push(incompatible(node, keyword::ITEMS, kind));
        }

        for (name, value) in &node.validation {
            let compatible =
                validation_kinds(name).is_some_and(|kinds| kinds.contains(&effective));
            if !compatible {
                out.push(incompatible(node, name, effective));
                continue;
            }
            match name.as_str() {
                "enum" => check_enum(node, value, effective, out),
                "default" if !matches_kind(value, effective) => {
                    out.push(ValidationFailure::new(
                        node.path.key(name.as_str()),
                        Rule::IncompatibleValidationAttribute,
                        format!("default {value} is not a valid '{effective}' value"),
                    ));
                }
                _ => {}
            }
        }

        match kind {
            Kind::Object => self.check_object(node, out),
            Kind::Array => self.check_array(node, out),
            _ => {}
        }
    }

    fn check_object(&self, node: &SchemaNode, out: &mut Vec<ValidationFailure>) {
        if node.properties.is_some() && node.map_value().is_some() {
            out.push(ValidationFailure::new(
                node.path.clone(),
                Rule::AmbiguousObjectShape,
                "object declares both properties and additionalProperties; use one shape",
            ));
        }
        if let Some(AdditionalProperties::Allowed(true)) = node.additional_properties {
            out.push(ValidationFailure::new(
                node.path.key(keyword::ADDITIONAL_PROPERTIES),
                Rule::TypeRequired,
                "additionalProperties must be a typed schema, not 'true'",
            ));
        }

        if let Some(required) = &node.required {
            let declared: Vec<&str> = node
                .properties
                .iter()
                .flatten()
                .map(|p| p.name.as_str())
                .collect();
            for (index, name) in required.iter().enumerate() {
                if !declared.contains(&name.as_str()) {
                    out.push(ValidationFailure::new(
                        node.path.key(keyword::REQUIRED).index(index),
                        Rule::UnknownRequiredProperty,
                        format!("required property '{name}' is not declared in properties"),
                    ));
                }
            }
        }
    }

    fn check_array(&self, node: &SchemaNode, out: &mut Vec<ValidationFailure>) {
        if node.items.is_none() {
            out.push(ValidationFailure::new(
                node.path.clone(),
                Rule::ArrayItemTypeRequired,
                "array must declare an items schema",
            ));
        }
    }
}

fn incompatible(node: &SchemaNode, name: &str, kind: Kind) -> ValidationFailure {
    ValidationFailure::new(
        node.path.key(name),
        Rule::IncompatibleValidationAttribute,
        format!("'{name}' is not valid on a '{kind}' node"),
    )
}

fn check_enum(node: &SchemaNode, value: &Value, kind: Kind, out: &mut Vec<ValidationFailure>) {
    let path = node.path.key("enum");
    let Value::Array(entries) = value else {
        out.push(ValidationFailure::new(
            path,
            Rule::IncompatibleValidationAttribute,
            "enum must be a list of values",
        ));
        return;
    };
    for (index, entry) in entries.iter().enumerate() {
        if !matches_kind(entry, kind) {
            out.push(ValidationFailure::new(
                path.index(index),
                Rule::IncompatibleValidationAttribute,
                format!("enum value {entry} is not a valid '{kind}' value"),
            ));
        }
    }
}

fn matches_kind(value: &Value, kind: Kind) -> bool {
    match kind {
        Kind::String => value.is_string(),
        Kind::Integer => value.is_i64() || value.is_u64(),
        Kind::Number => value.is_number(),
        Kind::Boolean => value.is_boolean(),
        Kind::Object | Kind::Map => value.is_object(),
        Kind::Array => value.is_array(),
    }
}
