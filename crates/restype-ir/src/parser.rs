//! Schema parser
//!
//! Turns a decoded schema value into the intermediate tree. The only failure
//! mode is input that is not schema-shaped at all (a node that is not an
//! object, a `properties` that is not a mapping, and so on). Grammar
//! violations are recorded on the nodes and left to the validator.

use crate::keyword::{self, KeywordClass};
use crate::node::{AdditionalProperties, PropertyNode, Reference, SchemaNode, TypeKeyword};
use crate::path::SchemaPath;
use crate::{Error, Result};
use restype_schema::Kind;
use serde_json::Value;
use tracing::trace;

/// Default nesting limit for schema documents
pub const DEFAULT_MAX_DEPTH: usize = 64;

/// Parse a schema value with default settings
///
/// # Errors
///
/// Returns [`Error::Malformed`] when the value is not schema-shaped.
pub fn parse(value: &Value) -> Result<SchemaNode> {
    Parser::new().parse(value)
}

/// Configurable schema parser
#[derive(Debug, Clone, Copy)]
pub struct Parser {
    max_depth: usize,
}

impl Default for Parser {
    fn default() -> Self {
        Self::new()
    }
}

impl Parser {
    #[must_use]
    pub fn new() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    /// Limit how deeply schema nodes may nest
    #[must_use]
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Parse the root schema node.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Malformed`] when the value is not schema-shaped or
    /// nests deeper than the configured limit.
    pub fn parse(&self, value: &Value) -> Result<SchemaNode> {
        self.parse_node(value, SchemaPath::root(), 0)
    }

    fn parse_node(&self, value: &Value, path: SchemaPath, depth: usize) -> Result<SchemaNode> {
        if depth > self.max_depth {
            return Err(Error::malformed(
                path,
                format!("schema nests deeper than {} levels", self.max_depth),
            ));
        }
        let Value::Object(map) = value else {
            return Err(Error::malformed(
                path,
                format!("expected a schema object, found {}", json_type(value)),
            ));
        };

        trace!(%path, keywords = map.len(), "Parsing schema node");
        let mut node = SchemaNode::new(path);

        for (key, value) in map {
            match key.as_str() {
                keyword::TYPE => node.type_keyword = Some(type_keyword(value)),
                keyword::PROPERTIES => {
                    node.properties = Some(self.parse_properties(value, &node.path, depth)?);
                }
                keyword::ADDITIONAL_PROPERTIES => {
                    let child_path = node.path.key(keyword::ADDITIONAL_PROPERTIES);
                    node.additional_properties = Some(match value {
                        Value::Bool(allowed) => AdditionalProperties::Allowed(*allowed),
                        Value::Object(_) => AdditionalProperties::Schema(Box::new(
                            self.parse_node(value, child_path, depth + 1)?,
                        )),
                        other => {
                            return Err(Error::malformed(
                                child_path,
                                format!(
                                    "additionalProperties must be a boolean or a schema, found {}",
                                    json_type(other)
                                ),
                            ));
                        }
                    });
                }
                keyword::ITEMS => {
                    let child_path = node.path.key(keyword::ITEMS);
                    if !value.is_object() {
                        return Err(Error::malformed(
                            child_path,
                            format!("items must be a single schema, found {}", json_type(value)),
                        ));
                    }
                    node.items = Some(Box::new(self.parse_node(value, child_path, depth + 1)?));
                }
                keyword::REF => {
                    let id = expect_str(value, &node.path, key)?;
                    node.reference = Some(Reference::Unresolved(id.to_string()));
                }
                keyword::REQUIRED => node.required = Some(required_list(value, &node.path)?),
                keyword::READ_ONLY => {
                    let Value::Bool(read_only) = value else {
                        return Err(Error::malformed(
                            node.path.key(key.as_str()),
                            format!("readOnly must be a boolean, found {}", json_type(value)),
                        ));
                    };
                    node.read_only = Some(*read_only);
                }
                keyword::DESCRIPTION => {
                    node.description = Some(expect_str(value, &node.path, key)?.to_string());
                }
                other => match KeywordClass::of(other) {
                    KeywordClass::Polymorphism => node.polymorphism.push(key.clone()),
                    KeywordClass::Validation => {
                        node.validation.insert(key.clone(), value.clone());
                    }
                    // Structural and metadata keywords are all matched above
                    _ => node.unknown.push(key.clone()),
                },
            }
        }

        Ok(node)
    }

    fn parse_properties(
        &self,
        value: &Value,
        parent: &SchemaPath,
        depth: usize,
    ) -> Result<Vec<PropertyNode>> {
        let properties_path = parent.key(keyword::PROPERTIES);
        let Value::Object(map) = value else {
            return Err(Error::malformed(
                properties_path,
                format!("properties must be a mapping, found {}", json_type(value)),
            ));
        };

        map.iter()
            .map(|(name, schema)| {
                let schema = self.parse_node(schema, properties_path.key(name.as_str()), depth + 1)?;
                Ok(PropertyNode {
                    name: name.clone(),
                    schema,
                })
            })
            .collect()
    }
}

fn type_keyword(value: &Value) -> TypeKeyword {
    value
        .as_str()
        .and_then(Kind::from_type_keyword)
        .map_or_else(|| TypeKeyword::Unsupported(value.clone()), TypeKeyword::Known)
}

fn expect_str<'v>(value: &'v Value, parent: &SchemaPath, key: &str) -> Result<&'v str> {
    value.as_str().ok_or_else(|| {
        Error::malformed(
            parent.key(key),
            format!("{key} must be a string, found {}", json_type(value)),
        )
    })
}

fn required_list(value: &Value, parent: &SchemaPath) -> Result<Vec<String>> {
    let path = parent.key(keyword::REQUIRED);
    let Value::Array(entries) = value else {
        return Err(Error::malformed(
            path,
            format!("required must be a list of names, found {}", json_type(value)),
        ));
    };

    entries
        .iter()
        .enumerate()
        .map(|(index, entry)| {
            entry.as_str().map(str::to_string).ok_or_else(|| {
                Error::malformed(
                    path.index(index),
                    format!("required entries must be strings, found {}", json_type(entry)),
                )
            })
        })
        .collect()
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "an object",
    }
}
