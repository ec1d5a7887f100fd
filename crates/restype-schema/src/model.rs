//! Canonical type-descriptor model

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::ops::Deref;
use std::sync::Arc;

/// The closed set of kinds a canonical descriptor can have
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Kind {
    /// Object with named properties
    Object,
    /// Object with a single value type for all keys
    Map,
    /// Homogeneous sequence
    Array,
    String,
    Number,
    Integer,
    Boolean,
}

impl Kind {
    /// Map a JSON-Schema `type` keyword value to a kind.
    ///
    /// `map` is never spelled out in a schema: it is derived from an object
    /// carrying `additionalProperties`, so it is not accepted here.
    #[must_use]
    pub fn from_type_keyword(value: &str) -> Option<Self> {
        match value {
            "object" => Some(Self::Object),
            "array" => Some(Self::Array),
            "string" => Some(Self::String),
            "number" => Some(Self::Number),
            "integer" => Some(Self::Integer),
            "boolean" => Some(Self::Boolean),
            _ => None,
        }
    }

    /// Lowercase name used in diagnostics and serialized output.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Object => "object",
            Self::Map => "map",
            Self::Array => "array",
            Self::String => "string",
            Self::Number => "number",
            Self::Integer => "integer",
            Self::Boolean => "boolean",
        }
    }

    /// True for `string`, `number`, `integer` and `boolean`.
    #[must_use]
    pub fn is_scalar(self) -> bool {
        matches!(
            self,
            Self::String | Self::Number | Self::Integer | Self::Boolean
        )
    }

    /// True for the two object-shaped kinds.
    #[must_use]
    pub fn is_object_like(self) -> bool {
        matches!(self, Self::Object | Self::Map)
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind-appropriate constraints (`enum`, `format`, `minLength`, ...)
///
/// Values are opaque to the engine and kept in declaration order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ValidationAttributes(Map<String, Value>);

impl ValidationAttributes {
    /// Create an empty attribute set
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace an attribute
    pub fn insert(&mut self, keyword: impl Into<String>, value: Value) {
        self.0.insert(keyword.into(), value);
    }

    /// Look up an attribute by keyword
    #[must_use]
    pub fn get(&self, keyword: &str) -> Option<&Value> {
        self.0.get(keyword)
    }

    /// Allowed values when an `enum` attribute is present
    #[must_use]
    pub fn enum_values(&self) -> Option<&[Value]> {
        self.0.get("enum").and_then(Value::as_array).map(Vec::as_slice)
    }

    /// Iterate attributes in declaration order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(String, Value)> for ValidationAttributes {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// The canonical, resolved representation of one schema node
///
/// Instances are built once per validation pass and never mutated afterwards.
/// The constructors only produce shapes that satisfy the kind rules: only
/// objects carry properties, only maps and arrays carry an element type.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TypeDescriptor {
    kind: Kind,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    properties: Vec<Property>,
    #[serde(skip_serializing_if = "Option::is_none")]
    element_type: Option<TypeHandle>,
    #[serde(skip_serializing_if = "ValidationAttributes::is_empty")]
    validation: ValidationAttributes,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    read_only: bool,
}

impl TypeDescriptor {
    fn with_kind(kind: Kind) -> Self {
        Self {
            kind,
            properties: Vec::new(),
            element_type: None,
            validation: ValidationAttributes::new(),
            description: None,
            read_only: false,
        }
    }

    /// Create a scalar descriptor.
    ///
    /// Passing a non-scalar kind yields `None`; use [`object`](Self::object),
    /// [`map`](Self::map) or [`array`](Self::array) for those.
    #[must_use]
    pub fn scalar(kind: Kind) -> Option<Self> {
        kind.is_scalar().then(|| Self::with_kind(kind))
    }

    /// Create an object descriptor with properties in declaration order
    #[must_use]
    pub fn object(properties: Vec<Property>) -> Self {
        Self {
            properties,
            ..Self::with_kind(Kind::Object)
        }
    }

    /// Create a map descriptor with the given value type
    #[must_use]
    pub fn map(value_type: TypeHandle) -> Self {
        Self {
            element_type: Some(value_type),
            ..Self::with_kind(Kind::Map)
        }
    }

    /// Create an array descriptor with the given item type
    #[must_use]
    pub fn array(item_type: TypeHandle) -> Self {
        Self {
            element_type: Some(item_type),
            ..Self::with_kind(Kind::Array)
        }
    }

    #[must_use]
    pub fn with_validation(mut self, validation: ValidationAttributes) -> Self {
        self.validation = validation;
        self
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    #[must_use]
    pub fn with_read_only(mut self, read_only: bool) -> Self {
        self.read_only = read_only;
        self
    }

    #[must_use]
    pub fn kind(&self) -> Kind {
        self.kind
    }

    /// Properties in declaration order (empty unless `kind = object`)
    #[must_use]
    pub fn properties(&self) -> &[Property] {
        &self.properties
    }

    /// Find a property by name
    #[must_use]
    pub fn property(&self, name: &str) -> Option<&Property> {
        self.properties.iter().find(|p| p.name == name)
    }

    /// Value type of a map or item type of an array
    #[must_use]
    pub fn element_type(&self) -> Option<&TypeHandle> {
        self.element_type.as_ref()
    }

    #[must_use]
    pub fn validation(&self) -> &ValidationAttributes {
        &self.validation
    }

    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    #[must_use]
    pub fn is_read_only(&self) -> bool {
        self.read_only
    }

    /// Ids this descriptor references directly.
    ///
    /// Authored subtrees are searched; shared subtrees are not entered, since
    /// their own edges belong to the registry entry they came from. Ids are
    /// returned once each, in first-seen order.
    #[must_use]
    pub fn direct_references(&self) -> Vec<&str> {
        let mut out = Vec::new();
        collect_references(self, &mut out);
        out
    }
}

fn collect_references<'a>(descriptor: &'a TypeDescriptor, out: &mut Vec<&'a str>) {
    let handles = descriptor
        .properties
        .iter()
        .map(|p| &p.ty)
        .chain(descriptor.element_type.iter());

    for handle in handles {
        match handle {
            TypeHandle::Authored(inner) => collect_references(inner, out),
            TypeHandle::Referenced { id, .. } => {
                if !out.contains(&id.as_str()) {
                    out.push(id.as_str());
                }
            }
        }
    }
}

/// Where a descriptor came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin<'a> {
    /// Declared inline in the document
    Authored,
    /// Resolved from the registry under this id
    Referenced(&'a str),
}

impl<'a> Origin<'a> {
    /// Short name of a referenced type: the fragment after `#`, or the last
    /// path segment when the id has no fragment.
    #[must_use]
    pub fn name(&self) -> Option<&'a str> {
        match *self {
            Origin::Authored => None,
            Origin::Referenced(id) => Some(reference_name(id)),
        }
    }
}

/// Short display name for a reference id
#[must_use]
pub fn reference_name(id: &str) -> &str {
    match id.rsplit_once('#') {
        Some((_, fragment)) if !fragment.is_empty() => fragment,
        _ => id.rsplit('/').next().unwrap_or(id),
    }
}

/// An owning or sharing pointer to a descriptor, tagged with its origin
///
/// Authored subtrees are owned exclusively. Referenced subtrees are shared
/// with the registry for the registry's lifetime; metadata written next to
/// the `$ref` stays on the handle since the shared descriptor is immutable.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "origin", rename_all = "lowercase")]
pub enum TypeHandle {
    Authored(Box<TypeDescriptor>),
    #[serde(rename_all = "camelCase")]
    Referenced {
        id: String,
        descriptor: Arc<TypeDescriptor>,
        #[serde(skip_serializing_if = "Option::is_none")]
        description: Option<String>,
        #[serde(skip_serializing_if = "std::ops::Not::not")]
        read_only: bool,
    },
}

impl TypeHandle {
    #[must_use]
    pub fn authored(descriptor: TypeDescriptor) -> Self {
        Self::Authored(Box::new(descriptor))
    }

    #[must_use]
    pub fn referenced(id: impl Into<String>, descriptor: Arc<TypeDescriptor>) -> Self {
        Self::Referenced {
            id: id.into(),
            descriptor,
            description: None,
            read_only: false,
        }
    }

    /// Attach reference-site metadata; authored handles carry theirs on the
    /// descriptor and are returned unchanged
    #[must_use]
    pub fn with_reference_metadata(mut self, text: Option<&str>, flag: bool) -> Self {
        if let Self::Referenced {
            description,
            read_only,
            ..
        } = &mut self
        {
            *description = text.map(str::to_string);
            *read_only = flag;
        }
        self
    }

    /// Description at this use site, falling back to the descriptor's own
    #[must_use]
    pub fn description(&self) -> Option<&str> {
        match self {
            Self::Referenced {
                description: Some(text),
                ..
            } => Some(text),
            _ => self.descriptor().description(),
        }
    }

    /// Read-only at this use site or on the descriptor itself
    #[must_use]
    pub fn is_read_only(&self) -> bool {
        match self {
            Self::Referenced { read_only: true, .. } => true,
            _ => self.descriptor().is_read_only(),
        }
    }

    #[must_use]
    pub fn origin(&self) -> Origin<'_> {
        match self {
            Self::Authored(_) => Origin::Authored,
            Self::Referenced { id, .. } => Origin::Referenced(id),
        }
    }

    #[must_use]
    pub fn descriptor(&self) -> &TypeDescriptor {
        match self {
            Self::Authored(descriptor) => descriptor.as_ref(),
            Self::Referenced { descriptor, .. } => descriptor.as_ref(),
        }
    }

    /// The shared descriptor, when this handle came from the registry
    #[must_use]
    pub fn shared(&self) -> Option<&Arc<TypeDescriptor>> {
        match self {
            Self::Authored(_) => None,
            Self::Referenced { descriptor, .. } => Some(descriptor),
        }
    }

    /// Identity comparison against a registry descriptor
    #[must_use]
    pub fn shares(&self, other: &Arc<TypeDescriptor>) -> bool {
        self.shared().is_some_and(|d| Arc::ptr_eq(d, other))
    }
}

impl Deref for TypeHandle {
    type Target = TypeDescriptor;

    fn deref(&self) -> &TypeDescriptor {
        self.descriptor()
    }
}

/// A named field of an object descriptor
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Property {
    name: String,
    #[serde(rename = "type")]
    ty: TypeHandle,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    required: bool,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    read_only: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<String>,
}

impl Property {
    /// Create an optional, writable property
    pub fn new(name: impl Into<String>, ty: TypeHandle) -> Self {
        Self {
            name: name.into(),
            ty,
            required: false,
            read_only: false,
            description: None,
        }
    }

    #[must_use]
    pub fn required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    #[must_use]
    pub fn read_only(mut self, read_only: bool) -> Self {
        self.read_only = read_only;
        self
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn ty(&self) -> &TypeHandle {
        &self.ty
    }

    #[must_use]
    pub fn is_required(&self) -> bool {
        self.required
    }

    #[must_use]
    pub fn is_read_only(&self) -> bool {
        self.read_only
    }

    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }
}
