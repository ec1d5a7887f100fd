//! Keyword classification for the restricted grammar

use restype_schema::Kind;

pub const TYPE: &str = "type";
pub const PROPERTIES: &str = "properties";
pub const ADDITIONAL_PROPERTIES: &str = "additionalProperties";
pub const ITEMS: &str = "items";
pub const REF: &str = "$ref";
pub const REQUIRED: &str = "required";
pub const READ_ONLY: &str = "readOnly";
pub const DESCRIPTION: &str = "description";

/// Keywords that introduce polymorphism and are never accepted
pub const POLYMORPHISM: &[&str] = &["allOf", "anyOf", "oneOf", "not"];

const STRING_LIKE: &[Kind] = &[Kind::String, Kind::Number, Kind::Integer];
const SCALAR: &[Kind] = &[Kind::String, Kind::Number, Kind::Integer, Kind::Boolean];
const NUMERIC: &[Kind] = &[Kind::Number, Kind::Integer];
const OBJECT_LIKE: &[Kind] = &[Kind::Object, Kind::Map];

/// Validation keywords and the kinds they may appear on
const VALIDATION: &[(&str, &[Kind])] = &[
    ("enum", STRING_LIKE),
    ("format", STRING_LIKE),
    ("default", SCALAR),
    ("pattern", &[Kind::String]),
    ("minLength", &[Kind::String]),
    ("maxLength", &[Kind::String]),
    ("minimum", NUMERIC),
    ("maximum", NUMERIC),
    ("exclusiveMinimum", NUMERIC),
    ("exclusiveMaximum", NUMERIC),
    ("multipleOf", NUMERIC),
    ("minItems", &[Kind::Array]),
    ("maxItems", &[Kind::Array]),
    ("uniqueItems", &[Kind::Array]),
    ("minProperties", OBJECT_LIKE),
    ("maxProperties", OBJECT_LIKE),
];

/// How the grammar treats a keyword
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeywordClass {
    /// Shapes the tree: `type`, `properties`, `additionalProperties`, `items`, `$ref`, `required`
    Structural,
    /// `description` and `readOnly`
    Metadata,
    /// `allOf`, `anyOf`, `oneOf`, `not`
    Polymorphism,
    /// Kind-specific constraint kept opaque
    Validation,
    Unknown,
}

impl KeywordClass {
    #[must_use]
    pub fn of(keyword: &str) -> Self {
        match keyword {
            TYPE | PROPERTIES | ADDITIONAL_PROPERTIES | ITEMS | REF | REQUIRED => Self::Structural,
            READ_ONLY | DESCRIPTION => Self::Metadata,
            k if POLYMORPHISM.contains(&k) => Self::Polymorphism,
            k if validation_kinds(k).is_some() => Self::Validation,
            _ => Self::Unknown,
        }
    }
}

/// Kinds a validation keyword is compatible with
#[must_use]
pub fn validation_kinds(keyword: &str) -> Option<&'static [Kind]> {
    VALIDATION
        .iter()
        .find(|(name, _)| *name == keyword)
        .map(|(_, kinds)| *kinds)
}
