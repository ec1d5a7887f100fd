//! Validation failures and reports

use restype_ir::SchemaPath;
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;

/// The closed taxonomy of grammar violations
///
/// New rules may be added; existing rules are never widened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Rule {
    TypeRequired,
    AmbiguousObjectShape,
    UnknownRequiredProperty,
    ArrayItemTypeRequired,
    IncompatibleValidationAttribute,
    PolymorphismNotAllowed,
    RefMustBeExclusive,
    UnknownReference,
    DisallowedReference,
    CyclicReference,
    RootMustBeObject,
    /// `type` names something other than the six spellable kinds
    UnsupportedType,
    /// A keyword outside the restricted grammar
    UnknownKeyword,
    /// Input is not schema-shaped; aborts the pipeline
    MalformedInput,
    /// The pipeline failed for a reason other than the schema's content
    InternalError,
}

impl Rule {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::TypeRequired => "TypeRequired",
            Self::AmbiguousObjectShape => "AmbiguousObjectShape",
            Self::UnknownRequiredProperty => "UnknownRequiredProperty",
            Self::ArrayItemTypeRequired => "ArrayItemTypeRequired",
            Self::IncompatibleValidationAttribute => "IncompatibleValidationAttribute",
            Self::PolymorphismNotAllowed => "PolymorphismNotAllowed",
            Self::RefMustBeExclusive => "RefMustBeExclusive",
            Self::UnknownReference => "UnknownReference",
            Self::DisallowedReference => "DisallowedReference",
            Self::CyclicReference => "CyclicReference",
            Self::RootMustBeObject => "RootMustBeObject",
            Self::UnsupportedType => "UnsupportedType",
            Self::UnknownKeyword => "UnknownKeyword",
            Self::MalformedInput => "MalformedInput",
            Self::InternalError => "InternalError",
        }
    }

    /// Only malformed input stops the pipeline outright
    #[must_use]
    pub fn is_fatal(self) -> bool {
        matches!(self, Self::MalformedInput)
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One violation, located by its path from the document root
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationFailure {
    #[serde(serialize_with = "serialize_path")]
    pub path: SchemaPath,
    pub rule: Rule,
    pub message: String,
}

impl ValidationFailure {
    pub fn new(path: SchemaPath, rule: Rule, message: impl Into<String>) -> Self {
        Self {
            path,
            rule,
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: [{}] {}", self.path, self.rule, self.message)
    }
}

fn serialize_path<S: Serializer>(path: &SchemaPath, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(path)
}

/// Ordered failures from one validation pass
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FailureReport {
    failures: Vec<ValidationFailure>,
}

impl FailureReport {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, failure: ValidationFailure) {
        self.failures.push(failure);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.failures.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.failures.is_empty()
    }

    #[must_use]
    pub fn failures(&self) -> &[ValidationFailure] {
        &self.failures
    }

    /// Whether any failure carries `rule`
    #[must_use]
    pub fn has_rule(&self, rule: Rule) -> bool {
        self.failures.iter().any(|f| f.rule == rule)
    }

    /// Rules in report order
    #[must_use]
    pub fn rules(&self) -> Vec<Rule> {
        self.failures.iter().map(|f| f.rule).collect()
    }

    #[must_use]
    pub fn into_inner(self) -> Vec<ValidationFailure> {
        self.failures
    }
}

impl From<Vec<ValidationFailure>> for FailureReport {
    fn from(failures: Vec<ValidationFailure>) -> Self {
        Self { failures }
    }
}

impl IntoIterator for FailureReport {
    type Item = ValidationFailure;
    type IntoIter = std::vec::IntoIter<ValidationFailure>;

    fn into_iter(self) -> Self::IntoIter {
        self.failures.into_iter()
    }
}

impl<'a> IntoIterator for &'a FailureReport {
    type Item = &'a ValidationFailure;
    type IntoIter = std::slice::Iter<'a, ValidationFailure>;

    fn into_iter(self) -> Self::IntoIter {
        self.failures.iter()
    }
}

impl fmt::Display for FailureReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, failure) in self.failures.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "  {failure}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> FailureReport {
        FailureReport::from(vec![
            ValidationFailure::new(
                SchemaPath::root(),
                Rule::AmbiguousObjectShape,
                "object declares both properties and additionalProperties",
            ),
            ValidationFailure::new(
                SchemaPath::root().key("properties").key("tags"),
                Rule::ArrayItemTypeRequired,
                "array must declare an items schema",
            ),
        ])
    }

    #[test]
    fn test_report_helpers() {
        let report = sample();
        assert_eq!(report.len(), 2);
        assert!(report.has_rule(Rule::ArrayItemTypeRequired));
        assert!(!report.has_rule(Rule::CyclicReference));
        assert_eq!(
            report.rules(),
            [Rule::AmbiguousObjectShape, Rule::ArrayItemTypeRequired]
        );
    }

    #[test]
    fn test_display() {
        let text = sample().to_string();
        assert_eq!(
            text,
            "  (root): [AmbiguousObjectShape] object declares both properties and additionalProperties\n  \
             properties.tags: [ArrayItemTypeRequired] array must declare an items schema"
        );
    }

    #[test]
    fn test_serialize() {
        let value = serde_json::to_value(sample()).unwrap();
        assert_eq!(value[1]["path"], "properties.tags");
        assert_eq!(value[1]["rule"], "ArrayItemTypeRequired");
        assert_eq!(value[0]["path"], "(root)");
    }

    #[test]
    fn test_only_malformed_input_is_fatal() {
        assert!(Rule::MalformedInput.is_fatal());
        assert!(!Rule::CyclicReference.is_fatal());
    }
}
