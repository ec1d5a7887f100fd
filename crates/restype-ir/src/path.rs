//! Paths from the document root

use serde::Serialize;
use std::fmt;

/// One step in a [`SchemaPath`]
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(untagged)]
pub enum PathToken {
    /// Keyword or property name
    Key(String),
    /// Position in a list keyword such as `required`
    Index(usize),
}

/// Location of a node inside the schema document
///
/// Paths follow the document's own structure, so a property `size` of the
/// root is at `properties.size` and its array items at
/// `properties.size.items`. The empty path is the root.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct SchemaPath(Vec<PathToken>);

impl SchemaPath {
    /// The document root
    #[must_use]
    pub fn root() -> Self {
        Self::default()
    }

    /// Extend with a key token
    #[must_use]
    pub fn key(&self, key: impl Into<String>) -> Self {
        let mut tokens = self.0.clone();
        tokens.push(PathToken::Key(key.into()));
        Self(tokens)
    }

    /// Extend with an index token
    #[must_use]
    pub fn index(&self, index: usize) -> Self {
        let mut tokens = self.0.clone();
        tokens.push(PathToken::Index(index));
        Self(tokens)
    }

    #[must_use]
    pub fn tokens(&self) -> &[PathToken] {
        &self.0
    }

    #[must_use]
    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of tokens from the root
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<S: Into<String>> FromIterator<S> for SchemaPath {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(|s| PathToken::Key(s.into())).collect())
    }
}

impl fmt::Display for SchemaPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return f.write_str("(root)");
        }
        for (i, token) in self.0.iter().enumerate() {
            match token {
                PathToken::Key(key) if needs_quoting(key) => write!(f, "[{key:?}]")?,
                PathToken::Key(key) if i == 0 => write!(f, "{key}")?,
                PathToken::Key(key) => write!(f, ".{key}")?,
                PathToken::Index(index) => write!(f, "[{index}]")?,
            }
        }
        Ok(())
    }
}

/// Keys that would read as more than one token are shown as `["a.b"]`
fn needs_quoting(key: &str) -> bool {
    key.is_empty() || key.contains(['.', '[', ']', '"'])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_root_display() {
        assert_eq!(SchemaPath::root().to_string(), "(root)");
        assert!(SchemaPath::root().is_root());
    }

    #[test]
    fn test_dotted_and_indexed_display() {
        let path = SchemaPath::root()
            .key("properties")
            .key("size")
            .key("required")
            .index(2);
        assert_eq!(path.to_string(), "properties.size.required[2]");
        assert_eq!(path.len(), 4);
    }

    #[test]
    fn test_ambiguous_keys_are_quoted() {
        let dotted = SchemaPath::root().key("properties").key("a.b");
        let nested = SchemaPath::root().key("properties").key("a").key("b");
        assert_eq!(dotted.to_string(), r#"properties["a.b"]"#);
        assert_eq!(nested.to_string(), "properties.a.b");

        let bracketed = SchemaPath::root().key("properties").key("x[0]").key("items");
        assert_eq!(bracketed.to_string(), r#"properties["x[0]"].items"#);
        assert_eq!(SchemaPath::root().key("").to_string(), r#"[""]"#);
    }

    #[test]
    fn test_from_iter() {
        let path: SchemaPath = ["properties", "tags", "items"].into_iter().collect();
        assert_eq!(path, SchemaPath::root().key("properties").key("tags").key("items"));
    }

    #[test]
    fn test_serialize_tokens() {
        let path = SchemaPath::root().key("required").index(0);
        assert_eq!(serde_json::to_string(&path).unwrap(), r#"["required",0]"#);
    }
}
