//! Registry catalog loader
//!
//! A catalog lists the namespaces references may be drawn from and the
//! built-in types to register:
//!
//! ```yaml
//! namespaces: ["https://radapp.io/schemas/v1#"]
//! entries:
//!   - id: https://radapp.io/schemas/v1#RecipeStatus
//!     schema:
//!       type: object
//!       properties:
//!         phase: { type: string }
//! ```
//!
//! Entries may reference each other in any order. Each pass compiles the
//! pending entries against the registry built so far; the loader stops when
//! everything is registered or a pass makes no progress.

use crate::engine::{EngineConfig, compile_with};
use crate::{Error, RejectedEntry, Result};
use restype_schema::TypeRegistry;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;
use std::path::Path;
use tracing::{debug, info, trace, warn};

/// One built-in type as written in a catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub id: String,
    pub schema: Value,
}

/// Catalog file contents
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RegistryCatalog {
    #[serde(default)]
    pub namespaces: Vec<String>,
    #[serde(default)]
    pub entries: Vec<CatalogEntry>,
}

impl RegistryCatalog {
    /// Parse a catalog from a JSON string
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json)
            .map_err(|e| Error::InvalidFormat(format!("JSON parse error: {}", e)))
    }

    /// Parse a catalog from a YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml)
            .map_err(|e| Error::InvalidFormat(format!("YAML parse error: {}", e)))
    }

    /// Read a catalog file; `.yaml` and `.yml` are YAML, anything else JSON
    pub fn from_file(path: &Path) -> Result<Self> {
        trace!("Loading catalog from file: {:?}", path);
        let content = std::fs::read_to_string(path)?;

        if path
            .extension()
            .is_some_and(|e| e == "yaml" || e == "yml")
        {
            Self::from_yaml(&content)
        } else {
            Self::from_json(&content)
        }
    }
}

/// Builds a [`TypeRegistry`] from a catalog
#[derive(Debug, Clone, Default)]
pub struct RegistryLoader {
    config: EngineConfig,
    namespaces: Option<Vec<String>>,
}

impl RegistryLoader {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Compile entries with a specific engine configuration
    #[must_use]
    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    /// Use these namespaces instead of the catalog's own
    #[must_use]
    pub fn with_namespaces<I, S>(mut self, namespaces: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.namespaces = Some(namespaces.into_iter().map(Into::into).collect());
        self
    }

    /// Load and build a catalog file
    pub fn load_file(&self, path: &Path) -> Result<TypeRegistry> {
        info!("Loading registry catalog: {:?}", path);
        self.build(RegistryCatalog::from_file(path)?)
    }

    /// Register every catalog entry.
    ///
    /// # Errors
    ///
    /// [`Error::Registry`] for duplicate ids and [`Error::Unregistered`]
    /// listing every entry that could not be compiled once no further
    /// progress was possible.
    pub fn build(&self, catalog: RegistryCatalog) -> Result<TypeRegistry> {
        let RegistryCatalog {
            namespaces,
            entries,
        } = catalog;

        let mut seen = HashSet::new();
        for entry in &entries {
            if !seen.insert(entry.id.as_str()) {
                return Err(restype_schema::Error::duplicate_entry(&entry.id).into());
            }
        }

        let namespaces = self.namespaces.clone().unwrap_or(namespaces);
        let mut registry = TypeRegistry::new(namespaces);
        let mut pending = entries;
        let mut pass = 0;

        while !pending.is_empty() {
            pass += 1;
            let before = pending.len();
            let mut stuck = Vec::new();

            for entry in pending {
                let compiled =
                    compile_with(&registry, &self.config, &entry.schema, Some(entry.id.as_str()));
                match compiled {
                    Ok(descriptor) => registry.register(entry.id, descriptor)?,
                    Err(err) => stuck.push((entry, err)),
                }
            }
            debug!(
                pass,
                registered = before - stuck.len(),
                pending = stuck.len(),
                "Catalog pass finished"
            );

            if stuck.len() == before {
                for (entry, err) in &stuck {
                    warn!("Rejected catalog entry {}: {}", entry.id, err);
                }
                return Err(Error::Unregistered(
                    stuck
                        .into_iter()
                        .map(|(entry, err)| RejectedEntry {
                            id: entry.id,
                            error: Box::new(err),
                        })
                        .collect(),
                ));
            }
            pending = stuck.into_iter().map(|(entry, _)| entry).collect();
        }

        info!("Registered {} built-in types", registry.len());
        Ok(registry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reporter::Rule;
    use restype_schema::{Kind, ReferenceRegistry};

    const CATALOG: &str = r##"
namespaces: ["https://radapp.io/schemas/v1#"]
entries:
  - id: "https://radapp.io/schemas/v1#RecipeStatus"
    schema:
      type: object
      properties:
        phase: { type: string }
        output: { $ref: "https://radapp.io/schemas/v1#RecipeOutput" }
  - id: "https://radapp.io/schemas/v1#RecipeOutput"
    schema:
      type: object
      properties:
        values:
          type: object
          additionalProperties: { type: string }
"##;

    #[test]
    fn test_out_of_order_entries() {
        let catalog = RegistryCatalog::from_yaml(CATALOG).unwrap();
        let registry = RegistryLoader::new().build(catalog).unwrap();

        assert_eq!(registry.len(), 2);
        let status = registry
            .resolve("https://radapp.io/schemas/v1#RecipeStatus")
            .unwrap();
        let output = registry
            .resolve("https://radapp.io/schemas/v1#RecipeOutput")
            .unwrap();
        let values = output.resolved_type().property("values").unwrap();
        assert_eq!(values.ty().kind(), Kind::Map);
        assert!(
            status
                .resolved_type()
                .property("output")
                .unwrap()
                .ty()
                .shares(output.resolved_type())
        );
        assert_eq!(status.references(), ["https://radapp.io/schemas/v1#RecipeOutput"]);
    }

    #[test]
    fn test_unresolvable_entry_reported() {
        let catalog = RegistryCatalog::from_json(
            r##"{
                "namespaces": ["ns#"],
                "entries": [
                    {"id": "ns#Ok", "schema": {"type": "object", "properties": {}}},
                    {"id": "ns#Broken", "schema": {
                        "type": "object",
                        "properties": {"x": {"$ref": "ns#Nowhere"}}
                    }}
                ]
            }"##,
        )
        .unwrap();

        let err = RegistryLoader::new().build(catalog).unwrap_err();
        let rejected = match err {
            Error::Unregistered(rejected) => rejected,
            other => panic!("expected unregistered entries, got {other}"),
        };
        assert_eq!(rejected.len(), 1);
        assert_eq!(rejected[0].id, "ns#Broken");
        let report = rejected[0].error.report().unwrap();
        assert_eq!(report.rules(), [Rule::UnknownReference]);
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let catalog = RegistryCatalog {
            namespaces: vec!["ns#".into()],
            entries: vec![
                CatalogEntry {
                    id: "ns#A".into(),
                    schema: serde_json::json!({"type": "object"}),
                },
                CatalogEntry {
                    id: "ns#A".into(),
                    schema: serde_json::json!({"type": "object"}),
                },
            ],
        };
        let err = RegistryLoader::new().build(catalog).unwrap_err();
        assert!(matches!(
            err,
            Error::Registry(restype_schema::Error::DuplicateEntry { .. })
        ));
    }

    #[test]
    fn test_namespace_override() {
        let catalog = RegistryCatalog::from_yaml(CATALOG).unwrap();
        let err = RegistryLoader::new()
            .with_namespaces(["https://example.com/other#"])
            .build(catalog)
            .unwrap_err();
        // RecipeOutput has no references, so only RecipeStatus is stuck
        let rejected = match err {
            Error::Unregistered(rejected) => rejected,
            other => panic!("expected unregistered entries, got {other}"),
        };
        assert_eq!(rejected.len(), 1);
        let report = rejected[0].error.report().unwrap();
        assert!(report.has_rule(Rule::DisallowedReference));
    }

    #[test]
    fn test_invalid_yaml() {
        let err = RegistryCatalog::from_yaml("entries: [").unwrap_err();
        assert!(err.to_string().contains("YAML parse error"));
    }
}
