//! Resource-type manifest reader
//!
//! ```yaml
//! namespace: Applications.Test
//! types:
//!   widgets:
//!     apiVersions:
//!       "2023-10-01-preview":
//!         schema:
//!           type: object
//!           properties: { ... }
//! ```

use anyhow::{Context, Result, bail};
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::Path;

#[derive(Debug, Clone, Deserialize)]
pub struct ResourceManifest {
    pub namespace: String,
    #[serde(default)]
    pub types: BTreeMap<String, ResourceType>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceType {
    #[serde(default)]
    pub api_versions: BTreeMap<String, ApiVersion>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiVersion {
    pub schema: Value,
}

/// One schema to compile, with the id it would be referenced by
#[derive(Debug, Clone, Copy)]
pub struct SchemaDocument<'a> {
    pub type_name: &'a str,
    pub api_version: &'a str,
    pub schema: &'a Value,
}

impl ResourceManifest {
    /// Read a manifest; `.json` files are JSON, anything else YAML
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read manifest {}", path.display()))?;

        let manifest: Self = if path.extension().is_some_and(|e| e == "json") {
            serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse manifest {}", path.display()))?
        } else {
            serde_yaml::from_str(&content)
                .with_context(|| format!("Failed to parse manifest {}", path.display()))?
        };

        if manifest.namespace.trim().is_empty() {
            bail!("Manifest {} has an empty namespace", path.display());
        }
        Ok(manifest)
    }

    /// Every schema in the manifest, ordered by type name then API version
    pub fn documents(&self) -> impl Iterator<Item = SchemaDocument<'_>> {
        self.types.iter().flat_map(|(type_name, ty)| {
            ty.api_versions
                .iter()
                .map(move |(api_version, version)| SchemaDocument {
                    type_name,
                    api_version,
                    schema: &version.schema,
                })
        })
    }

    /// Look up one schema
    pub fn document(&self, type_name: &str, api_version: &str) -> Result<SchemaDocument<'_>> {
        let (type_name, ty) = self
            .types
            .get_key_value(type_name)
            .with_context(|| format!("Type '{type_name}' is not declared in {}", self.namespace))?;
        let (api_version, version) = ty.api_versions.get_key_value(api_version).with_context(
            || format!("Type '{type_name}' has no API version '{api_version}'"),
        )?;

        Ok(SchemaDocument {
            type_name,
            api_version,
            schema: &version.schema,
        })
    }

    /// Fully qualified id of a document, e.g. `Applications.Test/widgets@2023-10-01`
    pub fn document_id(&self, document: &SchemaDocument<'_>) -> String {
        format!(
            "{}/{}@{}",
            self.namespace, document.type_name, document.api_version
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MANIFEST: &str = r##"
namespace: Applications.Test
types:
  widgets:
    apiVersions:
      "2023-10-01-preview":
        schema:
          type: object
          properties:
            size: { type: string }
      "2024-01-01":
        schema:
          type: object
  gadgets:
    apiVersions:
      "2023-10-01-preview":
        schema:
          type: object
"##;

    fn manifest() -> ResourceManifest {
        serde_yaml::from_str(MANIFEST).unwrap()
    }

    #[test]
    fn test_documents_in_stable_order() {
        let manifest = manifest();
        let ids: Vec<String> = manifest
            .documents()
            .map(|doc| manifest.document_id(&doc))
            .collect();
        assert_eq!(
            ids,
            [
                "Applications.Test/gadgets@2023-10-01-preview",
                "Applications.Test/widgets@2023-10-01-preview",
                "Applications.Test/widgets@2024-01-01",
            ]
        );
    }

    #[test]
    fn test_lookup() {
        let manifest = manifest();
        let doc = manifest.document("widgets", "2023-10-01-preview").unwrap();
        assert_eq!(doc.schema["properties"]["size"]["type"], "string");

        let err = manifest.document("widgets", "1999-01-01").unwrap_err();
        assert!(err.to_string().contains("no API version"));
        assert!(manifest.document("missing", "2024-01-01").is_err());
    }
}
