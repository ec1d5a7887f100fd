//! CLI configuration file

use anyhow::{Context, Result};
use restype_validation::EngineConfig;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Settings read from `--config`
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    /// Replaces the namespaces declared by the registry catalog
    pub allowed_namespaces: Option<Vec<String>>,
    /// Catalog used when `--registry` is not given
    pub registry: Option<PathBuf>,
    pub engine: EngineConfig,
}

impl CliConfig {
    /// Read a YAML config file.
    ///
    /// A relative `registry` path is taken relative to the config file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        let mut config: Self = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse config {}", path.display()))?;

        if let (Some(registry), Some(base)) = (config.registry.as_mut(), path.parent()) {
            if registry.is_relative() {
                *registry = base.join(&*registry);
            }
        }
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_config() {
        let config: CliConfig = serde_yaml::from_str(
            r##"
allowed_namespaces: ["https://radapp.io/schemas/v1#"]
registry: registry/builtin.yaml
engine:
  max_depth: 16
  cache_documents: false
"##,
        )
        .unwrap();

        assert_eq!(
            config.allowed_namespaces,
            Some(vec!["https://radapp.io/schemas/v1#".to_string()])
        );
        assert_eq!(config.registry, Some(PathBuf::from("registry/builtin.yaml")));
        assert_eq!(config.engine.max_depth, 16);
        assert!(!config.engine.cache_documents);
    }

    #[test]
    fn test_defaults() {
        let config: CliConfig = serde_yaml::from_str("{}").unwrap();
        assert_eq!(config, CliConfig::default());
        assert_eq!(config.engine, EngineConfig::default());
    }
}
