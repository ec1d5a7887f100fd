use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use restype_schema::{Kind, Origin, ReferenceRegistry};
use restype_validation::{Error, EngineConfig, RegistryLoader, Rule, SchemaEngine};
use serde_json::json;

fn repo_root() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../..")
}

fn catalog_path() -> PathBuf {
    repo_root().join("testdata/registry/builtin.yaml")
}

#[test]
fn builtin_catalog_loads_out_of_order_entries() {
    let registry = RegistryLoader::new()
        .load_file(&catalog_path())
        .expect("catalog should load");

    assert_eq!(
        registry.ids(),
        [
            "https://radapp.io/schemas/v1#RecipeOutputs",
            "https://radapp.io/schemas/v1#RecipeStatus",
        ]
    );
    assert_eq!(registry.allowed_namespaces(), ["https://radapp.io/schemas/v1#"]);

    let status = registry
        .resolve("https://radapp.io/schemas/v1#RecipeStatus")
        .expect("status entry");
    let outputs = status
        .resolved_type()
        .property("outputs")
        .expect("outputs property");
    assert_eq!(
        outputs.ty().origin(),
        Origin::Referenced("https://radapp.io/schemas/v1#RecipeOutputs")
    );
    assert_eq!(
        outputs.ty().property("values").expect("values").ty().kind(),
        Kind::Map
    );
}

#[test]
fn documents_compile_against_loaded_catalog() -> anyhow::Result<()> {
    let registry = RegistryLoader::new()
        .with_config(EngineConfig::default().with_max_depth(16))
        .load_file(&catalog_path())?;
    let registry = Arc::new(registry);
    let engine = SchemaEngine::new(registry.clone());

    let descriptor = engine.compile_document(
        "Applications.Test/widgets@2023-10-01-preview",
        &json!({
            "type": "object",
            "properties": {
                "status": {"$ref": "https://radapp.io/schemas/v1#RecipeStatus", "readOnly": true}
            }
        }),
    )?;

    let shared = registry
        .get("https://radapp.io/schemas/v1#RecipeStatus")
        .context("status entry")?
        .resolved_type();
    let status = descriptor.property("status").context("status property")?;
    assert!(status.ty().shares(shared));
    assert!(status.is_read_only());
    Ok(())
}

#[test]
fn missing_catalog_is_an_io_error() {
    let err = RegistryLoader::new()
        .load_file(&repo_root().join("testdata/registry/missing.yaml"))
        .unwrap_err();
    assert!(matches!(err, Error::Io(_)));
}

#[test]
fn catalog_entry_must_be_an_object() {
    let catalog = restype_validation::RegistryCatalog::from_json(
        r##"{
            "namespaces": ["ns#"],
            "entries": [{"id": "ns#Name", "schema": {"type": "string"}}]
        }"##,
    )
    .expect("catalog should parse");

    let Err(Error::Unregistered(rejected)) = RegistryLoader::new().build(catalog) else {
        panic!("string entry should be rejected");
    };
    let report = rejected[0].error.report().expect("a failure report");
    assert_eq!(report.rules(), [Rule::RootMustBeObject]);
}
