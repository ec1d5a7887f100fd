mod support;

use std::ffi::OsStr;
use std::process::Output;

use support::{restype, stderr, stdout, testdata};

fn run_describe(manifest: &str, type_name: &str, api_version: &str, registry: bool) -> Output {
    let manifest = testdata(manifest);
    let catalog = testdata("registry/builtin.yaml");
    let mut args: Vec<&OsStr> = vec![
        OsStr::new("describe"),
        manifest.as_os_str(),
        OsStr::new("--type"),
        OsStr::new(type_name),
        OsStr::new("--api-version"),
        OsStr::new(api_version),
    ];
    if registry {
        args.extend([OsStr::new("--registry"), catalog.as_os_str()]);
    }
    restype(args)
}

#[test]
fn describe_prints_canonical_descriptor() {
    let output = run_describe(
        "manifests/widgets.yaml",
        "widgets",
        "2023-10-01-preview",
        true,
    );
    assert!(
        output.status.success(),
        "stderr: {}",
        stderr(&output)
    );

    let descriptor: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("stdout should be JSON");
    assert_eq!(descriptor["kind"], "object");

    let properties = descriptor["properties"].as_array().expect("properties");
    let names: Vec<&str> = properties
        .iter()
        .filter_map(|p| p["name"].as_str())
        .collect();
    assert_eq!(names, ["size", "replicas", "labels", "status"]);

    assert_eq!(properties[0]["required"], true);
    assert_eq!(properties[0]["type"]["validation"]["enum"][3], "XL");
    assert_eq!(properties[2]["type"]["kind"], "map");
    assert_eq!(properties[2]["type"]["elementType"]["kind"], "string");

    let status = &properties[3];
    assert_eq!(status["readOnly"], true);
    assert_eq!(status["type"]["origin"], "referenced");
    assert_eq!(status["type"]["id"], "https://radapp.io/schemas/v1#RecipeStatus");
    assert_eq!(status["type"]["descriptor"]["properties"][1]["name"], "outputs");
}

#[test]
fn describe_rejected_schema_prints_failures() {
    let output = run_describe(
        "manifests/broken.yaml",
        "widgets",
        "2023-10-01-preview",
        false,
    );

    assert_eq!(output.status.code(), Some(1));
    let stdout = stdout(&output);
    assert!(stdout.contains("rejected"));
    assert!(stdout.contains("[ArrayItemTypeRequired]"));
}

#[test]
fn describe_unknown_version_fails() {
    let output = run_describe(
        "manifests/widgets.yaml",
        "widgets",
        "1999-01-01",
        true,
    );

    assert_eq!(output.status.code(), Some(2));
    let stderr = stderr(&output);
    assert!(stderr.contains("no API version '1999-01-01'"));
}
