use indexmap::IndexMap;
use serde_json::{json, Value};
use stencil::context::generate_context;
use stencil::error::Error;

fn overrides(pairs: &[(&str, Value)]) -> IndexMap<String, Value> {
    pairs.iter().map(|(k, v)| (k.to_string(), v.clone())).collect()
}

#[test]
fn test_generate_context_preserves_declaration_order() {
    let temp_dir = tempfile::tempdir().unwrap();
    let manifest = temp_dir.path().join("stencil.json");
    std::fs::write(
        &manifest,
        r#"{"zebra": "z", "apple": "a", "mango": "m"}"#,
    )
    .unwrap();

    let context = generate_context(&manifest, None, None).unwrap();
    let keys: Vec<_> = context.variables.keys().cloned().collect();
    assert_eq!(keys, ["zebra", "apple", "mango"]);
}

#[test]
fn test_generate_context_decode_error_names_the_file() {
    let temp_dir = tempfile::tempdir().unwrap();
    let manifest = temp_dir.path().join("stencil.json");
    std::fs::write(&manifest, "{not valid at all: [")
        .unwrap();

    let err = generate_context(&manifest, None, None).unwrap_err();
    match err {
        Error::ManifestDecode { path, .. } => {
            assert!(path.ends_with("stencil.json"), "path was: {path}");
        }
        other => panic!("expected ManifestDecode, got: {other}"),
    }
}

#[test]
fn test_extra_overrides_win_over_defaults() {
    let temp_dir = tempfile::tempdir().unwrap();
    let manifest = temp_dir.path().join("stencil.json");
    std::fs::write(&manifest, r#"{"license": "MIT"}"#).unwrap();

    let defaults = overrides(&[("license", json!("BSD")), ("author", json!("config"))]);
    let extra = overrides(&[("author", json!("caller"))]);

    let context = generate_context(&manifest, Some(&defaults), Some(&extra)).unwrap();
    assert_eq!(context.variables["license"], json!("BSD"));
    assert_eq!(context.variables["author"], json!("caller"));
}

#[test]
fn test_sequence_and_mapping_override_layering() {
    let temp_dir = tempfile::tempdir().unwrap();
    let manifest = temp_dir.path().join("stencil.json");
    std::fs::write(
        &manifest,
        r#"{"licenses": ["MIT"], "details": {"city": "Berlin", "kept": true}}"#,
    )
    .unwrap();

    let extra = overrides(&[
        ("licenses", json!(["Apache-2.0"])),
        ("details", json!({"city": "Paris"})),
    ]);
    let context = generate_context(&manifest, None, Some(&extra)).unwrap();

    assert_eq!(context.variables["licenses"], json!(["MIT", "Apache-2.0"]));
    assert_eq!(
        context.variables["details"],
        json!({"city": "Paris", "kept": true})
    );
}

#[test]
fn test_yaml_manifest_is_accepted() {
    let temp_dir = tempfile::tempdir().unwrap();
    let manifest = temp_dir.path().join("stencil.yaml");
    std::fs::write(&manifest, "project_name: Demo\nuse_docs: false\n").unwrap();

    let context = generate_context(&manifest, None, None).unwrap();
    assert_eq!(context.variables["project_name"], json!("Demo"));
    assert_eq!(context.variables["use_docs"], json!(false));
}
