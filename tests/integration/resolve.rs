//! End-to-end resolution scenarios over real and in-memory filesystems.

use crate::support::{MemoryFs, init_tracing};
use schema_deref::{DerefError, DerefOptions, Dereferencer, Document, dereference_with};
use serde_json::json;
use std::sync::Arc;
use tempfile::TempDir;

fn doc(value: serde_json::Value) -> Document {
    value.into()
}

#[tokio::test]
async fn resolves_file_references_from_disk() {
    init_tracing();
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("name.json");
    std::fs::write(&path, r#"{"type": "string", "minLength": 1}"#).unwrap();

    let input = doc(json!({
        "properties": {"name": {"$ref": path.to_str().unwrap()}}
    }));
    let resolved = dereference_with(input, DerefOptions::new().no_http()).await.unwrap();
    assert_eq!(
        resolved.to_value(),
        json!({"properties": {"name": {"type": "string", "minLength": 1}}})
    );
}

#[tokio::test]
async fn fetched_file_recurses_into_its_own_refs() {
    let fs = Arc::new(
        MemoryFs::new()
            .with_file("/schemas/outer.json", r#"{"$ref": "/schemas/inner.json"}"#)
            .with_file("/schemas/inner.json", r#"{"const": 42}"#),
    );
    let input = doc(json!({"value": {"$ref": "/schemas/outer.json"}}));
    let options = DerefOptions::new().filesystem(fs.clone()).no_http();

    let resolved = dereference_with(input, options).await.unwrap();
    assert_eq!(resolved.to_value(), json!({"value": {"const": 42}}));
    assert_eq!(fs.reads(), 2);
}

#[tokio::test]
async fn fetched_document_with_identity_scopes_its_own_pointers() {
    // inner.json declares $id, so its "#/..." pointers resolve against itself,
    // not against the top-level input.
    let fs = Arc::new(MemoryFs::new().with_file(
        "/schemas/inner.json",
        r##"{
            "$id": "https://example.com/inner.json",
            "payload": {"$ref": "#/local/shape"},
            "local": {"shape": {"type": "integer"}}
        }"##,
    ));
    let input = doc(json!({
        "value": {"$ref": "/schemas/inner.json"},
        "local": {"shape": {"type": "string"}}
    }));
    let options = DerefOptions::new().filesystem(fs).no_http();

    let resolved = dereference_with(input, options).await.unwrap();
    let payload = resolved.get("value").unwrap().get("payload").unwrap();
    assert_eq!(payload.to_value(), json!({"type": "integer"}));
}

#[tokio::test]
async fn missing_file_fails_with_filesystem_error() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("absent.json");

    let input = doc(json!({"$ref": path.to_str().unwrap()}));
    let err = dereference_with(input, DerefOptions::new().no_http()).await.unwrap_err();
    match err {
        DerefError::InvalidFileSystemPath { reference, .. } => {
            assert_eq!(reference, path.to_str().unwrap());
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn unparseable_file_fails_with_non_json_error() {
    let fs = Arc::new(MemoryFs::new().with_file("/schemas/broken.json", "not json {"));
    let input = doc(json!({"$ref": "/schemas/broken.json"}));
    let options = DerefOptions::new().filesystem(fs).no_http();

    let err = dereference_with(input, options).await.unwrap_err();
    assert!(matches!(err, DerefError::NonJsonRef { .. }));
}

#[tokio::test]
async fn no_partial_result_on_nested_failure() {
    // outer.json resolves, but its own ref is unreadable; the whole resolve
    // fails with the concrete nested error, unwrapped.
    let fs = Arc::new(
        MemoryFs::new().with_file("/schemas/outer.json", r#"{"$ref": "/schemas/gone.json"}"#),
    );
    let input = doc(json!({"value": {"$ref": "/schemas/outer.json"}}));
    let options = DerefOptions::new().filesystem(fs).no_http();

    let err = dereference_with(input, options).await.unwrap_err();
    match err {
        DerefError::InvalidFileSystemPath { reference, .. } => {
            assert_eq!(reference, "/schemas/gone.json");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn dollar_defs_scaffolding_is_pruned_too() {
    let input = doc(json!({
        "a": {"$ref": "#/$defs/x"},
        "$defs": {"x": {"type": "string"}}
    }));
    let options = DerefOptions::new().no_filesystem().no_http();
    let resolved = Dereferencer::new(input, options).unwrap().resolve().await.unwrap();
    assert_eq!(resolved.to_value(), json!({"a": {"type": "string"}}));
}

#[tokio::test]
async fn scaffold_keys_are_configurable() {
    let input = doc(json!({
        "a": {"$ref": "#/shared/x"},
        "shared": {"x": {"type": "string"}}
    }));
    let options = DerefOptions::new()
        .no_filesystem()
        .no_http()
        .scaffold_keys(vec!["shared".to_string()]);
    let resolved = Dereferencer::new(input, options).unwrap().resolve().await.unwrap();
    assert_eq!(resolved.to_value(), json!({"a": {"type": "string"}}));
}
