//! Session cache semantics through the public API: pre-seeding, sharing
//! across invocations, and the at-most-one-fetch invariant.

use crate::support::MemoryFs;
use schema_deref::{DerefOptions, Dereferencer, Document, ResolutionCache, dereference_with};
use serde_json::json;
use std::sync::Arc;

fn doc(value: serde_json::Value) -> Document {
    value.into()
}

#[tokio::test]
async fn preseeded_refs_never_reach_the_loader() {
    let fs = Arc::new(MemoryFs::new());
    let cache = ResolutionCache::new();
    cache.insert("/schemas/name.json", doc(json!({"type": "string"})));

    let input = doc(json!({"name": {"$ref": "/schemas/name.json"}}));
    let options = DerefOptions::new().filesystem(fs.clone()).no_http().ref_cache(cache);

    let resolved = dereference_with(input, options).await.unwrap();
    assert_eq!(resolved.to_value(), json!({"name": {"type": "string"}}));
    assert_eq!(fs.reads(), 0, "pre-seeded ref must not be fetched");
}

#[tokio::test]
async fn repeated_occurrences_fetch_once() {
    let fs = Arc::new(MemoryFs::new().with_file("/schemas/s.json", r#"{"type": "string"}"#));
    let input = doc(json!({
        "a": {"$ref": "/schemas/s.json"},
        "b": [{"$ref": "/schemas/s.json"}],
        "c": {"inner": {"$ref": "/schemas/s.json"}}
    }));
    let options = DerefOptions::new().filesystem(fs.clone()).no_http();

    let resolved = dereference_with(input, options).await.unwrap();
    assert_eq!(fs.reads(), 1);

    // Every occurrence shares the one resolved handle.
    let a = resolved.get("a").unwrap();
    let b = &resolved.get("b").unwrap().as_array().unwrap()[0];
    let c = resolved.get("c").unwrap().get("inner").unwrap();
    assert!(a.ptr_eq(b));
    assert!(a.ptr_eq(c));
}

#[tokio::test]
async fn a_shared_cache_carries_resolutions_across_sessions() {
    let fs = Arc::new(MemoryFs::new().with_file("/schemas/s.json", r#"{"type": "string"}"#));
    let cache = ResolutionCache::new();
    let input = doc(json!({"a": {"$ref": "/schemas/s.json"}}));

    for _ in 0..3 {
        let options = DerefOptions::new()
            .filesystem(fs.clone())
            .no_http()
            .ref_cache(cache.clone());
        dereference_with(input.clone(), options).await.unwrap();
    }
    assert_eq!(fs.reads(), 1, "second and third sessions must hit the cache");
}

#[tokio::test]
async fn nested_resolutions_share_the_session_cache() {
    // Both outer files point at the same inner ref; the shared cache makes it
    // a single fetch even though the refs appear in different sub-resolutions.
    let fs = Arc::new(
        MemoryFs::new()
            .with_file("/schemas/one.json", r#"{"a": {"$ref": "/schemas/shared.json"}}"#)
            .with_file("/schemas/two.json", r#"{"b": {"$ref": "/schemas/shared.json"}}"#)
            .with_file("/schemas/shared.json", r#"{"const": 1}"#),
    );
    let input = doc(json!({
        "one": {"$ref": "/schemas/one.json"},
        "two": {"$ref": "/schemas/two.json"}
    }));
    let options = DerefOptions::new().filesystem(fs.clone()).no_http();

    dereference_with(input, options).await.unwrap();
    assert_eq!(fs.reads(), 3, "shared.json must be fetched exactly once");
}

#[tokio::test]
async fn failed_resolve_retries_only_unresolved_refs() {
    let fs = Arc::new(MemoryFs::new().with_file("/schemas/good.json", r#"{"ok": true}"#));
    let cache = ResolutionCache::new();
    let input = doc(json!({
        "good": {"$ref": "/schemas/good.json"},
        "bad": {"$ref": "/schemas/bad.json"}
    }));

    let options = DerefOptions::new()
        .filesystem(fs.clone())
        .no_http()
        .ref_cache(cache.clone())
        .max_concurrency(1);
    dereference_with(input.clone(), options).await.unwrap_err();
    assert!(cache.contains("/schemas/good.json"));

    let reads_after_failure = fs.reads();
    let options = DerefOptions::new()
        .filesystem(fs.clone())
        .no_http()
        .ref_cache(cache.clone());
    dereference_with(input, options).await.unwrap_err();
    // Only the still-unresolved ref is retried.
    assert_eq!(fs.reads(), reads_after_failure + 1);
}

#[tokio::test]
async fn malformed_refs_fail_before_any_fetch() {
    let fs = Arc::new(MemoryFs::new().with_file("/schemas/s.json", r#"{"ok": true}"#));
    let input = doc(json!({
        "first": {"$ref": "/schemas/s.json"},
        "broken": {"$ref": ["not", "a", "string"]}
    }));
    let options = DerefOptions::new().filesystem(fs.clone()).no_http();

    assert!(Dereferencer::new(input, options).is_err());
    assert_eq!(fs.reads(), 0, "collection must fail before any loader call");
}
