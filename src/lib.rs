//! schema-deref - async JSON schema dereferencing
//!
//! Resolves symbolic references (`$ref` nodes) embedded in a hierarchical
//! document into a fully inlined structure containing no unresolved link
//! markers. References may point into the document itself (RFC 6901-style
//! local pointers), at files, at URLs, or at custom-scheme URIs answered by
//! registered protocol handlers.
//!
//! # Architecture Overview
//!
//! Resolution runs in three phases per [`Dereferencer`] instance:
//!
//! 1. **Collection**: [`collector`] scans the document and produces its
//!    distinct ref strings in discovery order, before any I/O. A malformed
//!    `$ref` fails here.
//! 2. **Resolution**: each distinct ref is driven through the session-shared
//!    [`cache`](crate::cache): a cache hit is reused, otherwise the
//!    [`loader`] fetches the target and, in recursive mode, a nested
//!    `Dereferencer` resolves the fetched document before it is cached.
//!    Distinct refs resolve concurrently.
//! 3. **Substitution**: every reference node is replaced by its resolution:
//!    pure refs take the resolved handle as-is (sharing preserved), refs with
//!    sibling keys produce a merged object with siblings winning collisions.
//!
//! Cycles terminate through the cache plus the special-cased self ref `"#"`,
//! which is an immediate, non-recursive hit on the session root.
//!
//! # Core Modules
//!
//! - [`document`] - the `Boolean | Scalar | Array | Object` document model and
//!   pointer evaluation
//! - [`collector`] - reference discovery
//! - [`cache`] - session-shared resolution cache (at-most-one-fetch per ref)
//! - [`loader`] - ref classification and injected transports
//! - [`resolver`] - the orchestrator and merge/substitution rules
//! - [`core`] - error taxonomy
//!
//! # Example
//!
//! ```rust
//! use schema_deref::{DerefOptions, Dereferencer, Document};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> schema_deref::Result<()> {
//! let schema: Document = serde_json::json!({
//!     "title": "widget",
//!     "properties": {"name": {"$ref": "#/definitions/name"}},
//!     "definitions": {"name": {"type": "string"}}
//! })
//! .into();
//!
//! let options = DerefOptions::new().no_filesystem().no_http();
//! let resolved = Dereferencer::new(schema, options)?.resolve().await?;
//! assert_eq!(
//!     resolved.to_value(),
//!     serde_json::json!({
//!         "title": "widget",
//!         "properties": {"name": {"type": "string"}}
//!     })
//! );
//! # Ok(())
//! # }
//! ```

pub mod cache;
pub mod collector;
pub mod core;
pub mod document;
pub mod loader;
pub mod resolver;

pub use crate::cache::ResolutionCache;
pub use crate::core::{DerefError, Result};
pub use crate::document::{Document, REF_KEY, SELF_REF, Scalar, evaluate_pointer};
pub use crate::loader::{
    FileSystem, HttpFetch, Loader, ProtocolHandler, RefKind, ReqwestFetch, TokioFileSystem,
};
pub use crate::resolver::{DerefOptions, Dereferencer};

/// Dereference a document with default options.
///
/// Default transports are the tokio filesystem and a reqwest fetch client;
/// the input itself is the root for `"#"` and local pointers. The input is
/// left untouched.
pub async fn dereference(document: &Document) -> Result<Document> {
    dereference_with(document.clone(), DerefOptions::default()).await
}

/// Dereference a document with explicit options.
pub async fn dereference_with(document: Document, options: DerefOptions) -> Result<Document> {
    Dereferencer::new(document, options)?.resolve().await
}
