//! The core orchestrator: collect, resolve, substitute.
//!
//! A [`Dereferencer`] is created per document (and per fetched sub-document
//! during recursion). Construction runs the collection phase, so the instance
//! knows its full fan-out, and has rejected malformed refs, before any I/O
//! happens. `resolve()` then drives each distinct ref through the shared
//! [`ResolutionCache`], recurses into fetched sub-documents, and substitutes
//! results back into the tree.
//!
//! # Resolution as a task tree
//!
//! Distinct refs within one instance resolve concurrently with no relative
//! order ([`buffer_unordered`](futures::StreamExt::buffer_unordered), capped
//! by [`DerefOptions::max_concurrency`] when set). The instance joins on all
//! of them, including nested sub-resolutions, before substituting. The shared
//! cache is the only state crossing task boundaries; its per-key cell makes
//! cache writes single-writer-per-key, so the at-most-one-fetch invariant
//! holds without further locking.
//!
//! # Cycle termination
//!
//! Cycles are not modeled as in-memory graph edges. Termination comes from the
//! lazily populated cache plus the special-cased self ref `"#"`, which is an
//! immediate, non-recursive cache hit on the session root: a self-referential
//! document bottoms out there instead of recursing forever.
//!
//! # Failure
//!
//! The first error from collection, any loader call, or any nested resolution
//! aborts the whole `resolve()` and surfaces unchanged. Cache entries already
//! written stay, so re-invoking with the same cache skips resolved refs.

mod merge;

use crate::cache::ResolutionCache;
use crate::collector::collect_refs;
use crate::core::Result;
use crate::document::{Document, SELF_REF};
use crate::loader::{FileSystem, HttpFetch, Loader, ProtocolHandler, ReqwestFetch, TokioFileSystem};
use futures::future::BoxFuture;
use futures::{FutureExt, StreamExt, TryStreamExt, stream};
use std::sync::Arc;

/// Construction-time configuration for one resolution session.
#[derive(Clone)]
pub struct DerefOptions {
    /// Scan fetched sub-documents for further refs (default `true`).
    pub recursive: bool,
    /// When `false` (the default) the result is built from fresh containers
    /// along every rewrite path and the input is left untouched. When `true`,
    /// unchanged documents flow through as the original handles; a ref-free
    /// input comes back `ptr_eq` to itself.
    pub mutate: bool,
    /// Externally supplied cache, possibly pre-seeded; refs present in it are
    /// never fetched. Defaults to a fresh per-session cache.
    pub ref_cache: Option<ResolutionCache>,
    /// Root document for `"#"` and local-pointer evaluation. Defaults to the
    /// input document.
    pub root_document: Option<Document>,
    /// Cap on concurrently resolving refs per instance. Unlimited by default.
    pub max_concurrency: Option<usize>,
    /// Top-level container keys pruned from the final result: hosts for
    /// reusable definitions, not logical output. Defaults to `definitions`
    /// and `$defs`.
    pub scaffold_keys: Vec<String>,
    filesystem: Option<Arc<dyn FileSystem>>,
    http: Option<Arc<dyn HttpFetch>>,
    protocol_handlers: Vec<Arc<dyn ProtocolHandler>>,
}

impl Default for DerefOptions {
    fn default() -> Self {
        Self {
            recursive: true,
            mutate: false,
            ref_cache: None,
            root_document: None,
            max_concurrency: None,
            scaffold_keys: vec!["definitions".to_string(), "$defs".to_string()],
            filesystem: Some(Arc::new(TokioFileSystem)),
            http: Some(Arc::new(ReqwestFetch::new())),
            protocol_handlers: Vec::new(),
        }
    }
}

impl DerefOptions {
    /// Options with defaults: recursive, copy-on-write output, tokio
    /// filesystem and reqwest fetch transports, no protocol handlers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set recursive mode.
    #[must_use]
    pub fn recursive(mut self, recursive: bool) -> Self {
        self.recursive = recursive;
        self
    }

    /// Set mutate mode.
    #[must_use]
    pub fn mutate(mut self, mutate: bool) -> Self {
        self.mutate = mutate;
        self
    }

    /// Share or pre-seed the session cache.
    #[must_use]
    pub fn ref_cache(mut self, cache: ResolutionCache) -> Self {
        self.ref_cache = Some(cache);
        self
    }

    /// Override the root document used for `"#"` and local pointers.
    #[must_use]
    pub fn root_document(mut self, root: Document) -> Self {
        self.root_document = Some(root);
        self
    }

    /// Cap per-instance ref concurrency.
    #[must_use]
    pub fn max_concurrency(mut self, limit: usize) -> Self {
        self.max_concurrency = Some(limit);
        self
    }

    /// Replace the scaffold key list.
    #[must_use]
    pub fn scaffold_keys(mut self, keys: Vec<String>) -> Self {
        self.scaffold_keys = keys;
        self
    }

    /// Inject a filesystem transport.
    #[must_use]
    pub fn filesystem(mut self, filesystem: Arc<dyn FileSystem>) -> Self {
        self.filesystem = Some(filesystem);
        self
    }

    /// Run without a filesystem transport; path-shaped refs fail with
    /// [`DerefError::NoInjectedFilesystem`](crate::core::DerefError).
    #[must_use]
    pub fn no_filesystem(mut self) -> Self {
        self.filesystem = None;
        self
    }

    /// Inject a fetch transport.
    #[must_use]
    pub fn http(mut self, http: Arc<dyn HttpFetch>) -> Self {
        self.http = Some(http);
        self
    }

    /// Run without a fetch transport; unclaimed scheme-bearing refs fail with
    /// [`DerefError::NoInjectedFetch`](crate::core::DerefError).
    #[must_use]
    pub fn no_http(mut self) -> Self {
        self.http = None;
        self
    }

    /// Register a protocol handler for this session. Handlers are merged into
    /// the session's registry at construction; there is no global state.
    #[must_use]
    pub fn protocol_handler(mut self, handler: Arc<dyn ProtocolHandler>) -> Self {
        self.protocol_handlers.push(handler);
        self
    }
}

/// Everything one session shares across its task tree.
struct Session {
    cache: ResolutionCache,
    loader: Loader,
    recursive: bool,
    mutate: bool,
    max_concurrency: Option<usize>,
    scaffold_keys: Vec<String>,
}

/// One resolution instance over one document.
///
/// Construction collects refs (the `Created` state); [`resolve`](Self::resolve)
/// consumes the instance, so the terminal states cannot be re-entered. Nested
/// instances created during recursion share the session cache and options.
pub struct Dereferencer {
    document: Document,
    root: Document,
    refs: Vec<String>,
    session: Arc<Session>,
}

impl std::fmt::Debug for Dereferencer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dereferencer")
            .field("document", &self.document)
            .field("root", &self.root)
            .field("refs", &self.refs)
            .finish_non_exhaustive()
    }
}

impl Dereferencer {
    /// Create a top-level instance, running the collection phase.
    ///
    /// Fails with [`DerefError::NonStringRef`](crate::core::DerefError) if the
    /// document carries a non-string `$ref`, before any loader call.
    pub fn new(document: Document, options: DerefOptions) -> Result<Self> {
        let DerefOptions {
            recursive,
            mutate,
            ref_cache,
            root_document,
            max_concurrency,
            scaffold_keys,
            filesystem,
            http,
            protocol_handlers,
        } = options;
        let root = root_document.unwrap_or_else(|| document.clone());
        let session = Arc::new(Session {
            cache: ref_cache.unwrap_or_default(),
            loader: Loader::new(filesystem, http, protocol_handlers),
            recursive,
            mutate,
            max_concurrency,
            scaffold_keys,
        });
        Self::nested(document, root, session)
    }

    fn nested(document: Document, root: Document, session: Arc<Session>) -> Result<Self> {
        let refs = if document.is_boolean() { Vec::new() } else { collect_refs(&document)? };
        Ok(Self { document, root, refs, session })
    }

    /// The distinct references collected at construction, in discovery order.
    #[must_use]
    pub fn refs(&self) -> &[String] {
        &self.refs
    }

    /// Resolve every reference and return the fully substituted document.
    ///
    /// Boolean and ref-free documents come back unchanged. Scaffold keys are
    /// pruned from the result here, at the outermost call only.
    pub async fn resolve(self) -> Result<Document> {
        if self.document.is_boolean() || self.refs.is_empty() {
            return Ok(self.finish_unchanged());
        }
        let session = Arc::clone(&self.session);
        let resolved = self.resolve_and_substitute().await?;
        Ok(merge::prune_scaffolding(&resolved, &session.scaffold_keys))
    }

    /// Nested entry point: same algorithm, no scaffold pruning.
    async fn resolve_nested(self) -> Result<Document> {
        if self.document.is_boolean() || self.refs.is_empty() {
            return Ok(self.finish_unchanged());
        }
        self.resolve_and_substitute().await
    }

    async fn resolve_and_substitute(self) -> Result<Document> {
        tracing::debug!(refs = self.refs.len(), "resolving collected references");
        let session = Arc::clone(&self.session);
        let root = self.root.clone();
        let concurrency = session.max_concurrency.unwrap_or(usize::MAX);
        let futures: Vec<_> =
            self.refs.iter().map(|reference| resolve_ref(&session, &root, reference)).collect();
        stream::iter(futures)
            .buffer_unordered(concurrency)
            .try_collect::<Vec<Document>>()
            .await?;

        Ok(merge::substitute(
            &self.document,
            &|reference| session.cache.get(reference),
            session.mutate,
        ))
    }

    fn finish_unchanged(self) -> Document {
        if self.session.mutate { self.document } else { self.document.detached() }
    }
}

/// Resolve one reference through the session cache.
///
/// Boxed because resolution recurses: a fetched sub-document spawns a nested
/// [`Dereferencer`] whose own refs land back here.
fn resolve_ref<'a>(
    session: &'a Arc<Session>,
    root: &'a Document,
    reference: &'a str,
) -> BoxFuture<'a, Result<Document>> {
    async move {
        if reference == SELF_REF {
            // Terminal rule: the self ref is the root, straight from cache
            // semantics, with no loader call and no recursion. This is what stops
            // unbounded recursion on self-referential documents.
            tracing::trace!("self reference resolved to session root");
            return Ok(session.cache.get_or_insert(SELF_REF, root.clone()).await);
        }
        if let Some(hit) = session.cache.get(reference) {
            tracing::trace!(reference, "resolution cache hit");
            return Ok(hit);
        }

        session
            .cache
            .get_or_try_resolve(reference, move || async move {
                let fetched = session.loader.load(reference, root).await?;
                if !session.recursive || fetched.is_boolean() {
                    return Ok(fetched);
                }

                let sub_root = match declared_identity(&fetched) {
                    Some(identity) => {
                        tracing::debug!(reference, identity, "fetched document opens its own root scope");
                        fetched.clone()
                    }
                    None => root.clone(),
                };
                let sub = Dereferencer::nested(fetched.clone(), sub_root, Arc::clone(session))?;
                if sub.refs().is_empty() {
                    return Ok(fetched);
                }
                tracing::debug!(reference, nested = sub.refs().len(), "recursing into fetched document");
                sub.resolve_nested().await
            })
            .await
    }
    .boxed()
}

/// A fetched sub-document that declares its own identity establishes a new
/// root scope for its internal pointers.
fn declared_identity(document: &Document) -> Option<&str> {
    let entries = document.as_object()?;
    entries.get("$id").or_else(|| entries.get("id"))?.as_str()
}
