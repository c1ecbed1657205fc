//! Session-shared resolution cache.
//!
//! The cache is the only resource crossing task boundaries during resolution:
//! one table mapping reference strings to resolved documents, shared by the
//! top-level [`Dereferencer`](crate::resolver::Dereferencer) and every
//! recursively constructed sub-instance.
//!
//! # At-most-one-fetch
//!
//! Each distinct reference string is fetched and resolved at most once per
//! session, and entries are never evicted within a session. Distinct refs at
//! one recursion level resolve concurrently, and nested sub-resolutions can
//! race on the same ref string across levels, so the table cannot be a plain
//! map guarded per call. Instead each key owns a [`tokio::sync::OnceCell`]
//! held in a [`DashMap`]: the cell is the atomic check-and-insert that makes
//! the invariant hold under a multi-threaded runtime. The first task to reach
//! a key runs the fetch; every later task waits on the cell and receives the
//! same resolved handle.
//!
//! A failed resolution leaves its cell unset, so re-invoking `resolve()` with
//! the same cache retries only the refs that never resolved.

use crate::core::Result;
use crate::document::Document;
use dashmap::DashMap;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::OnceCell;

/// Reference-string to resolved-document table for one resolution session.
///
/// Cloning shares the table; hand a clone to
/// [`DerefOptions::ref_cache`](crate::resolver::DerefOptions) to pre-seed a
/// session or to carry resolutions across sessions.
#[derive(Debug, Clone, Default)]
pub struct ResolutionCache {
    entries: Arc<DashMap<String, Arc<OnceCell<Document>>>>,
}

impl ResolutionCache {
    /// An empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The resolved document for a reference, if present.
    #[must_use]
    pub fn get(&self, reference: &str) -> Option<Document> {
        self.entries.get(reference).and_then(|cell| cell.get().cloned())
    }

    /// Whether a resolved entry exists for a reference.
    #[must_use]
    pub fn contains(&self, reference: &str) -> bool {
        self.get(reference).is_some()
    }

    /// Number of resolved entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.iter().filter(|entry| entry.value().get().is_some()).count()
    }

    /// `true` when no entry has resolved yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Seed an entry. The first write for a key wins; later writes are
    /// ignored, matching the never-evict session semantics.
    pub fn insert(&self, reference: impl Into<String>, document: Document) {
        let reference = reference.into();
        let cell = self.cell(&reference);
        if cell.set(document).is_err() {
            tracing::trace!(reference, "cache entry already present; seed ignored");
        }
    }

    /// The resolved document for `reference`, running `init` to produce it if
    /// no task has done so yet. Concurrent callers for the same key share one
    /// `init` run and receive the same handle.
    ///
    /// The cell is not re-entrant: an `init` that awaits `get_or_try_resolve`
    /// for its own key suspends forever. The resolver never does this for the
    /// `"#"` self reference (that ref short-circuits before the cell), but a
    /// mutually recursive pointer pair not routed through `"#"` will hang
    /// rather than error; callers needing a bound wrap their transports with
    /// a timeout.
    pub(crate) async fn get_or_try_resolve<F, Fut>(&self, reference: &str, init: F) -> Result<Document>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Document>>,
    {
        let cell = self.cell(reference);
        let document = cell.get_or_try_init(init).await?;
        Ok(document.clone())
    }

    /// Infallible variant of [`get_or_try_resolve`](Self::get_or_try_resolve)
    /// used for the `"#"` terminal rule, where the value is already at hand.
    pub(crate) async fn get_or_insert(&self, reference: &str, document: Document) -> Document {
        let cell = self.cell(reference);
        cell.get_or_init(|| async move { document }).await.clone()
    }

    fn cell(&self, reference: &str) -> Arc<OnceCell<Document>> {
        // Guard dropped before any await point; cells are awaited outside.
        let entry = self.entries.entry(reference.to_string()).or_default();
        Arc::clone(&entry)
    }
}
