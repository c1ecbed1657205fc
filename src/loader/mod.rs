//! Reference loading: classification and transport dispatch.
//!
//! A reference string takes one of four forms:
//!
//! - **Local pointer**: `#` or `#/a/b/...`, evaluated against the session
//!   root (no transport involved).
//! - **Filesystem path**: leading `$`, `.`, or `/`; expanded with
//!   `shellexpand` and read through the injected [`FileSystem`].
//! - **Remote URL**: a scheme is present; fetched through the injected
//!   [`HttpFetch`] unless a protocol handler claims it first.
//! - **Custom-scheme URI**: dispatched to registered [`ProtocolHandler`]s.
//!
//! Transports are injected per session, never global state: a session built
//! without a filesystem or fetch capability fails path- or URL-shaped refs
//! with [`DerefError::NoInjectedFilesystem`] / [`DerefError::NoInjectedFetch`]
//! instead of reaching for ambient I/O.

mod adapters;

pub use adapters::{FileSystem, HttpFetch, ProtocolHandler, ReqwestFetch, TokioFileSystem};

use crate::core::{DerefError, Result};
use crate::document::{Document, evaluate_pointer};
use std::path::Path;
use std::sync::Arc;

/// The form of a reference string, decided by shape alone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefKind {
    /// `#`-prefixed local pointer into the session root.
    Pointer,
    /// Path-shaped reference read from the filesystem.
    Path,
    /// Scheme-bearing reference dispatched to handlers or the fetch transport.
    Url {
        /// The lowercased scheme, without the trailing `:`.
        scheme: String,
    },
}

impl RefKind {
    /// Classify a reference string.
    #[must_use]
    pub fn classify(reference: &str) -> Self {
        if reference.starts_with('#') {
            Self::Pointer
        } else if reference.starts_with(['$', '.', '/']) {
            Self::Path
        } else if let Some(scheme) = extract_scheme(reference) {
            Self::Url { scheme }
        } else {
            // Bare relative paths ("defs.json") are treated as path-shaped.
            Self::Path
        }
    }
}

/// RFC 3986 scheme: ALPHA *( ALPHA / DIGIT / "+" / "-" / "." ) followed by ':'.
fn extract_scheme(reference: &str) -> Option<String> {
    let (scheme, _) = reference.split_once(':')?;
    let mut chars = scheme.chars();
    let first = chars.next()?;
    if !first.is_ascii_alphabetic() {
        return None;
    }
    if !chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.')) {
        return None;
    }
    Some(scheme.to_ascii_lowercase())
}

/// Per-session loader: injected transports plus the protocol handler registry.
#[derive(Clone)]
pub struct Loader {
    filesystem: Option<Arc<dyn FileSystem>>,
    http: Option<Arc<dyn HttpFetch>>,
    handlers: Vec<Arc<dyn ProtocolHandler>>,
}

impl Loader {
    /// Assemble a loader from injected capabilities.
    #[must_use]
    pub fn new(
        filesystem: Option<Arc<dyn FileSystem>>,
        http: Option<Arc<dyn HttpFetch>>,
        handlers: Vec<Arc<dyn ProtocolHandler>>,
    ) -> Self {
        Self { filesystem, http, handlers }
    }

    /// Turn one reference string into a document.
    ///
    /// `root` is the pointer-evaluation target for local refs. The result is
    /// the raw fetched document; recursing into it is the resolver's job.
    pub async fn load(&self, reference: &str, root: &Document) -> Result<Document> {
        match RefKind::classify(reference) {
            RefKind::Pointer => evaluate_pointer(reference, root),
            RefKind::Path => self.load_path(reference).await,
            RefKind::Url { scheme } => self.load_url(reference, &scheme).await,
        }
    }

    async fn load_path(&self, reference: &str) -> Result<Document> {
        let Some(filesystem) = &self.filesystem else {
            return Err(DerefError::NoInjectedFilesystem { reference: reference.to_string() });
        };
        let expanded = shellexpand::full(reference).map_err(|err| {
            DerefError::InvalidFileSystemPath {
                reference: reference.to_string(),
                reason: err.to_string(),
            }
        })?;
        tracing::debug!(reference, path = %expanded, "reading filesystem reference");
        let text = filesystem.read_to_string(Path::new(expanded.as_ref())).await.map_err(|err| {
            DerefError::InvalidFileSystemPath {
                reference: reference.to_string(),
                reason: err.to_string(),
            }
        })?;
        parse_document(reference, &text)
    }

    async fn load_url(&self, reference: &str, scheme: &str) -> Result<Document> {
        let mut answers = Vec::new();
        for handler in &self.handlers {
            if handler.scheme() != scheme {
                continue;
            }
            if let Some(document) = handler.resolve(reference).await? {
                answers.push((handler.name().to_string(), document));
            }
        }
        if answers.len() > 1 {
            return Err(DerefError::MultiplePluginReturn {
                reference: reference.to_string(),
                handlers: answers.into_iter().map(|(name, _)| name).collect(),
            });
        }
        if let Some((name, document)) = answers.pop() {
            tracing::debug!(reference, handler = %name, "reference answered by protocol handler");
            return Ok(document);
        }

        let Some(http) = &self.http else {
            return Err(DerefError::NoInjectedFetch { reference: reference.to_string() });
        };
        tracing::debug!(reference, "fetching remote reference");
        let text = http.fetch(reference).await.map_err(|reason| DerefError::InvalidRemoteUrl {
            reference: reference.to_string(),
            reason,
        })?;
        parse_document(reference, &text)
    }
}

fn parse_document(reference: &str, text: &str) -> Result<Document> {
    Document::from_json_str(text).map_err(|err| DerefError::NonJsonRef {
        reference: reference.to_string(),
        reason: err.to_string(),
    })
}
