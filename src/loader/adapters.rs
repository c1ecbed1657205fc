//! Transport capabilities and their default adapters.
//!
//! The loader consumes three injected capabilities, all object-safe so tests
//! and embedders can swap them freely. Trait methods return
//! [`BoxFuture`] rather than relying on an async-trait macro, keeping the
//! seams plain `futures` types.

use crate::core::Result;
use crate::document::Document;
use futures::FutureExt;
use futures::future::BoxFuture;
use std::io;
use std::path::Path;

/// Read capability for path-shaped references.
pub trait FileSystem: Send + Sync {
    /// Read a file to text.
    fn read_to_string<'a>(&'a self, path: &'a Path) -> BoxFuture<'a, io::Result<String>>;
}

/// Fetch capability for scheme-bearing references.
pub trait HttpFetch: Send + Sync {
    /// Fetch a URL and return the response body. `Err` carries a
    /// human-readable failure reason; the loader wraps it into
    /// [`DerefError::InvalidRemoteUrl`](crate::core::DerefError).
    fn fetch<'a>(&'a self, url: &'a str) -> BoxFuture<'a, std::result::Result<String, String>>;
}

/// A custom-scheme resolver consulted ahead of the default transports.
///
/// Handlers are per-session configuration merged at construction time; there
/// is no process-wide registry. Every handler registered for a ref's scheme is
/// offered the ref; returning `Ok(None)` passes. Exactly one non-empty answer
/// wins; two or more fail the resolution with
/// [`DerefError::MultiplePluginReturn`](crate::core::DerefError).
pub trait ProtocolHandler: Send + Sync {
    /// The URI scheme this handler answers for, lowercase, without the `:`.
    fn scheme(&self) -> &str;

    /// The name reported in conflict errors.
    fn name(&self) -> &str {
        self.scheme()
    }

    /// Resolve a reference, or pass with `Ok(None)`.
    fn resolve<'a>(&'a self, reference: &'a str) -> BoxFuture<'a, Result<Option<Document>>>;
}

/// Default filesystem adapter backed by [`tokio::fs`].
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioFileSystem;

impl FileSystem for TokioFileSystem {
    fn read_to_string<'a>(&'a self, path: &'a Path) -> BoxFuture<'a, io::Result<String>> {
        tokio::fs::read_to_string(path).boxed()
    }
}

/// Default fetch adapter backed by a shared [`reqwest::Client`].
#[derive(Debug, Clone, Default)]
pub struct ReqwestFetch {
    client: reqwest::Client,
}

impl ReqwestFetch {
    /// A fetch adapter with a fresh client.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A fetch adapter over an existing client, so embedders can keep their
    /// pool, proxy, and TLS configuration.
    #[must_use]
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

impl HttpFetch for ReqwestFetch {
    fn fetch<'a>(&'a self, url: &'a str) -> BoxFuture<'a, std::result::Result<String, String>> {
        async move {
            let response = self.client.get(url).send().await.map_err(|err| err.to_string())?;
            let response = response.error_for_status().map_err(|err| err.to_string())?;
            response.text().await.map_err(|err| err.to_string())
        }
        .boxed()
    }
}
