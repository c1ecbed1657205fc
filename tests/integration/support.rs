//! Shared mocks for the integration suite: in-memory transports with call
//! counters, and canned protocol handlers.

use futures::FutureExt;
use futures::future::BoxFuture;
use schema_deref::{Document, FileSystem, HttpFetch, ProtocolHandler, Result};
use std::collections::HashMap;
use std::io;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Install a test subscriber once so `RUST_LOG` works when debugging tests.
pub fn init_tracing() {
    use tracing_subscriber::EnvFilter;
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// In-memory filesystem keyed by exact path strings, counting reads.
#[derive(Default)]
pub struct MemoryFs {
    files: HashMap<String, String>,
    reads: AtomicUsize,
}

impl MemoryFs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_file(mut self, path: &str, contents: &str) -> Self {
        self.files.insert(path.to_string(), contents.to_string());
        self
    }

    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }
}

impl FileSystem for MemoryFs {
    fn read_to_string<'a>(&'a self, path: &'a Path) -> BoxFuture<'a, io::Result<String>> {
        async move {
            self.reads.fetch_add(1, Ordering::SeqCst);
            self.files
                .get(path.to_string_lossy().as_ref())
                .cloned()
                .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "no such file"))
        }
        .boxed()
    }
}

/// In-memory fetch transport keyed by URL, counting hits. URLs not present
/// fail as unreachable.
#[derive(Default)]
pub struct MemoryHttp {
    responses: HashMap<String, String>,
    hits: AtomicUsize,
}

impl MemoryHttp {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_response(mut self, url: &str, body: &str) -> Self {
        self.responses.insert(url.to_string(), body.to_string());
        self
    }

    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }
}

impl HttpFetch for MemoryHttp {
    fn fetch<'a>(&'a self, url: &'a str) -> BoxFuture<'a, std::result::Result<String, String>> {
        async move {
            self.hits.fetch_add(1, Ordering::SeqCst);
            self.responses.get(url).cloned().ok_or_else(|| "connection refused".to_string())
        }
        .boxed()
    }
}

/// Handler with a fixed answer (or a fixed pass) for one scheme.
pub struct StaticHandler {
    scheme: String,
    name: String,
    answer: Option<Document>,
}

impl StaticHandler {
    pub fn new(scheme: &str, name: &str, answer: Option<Document>) -> Self {
        Self { scheme: scheme.to_string(), name: name.to_string(), answer }
    }
}

impl ProtocolHandler for StaticHandler {
    fn scheme(&self) -> &str {
        &self.scheme
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn resolve<'a>(&'a self, _reference: &'a str) -> BoxFuture<'a, Result<Option<Document>>> {
        let answer = self.answer.clone();
        async move { Ok(answer) }.boxed()
    }
}
