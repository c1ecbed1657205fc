//! Integration test suite for schema-deref.
//!
//! Exercises the public API end to end: resolution scenarios over the
//! document model, transport behavior through injected loaders, and session
//! cache semantics.

mod support;

mod cache;
mod resolve;
