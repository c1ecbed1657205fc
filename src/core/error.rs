//! Error handling for schema-deref
//!
//! The error system is a single strongly-typed enum, [`DerefError`], with one
//! variant per concrete failure mode in the dereferencing pipeline. Errors are
//! never wrapped or retried internally: whatever step fails (collection, a
//! loader call, a nested sub-resolution) surfaces unchanged to the caller so
//! the failing step stays identifiable.
//!
//! # Error Categories
//!
//! - **Collection**: [`DerefError::NonStringRef`]
//! - **Local pointers**: [`DerefError::InvalidJsonPointerRef`]
//! - **Filesystem refs**: [`DerefError::InvalidFileSystemPath`],
//!   [`DerefError::NoInjectedFilesystem`]
//! - **Remote refs**: [`DerefError::InvalidRemoteUrl`],
//!   [`DerefError::NoInjectedFetch`]
//! - **Content**: [`DerefError::NonJsonRef`]
//! - **Protocol handlers**: [`DerefError::MultiplePluginReturn`]
//!
//! Messages embed the offending reference string and, where feasible, a
//! serialized snippet of the offending node.

use thiserror::Error;

/// The error type for every fallible operation in this crate.
#[derive(Error, Debug)]
pub enum DerefError {
    /// A `$ref` key holds a non-string value.
    ///
    /// Detected during reference collection, before any loader call is made.
    /// `node` is a serialized rendering of the offending object.
    #[error("$ref value is not a string in node: {node}")]
    NonStringRef {
        /// Serialized JSON of the object whose `$ref` value is not a string
        node: String,
    },

    /// A local pointer reference (`#/...`) is malformed or does not designate
    /// a value in the root document.
    #[error("invalid JSON pointer reference '{reference}': {reason}")]
    InvalidJsonPointerRef {
        /// The offending reference string
        reference: String,
        /// What made the pointer unusable
        reason: String,
    },

    /// A path-shaped reference could not be expanded or read.
    #[error("cannot read filesystem reference '{reference}': {reason}")]
    InvalidFileSystemPath {
        /// The offending reference string
        reference: String,
        /// The underlying expansion or I/O failure
        reason: String,
    },

    /// Bytes fetched or read for a reference were not parseable as JSON.
    #[error("reference '{reference}' did not yield valid JSON: {reason}")]
    NonJsonRef {
        /// The offending reference string
        reference: String,
        /// The parse failure
        reason: String,
    },

    /// A network reference was unreachable or its response unusable.
    #[error("cannot fetch remote reference '{reference}': {reason}")]
    InvalidRemoteUrl {
        /// The offending reference string
        reference: String,
        /// The transport failure
        reason: String,
    },

    /// More than one protocol handler produced a document for the same
    /// reference. The conflicting handlers are named so the misconfigured
    /// registration is identifiable.
    #[error("multiple protocol handlers answered for '{reference}': {}", handlers.join(", "))]
    MultiplePluginReturn {
        /// The contested reference string
        reference: String,
        /// Names of every handler that returned a document
        handlers: Vec<String>,
    },

    /// A path-shaped reference was encountered but no filesystem loader is
    /// configured for this session.
    #[error("filesystem reference '{reference}' encountered but no filesystem loader is configured")]
    NoInjectedFilesystem {
        /// The reference that needed a filesystem transport
        reference: String,
    },

    /// A scheme-bearing reference was encountered but no fetch loader is
    /// configured for this session and no protocol handler claimed it.
    #[error("remote reference '{reference}' encountered but no fetch loader is configured")]
    NoInjectedFetch {
        /// The reference that needed a network transport
        reference: String,
    },
}
