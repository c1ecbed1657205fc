//! Core types for schema-deref
//!
//! Home of the crate-wide error taxonomy and the [`Result`] alias every
//! fallible operation returns. Errors are strongly typed ([`DerefError`]) and
//! propagate unwrapped: a failure in a nested sub-resolution surfaces to the
//! top-level caller as the concrete step that failed.

mod error;

pub use error::DerefError;

/// Crate-wide result alias.
pub type Result<T, E = DerefError> = std::result::Result<T, E>;
