//! Reference collection.
//!
//! Collection is a complete, separate phase that precedes any fetch: the
//! [`Dereferencer`](crate::resolver::Dereferencer) collects at construction,
//! which gives the resolver full knowledge of its fan-out before doing I/O and
//! guarantees that a malformed `$ref` surfaces before any loader call.
//!
//! Output order is discovery (traversal) order, deduplicated to first
//! occurrence. Resolution order is unspecified and may be concurrent.

use crate::core::{DerefError, Result};
use crate::document::{Document, REF_KEY};
use indexmap::IndexSet;

/// Collect the distinct reference strings contained in a document.
///
/// Objects and arrays are traversed fully; boolean leaves are not descended
/// into. Fails with [`DerefError::NonStringRef`] if any node's `$ref` key
/// holds a non-string value.
pub fn collect_refs(document: &Document) -> Result<Vec<String>> {
    let mut found = IndexSet::new();
    walk(document, &mut found)?;
    Ok(found.into_iter().collect())
}

fn walk(document: &Document, found: &mut IndexSet<String>) -> Result<()> {
    if let Some(entries) = document.as_object() {
        if let Some(value) = entries.get(REF_KEY) {
            match value.as_str() {
                Some(reference) => {
                    found.insert(reference.to_string());
                }
                None => {
                    return Err(DerefError::NonStringRef { node: document.to_value().to_string() });
                }
            }
        }
        // Sibling keys of a reference node may hold further refs of their own.
        for value in entries.values() {
            walk(value, found)?;
        }
    } else if let Some(items) = document.as_array() {
        for item in items {
            walk(item, found)?;
        }
    }
    Ok(())
}
