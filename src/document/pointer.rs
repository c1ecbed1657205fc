//! RFC 6901 fragment pointer evaluation.
//!
//! Local references take the form `#` or `#/a/b/...`. The bare `#` designates
//! the root itself; longer pointers walk object keys and array indices, with
//! `~1` unescaping to `/` and `~0` to `~` (in that order, per the RFC).

use crate::core::{DerefError, Result};
use crate::document::Document;

/// Evaluate a local pointer reference against a root document.
///
/// `reference` is the full ref string including the leading `#`. Fails with
/// [`DerefError::InvalidJsonPointerRef`] when the pointer is malformed or does
/// not designate a value.
pub fn evaluate_pointer(reference: &str, root: &Document) -> Result<Document> {
    let Some(pointer) = reference.strip_prefix('#') else {
        return Err(malformed(reference, "missing leading '#'"));
    };
    if pointer.is_empty() {
        return Ok(root.clone());
    }
    if !pointer.starts_with('/') {
        return Err(malformed(reference, "pointer must start with '/'"));
    }

    let mut current = root.clone();
    for raw in pointer[1..].split('/') {
        let token = raw.replace("~1", "/").replace("~0", "~");
        let next = if let Some(entries) = current.as_object() {
            entries.get(&token).cloned()
        } else if let Some(items) = current.as_array() {
            parse_index(&token).and_then(|index| items.get(index).cloned())
        } else {
            None
        };
        current = next.ok_or_else(|| {
            malformed(reference, &format!("no value at token '{token}'"))
        })?;
    }
    Ok(current)
}

/// Array index per RFC 6901: decimal digits, no leading zeros, no sign.
fn parse_index(token: &str) -> Option<usize> {
    if token.is_empty() || !token.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    if token.len() > 1 && token.starts_with('0') {
        return None;
    }
    token.parse().ok()
}

fn malformed(reference: &str, reason: &str) -> DerefError {
    DerefError::InvalidJsonPointerRef {
        reference: reference.to_string(),
        reason: reason.to_string(),
    }
}
