//! Merge and substitution rules, applied after every reference has resolved.
//!
//! Substitution is a pure rewrite pass over the instance's document: every
//! reference node is replaced through [`merge`], every other node is left
//! alone. The pass never performs I/O and never recurses into substituted
//! targets; by the time it runs, the cache already holds the final document
//! for every collected ref.

use crate::document::{Document, REF_KEY};
use indexmap::IndexMap;

/// Merge one reference node with its resolved target.
///
/// A pure ref (no keys beyond `$ref`) becomes the target handle itself, so
/// identical ref strings substitute to `ptr_eq` values. Sibling keys overlay a
/// shallow copy of the target, sibling winning on collision, with `$ref`
/// stripped. A non-object target cannot host siblings and is returned as-is;
/// for boolean targets the dropped siblings are traced.
pub(crate) fn merge(ref_node: &Document, target: &Document) -> Document {
    let Some(entries) = ref_node.as_object() else {
        return target.clone();
    };
    if entries.len() == 1 {
        return target.clone();
    }
    let Some(target_entries) = target.as_object() else {
        if target.is_boolean() {
            tracing::debug!("sibling keys discarded against a boolean target");
        }
        return target.clone();
    };

    let mut merged = target_entries.clone();
    for (key, value) in entries {
        if key != REF_KEY {
            // Insert keeps the target's key position on collision.
            merged.insert(key.clone(), value.clone());
        }
    }
    merged.shift_remove(REF_KEY);
    Document::object(merged)
}

/// Rewrite every reference node in `document` via [`merge`] with its cached
/// resolution.
///
/// Containers on the rewrite path are freshly built. Under `mutate = false`
/// the untouched children of those containers are handed out as fresh roots
/// too, so the result never aliases a container of the caller's input; under
/// `mutate = true` unchanged documents flow through as the original handles.
pub(crate) fn substitute(
    document: &Document,
    lookup: &dyn Fn(&str) -> Option<Document>,
    mutate: bool,
) -> Document {
    rewrite(document, lookup, mutate).0
}

/// Drop scaffold keys from the top level of the final result. Nested
/// occurrences stay, including those inside re-substituted copies of the root.
pub(crate) fn prune_scaffolding(document: &Document, keys: &[String]) -> Document {
    let Some(entries) = document.as_object() else {
        return document.clone();
    };
    if !keys.iter().any(|key| entries.contains_key(key)) {
        return document.clone();
    }
    tracing::debug!("pruning scaffold keys from the resolved root");
    Document::object(
        entries
            .iter()
            .filter(|(key, _)| !keys.iter().any(|scaffold| scaffold == *key))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect(),
    )
}

fn rewrite(
    document: &Document,
    lookup: &dyn Fn(&str) -> Option<Document>,
    mutate: bool,
) -> (Document, bool) {
    if let Some(entries) = document.as_object() {
        if let Some(reference) = entries.get(REF_KEY).and_then(Document::as_str) {
            let Some(target) = lookup(reference) else {
                // Every collected ref is resolved before this pass runs.
                debug_assert!(false, "unresolved reference in substitution: {reference}");
                return (document.clone(), false);
            };
            return (rewrite_ref_node(entries, &target, lookup, mutate), true);
        }

        let children: Vec<(Document, bool)> =
            entries.values().map(|child| rewrite(child, lookup, mutate)).collect();
        if children.iter().all(|(_, changed)| !changed) {
            return (document.clone(), false);
        }
        let rewritten: IndexMap<String, Document> = entries
            .keys()
            .cloned()
            .zip(children.into_iter().map(|(child, changed)| keep(child, changed, mutate)))
            .collect();
        return (Document::object(rewritten), true);
    }

    if let Some(items) = document.as_array() {
        let children: Vec<(Document, bool)> =
            items.iter().map(|child| rewrite(child, lookup, mutate)).collect();
        if children.iter().all(|(_, changed)| !changed) {
            return (document.clone(), false);
        }
        let rewritten: Vec<Document> = children
            .into_iter()
            .map(|(child, changed)| keep(child, changed, mutate))
            .collect();
        return (Document::array(rewritten), true);
    }

    (document.clone(), false)
}

/// Reference node with the target at hand: substitute the siblings, then
/// merge. The rebuilt node keeps `$ref` so [`merge`] can tell pure from
/// sibling-bearing; merge strips it from the output.
fn rewrite_ref_node(
    entries: &IndexMap<String, Document>,
    target: &Document,
    lookup: &dyn Fn(&str) -> Option<Document>,
    mutate: bool,
) -> Document {
    if entries.len() == 1 {
        return target.clone();
    }
    let mut node = IndexMap::with_capacity(entries.len());
    for (key, value) in entries {
        if key == REF_KEY {
            node.insert(key.clone(), value.clone());
        } else {
            let (child, changed) = rewrite(value, lookup, mutate);
            node.insert(key.clone(), keep(child, changed, mutate));
        }
    }
    merge(&Document::object(node), target)
}

/// An unchanged child of a rebuilt container keeps its handle under
/// `mutate = true`; copy mode detaches it so the rebuilt container shares no
/// child container with the input.
fn keep(child: Document, changed: bool, mutate: bool) -> Document {
    if changed || mutate { child } else { child.detached() }
}
