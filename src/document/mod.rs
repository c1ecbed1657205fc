//! Document model for schema-deref
//!
//! A [`Document`] is the tagged variant the dereferencer operates on:
//! `Boolean | Scalar | Array | Object`. Booleans are valid, opaque, terminal
//! documents; they are never traversed. Objects are ordered mappings with
//! unique keys, so round-tripping through JSON preserves key order.
//!
//! # Handle identity
//!
//! `Document` is a cheap-clone handle over an `Arc`-backed node. Cloning a
//! document shares the underlying node; [`Document::ptr_eq`] tests whether two
//! handles designate the same node. Handle equality is the identity relation
//! the resolver relies on: every occurrence of an identical pure-ref string is
//! substituted with the same handle, so callers can observe sharing with
//! `ptr_eq` rather than structural comparison.
//!
//! Structural equality ([`PartialEq`]) compares node contents and is
//! independent of sharing.

mod pointer;

pub use pointer::evaluate_pointer;

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

/// The object key that marks a reference node.
pub const REF_KEY: &str = "$ref";

/// The reference string designating the session root.
pub const SELF_REF: &str = "#";

/// Non-container, non-boolean terminal values.
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    /// JSON `null`
    Null,
    /// JSON string
    String(String),
    /// JSON number (integer or float)
    Number(serde_json::Number),
}

#[derive(Debug, Clone, PartialEq)]
enum Node {
    Boolean(bool),
    Scalar(Scalar),
    Array(Vec<Document>),
    Object(IndexMap<String, Document>),
}

/// A hierarchical document: the input, intermediate, and output type of the
/// dereferencer.
///
/// Cheap to clone; clones share the underlying node. See the module docs for
/// the identity semantics.
#[derive(Debug, Clone)]
pub struct Document {
    node: Arc<Node>,
}

impl Document {
    /// A boolean document. Valid and terminal: never traversed or merged into.
    #[must_use]
    pub fn boolean(value: bool) -> Self {
        Self::from_node(Node::Boolean(value))
    }

    /// A scalar document.
    #[must_use]
    pub fn scalar(value: Scalar) -> Self {
        Self::from_node(Node::Scalar(value))
    }

    /// An array document over existing handles.
    #[must_use]
    pub fn array(items: Vec<Document>) -> Self {
        Self::from_node(Node::Array(items))
    }

    /// An object document over existing handles. Key order is preserved.
    #[must_use]
    pub fn object(entries: IndexMap<String, Document>) -> Self {
        Self::from_node(Node::Object(entries))
    }

    fn from_node(node: Node) -> Self {
        Self { node: Arc::new(node) }
    }

    /// Parse a document from JSON text.
    pub fn from_json_str(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str::<Value>(text).map(Self::from)
    }

    /// Render this document as a [`serde_json::Value`].
    #[must_use]
    pub fn to_value(&self) -> Value {
        match &*self.node {
            Node::Boolean(value) => Value::Bool(*value),
            Node::Scalar(Scalar::Null) => Value::Null,
            Node::Scalar(Scalar::String(text)) => Value::String(text.clone()),
            Node::Scalar(Scalar::Number(number)) => Value::Number(number.clone()),
            Node::Array(items) => Value::Array(items.iter().map(Document::to_value).collect()),
            Node::Object(entries) => Value::Object(
                entries.iter().map(|(key, value)| (key.clone(), value.to_value())).collect(),
            ),
        }
    }

    /// Whether two handles designate the same underlying node.
    ///
    /// This is the identity relation of the resolver: identical pure-ref
    /// strings are substituted with `ptr_eq` handles within one session.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.node, &other.node)
    }

    /// A new root handle over a shallow copy of this node. Children are
    /// shared; the returned handle is never `ptr_eq` to `self`.
    #[must_use]
    pub fn detached(&self) -> Self {
        Self::from_node((*self.node).clone())
    }

    /// `true` for boolean documents.
    #[must_use]
    pub fn is_boolean(&self) -> bool {
        matches!(&*self.node, Node::Boolean(_))
    }

    /// The boolean value, if this is a boolean document.
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match &*self.node {
            Node::Boolean(value) => Some(*value),
            _ => None,
        }
    }

    /// The string value, if this is a string scalar.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match &*self.node {
            Node::Scalar(Scalar::String(text)) => Some(text),
            _ => None,
        }
    }

    /// The ordered entries, if this is an object document.
    #[must_use]
    pub fn as_object(&self) -> Option<&IndexMap<String, Document>> {
        match &*self.node {
            Node::Object(entries) => Some(entries),
            _ => None,
        }
    }

    /// The items, if this is an array document.
    #[must_use]
    pub fn as_array(&self) -> Option<&[Document]> {
        match &*self.node {
            Node::Array(items) => Some(items),
            _ => None,
        }
    }

    /// Look up a key on an object document.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Document> {
        self.as_object()?.get(key)
    }

    /// The `$ref` string of a reference node, if this is one.
    ///
    /// Returns `None` both for non-objects and for objects whose `$ref` value
    /// is not a string; the collector reports the latter as an error before
    /// resolution starts.
    #[must_use]
    pub fn ref_target(&self) -> Option<&str> {
        self.as_object()?.get(REF_KEY)?.as_str()
    }

    /// Whether this document is a reference node with a string `$ref`.
    #[must_use]
    pub fn is_ref_node(&self) -> bool {
        self.ref_target().is_some()
    }
}

impl PartialEq for Document {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.node, &other.node) || *self.node == *other.node
    }
}

impl Eq for Document {}

impl From<Value> for Document {
    fn from(value: Value) -> Self {
        match value {
            Value::Bool(b) => Self::boolean(b),
            Value::Null => Self::scalar(Scalar::Null),
            Value::String(text) => Self::scalar(Scalar::String(text)),
            Value::Number(number) => Self::scalar(Scalar::Number(number)),
            Value::Array(items) => Self::array(items.into_iter().map(Self::from).collect()),
            Value::Object(entries) => Self::object(
                entries.into_iter().map(|(key, value)| (key, Self::from(value))).collect(),
            ),
        }
    }
}

impl From<&Document> for Value {
    fn from(document: &Document) -> Self {
        document.to_value()
    }
}

impl fmt::Display for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_value())
    }
}

impl Serialize for Document {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_value().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Document {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Value::deserialize(deserializer).map(Self::from)
    }
}
