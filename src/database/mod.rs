//! Realtime database access
//!
//! Data is one JSON tree addressed by slash-separated [`Reference`]s. Both
//! backends speak the same verbs: push a child under a generated key, read a
//! node, replace a node, delete a node.

mod memory;
mod push_id;
mod rest;

use async_trait::async_trait;
use serde_json::Value;
use std::fmt;

use crate::error::{Error, Result};

pub use memory::MemoryDatabase;
pub use push_id::PushIdGenerator;
pub use rest::RestDatabase;

/// Path to a node in the database tree
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Reference {
    segments: Vec<String>,
}

impl Reference {
    pub fn root() -> Self {
        Self::default()
    }

    /// Reference to a descendant; `segment` may itself contain slashes
    pub fn child(&self, segment: &str) -> Self {
        let mut segments = self.segments.clone();
        segments.extend(
            segment
                .split('/')
                .filter(|part| !part.is_empty())
                .map(str::to_string),
        );
        Self { segments }
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Last segment, `None` at the root
    pub fn key(&self) -> Option<&str> {
        self.segments.last().map(String::as_str)
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }
}

impl fmt::Display for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "/{}", self.segments.join("/"))
    }
}

/// A realtime JSON tree
///
/// `token` is the signed-in user's id token; backends that do not enforce
/// access rules ignore it.
#[async_trait]
pub trait Database: Send + Sync {
    /// Store `value` under a new generated key below `at`, returning the key
    async fn push(&self, at: &Reference, value: Value, token: &str) -> Result<String>;

    /// Read a node, `None` when it does not exist
    async fn get(&self, at: &Reference, token: &str) -> Result<Option<Value>>;

    /// Replace a node
    async fn put(&self, at: &Reference, value: Value, token: &str) -> Result<()>;

    /// Remove a node; removing a missing node succeeds
    async fn delete(&self, at: &Reference, token: &str) -> Result<()>;

    /// Children of a node as `(key, value)` pairs in key order
    async fn children(&self, at: &Reference, token: &str) -> Result<Vec<(String, Value)>> {
        match self.get(at, token).await? {
            None => Ok(Vec::new()),
            Some(node) => children_of(node, at),
        }
    }
}

/// Split a node into keyed children.
///
/// Nodes whose keys are all small integers come back as arrays, with holes
/// as `null`; those are keyed by index.
pub(crate) fn children_of(node: Value, at: &Reference) -> Result<Vec<(String, Value)>> {
    match node {
        Value::Null => Ok(Vec::new()),
        Value::Object(map) => {
            let mut children: Vec<(String, Value)> = map.into_iter().collect();
            children.sort_by(|a, b| a.0.cmp(&b.0));
            Ok(children)
        }
        Value::Array(items) => Ok(items
            .into_iter()
            .enumerate()
            .filter(|(_, item)| !item.is_null())
            .map(|(index, item)| (index.to_string(), item))
            .collect()),
        other => Err(Error::general(format!(
            "expected a collection at {}, found {}",
            at, other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn child_splits_slashes() {
        let reference = Reference::root().child("product_scans").child("u1/-Nabc");
        assert_eq!(reference.segments(), ["product_scans", "u1", "-Nabc"]);
        assert_eq!(reference.key(), Some("-Nabc"));
        assert_eq!(reference.to_string(), "/product_scans/u1/-Nabc");
        assert!(Reference::root().child("//").is_root());
    }

    #[test]
    fn children_of_object_in_key_order() {
        let node = json!({"b": 2, "a": 1});
        let children = children_of(node, &Reference::root()).unwrap();
        let keys: Vec<_> = children.iter().map(|(key, _)| key.as_str()).collect();
        assert_eq!(keys, ["a", "b"]);
    }

    #[test]
    fn children_of_array_skips_holes() {
        let node = json!([null, {"Name": "x"}, null, {"Name": "y"}]);
        let children = children_of(node, &Reference::root()).unwrap();
        assert_eq!(children.len(), 2);
        assert_eq!(children[0].0, "1");
        assert_eq!(children[1].0, "3");
    }

    #[test]
    fn children_of_scalar_is_an_error() {
        assert!(children_of(json!(3), &Reference::root().child("x")).is_err());
    }
}
