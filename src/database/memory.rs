use async_trait::async_trait;
use serde_json::{Map, Value};
use std::sync::{Mutex, MutexGuard, PoisonError};

use super::{Database, PushIdGenerator, Reference};
use crate::error::Result;

/// An in-process JSON tree with realtime database semantics.
///
/// Writing `null` deletes, and parents left without children disappear,
/// the same way the hosted database behaves. Access rules are not enforced.
#[derive(Debug)]
pub struct MemoryDatabase {
    root: Mutex<Value>,
    ids: PushIdGenerator,
}

impl Default for MemoryDatabase {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryDatabase {
    pub fn new() -> Self {
        Self {
            root: Mutex::new(Value::Null),
            ids: PushIdGenerator::new(),
        }
    }

    /// A database pre-loaded with `root`
    pub fn with_data(root: Value) -> Self {
        let database = Self::new();
        *database.lock() = prune(root);
        database
    }

    fn lock(&self) -> MutexGuard<'_, Value> {
        self.root.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Copy of the whole tree
    pub fn snapshot(&self) -> Value {
        self.lock().clone()
    }
}

fn lookup<'a>(node: &'a Value, path: &[String]) -> Option<&'a Value> {
    match path.split_first() {
        None => Some(node),
        Some((head, rest)) => node.get(head.as_str()).and_then(|child| lookup(child, rest)),
    }
}

/// Write `value` at `path` below `node`, pruning empty parents.
fn write(node: &mut Value, path: &[String], value: Value) {
    match path.split_first() {
        None => *node = prune(value),
        Some((head, rest)) => {
            if !node.is_object() {
                *node = Value::Object(Map::new());
            }
            if let Value::Object(map) = node {
                let mut child = map.remove(head).unwrap_or(Value::Null);
                write(&mut child, rest, value);
                if !child.is_null() {
                    map.insert(head.clone(), child);
                }
                if map.is_empty() {
                    *node = Value::Null;
                }
            }
        }
    }
}

/// Drop null members and empty objects
fn prune(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let map: Map<String, Value> = map
                .into_iter()
                .map(|(key, child)| (key, prune(child)))
                .filter(|(_, child)| !child.is_null())
                .collect();
            if map.is_empty() {
                Value::Null
            } else {
                Value::Object(map)
            }
        }
        other => other,
    }
}

#[async_trait]
impl Database for MemoryDatabase {
    async fn push(&self, at: &Reference, value: Value, _token: &str) -> Result<String> {
        let key = self.ids.next_id();
        let target = at.child(&key);
        write(&mut self.lock(), target.segments(), value);
        log::trace!("push {}", target);
        Ok(key)
    }

    async fn get(&self, at: &Reference, _token: &str) -> Result<Option<Value>> {
        let root = self.lock();
        Ok(lookup(&root, at.segments())
            .filter(|node| !node.is_null())
            .cloned())
    }

    async fn put(&self, at: &Reference, value: Value, _token: &str) -> Result<()> {
        write(&mut self.lock(), at.segments(), value);
        log::trace!("put {}", at);
        Ok(())
    }

    async fn delete(&self, at: &Reference, _token: &str) -> Result<()> {
        write(&mut self.lock(), at.segments(), Value::Null);
        log::trace!("delete {}", at);
        Ok(())
    }
}
