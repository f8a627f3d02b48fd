//! The [`Store`] trait: the wire contract of a hierarchical realtime store.
//!
//! Paths are `/`-separated (`noticias/-Nx4...`). Values are JSON. Writing
//! `null` removes a node, and objects left empty by a removal disappear,
//! so "absent" and "null" are the same thing.
//!
//! The gateway only ever talks to this trait. [`MemoryStore`](super::MemoryStore)
//! is the in-process implementation; a hosted service sits behind the same
//! methods.

use super::query::{Child, Query};
use serde_json::{Map, Value};
use std::sync::Arc;
use thiserror::Error;

/// A document body or a partial update: field name → value.
pub type Fields = Map<String, Value>;

/// Characters a path segment, object key or document id may not contain.
const FORBIDDEN_CHARS: &[char] = &['/', '.', '#', '$', '[', ']'];

/// Check one path segment, object key or document id.
///
/// Returns the reason on rejection.
pub(crate) fn check_key(key: &str) -> Result<(), String> {
    if key.is_empty() {
        return Err("empty key".into());
    }
    match key
        .chars()
        .find(|c| FORBIDDEN_CHARS.contains(c) || c.is_control())
    {
        Some(c) => Err(format!("`{key}` contains {c:?}")),
        None => Ok(()),
    }
}

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("invalid path `{path}`: {reason}")]
    InvalidPath { path: String, reason: String },
    #[error("permission denied: {0}")]
    PermissionDenied(String),
    #[error("store unavailable: {0}")]
    Unavailable(String),
    #[error("snapshot IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("snapshot JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Identifies a registered listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WatchId(pub u64);

/// What a listener observes.
#[derive(Debug, Clone, PartialEq)]
pub enum WatchTarget {
    /// A single node; snapshots are [`Snapshot::Node`].
    Node(String),
    /// The children of a node under a query; snapshots are [`Snapshot::Children`].
    Children(String, Query),
}

impl WatchTarget {
    pub fn path(&self) -> &str {
        match self {
            WatchTarget::Node(path) | WatchTarget::Children(path, _) => path,
        }
    }
}

/// Full state of a watched target at one point in time.
#[derive(Debug, Clone, PartialEq)]
pub enum Snapshot {
    Node(Option<Value>),
    Children(Vec<Child>),
}

/// Callback invoked with every new snapshot (or a listener error).
pub type Listener = Arc<dyn Fn(Result<Snapshot, StoreError>) + Send + Sync>;

/// Hierarchical key-value store with push-based change notification.
pub trait Store: Send + Sync {
    /// Generate a fresh, unique child key under `path`.
    fn push_key(&self, path: &str) -> Result<String, StoreError>;

    /// Overwrite the node at `path`. Keys inside `value` follow the same
    /// rules as path segments.
    fn set(&self, path: &str, value: Value) -> Result<(), StoreError>;

    /// Read the node at `path`, `None` if absent.
    fn get(&self, path: &str) -> Result<Option<Value>, StoreError>;

    /// Merge `fields` into the node at `path`. Fields not named are untouched;
    /// a `null` field removes that child.
    fn update(&self, path: &str, fields: Fields) -> Result<(), StoreError>;

    /// Like [`update`](Self::update), but only when the node at `path` is an
    /// object. The check and the merge are one atomic step. Returns `false`
    /// and writes nothing when there is no such object.
    fn update_existing(&self, path: &str, fields: Fields) -> Result<bool, StoreError>;

    /// Delete the node at `path`. Removing an absent node succeeds.
    fn remove(&self, path: &str) -> Result<(), StoreError>;

    /// Read the children of `path` under `query`. Absent paths yield no children.
    fn query(&self, path: &str, query: &Query) -> Result<Vec<Child>, StoreError>;

    /// Register a listener. It fires once with the current state, then after
    /// every write that changes what the target observes.
    fn watch(&self, target: WatchTarget, listener: Listener) -> Result<WatchId, StoreError>;

    /// Detach a listener. Unknown ids are ignored.
    fn unwatch(&self, id: WatchId);
}
