//! In-process implementation of [`Store`].
//!
//! The whole tree is one `serde_json::Value` behind a mutex. Every write
//! recomputes the snapshot of each listener whose path overlaps the written
//! path and, when it changed, posts it to that listener's mailbox while the
//! lock is still held. Mailboxes are drained after the lock is released, so
//! listeners may call back into the store.
//!
//! Posting under the lock fixes the order of a listener's snapshots to the
//! order of the writes. Only one thread drains a given mailbox at a time;
//! a writer that finds it already being drained leaves its snapshot for
//! the active drainer. A listener therefore never sees an older snapshot
//! after a newer one, whichever thread wrote them.
//!
//! The tree can be saved to and loaded from a pretty-printed JSON file,
//! which is how the CLI keeps data between runs.

use super::backend::{
    Fields, Listener, Snapshot, Store, StoreError, WatchId, WatchTarget, check_key,
};
use super::clock::wall_millis;
use super::push_id::PushIdGenerator;
use super::query::{Child, Query};
use serde_json::{Map, Value};
use std::collections::VecDeque;
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

struct Watcher {
    id: WatchId,
    segments: Vec<String>,
    target: WatchTarget,
    mailbox: Arc<Mailbox>,
    last: Snapshot,
}

#[derive(Default)]
struct MailboxState {
    queue: VecDeque<Snapshot>,
    draining: bool,
}

/// Ordered delivery queue of one listener.
struct Mailbox {
    listener: Listener,
    state: Mutex<MailboxState>,
}

impl Mailbox {
    fn new(listener: Listener) -> Self {
        Self {
            listener,
            state: Mutex::new(MailboxState::default()),
        }
    }

    fn post(&self, snapshot: Snapshot) {
        if let Ok(mut state) = self.state.lock() {
            state.queue.push_back(snapshot);
        }
    }

    /// Deliver queued snapshots in order, unless another call is already
    /// doing so. The listener runs with no lock held.
    fn drain(&self) {
        match self.state.lock() {
            Ok(mut state) if !state.draining => state.draining = true,
            _ => return,
        }
        loop {
            let next = match self.state.lock() {
                Ok(mut state) => match state.queue.pop_front() {
                    Some(snapshot) => snapshot,
                    None => {
                        state.draining = false;
                        return;
                    }
                },
                Err(_) => return,
            };
            (self.listener)(Ok(next));
        }
    }
}

struct Inner {
    root: Value,
    push_ids: PushIdGenerator,
    watchers: Vec<Watcher>,
}

pub struct MemoryStore {
    inner: Mutex<Inner>,
    next_watch: AtomicU64,
    read_only: AtomicBool,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::from_value(Value::Object(Map::new()))
    }

    /// Build a store holding `root`. Nulls and empty objects are dropped;
    /// a non-object root becomes an empty tree.
    pub fn from_value(root: Value) -> Self {
        let root = match prune(root) {
            Some(v @ Value::Object(_)) => v,
            _ => Value::Object(Map::new()),
        };
        Self {
            inner: Mutex::new(Inner {
                root,
                push_ids: PushIdGenerator::new(),
                watchers: Vec::new(),
            }),
            next_watch: AtomicU64::new(1),
            read_only: AtomicBool::new(false),
        }
    }

    /// Load a tree saved with [`save`](Self::save).
    ///
    /// A missing file is an empty store. A file that is not valid JSON is an
    /// error rather than an empty store, so a typo never wipes content.
    pub fn load(path: &Path) -> Result<Self, StoreError> {
        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::new()),
            Err(e) => return Err(e.into()),
        };
        let root: Value = serde_json::from_str(&content)?;
        Ok(Self::from_value(root))
    }

    pub fn save(&self, path: &Path) -> Result<(), StoreError> {
        let json = serde_json::to_string_pretty(&self.to_value()?)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Copy of the whole tree.
    pub fn to_value(&self) -> Result<Value, StoreError> {
        Ok(self.lock()?.root.clone())
    }

    /// Deny (or re-allow) all writes, the way security rules would.
    pub fn set_read_only(&self, read_only: bool) {
        self.read_only.store(read_only, Ordering::SeqCst);
    }

    /// Number of registered listeners.
    pub fn watcher_count(&self) -> usize {
        self.lock().map(|inner| inner.watchers.len()).unwrap_or(0)
    }

    fn lock(&self) -> Result<MutexGuard<'_, Inner>, StoreError> {
        self.inner
            .lock()
            .map_err(|_| StoreError::Unavailable("store lock poisoned".into()))
    }

    fn check_writable(&self, path: &str) -> Result<(), StoreError> {
        if self.read_only.load(Ordering::SeqCst) {
            return Err(StoreError::PermissionDenied(format!(
                "write to `{path}` denied"
            )));
        }
        Ok(())
    }

    /// Post snapshots for a write at `written`, release the lock, then
    /// drain the affected mailboxes.
    fn commit(&self, mut inner: MutexGuard<'_, Inner>, written: &[String]) {
        let Inner { root, watchers, .. } = &mut *inner;
        let mut touched = Vec::new();
        for watcher in watchers.iter_mut() {
            if !overlaps(&watcher.segments, written) {
                continue;
            }
            let snapshot = take_snapshot(root, &watcher.segments, &watcher.target);
            if snapshot != watcher.last {
                watcher.last = snapshot.clone();
                watcher.mailbox.post(snapshot);
                tracing::trace!(watch = watcher.id.0, "snapshot queued");
                touched.push(watcher.mailbox.clone());
            }
        }
        drop(inner);

        for mailbox in touched {
            mailbox.drain();
        }
    }

    /// Split an update into absolute child paths, checking every key.
    fn plan_update(
        path: &str,
        fields: Fields,
    ) -> Result<(Vec<String>, Vec<(Vec<String>, Value)>), StoreError> {
        let segs = writable_segments(path)?;
        let mut writes = Vec::with_capacity(fields.len());
        for (key, value) in fields {
            let mut child = segs.clone();
            child.extend(segments(&key)?);
            if child.len() == segs.len() {
                return Err(invalid(&key, "empty field name"));
            }
            check_value_keys(path, &value)?;
            writes.push((child, value));
        }
        Ok((segs, writes))
    }
}

impl Store for MemoryStore {
    fn push_key(&self, path: &str) -> Result<String, StoreError> {
        segments(path)?;
        Ok(self.lock()?.push_ids.generate(wall_millis()))
    }

    fn set(&self, path: &str, value: Value) -> Result<(), StoreError> {
        let segs = writable_segments(path)?;
        check_value_keys(path, &value)?;
        self.check_writable(path)?;
        let mut inner = self.lock()?;
        write(&mut inner.root, &segs, value);
        self.commit(inner, &segs);
        Ok(())
    }

    fn get(&self, path: &str) -> Result<Option<Value>, StoreError> {
        let segs = segments(path)?;
        let inner = self.lock()?;
        Ok(node(&inner.root, &segs).cloned())
    }

    fn update(&self, path: &str, fields: Fields) -> Result<(), StoreError> {
        let (segs, writes) = Self::plan_update(path, fields)?;
        self.check_writable(path)?;

        let mut inner = self.lock()?;
        for (child, value) in writes {
            write(&mut inner.root, &child, value);
        }
        self.commit(inner, &segs);
        Ok(())
    }

    fn update_existing(&self, path: &str, fields: Fields) -> Result<bool, StoreError> {
        let (segs, writes) = Self::plan_update(path, fields)?;
        self.check_writable(path)?;

        let mut inner = self.lock()?;
        if !node(&inner.root, &segs).is_some_and(Value::is_object) {
            return Ok(false);
        }
        for (child, value) in writes {
            write(&mut inner.root, &child, value);
        }
        self.commit(inner, &segs);
        Ok(true)
    }

    fn remove(&self, path: &str) -> Result<(), StoreError> {
        let segs = writable_segments(path)?;
        self.check_writable(path)?;
        let mut inner = self.lock()?;
        remove(&mut inner.root, &segs);
        self.commit(inner, &segs);
        Ok(())
    }

    fn query(&self, path: &str, query: &Query) -> Result<Vec<Child>, StoreError> {
        let segs = segments(path)?;
        let inner = self.lock()?;
        Ok(query.apply(children(&inner.root, &segs)))
    }

    fn watch(&self, target: WatchTarget, listener: Listener) -> Result<WatchId, StoreError> {
        let segs = segments(target.path())?;
        let id = WatchId(self.next_watch.fetch_add(1, Ordering::Relaxed));
        let mailbox = Arc::new(Mailbox::new(listener));

        let mut inner = self.lock()?;
        let snapshot = take_snapshot(&inner.root, &segs, &target);
        mailbox.post(snapshot.clone());
        inner.watchers.push(Watcher {
            id,
            segments: segs,
            target,
            mailbox: mailbox.clone(),
            last: snapshot,
        });
        drop(inner);

        mailbox.drain();
        Ok(id)
    }

    fn unwatch(&self, id: WatchId) {
        if let Ok(mut inner) = self.lock() {
            inner.watchers.retain(|w| w.id != id);
        }
    }
}

// =============================================================================
// Paths
// =============================================================================

fn invalid(path: &str, reason: &str) -> StoreError {
    StoreError::InvalidPath {
        path: path.to_string(),
        reason: reason.to_string(),
    }
}

/// Split a `/`-separated path, skipping empty segments.
fn segments(path: &str) -> Result<Vec<String>, StoreError> {
    let mut out = Vec::new();
    for seg in path.split('/').filter(|s| !s.is_empty()) {
        check_key(seg).map_err(|reason| invalid(path, &reason))?;
        out.push(seg.to_string());
    }
    Ok(out)
}

/// Reject object keys, at any depth of `value`, that could not be
/// addressed as a path segment later.
fn check_value_keys(path: &str, value: &Value) -> Result<(), StoreError> {
    match value {
        Value::Object(map) => map.iter().try_for_each(|(key, child)| {
            check_key(key).map_err(|reason| invalid(path, &format!("field {reason}")))?;
            check_value_keys(path, child)
        }),
        Value::Array(items) => items.iter().try_for_each(|item| check_value_keys(path, item)),
        _ => Ok(()),
    }
}

fn writable_segments(path: &str) -> Result<Vec<String>, StoreError> {
    let segs = segments(path)?;
    if segs.is_empty() {
        return Err(invalid(path, "cannot write to the root"));
    }
    Ok(segs)
}

/// True when one path is an ancestor of (or equal to) the other.
fn overlaps(a: &[String], b: &[String]) -> bool {
    a.iter().zip(b).all(|(x, y)| x == y)
}

// =============================================================================
// Tree operations
// =============================================================================

/// Drop nulls and empty objects, recursively. `None` when nothing is left.
fn prune(value: Value) -> Option<Value> {
    match value {
        Value::Null => None,
        Value::Object(map) => {
            let pruned: Map<String, Value> = map
                .into_iter()
                .filter_map(|(k, v)| prune(v).map(|v| (k, v)))
                .collect();
            if pruned.is_empty() {
                None
            } else {
                Some(Value::Object(pruned))
            }
        }
        other => Some(other),
    }
}

fn node<'a>(root: &'a Value, segs: &[String]) -> Option<&'a Value> {
    let mut cur = root;
    for seg in segs {
        cur = cur.as_object()?.get(seg)?;
    }
    Some(cur)
}

fn children(root: &Value, segs: &[String]) -> Vec<Child> {
    node(root, segs)
        .and_then(Value::as_object)
        .map(|map| {
            map.iter()
                .map(|(k, v)| Child::new(k.clone(), v.clone()))
                .collect()
        })
        .unwrap_or_default()
}

fn take_snapshot(root: &Value, segs: &[String], target: &WatchTarget) -> Snapshot {
    match target {
        WatchTarget::Node(_) => Snapshot::Node(node(root, segs).cloned()),
        WatchTarget::Children(_, query) => Snapshot::Children(query.apply(children(root, segs))),
    }
}

fn ensure_object(value: &mut Value) -> &mut Map<String, Value> {
    if !value.is_object() {
        *value = Value::Object(Map::new());
    }
    match value {
        Value::Object(map) => map,
        _ => unreachable!("value was just replaced with an object"),
    }
}

/// Write `value` at `segs` (non-empty), creating parents as needed.
fn write(root: &mut Value, segs: &[String], value: Value) {
    let Some(value) = prune(value) else {
        remove(root, segs);
        return;
    };
    let Some((last, parents)) = segs.split_last() else {
        return;
    };
    let mut cur = root;
    for seg in parents {
        cur = ensure_object(cur).entry(seg.clone()).or_insert(Value::Null);
    }
    ensure_object(cur).insert(last.clone(), value);
}

/// Remove the node at `segs`, then any ancestors left empty.
fn remove(root: &mut Value, segs: &[String]) {
    let Value::Object(map) = root else {
        return;
    };
    match segs {
        [] => map.clear(),
        [leaf] => {
            map.remove(leaf);
        }
        [head, rest @ ..] => {
            if let Some(child) = map.get_mut(head) {
                remove(child, rest);
                if child.as_object().is_some_and(Map::is_empty) {
                    map.remove(head);
                }
            }
        }
    }
}
