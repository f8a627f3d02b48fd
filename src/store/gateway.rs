//! Document-level operations over a [`Store`].
//!
//! The gateway is the only code that talks to the store. It adds the
//! system fields (`id`, `createdAt`, `updatedAt`), folds collection keys
//! into documents, applies the default newest-first ordering, and turns
//! every store failure into a [`GatewayError`]. Nothing here panics or
//! lets a raw [`StoreError`] escape.
//!
//! ```
//! use boletim::store::{Gateway, MemoryStore, Query};
//! use serde_json::json;
//! use std::sync::Arc;
//!
//! let gateway = Gateway::new(Arc::new(MemoryStore::new()));
//! let created = gateway
//!     .create("avisos", json!({"titulo": "Prova"}).as_object().unwrap().clone())
//!     .unwrap();
//! let listing = gateway.list("avisos", &Query::new()).unwrap();
//! assert_eq!(listing.count, 1);
//! assert_eq!(listing.data[0]["id"], created.id.as_str());
//! ```

use super::backend::{Fields, Listener, Snapshot, Store, StoreError, WatchTarget, check_key};
use super::clock::{Clock, SystemClock};
use super::query::{Child, Query};
use super::subscription::Subscription;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use thiserror::Error;

/// A stored document: its fields, system fields included.
pub type Document = Fields;

pub const FIELD_ID: &str = "id";
pub const FIELD_CREATED_AT: &str = "createdAt";
pub const FIELD_UPDATED_AT: &str = "updatedAt";

/// The gateway operation a failure came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Create,
    Read,
    List,
    Update,
    Delete,
    Subscribe,
    SubscribeDocument,
}

impl Operation {
    /// User-facing message for a failed operation.
    pub fn failure_message(self) -> &'static str {
        match self {
            Operation::Create => "Erro ao criar documento",
            Operation::Read => "Erro ao ler documento",
            Operation::List => "Erro ao ler coleção",
            Operation::Update => "Erro ao atualizar documento",
            Operation::Delete => "Erro ao excluir documento",
            Operation::Subscribe => "Erro ao escutar mudanças",
            Operation::SubscribeDocument => "Erro ao escutar mudanças do documento",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Operation::Create => "create",
            Operation::Read => "read",
            Operation::List => "list",
            Operation::Update => "update",
            Operation::Delete => "delete",
            Operation::Subscribe => "subscribe",
            Operation::SubscribeDocument => "subscribe_document",
        };
        f.write_str(name)
    }
}

#[derive(Error, Debug)]
pub enum GatewayError {
    /// The document does not exist. An expected outcome, not a failure.
    #[error("document `{path}/{id}` not found")]
    NotFound { path: String, id: String },
    #[error("{op} failed: {source}")]
    Store {
        op: Operation,
        #[source]
        source: StoreError,
    },
    #[error("{collection}: required fields are blank: {}", .missing.join(", "))]
    Invalid {
        collection: String,
        missing: Vec<String>,
    },
    /// The stored JSON does not fit the typed shape of its collection.
    #[error("document `{path}/{id}` has an unexpected shape: {source}")]
    Malformed {
        path: String,
        id: String,
        #[source]
        source: serde_json::Error,
    },
}

impl GatewayError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, GatewayError::NotFound { .. })
    }
}

/// Result of a successful `create`.
#[derive(Debug, Clone, PartialEq)]
pub struct Created {
    pub id: String,
    pub data: Document,
}

/// Result of `list` and the payload of collection subscriptions.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Listing {
    pub data: Vec<Document>,
    pub count: usize,
}

impl Listing {
    fn new(data: Vec<Document>) -> Self {
        Self {
            count: data.len(),
            data,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

#[derive(Clone)]
pub struct Gateway {
    store: Arc<dyn Store>,
    clock: Arc<dyn Clock>,
}

impl fmt::Debug for Gateway {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Gateway").finish_non_exhaustive()
    }
}

impl Gateway {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self::with_clock(store, Arc::new(SystemClock::new()))
    }

    pub fn with_clock(store: Arc<dyn Store>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// Write a new document under `path` with a fresh id.
    ///
    /// System fields always win over same-named entries in `fields`.
    pub fn create(&self, path: &str, fields: Fields) -> Result<Created, GatewayError> {
        tracing::debug!(path, fields = fields.len(), "create");
        let created = self
            .try_create(path, fields)
            .map_err(|e| normalize(Operation::Create, path, e))?;
        tracing::info!(path, id = %created.id, "document created");
        Ok(created)
    }

    fn try_create(&self, path: &str, mut data: Fields) -> Result<Created, StoreError> {
        let id = self.store.push_key(path)?;
        let now = self.clock.now_millis();
        data.insert(FIELD_ID.into(), Value::String(id.clone()));
        data.insert(FIELD_CREATED_AT.into(), now.into());
        data.insert(FIELD_UPDATED_AT.into(), now.into());
        self.store
            .set(&document_path(path, &id)?, Value::Object(data.clone()))?;
        Ok(Created { id, data })
    }

    /// The document `id` under `path`.
    ///
    /// An id that is empty or not a single path segment is rejected before
    /// the store is touched, here and in every other per-document operation.
    pub fn read(&self, path: &str, id: &str) -> Result<Document, GatewayError> {
        tracing::debug!(path, id, "read");
        let value = document_path(path, id)
            .and_then(|doc| self.store.get(&doc))
            .map_err(|e| normalize(Operation::Read, path, e))?;
        match value {
            Some(Value::Object(doc)) => Ok(doc),
            Some(_) => {
                tracing::warn!(path, id, "node is not a document");
                Err(not_found(path, id))
            }
            None => Err(not_found(path, id)),
        }
    }

    /// All documents under `path`, shaped by `query`.
    ///
    /// Without `order_by` the result is sorted newest first by `createdAt`.
    pub fn list(&self, path: &str, query: &Query) -> Result<Listing, GatewayError> {
        tracing::debug!(path, ?query, "list");
        let children = self
            .store
            .query(path, query)
            .map_err(|e| normalize(Operation::List, path, e))?;
        Ok(shape_listing(path, children, query))
    }

    /// Merge `fields` into an existing document and refresh `updatedAt`.
    ///
    /// `id` and `createdAt` in `fields` are ignored. Updating a document
    /// that does not exist is [`GatewayError::NotFound`].
    pub fn update(&self, path: &str, id: &str, mut fields: Fields) -> Result<(), GatewayError> {
        tracing::debug!(path, id, fields = fields.len(), "update");
        fields.remove(FIELD_ID);
        fields.remove(FIELD_CREATED_AT);

        let doc_path =
            document_path(path, id).map_err(|e| normalize(Operation::Update, path, e))?;
        fields.insert(FIELD_UPDATED_AT.into(), self.clock.now_millis().into());
        let updated = self
            .store
            .update_existing(&doc_path, fields)
            .map_err(|e| normalize(Operation::Update, path, e))?;
        if !updated {
            return Err(not_found(path, id));
        }
        Ok(())
    }

    /// Remove a document. Deleting an absent document succeeds.
    pub fn delete(&self, path: &str, id: &str) -> Result<(), GatewayError> {
        tracing::debug!(path, id, "delete");
        document_path(path, id)
            .and_then(|doc| self.store.remove(&doc))
            .map_err(|e| normalize(Operation::Delete, path, e))?;
        tracing::info!(path, id, "document deleted");
        Ok(())
    }

    /// Live version of [`list`](Self::list).
    ///
    /// `callback` runs immediately with the current listing, then after every
    /// change under `path`. If the listener cannot be registered, `callback`
    /// receives the error once and the returned handle is already inactive.
    pub fn subscribe<F>(&self, path: &str, query: &Query, callback: F) -> Subscription
    where
        F: Fn(Result<Listing, GatewayError>) + Send + Sync + 'static,
    {
        tracing::debug!(path, ?query, "subscribe");
        let active = Arc::new(AtomicBool::new(true));
        let gate = active.clone();
        let owned_path = path.to_string();
        let owned_query = query.clone();
        let callback = Arc::new(callback);
        let deliver = callback.clone();

        let listener: Listener = Arc::new(move |snapshot| {
            if !gate.load(Ordering::SeqCst) {
                return;
            }
            match snapshot {
                Ok(Snapshot::Children(children)) => {
                    deliver(Ok(shape_listing(&owned_path, children, &owned_query)))
                }
                Ok(Snapshot::Node(_)) => {}
                Err(e) => deliver(Err(normalize(Operation::Subscribe, &owned_path, e))),
            }
        });

        let target = WatchTarget::Children(path.to_string(), query.clone());
        self.register(Operation::Subscribe, path, target, listener, active, |e| {
            callback(Err(e))
        })
    }

    /// Live version of [`read`](Self::read).
    pub fn subscribe_document<F>(&self, path: &str, id: &str, callback: F) -> Subscription
    where
        F: Fn(Result<Document, GatewayError>) + Send + Sync + 'static,
    {
        tracing::debug!(path, id, "subscribe_document");
        let target = match document_path(path, id) {
            Ok(doc) => WatchTarget::Node(doc),
            Err(e) => {
                callback(Err(normalize(Operation::SubscribeDocument, path, e)));
                return Subscription::inert();
            }
        };
        let active = Arc::new(AtomicBool::new(true));
        let gate = active.clone();
        let owned_path = path.to_string();
        let owned_id = id.to_string();
        let callback = Arc::new(callback);
        let deliver = callback.clone();

        let listener: Listener = Arc::new(move |snapshot| {
            if !gate.load(Ordering::SeqCst) {
                return;
            }
            match snapshot {
                Ok(Snapshot::Node(Some(Value::Object(doc)))) => deliver(Ok(doc)),
                Ok(Snapshot::Node(_)) => deliver(Err(not_found(&owned_path, &owned_id))),
                Ok(Snapshot::Children(_)) => {}
                Err(e) => deliver(Err(normalize(
                    Operation::SubscribeDocument,
                    &owned_path,
                    e,
                ))),
            }
        });

        self.register(
            Operation::SubscribeDocument,
            path,
            target,
            listener,
            active,
            |e| callback(Err(e)),
        )
    }

    fn register(
        &self,
        op: Operation,
        path: &str,
        target: WatchTarget,
        listener: Listener,
        active: Arc<AtomicBool>,
        on_error: impl FnOnce(GatewayError),
    ) -> Subscription {
        match self.store.watch(target, listener) {
            Ok(watch) => Subscription::new(self.store.clone(), watch, active),
            Err(e) => {
                active.store(false, Ordering::SeqCst);
                on_error(normalize(op, path, e));
                Subscription::inert()
            }
        }
    }
}

/// Path of document `id` under `path`. The id must be one non-empty segment.
fn document_path(path: &str, id: &str) -> Result<String, StoreError> {
    let doc = format!("{}/{}", path.trim_end_matches('/'), id);
    check_key(id).map_err(|reason| StoreError::InvalidPath {
        path: doc.clone(),
        reason: format!("document id: {reason}"),
    })?;
    Ok(doc)
}

fn not_found(path: &str, id: &str) -> GatewayError {
    GatewayError::NotFound {
        path: path.to_string(),
        id: id.to_string(),
    }
}

fn normalize(op: Operation, path: &str, source: StoreError) -> GatewayError {
    tracing::warn!(%op, path, error = %source, "store error");
    GatewayError::Store { op, source }
}

fn created_at(doc: &Document) -> f64 {
    doc.get(FIELD_CREATED_AT)
        .and_then(Value::as_f64)
        .unwrap_or(0.0)
}

/// Turn store children into documents: fold each key in as `id` (a stored
/// `id` wins), skip non-object children, and apply the default ordering
/// when the query has none.
fn shape_listing(path: &str, children: Vec<Child>, query: &Query) -> Listing {
    let mut docs: Vec<Document> = children
        .into_iter()
        .filter_map(|child| match child.value {
            Value::Object(fields) => {
                let mut doc = Document::new();
                doc.insert(FIELD_ID.into(), Value::String(child.key));
                doc.extend(fields);
                Some(doc)
            }
            _ => {
                tracing::warn!(path, key = %child.key, "skipping non-document child");
                None
            }
        })
        .collect();

    if !query.is_ordered() {
        docs.sort_by(|a, b| created_at(b).total_cmp(&created_at(a)));
    }
    Listing::new(docs)
}
