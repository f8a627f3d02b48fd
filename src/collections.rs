//! Typed clients: one [`CollectionClient`] per content type, all bundled in
//! [`Newsletter`].
//!
//! A client fixes the gateway path to `T::COLLECTION`, validates required
//! fields before writing, and converts documents to [`Stored<T>`].

use crate::content::{
    Aviso, Content, Destaque, Evento, ItemGaleria, Noticia, Stored, to_fields,
};
use crate::store::{
    Document, FIELD_ID, Fields, Gateway, GatewayError, Listing, Query, Subscription,
};
use serde_json::Value;
use std::fmt;
use std::marker::PhantomData;

pub struct CollectionClient<T> {
    gateway: Gateway,
    _content: PhantomData<fn() -> T>,
}

impl<T> Clone for CollectionClient<T> {
    fn clone(&self) -> Self {
        Self {
            gateway: self.gateway.clone(),
            _content: PhantomData,
        }
    }
}

impl<T: Content> fmt::Debug for CollectionClient<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CollectionClient")
            .field("collection", &T::COLLECTION)
            .finish()
    }
}

impl<T: Content> CollectionClient<T> {
    pub fn new(gateway: Gateway) -> Self {
        Self {
            gateway,
            _content: PhantomData,
        }
    }

    pub fn collection(&self) -> &'static str {
        T::COLLECTION
    }

    /// Validate and store a new item. Blank required fields are
    /// [`GatewayError::Invalid`] and nothing is written.
    pub fn create(&self, item: &T) -> Result<Stored<T>, GatewayError> {
        let missing = item.missing_fields();
        if !missing.is_empty() {
            return Err(GatewayError::Invalid {
                collection: T::COLLECTION.to_string(),
                missing: missing.into_iter().map(String::from).collect(),
            });
        }
        let fields = to_fields(item).map_err(|source| GatewayError::Malformed {
            path: T::COLLECTION.to_string(),
            id: String::new(),
            source,
        })?;
        let created = self.gateway.create(T::COLLECTION, fields)?;
        decode(created.data)
    }

    pub fn read(&self, id: &str) -> Result<Stored<T>, GatewayError> {
        decode(self.gateway.read(T::COLLECTION, id)?)
    }

    /// Merge `fields` into the item. Fields not named are kept.
    pub fn update(&self, id: &str, fields: Fields) -> Result<(), GatewayError> {
        self.gateway.update(T::COLLECTION, id, fields)
    }

    pub fn delete(&self, id: &str) -> Result<(), GatewayError> {
        self.gateway.delete(T::COLLECTION, id)
    }

    /// Items under `query`. Documents that do not fit `T` are skipped.
    pub fn list(&self, query: &Query) -> Result<Vec<Stored<T>>, GatewayError> {
        self.gateway
            .list(T::COLLECTION, query)
            .map(decode_listing)
    }

    /// Items whose `field` equals `value`, newest first.
    ///
    /// The store filters by equality; the newest-first sort is then applied
    /// here since an ordered query keeps store order.
    pub fn list_where(
        &self,
        field: &str,
        value: impl Into<Value>,
    ) -> Result<Vec<Stored<T>>, GatewayError> {
        let query = Query::new().order_by(field).equal_to(value);
        let mut items = self.list(&query)?;
        items.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(items)
    }

    pub fn subscribe<F>(&self, query: &Query, callback: F) -> Subscription
    where
        F: Fn(Result<Vec<Stored<T>>, GatewayError>) + Send + Sync + 'static,
    {
        self.gateway
            .subscribe(T::COLLECTION, query, move |result| {
                callback(result.map(decode_listing))
            })
    }

    pub fn subscribe_item<F>(&self, id: &str, callback: F) -> Subscription
    where
        F: Fn(Result<Stored<T>, GatewayError>) + Send + Sync + 'static,
    {
        self.gateway
            .subscribe_document(T::COLLECTION, id, move |result| {
                callback(result.and_then(decode))
            })
    }
}

fn decode<T: Content>(doc: Document) -> Result<Stored<T>, GatewayError> {
    let id = doc
        .get(FIELD_ID)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();
    Stored::from_document(doc).map_err(|source| GatewayError::Malformed {
        path: T::COLLECTION.to_string(),
        id,
        source,
    })
}

fn decode_listing<T: Content>(listing: Listing) -> Vec<Stored<T>> {
    listing
        .data
        .into_iter()
        .filter_map(|doc| match decode(doc) {
            Ok(item) => Some(item),
            Err(e) => {
                tracing::warn!(error = %e, "skipping document");
                None
            }
        })
        .collect()
}

/// The five collection clients over one gateway.
#[derive(Debug, Clone)]
pub struct Newsletter {
    pub noticias: CollectionClient<Noticia>,
    pub eventos: CollectionClient<Evento>,
    pub avisos: CollectionClient<Aviso>,
    pub galeria: CollectionClient<ItemGaleria>,
    pub destaques: CollectionClient<Destaque>,
    gateway: Gateway,
}

impl Newsletter {
    pub fn new(gateway: Gateway) -> Self {
        Self {
            noticias: CollectionClient::new(gateway.clone()),
            eventos: CollectionClient::new(gateway.clone()),
            avisos: CollectionClient::new(gateway.clone()),
            galeria: CollectionClient::new(gateway.clone()),
            destaques: CollectionClient::new(gateway.clone()),
            gateway,
        }
    }

    /// Untyped access, for callers that pick the collection at runtime.
    pub fn gateway(&self) -> &Gateway {
        &self.gateway
    }
}
