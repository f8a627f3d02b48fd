//! # Boletim
//!
//! Data layer for a student-association newsletter: news, events, notices,
//! gallery items and highlights, stored as JSON documents in a realtime
//! hierarchical store, with images inlined as `data:` URIs.
//!
//! # Architecture: Three Layers
//!
//! ```text
//! collections  CollectionClient<T>  →  typed items, required-field checks
//! store        Gateway              →  ids, timestamps, ordering, error normalization
//! store        Store (trait)        →  JSON tree: set/get/update/remove/query/watch
//! ```
//!
//! Images enter through [`imaging`] before they reach a document: the file
//! is checked against the upload policy, optionally downscaled and
//! re-encoded as JPEG, and turned into a `data:` string.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`imaging`] | Image codec: validation, downscale + JPEG, inline `data:` URIs |
//! | [`store`] | `Store` trait, in-memory store, `Gateway`, subscriptions, result envelope |
//! | [`content`] | Typed content structs (`Noticia`, `Evento`, ...) and their required fields |
//! | [`collections`] | `CollectionClient<T>` and the `Newsletter` bundle of five clients |
//! | [`dashboard`] | Editor dashboard: counts and recent activity |
//! | [`config`] | `boletim.toml` loading, validation and merging |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## The Store Is a Parameter
//!
//! [`store::Gateway::new`] takes an `Arc<dyn Store>`. There is no global
//! connection, so tests run against [`store::MemoryStore`] (or a store that
//! fails on purpose) and a manual clock.
//!
//! ## Typed Results With an Explicit Not-Found
//!
//! Gateway operations return `Result<_, GatewayError>`. A missing document is
//! [`store::GatewayError::NotFound`], distinct from a store failure, and
//! [`store::Response`] renders either one as the flat
//! `{success, data, message}` envelope front-ends expect.
//!
//! ## Newest First, Client-Side
//!
//! Without `order_by`, listings are sorted by `createdAt` descending after
//! the fetch. With `order_by`, the store's order is kept as-is. `limit`
//! always keeps the last N children in store order, so a limited listing
//! without `order_by` is "the N most recently keyed", then sorted.
//!
//! ## Images Live Inside Documents
//!
//! No blob storage: every image is a `data:` string in the `imagem` field.
//! The upload policy (5 MB ceiling, 800×600 JPEG at 80% by default) keeps
//! documents small enough for that to work.

pub mod collections;
pub mod config;
pub mod content;
pub mod dashboard;
pub mod imaging;
pub mod output;
pub mod store;
