//! Document store: the [`Store`] trait, an in-memory implementation, and
//! the [`Gateway`] that every content operation goes through.
//!
//! | Piece | Role |
//! |---|---|
//! | [`Store`] | Hierarchical JSON tree: push keys, set/get/update/remove, queries, watches |
//! | [`MemoryStore`] | In-process [`Store`], snapshotted to a JSON file by the CLI |
//! | [`Query`] | `order_by` / `equal_to` / `limit` with realtime-database ordering |
//! | [`Gateway`] | create/read/list/update/delete/subscribe over a `Store` |
//! | [`Subscription`] | Idempotent cancellation handle for live reads |
//! | [`Response`] | Flat `{success, data, message}` envelope for display |
//!
//! The store handle is passed to [`Gateway::new`] explicitly; there is no
//! process-wide connection. Tests swap in a failing store or a manual clock
//! the same way.

mod backend;
pub mod clock;
mod gateway;
mod memory;
pub mod push_id;
mod query;
mod response;
mod subscription;

pub use backend::{Fields, Listener, Snapshot, Store, StoreError, WatchId, WatchTarget};
pub use clock::{Clock, ManualClock, SystemClock};
pub use gateway::{
    Created, Document, FIELD_CREATED_AT, FIELD_ID, FIELD_UPDATED_AT, Gateway, GatewayError,
    Listing, Operation,
};
pub use memory::MemoryStore;
pub use query::{Child, Query, compare_keys, compare_values};
pub use response::Response;
pub use subscription::Subscription;
