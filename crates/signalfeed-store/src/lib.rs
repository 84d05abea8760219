//! # Signalfeed Store
//!
//! Document store contracts and backends for signalfeed.
//!
//! ## Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`document`] | Raw documents and insert payloads |
//! | [`query`] | Equality/range predicates, ordering, in-memory evaluation |
//! | [`store`] | The [`DocumentStore`] trait and snapshot channels |
//! | [`memory`] | In-process store with fault injection |
//! | [`rest`] | JSON-over-HTTP store with polling subscriptions |
//! | [`http_client`] | Transport abstraction used by the REST store |
//! | [`circuit`] | Fast failure for an unreachable store |
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use signalfeed_store::{DocumentStore, MemoryStore, OrderBy, Predicate, StoreQuery};
//!
//! let store = MemoryStore::new();
//! let query = StoreQuery::collection("calls")
//!     .filter(Predicate::eq("status", "active"))
//!     .order_by(OrderBy::desc("createdAt"));
//! let docs = store.query(&query).await?;
//! ```

pub mod circuit;
pub mod document;
pub mod error;
pub mod http_client;
pub mod memory;
pub mod query;
pub mod rest;
pub mod store;

pub use circuit::{CircuitConfig, CircuitState, StoreCircuit};
pub use document::{NewDocument, RawDocument};
pub use error::{StoreError, StoreErrorKind};
pub use http_client::{
    HttpAuth, HttpClient, HttpError, HttpErrorKind, HttpRequest, HttpResponse, ReqwestHttpClient,
};
pub use memory::MemoryStore;
pub use query::{compare_values, Direction, OrderBy, Predicate, StoreQuery};
pub use rest::{RestStore, RestStoreConfig};
pub use store::{DocumentStore, Snapshot, SnapshotSender, SnapshotStream, StoreFuture};
