//! Document store contract.
//!
//! Stores are shared behind `Arc<dyn DocumentStore>` and must accept
//! concurrent independent requests.

use std::future::Future;
use std::pin::Pin;

use serde_json::Value;
use tokio::sync::mpsc;

use crate::{NewDocument, Predicate, RawDocument, StoreError, StoreQuery};

/// Boxed future returned by store operations.
pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, StoreError>> + Send + 'a>>;

/// One pushed snapshot: the complete result of the subscribed query, or the
/// error that terminated the channel.
pub type Snapshot = Result<Vec<RawDocument>, StoreError>;

/// Sending half of a snapshot channel, held by the store.
#[derive(Debug, Clone)]
pub struct SnapshotSender {
    tx: mpsc::UnboundedSender<Snapshot>,
}

impl SnapshotSender {
    /// Returns `false` once the subscriber has gone away.
    pub fn send(&self, snapshot: Snapshot) -> bool {
        self.tx.send(snapshot).is_ok()
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }

    /// Resolves when the subscriber drops its [`SnapshotStream`].
    pub async fn closed(&self) {
        self.tx.closed().await;
    }
}

/// Receiving half of a store subscription.
///
/// Dropping the stream detaches the listener from the store.
#[derive(Debug)]
pub struct SnapshotStream {
    rx: mpsc::UnboundedReceiver<Snapshot>,
}

impl SnapshotStream {
    pub fn channel() -> (SnapshotSender, SnapshotStream) {
        let (tx, rx) = mpsc::unbounded_channel();
        (SnapshotSender { tx }, SnapshotStream { rx })
    }

    /// Waits for the next snapshot; `None` once the store closed the channel.
    pub async fn next(&mut self) -> Option<Snapshot> {
        self.rx.recv().await
    }

    pub fn close(&mut self) {
        self.rx.close();
    }
}

/// Store adapter contract.
///
/// # Required Methods
///
/// | Method | Description |
/// |--------|-------------|
/// | [`query`](DocumentStore::query) | One-shot query |
/// | [`subscribe`](DocumentStore::subscribe) | Push channel of full snapshots |
/// | [`insert`](DocumentStore::insert) | Insert with store-assigned id |
pub trait DocumentStore: Send + Sync {
    /// Short backend name used in logs.
    fn name(&self) -> &'static str;

    /// Runs `query` once and returns the matching documents in query order.
    fn query<'a>(&'a self, query: &'a StoreQuery) -> StoreFuture<'a, Vec<RawDocument>>;

    /// Opens a push channel that delivers the full result of `query` now and
    /// after every change. An error is delivered at most once and closes the
    /// channel.
    fn subscribe<'a>(&'a self, query: StoreQuery) -> StoreFuture<'a, SnapshotStream>;

    /// Inserts a document and returns the id assigned by the store.
    fn insert<'a>(&'a self, collection: &'a str, document: NewDocument)
        -> StoreFuture<'a, String>;

    /// Returns the first document whose `field` equals `value`.
    fn find_by_field<'a>(
        &'a self,
        collection: &'a str,
        field: &'a str,
        value: Value,
    ) -> StoreFuture<'a, Option<RawDocument>> {
        Box::pin(async move {
            let query = StoreQuery::collection(collection)
                .filter(Predicate::eq(field, value))
                .limit(1);
            Ok(self.query(&query).await?.into_iter().next())
        })
    }
}
