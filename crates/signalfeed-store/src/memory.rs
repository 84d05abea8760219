//! In-process document store.
//!
//! Used for offline runs and as the substitutable fake in tests. Writes are
//! pushed to every live subscriber of the touched collection.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use serde_json::{Map, Value};
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;
use tracing::debug;
use uuid::Uuid;

use crate::store::{SnapshotSender, SnapshotStream, StoreFuture};
use crate::{DocumentStore, NewDocument, RawDocument, StoreError, StoreQuery};

#[derive(Debug)]
struct Listener {
    query: StoreQuery,
    sender: SnapshotSender,
}

#[derive(Debug, Default)]
struct MemoryInner {
    collections: HashMap<String, Vec<RawDocument>>,
    listeners: Vec<Listener>,
    pending_failures: VecDeque<StoreError>,
}

impl MemoryInner {
    fn snapshot(&self, query: &StoreQuery) -> Vec<RawDocument> {
        match self.collections.get(&query.collection) {
            Some(docs) => query.apply(docs),
            None => Vec::new(),
        }
    }

    fn upsert(&mut self, collection: &str, document: RawDocument) {
        let docs = self.collections.entry(collection.to_owned()).or_default();
        match docs.iter_mut().find(|existing| existing.id == document.id) {
            Some(existing) => *existing = document,
            None => docs.push(document),
        }
        self.notify(collection);
    }

    fn notify(&mut self, collection: &str) {
        let snapshots: Vec<(usize, Vec<RawDocument>)> = self
            .listeners
            .iter()
            .enumerate()
            .filter(|(_, listener)| listener.query.collection == collection)
            .map(|(index, listener)| (index, self.snapshot(&listener.query)))
            .collect();

        let mut delivered = vec![true; self.listeners.len()];
        for (index, snapshot) in snapshots {
            delivered[index] = self.listeners[index].sender.send(Ok(snapshot));
        }

        let mut index = 0;
        self.listeners.retain(|_| {
            let keep = delivered[index];
            index += 1;
            keep
        });
    }
}

/// Thread-safe in-memory document store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: Mutex<MemoryInner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces a document by id and notifies subscribers.
    pub fn put(&self, collection: &str, document: RawDocument) {
        self.lock().upsert(collection, document);
    }

    /// Seeds a collection from a JSON array of objects. Each object may carry
    /// its own `id`; missing ids are generated.
    pub fn seed_json(&self, collection: &str, payload: &str) -> Result<usize, serde_json::Error> {
        let items: Vec<Map<String, Value>> = serde_json::from_str(payload)?;
        let count = items.len();
        let mut inner = self.lock();
        for mut fields in items {
            let id = match fields.remove("id") {
                Some(Value::String(id)) if !id.is_empty() => id,
                _ => Uuid::new_v4().to_string(),
            };
            inner.upsert(collection, RawDocument::new(id, fields));
        }
        Ok(count)
    }

    pub fn remove(&self, collection: &str, id: &str) -> Option<RawDocument> {
        let mut inner = self.lock();
        let docs = inner.collections.get_mut(collection)?;
        let position = docs.iter().position(|doc| doc.id == id)?;
        let removed = docs.remove(position);
        inner.notify(collection);
        Some(removed)
    }

    /// Number of documents currently held in `collection`.
    pub fn len(&self, collection: &str) -> usize {
        self.lock()
            .collections
            .get(collection)
            .map_or(0, Vec::len)
    }

    pub fn is_empty(&self, collection: &str) -> bool {
        self.len(collection) == 0
    }

    /// Makes the next one-shot operation fail with `error`.
    pub fn fail_next_query(&self, error: StoreError) {
        self.lock().pending_failures.push_back(error);
    }

    /// Terminates every live subscription with `error`.
    pub fn fail_subscribers(&self, error: StoreError) {
        let mut inner = self.lock();
        for listener in inner.listeners.drain(..) {
            let _ = listener.sender.send(Err(error.clone()));
        }
    }

    pub fn subscriber_count(&self) -> usize {
        let mut inner = self.lock();
        inner.listeners.retain(|listener| !listener.sender.is_closed());
        inner.listeners.len()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MemoryInner> {
        self.inner
            .lock()
            .expect("memory store lock is not poisoned")
    }

    fn take_failure(&self) -> Result<(), StoreError> {
        match self.lock().pending_failures.pop_front() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}

impl DocumentStore for MemoryStore {
    fn name(&self) -> &'static str {
        "memory"
    }

    fn query<'a>(&'a self, query: &'a StoreQuery) -> StoreFuture<'a, Vec<RawDocument>> {
        Box::pin(async move {
            self.take_failure()?;
            let docs = self.lock().snapshot(query);
            debug!(collection = %query.collection, matched = docs.len(), "memory query");
            Ok(docs)
        })
    }

    fn subscribe<'a>(&'a self, query: StoreQuery) -> StoreFuture<'a, SnapshotStream> {
        Box::pin(async move {
            self.take_failure()?;
            let (sender, stream) = SnapshotStream::channel();
            let mut inner = self.lock();
            sender.send(Ok(inner.snapshot(&query)));
            inner.listeners.push(Listener { query, sender });
            Ok(stream)
        })
    }

    fn insert<'a>(
        &'a self,
        collection: &'a str,
        document: NewDocument,
    ) -> StoreFuture<'a, String> {
        Box::pin(async move {
            self.take_failure()?;
            let NewDocument {
                mut fields,
                server_timestamps,
            } = document;

            if !server_timestamps.is_empty() {
                let now = OffsetDateTime::now_utc()
                    .format(&Rfc3339)
                    .map_err(|error| StoreError::internal(error.to_string()))?;
                for field in server_timestamps {
                    fields.insert(field, Value::String(now.clone()));
                }
            }

            let id = Uuid::new_v4().to_string();
            self.lock()
                .upsert(collection, RawDocument::new(id.clone(), fields));
            Ok(id)
        })
    }
}
