//! One-shot fetch and live subscription entry points.

use std::fmt::{Debug, Formatter};
use std::sync::Arc;

use signalfeed_store::DocumentStore;
use tracing::debug;

use crate::normalize::normalize_all;
use crate::plan::{QueryPlan, CALLS_COLLECTION};
use crate::subscription::{SignalSubscription, SubscriptionHandle};
use crate::{post_filter, Call, CallFilter, FeedError, UtcDateTime};

/// Source of evaluation instants.
pub type Clock = Arc<dyn Fn() -> UtcDateTime + Send + Sync>;

/// Signal feed query engine.
///
/// Holds no mutable state; clones share the store handle and may run
/// concurrently.
#[derive(Clone)]
pub struct SignalFeed {
    store: Arc<dyn DocumentStore>,
    collection: String,
    clock: Clock,
}

impl SignalFeed {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            store,
            collection: CALLS_COLLECTION.to_owned(),
            clock: Arc::new(UtcDateTime::now),
        }
    }

    pub fn with_collection(mut self, collection: impl Into<String>) -> Self {
        self.collection = collection.into();
        self
    }

    pub fn with_clock<F>(mut self, clock: F) -> Self
    where
        F: Fn() -> UtcDateTime + Send + Sync + 'static,
    {
        self.clock = Arc::new(clock);
        self
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    pub fn store(&self) -> &Arc<dyn DocumentStore> {
        &self.store
    }

    pub fn plan(&self, filter: &CallFilter, evaluated_at: UtcDateTime) -> QueryPlan {
        QueryPlan::build(&self.collection, filter, evaluated_at)
    }

    /// Fetches calls matching `filter`, newest first, evaluated now.
    pub async fn fetch_signals(&self, filter: &CallFilter) -> Result<Vec<Call>, FeedError> {
        self.fetch_signals_at(filter, (self.clock)()).await
    }

    /// Fetches calls matching `filter` as of `evaluated_at`.
    ///
    /// One store round trip; a store failure is returned as is, never retried.
    pub async fn fetch_signals_at(
        &self,
        filter: &CallFilter,
        evaluated_at: UtcDateTime,
    ) -> Result<Vec<Call>, FeedError> {
        let plan = self.plan(filter, evaluated_at);
        debug!(
            store = self.store.name(),
            reduction = ?plan.reduction,
            %evaluated_at,
            "fetching signals"
        );

        let documents = self.store.query(&plan.query).await?;
        let calls = normalize_all(&documents, evaluated_at);
        let calls = post_filter::apply(calls, filter, evaluated_at);

        debug!(fetched = documents.len(), retained = calls.len(), "signals fetched");
        Ok(calls)
    }

    /// Opens a pull subscription yielding the recomputed result per snapshot.
    pub async fn watch(&self, filter: CallFilter) -> Result<SignalSubscription, FeedError> {
        let plan = self.plan(&filter, (self.clock)());
        debug!(
            store = self.store.name(),
            reduction = ?plan.reduction,
            "opening subscription"
        );

        let stream = self.store.subscribe(plan.query).await?;
        Ok(SignalSubscription::new(
            stream,
            filter,
            Arc::clone(&self.clock),
        ))
    }

    /// Callback subscription.
    ///
    /// `on_update` receives every recomputed result. On a channel failure
    /// `on_error` runs once, then `on_update` receives an empty list, and the
    /// subscription ends. Must be called from within a tokio runtime.
    pub fn subscribe_signals<U, E>(
        &self,
        filter: CallFilter,
        on_update: U,
        on_error: E,
    ) -> SubscriptionHandle
    where
        U: FnMut(Vec<Call>) + Send + 'static,
        E: FnMut(FeedError) + Send + 'static,
    {
        SubscriptionHandle::spawn(self.clone(), filter, on_update, on_error)
    }
}

impl Debug for SignalFeed {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignalFeed")
            .field("store", &self.store.name())
            .field("collection", &self.collection)
            .finish()
    }
}
