//! JSON-over-HTTP document store client.
//!
//! Wire contract:
//!
//! | Operation | Request | Response |
//! |-----------|---------|----------|
//! | query | `POST {base}/v1/{collection}:query` with a [`StoreQuery`] body | `{"documents": [{"id", "fields"}]}` |
//! | insert | `POST {base}/v1/{collection}` with a [`NewDocument`] body | `{"id": "..."}` |
//!
//! The service has no push channel, so subscriptions poll the query and emit
//! a snapshot whenever the result differs from the previous one.

use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::circuit::{CircuitConfig, StoreCircuit};
use crate::http_client::{HttpAuth, HttpClient, HttpErrorKind, HttpRequest, HttpResponse};
use crate::store::{SnapshotStream, StoreFuture};
use crate::{DocumentStore, NewDocument, RawDocument, StoreError, StoreQuery};

/// Connection settings for [`RestStore`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RestStoreConfig {
    pub base_url: String,
    pub auth: HttpAuth,
    pub request_timeout_ms: u64,
    pub poll_interval: Duration,
    pub circuit: CircuitConfig,
}

impl RestStoreConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_owned(),
            auth: HttpAuth::None,
            request_timeout_ms: 3_000,
            poll_interval: Duration::from_secs(5),
            circuit: CircuitConfig::default(),
        }
    }

    pub fn with_auth(mut self, auth: HttpAuth) -> Self {
        self.auth = auth;
        self
    }

    pub fn with_request_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.request_timeout_ms = timeout_ms;
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn with_circuit(mut self, circuit: CircuitConfig) -> Self {
        self.circuit = circuit;
        self
    }
}

#[derive(Debug, Deserialize)]
struct QueryResponse {
    #[serde(default)]
    documents: Vec<RawDocument>,
}

#[derive(Debug, Deserialize)]
struct InsertResponse {
    id: String,
}

struct RestInner {
    config: RestStoreConfig,
    client: Arc<dyn HttpClient>,
    circuit: StoreCircuit,
}

impl RestInner {
    fn collection_url(&self, collection: &str) -> String {
        format!("{}/v1/{collection}", self.config.base_url)
    }

    async fn post(&self, url: String, body: String) -> Result<HttpResponse, StoreError> {
        self.circuit.admit()?;
        let outcome = self.send(url, body).await;
        self.circuit.observe(&outcome);
        outcome
    }

    async fn send(&self, url: String, body: String) -> Result<HttpResponse, StoreError> {
        let request = HttpRequest::post_json(url, body)
            .with_auth(&self.config.auth)
            .with_timeout_ms(self.config.request_timeout_ms);

        let response = self
            .client
            .execute(request)
            .await
            .map_err(|error| match error.kind() {
                HttpErrorKind::Timeout => StoreError::timeout(error.message()),
                HttpErrorKind::Connect => StoreError::unavailable(error.message()),
                HttpErrorKind::Other => StoreError::internal(error.message()),
            })?;

        if response.is_success() {
            Ok(response)
        } else {
            Err(status_error(response.status, &response.body))
        }
    }

    async fn run_query(&self, query: &StoreQuery) -> Result<Vec<RawDocument>, StoreError> {
        let body = serde_json::to_string(query)
            .map_err(|error| StoreError::invalid_query(error.to_string()))?;
        let url = format!("{}:query", self.collection_url(&query.collection));
        let response = self.post(url, body).await?;

        let parsed: QueryResponse = serde_json::from_str(&response.body).map_err(|error| {
            StoreError::internal(format!("malformed query response: {error}"))
        })?;
        debug!(
            collection = %query.collection,
            matched = parsed.documents.len(),
            "rest query"
        );
        Ok(parsed.documents)
    }
}

fn status_error(status: u16, body: &str) -> StoreError {
    let detail = if body.trim().is_empty() {
        format!("store responded with HTTP {status}")
    } else {
        format!("store responded with HTTP {status}: {}", body.trim())
    };
    match status {
        401 | 403 => StoreError::permission_denied(detail),
        404 => StoreError::not_found(detail),
        408 | 504 => StoreError::timeout(detail),
        400 | 422 => StoreError::invalid_query(detail),
        429 | 500..=599 => StoreError::unavailable(detail),
        _ => StoreError::internal(detail),
    }
}

/// Document store reached over HTTP.
#[derive(Clone)]
pub struct RestStore {
    inner: Arc<RestInner>,
}

impl RestStore {
    pub fn new(config: RestStoreConfig, client: Arc<dyn HttpClient>) -> Self {
        let circuit = StoreCircuit::new(config.circuit);
        Self {
            inner: Arc::new(RestInner {
                config,
                client,
                circuit,
            }),
        }
    }

    pub fn config(&self) -> &RestStoreConfig {
        &self.inner.config
    }
}

impl std::fmt::Debug for RestStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RestStore")
            .field("base_url", &self.inner.config.base_url)
            .field("circuit", &self.inner.circuit.state())
            .finish()
    }
}

impl DocumentStore for RestStore {
    fn name(&self) -> &'static str {
        "rest"
    }

    fn query<'a>(&'a self, query: &'a StoreQuery) -> StoreFuture<'a, Vec<RawDocument>> {
        Box::pin(async move { self.inner.run_query(query).await })
    }

    fn subscribe<'a>(&'a self, query: StoreQuery) -> StoreFuture<'a, SnapshotStream> {
        Box::pin(async move {
            let (sender, stream) = SnapshotStream::channel();
            let inner = Arc::clone(&self.inner);
            let poll_interval = inner.config.poll_interval;

            tokio::spawn(async move {
                info!(collection = %query.collection, ?poll_interval, "rest subscription started");
                let mut ticker = tokio::time::interval(poll_interval);
                ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
                let mut last: Option<Vec<RawDocument>> = None;

                loop {
                    tokio::select! {
                        _ = sender.closed() => break,
                        _ = ticker.tick() => {}
                    }

                    match inner.run_query(&query).await {
                        Ok(documents) => {
                            if last.as_ref() == Some(&documents) {
                                continue;
                            }
                            if !sender.send(Ok(documents.clone())) {
                                break;
                            }
                            last = Some(documents);
                        }
                        Err(error) => {
                            warn!(collection = %query.collection, %error, "rest subscription failed");
                            let _ = sender.send(Err(error));
                            break;
                        }
                    }
                }
                info!(collection = %query.collection, "rest subscription stopped");
            });

            Ok(stream)
        })
    }

    fn insert<'a>(
        &'a self,
        collection: &'a str,
        document: NewDocument,
    ) -> StoreFuture<'a, String> {
        Box::pin(async move {
            let body = serde_json::to_string(&document)
                .map_err(|error| StoreError::invalid_query(error.to_string()))?;
            let response = self
                .inner
                .post(self.inner.collection_url(collection), body)
                .await?;
            let parsed: InsertResponse = serde_json::from_str(&response.body).map_err(|error| {
                StoreError::internal(format!("malformed insert response: {error}"))
            })?;
            Ok(parsed.id)
        })
    }
}
