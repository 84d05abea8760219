//! Behavior-driven tests for one-shot signal fetches
//!
//! These tests verify WHAT a caller sees from `fetch_signals`: ordering,
//! active-window boundaries, post-filter composition and normalization of
//! incomplete documents, independent of which predicate reached the store.

use std::sync::Arc;

use serde_json::json;
use signalfeed_core::{
    normalize_all, post_filter, CallFilter, CallStatus, FeedError, Network, SignalFeed, Strategy,
    CALLS_COLLECTION,
};
use signalfeed_store::{MemoryStore, RawDocument, StoreError};
use signalfeed_tests::{ago, now, UnfilteredStore};
use time::Duration;

fn put_call(store: &MemoryStore, id: &str, fields: serde_json::Value) {
    store.put(CALLS_COLLECTION, RawDocument::from_value(id, fields));
}

fn tickers(calls: &[signalfeed_core::Call]) -> Vec<&str> {
    calls.iter().map(|call| call.ticker.as_str()).collect()
}

/// PEPE, DOGE and SHIB as published by two traders.
fn scenario_documents() -> Vec<RawDocument> {
    vec![
        RawDocument::from_value(
            "pepe",
            json!({
                "userId": "trader-1", "ticker": "PEPE", "network": "solana",
                "strategy": "flip", "status": "active", "createdAt": ago(Duration::hours(1)),
            }),
        ),
        RawDocument::from_value(
            "doge",
            json!({
                "userId": "trader-2", "ticker": "DOGE", "network": "bsc",
                "strategy": "long", "status": "active", "createdAt": ago(Duration::hours(30)),
            }),
        ),
        RawDocument::from_value(
            "shib",
            json!({
                "userId": "trader-1", "ticker": "SHIB", "network": "solana",
                "strategy": "flip", "status": "completed", "createdAt": ago(Duration::hours(2)),
            }),
        ),
    ]
}

fn scenario_store() -> Arc<MemoryStore> {
    let store = Arc::new(MemoryStore::new());
    for doc in scenario_documents() {
        store.put(CALLS_COLLECTION, doc);
    }
    store
}

// =============================================================================
// End-to-end scenario
// =============================================================================

#[tokio::test]
async fn when_active_only_is_requested_only_recent_active_calls_are_returned() {
    // Given: PEPE (active, 1h), DOGE (active, 30h) and SHIB (completed, 2h)
    let feed = SignalFeed::new(scenario_store());

    // When: The caller asks for active calls
    let calls = feed
        .fetch_signals_at(&CallFilter::new().active_only(), now())
        .await
        .expect("fetch should succeed");

    // Then: Only PEPE is inside the window and active
    assert_eq!(tickers(&calls), vec!["PEPE"]);
}

#[tokio::test]
async fn when_network_is_requested_matching_calls_are_returned_newest_first() {
    // Given: The same three calls
    let feed = SignalFeed::new(scenario_store());

    // When: The caller filters on solana without the active window
    let calls = feed
        .fetch_signals_at(&CallFilter::new().network(Network::Solana), now())
        .await
        .expect("fetch should succeed");

    // Then: PEPE and SHIB come back, PEPE first
    assert_eq!(tickers(&calls), vec!["PEPE", "SHIB"]);
}

// =============================================================================
// Determinism and ordering
// =============================================================================

#[tokio::test]
async fn when_the_same_fetch_runs_twice_results_are_identical() {
    // Given: Fixed data, filter and evaluation instant
    let feed = SignalFeed::new(scenario_store());
    let filter = CallFilter::new().strategy(Strategy::Flip);

    // When: The fetch is repeated
    let first = feed.fetch_signals_at(&filter, now()).await.expect("first");
    let second = feed.fetch_signals_at(&filter, now()).await.expect("second");

    // Then: Both results match exactly
    assert_eq!(first, second);
}

#[tokio::test]
async fn when_documents_arrive_unordered_result_is_sorted_newest_first() {
    // Given: A store whose query ignores ordering and predicates
    let inner = MemoryStore::new();
    for (id, hours) in [("a", 5), ("b", 1), ("c", 9), ("d", 3)] {
        put_call(&inner, id, json!({ "createdAt": ago(Duration::hours(hours)) }));
    }
    let feed = SignalFeed::new(Arc::new(UnfilteredStore { inner }));

    // When: Everything is fetched
    let calls = feed
        .fetch_signals_at(&CallFilter::new(), now())
        .await
        .expect("fetch should succeed");

    // Then: createdAt is non-increasing
    assert!(calls
        .windows(2)
        .all(|pair| pair[0].created_at >= pair[1].created_at));
    assert_eq!(
        calls.iter().map(|call| call.id.as_str()).collect::<Vec<_>>(),
        vec!["b", "d", "a", "c"]
    );
}

#[tokio::test]
async fn when_store_ignores_predicates_output_is_unchanged() {
    // Given: Two feeds over the same data, one whose store drops predicates
    let filtered = SignalFeed::new(scenario_store());
    let unfiltered_inner = MemoryStore::new();
    for doc in scenario_documents() {
        unfiltered_inner.put(CALLS_COLLECTION, doc);
    }
    let unfiltered = SignalFeed::new(Arc::new(UnfilteredStore {
        inner: unfiltered_inner,
    }));

    // When: Every reduction kind is exercised on both
    let filters = [
        CallFilter::new(),
        CallFilter::new().active_only(),
        CallFilter::new().status(CallStatus::Completed),
        CallFilter::new().trader("trader-1"),
        CallFilter::new().trader("trader-1").active_only(),
        CallFilter::new().network(Network::Bsc).strategy(Strategy::Long),
    ];

    // Then: Results are identical regardless of what was pushed down
    for filter in &filters {
        let expected = filtered.fetch_signals_at(filter, now()).await.expect("filtered");
        let actual = unfiltered.fetch_signals_at(filter, now()).await.expect("unfiltered");
        assert_eq!(expected, actual, "filter {filter:?}");
    }
}

/// Documents written by older clients: missing or oddly spelled fields and
/// every accepted `createdAt` encoding.
fn irregular_documents() -> Vec<RawDocument> {
    let unix = |hours: i64| {
        now()
            .checked_sub(Duration::hours(hours))
            .expect("in range")
            .into_inner()
            .unix_timestamp()
    };
    vec![
        RawDocument::from_value(
            "no-status",
            json!({ "userId": "trader-1", "createdAt": ago(Duration::hours(1)) }),
        ),
        RawDocument::from_value(
            "trader-field",
            json!({ "traderId": "trader-2", "status": "active", "createdAt": ago(Duration::hours(2)) }),
        ),
        RawDocument::from_value(
            "millis",
            json!({ "userId": "trader-2", "status": "active", "createdAt": unix(3) * 1000 }),
        ),
        RawDocument::from_value(
            "seconds",
            json!({ "userId": "trader-2", "status": "completed", "createdAt": { "seconds": unix(4), "nanoseconds": 0 } }),
        ),
        RawDocument::from_value(
            "capitalized",
            json!({ "userId": "trader-1", "status": "Completed", "createdAt": ago(Duration::hours(5)) }),
        ),
        RawDocument::from_value(
            "offset",
            json!({ "userId": "trader-1", "status": "active", "createdAt": "2024-06-02T06:00:00+02:00" }),
        ),
        RawDocument::from_value("no-created-at", json!({ "userId": "trader-1", "status": "reviewed" })),
        RawDocument::from_value(
            "stale",
            json!({ "userId": "trader-2", "status": "active", "createdAt": ago(Duration::hours(30)) }),
        ),
    ]
}

#[tokio::test]
async fn when_documents_are_irregular_pushed_filters_match_local_filtering() {
    // Given: A store holding irregular documents
    let store = Arc::new(MemoryStore::new());
    for doc in irregular_documents() {
        store.put(CALLS_COLLECTION, doc);
    }
    let feed = SignalFeed::new(store);
    let everything = normalize_all(&irregular_documents(), now());

    // When: Each filter is fetched through the store
    let filters = [
        CallFilter::new(),
        CallFilter::new().active_only(),
        CallFilter::new().status(CallStatus::Active),
        CallFilter::new().status(CallStatus::Completed),
        CallFilter::new().status(CallStatus::Completed).trader("trader-2"),
        CallFilter::new().trader("trader-1"),
        CallFilter::new().trader("trader-2").active_only(),
    ];

    // Then: Each result equals the in-memory filters over every document
    for filter in &filters {
        let fetched = feed.fetch_signals_at(filter, now()).await.expect("fetch");
        let expected = post_filter::apply(everything.clone(), filter, now());
        assert_eq!(fetched, expected, "filter {filter:?}");
    }

    let active = feed
        .fetch_signals_at(&CallFilter::new().active_only(), now())
        .await
        .expect("fetch");
    assert_eq!(
        active.iter().map(|call| call.id.as_str()).collect::<Vec<_>>(),
        vec!["no-status", "trader-field", "millis", "capitalized", "offset"]
    );
}

// =============================================================================
// Active window boundaries
// =============================================================================

#[tokio::test]
async fn when_calls_straddle_the_window_edge_only_those_inside_are_kept() {
    // Given: Calls at -23h, -24h, -24h-1s, -25h and a cancelled one at -1h
    let store = Arc::new(MemoryStore::new());
    put_call(&store, "h23", json!({ "status": "active", "createdAt": ago(Duration::hours(23)) }));
    put_call(&store, "h24", json!({ "status": "active", "createdAt": ago(Duration::hours(24)) }));
    put_call(
        &store,
        "h24s1",
        json!({ "status": "active", "createdAt": ago(Duration::hours(24) + Duration::seconds(1)) }),
    );
    put_call(&store, "h25", json!({ "status": "active", "createdAt": ago(Duration::hours(25)) }));
    put_call(&store, "h1c", json!({ "status": "cancelled", "createdAt": ago(Duration::hours(1)) }));
    let feed = SignalFeed::new(store);

    // When: The active window is applied
    let calls = feed
        .fetch_signals_at(&CallFilter::new().active_only(), now())
        .await
        .expect("fetch should succeed");

    // Then: -23h and exactly -24h survive
    assert_eq!(
        calls.iter().map(|call| call.id.as_str()).collect::<Vec<_>>(),
        vec!["h23", "h24"]
    );
}

#[tokio::test]
async fn when_a_timestamp_carries_an_offset_it_is_compared_in_utc() {
    // Given: A call stored with a +02:00 offset, 3h old in UTC
    let store = Arc::new(MemoryStore::new());
    put_call(
        &store,
        "offset",
        json!({ "status": "active", "createdAt": "2024-06-02T11:00:00+02:00" }),
    );
    let feed = SignalFeed::new(store);

    // When: It is fetched
    let calls = feed
        .fetch_signals_at(&CallFilter::new(), now())
        .await
        .expect("fetch should succeed");

    // Then: The normalized instant is UTC
    assert_eq!(calls[0].created_at.format_rfc3339(), "2024-06-02T09:00:00Z");
}

// =============================================================================
// Post-filter composition
// =============================================================================

#[tokio::test]
async fn when_network_and_strategy_combine_result_is_the_intersection() {
    // Given: Calls covering every network/strategy combination of interest
    let store = Arc::new(MemoryStore::new());
    let combos = [
        ("sol-flip", "solana", "flip"),
        ("sol-long", "solana", "long"),
        ("bsc-flip", "bsc", "flip"),
        ("eth-medium", "ethereum", "medium"),
    ];
    for (index, (id, network, strategy)) in combos.iter().enumerate() {
        put_call(
            &store,
            id,
            json!({
                "network": network,
                "strategy": strategy,
                "createdAt": ago(Duration::minutes(index as i64 + 1)),
            }),
        );
    }
    let feed = SignalFeed::new(store);

    // When: Each filter is applied separately and combined
    let ids = |calls: Vec<signalfeed_core::Call>| {
        calls.into_iter().map(|call| call.id).collect::<Vec<_>>()
    };
    let by_network = ids(feed
        .fetch_signals_at(&CallFilter::new().network(Network::Solana), now())
        .await
        .expect("network"));
    let by_strategy = ids(feed
        .fetch_signals_at(&CallFilter::new().strategy(Strategy::Flip), now())
        .await
        .expect("strategy"));
    let combined = ids(feed
        .fetch_signals_at(
            &CallFilter::new().network(Network::Solana).strategy(Strategy::Flip),
            now(),
        )
        .await
        .expect("combined"));

    // Then: The combined result is exactly the intersection
    let intersection: Vec<String> = by_network
        .into_iter()
        .filter(|id| by_strategy.contains(id))
        .collect();
    assert_eq!(combined, intersection);
    assert_eq!(combined, vec![String::from("sol-flip")]);
}

// =============================================================================
// Normalization
// =============================================================================

#[tokio::test]
async fn when_a_document_is_empty_it_still_normalizes() {
    // Given: A document with no fields at all
    let store = Arc::new(MemoryStore::new());
    put_call(&store, "bare", json!({}));
    let feed = SignalFeed::new(store);

    // When: It is fetched
    let calls = feed
        .fetch_signals_at(&CallFilter::new(), now())
        .await
        .expect("fetch should succeed");

    // Then: Every field carries its default
    let call = &calls[0];
    assert_eq!(call.id, "bare");
    assert_eq!(call.trader_id, "");
    assert_eq!(call.network, None);
    assert_eq!(call.strategy, Strategy::Flip);
    assert_eq!(call.status, CallStatus::Active);
    assert_eq!(call.created_at, now());

    let value = serde_json::to_value(call).expect("serialize");
    assert_eq!(value["network"], "");
    assert_eq!(value["pair"], "");
}

#[test]
fn when_the_same_documents_are_normalized_twice_results_match() {
    // Given: A batch with defaults to fill in
    let docs = vec![
        RawDocument::from_value("a", json!({ "ticker": "WIF" })),
        RawDocument::from_value("b", json!({ "status": "reviewed" })),
    ];

    // When: Normalization and post-filtering run twice at the same instant
    let first = post_filter::apply(normalize_all(&docs, now()), &CallFilter::new(), now());
    let second = post_filter::apply(normalize_all(&docs, now()), &CallFilter::new(), now());

    // Then: Output is deterministic
    assert_eq!(first, second);
}

// =============================================================================
// Failure handling
// =============================================================================

#[tokio::test]
async fn when_the_store_fails_fetch_returns_retrieval_error_with_cause() {
    // Given: A store that rejects the next query
    let store = scenario_store();
    store.fail_next_query(StoreError::internal("index missing"));
    let feed = SignalFeed::new(store.clone());

    // When: The caller fetches
    let error = feed
        .fetch_signals_at(&CallFilter::new(), now())
        .await
        .expect_err("fetch should fail");

    // Then: The cause is carried and nothing partial is returned
    assert!(matches!(error, FeedError::Retrieval(_)));
    assert_eq!(error.cause().message(), "index missing");

    // And: The store is not retried behind the caller's back
    let retry = feed
        .fetch_signals_at(&CallFilter::new(), now())
        .await
        .expect("next fetch succeeds");
    assert_eq!(retry.len(), 3);
}

#[tokio::test]
async fn when_the_store_is_unavailable_error_is_classified() {
    // Given: An unavailable store
    let store = scenario_store();
    store.fail_next_query(StoreError::unavailable("connection refused"));
    let feed = SignalFeed::new(store);

    // When: The caller fetches
    let error = feed
        .fetch_signals_at(&CallFilter::new(), now())
        .await
        .expect_err("fetch should fail");

    // Then: It is reported as unavailability
    assert_eq!(error.code(), "feed.unavailable");
    assert!(error.cause().retryable());
}
