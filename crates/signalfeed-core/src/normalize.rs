//! Raw document to [`Call`] normalization.
//!
//! Normalization is total: every missing or malformed field falls back to a
//! default so a single bad document can never abort a batch. Fields that the
//! store can filter on (`userId`, `status`) are read exactly as the store
//! compares them, so a pushed-down predicate keeps the same calls the
//! in-memory filter would.

use serde_json::Value;
use signalfeed_store::RawDocument;
use tracing::debug;

use crate::plan::fields;
use crate::{Call, CallMetrics, CallStatus, Network, Strategy, UtcDateTime};

/// Converts a stored document into a typed call.
///
/// `evaluated_at` stands in for a missing or unreadable `createdAt`; callers
/// pass the instant captured for the current fetch/update cycle.
pub fn normalize_call(doc: &RawDocument, evaluated_at: UtcDateTime) -> Call {
    let trader_id = doc
        .get_str(fields::TRADER_ID)
        .map(str::to_owned)
        .unwrap_or_default();

    let network = text(doc, "network").and_then(|raw| match raw.parse::<Network>() {
        Ok(network) => Some(network),
        Err(_) => {
            if !raw.is_empty() {
                debug!(id = %doc.id, network = %raw, "unknown network, leaving unset");
            }
            None
        }
    });

    let strategy = text(doc, "strategy")
        .and_then(|raw| raw.parse::<Strategy>().ok())
        .unwrap_or_default();

    // Exact spelling only: any other stored value reads as the default.
    let status = doc
        .get_str(fields::STATUS)
        .and_then(|raw| {
            CallStatus::ALL
                .into_iter()
                .find(|status| status.as_str() == raw)
        })
        .unwrap_or_default();

    let created_at = doc
        .get(fields::CREATED_AT)
        .and_then(timestamp)
        .unwrap_or_else(|| {
            debug!(id = %doc.id, "createdAt missing or unreadable, using evaluation time");
            evaluated_at
        });

    Call {
        id: doc.id.clone(),
        trader_id,
        network,
        ticker: text(doc, "ticker").unwrap_or_default(),
        pair: text(doc, "pair").unwrap_or_default(),
        entry_point: text(doc, "entryPoint").unwrap_or_default(),
        target: text(doc, "target").unwrap_or_default(),
        risks: text(doc, "risks").unwrap_or_default(),
        cancel_conditions: text(doc, "cancelConditions"),
        comment: text(doc, "comment"),
        strategy,
        status,
        created_at,
        metrics: CallMetrics {
            max_profit: number(doc, "maxProfit"),
            current_pnl: number(doc, "currentPnL"),
            current_market_cap: number(doc, "currentMarketCap"),
            signal_market_cap: number(doc, "signalMarketCap"),
            current_price: number(doc, "currentPrice"),
            entry_price: number(doc, "entryPrice"),
        },
    }
}

/// Normalizes a whole batch with one shared evaluation instant.
pub fn normalize_all(docs: &[RawDocument], evaluated_at: UtcDateTime) -> Vec<Call> {
    docs.iter()
        .map(|doc| normalize_call(doc, evaluated_at))
        .collect()
}

// Scalars are rendered as text; null, arrays and objects count as missing.
fn text(doc: &RawDocument, field: &str) -> Option<String> {
    match doc.get(field)? {
        Value::String(value) => Some(value.clone()),
        Value::Number(value) => Some(value.to_string()),
        Value::Bool(value) => Some(value.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

fn number(doc: &RawDocument, field: &str) -> Option<f64> {
    let value = match doc.get(field)? {
        Value::Number(value) => value.as_f64()?,
        Value::String(value) => value.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    value.is_finite().then_some(value)
}

/// Reads RFC3339 strings, `{seconds, nanoseconds}` objects (with or without
/// a leading underscore) and epoch milliseconds.
fn timestamp(value: &Value) -> Option<UtcDateTime> {
    match value {
        Value::String(raw) => UtcDateTime::parse_any_offset(raw).ok(),
        Value::Number(millis) => UtcDateTime::from_unix_millis(millis.as_i64()?),
        Value::Object(map) => {
            let seconds = map
                .get("seconds")
                .or_else(|| map.get("_seconds"))
                .and_then(Value::as_i64)?;
            let nanos = map
                .get("nanoseconds")
                .or_else(|| map.get("_nanoseconds"))
                .and_then(Value::as_u64)
                .and_then(|nanos| u32::try_from(nanos).ok())
                .unwrap_or(0);
            UtcDateTime::from_unix_parts(seconds, nanos)
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn at() -> UtcDateTime {
        UtcDateTime::parse("2024-06-02T12:00:00Z").expect("timestamp")
    }

    #[test]
    fn empty_document_normalizes_to_defaults() {
        let call = normalize_call(&RawDocument::from_value("c1", json!({})), at());

        assert_eq!(call.id, "c1");
        assert_eq!(call.trader_id, "");
        assert_eq!(call.network, None);
        assert_eq!(call.ticker, "");
        assert_eq!(call.pair, "");
        assert_eq!(call.entry_point, "");
        assert_eq!(call.target, "");
        assert_eq!(call.risks, "");
        assert_eq!(call.strategy, Strategy::Flip);
        assert_eq!(call.status, CallStatus::Active);
        assert_eq!(call.created_at, at());
        assert_eq!(call.cancel_conditions, None);
        assert_eq!(call.comment, None);
        assert_eq!(call.metrics, CallMetrics::default());
    }

    #[test]
    fn full_document_is_typed() {
        let doc = RawDocument::from_value(
            "c2",
            json!({
                "userId": "trader-1",
                "network": "solana",
                "ticker": "PEPE",
                "pair": "PEPE/SOL",
                "entryPoint": "0.0000012",
                "target": "x3",
                "risks": "high",
                "cancelConditions": "below 0.000001",
                "comment": "momentum",
                "strategy": "long",
                "status": "completed",
                "createdAt": "2024-06-01T08:30:00Z",
                "maxProfit": 210.5,
                "currentPnL": "-12.5",
                "entryPrice": 0.0000012
            }),
        );

        let call = normalize_call(&doc, at());

        assert_eq!(call.trader_id, "trader-1");
        assert_eq!(call.network, Some(Network::Solana));
        assert_eq!(call.strategy, Strategy::Long);
        assert_eq!(call.status, CallStatus::Completed);
        assert_eq!(call.created_at.format_rfc3339(), "2024-06-01T08:30:00Z");
        assert_eq!(call.cancel_conditions.as_deref(), Some("below 0.000001"));
        assert_eq!(call.metrics.max_profit, Some(210.5));
        assert_eq!(call.metrics.current_pnl, Some(-12.5));
        assert_eq!(call.metrics.current_price, None);
    }

    #[test]
    fn trader_and_status_are_read_as_stored() {
        let doc = RawDocument::from_value(
            "c3",
            json!({ "traderId": "trader-2", "status": "Completed" }),
        );
        let call = normalize_call(&doc, at());
        assert_eq!(call.trader_id, "");
        assert_eq!(call.status, CallStatus::Active);

        let numeric = RawDocument::from_value("c3b", json!({ "userId": 7, "status": "reviewed" }));
        let call = normalize_call(&numeric, at());
        assert_eq!(call.trader_id, "");
        assert_eq!(call.status, CallStatus::Reviewed);
    }

    #[test]
    fn out_of_range_timestamps_use_evaluation_time() {
        for created_at in [
            json!(-70_000_000_000_000_i64),
            json!(300_000_000_000_000_i64),
            json!({ "seconds": -70_000_000_000_i64, "nanoseconds": 0 }),
            json!("0000-01-01T00:30:00+01:00"),
        ] {
            let doc = RawDocument::from_value("c7", json!({ "createdAt": created_at }));
            let call = normalize_call(&doc, at());

            assert_eq!(call.created_at, at());
            assert!(serde_json::to_string(&call).is_ok());
        }
    }

    #[test]
    fn malformed_values_fall_back_instead_of_failing() {
        let doc = RawDocument::from_value(
            "c4",
            json!({
                "network": "avalanche",
                "strategy": 7,
                "status": ["active"],
                "createdAt": "yesterday",
                "maxProfit": "lots",
                "ticker": 42
            }),
        );

        let call = normalize_call(&doc, at());

        assert_eq!(call.network, None);
        assert_eq!(call.strategy, Strategy::Flip);
        assert_eq!(call.status, CallStatus::Active);
        assert_eq!(call.created_at, at());
        assert_eq!(call.metrics.max_profit, None);
        assert_eq!(call.ticker, "42");
    }

    #[test]
    fn reads_store_timestamp_objects() {
        let doc = RawDocument::from_value(
            "c5",
            json!({ "createdAt": { "seconds": 1_717_200_000, "nanoseconds": 0 } }),
        );
        assert_eq!(
            normalize_call(&doc, at()).created_at.format_rfc3339(),
            "2024-06-01T00:00:00Z"
        );

        let exported = RawDocument::from_value(
            "c6",
            json!({ "createdAt": { "_seconds": 1_717_200_000, "_nanoseconds": 5 } }),
        );
        assert!(normalize_call(&exported, at()).created_at > normalize_call(&doc, at()).created_at);
    }
}
