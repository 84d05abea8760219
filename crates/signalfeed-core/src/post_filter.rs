//! In-memory predicates applied after retrieval.
//!
//! Order of application: trader and status, active window, network, strategy.
//! The result is then stable-sorted newest first, so output does not depend
//! on which reduction the store served.

use crate::filter::ActiveWindow;
use crate::{Call, CallFilter, UtcDateTime};

/// Applies every constraint of `filter` to `calls` at one evaluation instant.
pub fn apply(calls: Vec<Call>, filter: &CallFilter, evaluated_at: UtcDateTime) -> Vec<Call> {
    let window = filter
        .active_only
        .then(|| ActiveWindow::ending_at(evaluated_at));

    let mut retained: Vec<Call> = calls
        .into_iter()
        .filter(|call| {
            filter
                .trader_id
                .as_deref()
                .is_none_or(|trader_id| call.trader_id == trader_id)
        })
        .filter(|call| filter.status.is_none_or(|status| call.status == status))
        .filter(|call| window.is_none_or(|window| window.contains(call)))
        .filter(|call| {
            filter
                .network
                .is_none_or(|network| call.network == Some(network))
        })
        .filter(|call| {
            filter
                .strategy
                .is_none_or(|strategy| call.strategy == strategy)
        })
        .collect();

    sort_newest_first(&mut retained);
    retained
}

/// Stable sort by `createdAt` descending; ties keep their incoming order.
pub fn sort_newest_first(calls: &mut [Call]) {
    calls.sort_by(|left, right| right.created_at.cmp(&left.created_at));
}
