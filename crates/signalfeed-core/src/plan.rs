//! Query construction and predicate translation.
//!
//! The store reliably serves one reduction per query next to the fixed
//! `createdAt desc` ordering. A constraint is pushed down only when the store
//! match is exactly the normalized match: an explicit non-active status, then
//! the trader. `status == active` and the active window are never pushed,
//! since normalization defaults missing statuses to active and reads several
//! `createdAt` encodings the store cannot range over. `network` and
//! `strategy` are never pushed. Every constraint is re-checked in memory.

use signalfeed_store::{OrderBy, Predicate, StoreQuery};

use crate::{CallFilter, CallStatus, UtcDateTime};

/// Default collection holding call documents.
pub const CALLS_COLLECTION: &str = "calls";

/// Stored field names shared by store predicates and normalization.
pub mod fields {
    pub const TRADER_ID: &str = "userId";
    pub const STATUS: &str = "status";
    pub const CREATED_AT: &str = "createdAt";
}

/// The single store-level reduction chosen for a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reduction {
    None,
    Trader(String),
    Status(CallStatus),
}

impl Reduction {
    pub fn choose(filter: &CallFilter) -> Self {
        // With `activeOnly` any plain status is subsumed by the window.
        let status = filter
            .status
            .filter(|status| !filter.active_only && *status != CallStatus::Active);
        if let Some(status) = status {
            return Self::Status(status);
        }
        if let Some(trader_id) = &filter.trader_id {
            return Self::Trader(trader_id.clone());
        }
        Self::None
    }

    fn predicate(&self) -> Option<Predicate> {
        match self {
            Self::None => None,
            Self::Trader(trader_id) => Some(Predicate::eq(fields::TRADER_ID, trader_id.as_str())),
            Self::Status(status) => Some(Predicate::eq(fields::STATUS, status.as_str())),
        }
    }
}

/// Store query plus the instant the cycle is evaluated at.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryPlan {
    pub reduction: Reduction,
    pub query: StoreQuery,
    pub evaluated_at: UtcDateTime,
}

impl QueryPlan {
    pub fn build(collection: &str, filter: &CallFilter, evaluated_at: UtcDateTime) -> Self {
        let reduction = Reduction::choose(filter);
        let query = reduction.predicate().into_iter().fold(
            StoreQuery::collection(collection).order_by(OrderBy::desc(fields::CREATED_AT)),
            StoreQuery::filter,
        );

        Self {
            reduction,
            query,
            evaluated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use signalfeed_store::Direction;

    use super::*;
    use crate::{Network, Strategy};

    fn at() -> UtcDateTime {
        UtcDateTime::parse("2024-06-02T12:00:00Z").expect("timestamp")
    }

    #[test]
    fn unconstrained_filter_only_orders() {
        let plan = QueryPlan::build(CALLS_COLLECTION, &CallFilter::new(), at());

        assert_eq!(plan.reduction, Reduction::None);
        assert!(plan.query.predicates.is_empty());
        let order = plan.query.order_by.expect("ordered");
        assert_eq!(order.field, "createdAt");
        assert_eq!(order.direction, Direction::Desc);
    }

    #[test]
    fn active_only_pushes_trader_but_never_the_window() {
        let filter = CallFilter::new()
            .trader("trader-1")
            .status(CallStatus::Completed)
            .active_only();

        let plan = QueryPlan::build(CALLS_COLLECTION, &filter, at());

        assert_eq!(plan.reduction, Reduction::Trader(String::from("trader-1")));
        assert_eq!(plan.query.predicates, vec![Predicate::eq("userId", "trader-1")]);
    }

    #[test]
    fn status_replaces_trader_predicate() {
        let filter = CallFilter::new().trader("trader-1").status(CallStatus::Reviewed);

        let plan = QueryPlan::build(CALLS_COLLECTION, &filter, at());

        assert_eq!(plan.reduction, Reduction::Status(CallStatus::Reviewed));
        assert_eq!(plan.query.predicates, vec![Predicate::eq("status", "reviewed")]);
    }

    #[test]
    fn active_status_is_left_to_memory() {
        let plan = QueryPlan::build(
            CALLS_COLLECTION,
            &CallFilter::new().status(CallStatus::Active),
            at(),
        );
        assert!(plan.query.predicates.is_empty());

        let with_trader = QueryPlan::build(
            CALLS_COLLECTION,
            &CallFilter::new().status(CallStatus::Active).trader("t-1"),
            at(),
        );
        assert_eq!(with_trader.reduction, Reduction::Trader(String::from("t-1")));
    }

    #[test]
    fn network_and_strategy_are_never_pushed() {
        let filter = CallFilter::new()
            .network(Network::Solana)
            .strategy(Strategy::Flip);

        let plan = QueryPlan::build(CALLS_COLLECTION, &filter, at());

        assert!(plan.query.predicates.is_empty());
    }

    #[test]
    fn trader_alone_is_pushed_on_user_id() {
        let plan = QueryPlan::build(CALLS_COLLECTION, &CallFilter::new().trader("t-9"), at());
        assert_eq!(plan.query.predicates, vec![Predicate::eq("userId", "t-9")]);
    }
}
