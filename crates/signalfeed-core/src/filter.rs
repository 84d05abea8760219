//! Filter criteria for signal queries.

use serde::{Deserialize, Serialize};
use time::Duration;

use crate::{Call, CallStatus, Network, Strategy, UtcDateTime};

/// Length of the trailing active window.
pub const ACTIVE_WINDOW: Duration = Duration::hours(24);

/// Constraints on a signal query. Absent fields impose nothing; present
/// fields compose with logical AND.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CallFilter {
    pub trader_id: Option<String>,
    pub network: Option<Network>,
    pub strategy: Option<Strategy>,
    pub status: Option<CallStatus>,
    /// Active calls created within the trailing [`ACTIVE_WINDOW`].
    pub active_only: bool,
}

impl CallFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn trader(mut self, trader_id: impl Into<String>) -> Self {
        self.trader_id = Some(trader_id.into());
        self
    }

    pub fn network(mut self, network: Network) -> Self {
        self.network = Some(network);
        self
    }

    pub fn strategy(mut self, strategy: Strategy) -> Self {
        self.strategy = Some(strategy);
        self
    }

    pub fn status(mut self, status: CallStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn active_only(mut self) -> Self {
        self.active_only = true;
        self
    }

    pub fn is_unconstrained(&self) -> bool {
        self == &Self::default()
    }
}

/// The trailing window ending at one evaluation instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActiveWindow {
    pub start: UtcDateTime,
    pub evaluated_at: UtcDateTime,
}

impl ActiveWindow {
    pub fn ending_at(evaluated_at: UtcDateTime) -> Self {
        let start = evaluated_at
            .checked_sub(ACTIVE_WINDOW)
            .unwrap_or(evaluated_at);
        Self {
            start,
            evaluated_at,
        }
    }

    pub fn contains(&self, call: &Call) -> bool {
        call.is_active() && call.created_at >= self.start
    }
}
