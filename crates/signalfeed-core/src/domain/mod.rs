//! # Domain Models
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Call`] | Normalized trading call |
//! | [`CallMetrics`] | Pass-through display metrics |
//! | [`Network`] | Chain/venue enumeration |
//! | [`Strategy`] | Holding horizon (flip, medium, long) |
//! | [`CallStatus`] | Lifecycle state |
//! | [`UtcDateTime`] | UTC timestamp |

mod call;
mod timestamp;

pub use call::{Call, CallMetrics, CallStatus, Network, Strategy};
pub use timestamp::UtcDateTime;
