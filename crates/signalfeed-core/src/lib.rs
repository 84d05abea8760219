//! Core contracts for signalfeed.
//!
//! This crate contains:
//! - Call domain models and validation
//! - Filter criteria, store query planning and in-memory post-filters
//! - One-shot fetch and live subscriptions over an injected document store
//! - Student registration with bounded round trips
//! - Trader roster and runtime configuration

pub mod config;
pub mod domain;
pub mod error;
pub mod feed;
pub mod filter;
pub mod normalize;
pub mod plan;
pub mod post_filter;
pub mod registration;
pub mod roster;
pub mod subscription;

pub use config::{FeedConfig, LoggingConfig};
pub use domain::{Call, CallMetrics, CallStatus, Network, Strategy, UtcDateTime};
pub use error::{CoreError, FeedError, RegistrationError, ValidationError};
pub use feed::{Clock, SignalFeed};
pub use filter::{ActiveWindow, CallFilter, ACTIVE_WINDOW};
pub use normalize::{normalize_all, normalize_call};
pub use plan::{QueryPlan, Reduction, CALLS_COLLECTION};
pub use registration::{
    Registrar, StudentRegistration, REGISTRATION_TIMEOUT, STUDENTS_COLLECTION,
};
pub use roster::{Trader, TraderRoster};
pub use subscription::{SignalSubscription, SubscriptionHandle};
