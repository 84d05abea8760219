use signalfeed_store::{StoreError, StoreErrorKind};
use thiserror::Error;

/// Validation and contract errors exposed by `signalfeed-core`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("invalid network '{value}', expected one of solana, bsc, ethereum, base, ton, tron, sui, cex")]
    InvalidNetwork { value: String },
    #[error("invalid strategy '{value}', expected one of flip, medium, long")]
    InvalidStrategy { value: String },
    #[error("invalid status '{value}', expected one of active, completed, cancelled, reviewed")]
    InvalidStatus { value: String },

    #[error("timestamp must be RFC3339 UTC (suffix Z): '{value}'")]
    TimestampNotUtc { value: String },
    #[error("timestamp is not valid RFC3339: '{value}'")]
    InvalidTimestamp { value: String },

    #[error("trader id cannot be empty")]
    EmptyTraderId,
    #[error("trader id '{id}' appears more than once in the roster")]
    DuplicateTraderId { id: String },

    #[error("login cannot be empty")]
    EmptyLogin,
    #[error("email address is not valid: '{value}'")]
    InvalidEmail { value: String },

    #[error("invalid value for {key}: '{value}'")]
    InvalidConfig { key: &'static str, value: String },
}

/// Failure of a signal fetch or subscription.
///
/// Timeout, permission and availability failures are split out of the generic
/// retrieval case so callers can word their messages differently.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FeedError {
    #[error("signal retrieval failed: {0}")]
    Retrieval(#[source] StoreError),
    #[error("signal store timed out: {0}")]
    Timeout(#[source] StoreError),
    #[error("signal store denied access: {0}")]
    Permission(#[source] StoreError),
    #[error("signal store is unavailable: {0}")]
    Unavailable(#[source] StoreError),
}

impl FeedError {
    pub fn cause(&self) -> &StoreError {
        match self {
            Self::Retrieval(cause)
            | Self::Timeout(cause)
            | Self::Permission(cause)
            | Self::Unavailable(cause) => cause,
        }
    }

    pub const fn code(&self) -> &'static str {
        match self {
            Self::Retrieval(_) => "feed.retrieval",
            Self::Timeout(_) => "feed.timeout",
            Self::Permission(_) => "feed.permission",
            Self::Unavailable(_) => "feed.unavailable",
        }
    }
}

impl From<StoreError> for FeedError {
    fn from(error: StoreError) -> Self {
        match error.kind() {
            StoreErrorKind::Timeout => Self::Timeout(error),
            StoreErrorKind::PermissionDenied => Self::Permission(error),
            StoreErrorKind::Unavailable => Self::Unavailable(error),
            StoreErrorKind::NotFound | StoreErrorKind::InvalidQuery | StoreErrorKind::Internal => {
                Self::Retrieval(error)
            }
        }
    }
}

/// Failure of a student registration.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RegistrationError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("login '{login}' is already registered")]
    LoginTaken { login: String },
    #[error("email '{email}' is already registered")]
    EmailTaken { email: String },
    #[error("{operation} did not complete within {timeout_ms} ms")]
    Timeout {
        operation: &'static str,
        timeout_ms: u64,
    },
    #[error("student store error: {0}")]
    Store(#[source] StoreError),
}

impl RegistrationError {
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "registration.invalid",
            Self::LoginTaken { .. } => "registration.login_taken",
            Self::EmailTaken { .. } => "registration.email_taken",
            Self::Timeout { .. } => "registration.timeout",
            Self::Store(_) => "registration.store",
        }
    }
}

/// Top-level error type for core operations.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Feed(#[from] FeedError),

    #[error(transparent)]
    Registration(#[from] RegistrationError),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
