use std::fmt::{Display, Formatter};

/// Store-level error classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreErrorKind {
    PermissionDenied,
    Unavailable,
    Timeout,
    NotFound,
    InvalidQuery,
    Internal,
}

/// Structured error returned by every store operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreError {
    kind: StoreErrorKind,
    message: String,
    retryable: bool,
}

impl StoreError {
    pub fn permission_denied(message: impl Into<String>) -> Self {
        Self {
            kind: StoreErrorKind::PermissionDenied,
            message: message.into(),
            retryable: false,
        }
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self {
            kind: StoreErrorKind::Unavailable,
            message: message.into(),
            retryable: true,
        }
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self {
            kind: StoreErrorKind::Timeout,
            message: message.into(),
            retryable: true,
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self {
            kind: StoreErrorKind::NotFound,
            message: message.into(),
            retryable: false,
        }
    }

    pub fn invalid_query(message: impl Into<String>) -> Self {
        Self {
            kind: StoreErrorKind::InvalidQuery,
            message: message.into(),
            retryable: false,
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self {
            kind: StoreErrorKind::Internal,
            message: message.into(),
            retryable: false,
        }
    }

    pub const fn kind(&self) -> StoreErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub const fn retryable(&self) -> bool {
        self.retryable
    }

    pub const fn code(&self) -> &'static str {
        match self.kind {
            StoreErrorKind::PermissionDenied => "store.permission_denied",
            StoreErrorKind::Unavailable => "store.unavailable",
            StoreErrorKind::Timeout => "store.timeout",
            StoreErrorKind::NotFound => "store.not_found",
            StoreErrorKind::InvalidQuery => "store.invalid_query",
            StoreErrorKind::Internal => "store.internal",
        }
    }
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.message, self.code())
    }
}

impl std::error::Error for StoreError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_code() {
        let error = StoreError::permission_denied("missing read grant on 'calls'");
        assert_eq!(
            error.to_string(),
            "missing read grant on 'calls' (store.permission_denied)"
        );
        assert!(!error.retryable());
    }

    #[test]
    fn transport_failures_are_retryable() {
        assert!(StoreError::unavailable("connection refused").retryable());
        assert!(StoreError::timeout("deadline exceeded").retryable());
        assert!(!StoreError::invalid_query("bad field").retryable());
    }
}
