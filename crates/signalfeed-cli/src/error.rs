use signalfeed_core::{CoreError, FeedError, RegistrationError, ValidationError};
use thiserror::Error;

/// CLI-level error categories mapped to exit codes.
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Feed(#[from] FeedError),

    #[error(transparent)]
    Registration(#[from] RegistrationError),

    #[error("store file is invalid: {0}")]
    StoreFile(String),

    #[error(transparent)]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<CoreError> for CliError {
    fn from(error: CoreError) -> Self {
        match error {
            CoreError::Validation(error) => Self::Validation(error),
            CoreError::Feed(error) => Self::Feed(error),
            CoreError::Registration(error) => Self::Registration(error),
            CoreError::Serialization(error) => Self::Serialization(error),
            CoreError::Io(error) => Self::Io(error),
        }
    }
}

impl CliError {
    pub const fn exit_code(&self) -> u8 {
        match self {
            Self::Validation(_) | Self::StoreFile(_) => 2,
            Self::Registration(
                RegistrationError::Validation(_)
                | RegistrationError::LoginTaken { .. }
                | RegistrationError::EmailTaken { .. },
            ) => 2,
            Self::Feed(_)
            | Self::Registration(RegistrationError::Timeout { .. } | RegistrationError::Store(_)) => 3,
            Self::Serialization(_) => 4,
            Self::Io(_) => 10,
        }
    }
}
