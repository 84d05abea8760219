//! Runtime configuration.
//!
//! Values come from builder methods or from `SIGNALFEED_*` environment
//! variables. [`FeedConfig::from_lookup`] takes the variable source as a
//! function so tests never touch the process environment.

use std::fmt::{Debug, Formatter};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use signalfeed_store::{
    DocumentStore, HttpAuth, MemoryStore, ReqwestHttpClient, RestStore, RestStoreConfig,
};
use tracing::info;

use crate::{CoreError, TraderRoster, ValidationError};

pub const ENV_STORE_URL: &str = "SIGNALFEED_STORE_URL";
pub const ENV_STORE_TOKEN: &str = "SIGNALFEED_STORE_TOKEN";
pub const ENV_REQUEST_TIMEOUT_MS: &str = "SIGNALFEED_REQUEST_TIMEOUT_MS";
pub const ENV_POLL_INTERVAL_MS: &str = "SIGNALFEED_POLL_INTERVAL_MS";
pub const ENV_ROSTER_PATH: &str = "SIGNALFEED_ROSTER_PATH";
pub const ENV_LOG_LEVEL: &str = "SIGNALFEED_LOG_LEVEL";
pub const ENV_LOG_JSON: &str = "SIGNALFEED_LOG_JSON";

const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 3_000;
const DEFAULT_POLL_INTERVAL_MS: u64 = 5_000;

/// Log output settings consumed by the binary's subscriber setup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingConfig {
    pub level: String,
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: String::from("info"),
            json: false,
        }
    }
}

/// Store, roster and logging settings.
#[derive(Clone, PartialEq, Eq)]
pub struct FeedConfig {
    pub store_url: Option<String>,
    pub store_token: Option<String>,
    pub request_timeout_ms: u64,
    pub poll_interval_ms: u64,
    pub roster_path: Option<PathBuf>,
    pub logging: LoggingConfig,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            store_url: None,
            store_token: None,
            request_timeout_ms: DEFAULT_REQUEST_TIMEOUT_MS,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            roster_path: None,
            logging: LoggingConfig::default(),
        }
    }
}

impl FeedConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_env() -> Result<Self, ValidationError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads every `SIGNALFEED_*` key through `lookup`. Blank values count
    /// as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ValidationError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_owned())
                .filter(|value| !value.is_empty())
        };

        let mut config = Self {
            store_url: read(ENV_STORE_URL),
            store_token: read(ENV_STORE_TOKEN),
            roster_path: read(ENV_ROSTER_PATH).map(PathBuf::from),
            ..Self::default()
        };

        if let Some(value) = read(ENV_REQUEST_TIMEOUT_MS) {
            config.request_timeout_ms = parse_millis(ENV_REQUEST_TIMEOUT_MS, &value)?;
        }
        if let Some(value) = read(ENV_POLL_INTERVAL_MS) {
            config.poll_interval_ms = parse_millis(ENV_POLL_INTERVAL_MS, &value)?;
        }
        if let Some(level) = read(ENV_LOG_LEVEL) {
            config.logging.level = level;
        }
        if let Some(value) = read(ENV_LOG_JSON) {
            config.logging.json = parse_bool(ENV_LOG_JSON, &value)?;
        }

        Ok(config)
    }

    pub fn with_store_url(mut self, url: impl Into<String>) -> Self {
        self.store_url = Some(url.into());
        self
    }

    pub fn with_store_token(mut self, token: impl Into<String>) -> Self {
        self.store_token = Some(token.into());
        self
    }

    pub fn with_roster_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.roster_path = Some(path.into());
        self
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// REST store when a URL is configured, otherwise an empty memory store.
    pub fn build_store(&self) -> Arc<dyn DocumentStore> {
        match &self.store_url {
            Some(url) => {
                let auth = self
                    .store_token
                    .clone()
                    .map_or(HttpAuth::None, HttpAuth::BearerToken);
                let rest = RestStoreConfig::new(url.as_str())
                    .with_auth(auth)
                    .with_request_timeout_ms(self.request_timeout_ms)
                    .with_poll_interval(self.poll_interval());
                info!(url = %rest.base_url, "using rest document store");
                Arc::new(RestStore::new(rest, Arc::new(ReqwestHttpClient::new())))
            }
            None => {
                info!("using in-memory document store");
                Arc::new(MemoryStore::new())
            }
        }
    }

    /// The configured roster file, or the built-in roster.
    pub fn load_roster(&self) -> Result<TraderRoster, CoreError> {
        match &self.roster_path {
            Some(path) => TraderRoster::from_path(path),
            None => Ok(TraderRoster::builtin()),
        }
    }
}

impl Debug for FeedConfig {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FeedConfig")
            .field("store_url", &self.store_url)
            .field("store_token", &self.store_token.as_ref().map(|_| "<redacted>"))
            .field("request_timeout_ms", &self.request_timeout_ms)
            .field("poll_interval_ms", &self.poll_interval_ms)
            .field("roster_path", &self.roster_path)
            .field("logging", &self.logging)
            .finish()
    }
}

fn parse_millis(key: &'static str, value: &str) -> Result<u64, ValidationError> {
    value
        .parse::<u64>()
        .ok()
        .filter(|millis| *millis > 0)
        .ok_or_else(|| ValidationError::InvalidConfig {
            key,
            value: value.to_owned(),
        })
}

fn parse_bool(key: &'static str, value: &str) -> Result<bool, ValidationError> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ValidationError::InvalidConfig {
            key,
            value: value.to_owned(),
        }),
    }
}
