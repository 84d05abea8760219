//! Student registration.
//!
//! Registration is the only write path. Each store round trip races a fixed
//! deadline; whichever settles first wins and the losing store future is
//! dropped, so a late response can never complete the call a second time.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;
use serde_json::{Map, Value};
use signalfeed_store::{DocumentStore, NewDocument, StoreError, StoreErrorKind};
use tracing::{debug, info, warn};

use crate::{RegistrationError, ValidationError};

/// Deadline applied to each registration round trip.
pub const REGISTRATION_TIMEOUT: Duration = Duration::from_secs(10);

/// Default collection holding student documents.
pub const STUDENTS_COLLECTION: &str = "students";

/// Registration request. Credentials are deliberately absent: they belong to
/// the authentication provider and are never written to the store.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentRegistration {
    pub login: String,
    pub email: String,
    #[serde(default)]
    pub display_name: Option<String>,
}

impl StudentRegistration {
    pub fn new(login: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            login: login.into(),
            email: email.into(),
            display_name: None,
        }
    }

    pub fn with_display_name(mut self, display_name: impl Into<String>) -> Self {
        self.display_name = Some(display_name.into());
        self
    }

    /// Trims the login, lowercases the email and fills the display name.
    pub fn normalized(&self) -> Result<Self, ValidationError> {
        let login = self.login.trim();
        if login.is_empty() {
            return Err(ValidationError::EmptyLogin);
        }

        let email = self.email.trim().to_ascii_lowercase();
        let valid_email = email
            .split_once('@')
            .is_some_and(|(local, domain)| {
                !local.is_empty() && !domain.is_empty() && !domain.contains('@')
            });
        if !valid_email {
            return Err(ValidationError::InvalidEmail {
                value: self.email.clone(),
            });
        }

        let display_name = self
            .display_name
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .unwrap_or(login)
            .to_owned();

        Ok(Self {
            login: login.to_owned(),
            email,
            display_name: Some(display_name),
        })
    }

    fn into_document(self) -> NewDocument {
        let mut fields = Map::new();
        fields.insert(String::from("login"), Value::String(self.login));
        fields.insert(String::from("email"), Value::String(self.email));
        if let Some(display_name) = self.display_name {
            fields.insert(String::from("displayName"), Value::String(display_name));
        }

        NewDocument::new(fields)
            .with_server_timestamp("createdAt")
            .with_server_timestamp("updatedAt")
    }
}

/// Registers students against the student collection.
#[derive(Clone)]
pub struct Registrar {
    store: Arc<dyn DocumentStore>,
    collection: String,
    timeout: Duration,
}

impl Registrar {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            store,
            collection: STUDENTS_COLLECTION.to_owned(),
            timeout: REGISTRATION_TIMEOUT,
        }
    }

    pub fn with_collection(mut self, collection: impl Into<String>) -> Self {
        self.collection = collection.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Registers a student and returns the store-assigned id.
    ///
    /// Rejects a taken login before checking the email.
    pub async fn register(
        &self,
        registration: &StudentRegistration,
    ) -> Result<String, RegistrationError> {
        let student = registration.normalized()?;

        let by_login = self
            .bounded(
                "login lookup",
                self.store.find_by_field(
                    &self.collection,
                    "login",
                    Value::String(student.login.clone()),
                ),
            )
            .await?;
        if by_login.is_some() {
            return Err(RegistrationError::LoginTaken {
                login: student.login,
            });
        }

        let by_email = self
            .bounded(
                "email lookup",
                self.store.find_by_field(
                    &self.collection,
                    "email",
                    Value::String(student.email.clone()),
                ),
            )
            .await?;
        if by_email.is_some() {
            return Err(RegistrationError::EmailTaken {
                email: student.email,
            });
        }

        let login = student.login.clone();
        let id = self
            .bounded(
                "student insert",
                self.store.insert(&self.collection, student.into_document()),
            )
            .await?;

        info!(%id, %login, "student registered");
        Ok(id)
    }

    async fn bounded<T, F>(&self, operation: &'static str, call: F) -> Result<T, RegistrationError>
    where
        F: Future<Output = Result<T, StoreError>>,
    {
        debug!(operation, timeout = ?self.timeout, "registration round trip");
        match tokio::time::timeout(self.timeout, call).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(error)) if error.kind() == StoreErrorKind::Timeout => {
                warn!(operation, %error, "store reported a timeout");
                Err(self.timed_out(operation))
            }
            Ok(Err(error)) => Err(RegistrationError::Store(error)),
            Err(_) => {
                warn!(operation, timeout = ?self.timeout, "registration round trip timed out");
                Err(self.timed_out(operation))
            }
        }
    }

    fn timed_out(&self, operation: &'static str) -> RegistrationError {
        RegistrationError::Timeout {
            operation,
            timeout_ms: u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX),
        }
    }
}

impl std::fmt::Debug for Registrar {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registrar")
            .field("store", &self.store.name())
            .field("collection", &self.collection)
            .field("timeout", &self.timeout)
            .finish()
    }
}
