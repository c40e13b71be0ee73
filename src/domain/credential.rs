//! Credentials passed through to data sources

use crate::config::secret::{secret_string, SecretString};
use secrecy::ExposeSecret;
use std::fmt;

/// Username + secret pair for SQL or OS authentication
///
/// sqlscout never inspects or stores credentials; it only hands them to the
/// data source. An absent credential means the caller's ambient identity
/// (integrated authentication) is used.
#[derive(Clone)]
pub struct Credential {
    username: String,
    secret: SecretString,
}

impl Credential {
    /// Create a credential, rejecting an empty username
    pub fn new(username: impl Into<String>, secret: SecretString) -> Result<Self, String> {
        let username = username.into();
        if username.trim().is_empty() {
            return Err("Credential username cannot be empty".to_string());
        }
        Ok(Self { username, secret })
    }

    /// Convenience constructor from plain strings
    pub fn from_parts(username: impl Into<String>, secret: impl Into<String>) -> Result<Self, String> {
        Self::new(username, secret_string(secret.into()))
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    /// Access the secret; callers should pass it on, never log it
    pub fn expose_secret(&self) -> &str {
        self.secret.expose_secret().as_ref()
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("username", &self.username)
            .field("secret", &"[REDACTED]")
            .finish()
    }
}
