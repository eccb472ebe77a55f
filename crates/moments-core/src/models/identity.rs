//! Authenticated identity and its session-scoped credential.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Schema version for the persisted remember-me identity shape.
pub const IDENTITY_SCHEMA_VERSION: u32 = 1;

/// Opaque, time-limited bearer credential issued by the identity provider.
///
/// Lives only for the session; never persisted.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessToken(String);

impl AccessToken {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.debug_tuple("AccessToken").field(&"[REDACTED]").finish()
    }
}

/// An authenticated user of the app.
///
/// `access_token` is `None` in local-only demo mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub id: String,
    pub email: String,
    pub name: String,
    pub photo_url: Option<String>,
    pub access_token: Option<AccessToken>,
}

impl Identity {
    /// The minimal, credential-free shape safe to persist under remember-me.
    #[must_use]
    pub fn to_stored(&self) -> StoredIdentity {
        StoredIdentity {
            schema_version: IDENTITY_SCHEMA_VERSION,
            id: self.id.clone(),
            email: self.email.clone(),
            name: self.name.clone(),
            photo_url: self.photo_url.clone(),
        }
    }
}

/// Persisted remember-me identity. Deliberately excludes the access token:
/// the credential is time-limited and must be re-acquired each session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredIdentity {
    pub schema_version: u32,
    pub id: String,
    pub email: String,
    pub name: String,
    #[serde(default)]
    pub photo_url: Option<String>,
}

impl StoredIdentity {
    /// Rebuild a session identity. The caller supplies a freshly acquired
    /// token, or `None` for demo mode.
    #[must_use]
    pub fn into_identity(self, access_token: Option<AccessToken>) -> Identity {
        Identity {
            id: self.id,
            email: self.email,
            name: self.name,
            photo_url: self.photo_url,
            access_token,
        }
    }
}
