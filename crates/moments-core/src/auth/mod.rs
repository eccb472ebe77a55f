//! Identity provider client and session persistence seam.

use std::sync::Mutex;

use reqwest::{Client, StatusCode};
use serde::Deserialize;

use crate::error::{Error, Result};
use crate::models::{AccessToken, Identity, StoredIdentity};
use crate::util::{compact_text, is_http_url};

const DEFAULT_USERINFO_URL: &str = "https://www.googleapis.com/oauth2/v3/userinfo";

/// Persistence seam for the remember-me identity.
///
/// Implementations store only the credential-free [`StoredIdentity`] shape;
/// access tokens must never reach this layer.
pub trait SessionPersistence: Clone + Send + Sync + 'static {
    fn load(&self) -> Result<Option<StoredIdentity>>;
    fn save(&self, identity: &StoredIdentity) -> Result<()>;
    fn clear(&self) -> Result<()>;
}

/// Client for the provider's user-identity lookup endpoint.
#[derive(Debug, Clone)]
pub struct AuthClient {
    userinfo_url: String,
    client: Client,
}

impl AuthClient {
    pub fn new() -> Result<Self> {
        Self::with_userinfo_url(DEFAULT_USERINFO_URL)
    }

    pub fn with_userinfo_url(url: impl Into<String>) -> Result<Self> {
        let userinfo_url = url.into().trim().trim_end_matches('/').to_string();
        if !is_http_url(&userinfo_url) {
            return Err(Error::InvalidInput(
                "userinfo URL must include http:// or https://".to_string(),
            ));
        }
        let client = Client::builder()
            .build()
            .map_err(|error| Error::RemoteUnavailable(error.to_string()))?;
        Ok(Self { userinfo_url, client })
    }

    /// Resolve the authenticated identity behind a freshly acquired token.
    pub async fn fetch_identity(&self, token: &AccessToken) -> Result<Identity> {
        let response = self
            .client
            .get(&self.userinfo_url)
            .bearer_auth(token.as_str())
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|error| Error::from_transport(&error))?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            return Err(Error::Unauthorized(format!("HTTP {}", status.as_u16())));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::RemoteUnavailable(format!(
                "userinfo returned HTTP {}: {}",
                status.as_u16(),
                compact_text(&body)
            )));
        }

        let payload = response
            .json::<UserInfoResponse>()
            .await
            .map_err(|error| Error::MalformedResponse(error.to_string()))?;
        payload.into_identity(token.clone())
    }
}

#[derive(Debug, Deserialize)]
struct UserInfoResponse {
    sub: Option<String>,
    email: Option<String>,
    name: Option<String>,
    picture: Option<String>,
}

impl UserInfoResponse {
    fn into_identity(self, token: AccessToken) -> Result<Identity> {
        let id = self
            .sub
            .filter(|sub| !sub.trim().is_empty())
            .ok_or_else(|| Error::MalformedResponse("userinfo missing 'sub'".to_string()))?;
        let email = self
            .email
            .filter(|email| !email.trim().is_empty())
            .ok_or_else(|| Error::MalformedResponse("userinfo missing 'email'".to_string()))?;

        Ok(Identity {
            name: self.name.unwrap_or_else(|| email.clone()),
            id,
            email,
            photo_url: self.picture,
            access_token: Some(token),
        })
    }
}

/// In-memory session store used in tests and demo mode.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    slot: std::sync::Arc<Mutex<Option<StoredIdentity>>>,
}

impl Clone for MemorySessionStore {
    fn clone(&self) -> Self {
        Self {
            slot: std::sync::Arc::clone(&self.slot),
        }
    }
}

impl SessionPersistence for MemorySessionStore {
    fn load(&self) -> Result<Option<StoredIdentity>> {
        Ok(self
            .slot
            .lock()
            .map_err(|_| Error::Storage("session store poisoned".to_string()))?
            .clone())
    }

    fn save(&self, identity: &StoredIdentity) -> Result<()> {
        *self
            .slot
            .lock()
            .map_err(|_| Error::Storage("session store poisoned".to_string()))? =
            Some(identity.clone());
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        *self
            .slot
            .lock()
            .map_err(|_| Error::Storage("session store poisoned".to_string()))? = None;
        Ok(())
    }
}
