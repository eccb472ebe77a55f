//! Remember-me persistence for the signed-in identity.
//!
//! Only the credential-free [`StoredIdentity`] shape ever reaches these
//! stores; access tokens stay in memory for the session.

use keyring::Entry;
use moments_core::auth::SessionPersistence;
use moments_core::models::StoredIdentity;
use moments_core::store::FileStore;
use moments_core::{Error, Result};

const KEYRING_SERVICE_NAME: &str = "moments";
const KEYRING_SESSION_USERNAME: &str = "identity";

const SESSION_KEY: &str = "session";

/// Session store backed by the OS keyring (`keyring` crate).
#[derive(Debug, Clone)]
pub struct KeyringSessionStore {
    service_name: String,
    username: String,
}

impl Default for KeyringSessionStore {
    fn default() -> Self {
        Self {
            service_name: KEYRING_SERVICE_NAME.to_string(),
            username: KEYRING_SESSION_USERNAME.to_string(),
        }
    }
}

impl KeyringSessionStore {
    fn entry(&self) -> Result<Entry> {
        Entry::new(&self.service_name, &self.username)
            .map_err(|error| Error::Storage(error.to_string()))
    }
}

impl SessionPersistence for KeyringSessionStore {
    fn load(&self) -> Result<Option<StoredIdentity>> {
        let entry = self.entry()?;
        match entry.get_password() {
            Ok(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(error) => Err(Error::Storage(error.to_string())),
        }
    }

    fn save(&self, identity: &StoredIdentity) -> Result<()> {
        let serialized = serde_json::to_string(identity)?;
        self.entry()?
            .set_password(&serialized)
            .map_err(|error| Error::Storage(error.to_string()))
    }

    fn clear(&self) -> Result<()> {
        let entry = self.entry()?;
        match entry.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(error) => Err(Error::Storage(error.to_string())),
        }
    }
}

/// Session store backed by the local state file, used in demo mode where no
/// OS keyring is assumed.
#[derive(Debug, Clone)]
pub struct FileSessionStore {
    store: FileStore,
}

impl FileSessionStore {
    #[must_use]
    pub const fn new(store: FileStore) -> Self {
        Self { store }
    }
}

impl SessionPersistence for FileSessionStore {
    fn load(&self) -> Result<Option<StoredIdentity>> {
        self.store.get(SESSION_KEY)
    }

    fn save(&self, identity: &StoredIdentity) -> Result<()> {
        self.store.put(SESSION_KEY, identity)
    }

    fn clear(&self) -> Result<()> {
        self.store.remove(SESSION_KEY)
    }
}

/// The concrete store picked for the current invocation.
#[derive(Debug, Clone)]
pub enum SessionStore {
    Keyring(KeyringSessionStore),
    File(FileSessionStore),
}

impl SessionPersistence for SessionStore {
    fn load(&self) -> Result<Option<StoredIdentity>> {
        match self {
            Self::Keyring(store) => store.load(),
            Self::File(store) => store.load(),
        }
    }

    fn save(&self, identity: &StoredIdentity) -> Result<()> {
        match self {
            Self::Keyring(store) => store.save(identity),
            Self::File(store) => store.save(identity),
        }
    }

    fn clear(&self) -> Result<()> {
        match self {
            Self::Keyring(store) => store.clear(),
            Self::File(store) => store.clear(),
        }
    }
}
