//! Group model: a named collection of posts, backed 1:1 by a drive folder.

use serde::{Deserialize, Serialize};

use crate::models::Identity;

/// The single well-known top-level folder under which all groups live.
pub const ROOT_FOLDER_NAME: &str = "SharedMoments";

/// A shared photo group.
///
/// Reconstructed from the remote folder listing on every sync; the remote
/// store is the source of truth and this record is a snapshot. The host's
/// email is always `member_emails[0]` and is never removable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    /// Remote folder identifier (doubles as the group id)
    pub id: String,
    pub name: String,
    /// Identity id of the creator; implicitly privileged for rename,
    /// delete, and membership operations.
    pub host_id: String,
    pub member_emails: Vec<String>,
    pub folder_id: String,
    /// Logical path, e.g. `SharedMoments/Family`
    pub path: String,
}

impl Group {
    /// Build a group record from a remote folder, with the given identity as
    /// host and sole known member. Remote membership beyond the folder owner
    /// is not modeled by the storage provider.
    #[must_use]
    pub fn from_folder(folder_id: impl Into<String>, name: impl Into<String>, host: &Identity) -> Self {
        let folder_id = folder_id.into();
        let name = name.into();
        Self {
            id: folder_id.clone(),
            path: logical_path(&name),
            name,
            host_id: host.id.clone(),
            member_emails: vec![host.email.clone()],
            folder_id,
        }
    }

    #[must_use]
    pub fn is_host(&self, identity: &Identity) -> bool {
        self.host_id == identity.id
    }

    /// Apply a new display name, recomputing the logical path.
    pub fn set_name(&mut self, name: impl Into<String>) {
        let name = name.into();
        self.path = logical_path(&name);
        self.name = name;
    }

    #[must_use]
    pub fn host_email(&self) -> Option<&str> {
        self.member_emails.first().map(String::as_str)
    }
}

fn logical_path(name: &str) -> String {
    format!("{ROOT_FOLDER_NAME}/{name}")
}
