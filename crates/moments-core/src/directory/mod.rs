//! Group directory: derives groups from the folder listing under the
//! well-known root and keeps local edits written through to the remote
//! store.

use crate::drive::FolderGateway;
use crate::error::{Error, Result};
use crate::models::{AccessToken, Group, Identity, ROOT_FOLDER_NAME};
use crate::util::normalize_text;

/// Directory of shared groups, one per sub-folder of the root.
#[derive(Debug, Clone)]
pub struct GroupDirectory<G> {
    gateway: G,
}

impl<G: FolderGateway> GroupDirectory<G> {
    pub const fn new(gateway: G) -> Self {
        Self { gateway }
    }

    /// Resolve (creating if absent) the root folder and derive one group per
    /// non-trashed sub-folder, with the authenticated identity as host and
    /// sole known member. Root creation is idempotent: a second bootstrap
    /// finds the existing root.
    pub async fn bootstrap(&self, token: &AccessToken, identity: &Identity) -> Result<Vec<Group>> {
        let root_id = self
            .gateway
            .find_or_create_folder(token, None, ROOT_FOLDER_NAME)
            .await?;
        let folders = self.gateway.list_subfolders(token, &root_id).await?;
        tracing::info!(count = folders.len(), "synced groups from drive root");

        Ok(folders
            .into_iter()
            .map(|folder| Group::from_folder(folder.id, folder.name, identity))
            .collect())
    }

    /// Create a named group folder under the root. Calling this twice with
    /// the same name yields the same group.
    pub async fn create(
        &self,
        token: &AccessToken,
        identity: &Identity,
        name: &str,
    ) -> Result<Group> {
        let name = validate_group_name(name)?;
        let root_id = self
            .gateway
            .find_or_create_folder(token, None, ROOT_FOLDER_NAME)
            .await?;
        let folder_id = self
            .gateway
            .find_or_create_folder(token, Some(&root_id), &name)
            .await?;
        Ok(Group::from_folder(folder_id, name, identity))
    }

    /// Rename the group's remote folder, then rebuild the local record.
    ///
    /// The two halves are not atomic: a remote failure leaves the local
    /// record untouched, so the caller never sees a phantom rename.
    pub async fn rename(
        &self,
        token: &AccessToken,
        identity: &Identity,
        group: &Group,
        new_name: &str,
    ) -> Result<Group> {
        require_host(group, identity, "rename")?;
        let new_name = validate_group_name(new_name)?;

        self.gateway
            .rename_folder(token, &group.folder_id, &new_name)
            .await?;

        let mut renamed = group.clone();
        renamed.set_name(new_name);
        Ok(renamed)
    }

    /// Trash the group's remote folder and everything in it. Host only.
    pub async fn delete(
        &self,
        token: &AccessToken,
        identity: &Identity,
        group: &Group,
    ) -> Result<()> {
        require_host(group, identity, "delete")?;
        self.gateway.trash_folder(token, &group.folder_id).await
    }

    /// Leave a group as a non-host member. Purely local: the provider has no
    /// membership-revocation call, so leaving only drops the group from the
    /// local directory. Hosts delete instead of leaving.
    pub fn leave(group: &Group, identity: &Identity) -> Result<()> {
        if group.is_host(identity) {
            return Err(Error::InvalidInput(
                "the host cannot leave a group; delete it instead".to_string(),
            ));
        }
        Ok(())
    }

    /// Add a member email to the local membership list. Cosmetic only: no
    /// remote sharing call is made, so this grants no access.
    pub fn add_member(group: &Group, email: &str) -> Result<Group> {
        let email = validate_member_email(email)?;
        if group.member_emails.iter().any(|member| member == &email) {
            return Err(Error::InvalidInput(format!(
                "{email} is already a member of {}",
                group.name
            )));
        }

        let mut updated = group.clone();
        updated.member_emails.push(email);
        Ok(updated)
    }

    /// Remove a member email from the local membership list. The host's
    /// email is never removable.
    pub fn remove_member(group: &Group, email: &str) -> Result<Group> {
        let email = validate_member_email(email)?;
        if group.host_email() == Some(email.as_str()) {
            return Err(Error::InvalidInput(
                "the host cannot be removed from a group".to_string(),
            ));
        }

        let mut updated = group.clone();
        let before = updated.member_emails.len();
        updated.member_emails.retain(|member| member != &email);
        if updated.member_emails.len() == before {
            return Err(Error::InvalidInput(format!(
                "{email} is not a member of {}",
                group.name
            )));
        }
        Ok(updated)
    }
}

fn require_host(group: &Group, identity: &Identity, action: &str) -> Result<()> {
    if group.is_host(identity) {
        Ok(())
    } else {
        Err(Error::InvalidInput(format!(
            "only the host can {action} a group"
        )))
    }
}

fn validate_group_name(name: &str) -> Result<String> {
    normalize_text(name)
        .ok_or_else(|| Error::InvalidInput("group name cannot be empty".to_string()))
}

fn validate_member_email(email: &str) -> Result<String> {
    let email = normalize_text(email)
        .ok_or_else(|| Error::InvalidInput("member email cannot be empty".to_string()))?;
    if !email.contains('@') {
        return Err(Error::InvalidInput(format!(
            "'{email}' is not a valid email address"
        )));
    }
    Ok(email)
}
