//! Remote folder gateway: the only network-facing seam in the app.
//!
//! Groups are folders under a well-known root; posts are image files inside
//! a group's folder. Everything the directory and feed layers do goes
//! through [`FolderGateway`], so demo builds can swap the HTTP client for a
//! local stand-in.

mod local;
mod remote;

pub use local::LocalDriveStore;
pub use remote::DriveGateway;

use crate::error::Result;
use crate::models::AccessToken;

/// A non-trashed folder child, as listed by the remote store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FolderEntry {
    pub id: String,
    pub name: String,
}

/// A non-trashed image file with enough metadata to reconstruct a post
/// without a second round trip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    pub id: String,
    pub name: String,
    pub description: String,
    /// Creation time (Unix ms)
    pub created_at: i64,
    /// Preferred display link (preview when available, download otherwise)
    pub image_url: String,
}

/// A binary payload queued for upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUpload {
    pub bytes: Vec<u8>,
    pub mime_type: String,
    pub filename: String,
}

/// Adapter over the external storage provider's file/folder API.
///
/// No call is retried internally; failures surface to the initiating
/// action. None of the operations are idempotent by construction except
/// `find_or_create_folder`, which re-queries before creating.
pub trait FolderGateway {
    /// Find a non-trashed folder with the given name under `parent` (the
    /// store root when omitted), creating it when absent. When several
    /// folders share the name, the first one returned by the store wins;
    /// the ordering is not deterministic.
    fn find_or_create_folder(
        &self,
        token: &AccessToken,
        parent: Option<&str>,
        name: &str,
    ) -> impl std::future::Future<Output = Result<String>> + Send;

    /// List non-trashed folder children of a folder.
    fn list_subfolders(
        &self,
        token: &AccessToken,
        parent: &str,
    ) -> impl std::future::Future<Output = Result<Vec<FolderEntry>>> + Send;

    /// List non-trashed image-mimetype children of a folder.
    fn list_image_files(
        &self,
        token: &AccessToken,
        parent: &str,
    ) -> impl std::future::Future<Output = Result<Vec<FileEntry>>> + Send;

    /// Upload a binary payload as a new file carrying the given description.
    fn upload_file(
        &self,
        token: &AccessToken,
        parent: &str,
        upload: NewUpload,
        description: &str,
    ) -> impl std::future::Future<Output = Result<FileEntry>> + Send;

    /// Rename a folder in place.
    fn rename_folder(
        &self,
        token: &AccessToken,
        folder_id: &str,
        name: &str,
    ) -> impl std::future::Future<Output = Result<()>> + Send;

    /// Replace a file's description field.
    fn update_file_description(
        &self,
        token: &AccessToken,
        file_id: &str,
        description: &str,
    ) -> impl std::future::Future<Output = Result<()>> + Send;

    /// Move a file to the store's trash.
    fn trash_file(
        &self,
        token: &AccessToken,
        file_id: &str,
    ) -> impl std::future::Future<Output = Result<()>> + Send;

    /// Move a folder (and its contents) to the store's trash.
    fn trash_folder(
        &self,
        token: &AccessToken,
        folder_id: &str,
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}
