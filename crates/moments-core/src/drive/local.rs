//! Local stand-in for the remote store, used by demo builds and tests.
//!
//! Mirrors the remote contract over the device's JSON key-value store:
//! folders and files live in a single versioned document, trashing is a
//! flag, and folder queries preserve insertion order (so "first match wins"
//! is deterministic here, unlike the real store).

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::drive::{FileEntry, FolderEntry, FolderGateway, NewUpload};
use crate::error::{Error, Result};
use crate::models::AccessToken;
use crate::store::FileStore;
use crate::util::unix_timestamp_now_ms;

const DRIVE_KEY: &str = "drive";

#[derive(Debug, Default, Serialize, Deserialize)]
struct DriveDocument {
    folders: Vec<StoredFolder>,
    files: Vec<StoredFile>,
    /// Last issued creation timestamp; kept strictly increasing so uploads
    /// within the same millisecond retain their order.
    clock: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredFolder {
    id: String,
    name: String,
    parent: Option<String>,
    trashed: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredFile {
    id: String,
    name: String,
    parent: String,
    description: String,
    mime_type: String,
    created_at: i64,
    trashed: bool,
}

/// File-backed drive stand-in. The access token is accepted for contract
/// parity and ignored.
#[derive(Debug, Clone)]
pub struct LocalDriveStore {
    store: FileStore,
}

impl LocalDriveStore {
    #[must_use]
    pub const fn new(store: FileStore) -> Self {
        Self { store }
    }

    fn load(&self) -> Result<DriveDocument> {
        Ok(self.store.get::<DriveDocument>(DRIVE_KEY)?.unwrap_or_default())
    }

    fn save(&self, document: &DriveDocument) -> Result<()> {
        self.store.put(DRIVE_KEY, document)
    }

    fn next_created_at(document: &mut DriveDocument) -> i64 {
        let now = unix_timestamp_now_ms();
        document.clock = if now > document.clock { now } else { document.clock + 1 };
        document.clock
    }

    fn with_folder<R>(
        &self,
        folder_id: &str,
        mutate: impl FnOnce(&mut StoredFolder) -> R,
    ) -> Result<R> {
        let mut document = self.load()?;
        let folder = document
            .folders
            .iter_mut()
            .find(|folder| folder.id == folder_id && !folder.trashed)
            .ok_or_else(|| Error::Storage(format!("folder not found: {folder_id}")))?;
        let result = mutate(folder);
        self.save(&document)?;
        Ok(result)
    }
}

impl FolderGateway for LocalDriveStore {
    async fn find_or_create_folder(
        &self,
        _token: &AccessToken,
        parent: Option<&str>,
        name: &str,
    ) -> Result<String> {
        let mut document = self.load()?;
        if let Some(found) = document
            .folders
            .iter()
            .find(|folder| !folder.trashed && folder.name == name && folder.parent.as_deref() == parent)
        {
            return Ok(found.id.clone());
        }

        let folder = StoredFolder {
            id: Uuid::now_v7().to_string(),
            name: name.to_string(),
            parent: parent.map(ToString::to_string),
            trashed: false,
        };
        let id = folder.id.clone();
        document.folders.push(folder);
        self.save(&document)?;
        Ok(id)
    }

    async fn list_subfolders(&self, _token: &AccessToken, parent: &str) -> Result<Vec<FolderEntry>> {
        let document = self.load()?;
        Ok(document
            .folders
            .iter()
            .filter(|folder| !folder.trashed && folder.parent.as_deref() == Some(parent))
            .map(|folder| FolderEntry {
                id: folder.id.clone(),
                name: folder.name.clone(),
            })
            .collect())
    }

    async fn list_image_files(&self, _token: &AccessToken, parent: &str) -> Result<Vec<FileEntry>> {
        let document = self.load()?;
        Ok(document
            .files
            .iter()
            .filter(|file| {
                !file.trashed && file.parent == parent && file.mime_type.starts_with("image/")
            })
            .map(file_entry)
            .collect())
    }

    async fn upload_file(
        &self,
        _token: &AccessToken,
        parent: &str,
        upload: NewUpload,
        description: &str,
    ) -> Result<FileEntry> {
        if upload.bytes.is_empty() {
            return Err(Error::InvalidInput("upload payload is empty".to_string()));
        }

        let mut document = self.load()?;
        let file = StoredFile {
            id: Uuid::now_v7().to_string(),
            name: upload.filename,
            parent: parent.to_string(),
            description: description.to_string(),
            mime_type: upload.mime_type,
            created_at: Self::next_created_at(&mut document),
            trashed: false,
        };
        let entry = file_entry(&file);
        document.files.push(file);
        self.save(&document)?;
        Ok(entry)
    }

    async fn rename_folder(&self, _token: &AccessToken, folder_id: &str, name: &str) -> Result<()> {
        self.with_folder(folder_id, |folder| folder.name = name.to_string())
    }

    async fn update_file_description(
        &self,
        _token: &AccessToken,
        file_id: &str,
        description: &str,
    ) -> Result<()> {
        let mut document = self.load()?;
        let file = document
            .files
            .iter_mut()
            .find(|file| file.id == file_id && !file.trashed)
            .ok_or_else(|| Error::Storage(format!("file not found: {file_id}")))?;
        file.description = description.to_string();
        self.save(&document)
    }

    async fn trash_file(&self, _token: &AccessToken, file_id: &str) -> Result<()> {
        let mut document = self.load()?;
        let file = document
            .files
            .iter_mut()
            .find(|file| file.id == file_id && !file.trashed)
            .ok_or_else(|| Error::Storage(format!("file not found: {file_id}")))?;
        file.trashed = true;
        self.save(&document)
    }

    async fn trash_folder(&self, _token: &AccessToken, folder_id: &str) -> Result<()> {
        let mut document = self.load()?;
        let folder = document
            .folders
            .iter_mut()
            .find(|folder| folder.id == folder_id && !folder.trashed)
            .ok_or_else(|| Error::Storage(format!("folder not found: {folder_id}")))?;
        folder.trashed = true;
        let folder_id = folder.id.clone();
        for file in document
            .files
            .iter_mut()
            .filter(|file| file.parent == folder_id)
        {
            file.trashed = true;
        }
        self.save(&document)
    }
}

fn file_entry(file: &StoredFile) -> FileEntry {
    FileEntry {
        id: file.id.clone(),
        name: file.name.clone(),
        description: file.description.clone(),
        created_at: file.created_at,
        image_url: format!("local://{}", file.id),
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn store() -> (tempfile::TempDir, LocalDriveStore) {
        let dir = tempfile::tempdir().unwrap();
        let file_store = FileStore::open(dir.path().join("drive.json")).unwrap();
        (dir, LocalDriveStore::new(file_store))
    }

    fn token() -> AccessToken {
        AccessToken::new("demo")
    }

    fn jpeg(name: &str) -> NewUpload {
        NewUpload {
            bytes: vec![0xFF, 0xD8, 0xFF],
            mime_type: "image/jpeg".to_string(),
            filename: name.to_string(),
        }
    }

    #[tokio::test]
    async fn find_or_create_is_idempotent() {
        let (_dir, drive) = store();
        let first = drive
            .find_or_create_folder(&token(), None, "SharedMoments")
            .await
            .unwrap();
        let second = drive
            .find_or_create_folder(&token(), None, "SharedMoments")
            .await
            .unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn same_name_under_different_parents_is_distinct() {
        let (_dir, drive) = store();
        let root = drive
            .find_or_create_folder(&token(), None, "SharedMoments")
            .await
            .unwrap();
        let nested = drive
            .find_or_create_folder(&token(), Some(&root), "SharedMoments")
            .await
            .unwrap();
        assert_ne!(root, nested);
    }

    #[tokio::test]
    async fn upload_then_list_round_trips_metadata() {
        let (_dir, drive) = store();
        let folder = drive
            .find_or_create_folder(&token(), None, "Trip")
            .await
            .unwrap();

        let uploaded = drive
            .upload_file(&token(), &folder, jpeg("Moment_1.jpg"), "Sunset")
            .await
            .unwrap();

        let listed = drive.list_image_files(&token(), &folder).await.unwrap();
        assert_eq!(listed, vec![uploaded]);
        assert_eq!(listed[0].description, "Sunset");
    }

    #[tokio::test]
    async fn repeated_uploads_get_increasing_timestamps() {
        let (_dir, drive) = store();
        let folder = drive
            .find_or_create_folder(&token(), None, "Trip")
            .await
            .unwrap();

        let first = drive
            .upload_file(&token(), &folder, jpeg("a.jpg"), "")
            .await
            .unwrap();
        let second = drive
            .upload_file(&token(), &folder, jpeg("b.jpg"), "")
            .await
            .unwrap();
        assert!(second.created_at > first.created_at);
    }

    #[tokio::test]
    async fn trash_folder_hides_folder_and_contents() {
        let (_dir, drive) = store();
        let root = drive
            .find_or_create_folder(&token(), None, "SharedMoments")
            .await
            .unwrap();
        let group = drive
            .find_or_create_folder(&token(), Some(&root), "Trip")
            .await
            .unwrap();
        drive
            .upload_file(&token(), &group, jpeg("a.jpg"), "")
            .await
            .unwrap();

        drive.trash_folder(&token(), &group).await.unwrap();

        assert!(drive.list_subfolders(&token(), &root).await.unwrap().is_empty());
        assert!(drive.list_image_files(&token(), &group).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn non_image_files_are_not_listed() {
        let (_dir, drive) = store();
        let folder = drive
            .find_or_create_folder(&token(), None, "Trip")
            .await
            .unwrap();
        drive
            .upload_file(
                &token(),
                &folder,
                NewUpload {
                    bytes: b"members".to_vec(),
                    mime_type: "text/plain".to_string(),
                    filename: "members.txt".to_string(),
                },
                "",
            )
            .await
            .unwrap();

        assert!(drive.list_image_files(&token(), &folder).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn empty_upload_is_rejected_before_write() {
        let (_dir, drive) = store();
        let folder = drive
            .find_or_create_folder(&token(), None, "Trip")
            .await
            .unwrap();
        let error = drive
            .upload_file(
                &token(),
                &folder,
                NewUpload {
                    bytes: Vec::new(),
                    mime_type: "image/jpeg".to_string(),
                    filename: "x.jpg".to_string(),
                },
                "",
            )
            .await
            .unwrap_err();
        assert!(matches!(error, Error::InvalidInput(_)));
    }
}
