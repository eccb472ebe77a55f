//! HTTP implementation of the folder gateway against a Drive-style API.

use chrono::DateTime;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::Deserialize;

use crate::drive::{FileEntry, FolderEntry, FolderGateway, NewUpload};
use crate::error::{Error, Result};
use crate::models::AccessToken;
use crate::util::{compact_text, is_http_url};

const DEFAULT_API_BASE_URL: &str = "https://www.googleapis.com/drive/v3";
const DEFAULT_UPLOAD_BASE_URL: &str = "https://www.googleapis.com/upload/drive/v3";
const FOLDER_MIME_TYPE: &str = "application/vnd.google-apps.folder";
const FILE_LIST_FIELDS: &str = "files(id,name,description,createdTime,thumbnailLink,webContentLink)";
const UPLOAD_FIELDS: &str = "id,name,webContentLink,thumbnailLink,createdTime,description";

/// Drive REST client.
#[derive(Debug, Clone)]
pub struct DriveGateway {
    api_base_url: String,
    upload_base_url: String,
    client: Client,
}

impl DriveGateway {
    pub fn new() -> Result<Self> {
        Self::with_base_urls(DEFAULT_API_BASE_URL, DEFAULT_UPLOAD_BASE_URL)
    }

    /// Build a gateway against explicit endpoints (used by tests and
    /// self-hosted proxies).
    pub fn with_base_urls(
        api_base_url: impl Into<String>,
        upload_base_url: impl Into<String>,
    ) -> Result<Self> {
        let api_base_url = normalize_base_url(api_base_url.into())?;
        let upload_base_url = normalize_base_url(upload_base_url.into())?;
        let client = Client::builder()
            .build()
            .map_err(|error| Error::RemoteUnavailable(error.to_string()))?;
        Ok(Self {
            api_base_url,
            upload_base_url,
            client,
        })
    }

    async fn query_files(&self, token: &AccessToken, query: &str, fields: Option<&str>) -> Result<Vec<DriveFile>> {
        let mut url = format!(
            "{}/files?q={}",
            self.api_base_url,
            urlencoding::encode(query)
        );
        if let Some(fields) = fields {
            url.push_str("&fields=");
            url.push_str(&urlencoding::encode(fields).into_owned());
        }

        let response = self
            .send(self.client.get(url).bearer_auth(token.as_str()))
            .await?;
        let payload = parse_json::<DriveFileList>(response).await?;
        Ok(payload.files.unwrap_or_default())
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response> {
        let response = request
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|error| Error::from_transport(&error))?;
        check_status(response).await
    }

    async fn patch_metadata(
        &self,
        token: &AccessToken,
        file_id: &str,
        body: &serde_json::Value,
    ) -> Result<()> {
        let url = format!(
            "{}/files/{}",
            self.api_base_url,
            urlencoding::encode(file_id)
        );
        self.send(
            self.client
                .patch(url)
                .bearer_auth(token.as_str())
                .json(body),
        )
        .await?;
        Ok(())
    }
}

impl FolderGateway for DriveGateway {
    async fn find_or_create_folder(
        &self,
        token: &AccessToken,
        parent: Option<&str>,
        name: &str,
    ) -> Result<String> {
        let mut query = format!(
            "name='{}' and mimeType='{FOLDER_MIME_TYPE}' and trashed=false",
            escape_query_value(name)
        );
        if let Some(parent) = parent {
            query.push_str(&format!(" and '{}' in parents", escape_query_value(parent)));
        }

        let matches = self.query_files(token, &query, None).await?;
        if let Some(found) = matches.into_iter().next() {
            let entry = found.into_folder_entry()?;
            return Ok(entry.id);
        }

        tracing::debug!(folder = name, "creating missing drive folder");
        let parents: Vec<&str> = parent.into_iter().collect();
        let body = serde_json::json!({
            "name": name,
            "mimeType": FOLDER_MIME_TYPE,
            "parents": parents,
        });
        let response = self
            .send(
                self.client
                    .post(format!("{}/files", self.api_base_url))
                    .bearer_auth(token.as_str())
                    .json(&body),
            )
            .await?;
        let created = parse_json::<DriveFile>(response).await?;
        let entry = created.into_folder_entry()?;
        Ok(entry.id)
    }

    async fn list_subfolders(&self, token: &AccessToken, parent: &str) -> Result<Vec<FolderEntry>> {
        let query = format!(
            "'{}' in parents and mimeType='{FOLDER_MIME_TYPE}' and trashed=false",
            escape_query_value(parent)
        );
        self.query_files(token, &query, None)
            .await?
            .into_iter()
            .map(DriveFile::into_folder_entry)
            .collect()
    }

    async fn list_image_files(&self, token: &AccessToken, parent: &str) -> Result<Vec<FileEntry>> {
        let query = format!(
            "'{}' in parents and mimeType contains 'image/' and trashed=false",
            escape_query_value(parent)
        );
        self.query_files(token, &query, Some(FILE_LIST_FIELDS))
            .await?
            .into_iter()
            .map(DriveFile::into_file_entry)
            .collect()
    }

    async fn upload_file(
        &self,
        token: &AccessToken,
        parent: &str,
        upload: NewUpload,
        description: &str,
    ) -> Result<FileEntry> {
        let metadata = serde_json::json!({
            "name": upload.filename,
            "mimeType": upload.mime_type,
            "parents": [parent],
            "description": description,
        });

        let metadata_part = reqwest::multipart::Part::text(metadata.to_string())
            .mime_str("application/json")
            .map_err(|error| Error::InvalidInput(error.to_string()))?;
        let file_part = reqwest::multipart::Part::bytes(upload.bytes)
            .file_name(upload.filename.clone())
            .mime_str(&upload.mime_type)
            .map_err(|error| Error::InvalidInput(format!("invalid mime type: {error}")))?;
        let form = reqwest::multipart::Form::new()
            .part("metadata", metadata_part)
            .part("file", file_part);

        let url = format!(
            "{}/files?uploadType=multipart&fields={}",
            self.upload_base_url,
            urlencoding::encode(UPLOAD_FIELDS)
        );
        let response = self
            .send(
                self.client
                    .post(url)
                    .bearer_auth(token.as_str())
                    .multipart(form),
            )
            .await?;
        let created = parse_json::<DriveFile>(response).await?;
        created.into_file_entry()
    }

    async fn rename_folder(&self, token: &AccessToken, folder_id: &str, name: &str) -> Result<()> {
        self.patch_metadata(token, folder_id, &serde_json::json!({ "name": name }))
            .await
    }

    async fn update_file_description(
        &self,
        token: &AccessToken,
        file_id: &str,
        description: &str,
    ) -> Result<()> {
        self.patch_metadata(
            token,
            file_id,
            &serde_json::json!({ "description": description }),
        )
        .await
    }

    async fn trash_file(&self, token: &AccessToken, file_id: &str) -> Result<()> {
        self.patch_metadata(token, file_id, &serde_json::json!({ "trashed": true }))
            .await
    }

    async fn trash_folder(&self, token: &AccessToken, folder_id: &str) -> Result<()> {
        self.patch_metadata(token, folder_id, &serde_json::json!({ "trashed": true }))
            .await
    }
}

async fn check_status(response: Response) -> Result<Response> {
    let status = response.status();
    if status == StatusCode::UNAUTHORIZED {
        return Err(Error::Unauthorized(format!("HTTP {}", status.as_u16())));
    }
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(Error::RemoteUnavailable(format!(
            "drive API returned HTTP {}: {}",
            status.as_u16(),
            compact_text(&body)
        )));
    }
    Ok(response)
}

async fn parse_json<T: serde::de::DeserializeOwned>(response: Response) -> Result<T> {
    let body = response
        .text()
        .await
        .map_err(|error| Error::from_transport(&error))?;
    serde_json::from_str(&body)
        .map_err(|error| Error::MalformedResponse(format!("{error}: {}", compact_text(&body))))
}

/// Escape a value embedded in a drive attribute query.
fn escape_query_value(value: &str) -> String {
    value.replace('\\', "\\\\").replace('\'', "\\'")
}

fn normalize_base_url(raw: String) -> Result<String> {
    let base = raw.trim().trim_end_matches('/').to_string();
    if !is_http_url(&base) {
        return Err(Error::InvalidInput(
            "API base URL must include http:// or https://".to_string(),
        ));
    }
    Ok(base)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DriveFileList {
    files: Option<Vec<DriveFile>>,
}

/// Loosely-shaped file resource as the provider returns it. Validated into
/// the required domain shape at the boundary; payloads missing required
/// fields are rejected as [`Error::MalformedResponse`].
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DriveFile {
    id: Option<String>,
    name: Option<String>,
    description: Option<String>,
    created_time: Option<String>,
    thumbnail_link: Option<String>,
    web_content_link: Option<String>,
}

impl DriveFile {
    fn into_folder_entry(self) -> Result<FolderEntry> {
        let id = require(self.id, "id")?;
        let name = require(self.name, "name")?;
        Ok(FolderEntry { id, name })
    }

    fn into_file_entry(self) -> Result<FileEntry> {
        let id = require(self.id, "id")?;
        let created_time = require(self.created_time, "createdTime")?;
        let created_at = DateTime::parse_from_rfc3339(&created_time)
            .map_err(|error| {
                Error::MalformedResponse(format!("bad createdTime '{created_time}': {error}"))
            })?
            .timestamp_millis();

        // Prefer an upscaled preview; fall back to the raw download link.
        let image_url = self
            .thumbnail_link
            .map(|link| link.replace("=s220", "=s1000"))
            .or(self.web_content_link)
            .ok_or_else(|| {
                Error::MalformedResponse(format!("file {id} has no preview or download link"))
            })?;

        Ok(FileEntry {
            name: self.name.unwrap_or_default(),
            description: self.description.unwrap_or_default(),
            id,
            created_at,
            image_url,
        })
    }
}

fn require(value: Option<String>, field: &str) -> Result<String> {
    value
        .filter(|value| !value.trim().is_empty())
        .ok_or_else(|| Error::MalformedResponse(format!("file resource missing '{field}'")))
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn escape_query_value_handles_quotes() {
        assert_eq!(escape_query_value("O'Brien"), "O\\'Brien");
        assert_eq!(escape_query_value(r"a\b"), r"a\\b");
    }

    #[test]
    fn normalize_base_url_rejects_bare_host() {
        assert!(normalize_base_url("www.googleapis.com".to_string()).is_err());
        assert_eq!(
            normalize_base_url("https://api.example.com/".to_string()).unwrap(),
            "https://api.example.com"
        );
    }

    #[test]
    fn file_entry_requires_id_and_created_time() {
        let missing_id: DriveFile = serde_json::from_str(r#"{"name": "x.jpg"}"#).unwrap();
        assert!(matches!(
            missing_id.into_file_entry().unwrap_err(),
            Error::MalformedResponse(_)
        ));

        let missing_time: DriveFile =
            serde_json::from_str(r#"{"id": "f-1", "webContentLink": "https://x/f"}"#).unwrap();
        assert!(missing_time.into_file_entry().is_err());
    }

    #[test]
    fn file_entry_upscales_thumbnail_link() {
        let file: DriveFile = serde_json::from_str(
            r#"{
                "id": "f-1",
                "name": "Moment_1.jpg",
                "description": "Sunset",
                "createdTime": "2025-08-15T12:00:00.000Z",
                "thumbnailLink": "https://lh3.example.com/f-1=s220"
            }"#,
        )
        .unwrap();

        let entry = file.into_file_entry().unwrap();
        assert_eq!(entry.image_url, "https://lh3.example.com/f-1=s1000");
        assert_eq!(entry.description, "Sunset");
        assert_eq!(entry.created_at, 1_755_259_200_000);
    }

    #[test]
    fn file_entry_falls_back_to_download_link() {
        let file: DriveFile = serde_json::from_str(
            r#"{
                "id": "f-2",
                "createdTime": "2025-08-15T12:00:00Z",
                "webContentLink": "https://drive.example.com/f-2"
            }"#,
        )
        .unwrap();

        let entry = file.into_file_entry().unwrap();
        assert_eq!(entry.image_url, "https://drive.example.com/f-2");
    }

    #[test]
    fn file_entry_without_any_link_is_malformed() {
        let file: DriveFile =
            serde_json::from_str(r#"{"id": "f-3", "createdTime": "2025-08-15T12:00:00Z"}"#)
                .unwrap();
        assert!(matches!(
            file.into_file_entry().unwrap_err(),
            Error::MalformedResponse(_)
        ));
    }

    #[test]
    fn folder_entry_requires_name() {
        let folder: DriveFile = serde_json::from_str(r#"{"id": "d-1"}"#).unwrap();
        assert!(folder.into_folder_entry().is_err());
    }

    #[test]
    fn file_list_tolerates_missing_files_array() {
        let list: DriveFileList = serde_json::from_str("{}").unwrap();
        assert!(list.files.is_none());
    }
}
