use std::env;
use std::path::{Path, PathBuf};

use chrono::Utc;
use moments_core::auth::{AuthClient, SessionPersistence};
use moments_core::directory::GroupDirectory;
use moments_core::drive::{
    DriveGateway, FileEntry, FolderEntry, FolderGateway, LocalDriveStore, NewUpload,
};
use moments_core::feed::PostFeed;
use moments_core::models::{AccessToken, Group, Identity, Post};
use moments_core::store::FileStore;
use serde::{Deserialize, Serialize};

use crate::error::CliError;
use crate::session::{FileSessionStore, KeyringSessionStore, SessionStore};

const ACCESS_TOKEN_ENV: &str = "MOMENTS_ACCESS_TOKEN";
const STORE_PATH_ENV: &str = "MOMENTS_STORE_PATH";

const DEMO_TOKEN: &str = "demo";

/// Extra member emails saved locally per group folder. The membership list
/// is cosmetic: the provider has no sharing call behind it.
fn members_key(group: &Group) -> String {
    format!("members:{}", group.folder_id)
}

fn host_key(group: &Group) -> String {
    format!("host:{}", group.folder_id)
}

/// Locally recorded creator of a group folder. Folder listings cannot say
/// who created a folder, so the record written at creation time is the only
/// host signal the directory has.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HostRecord {
    pub id: String,
    pub email: String,
}

/// Gateway picked for the current invocation: the provider's HTTP API, or
/// the on-disk stand-in in demo mode.
#[derive(Debug, Clone)]
pub enum Gateway {
    Remote(DriveGateway),
    Demo(LocalDriveStore),
}

impl FolderGateway for Gateway {
    async fn find_or_create_folder(
        &self,
        token: &AccessToken,
        parent: Option<&str>,
        name: &str,
    ) -> moments_core::Result<String> {
        match self {
            Self::Remote(gateway) => gateway.find_or_create_folder(token, parent, name).await,
            Self::Demo(store) => store.find_or_create_folder(token, parent, name).await,
        }
    }

    async fn list_subfolders(
        &self,
        token: &AccessToken,
        parent: &str,
    ) -> moments_core::Result<Vec<FolderEntry>> {
        match self {
            Self::Remote(gateway) => gateway.list_subfolders(token, parent).await,
            Self::Demo(store) => store.list_subfolders(token, parent).await,
        }
    }

    async fn list_image_files(
        &self,
        token: &AccessToken,
        parent: &str,
    ) -> moments_core::Result<Vec<FileEntry>> {
        match self {
            Self::Remote(gateway) => gateway.list_image_files(token, parent).await,
            Self::Demo(store) => store.list_image_files(token, parent).await,
        }
    }

    async fn upload_file(
        &self,
        token: &AccessToken,
        parent: &str,
        upload: NewUpload,
        description: &str,
    ) -> moments_core::Result<FileEntry> {
        match self {
            Self::Remote(gateway) => gateway.upload_file(token, parent, upload, description).await,
            Self::Demo(store) => store.upload_file(token, parent, upload, description).await,
        }
    }

    async fn rename_folder(
        &self,
        token: &AccessToken,
        folder_id: &str,
        name: &str,
    ) -> moments_core::Result<()> {
        match self {
            Self::Remote(gateway) => gateway.rename_folder(token, folder_id, name).await,
            Self::Demo(store) => store.rename_folder(token, folder_id, name).await,
        }
    }

    async fn update_file_description(
        &self,
        token: &AccessToken,
        file_id: &str,
        description: &str,
    ) -> moments_core::Result<()> {
        match self {
            Self::Remote(gateway) => {
                gateway.update_file_description(token, file_id, description).await
            }
            Self::Demo(store) => store.update_file_description(token, file_id, description).await,
        }
    }

    async fn trash_file(&self, token: &AccessToken, file_id: &str) -> moments_core::Result<()> {
        match self {
            Self::Remote(gateway) => gateway.trash_file(token, file_id).await,
            Self::Demo(store) => store.trash_file(token, file_id).await,
        }
    }

    async fn trash_folder(
        &self,
        token: &AccessToken,
        folder_id: &str,
    ) -> moments_core::Result<()> {
        match self {
            Self::Remote(gateway) => gateway.trash_folder(token, folder_id).await,
            Self::Demo(store) => store.trash_folder(token, folder_id).await,
        }
    }
}

/// Per-invocation wiring: mode flags plus the resolved local state path.
pub struct CliContext {
    pub demo: bool,
    pub store_path: PathBuf,
}

impl CliContext {
    pub fn from_cli(demo: bool, store_path: Option<PathBuf>) -> Result<Self, CliError> {
        let store_path = match store_path.or_else(|| env::var_os(STORE_PATH_ENV).map(PathBuf::from))
        {
            Some(path) => path,
            None => default_store_path()?,
        };
        Ok(Self { demo, store_path })
    }

    pub fn file_store(&self) -> Result<FileStore, CliError> {
        Ok(FileStore::open(&self.store_path)?)
    }

    pub fn gateway(&self) -> Result<Gateway, CliError> {
        if self.demo {
            tracing::info!(store = %self.store_path.display(), "demo mode: using the local drive store");
            Ok(Gateway::Demo(LocalDriveStore::new(self.file_store()?)))
        } else {
            Ok(Gateway::Remote(DriveGateway::new()?))
        }
    }

    pub fn session_store(&self) -> Result<SessionStore, CliError> {
        if self.demo {
            Ok(SessionStore::File(FileSessionStore::new(self.file_store()?)))
        } else {
            Ok(SessionStore::Keyring(KeyringSessionStore::default()))
        }
    }

    /// Session credential for remote calls. Demo mode uses a synthetic token
    /// that the local stand-in ignores.
    pub fn resolve_token(&self) -> Result<AccessToken, CliError> {
        if self.demo {
            return Ok(AccessToken::new(DEMO_TOKEN));
        }
        env::var(ACCESS_TOKEN_ENV)
            .ok()
            .map(|raw| raw.trim().to_string())
            .filter(|raw| !raw.is_empty())
            .map(AccessToken::new)
            .ok_or(CliError::NotAuthenticated)
    }

    /// Identity behind the current invocation: the remembered identity when
    /// one exists, otherwise resolved from the provider (or synthesized in
    /// demo mode).
    pub async fn resolve_identity(&self, token: &AccessToken) -> Result<Identity, CliError> {
        if let Some(stored) = self.session_store()?.load()? {
            return Ok(stored.into_identity(Some(token.clone())));
        }
        if self.demo {
            return Ok(demo_identity());
        }
        Ok(AuthClient::new()?.fetch_identity(token).await?)
    }
}

/// Built-in identity for demo mode, where no provider is reachable.
#[must_use]
pub fn demo_identity() -> Identity {
    Identity {
        id: "demo-user".to_string(),
        email: "demo@localhost".to_string(),
        name: "Demo".to_string(),
        photo_url: None,
        access_token: Some(AccessToken::new(DEMO_TOKEN)),
    }
}

fn default_store_path() -> Result<PathBuf, CliError> {
    Ok(dirs::data_dir()
        .ok_or(CliError::NoDataDir)?
        .join("moments")
        .join("state.json"))
}

/// Overlay the locally saved host record and member list onto a freshly
/// synced group. Syncing names the invoking identity as host by default;
/// when the host record marks someone else (a group this user joined rather
/// than created), the record wins.
pub fn apply_membership(store: &FileStore, group: &mut Group) -> Result<(), CliError> {
    if let Some(host) = store.get::<HostRecord>(&host_key(group))? {
        group.host_id = host.id;
        if let Some(first) = group.member_emails.first_mut() {
            *first = host.email;
        }
    }
    if let Some(extra) = store.get::<Vec<String>>(&members_key(group))? {
        for email in extra {
            if !group.member_emails.contains(&email) {
                group.member_emails.push(email);
            }
        }
    }
    Ok(())
}

/// Record the given identity as the group's host.
pub fn persist_host(store: &FileStore, group: &Group, host: &Identity) -> Result<(), CliError> {
    store.put(
        &host_key(group),
        &HostRecord {
            id: host.id.clone(),
            email: host.email.clone(),
        },
    )?;
    Ok(())
}

/// Save the group's non-host member emails locally.
pub fn persist_membership(store: &FileStore, group: &Group) -> Result<(), CliError> {
    let extra: Vec<&String> = group.member_emails.iter().skip(1).collect();
    store.put(&members_key(group), &extra)?;
    Ok(())
}

/// Drop the locally saved host and member records, used when the group
/// itself goes away.
pub fn clear_membership(store: &FileStore, group: &Group) -> Result<(), CliError> {
    store.remove(&members_key(group))?;
    store.remove(&host_key(group))?;
    Ok(())
}

/// Sync the directory and resolve one group by exact name.
pub async fn find_group(
    context: &CliContext,
    gateway: &Gateway,
    token: &AccessToken,
    identity: &Identity,
    name: &str,
) -> Result<Group, CliError> {
    let groups = GroupDirectory::new(gateway.clone())
        .bootstrap(token, identity)
        .await?;
    let mut group = groups
        .into_iter()
        .find(|group| group.name == name)
        .ok_or_else(|| CliError::GroupNotFound(name.to_string()))?;
    apply_membership(&context.file_store()?, &mut group)?;
    Ok(group)
}

/// Sync the feed and resolve one post by exact id or unique id prefix.
pub async fn resolve_post(
    gateway: &Gateway,
    token: &AccessToken,
    identity: &Identity,
    group: &Group,
    post_query: &str,
) -> Result<Post, CliError> {
    let posts = PostFeed::new(gateway.clone()).sync(token, identity, group).await?;

    if let Some(exact) = posts.iter().find(|post| post.id == post_query) {
        return Ok(exact.clone());
    }

    let matching: Vec<&Post> = posts
        .iter()
        .filter(|post| post.id.starts_with(post_query))
        .collect();
    match matching.len() {
        0 => Err(CliError::PostNotFound(post_query.to_string())),
        1 => Ok(matching[0].clone()),
        _ => {
            let options = matching
                .iter()
                .take(3)
                .map(|post| short_id(&post.id))
                .collect::<Vec<_>>()
                .join(", ");
            Err(CliError::AmbiguousPostId(format!(
                "ID prefix '{post_query}' is ambiguous; matches: {options}"
            )))
        }
    }
}

#[derive(Debug, Serialize)]
pub struct GroupItem {
    pub id: String,
    pub name: String,
    pub path: String,
    pub host_email: Option<String>,
    pub member_emails: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct PostItem {
    pub id: String,
    pub author_id: String,
    pub group_id: String,
    pub image_url: String,
    pub caption: String,
    pub created_at: i64,
    pub month: String,
    pub relative_time: String,
}

pub fn group_to_item(group: &Group) -> GroupItem {
    GroupItem {
        id: group.id.clone(),
        name: group.name.clone(),
        path: group.path.clone(),
        host_email: group.host_email().map(ToString::to_string),
        member_emails: group.member_emails.clone(),
    }
}

pub fn post_to_item(post: &Post) -> PostItem {
    let now_ms = Utc::now().timestamp_millis();
    PostItem {
        id: post.id.clone(),
        author_id: post.author_id.clone(),
        group_id: post.group_id.clone(),
        image_url: post.image_url.clone(),
        caption: post.caption.clone(),
        created_at: post.created_at,
        month: post.month_label(),
        relative_time: format_relative_time(post.created_at, now_ms),
    }
}

pub fn format_group_lines(groups: &[Group]) -> Vec<String> {
    groups
        .iter()
        .map(|group| {
            format!(
                "{:<13}  {:<24}  {} member(s)",
                short_id(&group.id),
                group.name,
                group.member_emails.len()
            )
        })
        .collect()
}

/// Render the feed the way the main screen shows it: one section per
/// month-year, newest first, posts newest first inside each section.
pub fn format_feed_lines(sections: &[(String, Vec<Post>)]) -> Vec<String> {
    let now_ms = Utc::now().timestamp_millis();
    let mut lines = Vec::new();
    for (label, posts) in sections {
        lines.push(format!("{label}:"));
        for post in posts {
            lines.push(format!(
                "  {:<13}  {:<40}  {}",
                short_id(&post.id),
                caption_preview(&post.caption, 40),
                format_relative_time(post.created_at, now_ms)
            ));
        }
    }
    lines
}

pub fn short_id(id: &str) -> String {
    id.chars().take(13).collect()
}

pub fn caption_preview(caption: &str, max_chars: usize) -> String {
    let first_line = caption.lines().next().unwrap_or("").trim();
    let collapsed = first_line.split_whitespace().collect::<Vec<_>>().join(" ");

    if collapsed.chars().count() <= max_chars {
        collapsed
    } else {
        let take_len = max_chars.saturating_sub(3);
        let mut truncated = collapsed.chars().take(take_len).collect::<String>();
        truncated.push_str("...");
        truncated
    }
}

pub fn format_relative_time(timestamp_ms: i64, now_ms: i64) -> String {
    let diff = now_ms.saturating_sub(timestamp_ms);
    let minute = 60_000;
    let hour = 60 * minute;
    let day = 24 * hour;
    let week = 7 * day;
    let month = 30 * day;
    let year = 365 * day;

    if diff < minute {
        "just now".to_string()
    } else if diff < hour {
        format!("{}m ago", diff / minute)
    } else if diff < day {
        format!("{}h ago", diff / hour)
    } else if diff < week {
        format!("{}d ago", diff / day)
    } else if diff < month {
        format!("{}w ago", diff / week)
    } else if diff < year {
        format!("{}mo ago", diff / month)
    } else {
        format!("{}y ago", diff / year)
    }
}

/// Read an image file into an upload payload, keeping the original filename.
pub fn read_image_upload(path: &Path) -> Result<NewUpload, CliError> {
    let mime_type = mime_for_extension(path)?;
    let bytes = std::fs::read(path)?;
    let filename = path
        .file_name()
        .map_or_else(
            || format!("Moment_{}.jpg", Utc::now().timestamp_millis()),
            |name| name.to_string_lossy().into_owned(),
        );
    Ok(NewUpload {
        bytes,
        mime_type: mime_type.to_string(),
        filename,
    })
}

fn mime_for_extension(path: &Path) -> Result<&'static str, CliError> {
    let extension = path
        .extension()
        .map(|extension| extension.to_string_lossy().to_lowercase());
    match extension.as_deref() {
        Some("jpg" | "jpeg") => Ok("image/jpeg"),
        Some("png") => Ok("image/png"),
        Some("gif") => Ok("image/gif"),
        Some("webp") => Ok("image/webp"),
        Some("heic") => Ok("image/heic"),
        _ => Err(CliError::UnsupportedImage(path.display().to_string())),
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn demo_context() -> (tempfile::TempDir, CliContext) {
        let dir = tempfile::tempdir().unwrap();
        let context = CliContext {
            demo: true,
            store_path: dir.path().join("state.json"),
        };
        (dir, context)
    }

    #[test]
    fn mime_for_extension_covers_image_types_case_insensitively() {
        assert_eq!(mime_for_extension(Path::new("a.JPG")).unwrap(), "image/jpeg");
        assert_eq!(mime_for_extension(Path::new("a.png")).unwrap(), "image/png");
        assert!(mime_for_extension(Path::new("a.txt")).is_err());
        assert!(mime_for_extension(Path::new("noext")).is_err());
    }

    #[test]
    fn caption_preview_collapses_and_truncates() {
        assert_eq!(caption_preview("  two   words \nsecond line", 40), "two words");
        assert_eq!(
            caption_preview("A very long caption that keeps going on", 20),
            "A very long capti..."
        );
    }

    #[test]
    fn format_relative_time_units() {
        let now = 10_000_000;
        assert_eq!(format_relative_time(now - 30_000, now), "just now");
        assert_eq!(format_relative_time(now - 120_000, now), "2m ago");
        assert_eq!(format_relative_time(now - 2 * 60 * 60_000, now), "2h ago");
    }

    #[test]
    fn host_record_overlay_reassigns_the_host() {
        let (_dir, context) = demo_context();
        let store = context.file_store().unwrap();

        let group = Group::from_folder("f-1", "Trip", &demo_identity());
        let owner = Identity {
            id: "u-owner".to_string(),
            email: "owner@x.com".to_string(),
            name: "Owner".to_string(),
            photo_url: None,
            access_token: None,
        };
        persist_host(&store, &group, &owner).unwrap();

        let mut resynced = Group::from_folder("f-1", "Trip", &demo_identity());
        apply_membership(&store, &mut resynced).unwrap();
        assert_eq!(resynced.host_id, "u-owner");
        assert_eq!(resynced.host_email(), Some("owner@x.com"));
        assert!(!resynced.is_host(&demo_identity()));
    }

    #[test]
    fn membership_overlay_round_trips() {
        let (_dir, context) = demo_context();
        let store = context.file_store().unwrap();
        let mut group = Group::from_folder("f-1", "Trip", &demo_identity());

        group.member_emails.push("bob@x.com".to_string());
        persist_membership(&store, &group).unwrap();

        let mut resynced = Group::from_folder("f-1", "Trip", &demo_identity());
        apply_membership(&store, &mut resynced).unwrap();
        assert_eq!(
            resynced.member_emails,
            vec!["demo@localhost".to_string(), "bob@x.com".to_string()]
        );
    }

    #[tokio::test]
    async fn find_group_matches_exact_name_only() {
        let (_dir, context) = demo_context();
        let gateway = context.gateway().unwrap();
        let token = context.resolve_token().unwrap();
        let identity = demo_identity();

        GroupDirectory::new(gateway.clone())
            .create(&token, &identity, "Trip")
            .await
            .unwrap();

        let found = find_group(&context, &gateway, &token, &identity, "Trip")
            .await
            .unwrap();
        assert_eq!(found.name, "Trip");

        let missing = find_group(&context, &gateway, &token, &identity, "Tri")
            .await
            .unwrap_err();
        assert!(matches!(missing, CliError::GroupNotFound(_)));
    }

    #[tokio::test]
    async fn resolve_post_accepts_unique_prefix_and_rejects_ambiguity() {
        let (_dir, context) = demo_context();
        let gateway = context.gateway().unwrap();
        let token = context.resolve_token().unwrap();
        let identity = demo_identity();

        let group = GroupDirectory::new(gateway.clone())
            .create(&token, &identity, "Trip")
            .await
            .unwrap();
        let feed = PostFeed::new(gateway.clone());
        let created = feed
            .create(
                &token,
                &identity,
                &group,
                vec![
                    NewUpload {
                        bytes: vec![1],
                        mime_type: "image/jpeg".to_string(),
                        filename: "a.jpg".to_string(),
                    },
                    NewUpload {
                        bytes: vec![2],
                        mime_type: "image/jpeg".to_string(),
                        filename: "b.jpg".to_string(),
                    },
                ],
                "",
            )
            .await
            .unwrap();

        let exact = resolve_post(&gateway, &token, &identity, &group, &created[0].id)
            .await
            .unwrap();
        assert_eq!(exact.id, created[0].id);

        // Uuid v7 ids share a timestamp prefix, so a short shared prefix is
        // ambiguous while the full id is unique.
        let shared_prefix: String = created[0].id.chars().take(4).collect();
        let ambiguous = resolve_post(&gateway, &token, &identity, &group, &shared_prefix)
            .await
            .unwrap_err();
        assert!(matches!(ambiguous, CliError::AmbiguousPostId(_)));

        let missing = resolve_post(&gateway, &token, &identity, &group, "zzzz")
            .await
            .unwrap_err();
        assert!(matches!(missing, CliError::PostNotFound(_)));
    }

    #[test]
    fn format_feed_lines_renders_month_sections() {
        let posts = vec![Post {
            id: "p-1".to_string(),
            author_id: "u".to_string(),
            group_id: "g".to_string(),
            image_url: "local://p-1".to_string(),
            caption: "Sunset".to_string(),
            created_at: Utc::now().timestamp_millis(),
        }];
        let sections = moments_core::models::group_by_month(&posts);
        let lines = format_feed_lines(&sections);

        assert_eq!(lines.len(), 2);
        assert!(lines[0].ends_with(':'));
        assert!(lines[1].contains("Sunset"));
        assert!(lines[1].contains("just now"));
    }
}
