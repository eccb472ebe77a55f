//! Post feed: derives posts from the image files in a group's folder and
//! writes every edit through to the remote store.

use crate::drive::{FileEntry, FolderGateway, NewUpload};
use crate::error::{Error, Result};
use crate::models::{AccessToken, Group, Identity, Post};
use crate::util::unix_timestamp_now_ms;

impl NewUpload {
    /// A JPEG payload named the way the compose flow names uploads.
    #[must_use]
    pub fn jpeg(bytes: Vec<u8>) -> Self {
        Self {
            bytes,
            mime_type: "image/jpeg".to_string(),
            filename: format!("Moment_{}.jpg", unix_timestamp_now_ms()),
        }
    }
}

/// Feed of posts for a selected group.
#[derive(Debug, Clone)]
pub struct PostFeed<G> {
    gateway: G,
}

impl<G: FolderGateway> PostFeed<G> {
    pub const fn new(gateway: G) -> Self {
        Self { gateway }
    }

    /// List the group's image files and rebuild the post snapshot,
    /// newest-first. The remote store does not record authorship, so posts
    /// are attributed to the syncing identity.
    pub async fn sync(
        &self,
        token: &AccessToken,
        identity: &Identity,
        group: &Group,
    ) -> Result<Vec<Post>> {
        let files = self
            .gateway
            .list_image_files(token, &group.folder_id)
            .await?;
        tracing::info!(group = %group.name, count = files.len(), "synced posts");

        let mut posts: Vec<Post> = files
            .into_iter()
            .map(|file| to_post(file, identity, group))
            .collect();
        posts.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(posts)
    }

    /// Upload each image as its own remote file carrying the caption as its
    /// description, producing one post per file. Uploads run sequentially;
    /// the first failure aborts the rest and surfaces to the caller.
    pub async fn create(
        &self,
        token: &AccessToken,
        identity: &Identity,
        group: &Group,
        images: Vec<NewUpload>,
        caption: &str,
    ) -> Result<Vec<Post>> {
        if images.is_empty() {
            return Err(Error::InvalidInput(
                "a post needs at least one image".to_string(),
            ));
        }

        let mut posts = Vec::with_capacity(images.len());
        for image in images {
            let uploaded = self
                .gateway
                .upload_file(token, &group.folder_id, image, caption)
                .await?;
            posts.push(to_post(uploaded, identity, group));
        }
        Ok(posts)
    }

    /// Write the new caption through to the remote file's description, then
    /// return the updated local record.
    pub async fn edit_caption(
        &self,
        token: &AccessToken,
        post: &Post,
        new_caption: &str,
    ) -> Result<Post> {
        self.gateway
            .update_file_description(token, &post.id, new_caption)
            .await?;

        let mut updated = post.clone();
        updated.caption = new_caption.to_string();
        Ok(updated)
    }

    /// Trash the post's remote file.
    pub async fn delete(&self, token: &AccessToken, post: &Post) -> Result<()> {
        self.gateway.trash_file(token, &post.id).await
    }
}

fn to_post(file: FileEntry, identity: &Identity, group: &Group) -> Post {
    Post {
        id: file.id,
        author_id: identity.id.clone(),
        group_id: group.id.clone(),
        image_url: file.image_url,
        caption: file.description,
        created_at: file.created_at,
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use crate::directory::GroupDirectory;
    use crate::drive::LocalDriveStore;
    use crate::models::group_by_month;
    use crate::store::FileStore;

    use super::*;

    struct Fixture {
        _dir: tempfile::TempDir,
        feed: PostFeed<LocalDriveStore>,
        alice: Identity,
        group: Group,
    }

    fn token() -> AccessToken {
        AccessToken::new("demo")
    }

    async fn fixture() -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::open(dir.path().join("drive.json")).unwrap();
        let drive = LocalDriveStore::new(store);

        let alice = Identity {
            id: "u-alice".to_string(),
            email: "alice@x.com".to_string(),
            name: "Alice".to_string(),
            photo_url: None,
            access_token: None,
        };
        let group = GroupDirectory::new(drive.clone())
            .create(&token(), &alice, "Trip")
            .await
            .unwrap();

        Fixture {
            _dir: dir,
            feed: PostFeed::new(drive),
            alice,
            group,
        }
    }

    fn image() -> NewUpload {
        NewUpload::jpeg(vec![0xFF, 0xD8, 0xFF])
    }

    #[tokio::test]
    async fn uploading_two_images_yields_two_posts_with_the_caption() {
        let fx = fixture().await;

        let created = fx
            .feed
            .create(
                &token(),
                &fx.alice,
                &fx.group,
                vec![image(), image()],
                "Sunset",
            )
            .await
            .unwrap();
        assert_eq!(created.len(), 2);

        let synced = fx.feed.sync(&token(), &fx.alice, &fx.group).await.unwrap();
        assert_eq!(synced.len(), 2);
        assert!(synced.iter().all(|post| post.caption == "Sunset"));
        assert!(synced.iter().all(|post| post.group_id == fx.group.id));
        assert!(synced.iter().all(|post| post.author_id == "u-alice"));
        // Most recently created first.
        assert!(synced[0].created_at > synced[1].created_at);
    }

    #[tokio::test]
    async fn sync_orders_descending_and_month_sections_follow() {
        let fx = fixture().await;
        fx.feed
            .create(
                &token(),
                &fx.alice,
                &fx.group,
                vec![image(), image(), image()],
                "",
            )
            .await
            .unwrap();

        let synced = fx.feed.sync(&token(), &fx.alice, &fx.group).await.unwrap();
        assert!(synced.windows(2).all(|w| w[0].created_at >= w[1].created_at));

        let sections = group_by_month(&synced);
        let flattened: Vec<&Post> = sections.iter().flat_map(|(_, posts)| posts).collect();
        assert!(flattened
            .windows(2)
            .all(|w| w[0].created_at >= w[1].created_at));
    }

    #[tokio::test]
    async fn create_with_no_images_is_rejected() {
        let fx = fixture().await;
        let error = fx
            .feed
            .create(&token(), &fx.alice, &fx.group, Vec::new(), "Sunset")
            .await
            .unwrap_err();
        assert!(matches!(error, Error::InvalidInput(_)));
    }

    #[tokio::test]
    async fn edit_caption_writes_through_to_the_remote_description() {
        let fx = fixture().await;
        let created = fx
            .feed
            .create(&token(), &fx.alice, &fx.group, vec![image()], "Before")
            .await
            .unwrap();

        let updated = fx
            .feed
            .edit_caption(&token(), &created[0], "After")
            .await
            .unwrap();
        assert_eq!(updated.caption, "After");

        // The edit must survive a full resync.
        let synced = fx.feed.sync(&token(), &fx.alice, &fx.group).await.unwrap();
        assert_eq!(synced[0].caption, "After");
    }

    #[tokio::test]
    async fn delete_removes_the_post_from_the_next_sync() {
        let fx = fixture().await;
        let created = fx
            .feed
            .create(&token(), &fx.alice, &fx.group, vec![image(), image()], "")
            .await
            .unwrap();

        fx.feed.delete(&token(), &created[0]).await.unwrap();

        let synced = fx.feed.sync(&token(), &fx.alice, &fx.group).await.unwrap();
        assert_eq!(synced.len(), 1);
        assert!(synced.iter().all(|post| post.id != created[0].id));
    }

    #[test]
    fn jpeg_upload_uses_the_compose_naming_scheme() {
        let upload = NewUpload::jpeg(vec![1, 2, 3]);
        assert!(upload.filename.starts_with("Moment_"));
        assert!(upload.filename.ends_with(".jpg"));
        assert_eq!(upload.mime_type, "image/jpeg");
    }
}
