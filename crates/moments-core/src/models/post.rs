//! Post model: a shared image with a caption, backed by one drive file.

use chrono::{TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// A single shared moment.
///
/// One post maps to exactly one remote file; the caption is stored in the
/// file's description field. Value object rebuilt from the remote listing
/// on every sync.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    /// Remote file identifier
    pub id: String,
    pub author_id: String,
    pub group_id: String,
    /// Preview/download link for the image
    pub image_url: String,
    pub caption: String,
    /// Remote file creation time (Unix ms)
    pub created_at: i64,
}

impl Post {
    /// Feed section label for this post, e.g. `August 2026`.
    #[must_use]
    pub fn month_label(&self) -> String {
        Utc.timestamp_millis_opt(self.created_at)
            .single()
            .map_or_else(|| "Unknown".to_string(), |dt| dt.format("%B %Y").to_string())
    }
}

/// Group posts by calendar month-year for feed display.
///
/// Sections are ordered newest-first, and posts within a section are also
/// newest-first. The input order does not matter.
#[must_use]
pub fn group_by_month(posts: &[Post]) -> Vec<(String, Vec<Post>)> {
    let mut sorted = posts.to_vec();
    sorted.sort_by(|a, b| b.created_at.cmp(&a.created_at));

    let mut sections: Vec<(String, Vec<Post>)> = Vec::new();
    for post in sorted {
        let label = post.month_label();
        match sections.last_mut() {
            Some((current, bucket)) if *current == label => bucket.push(post),
            _ => sections.push((label, vec![post])),
        }
    }
    sections
}
