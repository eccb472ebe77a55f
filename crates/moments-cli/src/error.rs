use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Core(#[from] moments_core::Error),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
    #[error(
        "Not signed in. Run `moments login --token <TOKEN>` or set MOMENTS_ACCESS_TOKEN."
    )]
    NotAuthenticated,
    #[error("No group named '{0}'. Run `moments groups list` to see available groups.")]
    GroupNotFound(String),
    #[error("Post not found for id/prefix: {0}")]
    PostNotFound(String),
    #[error("{0}")]
    AmbiguousPostId(String),
    #[error("Cannot determine image type for '{0}' (expected jpg, png, gif, webp or heic)")]
    UnsupportedImage(String),
    #[error("Failed to resolve CLI data directory")]
    NoDataDir,
}

impl CliError {
    /// True when the provider rejected the session credential, which means
    /// the stored session should be cleared before surfacing the error.
    #[must_use]
    pub const fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Core(moments_core::Error::Unauthorized(_)))
    }
}
