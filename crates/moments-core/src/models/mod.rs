//! Domain models reconstructed from the remote store's listings.

mod group;
mod identity;
mod post;

pub use group::{Group, ROOT_FOLDER_NAME};
pub use identity::{AccessToken, Identity, StoredIdentity, IDENTITY_SCHEMA_VERSION};
pub use post::{group_by_month, Post};
