pub mod auth_cmd;
pub mod common;
pub mod groups;
pub mod posts;
