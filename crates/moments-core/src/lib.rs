//! moments-core - Core library for Shared Moments
//!
//! This crate contains the shared models, drive gateway, and sync logic used
//! by all Shared Moments interfaces. Groups are cloud drive folders under a
//! well-known root; posts are image files inside a group's folder.

pub mod auth;
pub mod directory;
pub mod drive;
pub mod error;
pub mod feed;
pub mod models;
pub mod state;
pub mod store;
pub mod util;

pub use error::{Error, Result};
pub use models::{AccessToken, Group, Identity, Post};
