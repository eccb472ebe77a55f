use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(name = "moments")]
#[command(about = "Share photo moments with a group, backed by a cloud drive folder")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Run against a local on-disk drive instead of the remote provider
    #[arg(long, global = true)]
    pub demo: bool,

    /// Optional path to the local state file
    #[arg(long, global = true, value_name = "PATH")]
    pub store_path: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Sign in with a provider access token
    Login {
        /// Access token (falls back to MOMENTS_ACCESS_TOKEN)
        #[arg(long, value_name = "TOKEN")]
        token: Option<String>,
        /// Remember the signed-in identity across sessions (never the token)
        #[arg(long)]
        remember: bool,
    },
    /// Sign out and clear the remembered identity
    Logout,
    /// Show the signed-in identity
    Whoami {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Manage shared groups
    Groups {
        #[command(subcommand)]
        command: GroupCommands,
    },
    /// Manage a group's member list
    Members {
        #[command(subcommand)]
        command: MemberCommands,
    },
    /// Browse a group's feed
    Posts {
        #[command(subcommand)]
        command: PostCommands,
    },
    /// Upload images to a group as new posts
    Post {
        /// Group name
        group: String,
        /// Image files to upload
        #[arg(required = true, value_name = "IMAGE")]
        images: Vec<PathBuf>,
        /// Caption applied to every uploaded image
        #[arg(long, default_value = "")]
        caption: String,
    },
    /// Edit a post's caption
    Caption {
        /// Group name
        group: String,
        /// Post ID or unique ID prefix
        post: String,
        /// New caption
        caption: String,
    },
    /// Delete a post
    DeletePost {
        /// Group name
        group: String,
        /// Post ID or unique ID prefix
        post: String,
    },
    /// Generate shell completion scripts
    Completions {
        /// Target shell
        #[arg(value_enum)]
        shell: CompletionShell,
        /// Optional output path (stdout when omitted)
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
pub enum GroupCommands {
    /// List groups under the shared root
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Create a new group
    Create {
        /// Group name
        name: String,
    },
    /// Rename a group (host only)
    Rename {
        /// Current group name
        name: String,
        /// New group name
        new_name: String,
    },
    /// Delete a group and its posts (host only)
    Delete {
        /// Group name
        name: String,
    },
    /// Leave a group (non-host members)
    Leave {
        /// Group name
        name: String,
    },
}

#[derive(Subcommand)]
pub enum MemberCommands {
    /// List a group's members
    List {
        /// Group name
        group: String,
    },
    /// Add a member email to a group
    Add {
        /// Group name
        group: String,
        /// Member email
        email: String,
    },
    /// Remove a member email from a group
    Remove {
        /// Group name
        group: String,
        /// Member email
        email: String,
    },
}

#[derive(Subcommand)]
pub enum PostCommands {
    /// List a group's posts, newest first, grouped by month
    List {
        /// Group name
        group: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum CompletionShell {
    Bash,
    Zsh,
    Fish,
}
