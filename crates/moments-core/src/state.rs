//! Application state container.
//!
//! One struct with named mutation entry points replaces the scattered
//! per-screen setters of older builds. The remote store stays the source of
//! truth; everything here is the last-synced snapshot.
//!
//! This container serves long-lived frontends that keep one session alive
//! across screen changes. The bundled CLI is per-invocation and re-reads the
//! remote listing each run, so it does not hold one.

use crate::models::{Group, Identity, Post};

/// The three screens of the app, linear with backward transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Auth,
    GroupSelection,
    MainFeed,
}

/// Ticket tying an in-flight sync to the navigation state that issued it.
/// Responses presenting a stale ticket are discarded, never applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncTicket(u64);

#[derive(Debug)]
pub struct AppState {
    screen: Screen,
    identity: Option<Identity>,
    groups: Vec<Group>,
    current_group: Option<Group>,
    posts: Vec<Post>,
    generation: u64,
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

impl AppState {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            screen: Screen::Auth,
            identity: None,
            groups: Vec::new(),
            current_group: None,
            posts: Vec::new(),
            generation: 0,
        }
    }

    #[must_use]
    pub const fn screen(&self) -> Screen {
        self.screen
    }

    #[must_use]
    pub const fn identity(&self) -> Option<&Identity> {
        self.identity.as_ref()
    }

    #[must_use]
    pub fn groups(&self) -> &[Group] {
        &self.groups
    }

    #[must_use]
    pub const fn current_group(&self) -> Option<&Group> {
        self.current_group.as_ref()
    }

    #[must_use]
    pub fn posts(&self) -> &[Post] {
        &self.posts
    }

    /// Issue a ticket for a sync that is about to start. Any later
    /// navigation invalidates it.
    pub const fn begin_sync(&self) -> SyncTicket {
        SyncTicket(self.generation)
    }

    pub fn signed_in(&mut self, identity: Identity) {
        self.identity = Some(identity);
        self.screen = Screen::GroupSelection;
        self.bump();
    }

    pub fn signed_out(&mut self) {
        *self = Self {
            generation: self.generation + 1,
            ..Self::new()
        };
    }

    /// Credential rejected by the provider: clear the session and return to
    /// the auth screen.
    pub fn unauthorized(&mut self) {
        tracing::warn!("credential rejected; clearing session");
        self.signed_out();
    }

    /// Apply a finished group sync. Returns `false` (and changes nothing)
    /// when the ticket is stale.
    pub fn groups_loaded(&mut self, ticket: SyncTicket, groups: Vec<Group>) -> bool {
        if ticket.0 != self.generation {
            tracing::debug!("discarding stale group sync");
            return false;
        }
        self.groups = groups;
        true
    }

    pub fn group_created(&mut self, group: Group) {
        self.groups.push(group.clone());
        self.select_group(group);
    }

    pub fn select_group(&mut self, group: Group) {
        self.current_group = Some(group);
        self.posts.clear();
        self.screen = Screen::MainFeed;
        self.bump();
    }

    /// Back out to the group picker, dropping the feed snapshot.
    pub fn change_group(&mut self) {
        self.current_group = None;
        self.posts.clear();
        self.screen = Screen::GroupSelection;
        self.bump();
    }

    pub fn group_renamed(&mut self, renamed: &Group) {
        if let Some(existing) = self.groups.iter_mut().find(|group| group.id == renamed.id) {
            *existing = renamed.clone();
        }
        if self
            .current_group
            .as_ref()
            .is_some_and(|group| group.id == renamed.id)
        {
            self.current_group = Some(renamed.clone());
        }
    }

    /// Remove a group (deleted or left). Falls back to the picker when the
    /// removed group was selected.
    pub fn group_removed(&mut self, group_id: &str) {
        self.groups.retain(|group| group.id != group_id);
        if self
            .current_group
            .as_ref()
            .is_some_and(|group| group.id == group_id)
        {
            self.change_group();
        }
    }

    /// Apply a finished post sync. Returns `false` when the ticket is stale.
    pub fn posts_loaded(&mut self, ticket: SyncTicket, posts: Vec<Post>) -> bool {
        if ticket.0 != self.generation {
            tracing::debug!("discarding stale post sync");
            return false;
        }
        self.posts = posts;
        true
    }

    /// Prepend freshly uploaded posts, newest first.
    pub fn posts_added(&mut self, new_posts: Vec<Post>) {
        for post in new_posts.into_iter().rev() {
            self.posts.insert(0, post);
        }
    }

    pub fn post_edited(&mut self, edited: &Post) {
        if let Some(existing) = self.posts.iter_mut().find(|post| post.id == edited.id) {
            *existing = edited.clone();
        }
    }

    pub fn post_removed(&mut self, post_id: &str) {
        self.posts.retain(|post| post.id != post_id);
    }

    fn bump(&mut self) {
        self.generation += 1;
    }
}
