//! Run-scoped sets of already-seen user and video IDs.

use std::collections::HashSet;

#[derive(Debug, Default)]
pub struct Deduplicator {
    users: HashSet<String>,
    videos: HashSet<String>,
}

impl Deduplicator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if `id` was not seen before in this run.
    pub fn see_user(&mut self, id: &str) -> bool {
        if self.users.contains(id) {
            return false;
        }
        self.users.insert(id.to_owned())
    }

    /// Returns `true` if `id` was not seen before in this run.
    pub fn see_video(&mut self, id: &str) -> bool {
        if self.videos.contains(id) {
            return false;
        }
        self.videos.insert(id.to_owned())
    }

    #[must_use]
    pub fn users_seen(&self) -> usize {
        self.users.len()
    }

    #[must_use]
    pub fn videos_seen(&self) -> usize {
        self.videos.len()
    }
}
