//! User-video "commented-on" graph.
//!
//! [`BipartiteBuilder`] folds comments into one weighted edge per
//! `(author, video)` pair. Nodes are write-once: the first observation of an
//! ID is kept. A node created as a placeholder because a comment referenced
//! it first is replaced by the first real observation.

use std::collections::{BTreeMap, HashSet};

use ytnet_core::{Comment, CommentEdge, User, Video};

/// Outcome of [`BipartiteBuilder::ingest`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ingest {
    /// The comment created a new `(author, video)` edge.
    NewEdge,
    /// The comment was added to an existing edge.
    Merged,
    /// The comment ID was already ingested; nothing changed.
    Duplicate,
}

/// Finalized node and edge collections, each sorted by ID ascending.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BipartiteGraph {
    pub users: Vec<User>,
    pub videos: Vec<Video>,
    /// Sorted by `(user_id, video_id)`.
    pub edges: Vec<CommentEdge>,
    pub comments: Vec<Comment>,
}

impl BipartiteGraph {
    /// Sum of edge weights; equals the number of ingested comments.
    #[must_use]
    pub fn total_weight(&self) -> u64 {
        self.edges.iter().map(|e| u64::from(e.weight)).sum()
    }
}

#[derive(Debug, Default)]
pub struct BipartiteBuilder {
    users: BTreeMap<String, User>,
    videos: BTreeMap<String, Video>,
    stub_users: HashSet<String>,
    stub_videos: HashSet<String>,
    edges: BTreeMap<(String, String), CommentEdge>,
    comments: BTreeMap<String, Comment>,
    snapshot: Option<BipartiteGraph>,
}

impl BipartiteBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a video node. Returns `false` if a non-placeholder node with the
    /// same ID already exists.
    pub fn add_video(&mut self, video: Video) -> bool {
        if self.videos.contains_key(&video.id) && !self.stub_videos.remove(&video.id) {
            return false;
        }
        self.snapshot = None;
        self.videos.insert(video.id.clone(), video);
        true
    }

    /// Adds a user node. Returns `false` if a non-placeholder node with the
    /// same ID already exists.
    pub fn add_user(&mut self, user: User) -> bool {
        if self.users.contains_key(&user.id) && !self.stub_users.remove(&user.id) {
            return false;
        }
        self.snapshot = None;
        self.users.insert(user.id.clone(), user);
        true
    }

    /// Folds one comment into its `(author, video)` edge.
    pub fn ingest(&mut self, comment: Comment) -> Ingest {
        if self.comments.contains_key(&comment.id) {
            tracing::debug!(comment_id = %comment.id, "duplicate comment ignored");
            return Ingest::Duplicate;
        }
        self.snapshot = None;

        if !self.users.contains_key(&comment.author_id) {
            self.stub_users.insert(comment.author_id.clone());
            self.users.insert(
                comment.author_id.clone(),
                User {
                    id: comment.author_id.clone(),
                    display_name: String::new(),
                },
            );
        }
        if !self.videos.contains_key(&comment.video_id) {
            self.stub_videos.insert(comment.video_id.clone());
            self.videos
                .insert(comment.video_id.clone(), Video::stub(&comment.video_id));
        }

        let key = (comment.author_id.clone(), comment.video_id.clone());
        let outcome = if self.edges.contains_key(&key) {
            Ingest::Merged
        } else {
            Ingest::NewEdge
        };
        let edge = self.edges.entry(key).or_insert_with(|| CommentEdge {
            user_id: comment.author_id.clone(),
            video_id: comment.video_id.clone(),
            weight: 0,
            comment_ids: Vec::new(),
        });
        edge.weight += 1;
        edge.comment_ids.push(comment.id.clone());

        self.comments.insert(comment.id.clone(), comment);
        outcome
    }

    #[must_use]
    pub fn comment_count(&self) -> usize {
        self.comments.len()
    }

    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Videos in ID order, placeholders included.
    pub fn videos(&self) -> impl Iterator<Item = &Video> {
        self.videos.values()
    }

    /// Returns the sorted node and edge collections. The snapshot is cached
    /// until the next mutation, so repeated calls do not re-derive state.
    pub fn finalize(&mut self) -> &BipartiteGraph {
        self.snapshot.get_or_insert_with(|| BipartiteGraph {
            users: self.users.values().cloned().collect(),
            videos: self.videos.values().cloned().collect(),
            edges: self.edges.values().cloned().collect(),
            comments: self.comments.values().cloned().collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn comment(id: &str, author: &str, video: &str) -> Comment {
        Comment {
            id: id.to_owned(),
            author_id: author.to_owned(),
            video_id: video.to_owned(),
            text: format!("comment {id}"),
            like_count: 0,
            published_at: None,
            is_top_level: true,
        }
    }

    fn user(id: &str) -> User {
        User {
            id: id.to_owned(),
            display_name: format!("name {id}"),
        }
    }

    #[test]
    fn repeated_comments_aggregate_into_one_edge() {
        let mut builder = BipartiteBuilder::new();
        builder.add_video(Video::stub("V1"));
        builder.add_user(user("U1"));
        builder.add_user(user("U2"));
        assert_eq!(builder.ingest(comment("c1", "U1", "V1")), Ingest::NewEdge);
        assert_eq!(builder.ingest(comment("c2", "U1", "V1")), Ingest::Merged);
        assert_eq!(builder.ingest(comment("c3", "U1", "V1")), Ingest::Merged);
        assert_eq!(builder.ingest(comment("c4", "U2", "V1")), Ingest::NewEdge);

        let graph = builder.finalize();
        assert_eq!(graph.edges.len(), 2);
        assert_eq!(graph.edges[0].user_id, "U1");
        assert_eq!(graph.edges[0].weight, 3);
        assert_eq!(graph.edges[0].comment_ids, ["c1", "c2", "c3"]);
        assert_eq!(graph.edges[1].user_id, "U2");
        assert_eq!(graph.edges[1].weight, 1);
        assert_eq!(graph.videos.len(), 1);
    }

    #[test]
    fn weight_sum_equals_ingested_comments() {
        let mut builder = BipartiteBuilder::new();
        let pairs = [
            ("U1", "V1"),
            ("U2", "V2"),
            ("U1", "V2"),
            ("U1", "V1"),
            ("U3", "V1"),
            ("U2", "V2"),
        ];
        for (i, (u, v)) in pairs.iter().enumerate() {
            builder.ingest(comment(&format!("c{i}"), u, v));
        }
        builder.ingest(comment("c0", "U9", "V9"));

        let graph = builder.finalize();
        assert_eq!(graph.total_weight(), pairs.len() as u64);
        let mut keys: Vec<_> = graph
            .edges
            .iter()
            .map(|e| (e.user_id.as_str(), e.video_id.as_str()))
            .collect();
        keys.dedup();
        assert_eq!(keys.len(), graph.edges.len());
        for edge in &graph.edges {
            assert_eq!(edge.weight as usize, edge.comment_ids.len());
        }
    }

    #[test]
    fn duplicate_comment_changes_nothing() {
        let mut builder = BipartiteBuilder::new();
        builder.ingest(comment("c1", "U1", "V1"));
        assert_eq!(builder.ingest(comment("c1", "U1", "V1")), Ingest::Duplicate);
        assert_eq!(builder.comment_count(), 1);
        assert_eq!(builder.finalize().edges[0].weight, 1);
    }

    #[test]
    fn unknown_nodes_get_placeholders_replaced_by_real_data() {
        let mut builder = BipartiteBuilder::new();
        builder.ingest(comment("c1", "U1", "V1"));
        assert_eq!(builder.finalize().users[0].display_name, "");

        assert!(builder.add_user(user("U1")));
        let mut real = Video::stub("V1");
        real.title = "real title".to_owned();
        assert!(builder.add_video(real));
        assert!(!builder.add_user(user("U1")), "first real observation wins");

        let graph = builder.finalize();
        assert_eq!(graph.users[0].display_name, "name U1");
        assert_eq!(graph.videos[0].title, "real title");
    }

    #[test]
    fn first_observation_wins() {
        let mut builder = BipartiteBuilder::new();
        let mut first = Video::stub("V1");
        first.title = "first".to_owned();
        let mut second = Video::stub("V1");
        second.title = "second".to_owned();
        assert!(builder.add_video(first));
        assert!(!builder.add_video(second));
        assert_eq!(builder.finalize().videos[0].title, "first");
    }

    #[test]
    fn finalize_is_cached_until_mutation() {
        let mut builder = BipartiteBuilder::new();
        builder.ingest(comment("c1", "U1", "V1"));
        let first = builder.finalize().clone();
        assert_eq!(builder.finalize(), &first);

        builder.ingest(comment("c2", "U2", "V1"));
        assert_eq!(builder.finalize().edges.len(), 2);
    }

    #[test]
    fn output_is_sorted_by_id() {
        let mut builder = BipartiteBuilder::new();
        builder.ingest(comment("c9", "Ub", "Vb"));
        builder.ingest(comment("c1", "Ua", "Va"));
        let graph = builder.finalize();
        assert_eq!(graph.users[0].id, "Ua");
        assert_eq!(graph.videos[0].id, "Va");
        assert_eq!(graph.comments[0].id, "c1");
    }
}
