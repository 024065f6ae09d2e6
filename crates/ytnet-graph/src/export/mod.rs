//! Export of finalized node and edge collections to CSV and GraphML.
//!
//! Every file is rendered in memory, written to a temporary sibling and
//! renamed into place. Rows and elements are sorted by ID and floats use a
//! fixed precision, so exporting the same collections twice produces
//! byte-identical files.

mod graphml;
mod tabular;

use std::fs;
use std::path::{Path, PathBuf};

use ytnet_core::{SimilarityEdge, Video};

use crate::bipartite::BipartiteGraph;
use crate::error::ExportError;

pub const VIDEOS_CSV: &str = "nodes_videos.csv";
pub const USERS_CSV: &str = "nodes_users.csv";
pub const COMMENT_EDGES_CSV: &str = "edges_comments_user_video.csv";
pub const SIMILARITY_EDGES_CSV: &str = "edges_similarity_video_video.csv";
pub const COMMENTS_CSV: &str = "comments.csv";
pub const BIPARTITE_GRAPHML: &str = "graph_comment_bipartite.graphml";
pub const SIMILARITY_GRAPHML: &str = "graph_similarity.graphml";

#[derive(Debug, Clone)]
pub struct ExportWriter {
    dir: PathBuf,
}

impl ExportWriter {
    /// Creates the output directory if needed.
    ///
    /// # Errors
    ///
    /// Returns [`ExportError::Io`] if the directory cannot be created.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self, ExportError> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|source| ExportError::Io {
            path: dir.clone(),
            source,
        })?;
        Ok(Self { dir })
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Writes `nodes_videos.csv`.
    ///
    /// # Errors
    ///
    /// Returns [`ExportError`] on rendering or I/O failure.
    pub fn write_videos(&self, videos: &[Video]) -> Result<PathBuf, ExportError> {
        self.write_file(VIDEOS_CSV, &tabular::videos(videos)?)
    }

    /// Writes the user nodes, comment edges, flattened comments and the
    /// bipartite GraphML.
    ///
    /// # Errors
    ///
    /// Returns [`ExportError`] on rendering or I/O failure.
    pub fn write_comment_graph(&self, graph: &BipartiteGraph) -> Result<Vec<PathBuf>, ExportError> {
        Ok(vec![
            self.write_file(USERS_CSV, &tabular::users(&graph.users)?)?,
            self.write_file(COMMENT_EDGES_CSV, &tabular::comment_edges(&graph.edges)?)?,
            self.write_file(COMMENTS_CSV, &tabular::comments(&graph.comments)?)?,
            self.write_file(BIPARTITE_GRAPHML, &graphml::bipartite(graph)?)?,
        ])
    }

    /// Writes the similarity edge list and the similarity GraphML, which
    /// contains every video in `videos` as a node.
    ///
    /// # Errors
    ///
    /// Returns [`ExportError`] on rendering or I/O failure.
    pub fn write_similarity(
        &self,
        videos: &[Video],
        edges: &[SimilarityEdge],
    ) -> Result<Vec<PathBuf>, ExportError> {
        Ok(vec![
            self.write_file(SIMILARITY_EDGES_CSV, &tabular::similarity_edges(edges)?)?,
            self.write_file(SIMILARITY_GRAPHML, &graphml::similarity(videos, edges)?)?,
        ])
    }

    /// Reads a `nodes_videos.csv` written by [`ExportWriter::write_videos`].
    ///
    /// # Errors
    ///
    /// Returns [`ExportError::Io`] if the file cannot be opened,
    /// [`ExportError::Csv`] for malformed rows and
    /// [`ExportError::InvalidRow`] for unparseable timestamps.
    pub fn read_videos(path: &Path) -> Result<Vec<Video>, ExportError> {
        let file = fs::File::open(path).map_err(|source| ExportError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        tabular::parse_videos(file, path)
    }

    fn write_file(&self, name: &str, bytes: &[u8]) -> Result<PathBuf, ExportError> {
        let path = self.dir.join(name);
        let tmp = self.dir.join(format!("{name}.tmp"));
        fs::write(&tmp, bytes).map_err(|source| ExportError::Io {
            path: tmp.clone(),
            source,
        })?;
        fs::rename(&tmp, &path).map_err(|source| ExportError::Io {
            path: path.clone(),
            source,
        })?;
        tracing::debug!(path = %path.display(), bytes = bytes.len(), "export written");
        Ok(path)
    }
}
