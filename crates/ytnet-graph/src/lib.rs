//! Graph assembly for collected engagement data: node deduplication, the
//! user-video comment graph, the video-video text similarity graph and their
//! CSV / GraphML exports.

pub mod bipartite;
pub mod dedupe;
pub mod error;
pub mod export;
pub mod similarity;

pub use bipartite::{BipartiteBuilder, BipartiteGraph, Ingest};
pub use dedupe::Deduplicator;
pub use error::{ExportError, GraphError};
pub use export::ExportWriter;
pub use similarity::{build_similarity, SimilarityConfig, SimilarityResult};
