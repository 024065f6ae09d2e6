//! Offline rebuild of the similarity graph from an exported video table.

use std::path::PathBuf;

use anyhow::Context;
use clap::Args;
use ytnet_graph::{build_similarity, ExportWriter};

use crate::SimilarityOpts;

#[derive(Debug, Args)]
pub(crate) struct SimilarityArgs {
    /// Path to a nodes_videos.csv written by `collect`
    #[arg(long)]
    pub videos: PathBuf,

    /// Output directory
    #[arg(long)]
    pub outdir: PathBuf,

    #[command(flatten)]
    pub similarity: SimilarityOpts,
}

/// Reads the video table, rebuilds similarity edges and writes the edge list
/// and GraphML. Returns the number of edges.
pub(crate) fn run_similarity(args: &SimilarityArgs) -> anyhow::Result<usize> {
    let videos = ExportWriter::read_videos(&args.videos)
        .with_context(|| format!("failed to read {}", args.videos.display()))?;
    let result = build_similarity(&videos, &args.similarity.to_config())?;

    let writer = ExportWriter::new(&args.outdir)
        .with_context(|| format!("output directory {} is not writable", args.outdir.display()))?;
    writer.write_similarity(&videos, &result.edges)?;

    tracing::info!(
        videos = videos.len(),
        edges = result.edges.len(),
        excluded = result.excluded.len(),
        "similarity graph rebuilt"
    );
    Ok(result.edges.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rebuilds_from_exported_csv() {
        let dir = tempfile::tempdir().unwrap();
        let mut a = ytnet_core::Video::stub("a");
        a.title = "cats and dogs".to_owned();
        let mut b = ytnet_core::Video::stub("b");
        b.title = "dogs and cats are great".to_owned();
        let csv = ExportWriter::new(dir.path())
            .unwrap()
            .write_videos(&[a, b])
            .unwrap();

        let args = SimilarityArgs {
            videos: csv,
            outdir: dir.path().join("out"),
            similarity: SimilarityOpts {
                top_k: 1,
                min_sim: 0.1,
            },
        };
        assert_eq!(run_similarity(&args).unwrap(), 1);
        assert!(dir
            .path()
            .join("out")
            .join("graph_similarity.graphml")
            .exists());
    }

    #[test]
    fn missing_input_is_reported_with_path() {
        let dir = tempfile::tempdir().unwrap();
        let args = SimilarityArgs {
            videos: dir.path().join("missing.csv"),
            outdir: dir.path().to_path_buf(),
            similarity: SimilarityOpts {
                top_k: 5,
                min_sim: 0.25,
            },
        };
        let err = run_similarity(&args).unwrap_err();
        assert!(format!("{err}").contains("missing.csv"));
    }
}
