//! The `collect` command: seed search, video metadata, comments, graphs.
//!
//! Stages run strictly in sequence. Skipped pages and unparseable items are
//! logged and counted in `run_summary.json`; only configuration problems,
//! key exhaustion, archive failures and a seed search that produced no page
//! at all abort the run.

mod summary;

use std::path::PathBuf;

use anyhow::Context;
use clap::Args;
use serde_json::Value;
use ytnet_core::AppConfig;
use ytnet_graph::{build_similarity, BipartiteBuilder, Deduplicator, ExportWriter, Ingest};
use ytnet_youtube::{
    normalize_comment_thread, normalize_video, search_result_video_id, Endpoint, Pager,
    RawArchive, YoutubeClient, VIDEOS_BATCH_SIZE,
};

use crate::SimilarityOpts;
pub(crate) use summary::RunSummary;

#[derive(Debug, Args)]
pub(crate) struct CollectArgs {
    /// Search query used to find seed videos
    #[arg(long)]
    pub query: String,

    /// Output directory
    #[arg(long)]
    pub outdir: PathBuf,

    /// Maximum number of seed videos
    #[arg(long, default_value_t = 50, value_parser = clap::value_parser!(u32).range(1..))]
    pub max_seeds: u32,

    /// Collect top-level comments and build the user-video graph
    #[arg(long)]
    pub collect_comments: bool,

    /// Maximum comments fetched per video
    #[arg(long, default_value_t = 200, value_parser = clap::value_parser!(u32).range(1..))]
    pub comments_per_video: u32,

    /// Build the video-video text similarity graph
    #[arg(long)]
    pub build_similarity: bool,

    #[command(flatten)]
    pub similarity: SimilarityOpts,

    /// API key, optionally `label=key`; repeat for rotation. Replaces keys
    /// from the environment.
    #[arg(long = "api-key")]
    pub api_keys: Vec<String>,

    /// Bias search results to a region (e.g. BR)
    #[arg(long)]
    pub region_code: Option<String>,

    /// Bias search results to a language (e.g. pt)
    #[arg(long)]
    pub relevance_language: Option<String>,

    /// Replay pages already archived under <outdir>/raw instead of fetching them
    #[arg(long)]
    pub resume: bool,
}

/// Runs the full pipeline and returns the summary that was written to
/// `run_summary.json`.
///
/// # Errors
///
/// Returns an error for missing credentials, an unwritable output directory,
/// key exhaustion, archive failures, or a seed search that yielded nothing.
pub(crate) async fn run_collect(
    args: &CollectArgs,
    config: AppConfig,
) -> anyhow::Result<RunSummary> {
    let config = config.with_overrides(
        &args.api_keys,
        args.region_code.as_deref(),
        args.relevance_language.as_deref(),
    );
    config.ensure_credentials()?;

    let writer = ExportWriter::new(&args.outdir)
        .with_context(|| format!("output directory {} is not writable", args.outdir.display()))?;
    let mut archive = RawArchive::open(args.outdir.join("raw"), args.resume)?;
    let mut client = YoutubeClient::from_config(&config)?;

    let mut summary = RunSummary::new(&args.query);
    let mut seen = Deduplicator::new();
    let mut builder = BipartiteBuilder::new();

    tracing::info!(query = %args.query, keys = client.pool().len(), "starting collection");

    let seeds = collect_seeds(args, &mut client, &mut archive, &mut seen, &mut summary).await?;
    summary.seeds = seeds.len();
    tracing::info!(seeds = seeds.len(), "seed search complete");

    collect_videos(&seeds, &mut client, &mut archive, &mut builder, &mut summary).await?;
    tracing::info!(videos = summary.videos, "video metadata fetched");

    if args.collect_comments {
        let video_ids: Vec<String> = builder.videos().map(|v| v.id.clone()).collect();
        for video_id in &video_ids {
            collect_comments(
                video_id,
                args.comments_per_video as usize,
                &mut client,
                &mut archive,
                &mut seen,
                &mut builder,
                &mut summary,
            )
            .await?;
        }
        tracing::info!(
            comments = builder.comment_count(),
            edges = builder.edge_count(),
            "comments ingested"
        );
    }

    let graph = builder.finalize();
    writer.write_videos(&graph.videos)?;
    summary.videos = graph.videos.len();
    if args.collect_comments {
        writer.write_comment_graph(graph)?;
        summary.users = graph.users.len();
        summary.comments = graph.comments.len();
        summary.comment_edges = graph.edges.len();
    }

    if args.build_similarity {
        let result = build_similarity(&graph.videos, &args.similarity.to_config())?;
        writer.write_similarity(&graph.videos, &result.edges)?;
        summary.similarity_edges = Some(result.edges.len());
        summary.similarity_excluded = result.excluded;
    }

    summary.requests_sent = client.requests_sent();
    summary.keys_remaining = client.pool().remaining();
    summary.write(&args.outdir)?;

    tracing::info!(
        videos = summary.videos,
        users = summary.users,
        comments = summary.comments,
        skipped_pages = summary.skipped_pages.len(),
        skipped_items = summary.skipped_items,
        "collection finished"
    );
    Ok(summary)
}

/// Drains `pager`, handing every item to `on_item`, and folds the pager's
/// counters into `summary`.
async fn drain<F>(
    mut pager: Pager,
    client: &mut YoutubeClient,
    archive: &mut RawArchive,
    summary: &mut RunSummary,
    mut on_item: F,
) -> anyhow::Result<Pager>
where
    F: FnMut(&Value, &mut RunSummary),
{
    while let Some(items) = pager.next_page(client, archive).await? {
        for item in &items {
            on_item(item, summary);
        }
    }
    summary.absorb(&pager);
    Ok(pager)
}

async fn collect_seeds(
    args: &CollectArgs,
    client: &mut YoutubeClient,
    archive: &mut RawArchive,
    seen: &mut Deduplicator,
    summary: &mut RunSummary,
) -> anyhow::Result<Vec<String>> {
    let endpoint = Endpoint::Search {
        query: args.query.clone(),
    };
    let mut seeds = Vec::new();
    let pager = drain(
        Pager::new(endpoint, args.max_seeds as usize),
        client,
        archive,
        summary,
        |item, summary| match search_result_video_id(item) {
            Ok(id) => {
                if seen.see_video(&id) {
                    seeds.push(id);
                }
            }
            Err(e) => summary.skip_item("search", &e),
        },
    )
    .await?;

    let stats = pager.stats();
    if stats.fetched + stats.resumed == 0 {
        if let Some(skipped) = pager.skipped() {
            anyhow::bail!("seed search returned no page: {}", skipped.reason);
        }
    }
    Ok(seeds)
}

async fn collect_videos(
    seeds: &[String],
    client: &mut YoutubeClient,
    archive: &mut RawArchive,
    builder: &mut BipartiteBuilder,
    summary: &mut RunSummary,
) -> anyhow::Result<()> {
    for (batch, ids) in seeds.chunks(VIDEOS_BATCH_SIZE).enumerate() {
        let endpoint = Endpoint::Videos {
            ids: ids.to_vec(),
            batch,
        };
        drain(
            Pager::new(endpoint, ids.len()),
            client,
            archive,
            summary,
            |item, summary| match normalize_video(item) {
                Ok(video) => {
                    builder.add_video(video);
                }
                Err(e) => summary.skip_item("video", &e),
            },
        )
        .await?;
    }
    let fetched = builder.videos().count();
    if fetched < seeds.len() {
        tracing::warn!(
            missing = seeds.len() - fetched,
            "some seed videos returned no metadata"
        );
    }
    summary.videos = fetched;
    Ok(())
}

async fn collect_comments(
    video_id: &str,
    max_comments: usize,
    client: &mut YoutubeClient,
    archive: &mut RawArchive,
    seen: &mut Deduplicator,
    builder: &mut BipartiteBuilder,
    summary: &mut RunSummary,
) -> anyhow::Result<()> {
    let endpoint = Endpoint::CommentThreads {
        video_id: video_id.to_owned(),
    };
    drain(
        Pager::new(endpoint, max_comments),
        client,
        archive,
        summary,
        |item, summary| match normalize_comment_thread(item, video_id) {
            Ok((user, comment)) => {
                if seen.see_user(&user.id) {
                    builder.add_user(user);
                }
                if builder.ingest(comment) == Ingest::Duplicate {
                    summary.duplicate_comments += 1;
                }
            }
            Err(e) => summary.skip_item("commentThread", &e),
        },
    )
    .await?;
    Ok(())
}

#[cfg(test)]
#[path = "collect_test.rs"]
mod tests;
