mod collect;
mod similarity;

use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::collect::CollectArgs;
use crate::similarity::SimilarityArgs;

#[derive(Debug, Parser)]
#[command(name = "ytnet")]
#[command(about = "Collect YouTube comment engagement and build network graphs")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Search for seed videos, fetch metadata and comments, export graphs
    Collect(CollectArgs),
    /// Rebuild the similarity graph from an exported nodes_videos.csv
    Similarity(SimilarityArgs),
}

/// Thresholds shared by `collect --build-similarity` and `similarity`.
#[derive(Debug, Clone, Args)]
pub(crate) struct SimilarityOpts {
    /// Maximum similarity edges kept per video
    #[arg(long, default_value_t = 5, value_parser = clap::value_parser!(u32).range(1..))]
    pub top_k: u32,

    /// Minimum cosine similarity for an edge (0-1)
    #[arg(long, default_value_t = 0.25, value_parser = parse_unit_interval)]
    pub min_sim: f64,
}

impl SimilarityOpts {
    pub(crate) fn to_config(&self) -> ytnet_graph::SimilarityConfig {
        ytnet_graph::SimilarityConfig {
            top_k: self.top_k as usize,
            min_sim: self.min_sim,
            ..ytnet_graph::SimilarityConfig::default()
        }
    }
}

fn parse_unit_interval(raw: &str) -> Result<f64, String> {
    let value: f64 = raw.parse().map_err(|e| format!("{e}"))?;
    if (0.0..=1.0).contains(&value) {
        Ok(value)
    } else {
        Err(format!("{value} is not in [0, 1]"))
    }
}

/// Log filter used when neither `RUST_LOG` nor a loaded config names one.
const DEFAULT_LOG_LEVEL: &str = "info";

impl Commands {
    /// Only `collect` talks to the API. Offline commands never read the
    /// `YTNET_*` environment, so a bad API setting cannot break them.
    fn needs_app_config(&self) -> bool {
        matches!(self, Self::Collect(_))
    }
}

fn init_tracing(fallback_level: &str) -> anyhow::Result<()> {
    let env_filter =
        EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(fallback_level))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();
    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let Some(command) = cli.command else {
        println!("nothing to do; run `ytnet --help` for usage");
        return Ok(());
    };

    let config = if command.needs_app_config() {
        Some(ytnet_core::load_app_config()?)
    } else {
        None
    };
    init_tracing(
        config
            .as_ref()
            .map_or(DEFAULT_LOG_LEVEL, |c| c.log_level.as_str()),
    )?;

    match (command, config) {
        (Commands::Collect(args), Some(config)) => {
            let summary = collect::run_collect(&args, config).await?;
            println!(
                "collected {} videos, {} users, {} comments into {}",
                summary.videos,
                summary.users,
                summary.comments,
                args.outdir.display()
            );
        }
        (Commands::Collect(_), None) => anyhow::bail!("collect requires configuration"),
        (Commands::Similarity(args), _) => {
            let edges = similarity::run_similarity(&args)?;
            println!(
                "wrote {edges} similarity edges to {}",
                args.outdir.display()
            );
        }
    }

    Ok(())
}
