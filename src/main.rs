//! Binary entry point for paperlens.
//!
//! Every command prints JSON on stdout; logs go to stderr.

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(missing_docs)]
// Allow print_stderr in main binary for CLI output
#![allow(clippy::print_stderr)]
#![allow(clippy::print_stdout)]
// Allow needless_pass_by_value for command functions
#![allow(clippy::needless_pass_by_value)]
// Allow multiple crate versions from transitive dependencies
#![allow(clippy::multiple_crate_versions)]

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use paperlens::config::PaperlensConfig;
use paperlens::llm::{LlmSummarizer, OpenAiClient};
use paperlens::observability::{self, LoggingConfig};
use paperlens::services::{
    DEFAULT_RECOMMENDATIONS, DEFAULT_SIMILAR_PAPERS, SummaryMode, SummaryService,
};
use paperlens::sources::{DEFAULT_MAX_RESULTS, JsonFileSource, PaperSource};
use paperlens::{Paper, PaperStore, RecommenderEngine, RecordId};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

/// Paperlens - summarize, relate, and recommend academic papers.
#[derive(Parser)]
#[command(name = "paperlens")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to configuration file.
    #[arg(short, long, global = true, env = "PAPERLENS_CONFIG_PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands.
#[derive(Subcommand)]
enum Commands {
    /// Search a paper catalog, summarize each hit, and store it.
    Add {
        /// JSON or JSON Lines paper catalog.
        #[arg(short, long)]
        source: PathBuf,

        /// Search query; empty matches every paper.
        #[arg(short, long, default_value = "")]
        query: String,

        /// Maximum number of papers to ingest.
        #[arg(short, long, default_value_t = DEFAULT_MAX_RESULTS)]
        max_results: usize,
    },

    /// Find stored papers similar to a query.
    Similar {
        /// Query text.
        query: String,

        /// Number of results.
        #[arg(short, default_value_t = DEFAULT_SIMILAR_PAPERS)]
        k: usize,
    },

    /// Aggregate years, methodologies, and findings for a topic.
    Trends {
        /// Research topic.
        topic: String,
    },

    /// Recommend stored papers for a set of interests.
    Recommend {
        /// Research interest (repeatable).
        #[arg(short, long = "interest", required = true)]
        interests: Vec<String>,

        /// Catalog of recently read papers.
        #[arg(short, long)]
        recent: Option<PathBuf>,

        /// Number of recommendations.
        #[arg(short, default_value_t = DEFAULT_RECOMMENDATIONS)]
        k: usize,
    },

    /// Summarize one paper from a catalog.
    Summarize {
        /// JSON or JSON Lines paper catalog.
        #[arg(short, long)]
        source: PathBuf,

        /// Exact title to pick; defaults to the first paper.
        #[arg(short, long)]
        title: Option<String>,

        /// Relate the summary to similar stored papers.
        #[arg(long)]
        enhanced: bool,
    },

    /// Analyze one paper from a catalog.
    Analyze {
        /// JSON or JSON Lines paper catalog.
        #[arg(short, long)]
        source: PathBuf,

        /// Exact title to pick; defaults to the first paper.
        #[arg(short, long)]
        title: Option<String>,
    },

    /// Show store status.
    Status,

    /// Delete a stored paper by record id.
    Delete {
        /// Record id.
        id: String,
    },

    /// Re-embed every stored paper with the current embedder.
    Reindex {
        /// Refit term weights from the bootstrap corpus before re-embedding.
        #[arg(long)]
        refit: bool,
    },
}

/// Main entry point.
fn main() -> ExitCode {
    // Missing .env is normal
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    let config = match load_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration: {e:#}");
            return ExitCode::FAILURE;
        },
    };

    let logging = LoggingConfig::from_settings(&config.logging, cli.verbose);
    if let Err(e) = observability::init(logging) {
        eprintln!("Failed to initialize logging: {e}");
        return ExitCode::FAILURE;
    }

    match run_command(cli.command, &config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "Command failed");
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        },
    }
}

/// Runs the selected command.
fn run_command(command: Commands, config: &PaperlensConfig) -> Result<()> {
    match command {
        Commands::Add {
            source,
            query,
            max_results,
        } => cmd_add(config, &source, &query, max_results),
        Commands::Similar { query, k } => {
            let store = PaperStore::open(config)?;
            print_json(&store.get_similar_papers(&query, k)?)
        },
        Commands::Trends { topic } => {
            let store = PaperStore::open(config)?;
            print_json(&store.analyze_research_trends(&topic)?)
        },
        Commands::Recommend {
            interests,
            recent,
            k,
        } => cmd_recommend(config, &interests, recent.as_deref(), k),
        Commands::Summarize {
            source,
            title,
            enhanced,
        } => {
            let paper = select_paper(&source, title.as_deref())?;
            let mode = if enhanced {
                SummaryMode::Enhanced
            } else {
                SummaryMode::Basic
            };
            print_json(&summary_service(config)?.summarize_paper(&paper, mode)?)
        },
        Commands::Analyze { source, title } => {
            let paper = select_paper(&source, title.as_deref())?;
            print_json(&summary_service(config)?.analyze(&paper)?)
        },
        Commands::Status => cmd_status(config),
        Commands::Delete { id } => {
            let store = PaperStore::open(config)?;
            let deleted = store.remove_paper(&RecordId::new(id.clone()))?;
            print_json(&serde_json::json!({ "id": id, "deleted": deleted }))
        },
        Commands::Reindex { refit } => cmd_reindex(config, refit),
    }
}

/// Loads configuration, then applies environment overrides.
fn load_config(path: Option<&Path>) -> Result<PaperlensConfig> {
    let config = match path {
        Some(path) => PaperlensConfig::load_from_file(path)
            .with_context(|| format!("reading {}", path.display()))?,
        None => PaperlensConfig::load_default(),
    };
    Ok(config.with_env_overrides())
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn summary_service(config: &PaperlensConfig) -> Result<SummaryService> {
    let store = Arc::new(PaperStore::open(config)?);
    let summarizer = Arc::new(LlmSummarizer::new(OpenAiClient::from_config(&config.llm)));
    Ok(SummaryService::new(store, summarizer))
}

fn select_paper(source: &Path, title: Option<&str>) -> Result<Paper> {
    let papers = JsonFileSource::new(source).load_all()?;
    let paper = match title {
        Some(title) => papers.into_iter().find(|paper| paper.title == title),
        None => papers.into_iter().next(),
    };
    match (paper, title) {
        (Some(paper), _) => Ok(paper),
        (None, Some(title)) => bail!("no paper titled '{title}' in {}", source.display()),
        (None, None) => bail!("{} contains no papers", source.display()),
    }
}

/// Per-paper result of `add`.
#[derive(Serialize)]
struct AddReport {
    title: String,
    stored: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

fn cmd_add(config: &PaperlensConfig, source: &Path, query: &str, max_results: usize) -> Result<()> {
    let papers = JsonFileSource::new(source).search(query, max_results)?;
    let service = summary_service(config)?;

    let mut reports = Vec::with_capacity(papers.len());
    for paper in papers {
        let report = match service.summarize_paper(&paper, SummaryMode::Basic) {
            Ok(outcome) => AddReport {
                title: paper.title,
                stored: outcome.stored,
                summary: Some(outcome.summary),
                error: None,
            },
            Err(e) if e.is_recoverable() => {
                tracing::warn!(title = %paper.title, error = %e, "Skipping paper");
                AddReport {
                    title: paper.title,
                    stored: false,
                    summary: None,
                    error: Some(e.to_string()),
                }
            },
            Err(e) => return Err(e.into()),
        };
        reports.push(report);
    }

    print_json(&reports)
}

fn cmd_recommend(
    config: &PaperlensConfig,
    interests: &[String],
    recent: Option<&Path>,
    k: usize,
) -> Result<()> {
    let recent_papers = match recent {
        Some(path) => JsonFileSource::new(path).load_all()?,
        None => Vec::new(),
    };
    let engine = RecommenderEngine::new(Arc::new(PaperStore::open(config)?));
    print_json(&engine.get_recommendations(interests, &recent_papers, k)?)
}

fn cmd_status(config: &PaperlensConfig) -> Result<()> {
    let store = PaperStore::open(config)?;
    print_json(&serde_json::json!({
        "collection": config.collection,
        "database": config.database_path().display().to_string(),
        "papers": store.paper_count()?,
        "dimensions": store.embedder().dimensions(),
        "fingerprint": store.fingerprint(),
        "id_strategy": config.storage.id_strategy.as_str(),
    }))
}

fn cmd_reindex(config: &PaperlensConfig, refit: bool) -> Result<()> {
    let (store, reembedded) = if refit {
        PaperStore::refit(config)?
    } else {
        PaperStore::reindex(config)?
    };
    print_json(&serde_json::json!({
        "reembedded": reembedded,
        "fingerprint": store.fingerprint(),
    }))
}
