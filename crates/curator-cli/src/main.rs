//! curator: batch maintenance for the document search index.
//!
//! Each subcommand runs one job over a list of domains. Configuration comes
//! from the environment (and `.env`); see `ElasticsearchConfig::from_env`,
//! `OpenAIConfig::from_env`, and `TopicModelingConfig::from_env`.

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use curator_core::{
    defaults, DateRange, RetryPolicy, SearchIndex, TiktokenTokenizer, TransientPolicy,
};
use curator_index::ElasticsearchClient;
use curator_inference::{OpenAIBackend, TopicModeler, TopicModelingConfig};
use curator_jobs::{
    load_topic_list, merge_csv_dir, DuplicateCleanupJob, EmbeddingJob, EmbeddingJobConfig,
    JobHandler, JobRunner, PushTopicsJob, RunSummary, TopicGenerationConfig, TopicGenerationJob,
    TopicTaggingJob,
};
use curator_search::find_similar;

#[derive(Parser)]
#[command(name = "curator")]
#[command(author, version, about = "Maintenance jobs for the document search index")]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Which documents a job runs over.
#[derive(Args, Debug, Clone)]
struct Scope {
    /// Domain URL to process (repeatable; defaults depend on the job)
    #[arg(long = "domain")]
    domains: Vec<String>,

    /// Run once over every document instead of per domain
    #[arg(long, conflicts_with = "domains")]
    all_data: bool,

    /// Only documents created in the last N days
    #[arg(long)]
    last_days: Option<i64>,

    /// Only documents created in the last week
    #[arg(long, conflicts_with = "last_days")]
    recent: bool,
}

impl Scope {
    fn runner(&self, default_domains: &[&str]) -> JobRunner {
        let runner = if self.all_data {
            JobRunner::new(vec![None])
        } else if self.domains.is_empty() {
            JobRunner::for_domains(default_domains)
        } else {
            JobRunner::for_domains(&self.domains)
        };
        runner.with_date_range(self.date_range())
    }

    fn date_range(&self) -> Option<DateRange> {
        self.last_days
            .or(self.recent.then_some(defaults::DATE_RANGE_DAYS))
            .map(DateRange::last_days)
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Delete re-ingested duplicate documents
    Dedup {
        #[command(flatten)]
        scope: Scope,

        /// Log what would be deleted without deleting
        #[arg(long)]
        dry_run: bool,
    },

    /// Generate topics for documents that have none
    Topics {
        #[command(flatten)]
        scope: Scope,

        /// Topic vocabulary CSV with a `Topics` column
        #[arg(long, default_value = defaults::TOPICS_CSV)]
        topics_csv: PathBuf,

        /// Directory for per-domain topic CSV files
        #[arg(long, default_value = defaults::OUTPUT_DIR)]
        output_dir: PathBuf,

        /// Also write topics to the index as they are generated
        #[arg(long)]
        update_index: bool,

        /// Do not record topics in CSV files
        #[arg(long)]
        no_csv: bool,
    },

    /// Push topics saved in CSV files to the index
    PushTopics {
        #[command(flatten)]
        scope: Scope,

        /// Directory holding the per-domain topic CSV files
        #[arg(long, default_value = defaults::OUTPUT_DIR)]
        output_dir: PathBuf,
    },

    /// Tag documents that mention a vocabulary topic verbatim
    TagTopics {
        #[command(flatten)]
        scope: Scope,

        /// Topic vocabulary CSV with a `Topics` column
        #[arg(long, default_value = defaults::TOPICS_CSV)]
        topics_csv: PathBuf,
    },

    /// Embed document summaries for semantic search
    Embed {
        #[command(flatten)]
        scope: Scope,

        /// Add the dense-vector mapping before embedding
        #[arg(long)]
        add_mapping: bool,

        /// Vector field to write
        #[arg(long, default_value = defaults::VECTOR_FIELD)]
        field: String,
    },

    /// Print the documents closest to a question
    Similar {
        /// Question to embed
        question: String,

        /// Vector field to search
        #[arg(long, default_value = defaults::SIMILARITY_FIELD)]
        field: String,

        /// Number of documents to return
        #[arg(long, default_value_t = defaults::SIMILARITY_TOP_K)]
        top_k: usize,
    },

    /// Merge every topic CSV in a directory into one file
    MergeCsv {
        /// Directory to read
        #[arg(long, default_value = defaults::OUTPUT_DIR)]
        dir: PathBuf,

        /// Merged output file
        #[arg(long)]
        out: PathBuf,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    let _log_guard = init_logging();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(subsystem = "cli", error = %format!("{:#}", e), "Run aborted");
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

/// Initialize tracing once for the process.
///
/// Environment variables:
///   LOG_FORMAT  - "json" or "text" (default: "text")
///   LOG_FILE    - path to log file (optional, enables daily-rotated file logging)
///   LOG_ANSI    - "true"/"false" override ANSI colors (auto-detected by default)
///   RUST_LOG    - standard env filter (default: "info")
///
/// The returned guard flushes the file writer and must live until exit.
fn init_logging() -> Option<tracing_appender::non_blocking::WorkerGuard> {
    let log_format = std::env::var("LOG_FORMAT").unwrap_or_else(|_| "text".to_string());
    let log_file = std::env::var("LOG_FILE").ok();
    let log_ansi = std::env::var("LOG_ANSI")
        .ok()
        .map(|v| v == "true" || v == "1");

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info".into());
    let registry = tracing_subscriber::registry().with(env_filter);

    let guard = if let Some(ref path) = log_file {
        let path = Path::new(path);
        let file_dir = path.parent().unwrap_or(Path::new("."));
        let file_name = path
            .file_name()
            .and_then(|f| f.to_str())
            .unwrap_or("curator.log");
        let file_appender = tracing_appender::rolling::daily(file_dir, file_name);
        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

        if log_format == "json" {
            registry
                .with(
                    tracing_subscriber::fmt::layer()
                        .json()
                        .with_writer(non_blocking),
                )
                .init();
        } else {
            let layer = tracing_subscriber::fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(log_ansi.unwrap_or(false));
            registry.with(layer).init();
        }
        Some(guard)
    } else {
        if log_format == "json" {
            registry
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        } else {
            let mut layer = tracing_subscriber::fmt::layer();
            if let Some(ansi) = log_ansi {
                layer = layer.with_ansi(ansi);
            }
            registry.with(layer).init();
        }
        None
    };

    info!(
        log_format = %log_format,
        log_file = log_file.as_deref().unwrap_or("(stdout)"),
        "Logging initialized"
    );
    guard
}

async fn connect_index() -> anyhow::Result<Arc<ElasticsearchClient>> {
    let client = ElasticsearchClient::from_env().context("Elasticsearch configuration")?;
    client.ping().await.context("Elasticsearch is not reachable")?;
    Ok(Arc::new(client))
}

async fn run_job(runner: &JobRunner, handler: &dyn JobHandler) -> anyhow::Result<()> {
    let summary: RunSummary = runner.run(handler).await?;
    info!(
        subsystem = "cli",
        job = %handler.kind(),
        domains = summary.domains.len(),
        failed_domains = summary.failed_domains(),
        processed = summary.total.processed,
        updated = summary.total.updated,
        deleted = summary.total.deleted,
        failed = summary.total.failed,
        "Run finished"
    );
    Ok(())
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let transient_policy = TransientPolicy::from_env();

    match cli.command {
        Commands::Dedup { scope, dry_run } => {
            let index = connect_index().await?;
            let job = DuplicateCleanupJob::new(index)
                .with_dry_run(dry_run)
                .with_transient_policy(transient_policy);
            run_job(&scope.runner(defaults::DEDUP_DOMAINS), &job).await
        }
        Commands::Topics {
            scope,
            topics_csv,
            output_dir,
            update_index,
            no_csv,
        } => {
            let topics = load_topic_list(&topics_csv)
                .with_context(|| format!("loading topics from {}", topics_csv.display()))?;
            let index = connect_index().await?;
            let backend = Arc::new(OpenAIBackend::from_env()?);
            let tokenizer = Arc::new(TiktokenTokenizer::cl100k()?);
            let modeler = Arc::new(TopicModeler::new(
                backend,
                tokenizer,
                topics,
                TopicModelingConfig::from_env(),
            ));
            let config = TopicGenerationConfig {
                output_dir,
                save_csv: !no_csv,
                update_index,
                ..Default::default()
            };
            let job = TopicGenerationJob::new(index, modeler, config);
            run_job(&scope.runner(defaults::TOPIC_DOMAINS), &job).await
        }
        Commands::PushTopics { scope, output_dir } => {
            let index = connect_index().await?;
            let job = PushTopicsJob::new(index)
                .with_output_dir(output_dir)
                .with_transient_policy(transient_policy);
            run_job(&scope.runner(defaults::PUSH_DOMAINS), &job).await
        }
        Commands::TagTopics { scope, topics_csv } => {
            let topics = load_topic_list(&topics_csv)
                .with_context(|| format!("loading topics from {}", topics_csv.display()))?;
            let index = connect_index().await?;
            let job = TopicTaggingJob::new(index, topics).with_transient_policy(transient_policy);
            run_job(&scope.runner(defaults::TOPIC_DOMAINS), &job).await
        }
        Commands::Embed {
            scope,
            add_mapping,
            field,
        } => {
            let index = connect_index().await?;
            let embedder = Arc::new(OpenAIBackend::from_env()?);
            let config = EmbeddingJobConfig {
                field,
                add_mapping,
                retry: RetryPolicy::from_env(),
                transient_policy,
            };
            let job = EmbeddingJob::new(index, embedder, config);
            run_job(&scope.runner(defaults::TOPIC_DOMAINS), &job).await
        }
        Commands::Similar {
            question,
            field,
            top_k,
        } => {
            let index = connect_index().await?;
            let embedder = OpenAIBackend::from_env()?;
            let response = find_similar(index.as_ref(), &embedder, &question, &field, top_k).await?;
            println!("{}", serde_json::to_string_pretty(&response)?);
            Ok(())
        }
        Commands::MergeCsv { dir, out } => {
            let rows = merge_csv_dir(&dir, &out)?;
            info!(
                subsystem = "cli",
                dir = %dir.display(),
                out = %out.display(),
                rows,
                "CSV files merged"
            );
            Ok(())
        }
    }
}
