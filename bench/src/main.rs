use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use vecprobe_bench::{create_progress, BenchmarkRunner, ResultsReporter, UrlProvider};
use vecprobe_engine::config::{generate_example_toml, generate_example_yaml};
use vecprobe_engine::{BenchConfig, Dialect, LogFormat, ProgressMode, RecallMetric};

#[derive(Parser, Debug)]
#[command(name = "vecprobe", version, about = "Recall/QPS benchmark for SQL vector indexes")]
struct Args {
    /// Scenario file (YAML, TOML or JSON)
    #[arg(long, short)]
    config: Option<String>,

    /// Print a config file with default values and exit
    #[arg(long, value_enum)]
    generate_config: Option<ConfigFormat>,

    /// Query vectors (.fvecs)
    #[arg(long)]
    queries: Option<PathBuf>,

    /// Ground-truth ids (.ivecs)
    #[arg(long)]
    ground_truth: Option<PathBuf>,

    /// First record to use (1-based)
    #[arg(long)]
    first: Option<usize>,

    /// Last record to use (inclusive)
    #[arg(long)]
    last: Option<usize>,

    /// Neighbors per query
    #[arg(long)]
    k: Option<i64>,

    /// Index partitions probed per query
    #[arg(long)]
    probes: Option<i64>,

    /// Query shape: brute_force, ivf_multi_stage or ivf_native
    #[arg(long)]
    dialect: Option<Dialect>,

    /// L2-normalize the query vector
    #[arg(long, overrides_with = "no_normalize")]
    normalize: bool,

    #[arg(long, overrides_with = "normalize")]
    no_normalize: bool,

    /// Queries in flight at once
    #[arg(long)]
    concurrency: Option<usize>,

    /// Unscored queries to run first
    #[arg(long)]
    warmup: Option<usize>,

    /// positional, exact_list or set_overlap
    #[arg(long)]
    recall_metric: Option<RecallMetric>,

    /// lines, bar or quiet
    #[arg(long, value_enum)]
    progress: Option<ProgressArg>,

    /// Print the final summary as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ConfigFormat {
    Yaml,
    Toml,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ProgressArg {
    Lines,
    Bar,
    Quiet,
}

impl From<ProgressArg> for ProgressMode {
    fn from(arg: ProgressArg) -> Self {
        match arg {
            ProgressArg::Lines => ProgressMode::Lines,
            ProgressArg::Bar => ProgressMode::Bar,
            ProgressArg::Quiet => ProgressMode::Quiet,
        }
    }
}

impl Args {
    fn apply(&self, config: &mut BenchConfig) {
        if let Some(path) = &self.queries {
            config.dataset.query_file = path.clone();
        }
        if let Some(path) = &self.ground_truth {
            config.dataset.ground_truth_file = path.clone();
        }
        if self.first.is_some() {
            config.dataset.first = self.first;
        }
        if self.last.is_some() {
            config.dataset.last = self.last;
        }
        if let Some(k) = self.k {
            config.query.k = k;
        }
        if let Some(probes) = self.probes {
            config.query.probes = probes;
        }
        if let Some(dialect) = self.dialect {
            config.query.dialect = dialect;
        }
        if self.normalize {
            config.query.normalize = true;
        }
        if self.no_normalize {
            config.query.normalize = false;
        }
        if let Some(concurrency) = self.concurrency {
            config.run.concurrency = concurrency;
        }
        if let Some(warmup) = self.warmup {
            config.run.warmup_queries = warmup;
        }
        if let Some(metric) = self.recall_metric {
            config.run.recall_metric = metric;
        }
        if let Some(progress) = self.progress {
            config.run.progress = progress.into();
        }
    }
}

fn init_logging(config: &BenchConfig) {
    let level = config.logging.level.as_str();
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        format!("vecprobe_engine={level},vecprobe_bench={level},vecprobe={level}").into()
    });

    match config.logging.format {
        LogFormat::Json => tracing_subscriber::registry()
            .with(env_filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .with_writer(std::io::stderr)
                    .json()
                    .with_target(true),
            )
            .init(),
        LogFormat::Text => tracing_subscriber::registry()
            .with(env_filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(true),
            )
            .init(),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    if let Some(format) = args.generate_config {
        match format {
            ConfigFormat::Yaml => print!("{}", generate_example_yaml()),
            ConfigFormat::Toml => print!("{}", generate_example_toml()),
        }
        return Ok(());
    }

    let mut config = BenchConfig::load(args.config.as_deref()).context("failed to load config")?;
    args.apply(&mut config);
    init_logging(&config);
    config.validate().context("invalid configuration")?;

    let provider = Arc::new(UrlProvider::new(config.connection.url.clone()));
    let progress = create_progress(config.run.progress);
    let mut runner = BenchmarkRunner::new(config, provider, progress);

    let summary = runner.run().await?;

    if args.json {
        ResultsReporter::print_json(&summary).context("failed to serialize summary")?;
    } else {
        ResultsReporter::print_summary(&summary);
    }
    Ok(())
}
