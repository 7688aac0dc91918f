use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use nameresolve::io::{self, CsvLayout};
use nameresolve::metrics::{pairwise_confusion, ConfusionMatrix};
use nameresolve::{CandidateStrategy, MergeStrategy, Resolution, Resolver, ResolverConfig};

const LOG_ENV: &str = "NAMERESOLVE_LOG";
const DEFAULT_LOG_FILTER: &str = "nameresolve=info";

/// Group name records that refer to the same person within a jurisdiction
#[derive(Parser, Debug)]
#[command(name = "nameresolve", version)]
struct Cli {
    /// Input CSV with a header row.
    #[arg(long)]
    input: PathBuf,

    /// Output CSV; replaced atomically once resolution finishes.
    #[arg(long)]
    output: PathBuf,

    /// TOML configuration file. Flags below override its values.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Similarity a pair must exceed to be linked.
    #[arg(long)]
    threshold: Option<f64>,

    /// Character n-gram length.
    #[arg(long)]
    ngram_size: Option<usize>,

    /// Candidate generation.
    #[arg(long, value_enum)]
    strategy: Option<StrategyArg>,

    /// Group merging.
    #[arg(long, value_enum)]
    merge: Option<MergeArg>,

    #[arg(long, default_value = io::DEFAULT_NAME_COLUMN)]
    name_column: String,

    #[arg(long, default_value = io::DEFAULT_JURISDICTION_COLUMN)]
    jurisdiction_column: String,

    /// Column holding reference group labels; logs pairwise precision and recall.
    #[arg(long)]
    truth_column: Option<String>,

    /// Process partitions one at a time.
    #[arg(long)]
    sequential: bool,

    /// Log filter, e.g. `debug` or `nameresolve=trace`. Overrides NAMERESOLVE_LOG.
    #[arg(long)]
    log_level: Option<String>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum StrategyArg {
    Exhaustive,
    Blocked,
}

impl From<StrategyArg> for CandidateStrategy {
    fn from(arg: StrategyArg) -> Self {
        match arg {
            StrategyArg::Exhaustive => CandidateStrategy::Exhaustive,
            StrategyArg::Blocked => CandidateStrategy::Blocked,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum MergeArg {
    UnionFind,
    Relabel,
}

impl From<MergeArg> for MergeStrategy {
    fn from(arg: MergeArg) -> Self {
        match arg {
            MergeArg::UnionFind => MergeStrategy::UnionFind,
            MergeArg::Relabel => MergeStrategy::Relabel,
        }
    }
}

fn init_tracing(level: Option<&str>) {
    let filter = match level {
        Some(level) => EnvFilter::try_new(level).ok(),
        None => EnvFilter::try_from_env(LOG_ENV).ok(),
    }
    .unwrap_or_else(|| EnvFilter::new(DEFAULT_LOG_FILTER));

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
        .with(filter)
        .init();
}

fn build_config(cli: &Cli) -> Result<ResolverConfig> {
    let mut config = match &cli.config {
        Some(path) => ResolverConfig::load(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => ResolverConfig::default(),
    };
    if let Some(threshold) = cli.threshold {
        config.scorer.threshold = threshold;
    }
    if let Some(ngram_size) = cli.ngram_size {
        config.scorer.ngram_size = ngram_size;
    }
    if let Some(strategy) = cli.strategy {
        config.scorer.candidates = strategy.into();
    }
    if let Some(merge) = cli.merge {
        config.merge = merge.into();
    }
    if cli.sequential {
        config.parallel = false;
    }
    config.validate().context("invalid configuration")?;
    Ok(config)
}

/// Pairwise agreement of group ids with a labeled column; unlabeled rows are skipped.
fn truth_agreement(resolution: &Resolution, column: usize) -> (usize, ConfusionMatrix) {
    let (predicted, truth): (Vec<u64>, Vec<&str>) = resolution
        .records
        .iter()
        .filter_map(|r| {
            let label = r.columns.get(column)?.trim();
            (!label.is_empty()).then_some((r.group_id, label))
        })
        .unzip();
    (predicted.len(), pairwise_confusion(&predicted, &truth))
}

fn report_truth(resolution: &Resolution, column: usize, name: &str) {
    let (labeled, cm) = truth_agreement(resolution, column);
    info!(
        column = name,
        labeled,
        precision = cm.precision(),
        recall = cm.recall(),
        f1 = cm.f1(),
        "pairwise agreement with labels"
    );
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_level.as_deref());

    let config = build_config(&cli)?;
    let layout = CsvLayout {
        name_column: cli.name_column.clone(),
        jurisdiction_column: cli.jurisdiction_column.clone(),
    };

    let table = io::read_path(&cli.input, &layout)
        .with_context(|| format!("failed to read {}", cli.input.display()))?;
    let truth_column = match &cli.truth_column {
        Some(name) => Some(
            table
                .column_index(name)
                .with_context(|| format!("truth column '{name}' not in input header"))?,
        ),
        None => None,
    };
    info!(rows = table.rows.len(), input = %cli.input.display(), "loaded input");

    let resolver = Resolver::new(config).context("invalid configuration")?;
    let resolution = resolver.resolve(table.rows);

    if let (Some(column), Some(name)) = (truth_column, cli.truth_column.as_deref()) {
        report_truth(&resolution, column, name);
    }

    io::write_path(&cli.output, &table.headers, &resolution.records)
        .with_context(|| format!("failed to write {}", cli.output.display()))?;

    let stats = &resolution.stats;
    info!(
        records = stats.records,
        duplicates_dropped = stats.duplicates_dropped,
        groups = stats.groups,
        output = %cli.output.display(),
        "done"
    );
    Ok(())
}
