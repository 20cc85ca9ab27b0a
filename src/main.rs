mod app;
mod state;
mod ui;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use eframe::egui;

use correlnet::data::filter::{select_columns, split_target};
use correlnet::data::loader::{load_file, load_groups, LoadOptions};
use correlnet::{
    correlnet, Correction, CorrelationMethod, Dataset, EmbeddingKind, NetworkConfig, VariableGroups,
};

use app::CorrelNetApp;
use state::AppState;

const DEFAULT_SEED: u64 = 19;

/// Draw a correlation network for a data file.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Input data (.csv, .json or .parquet).
    input: PathBuf,

    /// Columns to include (default: every numeric column).
    #[arg(long, num_args = 1.., value_delimiter = ',')]
    columns: Vec<String>,

    /// The first CSV column is a row index.
    #[arg(long)]
    index_col: bool,

    /// Column to colour nodes by; it is not part of the network.
    #[arg(long)]
    target: Option<String>,

    /// Variable → group file (.csv or .json).
    #[arg(long)]
    groups: Option<PathBuf>,

    /// Correlation method: pearson, spearman or kendall.
    #[arg(long)]
    method: Option<CorrelationMethod>,

    /// Node positions: random, var_tsne or correl_tsne.
    #[arg(long)]
    pos: Option<EmbeddingKind>,

    /// Multiple-comparison correction: none, bonferroni, holm or fdr_bh.
    #[arg(long)]
    correction: Option<Correction>,

    /// Significance threshold.
    #[arg(long)]
    alpha: Option<f64>,

    /// t-SNE perplexity.
    #[arg(long)]
    perplexity: Option<f64>,

    /// Random seed for the layout.
    #[arg(long)]
    seed: Option<u64>,

    /// Figure title.
    #[arg(long)]
    title: Option<String>,

    /// JSON configuration; flags given here override it.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Also write the edge list as CSV.
    #[arg(long)]
    edges: Option<PathBuf>,

    /// Also write the network as JSON.
    #[arg(long)]
    json: Option<PathBuf>,

    /// Output image (.png or .svg).
    #[arg(short, long, default_value = "correlnet.png")]
    output: PathBuf,

    /// Open the interactive viewer instead of writing an image.
    #[arg(long)]
    view: bool,

    /// Show debug info.
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn network_config(&self) -> Result<NetworkConfig> {
        let mut config = match &self.config {
            Some(path) => NetworkConfig::load(path)
                .with_context(|| format!("reading config {}", path.display()))?,
            None => NetworkConfig::default(),
        };
        if let Some(method) = self.method {
            config.method = method;
        }
        if let Some(pos) = self.pos {
            config.embedding = pos;
        }
        if let Some(correction) = self.correction {
            config.correction = correction;
        }
        if let Some(alpha) = self.alpha {
            config.alpha = alpha;
        }
        if let Some(perplexity) = self.perplexity {
            config.tsne.perplexity = perplexity;
        }
        if let Some(title) = &self.title {
            config.plot.title = Some(title.clone());
        }
        config.seed = self.seed.or(config.seed).or(Some(DEFAULT_SEED));
        config.validate()?;
        Ok(config)
    }
}

fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
}

fn run(cli: Cli) -> Result<()> {
    let config = cli.network_config()?;
    log::debug!("{config:?}");

    let options = LoadOptions {
        index_col: cli.index_col,
    };
    let dataset = load_file(&cli.input, &options)
        .with_context(|| format!("loading {}", cli.input.display()))?;
    let groups = cli
        .groups
        .as_deref()
        .map(load_groups)
        .transpose()
        .context("loading groups")?;

    if cli.view {
        return view(dataset, groups, &cli, config);
    }

    let (dataset, target) = match &cli.target {
        Some(col) => {
            let (ds, target) = split_target(dataset, col)?;
            (ds, Some(target))
        }
        None => (dataset, None),
    };
    let dataset = select_columns(dataset, &cli.columns)?;

    let net = correlnet(dataset, target.as_deref(), groups, &config)?;

    for path in [Some(&cli.output), cli.edges.as_ref(), cli.json.as_ref()]
        .into_iter()
        .flatten()
    {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            log::debug!("creating output path {}", parent.display());
            std::fs::create_dir_all(parent)
                .with_context(|| format!("creating {}", parent.display()))?;
        }
    }

    net.plot(&cli.output)?;
    if let Some(path) = &cli.edges {
        net.save_edge_list(path)?;
    }
    if let Some(path) = &cli.json {
        net.save_json(path)?;
    }
    Ok(())
}

/// Hand the loaded data to the viewer; it splits off the target itself.
fn view(
    dataset: Dataset,
    groups: Option<VariableGroups>,
    cli: &Cli,
    config: NetworkConfig,
) -> Result<()> {
    let mut columns = cli.columns.clone();
    if let Some(target) = &cli.target {
        if !columns.is_empty() && !columns.contains(target) {
            columns.push(target.clone());
        }
    }
    let dataset = select_columns(dataset, &columns)?;

    let mut state = AppState::new(config);
    state.groups = groups;
    state.target_column = cli.target.clone();
    state.set_dataset(dataset, Some(cli.input.clone()));

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1200.0, 800.0])
            .with_min_inner_size([600.0, 400.0]),
        ..Default::default()
    };

    eframe::run_native(
        "correlnet – Correlation Network",
        options,
        Box::new(|_cc| Ok(Box::new(CorrelNetApp::new(state)))),
    )
    .map_err(|e| anyhow::anyhow!("viewer failed: {e}"))
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(e) = run(cli) {
        log::error!("Error: {e:#}");
        std::process::exit(1);
    }
}
