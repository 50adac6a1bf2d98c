//! Screenlab CLI — pick, time, split and synthetic-data commands.
//!
//! Commands:
//! - `pick` — screen a universe through the pick factor chain
//! - `time` — run buy/sell timing factors over candidates
//! - `split status` / `split show` — inspect persisted train/test lists
//! - `synth` — write deterministic synthetic histories into the CSV store

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;

use screenlab_core::data::{
    CsvSeriesStore, SeriesProvider, SyntheticProvider, Universe, UniverseSource,
};
use screenlab_core::domain::Symbol;
use screenlab_core::env::{EnvSnapshot, MarketTarget, SharedEnv};
use screenlab_core::factors::FactorRequest;
use screenlab_runner::{
    JsonSplitStore, ProgressTracker, ScreenConfig, Screener, SplitKind, SplitStore,
};

#[derive(Parser)]
#[command(
    name = "screenlab",
    about = "Screenlab CLI — partitioned stock screening and signal timing"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Args)]
struct RunArgs {
    /// Path to a TOML run config.
    #[arg(long)]
    config: PathBuf,

    /// Universe TOML (sectors of symbols). Defaults to every symbol in the CSV store.
    #[arg(long)]
    universe: Option<PathBuf>,

    /// Explicit candidates; overrides the config's [select] symbols.
    #[arg(long, value_delimiter = ',')]
    symbols: Option<Vec<String>>,

    /// Requested worker count; overrides the config. 0 = all cores.
    #[arg(long)]
    workers: Option<usize>,

    /// Resolve series from the synthetic generator instead of the CSV store.
    #[arg(long, default_value_t = false)]
    synthetic: bool,

    /// Write the JSON result here instead of stdout.
    #[arg(long)]
    output: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Screen candidates through the pick factor chain.
    Pick(RunArgs),
    /// Run timing factors over candidates and report signals.
    Time(RunArgs),
    /// Persisted train/test split commands.
    Split {
        #[command(subcommand)]
        action: SplitAction,
    },
    /// Write synthetic CSV histories for the given symbols.
    Synth {
        /// Symbols to generate.
        #[arg(required = true)]
        symbols: Vec<String>,

        /// Bars per symbol.
        #[arg(long, default_value_t = 504)]
        bars: usize,

        /// Data directory. Defaults to ./data.
        #[arg(long, default_value = "data")]
        data_dir: PathBuf,

        #[arg(long, value_enum, default_value_t = MarketArg::Us)]
        market: MarketArg,
    },
}

#[derive(Subcommand)]
enum SplitAction {
    /// Report which split lists exist and their sizes.
    Status {
        #[arg(long)]
        config: PathBuf,
    },
    /// Print one split list.
    Show {
        #[arg(long)]
        config: PathBuf,

        #[arg(long, value_enum)]
        kind: KindArg,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum KindArg {
    Train,
    Test,
}

impl From<KindArg> for SplitKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Train => SplitKind::Train,
            KindArg::Test => SplitKind::Test,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum MarketArg {
    Us,
    Cn,
    Hk,
    Coin,
    FuturesCn,
    FuturesGlobal,
    OptionsUs,
}

impl From<MarketArg> for MarketTarget {
    fn from(market: MarketArg) -> Self {
        match market {
            MarketArg::Us => MarketTarget::Us,
            MarketArg::Cn => MarketTarget::Cn,
            MarketArg::Hk => MarketTarget::Hk,
            MarketArg::Coin => MarketTarget::Coin,
            MarketArg::FuturesCn => MarketTarget::FuturesCn,
            MarketArg::FuturesGlobal => MarketTarget::FuturesGlobal,
            MarketArg::OptionsUs => MarketTarget::OptionsUs,
        }
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Pick(args) => run_pick(&args),
        Commands::Time(args) => run_time(&args),
        Commands::Split { action } => match action {
            SplitAction::Status { config } => run_split_status(&config),
            SplitAction::Show { config, kind } => run_split_show(&config, kind.into()),
        },
        Commands::Synth {
            symbols,
            bars,
            data_dir,
            market,
        } => run_synth(&symbols, bars, &data_dir, market.into()),
    }
}

/// Config with command-line overrides applied.
fn load_config(args: &RunArgs) -> Result<ScreenConfig> {
    let mut config = ScreenConfig::from_file(&args.config)
        .with_context(|| format!("loading {}", args.config.display()))?;
    if let Some(symbols) = &args.symbols {
        config.select.symbols = Some(symbols.clone());
    }
    if let Some(workers) = args.workers {
        config.select.workers = workers;
    }
    Ok(config)
}

/// Series provider and universe source selected by the flags.
fn sources(
    args: &RunArgs,
    env: &EnvSnapshot,
) -> Result<(Box<dyn SeriesProvider>, Box<dyn UniverseSource>)> {
    let store = CsvSeriesStore::from_env(env);
    let provider: Box<dyn SeriesProvider> = if args.synthetic {
        Box::new(SyntheticProvider::default())
    } else {
        Box::new(store.clone())
    };

    let universe: Box<dyn UniverseSource> = match &args.universe {
        Some(path) => {
            let universe = Universe::from_file(path)
                .with_context(|| format!("loading {}", path.display()))?;
            info!(path = %path.display(), tickers = universe.ticker_count(), "universe loaded");
            Box::new(universe)
        }
        None if args.synthetic && args.symbols.is_none() => {
            bail!("--synthetic needs --universe or --symbols to know which symbols to screen")
        }
        None => Box::new(store),
    };
    Ok((provider, universe))
}

fn labels(requests: &[FactorRequest]) -> Vec<&str> {
    requests.iter().map(FactorRequest::label).collect()
}

/// Log progress every half second until `done` is set.
fn watch_progress(progress: &ProgressTracker, done: &AtomicBool) {
    while !done.load(Ordering::Relaxed) {
        std::thread::sleep(Duration::from_millis(500));
        let snap = progress.snapshot();
        if snap.total > 0 && !done.load(Ordering::Relaxed) {
            info!(
                processed = snap.processed,
                total = snap.total,
                accepted = snap.accepted,
                "progress {:.0}%",
                snap.fraction() * 100.0
            );
        }
    }
}

fn emit(value: &impl serde::Serialize, output: Option<&Path>) -> Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    match output {
        Some(path) => {
            std::fs::write(path, json).with_context(|| format!("writing {}", path.display()))?;
            info!(path = %path.display(), "result written");
        }
        None => println!("{json}"),
    }
    Ok(())
}

fn run_pick(args: &RunArgs) -> Result<()> {
    let config = load_config(args)?;
    if config.pick_factors.is_empty() {
        info!("no pick factors configured; every candidate will pass");
    } else {
        info!(factors = ?labels(&config.pick_factors), "pick chain");
    }
    let env = SharedEnv::new(config.env.clone());
    let snapshot = env.snapshot();
    let (provider, universe) = sources(args, &snapshot)?;
    let splits = JsonSplitStore::from_env(&snapshot);
    let screener = Screener::new(&env, provider.as_ref(), universe.as_ref(), &splits);

    let progress = ProgressTracker::new();
    let done = AtomicBool::new(false);
    let result = std::thread::scope(|s| {
        s.spawn(|| watch_progress(&progress, &done));
        let result = screener.select_with_progress(&config.select_request(), &progress);
        done.store(true, Ordering::Relaxed);
        result
    })?;

    info!(
        selected = result.symbols.len(),
        evaluated = result.stats.evaluated,
        data_rejections = result.stats.data_rejections,
        vetoes = result.stats.total_vetoes(),
        workers = result.workers,
        "pick complete"
    );
    emit(&result, args.output.as_deref())
}

fn run_time(args: &RunArgs) -> Result<()> {
    let config = load_config(args)?;
    if config.buy_factors.is_empty() && config.sell_factors.is_empty() {
        bail!("no [[buy_factors]] or [[sell_factors]] in {}", args.config.display());
    }
    info!(
        buy = ?labels(&config.buy_factors),
        sell = ?labels(&config.sell_factors),
        "timing chains"
    );
    let env = SharedEnv::new(config.env.clone());
    let snapshot = env.snapshot();
    let (provider, universe) = sources(args, &snapshot)?;
    let splits = JsonSplitStore::from_env(&snapshot);
    let screener = Screener::new(&env, provider.as_ref(), universe.as_ref(), &splits);

    let progress = ProgressTracker::new();
    let done = AtomicBool::new(false);
    let result = std::thread::scope(|s| {
        s.spawn(|| watch_progress(&progress, &done));
        let result = screener.time_with_progress(&config.timing_request(), &progress);
        done.store(true, Ordering::Relaxed);
        result
    })?;

    info!(
        symbols = result.symbols.len(),
        signals = result.signals.len(),
        workers = result.workers,
        "timing complete"
    );
    emit(&result, args.output.as_deref())
}

fn split_store(config_path: &Path) -> Result<(JsonSplitStore, MarketTarget)> {
    let config = ScreenConfig::from_file(config_path)
        .with_context(|| format!("loading {}", config_path.display()))?;
    let snapshot = EnvSnapshot::new(config.env);
    Ok((JsonSplitStore::from_env(&snapshot), snapshot.market_target()))
}

fn run_split_status(config_path: &Path) -> Result<()> {
    let (store, market) = split_store(config_path)?;
    println!("Split directory: {}", store.dir().display());
    for kind in [SplitKind::Train, SplitKind::Test] {
        match store.load(market, kind) {
            Ok(symbols) => println!("  {market} {kind}: {} symbols", symbols.len()),
            Err(e) => println!("  {market} {kind}: {e}"),
        }
    }
    Ok(())
}

fn run_split_show(config_path: &Path, kind: SplitKind) -> Result<()> {
    let (store, market) = split_store(config_path)?;
    let symbols: Vec<Symbol> = store.load(market, kind)?;
    for symbol in symbols {
        println!("{symbol}");
    }
    Ok(())
}

fn run_synth(symbols: &[String], bars: usize, data_dir: &Path, market: MarketTarget) -> Result<()> {
    if bars == 0 {
        bail!("--bars must be at least 1");
    }
    let generator = SyntheticProvider::new(bars, SyntheticProvider::default().end());
    let store = CsvSeriesStore::new(data_dir);
    for symbol in symbols {
        let history = generator.generate(symbol);
        store.write(market, symbol, &history)?;
        info!(symbol = %symbol, bars = history.len(), "synthetic history written");
    }
    println!(
        "Wrote {} symbols to {}",
        symbols.len(),
        store.root().join(market.as_str()).display()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pick_args_parse_symbol_list() {
        let cli = Cli::try_parse_from([
            "screenlab",
            "pick",
            "--config",
            "screen.toml",
            "--symbols",
            "AAPL,MSFT",
            "--workers",
            "4",
            "--synthetic",
        ])
        .unwrap();
        let Commands::Pick(args) = cli.command else {
            panic!("expected pick");
        };
        assert_eq!(args.symbols, Some(vec!["AAPL".to_string(), "MSFT".to_string()]));
        assert_eq!(args.workers, Some(4));
        assert!(args.synthetic);
        assert!(args.universe.is_none());
    }

    #[test]
    fn synthetic_without_symbols_or_universe_is_rejected() {
        let cli = Cli::try_parse_from(["screenlab", "time", "--config", "x.toml", "--synthetic"])
            .unwrap();
        let Commands::Time(args) = cli.command else {
            panic!("expected time");
        };
        let err = sources(&args, &EnvSnapshot::default()).err().unwrap();
        assert!(err.to_string().contains("--synthetic"));
    }

    #[test]
    fn synth_defaults() {
        let cli = Cli::try_parse_from(["screenlab", "synth", "SPY", "QQQ"]).unwrap();
        let Commands::Synth {
            symbols,
            bars,
            data_dir,
            market,
        } = cli.command
        else {
            panic!("expected synth");
        };
        assert_eq!(symbols, vec!["SPY", "QQQ"]);
        assert_eq!(bars, 504);
        assert_eq!(data_dir, PathBuf::from("data"));
        assert_eq!(MarketTarget::from(market), MarketTarget::Us);
    }

    #[test]
    fn split_show_takes_kind() {
        let cli = Cli::try_parse_from([
            "screenlab",
            "split",
            "show",
            "--config",
            "x.toml",
            "--kind",
            "test",
        ])
        .unwrap();
        let Commands::Split {
            action: SplitAction::Show { kind, .. },
        } = cli.command
        else {
            panic!("expected split show");
        };
        assert_eq!(SplitKind::from(kind), SplitKind::Test);
    }
}
