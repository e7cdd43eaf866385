//! Netfolio CLI — analysis, inspection, sweep and demo-data commands.
//!
//! Commands:
//! - `analyze` — run the pipeline from a TOML config or flags, write the
//!   report, diagnostics and classification CSV
//! - `inspect` — print centralities and reference stocks for one price span
//! - `sweep` — run both selection strategies and compare validation Sharpe
//! - `synth` — write a synthetic historical/validation price pair

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};
use netfolio_core::data::read_price_table;
use netfolio_core::pipeline::{inspect, PeriodRange};
use netfolio_core::{CentralityConfig, SelectionStrategy};
use netfolio_runner::{
    default_strategies, load_context, run_analysis, sweep_csv, write_price_csv, write_run,
    DateSpan, LoadOptions, RunConfig, RunOutput, StrategySweep, SyntheticMarket,
};
use std::path::{Path, PathBuf};
use tracing_subscriber::prelude::*;

#[derive(Parser)]
#[command(
    name = "netfolio",
    about = "Netfolio — correlation-network centrality and portfolio selection"
)]
struct Cli {
    /// Log at debug level (RUST_LOG overrides).
    #[arg(short, long, global = true, default_value_t = false)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum StrategyArg {
    MultiPeriod,
    CombinedScore,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one analysis and write its artifacts.
    Analyze {
        /// Path to a TOML config file.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Historical price table (CSV or Parquet), when not using --config.
        #[arg(long)]
        historical: Option<PathBuf>,

        /// Validation price table, when not using --config.
        #[arg(long)]
        validation: Option<PathBuf>,

        /// Selection strategy, overriding the config.
        #[arg(long, value_enum)]
        strategy: Option<StrategyArg>,

        /// Portfolio size, overriding the config.
        #[arg(long)]
        size: Option<usize>,

        /// First analysis year.
        #[arg(long)]
        first_year: Option<i32>,

        /// Last analysis year.
        #[arg(long)]
        last_year: Option<i32>,

        /// Skip eigenvector centrality.
        #[arg(long, default_value_t = false)]
        no_eigenvector: bool,

        /// Generate synthetic data when a price file is missing.
        #[arg(long, default_value_t = false)]
        synthetic: bool,

        /// Output directory, overriding the config.
        #[arg(long)]
        output_dir: Option<PathBuf>,
    },
    /// Print centralities and distance references for one span of a table.
    Inspect {
        /// Price table (CSV or Parquet).
        prices: PathBuf,

        /// Span start (YYYY-MM-DD). Defaults to the first row.
        #[arg(long)]
        start: Option<String>,

        /// Span end (YYYY-MM-DD). Defaults to the last row.
        #[arg(long)]
        end: Option<String>,

        /// Number of stocks to list from each end of the ranking.
        #[arg(long, default_value_t = 10)]
        top: usize,

        /// Print the full inspection as JSON instead of a table.
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Run both selection strategies over the same data.
    Sweep {
        /// Path to a TOML config file.
        #[arg(long)]
        config: PathBuf,

        /// Generate synthetic data when a price file is missing.
        #[arg(long, default_value_t = false)]
        synthetic: bool,

        /// Run strategies one after another.
        #[arg(long, default_value_t = false)]
        sequential: bool,
    },
    /// Write synthetic historical.csv and validation.csv.
    Synth {
        /// Output directory.
        #[arg(long, default_value = "data")]
        output_dir: PathBuf,

        /// Number of symbols.
        #[arg(long, default_value_t = 40)]
        symbols: usize,

        /// First historical year.
        #[arg(long, default_value_t = 2011)]
        first_year: i32,

        /// Last historical year; the year after is validation.
        #[arg(long, default_value_t = 2020)]
        last_year: i32,

        /// Seed label.
        #[arg(long, default_value = "netfolio")]
        seed: String,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Analyze {
            config,
            historical,
            validation,
            strategy,
            size,
            first_year,
            last_year,
            no_eigenvector,
            synthetic,
            output_dir,
        } => {
            let mut run_config = match (config, historical, validation) {
                (Some(path), None, None) => RunConfig::from_file(&path)?,
                (None, Some(h), Some(v)) => RunConfig::new(h, v),
                (Some(_), _, _) => {
                    bail!("--config and --historical/--validation are mutually exclusive")
                }
                _ => bail!("either --config or both --historical and --validation are required"),
            };
            apply_overrides(
                &mut run_config,
                strategy,
                size,
                first_year,
                last_year,
                no_eigenvector,
                output_dir,
            );
            run_config.validate()?;
            run_analyze_cmd(&run_config, synthetic)
        }
        Commands::Inspect {
            prices,
            start,
            end,
            top,
            json,
        } => run_inspect_cmd(&prices, start.as_deref(), end.as_deref(), top, json),
        Commands::Sweep {
            config,
            synthetic,
            sequential,
        } => run_sweep_cmd(&config, synthetic, sequential),
        Commands::Synth {
            output_dir,
            symbols,
            first_year,
            last_year,
            seed,
        } => run_synth_cmd(&output_dir, symbols, first_year, last_year, seed),
    }
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_level.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn apply_overrides(
    config: &mut RunConfig,
    strategy: Option<StrategyArg>,
    size: Option<usize>,
    first_year: Option<i32>,
    last_year: Option<i32>,
    no_eigenvector: bool,
    output_dir: Option<PathBuf>,
) {
    if let Some(strategy) = strategy {
        config.selection = match strategy {
            StrategyArg::MultiPeriod => SelectionStrategy::default(),
            StrategyArg::CombinedScore => SelectionStrategy::combined_score(15),
        };
    }
    if let Some(size) = size {
        match &mut config.selection {
            SelectionStrategy::MultiPeriod { target_size, .. } => *target_size = size,
            SelectionStrategy::CombinedScore { size: s } => *s = size,
        }
    }
    if first_year.is_some() || last_year.is_some() {
        config.periods = PeriodRange {
            first_year: first_year.or(config.periods.first_year),
            last_year: last_year.or(config.periods.last_year),
        };
    }
    if no_eigenvector {
        config.centrality = CentralityConfig {
            eigenvector: false,
            ..config.centrality.clone()
        };
    }
    if let Some(dir) = output_dir {
        config.output.dir = dir;
    }
}

fn run_analyze_cmd(config: &RunConfig, synthetic: bool) -> Result<()> {
    let opts = LoadOptions {
        synthetic,
        ..LoadOptions::default()
    };
    let output = run_analysis(config, &opts)?;
    print_summary(&output);

    let run_dir = config.output.dir.join(&output.metadata.run_id[..12]);
    let written = write_run(&output, &run_dir)?;
    println!("Artifacts saved to: {} ({} files)", run_dir.display(), written.len());
    Ok(())
}

fn print_summary(output: &RunOutput) {
    let report = &output.analysis.report;
    let diagnostics = &output.analysis.diagnostics;

    println!();
    println!("=== Netfolio Analysis ===");
    println!("Strategy:    {}", output.metadata.strategy);
    println!("Dataset:     {}", output.metadata.historical_hash.short());
    if output.metadata.has_synthetic {
        println!("Data:        SYNTHETIC");
    }
    println!("Periods:     {}", diagnostics.periods.len());
    println!();
    println!("Central:     {}", report.portfolios.central_portfolio.join(", "));
    println!("Peripheral:  {}", report.portfolios.peripheral_portfolio.join(", "));
    if diagnostics.distance_ranking.observations() > 0 {
        println!("Near refs:   {}", diagnostics.distance_ranking.nearest(5).join(", "));
        println!("Far refs:    {}", diagnostics.distance_ranking.farthest(5).join(", "));
    }
    println!();
    println!("{:<12} {:>10} {:>10} {:>8}", "", "return", "vol", "sharpe");
    for (name, perf) in [
        ("central", &report.performance.central),
        ("peripheral", &report.performance.peripheral),
    ] {
        let v = perf.validation;
        println!(
            "{:<12} {:>10.5} {:>10.5} {:>8.3}",
            name, v.average_return, v.volatility, v.sharpe_ratio
        );
    }
    if !diagnostics.warnings.is_empty() {
        println!();
        for warning in &diagnostics.warnings {
            println!("warning: {warning}");
        }
    }
    println!();
}

fn parse_date(value: Option<&str>) -> Result<Option<NaiveDate>> {
    value
        .map(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d"))
        .transpose()
        .context("dates must be YYYY-MM-DD")
}

fn run_inspect_cmd(
    path: &Path,
    start: Option<&str>,
    end: Option<&str>,
    top: usize,
    json: bool,
) -> Result<()> {
    let table = read_price_table(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let prices = match (parse_date(start)?, parse_date(end)?) {
        (None, None) => table.prices,
        (s, e) => {
            let s = s.or(table.prices.first_date()).unwrap_or_default();
            let e = e.or(table.prices.last_date()).unwrap_or_default();
            table.prices.between(s, e)
        }
    };

    let inspection = inspect(&prices, &CentralityConfig::default())?;
    if json {
        println!("{}", serde_json::to_string_pretty(&inspection)?);
        return Ok(());
    }

    let summary = &inspection.network;
    println!(
        "{} symbols, {} observations, tree weight {:.4}, mean correlation {:.4}",
        summary.symbols, summary.observations, summary.total_weight, summary.average_correlation
    );
    if let Some(criteria) = &inspection.distance_criteria {
        for (name, reference) in criteria.iter() {
            println!("reference by {name}: {}", reference.reference);
        }
    }

    let mut ranked: Vec<_> = inspection
        .centrality
        .iter()
        .map(|(symbol, c)| (symbol.clone(), *c))
        .collect();
    ranked.sort_by(|a, b| b.1.combined().total_cmp(&a.1.combined()).then_with(|| a.0.cmp(&b.0)));

    println!();
    println!(
        "{:<10} {:>8} {:>12} {:>10} {:>12} {:>9}",
        "symbol", "degree", "betweenness", "closeness", "eigenvector", "combined"
    );
    let n = ranked.len();
    for (i, (symbol, c)) in ranked.iter().enumerate() {
        if i >= top && i + top < n {
            if i == top {
                println!("{:<10}", "...");
            }
            continue;
        }
        let eigen = c
            .eigenvector
            .map_or_else(|| "-".to_string(), |e| format!("{e:.4}"));
        println!(
            "{:<10} {:>8.4} {:>12.4} {:>10.4} {:>12} {:>9.4}",
            symbol,
            c.degree,
            c.betweenness,
            c.closeness,
            eigen,
            c.combined()
        );
    }
    Ok(())
}

fn run_sweep_cmd(config_path: &Path, synthetic: bool, sequential: bool) -> Result<()> {
    let config = RunConfig::from_file(config_path)?;
    let opts = LoadOptions {
        synthetic,
        ..LoadOptions::default()
    };
    let loaded = load_context(&config.data, &opts)?;

    let sweep = StrategySweep::new().with_parallelism(!sequential);
    let results = sweep.sweep(&config, &default_strategies(), &loaded)?;
    let rows = results.comparison();

    println!();
    println!(
        "{:<16} {:>14} {:>17} {:>8}",
        "strategy", "central sharpe", "peripheral sharpe", "spread"
    );
    for row in &rows {
        println!(
            "{:<16} {:>14.3} {:>17.3} {:>8.3}",
            row.strategy, row.central.sharpe_ratio, row.peripheral.sharpe_ratio, row.sharpe_spread
        );
    }
    if let Some(best) = results.best_central() {
        println!();
        println!("Best central portfolio: {}", best.metadata.strategy);
    }

    std::fs::create_dir_all(&config.output.dir)
        .with_context(|| format!("failed to create {}", config.output.dir.display()))?;
    let path = config.output.dir.join("sweep.csv");
    std::fs::write(&path, sweep_csv(&rows)?)
        .with_context(|| format!("failed to write {}", path.display()))?;
    println!("Comparison saved to: {}", path.display());
    Ok(())
}

fn run_synth_cmd(
    output_dir: &Path,
    symbols: usize,
    first_year: i32,
    last_year: i32,
    seed: String,
) -> Result<()> {
    if symbols < 2 {
        bail!("need at least 2 symbols, got {symbols}");
    }
    if first_year > last_year {
        bail!("first year {first_year} is after last year {last_year}");
    }
    let (Some(historical), Some(validation)) = (
        DateSpan::years(first_year, last_year),
        DateSpan::years(last_year + 1, last_year + 1),
    ) else {
        bail!("years out of range");
    };

    let market = SyntheticMarket::new(symbols, historical.start, validation.end)
        .with_seed(seed)
        .generate()?;
    tracing::info!(symbols, rows = market.n_rows(), "generated synthetic market");

    std::fs::create_dir_all(output_dir)
        .with_context(|| format!("failed to create {}", output_dir.display()))?;
    let historical_path = output_dir.join("historical.csv");
    let validation_path = output_dir.join("validation.csv");
    write_price_csv(
        &market.between(historical.start, historical.end),
        &historical_path,
    )?;
    write_price_csv(&market.year(last_year + 1), &validation_path)?;

    println!("Wrote {} and {}", historical_path.display(), validation_path.display());
    Ok(())
}
