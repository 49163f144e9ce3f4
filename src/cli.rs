//! CLI definition and dispatch.

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{Level, info};
use tracing_subscriber::FmtSubscriber;

use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::csv_report::CsvReportAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::table_report::TableReportAdapter;
use crate::domain::comparison::{StrategyRun, compare_strategies};
use crate::domain::config_validation::{
    DataSettings, load_compare_rows, load_compare_strategies, load_data_settings,
    load_simulation_config, load_sweep_config, validate_config,
};
use crate::domain::error::StratsweepError;
use crate::domain::price::PriceBar;
use crate::domain::simulator::{RunOutcome, simulate};
use crate::domain::strategy::{Strategy, StrategyKind};
use crate::domain::sweep::{SweepResult, sweep};
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::DataPort;
use crate::ports::report_port::ReportPort;

#[derive(Parser, Debug)]
#[command(
    name = "stratsweep",
    about = "Replay trading strategies over every window of a price history"
)]
pub struct Cli {
    /// Verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Average profit percent per window length for one strategy
    Sweep {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(short, long)]
        strategy: Option<String>,
        #[arg(long)]
        symbol: Option<String>,
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Only use the newest N bars
        #[arg(long)]
        rows: Option<usize>,
        /// Run offsets on the calling thread
        #[arg(long)]
        sequential: bool,
    },
    /// Simulate one strategy over the whole loaded history
    Run {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(short, long)]
        strategy: Option<String>,
        #[arg(long)]
        symbol: Option<String>,
        #[arg(long)]
        rows: Option<usize>,
    },
    /// Compare strategies over the newest bars
    Compare {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        symbol: Option<String>,
        #[arg(short, long)]
        output: Option<PathBuf>,
        #[arg(long)]
        rows: Option<usize>,
    },
    /// Validate a configuration file
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// List built-in strategies
    Strategies,
}

/// Command-line values that take precedence over the config file.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub strategy: Option<String>,
    pub symbol: Option<String>,
    pub rows: Option<usize>,
    pub sequential: bool,
}

pub fn init_logging(verbosity: u8) {
    let level = match verbosity {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();

    // Already installed when embedded in tests.
    let _ = tracing::subscriber::set_global_default(subscriber);
}

pub fn run(cli: Cli) -> ExitCode {
    init_logging(cli.verbose);

    let result = match cli.command {
        Command::Sweep {
            config,
            strategy,
            symbol,
            output,
            rows,
            sequential,
        } => {
            let overrides = Overrides {
                strategy,
                symbol,
                rows,
                sequential,
            };
            run_sweep(&config, &overrides, output.as_deref())
        }
        Command::Run {
            config,
            strategy,
            symbol,
            rows,
        } => {
            let overrides = Overrides {
                strategy,
                symbol,
                rows,
                sequential: false,
            };
            run_single(&config, &overrides)
        }
        Command::Compare {
            config,
            symbol,
            output,
            rows,
        } => {
            let overrides = Overrides {
                symbol,
                rows,
                ..Overrides::default()
            };
            run_compare(&config, &overrides, output.as_deref())
        }
        Command::Validate { config } => run_validate(&config),
        Command::Strategies => {
            print!("{}", render_strategy_list());
            Ok(())
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}

pub fn load_config(path: &Path) -> Result<FileConfigAdapter, StratsweepError> {
    info!(path = %path.display(), "loading config");
    FileConfigAdapter::from_file(path)
}

/// `--output` wins over `[report] output`. A `.csv` extension selects the CSV
/// renderer; anything else is a text table, and no path prints to stdout.
pub fn build_report_port(
    config: &dyn ConfigPort,
    output_override: Option<&Path>,
) -> Box<dyn ReportPort> {
    let output = output_override.map(Path::to_path_buf).or_else(|| {
        config
            .get_string("report", "output")
            .filter(|s| !s.trim().is_empty())
            .map(PathBuf::from)
    });

    match output {
        Some(path)
            if path
                .extension()
                .is_some_and(|ext| ext.eq_ignore_ascii_case("csv")) =>
        {
            Box::new(CsvReportAdapter::new(path))
        }
        other => Box::new(TableReportAdapter::new(other)),
    }
}

pub fn resolve_strategy(
    config: &dyn ConfigPort,
    overrides: &Overrides,
) -> Result<StrategyKind, StratsweepError> {
    match &overrides.strategy {
        Some(name) => StrategyKind::from_name_with_config(name, config),
        None => StrategyKind::from_config(config),
    }
}

pub fn resolve_symbol(
    settings: &DataSettings,
    overrides: &Overrides,
) -> Result<String, StratsweepError> {
    overrides
        .symbol
        .clone()
        .or_else(|| settings.symbol.clone())
        .ok_or_else(|| StratsweepError::ConfigMissing {
            section: "data".into(),
            key: "symbol".into(),
        })
}

/// Fetch the configured date range and keep the newest `rows` bars if asked.
pub fn load_series(
    data_port: &dyn DataPort,
    symbol: &str,
    settings: &DataSettings,
    rows: Option<usize>,
) -> Result<Vec<PriceBar>, StratsweepError> {
    let mut bars = data_port.fetch_prices(symbol, settings.start_date, settings.end_date)?;
    if bars.is_empty() {
        return Err(StratsweepError::NoData {
            symbol: symbol.to_string(),
        });
    }
    if let Some(rows) = rows.or(settings.rows).filter(|&r| r > 0) {
        let skip = bars.len().saturating_sub(rows);
        bars.drain(..skip);
    }
    info!(
        symbol,
        bars = bars.len(),
        first = %bars[0].date,
        last = %bars[bars.len() - 1].date,
        "loaded price history"
    );
    Ok(bars)
}

/// Load, sweep and render. Returns the sweep so callers can inspect it.
pub fn run_sweep_pipeline(
    data_port: &dyn DataPort,
    config: &dyn ConfigPort,
    overrides: &Overrides,
    report: &dyn ReportPort,
) -> Result<SweepResult, StratsweepError> {
    validate_config(config)?;
    let settings = load_data_settings(config)?;
    let simulation = load_simulation_config(config)?;
    let mut sweep_config = load_sweep_config(config)?;
    if overrides.sequential {
        sweep_config.parallel = false;
    }
    let strategy = resolve_strategy(config, overrides)?;
    let symbol = resolve_symbol(&settings, overrides)?;

    let series = load_series(data_port, &symbol, &settings, overrides.rows)?;

    info!(
        strategy = strategy.name(),
        exposure = %simulation.exposure,
        symbol = %symbol,
        "sweep configured"
    );
    let result = sweep(&series, &strategy, &simulation, &sweep_config)?;
    report.write_sweep(&result, &strategy.label())?;
    Ok(result)
}

pub fn run_single_pipeline(
    data_port: &dyn DataPort,
    config: &dyn ConfigPort,
    overrides: &Overrides,
) -> Result<(StrategyKind, RunOutcome), StratsweepError> {
    validate_config(config)?;
    let settings = load_data_settings(config)?;
    let simulation = load_simulation_config(config)?;
    let strategy = resolve_strategy(config, overrides)?;
    let symbol = resolve_symbol(&settings, overrides)?;

    let series = load_series(data_port, &symbol, &settings, overrides.rows)?;
    let outcome = simulate(&series, &strategy, &simulation)?;
    Ok((strategy, outcome))
}

pub fn run_compare_pipeline(
    data_port: &dyn DataPort,
    config: &dyn ConfigPort,
    overrides: &Overrides,
    report: &dyn ReportPort,
) -> Result<Vec<StrategyRun>, StratsweepError> {
    validate_config(config)?;
    let settings = load_data_settings(config)?;
    let simulation = load_simulation_config(config)?;
    let strategies = load_compare_strategies(config)?;
    let rows = match overrides.rows {
        Some(rows) => rows,
        None => load_compare_rows(config)?,
    };
    let symbol = resolve_symbol(&settings, overrides)?;

    let series = load_series(data_port, &symbol, &settings, Some(rows))?;
    let runs = compare_strategies(&series, &strategies, &simulation)?;
    report.write_comparison(&runs)?;
    Ok(runs)
}

fn run_sweep(
    config_path: &Path,
    overrides: &Overrides,
    output: Option<&Path>,
) -> Result<(), StratsweepError> {
    let config = load_config(config_path)?;
    let data_port = CsvAdapter::new(load_data_settings(&config)?.dir);
    let report = build_report_port(&config, output);
    run_sweep_pipeline(&data_port, &config, overrides, report.as_ref())?;
    Ok(())
}

fn run_single(config_path: &Path, overrides: &Overrides) -> Result<(), StratsweepError> {
    let config = load_config(config_path)?;
    let data_port = CsvAdapter::new(load_data_settings(&config)?.dir);
    let (strategy, outcome) = run_single_pipeline(&data_port, &config, overrides)?;
    print!("{}", render_outcome(&strategy, &outcome));
    Ok(())
}

fn run_compare(
    config_path: &Path,
    overrides: &Overrides,
    output: Option<&Path>,
) -> Result<(), StratsweepError> {
    let config = load_config(config_path)?;
    let data_port = CsvAdapter::new(load_data_settings(&config)?.dir);
    let report = build_report_port(&config, output);
    run_compare_pipeline(&data_port, &config, overrides, report.as_ref())?;
    Ok(())
}

fn run_validate(config_path: &Path) -> Result<(), StratsweepError> {
    let config = load_config(config_path)?;
    validate_config(&config)?;
    println!("{}: OK", config_path.display());
    Ok(())
}

pub fn render_outcome(strategy: &StrategyKind, outcome: &RunOutcome) -> String {
    format!(
        "Strategy:      {}\n\
         Final value:   {:.2}\n\
         Invested:      {:.2}\n\
         Profit:        {:.2} ({:.2}%)\n\
         Shares:        {:.4}\n\
         Cash:          {:.2}\n\
         Orders:        {} filled, {} rejected, {} liquidations\n",
        strategy.label(),
        outcome.final_value,
        outcome.total_contributed,
        outcome.profit,
        outcome.profit_percent,
        outcome.owned_quantity,
        outcome.cash,
        outcome.fills,
        outcome.rejections,
        outcome.liquidations,
    )
}

pub fn render_strategy_list() -> String {
    StrategyKind::builtin()
        .iter()
        .map(|s| format!("{:<24} {}\n", s.name(), s.label()))
        .collect()
}
