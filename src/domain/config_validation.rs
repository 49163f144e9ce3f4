//! Configuration validation and loading.
//!
//! Every section is checked before a run starts; the first offending
//! `[section] key` is reported. The `load_*` functions turn a validated
//! [`ConfigPort`] into domain settings.

use std::path::PathBuf;
use std::time::Duration;

use crate::domain::comparison::DEFAULT_COMPARISON_ROWS;
use crate::domain::error::StratsweepError;
use crate::domain::order::ExposurePolicy;
use crate::domain::simulator::{
    DEFAULT_CONTRIBUTION_INTERVAL, DEFAULT_MONTHLY_CASH, DEFAULT_START_CASH, SimulationConfig,
};
use crate::domain::strategy::{
    DEFAULT_DECLINE_DAYS, DEFAULT_DIP_LOOKBACK, DEFAULT_DIP_THRESHOLD, DEFAULT_DOWN_DAYS,
    DEFAULT_LONG_WINDOW, DEFAULT_SHORT_WINDOW, Strategy, StrategyKind,
};
use crate::domain::sweep::{SweepConfig, WindowGrid};
use crate::ports::config_port::ConfigPort;
use chrono::NaiveDate;

/// Where and how much price history to load.
#[derive(Debug, Clone, PartialEq)]
pub struct DataSettings {
    pub dir: PathBuf,
    pub symbol: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    /// Keep only the newest `rows` bars.
    pub rows: Option<usize>,
}

pub fn validate_config(config: &dyn ConfigPort) -> Result<(), StratsweepError> {
    load_data_settings(config)?;
    load_simulation_config(config)?;
    validate_strategy_config(config)?;
    load_sweep_config(config)?;
    load_compare_strategies(config)?;
    load_compare_rows(config)?;
    Ok(())
}

fn invalid(section: &str, key: &str, reason: impl Into<String>) -> StratsweepError {
    StratsweepError::ConfigInvalid {
        section: section.to_string(),
        key: key.to_string(),
        reason: reason.into(),
    }
}

pub fn load_data_settings(config: &dyn ConfigPort) -> Result<DataSettings, StratsweepError> {
    let start_date = parse_date(config, "start_date")?;
    let end_date = parse_date(config, "end_date")?;

    if let (Some(start), Some(end)) = (start_date, end_date) {
        if start > end {
            return Err(invalid(
                "data",
                "start_date",
                "start_date must not be after end_date",
            ));
        }
    }

    let rows = config.get_int("data", "rows", 0);
    if rows < 0 {
        return Err(invalid("data", "rows", "rows must be non-negative"));
    }

    Ok(DataSettings {
        dir: config
            .get_string("data", "dir")
            .filter(|d| !d.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(".")),
        symbol: config
            .get_string("data", "symbol")
            .filter(|s| !s.trim().is_empty()),
        start_date,
        end_date,
        rows: (rows > 0).then_some(rows as usize),
    })
}

fn parse_date(config: &dyn ConfigPort, key: &str) -> Result<Option<NaiveDate>, StratsweepError> {
    match config.get_string("data", key) {
        None => Ok(None),
        Some(s) if s.trim().is_empty() => Ok(None),
        Some(s) => NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
            .map(Some)
            .map_err(|_| invalid("data", key, format!("invalid {key} format, expected YYYY-MM-DD"))),
    }
}

pub fn load_simulation_config(config: &dyn ConfigPort) -> Result<SimulationConfig, StratsweepError> {
    let interval = config.get_int(
        "simulation",
        "contribution_interval",
        DEFAULT_CONTRIBUTION_INTERVAL as i64,
    );
    if interval < 1 {
        return Err(invalid(
            "simulation",
            "contribution_interval",
            "contribution_interval must be at least 1",
        ));
    }

    let simulation = SimulationConfig {
        start_cash: config.get_double("simulation", "start_cash", DEFAULT_START_CASH),
        monthly_cash: config.get_double("simulation", "monthly_cash", DEFAULT_MONTHLY_CASH),
        contribution_interval: interval as usize,
        inject_on_first_day: config.get_bool("simulation", "inject_on_first_day", true),
        exposure: load_exposure(config)?,
    };
    simulation.validate()?;
    Ok(simulation)
}

pub fn load_exposure(config: &dyn ConfigPort) -> Result<ExposurePolicy, StratsweepError> {
    let kind = config
        .get_string("exposure", "kind")
        .unwrap_or_else(|| "fraction".to_string());

    let policy = match kind.trim().to_lowercase().as_str() {
        "fraction" => ExposurePolicy::FixedFraction(config.get_double("exposure", "value", 0.1)),
        "quantity" => ExposurePolicy::FixedQuantity(config.get_double("exposure", "value", 1.0)),
        other => {
            return Err(invalid(
                "exposure",
                "kind",
                format!("unknown exposure kind '{other}', expected fraction or quantity"),
            ));
        }
    };
    policy.validate()?;
    Ok(policy)
}

pub fn validate_strategy_config(config: &dyn ConfigPort) -> Result<(), StratsweepError> {
    let at_least_one = |key: &str, default: usize| -> Result<(), StratsweepError> {
        if config.get_int("strategy", key, default as i64) < 1 {
            return Err(invalid("strategy", key, format!("{key} must be at least 1")));
        }
        Ok(())
    };
    at_least_one("down_days", DEFAULT_DOWN_DAYS)?;
    at_least_one("lookback", DEFAULT_DIP_LOOKBACK)?;
    at_least_one("short_window", DEFAULT_SHORT_WINDOW)?;
    at_least_one("long_window", DEFAULT_LONG_WINDOW)?;
    at_least_one("decline_days", DEFAULT_DECLINE_DAYS)?;

    let dip = config.get_double("strategy", "dip_threshold", DEFAULT_DIP_THRESHOLD);
    if !(dip > 0.0 && dip < 1.0) {
        return Err(invalid(
            "strategy",
            "dip_threshold",
            "dip_threshold must be between 0 and 1",
        ));
    }

    let short = config.get_int("strategy", "short_window", DEFAULT_SHORT_WINDOW as i64);
    let long = config.get_int("strategy", "long_window", DEFAULT_LONG_WINDOW as i64);
    if short >= long {
        return Err(invalid(
            "strategy",
            "short_window",
            "short_window must be less than long_window",
        ));
    }

    if config.get_string("strategy", "name").is_some() {
        StrategyKind::from_config(config)?;
    }
    Ok(())
}

pub fn load_sweep_config(config: &dyn ConfigPort) -> Result<SweepConfig, StratsweepError> {
    let defaults = WindowGrid::default();

    let min_window = config.get_int("sweep", "min_window", defaults.start as i64);
    let window_step = config.get_int("sweep", "window_step", defaults.step as i64);
    let grid = WindowGrid {
        start: min_window.max(0) as usize,
        step: window_step.max(0) as usize,
        max_fraction: config.get_double("sweep", "max_fraction", defaults.max_fraction),
        tiers: defaults.tiers,
    };
    grid.validate()?;

    let timeout_secs = config.get_int("sweep", "timeout_secs", 0);
    if timeout_secs < 0 {
        return Err(invalid(
            "sweep",
            "timeout_secs",
            "timeout_secs must be non-negative",
        ));
    }

    Ok(SweepConfig {
        grid,
        parallel: config.get_bool("sweep", "parallel", true),
        timeout: (timeout_secs > 0).then(|| Duration::from_secs(timeout_secs as u64)),
    })
}

/// Strategies named in `[compare] strategies`, or every built-in when unset.
/// Parameters come from the `[strategy]` section.
pub fn load_compare_strategies(
    config: &dyn ConfigPort,
) -> Result<Vec<StrategyKind>, StratsweepError> {
    let names = config.get_list("compare", "strategies");
    if names.is_empty() {
        return StrategyKind::builtin()
            .iter()
            .map(|s| StrategyKind::from_name_with_config(s.name(), config))
            .collect();
    }
    names
        .iter()
        .map(|name| StrategyKind::from_name_with_config(name, config))
        .collect()
}

pub fn load_compare_rows(config: &dyn ConfigPort) -> Result<usize, StratsweepError> {
    let rows = config.get_int("compare", "rows", DEFAULT_COMPARISON_ROWS as i64);
    if rows < 1 {
        return Err(invalid("compare", "rows", "rows must be at least 1"));
    }
    Ok(rows as usize)
}
