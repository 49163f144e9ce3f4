//! Multi-window aggregation.
//!
//! For every window length on a [`WindowGrid`] the simulator is run once per
//! start offset in the history and the profit percentages are averaged. The
//! grid thins out at larger window lengths so that the roughly quadratic
//! number of runs stays tractable on multi-year daily series.
//!
//! Offsets count back from the newest bar: offset `j` of a window of length
//! `i` covers `series[len - j - i .. len - j]`, for `j` in `0..len - i`.

use std::collections::BTreeMap;
use std::ops::Range;
use std::time::{Duration, Instant};

use tracing::{debug, info};

use super::error::StratsweepError;
use super::portfolio::round2;
use super::price::{PriceBar, validate_series};
use super::simulator::{SimulationConfig, run_validated};
use super::strategy::Strategy;

/// Above `above`, only window lengths divisible by `modulus` are kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DensityTier {
    pub above: usize,
    pub modulus: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WindowGrid {
    pub start: usize,
    pub step: usize,
    /// Longest window as a fraction of the history (exclusive).
    pub max_fraction: f64,
    pub tiers: Vec<DensityTier>,
}

impl Default for WindowGrid {
    fn default() -> Self {
        WindowGrid {
            start: 10,
            step: 10,
            max_fraction: 0.9,
            tiers: vec![
                DensityTier {
                    above: 100,
                    modulus: 50,
                },
                DensityTier {
                    above: 300,
                    modulus: 100,
                },
                DensityTier {
                    above: 1000,
                    modulus: 200,
                },
            ],
        }
    }
}

impl WindowGrid {
    pub fn validate(&self) -> Result<(), StratsweepError> {
        let invalid = |key: &str, reason: &str| StratsweepError::ConfigInvalid {
            section: "sweep".into(),
            key: key.into(),
            reason: reason.into(),
        };
        if self.start == 0 {
            return Err(invalid("min_window", "min_window must be at least 1"));
        }
        if self.step == 0 {
            return Err(invalid("window_step", "window_step must be at least 1"));
        }
        if !(self.max_fraction > 0.0 && self.max_fraction <= 1.0) {
            return Err(invalid("max_fraction", "max_fraction must be in (0, 1]"));
        }
        if self.tiers.iter().any(|t| t.modulus == 0) {
            return Err(invalid("tiers", "tier modulus must be at least 1"));
        }
        Ok(())
    }

    /// Window lengths tested against a history of `len` bars, ascending.
    pub fn window_lengths(&self, len: usize) -> Vec<usize> {
        let upper = (len as f64 * self.max_fraction).round_ties_even() as usize;
        (self.start..upper)
            .step_by(self.step.max(1))
            .filter(|&i| {
                self.tiers
                    .iter()
                    .all(|t| i <= t.above || i % t.modulus.max(1) == 0)
            })
            .collect()
    }

    /// Shortest history that yields at least one window length.
    /// Requires a valid grid.
    pub fn minimum_len(&self) -> usize {
        (1..)
            .find(|&len| !self.window_lengths(len).is_empty())
            .unwrap_or(usize::MAX)
    }
}

/// Chronological slice used for offset `offset` of a `window`-bar run.
pub fn window_range(len: usize, window: usize, offset: usize) -> Range<usize> {
    let end = len - offset;
    end - window..end
}

#[derive(Debug, Clone, PartialEq)]
pub struct SweepConfig {
    pub grid: WindowGrid,
    /// Spread offsets across threads (needs the `parallel` feature).
    pub parallel: bool,
    pub timeout: Option<Duration>,
}

impl Default for SweepConfig {
    fn default() -> Self {
        SweepConfig {
            grid: WindowGrid::default(),
            parallel: true,
            timeout: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WindowResult {
    pub window_length: usize,
    pub average_profit_percent: f64,
    pub runs: usize,
}

/// One [`WindowResult`] per tested window length, ascending.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SweepResult {
    pub windows: Vec<WindowResult>,
}

impl SweepResult {
    pub fn len(&self) -> usize {
        self.windows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.windows.is_empty()
    }

    pub fn get(&self, window_length: usize) -> Option<f64> {
        self.windows
            .iter()
            .find(|w| w.window_length == window_length)
            .map(|w| w.average_profit_percent)
    }

    /// Window length → average profit percent.
    pub fn as_map(&self) -> BTreeMap<usize, f64> {
        self.windows
            .iter()
            .map(|w| (w.window_length, w.average_profit_percent))
            .collect()
    }

    pub fn total_runs(&self) -> usize {
        self.windows.iter().map(|w| w.runs).sum()
    }

    /// Window length with the highest average profit.
    pub fn best(&self) -> Option<&WindowResult> {
        self.windows
            .iter()
            .max_by(|a, b| a.average_profit_percent.total_cmp(&b.average_profit_percent))
    }
}

struct Deadline {
    started: Instant,
    timeout: Option<Duration>,
}

impl Deadline {
    fn check(&self, completed_windows: usize) -> Result<(), StratsweepError> {
        match self.timeout {
            Some(limit) if self.started.elapsed() >= limit => Err(StratsweepError::Timeout {
                elapsed_ms: self.started.elapsed().as_millis(),
                completed_windows,
            }),
            _ => Ok(()),
        }
    }
}

/// Sweep `strategy` over every window length and offset of `series`.
pub fn sweep<S>(
    series: &[PriceBar],
    strategy: &S,
    simulation: &SimulationConfig,
    config: &SweepConfig,
) -> Result<SweepResult, StratsweepError>
where
    S: Strategy + Sync + ?Sized,
{
    simulation.validate()?;
    config.grid.validate()?;
    validate_series(series)?;

    let lengths = config.grid.window_lengths(series.len());
    if lengths.is_empty() {
        return Err(StratsweepError::InsufficientData {
            bars: series.len(),
            minimum: config.grid.minimum_len(),
        });
    }

    info!(
        strategy = strategy.name(),
        bars = series.len(),
        window_lengths = lengths.len(),
        "starting sweep"
    );

    let deadline = Deadline {
        started: Instant::now(),
        timeout: config.timeout,
    };
    let mut windows = Vec::with_capacity(lengths.len());

    for (completed, &window_length) in lengths.iter().enumerate() {
        deadline.check(completed)?;

        let profits = if config.parallel {
            offsets_parallel(series, strategy, simulation, window_length, &deadline, completed)?
        } else {
            offsets_sequential(series, strategy, simulation, window_length, &deadline, completed)?
        };

        let runs = profits.len();
        let average_profit_percent = round2(profits.iter().sum::<f64>() / runs as f64);
        debug!(window_length, runs, average_profit_percent, "window done");

        windows.push(WindowResult {
            window_length,
            average_profit_percent,
            runs,
        });
    }

    info!(
        elapsed_ms = deadline.started.elapsed().as_millis() as u64,
        "sweep complete"
    );
    Ok(SweepResult { windows })
}

/// Average profit percent of one window length across all offsets.
pub fn average_profit_for_window<S>(
    series: &[PriceBar],
    strategy: &S,
    simulation: &SimulationConfig,
    window_length: usize,
) -> Result<f64, StratsweepError>
where
    S: Strategy + ?Sized,
{
    simulation.validate()?;
    validate_series(series)?;
    if window_length == 0 || window_length >= series.len() {
        return Err(StratsweepError::InsufficientData {
            bars: series.len(),
            minimum: window_length + 1,
        });
    }
    let deadline = Deadline {
        started: Instant::now(),
        timeout: None,
    };
    let profits = offsets_sequential(series, strategy, simulation, window_length, &deadline, 0)?;
    Ok(round2(profits.iter().sum::<f64>() / profits.len() as f64))
}

fn offset_profit<S>(
    series: &[PriceBar],
    strategy: &S,
    simulation: &SimulationConfig,
    window_length: usize,
    offset: usize,
) -> f64
where
    S: Strategy + ?Sized,
{
    let range = window_range(series.len(), window_length, offset);
    run_validated(&series[range], strategy, simulation, false).profit_percent
}

fn offsets_sequential<S>(
    series: &[PriceBar],
    strategy: &S,
    simulation: &SimulationConfig,
    window_length: usize,
    deadline: &Deadline,
    completed: usize,
) -> Result<Vec<f64>, StratsweepError>
where
    S: Strategy + ?Sized,
{
    (0..series.len() - window_length)
        .map(|offset| {
            deadline.check(completed)?;
            Ok(offset_profit(series, strategy, simulation, window_length, offset))
        })
        .collect()
}

/// Results come back in offset order, so the sum matches the sequential path bit for bit.
#[cfg(feature = "parallel")]
fn offsets_parallel<S>(
    series: &[PriceBar],
    strategy: &S,
    simulation: &SimulationConfig,
    window_length: usize,
    deadline: &Deadline,
    completed: usize,
) -> Result<Vec<f64>, StratsweepError>
where
    S: Strategy + Sync + ?Sized,
{
    use rayon::prelude::*;

    (0..series.len() - window_length)
        .into_par_iter()
        .map(|offset| {
            deadline.check(completed)?;
            Ok(offset_profit(series, strategy, simulation, window_length, offset))
        })
        .collect()
}

#[cfg(not(feature = "parallel"))]
fn offsets_parallel<S>(
    series: &[PriceBar],
    strategy: &S,
    simulation: &SimulationConfig,
    window_length: usize,
    deadline: &Deadline,
    completed: usize,
) -> Result<Vec<f64>, StratsweepError>
where
    S: Strategy + Sync + ?Sized,
{
    offsets_sequential(series, strategy, simulation, window_length, deadline, completed)
}
