//! Plain-text table reports, written to a file or stdout.

use crate::domain::comparison::{StrategyRun, leader};
use crate::domain::error::StratsweepError;
use crate::domain::sweep::SweepResult;
use crate::ports::report_port::ReportPort;
use std::fmt::Write as _;
use std::fs;
use std::path::PathBuf;
use tracing::info;

pub struct TableReportAdapter {
    output: Option<PathBuf>,
}

impl TableReportAdapter {
    /// `None` prints to stdout.
    pub fn new(output: Option<PathBuf>) -> Self {
        Self { output }
    }

    pub fn render_sweep(result: &SweepResult, label: &str) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "Strategy: {}", label);
        let _ = writeln!(out, "{:>8}  {:>12}  {:>6}", "window", "avg profit %", "runs");
        let _ = writeln!(out, "{}", "-".repeat(30));
        for w in &result.windows {
            let _ = writeln!(
                out,
                "{:>8}  {:>12.2}  {:>6}",
                w.window_length, w.average_profit_percent, w.runs
            );
        }
        if let Some(best) = result.best() {
            let _ = writeln!(
                out,
                "best window: {} days ({:.2}%)",
                best.window_length, best.average_profit_percent
            );
        }
        out
    }

    pub fn render_comparison(runs: &[StrategyRun]) -> String {
        let mut out = String::new();
        let _ = writeln!(
            out,
            "{:<24} {:>14} {:>14} {:>12} {:>9} {:>12} {:>12}",
            "strategy", "final value", "invested", "profit", "profit %", "shares", "cash"
        );
        let _ = writeln!(out, "{}", "-".repeat(103));
        for run in runs {
            let o = &run.outcome;
            let _ = writeln!(
                out,
                "{:<24} {:>14.2} {:>14.2} {:>12.2} {:>9.2} {:>12.4} {:>12.2}",
                run.name,
                o.final_value,
                o.total_contributed,
                o.profit,
                o.profit_percent,
                o.owned_quantity,
                o.cash
            );
        }
        if let Some(best) = leader(runs) {
            let _ = writeln!(
                out,
                "leader: {} ({:.2}%)",
                best.label, best.outcome.profit_percent
            );
        }
        out
    }

    fn emit(&self, text: &str) -> Result<(), StratsweepError> {
        match &self.output {
            Some(path) => {
                fs::write(path, text).map_err(|e| StratsweepError::Report {
                    reason: format!("failed to write {}: {}", path.display(), e),
                })?;
                info!(path = %path.display(), "report written");
            }
            None => print!("{}", text),
        }
        Ok(())
    }
}

impl ReportPort for TableReportAdapter {
    fn write_sweep(&self, result: &SweepResult, label: &str) -> Result<(), StratsweepError> {
        self.emit(&Self::render_sweep(result, label))
    }

    fn write_comparison(&self, runs: &[StrategyRun]) -> Result<(), StratsweepError> {
        self.emit(&Self::render_comparison(runs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::sweep::WindowResult;
    use tempfile::TempDir;

    fn sample_result() -> SweepResult {
        SweepResult {
            windows: vec![
                WindowResult {
                    window_length: 10,
                    average_profit_percent: 1.25,
                    runs: 50,
                },
                WindowResult {
                    window_length: 20,
                    average_profit_percent: -0.5,
                    runs: 40,
                },
            ],
        }
    }

    #[test]
    fn sweep_table_lists_windows_and_best() {
        let text = TableReportAdapter::render_sweep(&sample_result(), "buy_everyday");
        assert!(text.starts_with("Strategy: buy_everyday"));
        assert!(text.contains("      10          1.25      50"));
        assert!(text.contains("      20         -0.50      40"));
        assert!(text.contains("best window: 10 days (1.25%)"));
    }

    #[test]
    fn empty_sweep_has_no_best_line() {
        let text = TableReportAdapter::render_sweep(&SweepResult::default(), "x");
        assert!(!text.contains("best window"));
    }

    #[test]
    fn writes_to_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("sweep.txt");
        let adapter = TableReportAdapter::new(Some(path.clone()));
        adapter.write_sweep(&sample_result(), "buy_everyday").unwrap();
        let text = fs::read_to_string(path).unwrap();
        assert!(text.contains("avg profit %"));
    }

    #[test]
    fn unwritable_path_is_report_error() {
        let adapter = TableReportAdapter::new(Some(PathBuf::from("/nonexistent/dir/out.txt")));
        let err = adapter.write_sweep(&sample_result(), "x").unwrap_err();
        assert!(matches!(err, StratsweepError::Report { .. }));
    }
}
