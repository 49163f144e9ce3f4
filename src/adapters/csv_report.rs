//! CSV report output for downstream tooling.

use crate::domain::comparison::StrategyRun;
use crate::domain::error::StratsweepError;
use crate::domain::sweep::SweepResult;
use crate::ports::report_port::ReportPort;
use std::path::PathBuf;
use tracing::info;

pub struct CsvReportAdapter {
    output: PathBuf,
}

impl CsvReportAdapter {
    pub fn new(output: PathBuf) -> Self {
        Self { output }
    }

    fn writer(&self) -> Result<csv::Writer<std::fs::File>, StratsweepError> {
        csv::Writer::from_path(&self.output).map_err(|e| self.report_error(e))
    }

    fn report_error(&self, e: impl std::fmt::Display) -> StratsweepError {
        StratsweepError::Report {
            reason: format!("failed to write {}: {}", self.output.display(), e),
        }
    }
}

impl ReportPort for CsvReportAdapter {
    fn write_sweep(&self, result: &SweepResult, label: &str) -> Result<(), StratsweepError> {
        let mut wtr = self.writer()?;
        wtr.write_record(["window_length", "average_profit_percent", "runs"])
            .map_err(|e| self.report_error(e))?;
        for w in &result.windows {
            wtr.write_record([
                w.window_length.to_string(),
                format!("{:.2}", w.average_profit_percent),
                w.runs.to_string(),
            ])
            .map_err(|e| self.report_error(e))?;
        }
        wtr.flush().map_err(|e| self.report_error(e))?;
        info!(
            path = %self.output.display(),
            strategy = label,
            rows = result.len(),
            "sweep CSV written"
        );
        Ok(())
    }

    fn write_comparison(&self, runs: &[StrategyRun]) -> Result<(), StratsweepError> {
        let mut wtr = self.writer()?;
        wtr.write_record([
            "strategy",
            "label",
            "final_value",
            "invested",
            "profit",
            "profit_percent",
            "shares",
            "cash",
            "fills",
            "rejections",
            "liquidations",
        ])
        .map_err(|e| self.report_error(e))?;
        for run in runs {
            let o = &run.outcome;
            wtr.write_record([
                run.name.clone(),
                run.label.clone(),
                format!("{:.2}", o.final_value),
                format!("{:.2}", o.total_contributed),
                format!("{:.2}", o.profit),
                format!("{:.2}", o.profit_percent),
                format!("{:.6}", o.owned_quantity),
                format!("{:.2}", o.cash),
                o.fills.to_string(),
                o.rejections.to_string(),
                o.liquidations.to_string(),
            ])
            .map_err(|e| self.report_error(e))?;
        }
        wtr.flush().map_err(|e| self.report_error(e))?;
        info!(path = %self.output.display(), rows = runs.len(), "comparison CSV written");
        Ok(())
    }
}
