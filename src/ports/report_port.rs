//! Result rendering port trait.

use crate::domain::comparison::StrategyRun;
use crate::domain::error::StratsweepError;
use crate::domain::sweep::SweepResult;

/// Port for rendering sweep and comparison results.
pub trait ReportPort {
    /// Render the window-length → average-profit table for one strategy.
    fn write_sweep(&self, result: &SweepResult, label: &str) -> Result<(), StratsweepError>;

    /// Default implementation: renderers without a comparison view skip it.
    fn write_comparison(&self, runs: &[StrategyRun]) -> Result<(), StratsweepError> {
        let _ = runs;
        Ok(())
    }
}
