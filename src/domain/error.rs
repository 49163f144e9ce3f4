//! Domain error types.

/// Top-level error type for stratsweep.
#[derive(Debug, thiserror::Error)]
pub enum StratsweepError {
    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("unknown strategy: {name}")]
    UnknownStrategy { name: String },

    #[error("data error: {reason}")]
    Data { reason: String },

    #[error("no price data for {symbol}")]
    NoData { symbol: String },

    #[error("insufficient data: have {bars} bars, need {minimum}")]
    InsufficientData { bars: usize, minimum: usize },

    #[error("price series is empty")]
    EmptySeries,

    #[error("invalid price {price} at bar {index}")]
    InvalidPrice { index: usize, price: f64 },

    #[error("total contribution would be zero: start cash {start_cash}, monthly cash {monthly_cash}")]
    ZeroContribution { start_cash: f64, monthly_cash: f64 },

    #[error("invalid exposure policy: {reason}")]
    InvalidExposure { reason: String },

    #[error("sweep timed out after {elapsed_ms} ms ({completed_windows} window lengths completed)")]
    Timeout {
        elapsed_ms: u128,
        completed_windows: usize,
    },

    #[error("report error: {reason}")]
    Report { reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<&StratsweepError> for std::process::ExitCode {
    fn from(err: &StratsweepError) -> Self {
        let code: u8 = match err {
            StratsweepError::Io(_) | StratsweepError::Report { .. } => 1,
            StratsweepError::ConfigParse { .. }
            | StratsweepError::ConfigMissing { .. }
            | StratsweepError::ConfigInvalid { .. } => 2,
            StratsweepError::Data { .. } | StratsweepError::NoData { .. } => 3,
            StratsweepError::UnknownStrategy { .. } => 4,
            StratsweepError::InsufficientData { .. } => 5,
            StratsweepError::EmptySeries
            | StratsweepError::InvalidPrice { .. }
            | StratsweepError::ZeroContribution { .. }
            | StratsweepError::InvalidExposure { .. } => 6,
            StratsweepError::Timeout { .. } => 7,
        };
        std::process::ExitCode::from(code)
    }
}
