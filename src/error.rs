use thiserror::Error;

/// Categorical error for the per-symbol analysis core.
///
/// Every variant maps to a stable machine-parseable code via [`AnalysisError::code`].
/// Suppressions are *not* errors; they are ordinary outputs of the risk layer
/// (see `risk::SuppressionReason`).
#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("Invalid symbol: {0}")]
    InvalidSymbol(String),

    #[error("Invalid period '{got}'. Accepted values: {accepted}")]
    InvalidPeriod { got: String, accepted: String },

    #[error("Invalid config override(s): {0}")]
    InvalidOverride(String),

    #[error("Unknown risk profile: {0}")]
    UnknownProfile(String),

    #[error("Unknown universe: {0}")]
    UnknownUniverse(String),

    #[error("Data fetch failed for {symbol}: {reason}")]
    DataFetch { symbol: String, reason: String },

    #[error("Rate limited by data provider: {0}")]
    RateLimited(String),

    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    #[error("Ranker error: {0}")]
    Ranker(String),

    #[error("Calculation error: {0}")]
    Calculation(String),

    #[error("Operation cancelled")]
    Cancelled,
}

impl AnalysisError {
    /// Stable machine-readable code for this error.
    pub fn code(&self) -> &'static str {
        match self {
            AnalysisError::InvalidSymbol(_) => "INVALID_SYMBOL",
            AnalysisError::InvalidPeriod { .. } => "INVALID_PERIOD",
            AnalysisError::InvalidOverride(_) => "INVALID_OVERRIDE",
            AnalysisError::UnknownProfile(_) => "UNKNOWN_PROFILE",
            AnalysisError::UnknownUniverse(_) => "UNKNOWN_UNIVERSE",
            AnalysisError::DataFetch { .. } => "DATA_FETCH_ERROR",
            AnalysisError::RateLimited(_) => "RATE_LIMITED",
            AnalysisError::InsufficientData(_) => "INSUFFICIENT_DATA",
            AnalysisError::Ranker(_) => "RANKER_ERROR",
            AnalysisError::Calculation(_) => "CALCULATION_ERROR",
            AnalysisError::Cancelled => "CANCELLED",
        }
    }

    /// Whether a retry against the upstream could change the outcome.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            AnalysisError::DataFetch { .. } | AnalysisError::RateLimited(_)
        )
    }
}

pub type AnalysisResult<T> = Result<T, AnalysisError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_stable() {
        assert_eq!(
            AnalysisError::InvalidSymbol("ZZZZ".into()).code(),
            "INVALID_SYMBOL"
        );
        assert_eq!(
            AnalysisError::InvalidPeriod {
                got: "7m".into(),
                accepted: "1d".into()
            }
            .code(),
            "INVALID_PERIOD"
        );
        assert_eq!(
            AnalysisError::InsufficientData("x".into()).code(),
            "INSUFFICIENT_DATA"
        );
    }

    #[test]
    fn retryable_classification() {
        assert!(AnalysisError::DataFetch {
            symbol: "SPY".into(),
            reason: "timeout".into()
        }
        .is_retryable());
        assert!(AnalysisError::RateLimited("429".into()).is_retryable());
        assert!(!AnalysisError::InvalidSymbol("SPY".into()).is_retryable());
        assert!(!AnalysisError::Cancelled.is_retryable());
    }
}
