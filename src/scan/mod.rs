//! Concurrent fan-out over the per-symbol core.
//!
//! Every fan-out operation runs symbols through a bounded-concurrency
//! stream, captures per-symbol failures as error records, and completes as
//! long as validation passed. One bad ticker never aborts a scan.

pub mod compare;
pub mod portfolio;
pub mod screen;

use std::sync::Arc;
use std::time::Duration;

use futures::stream::{self, StreamExt};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::analysis::{AnalysisEngine, AnalysisReport, AnalysisRequest};
use crate::error::{AnalysisError, AnalysisResult};
use crate::risk::{Bias, RiskQuality, TradePlan};
use crate::universe;

pub const DEFAULT_CONCURRENCY: usize = 10;
pub const DEFAULT_SYMBOL_TIMEOUT: Duration = Duration::from_secs(30);

/// Per-symbol failure captured during a fan-out operation.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SymbolError {
    pub symbol: String,
    pub code: String,
    pub message: String,
}

impl SymbolError {
    fn from_error(symbol: &str, error: &AnalysisError) -> Self {
        Self {
            symbol: symbol.to_string(),
            code: error.code().to_string(),
            message: error.to_string(),
        }
    }

    fn timeout(symbol: &str, limit: Duration) -> Self {
        Self {
            symbol: symbol.to_string(),
            code: "DATA_FETCH_ERROR".to_string(),
            message: format!("per-symbol deadline of {}s exceeded", limit.as_secs()),
        }
    }
}

/// Bounds for a fan-out run.
#[derive(Debug, Clone, Copy)]
pub struct FanoutLimits {
    pub concurrency: usize,
    pub per_symbol_timeout: Duration,
}

impl Default for FanoutLimits {
    fn default() -> Self {
        Self {
            concurrency: DEFAULT_CONCURRENCY,
            per_symbol_timeout: DEFAULT_SYMBOL_TIMEOUT,
        }
    }
}

/// Analyze each symbol with bounded concurrency. Successes and failures are
/// both returned; dispatch order is not observable (callers sort).
pub async fn analyze_many(
    engine: &Arc<AnalysisEngine>,
    symbols: &[String],
    base: &AnalysisRequest,
    limits: FanoutLimits,
) -> (Vec<Arc<AnalysisReport>>, Vec<SymbolError>) {
    let results: Vec<Result<Arc<AnalysisReport>, SymbolError>> = stream::iter(symbols.to_vec())
        .map(|symbol| {
            let engine = engine.clone();
            let mut request = base.clone();
            request.symbol = symbol.clone();
            async move {
                match tokio::time::timeout(limits.per_symbol_timeout, engine.analyze(&request))
                    .await
                {
                    Ok(Ok(report)) => Ok(report),
                    Ok(Err(error)) => {
                        tracing::warn!(symbol, code = error.code(), "symbol analysis failed");
                        Err(SymbolError::from_error(&symbol, &error))
                    }
                    Err(_) => {
                        tracing::warn!(symbol, "symbol analysis timed out");
                        Err(SymbolError::timeout(&symbol, limits.per_symbol_timeout))
                    }
                }
            }
        })
        .buffer_unordered(limits.concurrency.max(1))
        .collect()
        .await;

    let mut reports = Vec::new();
    let mut errors = Vec::new();
    for result in results {
        match result {
            Ok(report) => reports.push(report),
            Err(error) => errors.push(error),
        }
    }
    (reports, errors)
}

/// One symbol whose risk qualifier produced at least one plan.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct QualifiedTrade {
    pub symbol: String,
    pub risk_quality: RiskQuality,
    pub score: f64,
    pub bias: Bias,
    pub price: f64,
    pub plan: TradePlan,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ScanOutcome {
    pub universe: String,
    pub total_scanned: usize,
    pub qualified: Vec<QualifiedTrade>,
    pub errors: Vec<SymbolError>,
}

fn quality_rank(quality: RiskQuality) -> u8 {
    match quality {
        RiskQuality::High => 0,
        RiskQuality::Medium => 1,
        RiskQuality::Low => 2,
    }
}

fn top_score(report: &AnalysisReport) -> f64 {
    report
        .signals
        .first()
        .and_then(|s| s.score)
        .unwrap_or(0.0)
}

/// Scan a named universe for actionable setups.
pub async fn scan_universe(
    engine: &Arc<AnalysisEngine>,
    universe_name: &str,
    max_results: usize,
    base: &AnalysisRequest,
    limits: FanoutLimits,
) -> AnalysisResult<ScanOutcome> {
    let symbols: Vec<String> = universe::resolve_universe(universe_name)?
        .iter()
        .map(|s| (*s).to_string())
        .collect();
    let total_scanned = symbols.len();

    let (reports, errors) = analyze_many(engine, &symbols, base, limits).await;

    let mut qualified: Vec<QualifiedTrade> = reports
        .iter()
        .filter_map(|report| {
            let plans = report.assessment.outcome.plans();
            let best = plans.first()?;
            Some(QualifiedTrade {
                symbol: report.symbol.clone(),
                risk_quality: best.risk_quality,
                score: top_score(report),
                bias: best.bias,
                price: report.price,
                plan: best.clone(),
            })
        })
        .collect();

    qualified.sort_by(|a, b| {
        quality_rank(a.risk_quality)
            .cmp(&quality_rank(b.risk_quality))
            .then(
                b.score
                    .partial_cmp(&a.score)
                    .unwrap_or(std::cmp::Ordering::Equal),
            )
            .then(a.symbol.cmp(&b.symbol))
    });
    qualified.truncate(max_results);

    Ok(ScanOutcome {
        universe: universe_name.to_string(),
        total_scanned,
        qualified,
        errors,
    })
}


#[cfg(test)]
mod tests {
    use super::test_support::scripted_engine;
    use super::*;

    fn base() -> AnalysisRequest {
        AnalysisRequest::default()
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn partial_failure_yields_successes_plus_error_records() {
        let engine = scripted_engine();
        let symbols: Vec<String> = (0..7)
            .map(|i| format!("GOOD{i}"))
            .chain((0..3).map(|i| format!("BAD{i}")))
            .collect();
        let (reports, errors) = analyze_many(&engine, &symbols, &base(), FanoutLimits::default()).await;
        assert_eq!(reports.len(), 7);
        assert_eq!(errors.len(), 3);
        assert!(errors.iter().all(|e| e.code == "INVALID_SYMBOL"));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn all_failures_still_complete() {
        let engine = scripted_engine();
        let symbols = vec!["BAD1".to_string(), "BAD2".to_string()];
        let (reports, errors) = analyze_many(&engine, &symbols, &base(), FanoutLimits::default()).await;
        assert!(reports.is_empty());
        assert_eq!(errors.len(), 2);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn scan_unknown_universe_is_a_validation_error() {
        let engine = scripted_engine();
        let err = scan_universe(&engine, "mars100", 10, &base(), FanoutLimits::default())
            .await
            .unwrap_err();
        assert_eq!(err.code(), "UNKNOWN_UNIVERSE");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn scan_sorts_by_quality_then_score_and_truncates() {
        let engine = scripted_engine();
        let outcome = scan_universe(&engine, "watchlist_default", 5, &base(), FanoutLimits::default())
            .await
            .unwrap();
        assert!(outcome.qualified.len() <= 5);
        let ranks: Vec<u8> = outcome
            .qualified
            .iter()
            .map(|q| quality_rank(q.risk_quality))
            .collect();
        let mut sorted = ranks.clone();
        sorted.sort_unstable();
        assert_eq!(ranks, sorted);
    }
}
