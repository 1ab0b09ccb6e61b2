//! Side-by-side comparison of symbols on one projected metric.

use std::sync::Arc;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::{analyze_many, FanoutLimits, SymbolError};
use crate::analysis::{AnalysisEngine, AnalysisReport, AnalysisRequest};
use crate::indicators::col;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum CompareMetric {
    /// Top ranked-signal score.
    #[default]
    Score,
    ChangePct,
    Rsi,
    Volatility,
}

impl CompareMetric {
    fn project(self, report: &AnalysisReport) -> Option<f64> {
        match self {
            CompareMetric::Score => report.signals.first().and_then(|s| s.score),
            CompareMetric::ChangePct => Some(report.change_pct),
            CompareMetric::Rsi => report.indicators.get(col::RSI).copied(),
            CompareMetric::Volatility => report.indicators.get(col::REALIZED_VOL).copied(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CompareRow {
    pub symbol: String,
    pub price: f64,
    pub change_pct: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CompareOutcome {
    pub metric: CompareMetric,
    pub rows: Vec<CompareRow>,
    /// None when every symbol failed; never dereferenced blindly.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub winner: Option<String>,
    pub errors: Vec<SymbolError>,
}

/// Rank symbols by the projected metric, highest first. Symbols without the
/// metric sort last; an empty result set yields a null winner.
pub async fn compare(
    engine: &Arc<AnalysisEngine>,
    symbols: &[String],
    metric: CompareMetric,
    base: &AnalysisRequest,
    limits: FanoutLimits,
) -> CompareOutcome {
    let (reports, errors) = analyze_many(engine, symbols, base, limits).await;

    let mut rows: Vec<CompareRow> = reports
        .iter()
        .map(|report| CompareRow {
            symbol: report.symbol.clone(),
            price: report.price,
            change_pct: report.change_pct,
            value: metric.project(report),
        })
        .collect();

    rows.sort_by(|a, b| match (a.value, b.value) {
        (Some(x), Some(y)) => y.partial_cmp(&x).unwrap_or(std::cmp::Ordering::Equal),
        (Some(_), None) => std::cmp::Ordering::Less,
        (None, Some(_)) => std::cmp::Ordering::Greater,
        (None, None) => a.symbol.cmp(&b.symbol),
    });

    let winner = rows.first().map(|row| row.symbol.clone());

    CompareOutcome {
        metric,
        rows,
        winner,
        errors,
    }
}
