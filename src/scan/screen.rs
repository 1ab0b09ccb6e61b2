//! Boolean screening over per-symbol analysis output.

use std::sync::Arc;

use garde::Validate;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::{analyze_many, FanoutLimits, SymbolError};
use crate::analysis::{AnalysisEngine, AnalysisReport, AnalysisRequest};
use crate::indicators::col;
use crate::risk::Bias;

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, Validate)]
pub struct ScreenCriteria {
    /// Lowest acceptable RSI reading.
    #[garde(inner(range(min = 0.0, max = 100.0)))]
    pub rsi_min: Option<f64>,
    /// Highest acceptable RSI reading.
    #[garde(inner(range(min = 0.0, max = 100.0)))]
    pub rsi_max: Option<f64>,
    /// Minimum count of bullish-direction signals.
    #[garde(skip)]
    pub min_bullish_signals: Option<usize>,
    /// Minimum top ranked-signal score.
    #[garde(inner(range(min = 0.0, max = 100.0)))]
    pub min_score: Option<f64>,
    /// Required directional bias from the risk layer.
    #[garde(skip)]
    pub bias: Option<Bias>,
}

impl ScreenCriteria {
    fn matches(&self, report: &AnalysisReport) -> bool {
        let rsi = report.indicators.get(col::RSI).copied();
        if let Some(min) = self.rsi_min {
            match rsi {
                Some(v) if v >= min => {}
                _ => return false,
            }
        }
        if let Some(max) = self.rsi_max {
            match rsi {
                Some(v) if v <= max => {}
                _ => return false,
            }
        }
        if let Some(min) = self.min_bullish_signals {
            let bullish = report
                .signals
                .iter()
                .filter(|s| s.strength.direction() == 1)
                .count();
            if bullish < min {
                return false;
            }
        }
        if let Some(min) = self.min_score {
            match report.signals.first().and_then(|s| s.score) {
                Some(score) if score >= min => {}
                _ => return false,
            }
        }
        if let Some(required) = self.bias {
            if report.assessment.bias != required {
                return false;
            }
        }
        true
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ScreenMatch {
    pub symbol: String,
    pub price: f64,
    pub change_pct: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rsi: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_score: Option<f64>,
    pub bullish_signals: usize,
    pub bias: Bias,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ScreenOutcome {
    pub total_scanned: usize,
    pub matches: Vec<ScreenMatch>,
    pub errors: Vec<SymbolError>,
}

/// Apply boolean criteria across symbols; matches sorted by top score
/// descending.
pub async fn screen(
    engine: &Arc<AnalysisEngine>,
    symbols: &[String],
    criteria: &ScreenCriteria,
    base: &AnalysisRequest,
    limits: FanoutLimits,
) -> ScreenOutcome {
    let (reports, errors) = analyze_many(engine, symbols, base, limits).await;
    let total_scanned = symbols.len();

    let mut matches: Vec<ScreenMatch> = reports
        .iter()
        .filter(|report| criteria.matches(report))
        .map(|report| ScreenMatch {
            symbol: report.symbol.clone(),
            price: report.price,
            change_pct: report.change_pct,
            rsi: report.indicators.get(col::RSI).copied(),
            top_score: report.signals.first().and_then(|s| s.score),
            bullish_signals: report
                .signals
                .iter()
                .filter(|s| s.strength.direction() == 1)
                .count(),
            bias: report.assessment.bias,
        })
        .collect();

    matches.sort_by(|a, b| {
        b.top_score
            .unwrap_or(0.0)
            .partial_cmp(&a.top_score.unwrap_or(0.0))
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a.symbol.cmp(&b.symbol))
    });

    ScreenOutcome {
        total_scanned,
        matches,
        errors,
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::scripted_engine;
    use super::*;

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn unfiltered_screen_matches_every_success() {
        let engine = scripted_engine();
        let symbols = vec!["AAA".to_string(), "BBB".to_string(), "BAD1".to_string()];
        let outcome = screen(
            &engine,
            &symbols,
            &ScreenCriteria::default(),
            &AnalysisRequest::default(),
            FanoutLimits::default(),
        )
        .await;
        assert_eq!(outcome.total_scanned, 3);
        assert_eq!(outcome.matches.len(), 2);
        assert_eq!(outcome.errors.len(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn rsi_window_filters() {
        let engine = scripted_engine();
        let symbols = vec!["AAA".to_string()];
        // Scripted uptrend pins RSI high; an impossible window excludes it
        let criteria = ScreenCriteria {
            rsi_min: Some(10.0),
            rsi_max: Some(30.0),
            ..ScreenCriteria::default()
        };
        let outcome = screen(
            &engine,
            &symbols,
            &criteria,
            &AnalysisRequest::default(),
            FanoutLimits::default(),
        )
        .await;
        assert!(outcome.matches.is_empty());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn bullish_count_criterion() {
        let engine = scripted_engine();
        let symbols = vec!["AAA".to_string()];
        let criteria = ScreenCriteria {
            min_bullish_signals: Some(1),
            ..ScreenCriteria::default()
        };
        let outcome = screen(
            &engine,
            &symbols,
            &criteria,
            &AnalysisRequest::default(),
            FanoutLimits::default(),
        )
        .await;
        assert_eq!(outcome.matches.len(), 1);
        assert!(outcome.matches[0].bullish_signals >= 1);
    }
}
