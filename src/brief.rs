//! Morning brief: one composed snapshot of a watchlist, delegating every
//! symbol to the per-symbol core.

use std::sync::Arc;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::analysis::{AnalysisEngine, AnalysisRequest};
use crate::error::AnalysisResult;
use crate::scan::{analyze_many, FanoutLimits, QualifiedTrade, SymbolError};
use crate::universe;

const MOVER_COUNT: usize = 5;
const TOP_SIGNAL_COUNT: usize = 10;

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct Mover {
    pub symbol: String,
    pub price: f64,
    pub change_pct: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct BriefSignal {
    pub symbol: String,
    pub name: String,
    pub score: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct MorningBrief {
    pub market_region: String,
    pub watchlist: Vec<String>,
    pub gainers: Vec<Mover>,
    pub losers: Vec<Mover>,
    pub top_signals: Vec<BriefSignal>,
    pub trade_ideas: Vec<QualifiedTrade>,
    pub errors: Vec<SymbolError>,
}

/// Compose a brief for a watchlist (the default list when none is given).
pub async fn morning_brief(
    engine: &Arc<AnalysisEngine>,
    watchlist: Option<Vec<String>>,
    market_region: Option<String>,
    base: &AnalysisRequest,
    limits: FanoutLimits,
) -> AnalysisResult<MorningBrief> {
    let watchlist: Vec<String> = match watchlist {
        Some(list) if !list.is_empty() => list.iter().map(|s| s.to_uppercase()).collect(),
        _ => universe::resolve_universe("watchlist_default")?
            .iter()
            .map(|s| (*s).to_string())
            .collect(),
    };

    let (reports, errors) = analyze_many(engine, &watchlist, base, limits).await;

    let mut by_change: Vec<&Arc<crate::analysis::AnalysisReport>> = reports.iter().collect();
    by_change.sort_by(|a, b| {
        b.change_pct
            .partial_cmp(&a.change_pct)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    let gainers: Vec<Mover> = by_change
        .iter()
        .take(MOVER_COUNT)
        .filter(|r| r.change_pct > 0.0)
        .map(|r| Mover {
            symbol: r.symbol.clone(),
            price: r.price,
            change_pct: r.change_pct,
        })
        .collect();
    let losers: Vec<Mover> = by_change
        .iter()
        .rev()
        .take(MOVER_COUNT)
        .filter(|r| r.change_pct < 0.0)
        .map(|r| Mover {
            symbol: r.symbol.clone(),
            price: r.price,
            change_pct: r.change_pct,
        })
        .collect();

    let mut top_signals: Vec<BriefSignal> = reports
        .iter()
        .flat_map(|report| {
            report.signals.iter().filter_map(|signal| {
                signal.score.map(|score| BriefSignal {
                    symbol: report.symbol.clone(),
                    name: signal.name.clone(),
                    score,
                })
            })
        })
        .collect();
    top_signals.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a.symbol.cmp(&b.symbol))
    });
    top_signals.truncate(TOP_SIGNAL_COUNT);

    let trade_ideas: Vec<QualifiedTrade> = reports
        .iter()
        .filter_map(|report| {
            let best = report.assessment.outcome.plans().first()?;
            Some(QualifiedTrade {
                symbol: report.symbol.clone(),
                risk_quality: best.risk_quality,
                score: report.signals.first().and_then(|s| s.score).unwrap_or(0.0),
                bias: best.bias,
                price: report.price,
                plan: best.clone(),
            })
        })
        .collect();

    Ok(MorningBrief {
        market_region: market_region.unwrap_or_else(|| "US".to_string()),
        watchlist,
        gainers,
        losers,
        top_signals,
        trade_ideas,
        errors,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scan::test_support::scripted_engine;

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn brief_over_custom_watchlist() {
        let engine = scripted_engine();
        let brief = morning_brief(
            &engine,
            Some(vec!["AAA".to_string(), "BBB".to_string(), "BAD1".to_string()]),
            None,
            &AnalysisRequest::default(),
            FanoutLimits::default(),
        )
        .await
        .unwrap();

        assert_eq!(brief.market_region, "US");
        assert_eq!(brief.watchlist.len(), 3);
        assert_eq!(brief.errors.len(), 1);
        assert!(!brief.top_signals.is_empty());
        assert!(brief.top_signals.len() <= TOP_SIGNAL_COUNT);
        // scripted uptrend closes green
        assert!(!brief.gainers.is_empty());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn brief_defaults_to_builtin_watchlist() {
        let engine = scripted_engine();
        let brief = morning_brief(
            &engine,
            None,
            Some("EU".to_string()),
            &AnalysisRequest::default(),
            FanoutLimits::default(),
        )
        .await
        .unwrap();
        assert_eq!(brief.market_region, "EU");
        assert!(brief.watchlist.len() >= 10);
    }
}
