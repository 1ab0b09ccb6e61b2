//! Portfolio risk aggregation: per-position intelligent stops bucketed by
//! realized volatility, rolled up into GICS sector exposure.

use std::collections::BTreeMap;
use std::sync::Arc;

use garde::Validate;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::{analyze_many, FanoutLimits, SymbolError};
use crate::analysis::{AnalysisEngine, AnalysisRequest};
use crate::indicators::col;
use crate::universe;

/// Stop-distance ranges per risk bucket, in percent of entry.
const LOW_RANGE: (f64, f64) = (2.0, 3.0);
const MODERATE_RANGE: (f64, f64) = (3.0, 5.0);
const HIGH_RANGE: (f64, f64) = (5.0, 8.0);

/// Annualized realized-vol boundaries between the buckets.
const LOW_VOL_CEILING: f64 = 20.0;
const MODERATE_VOL_CEILING: f64 = 35.0;
const HIGH_VOL_SPAN: f64 = 25.0;

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Validate)]
pub struct PositionInput {
    /// Ticker symbol.
    #[garde(length(min = 1, max = 10), pattern(r"^[A-Za-z0-9.\-]+$"))]
    pub symbol: String,
    /// Share count.
    #[garde(range(min = 0.0001))]
    pub shares: f64,
    /// Informational cost basis; snapshot risk always uses the current close.
    #[garde(inner(range(min = 0.0)))]
    pub entry_price: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Moderate,
    High,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct PositionRisk {
    pub symbol: String,
    pub sector: String,
    pub shares: f64,
    pub price: f64,
    pub value: f64,
    pub stop_price: f64,
    pub stop_distance_pct: f64,
    pub dollar_risk: f64,
    pub risk_level: RiskLevel,
    pub realized_vol: Option<f64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct RiskDistribution {
    pub low: usize,
    pub moderate: usize,
    pub high: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SectorBucket {
    pub sector: String,
    pub total_value: f64,
    pub pct_of_portfolio: f64,
    pub position_count: usize,
    pub max_loss: f64,
    pub risk_distribution: RiskDistribution,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct PortfolioRiskReport {
    pub positions: Vec<PositionRisk>,
    pub sectors: Vec<SectorBucket>,
    pub total_value: f64,
    pub total_max_loss: f64,
    /// Total max loss over total value, in percent.
    pub overall_risk_pct: f64,
    pub errors: Vec<SymbolError>,
}

/// Map annualized realized volatility to a stop-distance percent: pick the
/// bucket, then scale within the bucket's range by where the volatility
/// sits inside the band.
fn stop_distance_pct(realized_vol: Option<f64>) -> (f64, RiskLevel) {
    let Some(vol) = realized_vol else {
        // No vol estimate: assume the middle of the moderate band
        return ((MODERATE_RANGE.0 + MODERATE_RANGE.1) / 2.0, RiskLevel::Moderate);
    };
    if vol < LOW_VOL_CEILING {
        let t = (vol / LOW_VOL_CEILING).clamp(0.0, 1.0);
        (LOW_RANGE.0 + t * (LOW_RANGE.1 - LOW_RANGE.0), RiskLevel::Low)
    } else if vol < MODERATE_VOL_CEILING {
        let t = ((vol - LOW_VOL_CEILING) / (MODERATE_VOL_CEILING - LOW_VOL_CEILING))
            .clamp(0.0, 1.0);
        (
            MODERATE_RANGE.0 + t * (MODERATE_RANGE.1 - MODERATE_RANGE.0),
            RiskLevel::Moderate,
        )
    } else {
        let t = ((vol - MODERATE_VOL_CEILING) / HIGH_VOL_SPAN).clamp(0.0, 1.0);
        (
            HIGH_RANGE.0 + t * (HIGH_RANGE.1 - HIGH_RANGE.0),
            RiskLevel::High,
        )
    }
}

/// Assess every position and aggregate by sector.
pub async fn portfolio_risk(
    engine: &Arc<AnalysisEngine>,
    positions: &[PositionInput],
    base: &AnalysisRequest,
    limits: FanoutLimits,
) -> PortfolioRiskReport {
    let symbols: Vec<String> = positions.iter().map(|p| p.symbol.to_uppercase()).collect();
    let (reports, errors) = analyze_many(engine, &symbols, base, limits).await;

    let mut assessed = Vec::new();
    for position in positions {
        let upper = position.symbol.to_uppercase();
        let Some(report) = reports.iter().find(|r| r.symbol == upper) else {
            continue;
        };
        // Snapshot assessment: entry is the current close
        let price = report.price;
        let realized_vol = report.indicators.get(col::REALIZED_VOL).copied();
        let (distance_pct, risk_level) = stop_distance_pct(realized_vol);
        let stop_price = price * (1.0 - distance_pct / 100.0);
        let value = position.shares * price;
        assessed.push(PositionRisk {
            symbol: upper,
            sector: universe::sector_of(&position.symbol).to_string(),
            shares: position.shares,
            price,
            value,
            stop_price,
            stop_distance_pct: distance_pct,
            dollar_risk: position.shares * (price - stop_price),
            risk_level,
            realized_vol,
        });
    }

    let total_value: f64 = assessed.iter().map(|p| p.value).sum();
    let total_max_loss: f64 = assessed.iter().map(|p| p.dollar_risk).sum();

    let mut by_sector: BTreeMap<&str, Vec<&PositionRisk>> = BTreeMap::new();
    for position in &assessed {
        by_sector.entry(position.sector.as_str()).or_default().push(position);
    }

    let sectors: Vec<SectorBucket> = by_sector
        .into_iter()
        .map(|(sector, members)| {
            let sector_value: f64 = members.iter().map(|p| p.value).sum();
            let mut distribution = RiskDistribution::default();
            for member in &members {
                match member.risk_level {
                    RiskLevel::Low => distribution.low += 1,
                    RiskLevel::Moderate => distribution.moderate += 1,
                    RiskLevel::High => distribution.high += 1,
                }
            }
            SectorBucket {
                sector: sector.to_string(),
                total_value: sector_value,
                pct_of_portfolio: if total_value > 0.0 {
                    sector_value / total_value * 100.0
                } else {
                    0.0
                },
                position_count: members.len(),
                max_loss: members.iter().map(|p| p.dollar_risk).sum(),
                risk_distribution: distribution,
            }
        })
        .collect();

    PortfolioRiskReport {
        positions: assessed,
        sectors,
        total_value,
        total_max_loss,
        overall_risk_pct: if total_value > 0.0 {
            total_max_loss / total_value * 100.0
        } else {
            0.0
        },
        errors,
    }
}
