//! Risk qualification.
//!
//! Transforms ranked signals plus an indicator frame into either a small
//! set of actionable trade plans or machine-readable suppression reasons.
//! The two outcomes are mutually exclusive by construction.

pub mod plan;
pub mod regime;
pub mod structure;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

pub use plan::{RiskQuality, Vehicle, VehicleParams};
pub use regime::{Timeframe, VolatilityRegime};

use crate::config::ConfigContext;
use crate::indicators::{col, IndicatorFrame};
use crate::signals::Signal;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum Bias {
    Bullish,
    Bearish,
    Neutral,
}

impl Bias {
    pub fn as_str(self) -> &'static str {
        match self {
            Bias::Bullish => "bullish",
            Bias::Bearish => "bearish",
            Bias::Neutral => "neutral",
        }
    }
}

/// Machine-parseable reasons the qualifier refused to emit a plan.
/// The code set is closed and stable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SuppressionCode {
    StopTooWide,
    StopTooTight,
    RrUnfavorable,
    NoClearInvalidation,
    VolatilityTooHigh,
    VolatilityTooLow,
    NoTrend,
    ConflictingSignals,
    InsufficientData,
    NearEarnings,
    MarketClosed,
}

impl SuppressionCode {
    pub fn as_str(self) -> &'static str {
        match self {
            SuppressionCode::StopTooWide => "STOP_TOO_WIDE",
            SuppressionCode::StopTooTight => "STOP_TOO_TIGHT",
            SuppressionCode::RrUnfavorable => "RR_UNFAVORABLE",
            SuppressionCode::NoClearInvalidation => "NO_CLEAR_INVALIDATION",
            SuppressionCode::VolatilityTooHigh => "VOLATILITY_TOO_HIGH",
            SuppressionCode::VolatilityTooLow => "VOLATILITY_TOO_LOW",
            SuppressionCode::NoTrend => "NO_TREND",
            SuppressionCode::ConflictingSignals => "CONFLICTING_SIGNALS",
            SuppressionCode::InsufficientData => "INSUFFICIENT_DATA",
            SuppressionCode::NearEarnings => "NEAR_EARNINGS",
            SuppressionCode::MarketClosed => "MARKET_CLOSED",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct SuppressionReason {
    pub code: SuppressionCode,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub threshold: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actual: Option<f64>,
}

impl SuppressionReason {
    pub fn plain(code: SuppressionCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            threshold: None,
            actual: None,
        }
    }

    pub fn with_values(
        code: SuppressionCode,
        message: impl Into<String>,
        threshold: f64,
        actual: f64,
    ) -> Self {
        Self {
            code,
            message: message.into(),
            threshold: Some(threshold),
            actual: Some(actual),
        }
    }
}

/// An actionable plan. Invariants: `rr_ratio >= min_rr_ratio`; bullish
/// geometry is `invalidation <= stop < entry < target`, mirrored bearish.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct TradePlan {
    pub symbol: String,
    pub timeframe: Timeframe,
    pub bias: Bias,
    pub risk_quality: RiskQuality,
    pub entry: f64,
    pub stop: f64,
    pub target: f64,
    pub invalidation: f64,
    pub rr_ratio: f64,
    pub expected_move_pct: f64,
    pub max_loss_pct: f64,
    pub vehicle: Vehicle,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vehicle_params: Option<VehicleParams>,
    pub primary_signal: String,
    pub supporting_signals: Vec<String>,
}

/// Either plans or suppressions. Never both, never neither.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum RiskOutcome {
    TradePlans(Vec<TradePlan>),
    Suppressions(Vec<SuppressionReason>),
}

impl RiskOutcome {
    pub fn plans(&self) -> &[TradePlan] {
        match self {
            RiskOutcome::TradePlans(plans) => plans,
            RiskOutcome::Suppressions(_) => &[],
        }
    }

    pub fn suppressions(&self) -> &[SuppressionReason] {
        match self {
            RiskOutcome::TradePlans(_) => &[],
            RiskOutcome::Suppressions(reasons) => reasons,
        }
    }

    pub fn is_actionable(&self) -> bool {
        matches!(self, RiskOutcome::TradePlans(_))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct RiskAssessment {
    pub symbol: String,
    pub volatility_regime: VolatilityRegime,
    pub timeframe: Timeframe,
    pub bias: Bias,
    pub outcome: RiskOutcome,
}

struct BiasRead {
    bias: Bias,
    conflict: Option<SuppressionReason>,
}

/// Aggregate the strengths of the top-ranked signals into a directional
/// bias, flagging a conflicted tape.
fn read_bias(ranked: &[Signal], ctx: &ConfigContext) -> BiasRead {
    let top = &ranked[..ranked.len().min(ctx.momentum_top_k)];

    let mut bull_weight = 0.0;
    let mut bear_weight = 0.0;
    let mut bull_count = 0usize;
    let mut bear_count = 0usize;
    for signal in top {
        let weight = if signal.strength.is_strong() {
            ctx.momentum_weight_strong
        } else {
            ctx.momentum_weight_moderate
        };
        match signal.strength.direction() {
            1 => {
                bull_weight += weight;
                bull_count += 1;
            }
            -1 => {
                bear_weight += weight;
                bear_count += 1;
            }
            _ => {}
        }
    }

    let total = bull_count + bear_count;
    if total == 0 {
        return BiasRead {
            bias: Bias::Neutral,
            conflict: Some(SuppressionReason::plain(
                SuppressionCode::ConflictingSignals,
                "no directional signals among the top-ranked set",
            )),
        };
    }

    let minority_pct = bull_count.min(bear_count) as f64 / total as f64 * 100.0;
    if minority_pct > ctx.signal_conflict_pct {
        return BiasRead {
            bias: Bias::Neutral,
            conflict: Some(SuppressionReason::with_values(
                SuppressionCode::ConflictingSignals,
                format!("{minority_pct:.0}% of directional signals oppose the majority"),
                ctx.signal_conflict_pct,
                minority_pct,
            )),
        };
    }

    if bull_weight > bear_weight {
        BiasRead {
            bias: Bias::Bullish,
            conflict: None,
        }
    } else if bear_weight > bull_weight {
        BiasRead {
            bias: Bias::Bearish,
            conflict: None,
        }
    } else {
        BiasRead {
            bias: Bias::Neutral,
            conflict: Some(SuppressionReason::plain(
                SuppressionCode::ConflictingSignals,
                "bullish and bearish weight are exactly balanced",
            )),
        }
    }
}

/// Run the full qualification pipeline.
pub fn qualify(
    frame: &IndicatorFrame,
    ranked: &[Signal],
    ctx: &ConfigContext,
    timeframe_hint: Option<Timeframe>,
) -> RiskAssessment {
    let series = frame.series();
    let symbol = series.symbol.clone();
    let entry = series.last_close();
    let timeframe = regime::choose_timeframe(series.period, timeframe_hint);

    let mut suppressions: Vec<SuppressionReason> = Vec::new();

    // 1. Volatility regime
    let last = frame.len() - 1;
    let Some(atr) = frame.at(col::ATR, last) else {
        return RiskAssessment {
            symbol,
            volatility_regime: VolatilityRegime::Medium,
            timeframe,
            bias: Bias::Neutral,
            outcome: RiskOutcome::Suppressions(vec![SuppressionReason::plain(
                SuppressionCode::InsufficientData,
                "series too short to compute ATR",
            )]),
        };
    };
    let atr_pct = atr / entry * 100.0;
    let volatility_regime = regime::classify(atr_pct, ctx);
    match volatility_regime {
        VolatilityRegime::High => suppressions.push(SuppressionReason::with_values(
            SuppressionCode::VolatilityTooHigh,
            format!("ATR {atr_pct:.2}% of price above the {:.2}% ceiling", ctx.volatility_high),
            ctx.volatility_high,
            atr_pct,
        )),
        VolatilityRegime::Low => suppressions.push(SuppressionReason::with_values(
            SuppressionCode::VolatilityTooLow,
            format!("ATR {atr_pct:.2}% of price under the {:.2}% floor", ctx.volatility_low),
            ctx.volatility_low,
            atr_pct,
        )),
        VolatilityRegime::Medium => {}
    }

    // 2. Timeframe is already chosen; it selects the stop multiple
    let stop_multiple = regime::stop_multiple(timeframe, ctx);

    // 3. Trend gate
    if let Some(adx) = frame.at(col::ADX, last) {
        if adx < ctx.adx_no_trend {
            suppressions.push(SuppressionReason::with_values(
                SuppressionCode::NoTrend,
                format!("ADX {adx:.1} under the {:.1} floor", ctx.adx_no_trend),
                ctx.adx_no_trend,
                adx,
            ));
        }
    }

    // 4. Directional bias
    let BiasRead { bias, conflict } = read_bias(ranked, ctx);
    if let Some(reason) = conflict {
        suppressions.push(reason);
        return RiskAssessment {
            symbol,
            volatility_regime,
            timeframe,
            bias,
            outcome: RiskOutcome::Suppressions(suppressions),
        };
    }

    // 5. Invalidation level against the bias
    let bars = series.bars();
    let invalidation = match bias {
        Bias::Bullish => structure::nearest_low_below(bars, ctx.swing_lookback, entry),
        Bias::Bearish => structure::nearest_high_above(bars, ctx.swing_lookback, entry),
        Bias::Neutral => None,
    };
    let Some(invalidation) = invalidation.map(|p| p.price) else {
        suppressions.push(SuppressionReason::plain(
            SuppressionCode::NoClearInvalidation,
            format!(
                "no confirmed swing structure against a {} bias within {} bars",
                bias.as_str(),
                ctx.swing_lookback
            ),
        ));
        return RiskAssessment {
            symbol,
            volatility_regime,
            timeframe,
            bias,
            outcome: RiskOutcome::Suppressions(suppressions),
        };
    };

    // 6. Stop placement
    let stop = match plan::compute_stop(bias, entry, invalidation, atr, stop_multiple, ctx) {
        Ok(stop) => stop,
        Err(reason) => {
            suppressions.push(reason);
            return RiskAssessment {
                symbol,
                volatility_regime,
                timeframe,
                bias,
                outcome: RiskOutcome::Suppressions(suppressions),
            };
        }
    };

    // 7. Target: nearest structural level past the entry, preferred-R:R
    // projection otherwise
    let structural_target = match bias {
        Bias::Bullish => structure::nearest_high_above(bars, ctx.swing_lookback, entry),
        Bias::Bearish => structure::nearest_low_below(bars, ctx.swing_lookback, entry),
        Bias::Neutral => None,
    }
    .map(|p| p.price);
    let target = plan::compute_target(bias, entry, stop, structural_target, ctx);

    // 8. R:R gate
    let rr = plan::rr_ratio(entry, stop, target);
    if rr < ctx.min_rr_ratio {
        suppressions.push(SuppressionReason::with_values(
            SuppressionCode::RrUnfavorable,
            format!("R:R {rr:.2} under the {:.2} minimum", ctx.min_rr_ratio),
            ctx.min_rr_ratio,
            rr,
        ));
    }

    if !suppressions.is_empty() {
        return RiskAssessment {
            symbol,
            volatility_regime,
            timeframe,
            bias,
            outcome: RiskOutcome::Suppressions(suppressions),
        };
    }

    // 9. Vehicle selection
    let expected_move_pct = (target - entry).abs() / entry * 100.0;
    let (vehicle, vehicle_params) = plan::select_vehicle(bias, expected_move_pct, atr, ctx);

    // 10. Risk-quality label + plan assembly
    let aligned: Vec<&Signal> = ranked
        .iter()
        .take(ctx.momentum_top_k)
        .filter(|s| s.strength.direction() == if bias == Bias::Bullish { 1 } else { -1 })
        .collect();
    let max_loss_pct = (entry - stop).abs() / entry * 100.0;

    let mut plans = Vec::new();
    for primary in aligned.iter().take(ctx.max_trade_plans) {
        let quality = plan::quality_label(rr, volatility_regime, primary.strength.is_strong(), ctx);
        let supporting: Vec<String> = aligned
            .iter()
            .filter(|s| s.name != primary.name)
            .map(|s| s.name.clone())
            .collect();
        plans.push(TradePlan {
            symbol: symbol.clone(),
            timeframe,
            bias,
            risk_quality: quality,
            entry,
            stop,
            target,
            invalidation,
            rr_ratio: rr,
            expected_move_pct,
            max_loss_pct,
            vehicle,
            vehicle_params: vehicle_params.clone(),
            primary_signal: primary.name.clone(),
            supporting_signals: supporting,
        });
    }

    debug_assert!(!plans.is_empty(), "directional bias implies aligned signals");
    RiskAssessment {
        symbol,
        volatility_regime,
        timeframe,
        bias,
        outcome: RiskOutcome::TradePlans(plans),
    }
}
