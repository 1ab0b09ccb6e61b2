//! Session override parsing.
//!
//! The wire format is a flat `{string -> number}` map. It is parsed up front
//! into a typed [`Override`] routed to the nested sub-record it belongs to,
//! with range validation per field. Unknown keys and out-of-range values are
//! collected and reported together.

use std::collections::BTreeMap;

use sha2::{Digest, Sha256};

use super::{IndicatorConfig, MomentumConfig, RiskConfig, SignalConfig};
use crate::error::{AnalysisError, AnalysisResult};

#[derive(Debug, Clone, PartialEq)]
pub enum Override {
    Indicator(IndicatorOverride),
    Risk(RiskOverride),
    Momentum(MomentumOverride),
    Signal(SignalOverride),
}

#[derive(Debug, Clone, PartialEq)]
pub enum IndicatorOverride {
    RsiPeriod(usize),
    RsiOversold(f64),
    RsiOverbought(f64),
    RsiExtremeOversold(f64),
    RsiExtremeOverbought(f64),
    MacdFast(usize),
    MacdSlow(usize),
    MacdSignal(usize),
    BollingerPeriod(usize),
    BollingerStdDev(f64),
    StochKPeriod(usize),
    StochDPeriod(usize),
    StochOversold(f64),
    StochOverbought(f64),
    AdxPeriod(usize),
    AtrPeriod(usize),
    LargeMovePct(f64),
    GapPct(f64),
}

impl IndicatorOverride {
    pub(super) fn apply(&self, c: &mut IndicatorConfig) {
        match *self {
            IndicatorOverride::RsiPeriod(v) => c.rsi_period = v,
            IndicatorOverride::RsiOversold(v) => c.rsi_oversold = v,
            IndicatorOverride::RsiOverbought(v) => c.rsi_overbought = v,
            IndicatorOverride::RsiExtremeOversold(v) => c.rsi_extreme_oversold = v,
            IndicatorOverride::RsiExtremeOverbought(v) => c.rsi_extreme_overbought = v,
            IndicatorOverride::MacdFast(v) => c.macd_fast = v,
            IndicatorOverride::MacdSlow(v) => c.macd_slow = v,
            IndicatorOverride::MacdSignal(v) => c.macd_signal = v,
            IndicatorOverride::BollingerPeriod(v) => c.bollinger_period = v,
            IndicatorOverride::BollingerStdDev(v) => c.bollinger_std_dev = v,
            IndicatorOverride::StochKPeriod(v) => c.stoch_k_period = v,
            IndicatorOverride::StochDPeriod(v) => c.stoch_d_period = v,
            IndicatorOverride::StochOversold(v) => c.stoch_oversold = v,
            IndicatorOverride::StochOverbought(v) => c.stoch_overbought = v,
            IndicatorOverride::AdxPeriod(v) => c.adx_period = v,
            IndicatorOverride::AtrPeriod(v) => c.atr_period = v,
            IndicatorOverride::LargeMovePct(v) => c.large_move_pct = v,
            IndicatorOverride::GapPct(v) => c.gap_pct = v,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum RiskOverride {
    StopAtrSwing(f64),
    StopAtrDay(f64),
    StopAtrScalp(f64),
    MinRrRatio(f64),
    PreferredRrRatio(f64),
    VolatilityLow(f64),
    VolatilityHigh(f64),
    AdxTrending(f64),
    AdxNoTrend(f64),
    PositionRiskPct(f64),
    SignalConflictPct(f64),
    SwingLookback(usize),
    OptionMinExpectedMove(f64),
}

impl RiskOverride {
    pub(super) fn apply(&self, c: &mut RiskConfig) {
        match *self {
            RiskOverride::StopAtrSwing(v) => c.stop_atr_swing = v,
            RiskOverride::StopAtrDay(v) => c.stop_atr_day = v,
            RiskOverride::StopAtrScalp(v) => c.stop_atr_scalp = v,
            RiskOverride::MinRrRatio(v) => c.min_rr_ratio = v,
            RiskOverride::PreferredRrRatio(v) => c.preferred_rr_ratio = v,
            RiskOverride::VolatilityLow(v) => c.volatility_low = v,
            RiskOverride::VolatilityHigh(v) => c.volatility_high = v,
            RiskOverride::AdxTrending(v) => c.adx_trending = v,
            RiskOverride::AdxNoTrend(v) => c.adx_no_trend = v,
            RiskOverride::PositionRiskPct(v) => c.position_risk_pct = v,
            RiskOverride::SignalConflictPct(v) => c.signal_conflict_pct = v,
            RiskOverride::SwingLookback(v) => c.swing_lookback = v,
            RiskOverride::OptionMinExpectedMove(v) => c.option_min_expected_move = v,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum MomentumOverride {
    TopK(usize),
    WeightStrong(f64),
    WeightModerate(f64),
}

impl MomentumOverride {
    pub(super) fn apply(&self, c: &mut MomentumConfig) {
        match *self {
            MomentumOverride::TopK(v) => c.top_k = v,
            MomentumOverride::WeightStrong(v) => c.weight_strong = v,
            MomentumOverride::WeightModerate(v) => c.weight_moderate = v,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SignalOverride {
    MaxSignalsReturned(usize),
    MaxTradePlans(usize),
}

impl SignalOverride {
    pub(super) fn apply(&self, c: &mut SignalConfig) {
        match *self {
            SignalOverride::MaxSignalsReturned(v) => c.max_signals_returned = v,
            SignalOverride::MaxTradePlans(v) => c.max_trade_plans = v,
        }
    }
}

fn float_in(
    key: &str,
    value: &serde_json::Value,
    min: f64,
    max: f64,
) -> Result<f64, String> {
    let v = value
        .as_f64()
        .ok_or_else(|| format!("{key}: expected a number, got {value}"))?;
    if v < min || v > max {
        return Err(format!("{key}: {v} out of range [{min}, {max}]"));
    }
    Ok(v)
}

fn int_in(
    key: &str,
    value: &serde_json::Value,
    min: u64,
    max: u64,
) -> Result<usize, String> {
    let v = value
        .as_u64()
        .ok_or_else(|| format!("{key}: expected a positive integer, got {value}"))?;
    if v < min || v > max {
        return Err(format!("{key}: {v} out of range [{min}, {max}]"));
    }
    Ok(v as usize)
}

/// Every overridable field name, for discovery surfaces.
pub const KNOWN_KEYS: &[&str] = &[
    "rsi_period",
    "rsi_oversold",
    "rsi_overbought",
    "rsi_extreme_oversold",
    "rsi_extreme_overbought",
    "macd_fast",
    "macd_slow",
    "macd_signal",
    "bollinger_period",
    "bollinger_std_dev",
    "stoch_k_period",
    "stoch_d_period",
    "stoch_oversold",
    "stoch_overbought",
    "adx_period",
    "atr_period",
    "large_move_pct",
    "gap_pct",
    "stop_atr_swing",
    "stop_atr_day",
    "stop_atr_scalp",
    "min_rr_ratio",
    "preferred_rr_ratio",
    "volatility_low",
    "volatility_high",
    "adx_trending",
    "adx_no_trend",
    "position_risk_pct",
    "signal_conflict_pct",
    "swing_lookback",
    "option_min_expected_move",
    "momentum_top_k",
    "momentum_weight_strong",
    "momentum_weight_moderate",
    "max_signals_returned",
    "max_trade_plans",
];

/// The fixed field-name -> sub-record mapping. One entry per overridable
/// scalar; anything not listed here is an unknown key.
fn parse_one(key: &str, value: &serde_json::Value) -> Result<Override, String> {
    use Override as O;
    let ov = match key {
        // indicators
        "rsi_period" => O::Indicator(IndicatorOverride::RsiPeriod(int_in(key, value, 2, 100)?)),
        "rsi_oversold" => {
            O::Indicator(IndicatorOverride::RsiOversold(float_in(key, value, 5.0, 50.0)?))
        }
        "rsi_overbought" => O::Indicator(IndicatorOverride::RsiOverbought(float_in(
            key, value, 50.0, 95.0,
        )?)),
        "rsi_extreme_oversold" => O::Indicator(IndicatorOverride::RsiExtremeOversold(float_in(
            key, value, 1.0, 40.0,
        )?)),
        "rsi_extreme_overbought" => O::Indicator(IndicatorOverride::RsiExtremeOverbought(
            float_in(key, value, 60.0, 99.0)?,
        )),
        "macd_fast" => O::Indicator(IndicatorOverride::MacdFast(int_in(key, value, 2, 50)?)),
        "macd_slow" => O::Indicator(IndicatorOverride::MacdSlow(int_in(key, value, 5, 100)?)),
        "macd_signal" => O::Indicator(IndicatorOverride::MacdSignal(int_in(key, value, 2, 50)?)),
        "bollinger_period" => {
            O::Indicator(IndicatorOverride::BollingerPeriod(int_in(key, value, 5, 100)?))
        }
        "bollinger_std_dev" => O::Indicator(IndicatorOverride::BollingerStdDev(float_in(
            key, value, 0.5, 5.0,
        )?)),
        "stoch_k_period" => {
            O::Indicator(IndicatorOverride::StochKPeriod(int_in(key, value, 3, 50)?))
        }
        "stoch_d_period" => {
            O::Indicator(IndicatorOverride::StochDPeriod(int_in(key, value, 1, 20)?))
        }
        "stoch_oversold" => O::Indicator(IndicatorOverride::StochOversold(float_in(
            key, value, 5.0, 40.0,
        )?)),
        "stoch_overbought" => O::Indicator(IndicatorOverride::StochOverbought(float_in(
            key, value, 60.0, 95.0,
        )?)),
        "adx_period" => O::Indicator(IndicatorOverride::AdxPeriod(int_in(key, value, 5, 50)?)),
        "atr_period" => O::Indicator(IndicatorOverride::AtrPeriod(int_in(key, value, 5, 50)?)),
        "large_move_pct" => O::Indicator(IndicatorOverride::LargeMovePct(float_in(
            key, value, 0.5, 25.0,
        )?)),
        "gap_pct" => O::Indicator(IndicatorOverride::GapPct(float_in(key, value, 0.1, 15.0)?)),

        // risk
        "stop_atr_swing" => {
            O::Risk(RiskOverride::StopAtrSwing(float_in(key, value, 0.1, 10.0)?))
        }
        "stop_atr_day" => O::Risk(RiskOverride::StopAtrDay(float_in(key, value, 0.1, 10.0)?)),
        "stop_atr_scalp" => {
            O::Risk(RiskOverride::StopAtrScalp(float_in(key, value, 0.1, 10.0)?))
        }
        "min_rr_ratio" => O::Risk(RiskOverride::MinRrRatio(float_in(key, value, 0.5, 10.0)?)),
        "preferred_rr_ratio" => O::Risk(RiskOverride::PreferredRrRatio(float_in(
            key, value, 0.5, 10.0,
        )?)),
        "volatility_low" => {
            O::Risk(RiskOverride::VolatilityLow(float_in(key, value, 0.1, 20.0)?))
        }
        "volatility_high" => {
            O::Risk(RiskOverride::VolatilityHigh(float_in(key, value, 0.1, 20.0)?))
        }
        "adx_trending" => O::Risk(RiskOverride::AdxTrending(float_in(key, value, 5.0, 60.0)?)),
        "adx_no_trend" => O::Risk(RiskOverride::AdxNoTrend(float_in(key, value, 5.0, 60.0)?)),
        "position_risk_pct" => O::Risk(RiskOverride::PositionRiskPct(float_in(
            key, value, 0.1, 10.0,
        )?)),
        "signal_conflict_pct" => O::Risk(RiskOverride::SignalConflictPct(float_in(
            key, value, 0.0, 100.0,
        )?)),
        "swing_lookback" => O::Risk(RiskOverride::SwingLookback(int_in(key, value, 5, 100)?)),
        "option_min_expected_move" => O::Risk(RiskOverride::OptionMinExpectedMove(float_in(
            key, value, 0.0, 50.0,
        )?)),

        // momentum
        "momentum_top_k" => O::Momentum(MomentumOverride::TopK(int_in(key, value, 1, 50)?)),
        "momentum_weight_strong" => O::Momentum(MomentumOverride::WeightStrong(float_in(
            key, value, 0.0, 10.0,
        )?)),
        "momentum_weight_moderate" => O::Momentum(MomentumOverride::WeightModerate(float_in(
            key, value, 0.0, 10.0,
        )?)),

        // signals
        "max_signals_returned" => {
            O::Signal(SignalOverride::MaxSignalsReturned(int_in(key, value, 1, 200)?))
        }
        "max_trade_plans" => {
            O::Signal(SignalOverride::MaxTradePlans(int_in(key, value, 1, 20)?))
        }

        other => return Err(format!("{other}: unknown override key")),
    };
    Ok(ov)
}

/// Parse a flat override map into typed overrides, collecting every
/// offending key into one `INVALID_OVERRIDE` error.
pub fn parse_overrides(
    map: &BTreeMap<String, serde_json::Value>,
) -> AnalysisResult<Vec<Override>> {
    let mut parsed = Vec::with_capacity(map.len());
    let mut problems = Vec::new();
    for (key, value) in map {
        match parse_one(key, value) {
            Ok(ov) => parsed.push(ov),
            Err(problem) => problems.push(problem),
        }
    }
    if problems.is_empty() {
        Ok(parsed)
    } else {
        Err(AnalysisError::InvalidOverride(problems.join("; ")))
    }
}

/// Stable fingerprint of an override map for cache keys. Sorted key order,
/// canonical JSON values, SHA-256 truncated to 16 hex chars.
pub fn fingerprint(map: &BTreeMap<String, serde_json::Value>) -> String {
    if map.is_empty() {
        return "default".to_string();
    }
    let mut hasher = Sha256::new();
    for (key, value) in map {
        hasher.update(key.as_bytes());
        hasher.update(b"=");
        hasher.update(value.to_string().as_bytes());
        hasher.update(b"\n");
    }
    hex::encode(hasher.finalize())[..16].to_string()
}
