pub mod context;
pub mod overrides;
pub mod profile;

use std::collections::BTreeMap;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

pub use context::ConfigContext;
pub use overrides::{fingerprint, parse_overrides, Override};
pub use profile::RiskProfile;

use crate::error::AnalysisResult;

/// Indicator thresholds and lookbacks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct IndicatorConfig {
    pub rsi_period: usize,
    pub rsi_oversold: f64,
    pub rsi_overbought: f64,
    pub rsi_extreme_oversold: f64,
    pub rsi_extreme_overbought: f64,
    pub macd_fast: usize,
    pub macd_slow: usize,
    pub macd_signal: usize,
    pub bollinger_period: usize,
    pub bollinger_std_dev: f64,
    pub stoch_k_period: usize,
    pub stoch_d_period: usize,
    pub stoch_oversold: f64,
    pub stoch_overbought: f64,
    pub adx_period: usize,
    pub atr_period: usize,
    pub large_move_pct: f64,
    pub gap_pct: f64,
}

/// Everything the risk qualifier reads: stop geometry, R:R floors,
/// volatility and trend gates, option vehicle parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct RiskConfig {
    pub stop_atr_swing: f64,
    pub stop_atr_day: f64,
    pub stop_atr_scalp: f64,
    pub stop_min_atr_multiple: f64,
    pub stop_max_atr_multiple: f64,
    pub min_rr_ratio: f64,
    pub preferred_rr_ratio: f64,
    pub volatility_low: f64,
    pub volatility_high: f64,
    pub adx_trending: f64,
    pub adx_no_trend: f64,
    pub position_risk_pct: f64,
    pub signal_conflict_pct: f64,
    pub swing_lookback: usize,
    pub option_min_expected_move: f64,
    pub call_delta_min: f64,
    pub call_delta_max: f64,
    pub put_delta_min: f64,
    pub put_delta_max: f64,
    pub option_swing_min_dte: u32,
    pub option_swing_max_dte: u32,
    pub option_spread_width_atr: f64,
}

/// Weighting used when aggregating the top-ranked signals into a
/// directional bias.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct MomentumConfig {
    pub top_k: usize,
    pub weight_strong: f64,
    pub weight_moderate: f64,
}

/// Output shaping: how many signals and plans are returned, and how much
/// each category is favored by the rule-based ranker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct SignalConfig {
    pub max_signals_returned: usize,
    pub max_trade_plans: usize,
    pub category_bonuses: BTreeMap<String, f64>,
}

/// Immutable per-request configuration. Constructed by [`resolve`], never
/// mutated afterwards; overrides produce a new value via copy-on-write.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct UserConfig {
    pub profile: RiskProfile,
    pub indicators: IndicatorConfig,
    pub risk: RiskConfig,
    pub momentum: MomentumConfig,
    pub signals: SignalConfig,
}

fn default_category_bonuses() -> BTreeMap<String, f64> {
    BTreeMap::from([
        ("MA_CROSS".to_string(), 10.0),
        ("MA_TREND".to_string(), 6.0),
        ("RSI".to_string(), 5.0),
        ("MACD".to_string(), 5.0),
        ("BOLLINGER".to_string(), 4.0),
        ("STOCHASTIC".to_string(), 3.0),
        ("VOLUME".to_string(), 6.0),
        ("TREND".to_string(), 8.0),
        ("ADX".to_string(), 8.0),
        ("PRICE_ACTION".to_string(), 4.0),
    ])
}

impl UserConfig {
    /// The preset for a profile. Fields outside the preset table are shared
    /// across profiles.
    pub fn preset(profile: RiskProfile) -> Self {
        let (
            rsi_oversold,
            rsi_overbought,
            min_rr_ratio,
            preferred_rr_ratio,
            stop_atr_swing,
            stop_atr_day,
            stop_atr_scalp,
            volatility_low,
            volatility_high,
            adx_trending,
            adx_no_trend,
            position_risk_pct,
            signal_conflict_pct,
            option_min_expected_move,
            max_signals_returned,
            max_trade_plans,
        ) = match profile {
            RiskProfile::Risky => (
                35.0, 65.0, 1.2, 2.0, 1.5, 0.75, 0.4, 0.8, 4.0, 20.0, 15.0, 3.0, 45.0, 4.0, 75, 5,
            ),
            RiskProfile::Neutral => (
                30.0, 70.0, 1.5, 2.5, 2.0, 1.0, 0.5, 1.0, 3.0, 25.0, 18.0, 2.0, 40.0, 5.0, 50, 3,
            ),
            RiskProfile::Averse => (
                25.0, 75.0, 2.0, 3.0, 2.5, 1.25, 0.6, 1.2, 2.5, 30.0, 20.0, 1.0, 35.0, 6.0, 30, 2,
            ),
        };

        UserConfig {
            profile,
            indicators: IndicatorConfig {
                rsi_period: 14,
                rsi_oversold,
                rsi_overbought,
                rsi_extreme_oversold: 20.0,
                rsi_extreme_overbought: 80.0,
                macd_fast: 12,
                macd_slow: 26,
                macd_signal: 9,
                bollinger_period: 20,
                bollinger_std_dev: 2.0,
                stoch_k_period: 14,
                stoch_d_period: 3,
                stoch_oversold: 20.0,
                stoch_overbought: 80.0,
                adx_period: 14,
                atr_period: 14,
                large_move_pct: 3.0,
                gap_pct: 1.5,
            },
            risk: RiskConfig {
                stop_atr_swing,
                stop_atr_day,
                stop_atr_scalp,
                stop_min_atr_multiple: 0.5,
                stop_max_atr_multiple: 4.0,
                min_rr_ratio,
                preferred_rr_ratio,
                volatility_low,
                volatility_high,
                adx_trending,
                adx_no_trend,
                position_risk_pct,
                signal_conflict_pct,
                swing_lookback: 20,
                option_min_expected_move,
                call_delta_min: 0.55,
                call_delta_max: 0.70,
                put_delta_min: -0.70,
                put_delta_max: -0.55,
                option_swing_min_dte: 30,
                option_swing_max_dte: 45,
                option_spread_width_atr: 2.0,
            },
            momentum: MomentumConfig {
                top_k: 10,
                weight_strong: 2.0,
                weight_moderate: 1.0,
            },
            signals: SignalConfig {
                max_signals_returned,
                max_trade_plans,
                category_bonuses: default_category_bonuses(),
            },
        }
    }

    /// Apply parsed overrides, producing a new config. Each override routes
    /// to its nested sub-record, which is replaced wholesale. The base is
    /// never mutated.
    pub fn with_overrides(&self, overrides: &[Override]) -> UserConfig {
        let mut indicators = self.indicators.clone();
        let mut risk = self.risk.clone();
        let mut momentum = self.momentum.clone();
        let mut signals = self.signals.clone();

        for ov in overrides {
            match ov {
                Override::Indicator(o) => o.apply(&mut indicators),
                Override::Risk(o) => o.apply(&mut risk),
                Override::Momentum(o) => o.apply(&mut momentum),
                Override::Signal(o) => o.apply(&mut signals),
            }
        }

        UserConfig {
            profile: self.profile,
            indicators,
            risk,
            momentum,
            signals,
        }
    }
}

/// Resolve an effective config from a profile name and a flat override map.
///
/// Unknown profile, unknown override keys, and out-of-range values are all
/// validation errors; override errors report **every** offending key, not
/// just the first.
pub fn resolve(
    profile_name: Option<&str>,
    overrides: Option<&BTreeMap<String, serde_json::Value>>,
) -> AnalysisResult<UserConfig> {
    let profile = match profile_name {
        Some(name) => RiskProfile::parse(name)?,
        None => RiskProfile::default(),
    };
    let base = UserConfig::preset(profile);
    match overrides {
        None => Ok(base),
        Some(map) if map.is_empty() => Ok(base),
        Some(map) => {
            let parsed = parse_overrides(map)?;
            Ok(base.with_overrides(&parsed))
        }
    }
}
