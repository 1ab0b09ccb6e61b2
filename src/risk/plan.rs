//! Plan geometry: stop placement, target selection, vehicle choice, and the
//! risk-quality label.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::regime::VolatilityRegime;
use super::{Bias, SuppressionCode, SuppressionReason};
use crate::config::ConfigContext;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RiskQuality {
    High,
    Medium,
    Low,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Vehicle {
    Stock,
    OptionCall,
    OptionPut,
    OptionSpread,
}

/// Option parameters attached when the vehicle is an option.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct VehicleParams {
    pub dte_min: u32,
    pub dte_max: u32,
    pub delta_min: f64,
    pub delta_max: f64,
    pub spread_width: f64,
}

/// Stop clamped against the invalidation level, expressed in ATR multiples.
///
/// For a bullish plan the raw stop sits `atr * multiple` under the entry and
/// is lifted to the invalidation level when that level is nearer; mirrored
/// for bearish. The final stop distance must land inside the configured ATR
/// multiple bounds.
pub fn compute_stop(
    bias: Bias,
    entry: f64,
    invalidation: f64,
    atr: f64,
    stop_multiple: f64,
    ctx: &ConfigContext,
) -> Result<f64, SuppressionReason> {
    let stop = match bias {
        Bias::Bullish => (entry - atr * stop_multiple).max(invalidation),
        Bias::Bearish => (entry + atr * stop_multiple).min(invalidation),
        Bias::Neutral => {
            return Err(SuppressionReason::plain(
                SuppressionCode::NoClearInvalidation,
                "no directional bias to anchor a stop",
            ))
        }
    };

    let distance_multiple = (entry - stop).abs() / atr;
    if distance_multiple > ctx.stop_max_atr_multiple {
        return Err(SuppressionReason::with_values(
            SuppressionCode::StopTooWide,
            format!(
                "stop distance {distance_multiple:.2} ATR exceeds the {:.2} ATR cap",
                ctx.stop_max_atr_multiple
            ),
            ctx.stop_max_atr_multiple,
            distance_multiple,
        ));
    }
    if distance_multiple < ctx.stop_min_atr_multiple {
        return Err(SuppressionReason::with_values(
            SuppressionCode::StopTooTight,
            format!(
                "stop distance {distance_multiple:.2} ATR under the {:.2} ATR floor",
                ctx.stop_min_atr_multiple
            ),
            ctx.stop_min_atr_multiple,
            distance_multiple,
        ));
    }
    Ok(stop)
}

/// Target on the bias side: the nearest confirmed structural level beyond
/// the entry when one exists, otherwise the preferred R:R projection of the
/// stop distance.
pub fn compute_target(
    bias: Bias,
    entry: f64,
    stop: f64,
    structural: Option<f64>,
    ctx: &ConfigContext,
) -> f64 {
    let risk = (entry - stop).abs();
    match bias {
        Bias::Bullish => structural.unwrap_or(entry + ctx.preferred_rr_ratio * risk),
        Bias::Bearish => structural.unwrap_or(entry - ctx.preferred_rr_ratio * risk),
        Bias::Neutral => entry,
    }
}

/// Risk-to-reward ratio of the geometry.
pub fn rr_ratio(entry: f64, stop: f64, target: f64) -> f64 {
    let risk = (entry - stop).abs();
    if risk == 0.0 {
        return 0.0;
    }
    (target - entry).abs() / risk
}

/// Stock by default; options only when the expected move clears the
/// configured threshold, defined-risk spreads when it doubles it.
pub fn select_vehicle(
    bias: Bias,
    expected_move_pct: f64,
    atr: f64,
    ctx: &ConfigContext,
) -> (Vehicle, Option<VehicleParams>) {
    if expected_move_pct < ctx.option_min_expected_move {
        return (Vehicle::Stock, None);
    }

    let (delta_min, delta_max) = match bias {
        Bias::Bullish => (ctx.call_delta_min, ctx.call_delta_max),
        Bias::Bearish | Bias::Neutral => (ctx.put_delta_min, ctx.put_delta_max),
    };
    let params = VehicleParams {
        dte_min: ctx.option_swing_min_dte,
        dte_max: ctx.option_swing_max_dte,
        delta_min,
        delta_max,
        spread_width: ctx.option_spread_width_atr * atr,
    };

    let vehicle = if expected_move_pct >= 2.0 * ctx.option_min_expected_move {
        Vehicle::OptionSpread
    } else {
        match bias {
            Bias::Bullish => Vehicle::OptionCall,
            Bias::Bearish | Bias::Neutral => Vehicle::OptionPut,
        }
    };
    (vehicle, Some(params))
}

/// HIGH needs preferred R:R, a medium-volatility tape, and a strong top
/// signal; MEDIUM is anything clearing the floor. The label never gates
/// emission once the hard checks pass.
pub fn quality_label(
    rr: f64,
    regime: VolatilityRegime,
    top_signal_is_strong: bool,
    ctx: &ConfigContext,
) -> RiskQuality {
    if rr >= ctx.preferred_rr_ratio
        && regime == VolatilityRegime::Medium
        && top_signal_is_strong
    {
        RiskQuality::High
    } else if rr >= ctx.min_rr_ratio {
        RiskQuality::Medium
    } else {
        RiskQuality::Low
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{RiskProfile, UserConfig};

    fn ctx() -> ConfigContext {
        ConfigContext::from_config(&UserConfig::preset(RiskProfile::Neutral))
    }

    #[test]
    fn bullish_stop_is_atr_based_when_structure_is_deeper() {
        // entry 100, ATR 2, swing multiple 2.0 -> raw stop 96; invalidation 94
        let stop = compute_stop(Bias::Bullish, 100.0, 94.0, 2.0, 2.0, &ctx()).unwrap();
        assert_eq!(stop, 96.0);
    }

    #[test]
    fn bullish_stop_lifts_to_nearer_invalidation() {
        // invalidation 97 is nearer than the 96 raw stop: stop = 97
        let stop = compute_stop(Bias::Bullish, 100.0, 97.0, 2.0, 2.0, &ctx()).unwrap();
        assert_eq!(stop, 97.0);
    }

    #[test]
    fn too_near_invalidation_is_stop_too_tight() {
        // invalidation 99.5 -> distance 0.25 ATR, under the 0.5 floor
        let err = compute_stop(Bias::Bullish, 100.0, 99.5, 2.0, 2.0, &ctx()).unwrap_err();
        assert_eq!(err.code, SuppressionCode::StopTooTight);
        assert_eq!(err.threshold, Some(0.5));
    }

    #[test]
    fn oversized_multiple_is_stop_too_wide() {
        let mut wide = ctx();
        wide.stop_max_atr_multiple = 1.0;
        let err = compute_stop(Bias::Bullish, 100.0, 90.0, 2.0, 2.0, &wide).unwrap_err();
        assert_eq!(err.code, SuppressionCode::StopTooWide);
    }

    #[test]
    fn bearish_stop_mirrors() {
        let stop = compute_stop(Bias::Bearish, 100.0, 106.0, 2.0, 2.0, &ctx()).unwrap();
        assert_eq!(stop, 104.0);
        let clamped = compute_stop(Bias::Bearish, 100.0, 103.0, 2.0, 2.0, &ctx()).unwrap();
        assert_eq!(clamped, 103.0);
    }

    #[test]
    fn target_prefers_structure() {
        let target = compute_target(Bias::Bullish, 100.0, 96.0, Some(109.0), &ctx());
        assert_eq!(target, 109.0);
    }

    #[test]
    fn target_falls_back_to_preferred_rr() {
        // neutral preset preferred_rr 2.5, risk 4 -> target 110
        let target = compute_target(Bias::Bullish, 100.0, 96.0, None, &ctx());
        assert_eq!(target, 110.0);
    }

    #[test]
    fn rr_ratio_simple() {
        assert_eq!(rr_ratio(100.0, 96.0, 108.0), 2.0);
        assert_eq!(rr_ratio(100.0, 100.0, 108.0), 0.0);
    }

    #[test]
    fn small_move_stays_in_stock() {
        let (vehicle, params) = select_vehicle(Bias::Bullish, 3.0, 2.0, &ctx());
        assert_eq!(vehicle, Vehicle::Stock);
        assert!(params.is_none());
    }

    #[test]
    fn sufficient_move_selects_call_with_params() {
        let (vehicle, params) = select_vehicle(Bias::Bullish, 6.0, 2.0, &ctx());
        assert_eq!(vehicle, Vehicle::OptionCall);
        let params = params.unwrap();
        assert_eq!(params.dte_min, 30);
        assert_eq!(params.dte_max, 45);
        assert_eq!(params.delta_min, 0.55);
        assert_eq!(params.delta_max, 0.70);
        assert_eq!(params.spread_width, 4.0);
    }

    #[test]
    fn bearish_move_selects_put() {
        let (vehicle, params) = select_vehicle(Bias::Bearish, 6.0, 2.0, &ctx());
        assert_eq!(vehicle, Vehicle::OptionPut);
        assert_eq!(params.unwrap().delta_max, -0.55);
    }

    #[test]
    fn outsized_move_selects_spread() {
        let (vehicle, _) = select_vehicle(Bias::Bullish, 12.0, 2.0, &ctx());
        assert_eq!(vehicle, Vehicle::OptionSpread);
    }

    #[test]
    fn quality_tiers() {
        let ctx = ctx();
        assert_eq!(
            quality_label(3.0, VolatilityRegime::Medium, true, &ctx),
            RiskQuality::High
        );
        assert_eq!(
            quality_label(3.0, VolatilityRegime::Medium, false, &ctx),
            RiskQuality::Medium
        );
        assert_eq!(
            quality_label(3.0, VolatilityRegime::High, true, &ctx),
            RiskQuality::Medium
        );
        assert_eq!(
            quality_label(1.0, VolatilityRegime::Medium, true, &ctx),
            RiskQuality::Low
        );
    }
}
