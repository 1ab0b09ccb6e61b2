//! Volatility regime classification and timeframe selection.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::config::ConfigContext;
use crate::data::Period;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VolatilityRegime {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum Timeframe {
    Swing,
    Day,
    Scalp,
}

impl Timeframe {
    pub fn as_str(self) -> &'static str {
        match self {
            Timeframe::Swing => "swing",
            Timeframe::Day => "day",
            Timeframe::Scalp => "scalp",
        }
    }
}

/// Classify ATR as a percent of price against the configured bounds.
pub fn classify(atr_pct: f64, ctx: &ConfigContext) -> VolatilityRegime {
    if atr_pct > ctx.volatility_high {
        VolatilityRegime::High
    } else if atr_pct < ctx.volatility_low {
        VolatilityRegime::Low
    } else {
        VolatilityRegime::Medium
    }
}

/// Swing by default; `day`/`scalp` only on an explicit caller hint or when
/// the series period is intraday.
pub fn choose_timeframe(period: Period, hint: Option<Timeframe>) -> Timeframe {
    if let Some(hint) = hint {
        return hint;
    }
    if period.is_intraday() {
        Timeframe::Day
    } else {
        Timeframe::Swing
    }
}

/// The stop ATR multiple the chosen timeframe selects.
pub fn stop_multiple(timeframe: Timeframe, ctx: &ConfigContext) -> f64 {
    match timeframe {
        Timeframe::Swing => ctx.stop_atr_swing,
        Timeframe::Day => ctx.stop_atr_day,
        Timeframe::Scalp => ctx.stop_atr_scalp,
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
    fn regime_thresholds() {
        let ctx = ctx();
        assert_eq!(classify(0.5, &ctx), VolatilityRegime::Low);
        assert_eq!(classify(2.0, &ctx), VolatilityRegime::Medium);
        assert_eq!(classify(3.5, &ctx), VolatilityRegime::High);
    }

    #[test]
    fn boundary_values_are_medium() {
        let ctx = ctx();
        assert_eq!(classify(1.0, &ctx), VolatilityRegime::Medium);
        assert_eq!(classify(3.0, &ctx), VolatilityRegime::Medium);
    }

    #[test]
    fn timeframe_defaults() {
        assert_eq!(choose_timeframe(Period::Year1, None), Timeframe::Swing);
        assert_eq!(choose_timeframe(Period::Min15, None), Timeframe::Day);
        assert_eq!(
            choose_timeframe(Period::Year1, Some(Timeframe::Scalp)),
            Timeframe::Scalp
        );
    }

    #[test]
    fn stop_multiple_tracks_timeframe() {
        let ctx = ctx();
        assert_eq!(stop_multiple(Timeframe::Swing, &ctx), 2.0);
        assert_eq!(stop_multiple(Timeframe::Day, &ctx), 1.0);
        assert_eq!(stop_multiple(Timeframe::Scalp, &ctx), 0.5);
    }
}
