//! Stochastic oscillator signals: zone readings and K/D crosses in the zones.

use super::{last_two, Signal, SignalCategory, SignalStrength};
use crate::config::ConfigContext;
use crate::indicators::{col, IndicatorFrame};

pub fn detect(frame: &IndicatorFrame, ctx: &ConfigContext) -> Vec<Signal> {
    let mut out = Vec::new();
    let Some((prev, last)) = last_two(frame) else {
        return out;
    };
    let Some(k) = frame.at(col::STOCH_K, last) else {
        return out;
    };

    if k < ctx.stoch_oversold {
        out.push(Signal::new(
            "Stochastic Oversold",
            format!("%K at {k:.1}, below {:.0}", ctx.stoch_oversold),
            SignalStrength::Bullish,
            SignalCategory::Stochastic,
            Some(k),
        ));
    }
    if k > ctx.stoch_overbought {
        out.push(Signal::new(
            "Stochastic Overbought",
            format!("%K at {k:.1}, above {:.0}", ctx.stoch_overbought),
            SignalStrength::Bearish,
            SignalCategory::Stochastic,
            Some(k),
        ));
    }

    if let (Some(k_prev), Some(d_prev), Some(d_last)) = (
        frame.at(col::STOCH_K, prev),
        frame.at(col::STOCH_D, prev),
        frame.at(col::STOCH_D, last),
    ) {
        // Crosses only matter inside the extreme zones
        if k_prev <= d_prev && k > d_last && k < ctx.stoch_oversold {
            out.push(Signal::new(
                "Stochastic Bullish Cross",
                "%K crossed above %D inside the oversold zone",
                SignalStrength::StrongBullish,
                SignalCategory::Stochastic,
                Some(k),
            ));
        }
        if k_prev >= d_prev && k < d_last && k > ctx.stoch_overbought {
            out.push(Signal::new(
                "Stochastic Bearish Cross",
                "%K crossed below %D inside the overbought zone",
                SignalStrength::StrongBearish,
                SignalCategory::Stochastic,
                Some(k),
            ));
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{RiskProfile, UserConfig};
    use crate::data::{Bar, BarSeries, Period};
    use crate::indicators::calculate_all;
    use chrono::{TimeZone, Utc};
    use std::sync::Arc;

    fn frame_and_ctx(closes: &[f64]) -> (IndicatorFrame, ConfigContext) {
        let bars: Vec<Bar> = closes
            .iter()
            .enumerate()
            .map(|(i, &close)| Bar {
                timestamp: Utc.timestamp_opt(1_700_000_000 + i as i64 * 86_400, 0).unwrap(),
                open: close,
                high: close + 0.5,
                low: close - 0.5,
                close,
                volume: 1_000_000,
            })
            .collect();
        let series = Arc::new(BarSeries::new("TEST", Period::Year1, bars).unwrap());
        let ctx = ConfigContext::from_config(&UserConfig::preset(RiskProfile::Neutral));
        (calculate_all(series, &ctx), ctx)
    }

    #[test]
    fn rally_top_reads_overbought() {
        let closes: Vec<f64> = (0..40).map(|i| 100.0 + i as f64).collect();
        let (frame, ctx) = frame_and_ctx(&closes);
        let signals = detect(&frame, &ctx);
        assert!(signals.iter().any(|s| s.name == "Stochastic Overbought"));
    }

    #[test]
    fn selloff_bottom_reads_oversold() {
        let closes: Vec<f64> = (0..40).map(|i| 200.0 - i as f64).collect();
        let (frame, ctx) = frame_and_ctx(&closes);
        let signals = detect(&frame, &ctx);
        assert!(signals.iter().any(|s| s.name == "Stochastic Oversold"));
    }

    #[test]
    fn mid_range_is_quiet() {
        let closes: Vec<f64> = (0..40)
            .map(|i| 100.0 + ((i % 9) as f64 - 4.0))
            .collect();
        let (frame, ctx) = frame_and_ctx(&closes);
        let signals = detect(&frame, &ctx);
        assert!(signals.is_empty() || signals.iter().all(|s| s.name.contains("Cross")));
    }
}
