//! ADX trend signals: strong directional trends and trendless tape.

use super::{Signal, SignalCategory, SignalStrength};
use crate::config::ConfigContext;
use crate::indicators::{col, IndicatorFrame};

pub fn detect(frame: &IndicatorFrame, ctx: &ConfigContext) -> Vec<Signal> {
    let mut out = Vec::new();
    if frame.is_empty() {
        return out;
    }
    let last = frame.len() - 1;
    let Some(adx) = frame.at(col::ADX, last) else {
        return out;
    };
    let close = frame.series().last_close();
    let sma_50 = frame.at(&col::sma(50), last);

    if adx > ctx.adx_trending {
        if let Some(sma_50) = sma_50 {
            if close > sma_50 {
                out.push(Signal::new(
                    "Strong Uptrend",
                    format!("ADX {adx:.1} above {:.0} with price over the 50 SMA", ctx.adx_trending),
                    SignalStrength::StrongBullish,
                    SignalCategory::Trend,
                    Some(adx),
                ));
            } else {
                out.push(Signal::new(
                    "Strong Downtrend",
                    format!("ADX {adx:.1} above {:.0} with price under the 50 SMA", ctx.adx_trending),
                    SignalStrength::StrongBearish,
                    SignalCategory::Trend,
                    Some(adx),
                ));
            }
        }
    } else if adx < ctx.adx_no_trend {
        out.push(Signal::new(
            "No Trend",
            format!("ADX {adx:.1} below {:.0}; directionless tape", ctx.adx_no_trend),
            SignalStrength::Neutral,
            SignalCategory::Adx,
            Some(adx),
        ));
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

    fn frame_and_ctx(closes: &[f64], spread: f64) -> (IndicatorFrame, ConfigContext) {
        let bars: Vec<Bar> = closes
            .iter()
            .enumerate()
            .map(|(i, &close)| Bar {
                timestamp: Utc.timestamp_opt(1_700_000_000 + i as i64 * 86_400, 0).unwrap(),
                open: close,
                high: close + spread,
                low: close - spread,
                close,
                volume: 1_000_000,
            })
            .collect();
        let series = Arc::new(BarSeries::new("TEST", Period::Year1, bars).unwrap());
        let ctx = ConfigContext::from_config(&UserConfig::preset(RiskProfile::Neutral));
        (calculate_all(series, &ctx), ctx)
    }

    #[test]
    fn persistent_rally_is_a_strong_uptrend() {
        let closes: Vec<f64> = (0..100).map(|i| 100.0 + i as f64 * 2.0).collect();
        let (frame, ctx) = frame_and_ctx(&closes, 1.0);
        let signals = detect(&frame, &ctx);
        assert!(signals.iter().any(|s| s.name == "Strong Uptrend"));
    }

    #[test]
    fn persistent_selloff_is_a_strong_downtrend() {
        let closes: Vec<f64> = (0..100).map(|i| 400.0 - i as f64 * 2.0).collect();
        let (frame, ctx) = frame_and_ctx(&closes, 1.0);
        let signals = detect(&frame, &ctx);
        assert!(signals.iter().any(|s| s.name == "Strong Downtrend"));
    }

    #[test]
    fn choppy_tape_reads_no_trend() {
        let closes: Vec<f64> = (0..100)
            .map(|i| 100.0 + if i % 2 == 0 { 1.0 } else { -1.0 })
            .collect();
        let (frame, ctx) = frame_and_ctx(&closes, 1.5);
        let signals = detect(&frame, &ctx);
        assert!(signals.iter().any(|s| s.name == "No Trend"));
    }
}
