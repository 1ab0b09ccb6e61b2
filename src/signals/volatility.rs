//! Bollinger band signals: band touches and squeeze.

use super::{Signal, SignalCategory, SignalStrength};
use crate::indicators::{col, IndicatorFrame};

/// Fraction of the band-width history that defines a squeeze: the current
/// width must sit in the lowest decile.
const SQUEEZE_PERCENTILE: f64 = 0.10;
const SQUEEZE_MIN_HISTORY: usize = 60;

pub fn detect(frame: &IndicatorFrame) -> Vec<Signal> {
    let mut out = Vec::new();
    if frame.is_empty() {
        return out;
    }
    let last = frame.len() - 1;
    let close = frame.series().last_close();

    if let (Some(lower), Some(upper)) =
        (frame.at(col::BB_LOWER, last), frame.at(col::BB_UPPER, last))
    {
        if close <= lower {
            out.push(Signal::new(
                "Price At Lower Bollinger Band",
                "Close at or below the lower band",
                SignalStrength::Bullish,
                SignalCategory::Bollinger,
                Some(close),
            ));
        }
        if close >= upper {
            out.push(Signal::new(
                "Price At Upper Bollinger Band",
                "Close at or above the upper band",
                SignalStrength::Bearish,
                SignalCategory::Bollinger,
                Some(close),
            ));
        }
    }

    if let Some(width_col) = frame.column(col::BB_WIDTH) {
        let history: Vec<f64> = width_col.iter().copied().flatten().collect();
        if history.len() >= SQUEEZE_MIN_HISTORY {
            if let Some(current) = frame.at(col::BB_WIDTH, last) {
                let below = history.iter().filter(|w| **w < current).count();
                if (below as f64) / (history.len() as f64) <= SQUEEZE_PERCENTILE {
                    out.push(Signal::new(
                        "Bollinger Squeeze",
                        "Band width in the lowest decile of its history",
                        SignalStrength::Significant,
                        SignalCategory::Bollinger,
                        Some(current),
                    ));
                }
            }
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ConfigContext, RiskProfile, UserConfig};
    use crate::data::{Bar, BarSeries, Period};
    use crate::indicators::calculate_all;
    use chrono::{TimeZone, Utc};
    use std::sync::Arc;

    fn frame_from_closes(closes: &[f64]) -> IndicatorFrame {
        let bars: Vec<Bar> = closes
            .iter()
            .enumerate()
            .map(|(i, &close)| Bar {
                timestamp: Utc.timestamp_opt(1_700_000_000 + i as i64 * 86_400, 0).unwrap(),
                open: close,
                high: close + 0.3,
                low: close - 0.3,
                close,
                volume: 1_000_000,
            })
            .collect();
        let series = Arc::new(BarSeries::new("TEST", Period::Year1, bars).unwrap());
        let ctx = ConfigContext::from_config(&UserConfig::preset(RiskProfile::Neutral));
        calculate_all(series, &ctx)
    }

    #[test]
    fn sharp_drop_touches_lower_band() {
        let mut closes: Vec<f64> = (0..40)
            .map(|i| 100.0 + ((i % 5) as f64 - 2.0) * 0.5)
            .collect();
        closes.push(88.0);
        let signals = detect(&frame_from_closes(&closes));
        assert!(signals
            .iter()
            .any(|s| s.name == "Price At Lower Bollinger Band"));
    }

    #[test]
    fn sharp_spike_touches_upper_band() {
        let mut closes: Vec<f64> = (0..40)
            .map(|i| 100.0 + ((i % 5) as f64 - 2.0) * 0.5)
            .collect();
        closes.push(112.0);
        let signals = detect(&frame_from_closes(&closes));
        assert!(signals
            .iter()
            .any(|s| s.name == "Price At Upper Bollinger Band"));
    }

    #[test]
    fn contraction_after_wide_history_is_a_squeeze() {
        // 80 volatile bars, then 40 nearly-flat bars: current width lands in
        // the lowest decile of the whole width history
        let mut closes: Vec<f64> = (0..80)
            .map(|i| 100.0 + ((i % 7) as f64 - 3.0) * 3.0)
            .collect();
        for i in 0..40 {
            closes.push(100.0 + ((i % 3) as f64 - 1.0) * 0.05);
        }
        let signals = detect(&frame_from_closes(&closes));
        assert!(signals.iter().any(|s| s.name == "Bollinger Squeeze"));
    }

    #[test]
    fn mid_band_close_emits_no_touch() {
        let closes: Vec<f64> = (0..50)
            .map(|i| 100.0 + ((i % 5) as f64 - 2.0) * 0.5)
            .collect();
        let signals = detect(&frame_from_closes(&closes));
        assert!(signals.iter().all(|s| !s.name.contains("Band")));
    }
}
