//! Moving-average signals: crosses and stack alignment.

use super::{last_two, Signal, SignalCategory, SignalStrength};
use crate::indicators::{col, IndicatorFrame};

pub fn detect(frame: &IndicatorFrame) -> Vec<Signal> {
    let mut out = Vec::new();
    let Some((prev, last)) = last_two(frame) else {
        return out;
    };
    let closes = frame.series().closes();

    // Golden / death cross: 50 SMA vs 200 SMA
    if let (Some(fast_prev), Some(fast_last), Some(slow_prev), Some(slow_last)) = (
        frame.at(&col::sma(50), prev),
        frame.at(&col::sma(50), last),
        frame.at(&col::sma(200), prev),
        frame.at(&col::sma(200), last),
    ) {
        if fast_prev <= slow_prev && fast_last > slow_last {
            out.push(Signal::new(
                "Golden Cross",
                "50-day SMA crossed above the 200-day SMA",
                SignalStrength::StrongBullish,
                SignalCategory::MaCross,
                Some(fast_last),
            ));
        }
        if fast_prev >= slow_prev && fast_last < slow_last {
            out.push(Signal::new(
                "Death Cross",
                "50-day SMA crossed below the 200-day SMA",
                SignalStrength::StrongBearish,
                SignalCategory::MaCross,
                Some(fast_last),
            ));
        }
    }

    // Price crossing the 20 SMA
    if let (Some(sma_prev), Some(sma_last)) = (
        frame.at(&col::sma(20), prev),
        frame.at(&col::sma(20), last),
    ) {
        let close_prev = closes[prev];
        let close_last = closes[last];
        if close_prev <= sma_prev && close_last > sma_last {
            out.push(Signal::new(
                "Price Crossed Above 20 SMA",
                "Close reclaimed the 20-day SMA",
                SignalStrength::Bullish,
                SignalCategory::MaCross,
                Some(close_last),
            ));
        }
        if close_prev >= sma_prev && close_last < sma_last {
            out.push(Signal::new(
                "Price Crossed Below 20 SMA",
                "Close lost the 20-day SMA",
                SignalStrength::Bearish,
                SignalCategory::MaCross,
                Some(close_last),
            ));
        }
    }

    // Stack alignment: 10 / 20 / 50
    if let (Some(sma_10), Some(sma_20), Some(sma_50)) = (
        frame.at(&col::sma(10), last),
        frame.at(&col::sma(20), last),
        frame.at(&col::sma(50), last),
    ) {
        if sma_10 > sma_20 && sma_20 > sma_50 {
            out.push(Signal::new(
                "Bullish MA Alignment",
                "10 > 20 > 50 SMA stack",
                SignalStrength::Bullish,
                SignalCategory::MaTrend,
                Some(sma_10),
            ));
        }
        if sma_10 < sma_20 && sma_20 < sma_50 {
            out.push(Signal::new(
                "Bearish MA Alignment",
                "10 < 20 < 50 SMA stack",
                SignalStrength::Bearish,
                SignalCategory::MaTrend,
                Some(sma_10),
            ));
        }
    }

    out
}
