//! MACD signals: signal-line crosses, zero-line crosses, histogram slope.

use super::{last_two, Signal, SignalCategory, SignalStrength};
use crate::indicators::{col, IndicatorFrame};

pub fn detect(frame: &IndicatorFrame) -> Vec<Signal> {
    let mut out = Vec::new();
    let Some((prev, last)) = last_two(frame) else {
        return out;
    };

    if let (Some(line_prev), Some(line_last), Some(sig_prev), Some(sig_last)) = (
        frame.at(col::MACD_LINE, prev),
        frame.at(col::MACD_LINE, last),
        frame.at(col::MACD_SIGNAL, prev),
        frame.at(col::MACD_SIGNAL, last),
    ) {
        if line_prev <= sig_prev && line_last > sig_last {
            out.push(Signal::new(
                "MACD Bullish Cross",
                "MACD line crossed above its signal line",
                SignalStrength::Bullish,
                SignalCategory::Macd,
                Some(line_last),
            ));
        }
        if line_prev >= sig_prev && line_last < sig_last {
            out.push(Signal::new(
                "MACD Bearish Cross",
                "MACD line crossed below its signal line",
                SignalStrength::Bearish,
                SignalCategory::Macd,
                Some(line_last),
            ));
        }

        if line_prev <= 0.0 && line_last > 0.0 {
            out.push(Signal::new(
                "MACD Zero Cross Up",
                "MACD line turned positive",
                SignalStrength::Bullish,
                SignalCategory::Macd,
                Some(line_last),
            ));
        }
        if line_prev >= 0.0 && line_last < 0.0 {
            out.push(Signal::new(
                "MACD Zero Cross Down",
                "MACD line turned negative",
                SignalStrength::Bearish,
                SignalCategory::Macd,
                Some(line_last),
            ));
        }
    }

    // Histogram slope flip: momentum inflection ahead of a full cross
    if frame.len() >= 3 {
        let before = frame.len() - 3;
        if let (Some(h0), Some(h1), Some(h2)) = (
            frame.at(col::MACD_HISTOGRAM, before),
            frame.at(col::MACD_HISTOGRAM, prev),
            frame.at(col::MACD_HISTOGRAM, last),
        ) {
            if h1 < h0 && h2 > h1 {
                out.push(Signal::new(
                    "MACD Histogram Turn Up",
                    "Histogram contraction reversed to expansion",
                    SignalStrength::Notable,
                    SignalCategory::Macd,
                    Some(h2),
                ));
            }
            if h1 > h0 && h2 < h1 {
                out.push(Signal::new(
                    "MACD Histogram Turn Down",
                    "Histogram expansion reversed to contraction",
                    SignalStrength::Notable,
                    SignalCategory::Macd,
                    Some(h2),
                ));
            }
        }
    }

    out
}
