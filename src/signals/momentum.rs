//! RSI signals: zone readings, 50-line crosses, zone exits.

use super::{last_two, Signal, SignalCategory, SignalStrength};
use crate::config::ConfigContext;
use crate::indicators::{col, IndicatorFrame};

pub fn detect(frame: &IndicatorFrame, ctx: &ConfigContext) -> Vec<Signal> {
    let mut out = Vec::new();
    let Some((prev, last)) = last_two(frame) else {
        return out;
    };
    let Some(rsi) = frame.at(col::RSI, last) else {
        return out;
    };

    if rsi < ctx.rsi_extreme_oversold {
        out.push(Signal::new(
            "RSI Extreme Oversold",
            format!("RSI at {rsi:.1}, below the extreme floor {:.0}", ctx.rsi_extreme_oversold),
            SignalStrength::StrongBullish,
            SignalCategory::Rsi,
            Some(rsi),
        ));
    } else if rsi < ctx.rsi_oversold {
        out.push(Signal::new(
            "RSI Oversold",
            format!("RSI at {rsi:.1}, below {:.0}", ctx.rsi_oversold),
            SignalStrength::Bullish,
            SignalCategory::Rsi,
            Some(rsi),
        ));
    }

    if rsi > ctx.rsi_extreme_overbought {
        out.push(Signal::new(
            "RSI Extreme Overbought",
            format!("RSI at {rsi:.1}, above the extreme ceiling {:.0}", ctx.rsi_extreme_overbought),
            SignalStrength::StrongBearish,
            SignalCategory::Rsi,
            Some(rsi),
        ));
    } else if rsi > ctx.rsi_overbought {
        out.push(Signal::new(
            "RSI Overbought",
            format!("RSI at {rsi:.1}, above {:.0}", ctx.rsi_overbought),
            SignalStrength::Bearish,
            SignalCategory::Rsi,
            Some(rsi),
        ));
    }

    if let Some(rsi_prev) = frame.at(col::RSI, prev) {
        if rsi_prev <= 50.0 && rsi > 50.0 {
            out.push(Signal::new(
                "RSI Crossed Above 50",
                "Momentum flipped to the bullish half of the range",
                SignalStrength::Bullish,
                SignalCategory::Rsi,
                Some(rsi),
            ));
        }
        if rsi_prev >= 50.0 && rsi < 50.0 {
            out.push(Signal::new(
                "RSI Crossed Below 50",
                "Momentum flipped to the bearish half of the range",
                SignalStrength::Bearish,
                SignalCategory::Rsi,
                Some(rsi),
            ));
        }

        // Exit from an extreme zone often precedes mean reversion follow-through
        if rsi_prev < ctx.rsi_oversold && rsi >= ctx.rsi_oversold {
            out.push(Signal::new(
                "RSI Exit From Oversold",
                format!("RSI recovered above {:.0}", ctx.rsi_oversold),
                SignalStrength::Bullish,
                SignalCategory::Rsi,
                Some(rsi),
            ));
        }
        if rsi_prev > ctx.rsi_overbought && rsi <= ctx.rsi_overbought {
            out.push(Signal::new(
                "RSI Exit From Overbought",
                format!("RSI rolled back under {:.0}", ctx.rsi_overbought),
                SignalStrength::Bearish,
                SignalCategory::Rsi,
                Some(rsi),
            ));
        }
    }

    out
}
