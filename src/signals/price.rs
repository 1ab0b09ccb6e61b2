//! Price-action signals: outsized single-bar moves and opening gaps.

use super::{last_two, Signal, SignalCategory, SignalStrength};
use crate::config::ConfigContext;
use crate::indicators::IndicatorFrame;

pub fn detect(frame: &IndicatorFrame, ctx: &ConfigContext) -> Vec<Signal> {
    let mut out = Vec::new();
    let Some((prev, last)) = last_two(frame) else {
        return out;
    };
    let bars = frame.series().bars();
    let prev_close = bars[prev].close;
    let last_bar = &bars[last];

    if prev_close > 0.0 {
        let move_pct = (last_bar.close - prev_close) / prev_close * 100.0;
        if move_pct >= ctx.large_move_pct {
            out.push(Signal::new(
                "Large Single-Bar Gain",
                format!("Up {move_pct:.1}% in one bar"),
                SignalStrength::StrongBullish,
                SignalCategory::PriceAction,
                Some(move_pct),
            ));
        }
        if move_pct <= -ctx.large_move_pct {
            out.push(Signal::new(
                "Large Single-Bar Loss",
                format!("Down {:.1}% in one bar", move_pct.abs()),
                SignalStrength::StrongBearish,
                SignalCategory::PriceAction,
                Some(move_pct),
            ));
        }

        let gap_pct = (last_bar.open - prev_close) / prev_close * 100.0;
        if gap_pct >= ctx.gap_pct {
            out.push(Signal::new(
                "Gap Up",
                format!("Opened {gap_pct:.1}% above the prior close"),
                SignalStrength::Bullish,
                SignalCategory::PriceAction,
                Some(gap_pct),
            ));
        }
        if gap_pct <= -ctx.gap_pct {
            out.push(Signal::new(
                "Gap Down",
                format!("Opened {:.1}% below the prior close", gap_pct.abs()),
                SignalStrength::Bearish,
                SignalCategory::PriceAction,
                Some(gap_pct),
            ));
        }
    }

    out
}
