//! Volume flow: on-balance volume.

use super::Column;
use crate::data::Bar;

/// On-balance volume: cumulative signed volume, seeded at zero.
/// Defined from the first bar.
pub fn obv(bars: &[Bar]) -> Column {
    let mut out: Column = vec![None; bars.len()];
    if bars.is_empty() {
        return out;
    }
    let mut running = 0.0_f64;
    out[0] = Some(running);
    for i in 1..bars.len() {
        if bars[i].close > bars[i - 1].close {
            running += bars[i].volume as f64;
        } else if bars[i].close < bars[i - 1].close {
            running -= bars[i].volume as f64;
        }
        out[i] = Some(running);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn bars_with(closes: &[f64], volume: u64) -> Vec<Bar> {
        closes
            .iter()
            .enumerate()
            .map(|(i, &close)| Bar {
                timestamp: Utc.timestamp_opt(1_700_000_000 + i as i64 * 86_400, 0).unwrap(),
                open: close,
                high: close + 1.0,
                low: close - 1.0,
                close,
                volume,
            })
            .collect()
    }

    #[test]
    fn obv_accumulates_signed_volume() {
        let bars = bars_with(&[10.0, 11.0, 11.0, 10.0, 12.0], 100);
        let out = obv(&bars);
        assert_eq!(out[0], Some(0.0));
        assert_eq!(out[1], Some(100.0)); // up
        assert_eq!(out[2], Some(100.0)); // flat
        assert_eq!(out[3], Some(0.0)); // down
        assert_eq!(out[4], Some(100.0)); // up
    }

    #[test]
    fn obv_rises_with_steady_uptrend() {
        let closes: Vec<f64> = (0..10).map(|i| 100.0 + i as f64).collect();
        let out = obv(&bars_with(&closes, 50));
        assert_eq!(out.last().unwrap().unwrap(), 450.0);
    }
}
