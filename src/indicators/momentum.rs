//! Momentum oscillators: RSI, MACD, stochastic, percent change.

use super::{overlap, Column};
use crate::data::Bar;

/// Guard against a zero average loss (monotonically rising input): the RS
/// denominator gets a small epsilon instead of producing NaN.
const RSI_EPSILON: f64 = 1e-10;

/// Wilder-smoothed RSI. Needs `period + 1` bars; defined for positions
/// `>= period`. Always within [0, 100] when defined.
pub fn rsi(data: &[f64], period: usize) -> Column {
    let mut out = vec![None; data.len()];
    if period == 0 || data.len() < period + 1 {
        return out;
    }

    let mut gains = Vec::with_capacity(data.len() - 1);
    let mut losses = Vec::with_capacity(data.len() - 1);
    for pair in data.windows(2) {
        let change = pair[1] - pair[0];
        gains.push(change.max(0.0));
        losses.push((-change).max(0.0));
    }

    let mut avg_gain: f64 = gains[..period].iter().sum::<f64>() / period as f64;
    let mut avg_loss: f64 = losses[..period].iter().sum::<f64>() / period as f64;
    out[period] = Some(rsi_value(avg_gain, avg_loss));

    for i in period..gains.len() {
        avg_gain = (avg_gain * (period - 1) as f64 + gains[i]) / period as f64;
        avg_loss = (avg_loss * (period - 1) as f64 + losses[i]) / period as f64;
        out[i + 1] = Some(rsi_value(avg_gain, avg_loss));
    }
    out
}

fn rsi_value(avg_gain: f64, avg_loss: f64) -> f64 {
    let rs = avg_gain / (avg_loss + RSI_EPSILON);
    (100.0 - 100.0 / (1.0 + rs)).clamp(0.0, 100.0)
}

pub struct MacdColumns {
    pub line: Column,
    pub signal: Column,
    pub histogram: Column,
}

/// MACD line, signal line, and histogram. The line is defined once the slow
/// EMA is; the signal and histogram need a further `signal_period - 1` bars.
pub fn macd(data: &[f64], fast: usize, slow: usize, signal_period: usize) -> MacdColumns {
    let n = data.len();
    let mut line: Column = vec![None; n];
    let mut signal: Column = vec![None; n];
    let mut histogram: Column = vec![None; n];

    if fast == 0 || slow == 0 || signal_period == 0 || fast >= slow || n < slow {
        return MacdColumns {
            line,
            signal,
            histogram,
        };
    }

    let ema_fast = overlap::ema(data, fast);
    let ema_slow = overlap::ema(data, slow);
    for i in 0..n {
        if let (Some(f), Some(s)) = (ema_fast[i], ema_slow[i]) {
            line[i] = Some(f - s);
        }
    }

    // Signal EMA runs over the defined stretch of the MACD line
    let first_defined = slow - 1;
    let line_values: Vec<f64> = line[first_defined..].iter().map(|v| v.unwrap()).collect();
    let signal_values = overlap::ema(&line_values, signal_period);
    for (offset, v) in signal_values.iter().enumerate() {
        if let Some(sig) = v {
            let i = first_defined + offset;
            signal[i] = Some(*sig);
            histogram[i] = Some(line[i].unwrap() - sig);
        }
    }

    MacdColumns {
        line,
        signal,
        histogram,
    }
}

pub struct StochasticColumns {
    pub k: Column,
    pub d: Column,
}

/// Stochastic oscillator. %K over `k_period` highs/lows, %D a `d_period`
/// SMA of %K.
pub fn stochastic(bars: &[Bar], k_period: usize, d_period: usize) -> StochasticColumns {
    let n = bars.len();
    let mut k: Column = vec![None; n];
    if k_period == 0 || d_period == 0 || n < k_period {
        return StochasticColumns {
            k,
            d: vec![None; n],
        };
    }

    for i in (k_period - 1)..n {
        let window = &bars[i + 1 - k_period..=i];
        let highest = window.iter().map(|b| b.high).fold(f64::MIN, f64::max);
        let lowest = window.iter().map(|b| b.low).fold(f64::MAX, f64::min);
        let range = highest - lowest;
        // Flat window: no directional information, park %K mid-scale
        let value = if range <= 0.0 {
            50.0
        } else {
            ((bars[i].close - lowest) / range * 100.0).clamp(0.0, 100.0)
        };
        k[i] = Some(value);
    }

    let mut d: Column = vec![None; n];
    let first = k_period - 1;
    let k_values: Vec<f64> = k[first..].iter().map(|v| v.unwrap()).collect();
    for (offset, v) in overlap::sma(&k_values, d_period).iter().enumerate() {
        if let Some(avg) = v {
            d[first + offset] = Some(*avg);
        }
    }

    StochasticColumns { k, d }
}

/// Percent change vs `lag` bars ago. Defined for positions `>= lag`.
pub fn percent_change(data: &[f64], lag: usize) -> Column {
    let mut out = vec![None; data.len()];
    if lag == 0 {
        return out;
    }
    for i in lag..data.len() {
        let base = data[i - lag];
        if base != 0.0 {
            out[i] = Some((data[i] - base) / base * 100.0);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn make_bars(closes: &[f64]) -> Vec<Bar> {
        closes
            .iter()
            .enumerate()
            .map(|(i, &close)| Bar {
                timestamp: Utc.timestamp_opt(1_700_000_000 + i as i64 * 86_400, 0).unwrap(),
                open: close,
                high: close + 1.0,
                low: close - 1.0,
                close,
                volume: 1_000,
            })
            .collect()
    }

    #[test]
    fn rsi_all_gains_is_near_100_without_nan() {
        let data: Vec<f64> = (0..40).map(|i| 100.0 + i as f64).collect();
        let out = rsi(&data, 14);
        for v in out.iter().flatten() {
            assert!(v.is_finite());
            assert!(*v <= 100.0);
        }
        assert!(out.last().unwrap().unwrap() > 99.0);
    }

    #[test]
    fn rsi_all_losses_is_near_zero() {
        let data: Vec<f64> = (0..40).map(|i| 200.0 - i as f64).collect();
        let out = rsi(&data, 14);
        assert!(out.last().unwrap().unwrap() < 1.0);
    }

    #[test]
    fn rsi_warmup_boundary() {
        let data: Vec<f64> = (0..20).map(|i| 100.0 + (i % 3) as f64).collect();
        let out = rsi(&data, 14);
        for v in &out[..14] {
            assert!(v.is_none());
        }
        assert!(out[14].is_some());
    }

    #[test]
    fn rsi_too_short_is_all_none() {
        let data = [100.0, 101.0, 102.0];
        assert!(rsi(&data, 14).iter().all(Option::is_none));
    }

    #[test]
    fn macd_alignment_and_histogram() {
        let data: Vec<f64> = (0..60).map(|i| 100.0 + (i as f64 * 0.3).sin() * 4.0).collect();
        let m = macd(&data, 12, 26, 9);
        assert_eq!(m.line.len(), 60);
        for i in 0..25 {
            assert!(m.line[i].is_none());
        }
        assert!(m.line[25].is_some());
        // signal needs 9 more defined values
        assert!(m.signal[32].is_none());
        assert!(m.signal[33].is_some());
        for i in 0..60 {
            if let (Some(line), Some(signal), Some(hist)) = (m.line[i], m.signal[i], m.histogram[i])
            {
                assert!((hist - (line - signal)).abs() < 1e-12);
            }
        }
    }

    #[test]
    fn macd_rejects_degenerate_periods() {
        let data: Vec<f64> = (0..60).map(|i| i as f64).collect();
        let m = macd(&data, 26, 12, 9);
        assert!(m.line.iter().all(Option::is_none));
    }

    #[test]
    fn stochastic_bounds_and_flat_window() {
        let closes = vec![10.0; 20];
        let bars: Vec<Bar> = closes
            .iter()
            .enumerate()
            .map(|(i, &c)| Bar {
                timestamp: Utc.timestamp_opt(1_700_000_000 + i as i64 * 86_400, 0).unwrap(),
                open: c,
                high: c,
                low: c,
                close: c,
                volume: 1,
            })
            .collect();
        let s = stochastic(&bars, 14, 3);
        assert_eq!(s.k[15], Some(50.0));
    }

    #[test]
    fn stochastic_high_close_reads_high() {
        let closes: Vec<f64> = (0..20).map(|i| 100.0 + i as f64).collect();
        let bars = make_bars(&closes);
        let s = stochastic(&bars, 14, 3);
        let k = s.k.last().unwrap().unwrap();
        assert!(k > 80.0, "close at top of range should read overbought, got {k}");
    }

    #[test]
    fn percent_change_values() {
        let data = [100.0, 110.0, 99.0];
        let out = percent_change(&data, 1);
        assert_eq!(out[0], None);
        assert!((out[1].unwrap() - 10.0).abs() < 1e-12);
        assert!((out[2].unwrap() - -10.0).abs() < 1e-12);
    }
}
