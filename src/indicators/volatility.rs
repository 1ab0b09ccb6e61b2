//! Volatility estimators: Bollinger bands, ATR, realized volatility.

use statrs::statistics::Statistics;

use super::{overlap, Column};
use crate::data::Bar;

const TRADING_DAYS_PER_YEAR: f64 = 252.0;

pub struct BollingerColumns {
    pub middle: Column,
    pub upper: Column,
    pub lower: Column,
    pub width: Column,
}

/// Bollinger bands: SMA ± `std_dev` population sigmas over `period`, plus
/// band width as a percent of the middle band.
pub fn bollinger(data: &[f64], period: usize, std_dev: f64) -> BollingerColumns {
    let n = data.len();
    let middle = overlap::sma(data, period);
    let mut upper: Column = vec![None; n];
    let mut lower: Column = vec![None; n];
    let mut width: Column = vec![None; n];

    if period == 0 || n < period {
        return BollingerColumns {
            middle,
            upper,
            lower,
            width,
        };
    }

    for i in (period - 1)..n {
        let window = &data[i + 1 - period..=i];
        let sigma = window.iter().population_std_dev();
        let mid = middle[i].expect("sma defined from period - 1");
        let up = mid + std_dev * sigma;
        let lo = mid - std_dev * sigma;
        upper[i] = Some(up);
        lower[i] = Some(lo);
        if mid != 0.0 {
            width[i] = Some((up - lo) / mid * 100.0);
        }
    }

    BollingerColumns {
        middle,
        upper,
        lower,
        width,
    }
}

/// Wilder-smoothed average true range. Defined for positions `>= period - 1`.
pub fn atr(bars: &[Bar], period: usize) -> Column {
    let n = bars.len();
    let mut out: Column = vec![None; n];
    if period == 0 || n < period {
        return out;
    }

    let mut true_ranges = Vec::with_capacity(n);
    true_ranges.push(bars[0].high - bars[0].low);
    for i in 1..n {
        let prev_close = bars[i - 1].close;
        let tr = (bars[i].high - bars[i].low)
            .max((bars[i].high - prev_close).abs())
            .max((bars[i].low - prev_close).abs());
        true_ranges.push(tr);
    }

    let mut value: f64 = true_ranges[..period].iter().sum::<f64>() / period as f64;
    out[period - 1] = Some(value);
    for i in period..n {
        value = (value * (period - 1) as f64 + true_ranges[i]) / period as f64;
        out[i] = Some(value);
    }
    out
}

/// Annualized realized volatility in percent: sample sigma of log returns
/// over `window` bars, scaled by sqrt(252). Defined for positions
/// `>= window`.
pub fn realized_volatility(data: &[f64], window: usize) -> Column {
    let n = data.len();
    let mut out: Column = vec![None; n];
    if window < 2 || n < window + 1 {
        return out;
    }

    let mut log_returns = Vec::with_capacity(n - 1);
    for pair in data.windows(2) {
        if pair[0] > 0.0 && pair[1] > 0.0 {
            log_returns.push((pair[1] / pair[0]).ln());
        } else {
            log_returns.push(0.0);
        }
    }

    for i in window..n {
        let slice = &log_returns[i - window..i];
        let sigma = slice.iter().std_dev();
        out[i] = Some(sigma * TRADING_DAYS_PER_YEAR.sqrt() * 100.0);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn make_bars(rows: &[(f64, f64, f64)]) -> Vec<Bar> {
        rows.iter()
            .enumerate()
            .map(|(i, &(high, low, close))| Bar {
                timestamp: Utc.timestamp_opt(1_700_000_000 + i as i64 * 86_400, 0).unwrap(),
                open: close,
                high,
                low,
                close,
                volume: 1_000,
            })
            .collect()
    }

    #[test]
    fn bollinger_flat_series_collapses_to_middle() {
        let data = [50.0; 30];
        let bb = bollinger(&data, 20, 2.0);
        let i = 25;
        assert_eq!(bb.middle[i], Some(50.0));
        assert_eq!(bb.upper[i], Some(50.0));
        assert_eq!(bb.lower[i], Some(50.0));
        assert_eq!(bb.width[i], Some(0.0));
    }

    #[test]
    fn bollinger_ordering() {
        let data: Vec<f64> = (0..60).map(|i| 100.0 + (i as f64).sin() * 3.0).collect();
        let bb = bollinger(&data, 20, 2.0);
        for i in 0..60 {
            if let (Some(lo), Some(mid), Some(up)) = (bb.lower[i], bb.middle[i], bb.upper[i]) {
                assert!(lo <= mid && mid <= up);
            }
        }
    }

    #[test]
    fn atr_constant_range() {
        // Every bar spans exactly 2.0 with no gaps: ATR converges to 2.0
        let rows: Vec<(f64, f64, f64)> = (0..30).map(|_| (101.0, 99.0, 100.0)).collect();
        let bars = make_bars(&rows);
        let out = atr(&bars, 14);
        assert!(out[12].is_none());
        let last = out.last().unwrap().unwrap();
        assert!((last - 2.0).abs() < 1e-9);
    }

    #[test]
    fn atr_counts_gaps_in_true_range() {
        let mut rows: Vec<(f64, f64, f64)> = (0..20).map(|_| (101.0, 99.0, 100.0)).collect();
        // Gap: close 100 -> next bar trading 120..118, TR = 120 - 100 = 20
        rows.push((120.0, 118.0, 119.0));
        let bars = make_bars(&rows);
        let out = atr(&bars, 14);
        let with_gap = out.last().unwrap().unwrap();
        assert!(with_gap > 2.0);
    }

    #[test]
    fn realized_vol_zero_for_constant_prices() {
        let data = [75.0; 40];
        let out = realized_volatility(&data, 20);
        assert!(out[19].is_none());
        assert_eq!(out[20], Some(0.0));
    }

    #[test]
    fn realized_vol_positive_for_choppy_prices() {
        let data: Vec<f64> = (0..40)
            .map(|i| if i % 2 == 0 { 100.0 } else { 103.0 })
            .collect();
        let out = realized_volatility(&data, 20);
        assert!(out.last().unwrap().unwrap() > 10.0);
    }
}
