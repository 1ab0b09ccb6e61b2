//! Indicator engine.
//!
//! [`calculate_all`] derives every indicator column from a [`BarSeries`] into
//! an immutable [`IndicatorFrame`]. Columns are aligned with the input bars:
//! a column whose lookback is `N` is `None` for positions `< N - 1` and
//! defined everywhere after. Warmup positions are never zero-filled. A
//! column whose lookback exceeds the series length is simply absent from the
//! frame: per-indicator degradation, not an analysis failure.

pub mod momentum;
pub mod overlap;
pub mod trend;
pub mod volatility;
pub mod volume;

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::config::ConfigContext;
use crate::data::BarSeries;

/// Canonical column names. Exactly one name per indicator, used everywhere.
pub mod col {
    pub const RSI: &str = "rsi_14";
    pub const MACD_LINE: &str = "macd_line";
    pub const MACD_SIGNAL: &str = "macd_signal";
    pub const MACD_HISTOGRAM: &str = "macd_histogram";
    pub const BB_MIDDLE: &str = "bb_middle";
    pub const BB_UPPER: &str = "bb_upper";
    pub const BB_LOWER: &str = "bb_lower";
    pub const BB_WIDTH: &str = "bb_width";
    pub const STOCH_K: &str = "stoch_k";
    pub const STOCH_D: &str = "stoch_d";
    pub const ADX: &str = "adx_14";
    pub const PLUS_DI: &str = "plus_di";
    pub const MINUS_DI: &str = "minus_di";
    pub const ATR: &str = "atr_14";
    pub const VOLUME_SMA_20: &str = "volume_sma_20";
    pub const VOLUME_SMA_50: &str = "volume_sma_50";
    pub const OBV: &str = "obv";
    pub const CHANGE_1D_PCT: &str = "change_1d_pct";
    pub const CHANGE_5D_PCT: &str = "change_5d_pct";
    pub const REALIZED_VOL: &str = "realized_vol";

    pub fn sma(period: usize) -> String {
        format!("sma_{period}")
    }

    pub fn ema(period: usize) -> String {
        format!("ema_{period}")
    }
}

/// Moving-average period set computed for every frame.
pub const MA_PERIODS: [usize; 6] = [5, 10, 20, 50, 100, 200];

/// Aligned derived column: same length as the input series, `None` where the
/// indicator is not yet defined.
pub type Column = Vec<Option<f64>>;

/// A bar series plus its aligned derived columns. Immutable once built.
#[derive(Debug, Clone)]
pub struct IndicatorFrame {
    series: Arc<BarSeries>,
    columns: BTreeMap<String, Column>,
}

impl IndicatorFrame {
    pub fn series(&self) -> &BarSeries {
        &self.series
    }

    pub fn len(&self) -> usize {
        self.series.len()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }

    /// A whole column, if this frame computed it.
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.get(name)
    }

    /// Value of `name` at position `i`, if defined there.
    pub fn at(&self, name: &str, i: usize) -> Option<f64> {
        self.columns.get(name)?.get(i).copied().flatten()
    }

    /// Latest value of `name`, if defined on the final bar.
    pub fn latest(&self, name: &str) -> Option<f64> {
        self.at(name, self.len().saturating_sub(1))
    }

    /// Latest defined value per column: the indicator snapshot shipped in
    /// analyze responses and ranker requests.
    pub fn snapshot(&self) -> BTreeMap<String, f64> {
        let last = self.len().saturating_sub(1);
        self.columns
            .iter()
            .filter_map(|(name, column)| {
                column
                    .get(last)
                    .copied()
                    .flatten()
                    .map(|v| (name.clone(), v))
            })
            .collect()
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.keys().map(String::as_str)
    }
}

fn insert_if_defined(columns: &mut BTreeMap<String, Column>, name: String, column: Column) {
    // All-None columns (lookback longer than the series) stay out of the frame
    if column.iter().any(Option::is_some) {
        columns.insert(name, column);
    }
}

/// Compute every indicator column for a series. Deterministic and
/// side-effect-free; thresholds and lookbacks come from the config context.
pub fn calculate_all(series: Arc<BarSeries>, ctx: &ConfigContext) -> IndicatorFrame {
    let bars = series.bars();
    let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
    let volumes: Vec<f64> = bars.iter().map(|b| b.volume as f64).collect();

    let mut columns = BTreeMap::new();

    for period in MA_PERIODS {
        insert_if_defined(&mut columns, col::sma(period), overlap::sma(&closes, period));
        insert_if_defined(&mut columns, col::ema(period), overlap::ema(&closes, period));
    }

    insert_if_defined(
        &mut columns,
        col::RSI.to_string(),
        momentum::rsi(&closes, ctx.rsi_period),
    );

    let macd = momentum::macd(&closes, ctx.macd_fast, ctx.macd_slow, ctx.macd_signal);
    insert_if_defined(&mut columns, col::MACD_LINE.to_string(), macd.line);
    insert_if_defined(&mut columns, col::MACD_SIGNAL.to_string(), macd.signal);
    insert_if_defined(&mut columns, col::MACD_HISTOGRAM.to_string(), macd.histogram);

    let bb = volatility::bollinger(&closes, ctx.bollinger_period, ctx.bollinger_std_dev);
    insert_if_defined(&mut columns, col::BB_MIDDLE.to_string(), bb.middle);
    insert_if_defined(&mut columns, col::BB_UPPER.to_string(), bb.upper);
    insert_if_defined(&mut columns, col::BB_LOWER.to_string(), bb.lower);
    insert_if_defined(&mut columns, col::BB_WIDTH.to_string(), bb.width);

    let stoch = momentum::stochastic(bars, ctx.stoch_k_period, ctx.stoch_d_period);
    insert_if_defined(&mut columns, col::STOCH_K.to_string(), stoch.k);
    insert_if_defined(&mut columns, col::STOCH_D.to_string(), stoch.d);

    let adx = trend::adx(bars, ctx.adx_period);
    insert_if_defined(&mut columns, col::ADX.to_string(), adx.adx);
    insert_if_defined(&mut columns, col::PLUS_DI.to_string(), adx.plus_di);
    insert_if_defined(&mut columns, col::MINUS_DI.to_string(), adx.minus_di);

    insert_if_defined(
        &mut columns,
        col::ATR.to_string(),
        volatility::atr(bars, ctx.atr_period),
    );

    insert_if_defined(
        &mut columns,
        col::VOLUME_SMA_20.to_string(),
        overlap::sma(&volumes, 20),
    );
    insert_if_defined(
        &mut columns,
        col::VOLUME_SMA_50.to_string(),
        overlap::sma(&volumes, 50),
    );
    insert_if_defined(&mut columns, col::OBV.to_string(), volume::obv(bars));

    insert_if_defined(
        &mut columns,
        col::CHANGE_1D_PCT.to_string(),
        momentum::percent_change(&closes, 1),
    );
    insert_if_defined(
        &mut columns,
        col::CHANGE_5D_PCT.to_string(),
        momentum::percent_change(&closes, 5),
    );
    insert_if_defined(
        &mut columns,
        col::REALIZED_VOL.to_string(),
        volatility::realized_volatility(&closes, 20),
    );

    IndicatorFrame { series, columns }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{RiskProfile, UserConfig};
    use crate::data::{Bar, Period};
    use chrono::{TimeZone, Utc};

    fn make_series(closes: &[f64]) -> Arc<BarSeries> {
        let bars: Vec<Bar> = closes
            .iter()
            .enumerate()
            .map(|(i, &close)| Bar {
                timestamp: Utc.timestamp_opt(1_700_000_000 + i as i64 * 86_400, 0).unwrap(),
                open: close * 0.995,
                high: close * 1.01,
                low: close * 0.99,
                close,
                volume: 1_000_000,
            })
            .collect();
        Arc::new(BarSeries::new("TEST", Period::Year1, bars).unwrap())
    }

    fn ctx() -> ConfigContext {
        ConfigContext::from_config(&UserConfig::preset(RiskProfile::Neutral))
    }

    fn rising_series(n: usize) -> Arc<BarSeries> {
        let mut closes = Vec::with_capacity(n);
        let mut price = 100.0;
        for _ in 0..n {
            closes.push(price);
            price *= 1.01;
        }
        make_series(&closes)
    }

    #[test]
    fn warmup_positions_are_none() {
        let frame = calculate_all(rising_series(60), &ctx());
        let sma_20 = frame.column("sma_20").unwrap();
        for i in 0..19 {
            assert!(sma_20[i].is_none(), "sma_20[{i}] should be warmup");
        }
        for (i, v) in sma_20.iter().enumerate().skip(19) {
            assert!(v.is_some(), "sma_20[{i}] should be defined");
        }
    }

    #[test]
    fn long_lookback_columns_absent_on_short_series() {
        let frame = calculate_all(rising_series(60), &ctx());
        assert!(frame.column("sma_200").is_none());
        assert!(frame.column("sma_50").is_some());
    }

    #[test]
    fn rsi_stays_bounded_on_monotonic_rise() {
        // 100 bars stepping +1% each: RSI near 100, never NaN
        let frame = calculate_all(rising_series(100), &ctx());
        let rsi = frame.column(col::RSI).unwrap();
        for v in rsi.iter().flatten() {
            assert!(v.is_finite());
            assert!((0.0..=100.0).contains(v));
        }
        let last = frame.latest(col::RSI).unwrap();
        assert!(last > 95.0, "expected RSI near 100, got {last}");
    }

    #[test]
    fn bollinger_band_ordering_holds() {
        let closes: Vec<f64> = (0..80)
            .map(|i| 100.0 + (i as f64 * 0.7).sin() * 5.0)
            .collect();
        let frame = calculate_all(make_series(&closes), &ctx());
        for i in 0..frame.len() {
            if let (Some(lower), Some(middle), Some(upper)) = (
                frame.at(col::BB_LOWER, i),
                frame.at(col::BB_MIDDLE, i),
                frame.at(col::BB_UPPER, i),
            ) {
                assert!(lower <= middle && middle <= upper, "ordering broken at {i}");
            }
        }
    }

    #[test]
    fn snapshot_contains_latest_defined_values() {
        let frame = calculate_all(rising_series(250), &ctx());
        let snapshot = frame.snapshot();
        assert!(snapshot.contains_key("sma_200"));
        assert!(snapshot.contains_key(col::RSI));
        assert!(snapshot.contains_key(col::ATR));
        assert!(snapshot.contains_key(col::REALIZED_VOL));
        assert!(snapshot.values().all(|v| v.is_finite()));
    }

    #[test]
    fn columns_are_series_length() {
        let frame = calculate_all(rising_series(120), &ctx());
        for name in frame.column_names().map(str::to_string).collect::<Vec<_>>() {
            assert_eq!(frame.column(&name).unwrap().len(), 120, "{name} misaligned");
        }
    }
}
