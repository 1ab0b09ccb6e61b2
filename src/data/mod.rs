pub mod cache;
pub mod provider;

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::error::{AnalysisError, AnalysisResult};

/// One OHLCV bar.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
}

/// Supported fetch periods. The period tag is documentation plus
/// minimum-length checks; the analysis core behaves identically
/// regardless of bar spacing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum Period {
    #[serde(rename = "15m")]
    Min15,
    #[serde(rename = "1h")]
    Hour1,
    #[serde(rename = "4h")]
    Hour4,
    #[serde(rename = "1d")]
    Day1,
    #[serde(rename = "5d")]
    Day5,
    #[serde(rename = "1mo")]
    Month1,
    #[serde(rename = "3mo")]
    Month3,
    #[serde(rename = "6mo")]
    Month6,
    #[serde(rename = "1y")]
    Year1,
    #[serde(rename = "2y")]
    Year2,
    #[serde(rename = "5y")]
    Year5,
    #[serde(rename = "10y")]
    Year10,
    Ytd,
    Max,
}

impl Period {
    pub const ALL: [Period; 14] = [
        Period::Min15,
        Period::Hour1,
        Period::Hour4,
        Period::Day1,
        Period::Day5,
        Period::Month1,
        Period::Month3,
        Period::Month6,
        Period::Year1,
        Period::Year2,
        Period::Year5,
        Period::Year10,
        Period::Ytd,
        Period::Max,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Period::Min15 => "15m",
            Period::Hour1 => "1h",
            Period::Hour4 => "4h",
            Period::Day1 => "1d",
            Period::Day5 => "5d",
            Period::Month1 => "1mo",
            Period::Month3 => "3mo",
            Period::Month6 => "6mo",
            Period::Year1 => "1y",
            Period::Year2 => "2y",
            Period::Year5 => "5y",
            Period::Year10 => "10y",
            Period::Ytd => "ytd",
            Period::Max => "max",
        }
    }

    /// Parse a wire-format period string. An invalid period is rejected with
    /// a validation error listing every accepted value, never coerced.
    pub fn parse(s: &str) -> AnalysisResult<Period> {
        Period::ALL
            .iter()
            .copied()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| AnalysisError::InvalidPeriod {
                got: s.to_string(),
                accepted: Period::ALL
                    .iter()
                    .map(|p| p.as_str())
                    .collect::<Vec<_>>()
                    .join(", "),
            })
    }

    /// Intraday periods default the risk qualifier to the `day` timeframe.
    pub fn is_intraday(self) -> bool {
        matches!(self, Period::Min15 | Period::Hour1 | Period::Hour4)
    }
}

/// An ordered bar sequence for one symbol. Timestamps are strictly
/// increasing; gaps are permitted.
#[derive(Debug, Clone)]
pub struct BarSeries {
    pub symbol: String,
    pub period: Period,
    bars: Vec<Bar>,
}

impl BarSeries {
    /// Build a series, enforcing strictly increasing timestamps.
    pub fn new(symbol: impl Into<String>, period: Period, bars: Vec<Bar>) -> AnalysisResult<Self> {
        let symbol = symbol.into();
        if bars.len() < 2 {
            return Err(AnalysisError::InsufficientData(format!(
                "{symbol}: need at least 2 bars, got {}",
                bars.len()
            )));
        }
        for pair in bars.windows(2) {
            if pair[1].timestamp <= pair[0].timestamp {
                return Err(AnalysisError::Calculation(format!(
                    "{symbol}: bar timestamps not strictly increasing at {}",
                    pair[1].timestamp
                )));
            }
        }
        Ok(Self {
            symbol,
            period,
            bars,
        })
    }

    pub fn bars(&self) -> &[Bar] {
        &self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn closes(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.close).collect()
    }

    pub fn last_bar(&self) -> &Bar {
        // new() guarantees at least 2 bars
        self.bars.last().expect("BarSeries is never empty")
    }

    pub fn last_close(&self) -> f64 {
        self.last_bar().close
    }
}

/// Vendor-agnostic bar source. The production implementation speaks an HTTP
/// chart endpoint; tests substitute a canned provider.
#[async_trait::async_trait]
pub trait BarProvider: Send + Sync {
    async fn fetch_bars(&self, symbol: &str, period: Period) -> AnalysisResult<Vec<Bar>>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn bar(ts: i64, close: f64) -> Bar {
        Bar {
            timestamp: Utc.timestamp_opt(ts, 0).unwrap(),
            open: close,
            high: close + 1.0,
            low: close - 1.0,
            close,
            volume: 1_000,
        }
    }

    #[test]
    fn period_parse_round_trip() {
        for p in Period::ALL {
            assert_eq!(Period::parse(p.as_str()).unwrap(), p);
        }
    }

    #[test]
    fn period_parse_rejects_and_lists_accepted() {
        let err = Period::parse("7m").unwrap_err();
        assert_eq!(err.code(), "INVALID_PERIOD");
        let msg = err.to_string();
        assert!(msg.contains("15m"));
        assert!(msg.contains("max"));
        assert!(msg.contains("ytd"));
    }

    #[test]
    fn intraday_classification() {
        assert!(Period::Min15.is_intraday());
        assert!(Period::Hour4.is_intraday());
        assert!(!Period::Day1.is_intraday());
        assert!(!Period::Ytd.is_intraday());
    }

    #[test]
    fn series_rejects_non_monotonic_timestamps() {
        let bars = vec![bar(100, 1.0), bar(100, 2.0)];
        assert!(BarSeries::new("SPY", Period::Day1, bars).is_err());

        let bars = vec![bar(200, 1.0), bar(100, 2.0)];
        assert!(BarSeries::new("SPY", Period::Day1, bars).is_err());
    }

    #[test]
    fn series_rejects_too_short() {
        let err = BarSeries::new("SPY", Period::Day1, vec![bar(1, 1.0)]).unwrap_err();
        assert_eq!(err.code(), "INSUFFICIENT_DATA");
    }

    #[test]
    fn series_accepts_gaps() {
        let bars = vec![bar(100, 1.0), bar(200, 2.0), bar(5_000, 3.0)];
        let series = BarSeries::new("SPY", Period::Day1, bars).unwrap();
        assert_eq!(series.len(), 3);
        assert_eq!(series.last_close(), 3.0);
    }
}
