//! Named signal detection over an indicator frame.
//!
//! Each category module inspects only the columns it needs and emits
//! [`Signal`]s for conditions present on the latest bar. Detection is
//! deterministic and idempotent over a fixed frame; [`detect_all`] runs the
//! categories in declared order so the output ordering is stable.

pub mod ma;
pub mod macd;
pub mod momentum;
pub mod price;
pub mod stochastic;
pub mod trend;
pub mod volatility;
pub mod volume;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::config::ConfigContext;
use crate::indicators::IndicatorFrame;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SignalStrength {
    StrongBullish,
    Bullish,
    Notable,
    Neutral,
    Bearish,
    StrongBearish,
    Significant,
}

impl SignalStrength {
    /// Directional sign for bias aggregation: +1 bullish, -1 bearish,
    /// 0 for non-directional strengths.
    pub fn direction(self) -> i32 {
        match self {
            SignalStrength::StrongBullish | SignalStrength::Bullish => 1,
            SignalStrength::StrongBearish | SignalStrength::Bearish => -1,
            SignalStrength::Notable | SignalStrength::Neutral | SignalStrength::Significant => 0,
        }
    }

    pub fn is_strong(self) -> bool {
        matches!(
            self,
            SignalStrength::StrongBullish | SignalStrength::StrongBearish
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SignalCategory {
    MaCross,
    MaTrend,
    Rsi,
    Macd,
    Bollinger,
    Stochastic,
    Volume,
    Trend,
    Adx,
    PriceAction,
}

impl SignalCategory {
    /// Declared detection order; also the key used for category bonuses.
    pub const ALL: [SignalCategory; 10] = [
        SignalCategory::MaCross,
        SignalCategory::MaTrend,
        SignalCategory::Rsi,
        SignalCategory::Macd,
        SignalCategory::Bollinger,
        SignalCategory::Stochastic,
        SignalCategory::Volume,
        SignalCategory::Trend,
        SignalCategory::Adx,
        SignalCategory::PriceAction,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            SignalCategory::MaCross => "MA_CROSS",
            SignalCategory::MaTrend => "MA_TREND",
            SignalCategory::Rsi => "RSI",
            SignalCategory::Macd => "MACD",
            SignalCategory::Bollinger => "BOLLINGER",
            SignalCategory::Stochastic => "STOCHASTIC",
            SignalCategory::Volume => "VOLUME",
            SignalCategory::Trend => "TREND",
            SignalCategory::Adx => "ADX",
            SignalCategory::PriceAction => "PRICE_ACTION",
        }
    }
}

/// A detected condition. `value` is the triggering reading (e.g. the RSI
/// level); `score` and `rationale` are filled by the ranker, everything
/// else is immutable once constructed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Signal {
    pub name: String,
    pub description: String,
    pub strength: SignalStrength,
    pub category: SignalCategory,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rationale: Option<String>,
}

impl Signal {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        strength: SignalStrength,
        category: SignalCategory,
        value: Option<f64>,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            strength,
            category,
            value,
            score: None,
            rationale: None,
        }
    }
}

/// Run every detector category against the frame and concatenate the
/// results in category order.
pub fn detect_all(frame: &IndicatorFrame, ctx: &ConfigContext) -> Vec<Signal> {
    let mut signals = Vec::new();
    signals.extend(ma::detect(frame));
    signals.extend(momentum::detect(frame, ctx));
    signals.extend(macd::detect(frame));
    signals.extend(volatility::detect(frame));
    signals.extend(stochastic::detect(frame, ctx));
    signals.extend(volume::detect(frame));
    signals.extend(trend::detect(frame, ctx));
    signals.extend(price::detect(frame, ctx));

    // Detectors emit per-module; normalize to the declared category order
    signals.sort_by_key(|s| {
        SignalCategory::ALL
            .iter()
            .position(|c| *c == s.category)
            .unwrap_or(usize::MAX)
    });
    signals
}

/// Index of the last bar plus the one before it, when the frame is long
/// enough to compare "now" against "previous".
pub(crate) fn last_two(frame: &IndicatorFrame) -> Option<(usize, usize)> {
    let len = frame.len();
    if len < 2 {
        None
    } else {
        Some((len - 2, len - 1))
    }
}
