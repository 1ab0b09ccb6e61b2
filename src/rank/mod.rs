//! Signal ranking.
//!
//! Two interchangeable strategies sit behind the [`Ranker`] trait: a
//! deterministic rule-based scorer that is always available, and a remote
//! LLM ranker. [`fallback::FallbackRanker`] composes them so that ranking
//! can never fail an analysis.

pub mod fallback;
pub mod remote;
pub mod rules;

use std::collections::BTreeMap;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::error::AnalysisResult;
use crate::signals::Signal;

/// Compact per-symbol context shipped to the ranker alongside the signals.
#[derive(Debug, Clone, Serialize)]
pub struct RankContext {
    pub symbol: String,
    pub price: f64,
    pub change_pct: f64,
    pub indicators: BTreeMap<String, f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Outlook {
    Bullish,
    Neutral,
    Bearish,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Action {
    Buy,
    Sell,
    Hold,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Confidence {
    High,
    Medium,
    Low,
}

/// Overall assessment produced by the remote ranker.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct AiAssessment {
    pub score: f64,
    pub outlook: Outlook,
    pub action: Action,
    pub confidence: Confidence,
    pub summary: String,
}

/// Ranked signals plus the optional overall AI assessment.
#[derive(Debug, Clone)]
pub struct RankOutcome {
    pub signals: Vec<Signal>,
    pub ai: Option<AiAssessment>,
}

impl RankOutcome {
    pub fn ai_powered(&self) -> bool {
        self.ai.is_some()
    }
}

/// Assign `score` and `rationale` to each signal and return them sorted by
/// score descending, ties broken by original index.
#[async_trait::async_trait]
pub trait Ranker: Send + Sync {
    async fn rank(&self, context: &RankContext, signals: Vec<Signal>)
        -> AnalysisResult<RankOutcome>;
}

/// Stable sort by score descending. Rust's sort is stable, so equal scores
/// keep their original relative order.
pub(crate) fn sort_by_score(signals: &mut [Signal]) {
    signals.sort_by(|a, b| {
        b.score
            .unwrap_or(0.0)
            .partial_cmp(&a.score.unwrap_or(0.0))
            .unwrap_or(std::cmp::Ordering::Equal)
    });
}
