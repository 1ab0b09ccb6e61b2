//! Deterministic rule-based scoring: strength keyword base plus category
//! bonus from config.

use std::collections::BTreeMap;

use super::{sort_by_score, RankContext, RankOutcome, Ranker};
use crate::error::AnalysisResult;
use crate::signals::{Signal, SignalStrength};

pub struct RuleBasedRanker {
    category_bonuses: BTreeMap<String, f64>,
}

impl RuleBasedRanker {
    pub fn new(category_bonuses: BTreeMap<String, f64>) -> Self {
        Self { category_bonuses }
    }

    fn base_score(strength: SignalStrength) -> f64 {
        match strength {
            SignalStrength::StrongBullish | SignalStrength::StrongBearish => 75.0,
            SignalStrength::Bullish
            | SignalStrength::Bearish
            | SignalStrength::Significant => 55.0,
            SignalStrength::Notable => 40.0,
            SignalStrength::Neutral => 25.0,
        }
    }

    fn score(&self, signal: &Signal) -> f64 {
        let bonus = self
            .category_bonuses
            .get(signal.category.as_str())
            .copied()
            .unwrap_or(0.0);
        (Self::base_score(signal.strength) + bonus).clamp(0.0, 100.0)
    }

    /// Synchronous scoring path, shared with the fallback wrapper.
    pub fn score_all(&self, mut signals: Vec<Signal>) -> Vec<Signal> {
        for signal in &mut signals {
            signal.score = Some(self.score(signal));
            signal.rationale = Some(format!(
                "{} signal from the {} detector: {}",
                strength_label(signal.strength),
                signal.category.as_str(),
                signal.description
            ));
        }
        sort_by_score(&mut signals);
        signals
    }
}

fn strength_label(strength: SignalStrength) -> &'static str {
    match strength {
        SignalStrength::StrongBullish => "Strong bullish",
        SignalStrength::Bullish => "Bullish",
        SignalStrength::Notable => "Notable",
        SignalStrength::Neutral => "Neutral",
        SignalStrength::Bearish => "Bearish",
        SignalStrength::StrongBearish => "Strong bearish",
        SignalStrength::Significant => "Significant",
    }
}

#[async_trait::async_trait]
impl Ranker for RuleBasedRanker {
    async fn rank(
        &self,
        _context: &RankContext,
        signals: Vec<Signal>,
    ) -> AnalysisResult<RankOutcome> {
        Ok(RankOutcome {
            signals: self.score_all(signals),
            ai: None,
        })
    }
}
