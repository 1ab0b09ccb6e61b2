//! Fallback composition: remote ranking when available, rule-based scoring
//! whenever the remote path fails for any reason.

use std::sync::Arc;

use super::remote::RemoteRanker;
use super::rules::RuleBasedRanker;
use super::{RankContext, RankOutcome, Ranker};
use crate::error::AnalysisResult;
use crate::signals::Signal;

pub struct FallbackRanker {
    remote: Option<Arc<RemoteRanker>>,
    rules: RuleBasedRanker,
}

impl FallbackRanker {
    pub fn new(remote: Option<Arc<RemoteRanker>>, rules: RuleBasedRanker) -> Self {
        Self { remote, rules }
    }

    pub fn rule_based_only(rules: RuleBasedRanker) -> Self {
        Self {
            remote: None,
            rules,
        }
    }
}

#[async_trait::async_trait]
impl Ranker for FallbackRanker {
    async fn rank(
        &self,
        context: &RankContext,
        signals: Vec<Signal>,
    ) -> AnalysisResult<RankOutcome> {
        if let Some(remote) = &self.remote {
            match remote.rank(context, signals.clone()).await {
                Ok(outcome) => return Ok(outcome),
                Err(e) => {
                    tracing::warn!(symbol = %context.symbol, error = %e,
                        "remote ranker failed, falling back to rule-based scoring");
                }
            }
        }
        Ok(RankOutcome {
            signals: self.rules.score_all(signals),
            ai: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signals::{SignalCategory, SignalStrength};
    use std::collections::BTreeMap;

    #[tokio::test]
    async fn no_remote_ranker_uses_rules() {
        let ranker = FallbackRanker::rule_based_only(RuleBasedRanker::new(BTreeMap::new()));
        let context = RankContext {
            symbol: "SPY".to_string(),
            price: 500.0,
            change_pct: 0.5,
            indicators: BTreeMap::new(),
        };
        let signals = vec![Signal::new(
            "Golden Cross",
            "x",
            SignalStrength::StrongBullish,
            SignalCategory::MaCross,
            None,
        )];
        let outcome = ranker.rank(&context, signals).await.unwrap();
        assert!(!outcome.ai_powered());
        assert_eq!(outcome.signals[0].score, Some(75.0));
    }
}
