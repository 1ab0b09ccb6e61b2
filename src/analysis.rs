//! The per-symbol analysis core.
//!
//! Strictly sequential pipeline: fetch -> indicator frame -> signal
//! detection -> ranking -> risk qualification. The only suspension points
//! are the bar fetch and the optional remote ranker call. Results are
//! memoized in a short-TTL cache keyed on
//! `(symbol, period, profile, override fingerprint)`.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use moka::future::Cache;
use serde::{Deserialize, Serialize};

use crate::config::{self, ConfigContext, RiskProfile, UserConfig};
use crate::data::cache::FetchCache;
use crate::data::Period;
use crate::error::AnalysisResult;
use crate::indicators::{calculate_all, col};
use crate::rank::fallback::FallbackRanker;
use crate::rank::remote::RemoteRanker;
use crate::rank::rules::RuleBasedRanker;
use crate::rank::{AiAssessment, RankContext, Ranker};
use crate::risk::{qualify, RiskAssessment, Timeframe};
use crate::signals::{detect_all, Signal};

const ANALYSIS_TTL_SECS: u64 = 180;
const ANALYSIS_CAPACITY: u64 = 100;

/// One analysis request. Constructed per call; the resolved config lives and
/// dies with it.
#[derive(Debug, Clone, Default)]
pub struct AnalysisRequest {
    pub symbol: String,
    pub period: Option<String>,
    pub risk_profile: Option<String>,
    pub config_overrides: Option<BTreeMap<String, serde_json::Value>>,
    pub use_ai: bool,
    pub timeframe_hint: Option<Timeframe>,
}

/// Complete per-symbol output: snapshot, ranked signals, risk assessment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub symbol: String,
    pub period: Period,
    pub timestamp: DateTime<Utc>,
    pub price: f64,
    pub change_pct: f64,
    pub indicators: BTreeMap<String, f64>,
    pub signals: Vec<Signal>,
    pub total_signals_detected: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ai: Option<AiAssessment>,
    pub ai_powered: bool,
    pub assessment: RiskAssessment,
    pub config_applied: UserConfig,
}

type AnalysisKey = (String, Period, RiskProfile, String);

/// Process-scoped engine: owns the fetch cache, the analysis cache, and the
/// optional remote ranker. Injected into every operation; no globals.
pub struct AnalysisEngine {
    fetch_cache: Arc<FetchCache>,
    remote_ranker: Option<Arc<RemoteRanker>>,
    analysis_cache: Cache<AnalysisKey, Arc<AnalysisReport>>,
}

impl AnalysisEngine {
    pub fn new(fetch_cache: Arc<FetchCache>, remote_ranker: Option<Arc<RemoteRanker>>) -> Self {
        Self {
            fetch_cache,
            remote_ranker,
            analysis_cache: Cache::builder()
                .max_capacity(ANALYSIS_CAPACITY)
                .time_to_live(Duration::from_secs(ANALYSIS_TTL_SECS))
                .build(),
        }
    }

    pub fn fetch_cache(&self) -> &Arc<FetchCache> {
        &self.fetch_cache
    }

    /// Run the full per-symbol pipeline, possibly from cache.
    pub async fn analyze(&self, request: &AnalysisRequest) -> AnalysisResult<Arc<AnalysisReport>> {
        let cfg = config::resolve(
            request.risk_profile.as_deref(),
            request.config_overrides.as_ref(),
        )?;
        let period = match request.period.as_deref() {
            Some(p) => Period::parse(p)?,
            None => Period::Year1,
        };
        let fingerprint = request
            .config_overrides
            .as_ref()
            .map_or_else(|| "default".to_string(), config::fingerprint);

        let key: AnalysisKey = (
            request.symbol.to_uppercase(),
            period,
            cfg.profile,
            format!("{fingerprint}:{}", request.use_ai),
        );
        if let Some(report) = self.analysis_cache.get(&key).await {
            tracing::debug!(symbol = %key.0, "analysis cache hit");
            return Ok(report);
        }

        let report = Arc::new(self.run_pipeline(request, period, &cfg).await?);
        self.analysis_cache.insert(key, report.clone()).await;
        Ok(report)
    }

    async fn run_pipeline(
        &self,
        request: &AnalysisRequest,
        period: Period,
        cfg: &UserConfig,
    ) -> AnalysisResult<AnalysisReport> {
        let ctx = ConfigContext::from_config(cfg);
        let series = self.fetch_cache.fetch(&request.symbol, period).await?;

        let frame = calculate_all(series.clone(), &ctx);
        let detected = detect_all(&frame, &ctx);
        let total_signals_detected = detected.len();

        let price = series.last_close();
        let change_pct = frame.latest(col::CHANGE_1D_PCT).unwrap_or(0.0);
        let rank_context = RankContext {
            symbol: series.symbol.clone(),
            price,
            change_pct,
            indicators: frame.snapshot(),
        };

        let rules = RuleBasedRanker::new(cfg.signals.category_bonuses.clone());
        let ranker = if request.use_ai {
            FallbackRanker::new(self.remote_ranker.clone(), rules)
        } else {
            FallbackRanker::rule_based_only(rules)
        };
        let outcome = ranker.rank(&rank_context, detected).await?;

        // Hard truncation to the configured ceiling
        let mut ranked = outcome.signals;
        ranked.truncate(ctx.max_signals_returned);

        let assessment = qualify(&frame, &ranked, &ctx, request.timeframe_hint);

        Ok(AnalysisReport {
            symbol: series.symbol.clone(),
            period,
            timestamp: series.last_bar().timestamp,
            price,
            change_pct,
            indicators: frame.snapshot(),
            signals: ranked,
            total_signals_detected,
            ai_powered: outcome.ai.is_some(),
            ai: outcome.ai,
            assessment,
            config_applied: cfg.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{Bar, BarProvider};
    use crate::error::AnalysisError;
    use chrono::TimeZone;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Deterministic provider: an orderly uptrend with a mid-series dip so
    /// the risk layer has confirmed structure to work with.
    pub(crate) struct TrendProvider {
        pub calls: AtomicUsize,
    }

    impl TrendProvider {
        pub fn new() -> Self {
            Self {
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait::async_trait]
    impl BarProvider for TrendProvider {
        async fn fetch_bars(&self, symbol: &str, _period: Period) -> AnalysisResult<Vec<Bar>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if symbol.starts_with("BAD") {
                return Err(AnalysisError::InvalidSymbol(symbol.to_string()));
            }
            let mut price = 100.0;
            let mut bars = Vec::new();
            for i in 0..240 {
                let drift = if (200..=204).contains(&i) { -0.8 } else { 0.45 };
                price += drift;
                bars.push(Bar {
                    timestamp: Utc.timestamp_opt(1_650_000_000 + i * 86_400, 0).unwrap(),
                    open: price - 0.1,
                    high: price + 0.9,
                    low: price - 0.9,
                    close: price,
                    volume: 1_000_000,
                });
            }
            Ok(bars)
        }
    }

    fn engine() -> (AnalysisEngine, Arc<TrendProvider>) {
        let provider = Arc::new(TrendProvider::new());
        let fetch_cache = Arc::new(FetchCache::new(provider.clone()));
        (AnalysisEngine::new(fetch_cache, None), provider)
    }

    fn request(symbol: &str) -> AnalysisRequest {
        AnalysisRequest {
            symbol: symbol.to_string(),
            ..AnalysisRequest::default()
        }
    }

    #[tokio::test]
    async fn analyze_produces_scored_signals_and_assessment() {
        let (engine, _) = engine();
        let report = engine.analyze(&request("SPY")).await.unwrap();
        assert_eq!(report.symbol, "SPY");
        assert!(!report.signals.is_empty());
        assert!(report.signals.iter().all(|s| s.score.is_some()));
        assert!(!report.ai_powered);
        assert!(report.indicators.contains_key("rsi_14"));
        // rule-based scores are sorted descending
        let scores: Vec<f64> = report.signals.iter().map(|s| s.score.unwrap()).collect();
        let mut sorted = scores.clone();
        sorted.sort_by(|a, b| b.partial_cmp(a).unwrap());
        assert_eq!(scores, sorted);
    }

    #[tokio::test]
    async fn analyze_is_memoized_per_config() {
        let (engine, provider) = engine();
        engine.analyze(&request("SPY")).await.unwrap();
        engine.analyze(&request("SPY")).await.unwrap();
        assert_eq!(provider.calls.load(Ordering::SeqCst), 1);

        // A different profile is a different analysis key (same fetch key)
        let mut other = request("SPY");
        other.risk_profile = Some("risky".to_string());
        engine.analyze(&other).await.unwrap();
        assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn invalid_period_rejected_before_fetch() {
        let (engine, provider) = engine();
        let mut bad = request("SPY");
        bad.period = Some("3w".to_string());
        let err = engine.analyze(&bad).await.unwrap_err();
        assert_eq!(err.code(), "INVALID_PERIOD");
        assert_eq!(provider.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn invalid_override_rejected_before_fetch() {
        let (engine, provider) = engine();
        let mut bad = request("SPY");
        bad.config_overrides = Some(BTreeMap::from([(
            "not_a_field".to_string(),
            serde_json::json!(1),
        )]));
        let err = engine.analyze(&bad).await.unwrap_err();
        assert_eq!(err.code(), "INVALID_OVERRIDE");
        assert_eq!(provider.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn invalid_symbol_propagates() {
        let (engine, _) = engine();
        let err = engine.analyze(&request("BADTICKER")).await.unwrap_err();
        assert_eq!(err.code(), "INVALID_SYMBOL");
    }

    #[tokio::test]
    async fn profile_changes_flow_into_plan_limits() {
        let (engine, _) = engine();

        let mut averse = request("SPY");
        averse.risk_profile = Some("averse".to_string());
        let averse_report = engine.analyze(&averse).await.unwrap();

        let mut risky = request("SPY");
        risky.risk_profile = Some("risky".to_string());
        let risky_report = engine.analyze(&risky).await.unwrap();

        assert_eq!(averse_report.config_applied.risk.min_rr_ratio, 2.0);
        assert_eq!(risky_report.config_applied.risk.min_rr_ratio, 1.2);
        assert!(averse_report.assessment.outcome.plans().len() <= 2);
        assert!(risky_report.assessment.outcome.plans().len() <= 5);
    }

    #[tokio::test]
    async fn signal_truncation_is_hard() {
        let (engine, _) = engine();
        let mut tight = request("SPY");
        tight.config_overrides = Some(BTreeMap::from([(
            "max_signals_returned".to_string(),
            serde_json::json!(2),
        )]));
        let report = engine.analyze(&tight).await.unwrap();
        assert!(report.signals.len() <= 2);
        assert!(report.total_signals_detected >= report.signals.len());
    }
}
