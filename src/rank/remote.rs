//! Remote LLM ranker client.
//!
//! Batches the detected signal set with the indicator snapshot to an
//! external scoring service. Concurrency is bounded by a semaphore and
//! calls are spaced by a minimum inter-call delay. Any failure here is
//! recovered by the fallback wrapper; this client never decides the fate
//! of an analysis on its own.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, Semaphore};
use tokio::time::{sleep, Instant};

use super::{sort_by_score, AiAssessment, RankContext, RankOutcome, Ranker};
use crate::error::{AnalysisError, AnalysisResult};
use crate::signals::Signal;

const DEFAULT_TIMEOUT_SECS: u64 = 20;
const DEFAULT_CONCURRENCY: usize = 2;
const DEFAULT_MIN_INTERVAL_MS: u64 = 200;

pub struct RemoteRankerConfig {
    pub endpoint: String,
    pub api_key: Option<String>,
    pub timeout: Duration,
    pub concurrency: usize,
    pub min_interval: Duration,
}

impl RemoteRankerConfig {
    /// Build from environment; `None` when no endpoint is configured.
    /// `RANKER_ENDPOINT` enables the remote path; `RANKER_API_KEY`,
    /// `RANKER_CONCURRENCY`, and `RANKER_MIN_INTERVAL_MS` tune it.
    pub fn from_env() -> Option<Self> {
        let endpoint = std::env::var("RANKER_ENDPOINT").ok()?;
        let concurrency = std::env::var("RANKER_CONCURRENCY")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_CONCURRENCY);
        let min_interval_ms = std::env::var("RANKER_MIN_INTERVAL_MS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_MIN_INTERVAL_MS);
        Some(Self {
            endpoint,
            api_key: std::env::var("RANKER_API_KEY").ok(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            concurrency,
            min_interval: Duration::from_millis(min_interval_ms),
        })
    }
}

pub struct RemoteRanker {
    client: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
    semaphore: Semaphore,
    min_interval: Duration,
    last_call: Mutex<Option<Instant>>,
}

#[derive(Serialize)]
struct RankRequest<'a> {
    symbol: &'a str,
    price: f64,
    change_pct: f64,
    indicators: &'a std::collections::BTreeMap<String, f64>,
    signals: Vec<RequestSignal<'a>>,
}

#[derive(Serialize)]
struct RequestSignal<'a> {
    name: &'a str,
    strength: crate::signals::SignalStrength,
    category: crate::signals::SignalCategory,
    #[serde(skip_serializing_if = "Option::is_none")]
    value: Option<f64>,
}

#[derive(Deserialize)]
struct RankResponse {
    score: f64,
    outlook: super::Outlook,
    action: super::Action,
    confidence: super::Confidence,
    summary: String,
}

impl RemoteRanker {
    pub fn new(config: RemoteRankerConfig) -> AnalysisResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| AnalysisError::Ranker(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            endpoint: config.endpoint,
            api_key: config.api_key,
            semaphore: Semaphore::new(config.concurrency.max(1)),
            min_interval: config.min_interval,
            last_call: Mutex::new(None),
        })
    }

    async fn throttle(&self) {
        let mut last = self.last_call.lock().await;
        if let Some(prev) = *last {
            let elapsed = prev.elapsed();
            if elapsed < self.min_interval {
                sleep(self.min_interval - elapsed).await;
            }
        }
        *last = Some(Instant::now());
    }

    async fn call(&self, context: &RankContext, signals: &[Signal]) -> AnalysisResult<RankResponse> {
        let _permit = self
            .semaphore
            .acquire()
            .await
            .map_err(|_| AnalysisError::Ranker("ranker semaphore closed".to_string()))?;
        self.throttle().await;

        let request = RankRequest {
            symbol: &context.symbol,
            price: context.price,
            change_pct: context.change_pct,
            indicators: &context.indicators,
            signals: signals
                .iter()
                .map(|s| RequestSignal {
                    name: &s.name,
                    strength: s.strength,
                    category: s.category,
                    value: s.value,
                })
                .collect(),
        };

        let mut builder = self.client.post(&self.endpoint).json(&request);
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| AnalysisError::Ranker(format!("transport: {e}")))?;

        let status = response.status();
        if status.as_u16() == 429 {
            return Err(AnalysisError::RateLimited("ranker throttled".to_string()));
        }
        if !status.is_success() {
            return Err(AnalysisError::Ranker(format!("HTTP {status}")));
        }

        let parsed: RankResponse = response
            .json()
            .await
            .map_err(|e| AnalysisError::Ranker(format!("malformed response: {e}")))?;
        if !(1.0..=100.0).contains(&parsed.score) {
            return Err(AnalysisError::Ranker(format!(
                "score {} outside 1..100",
                parsed.score
            )));
        }
        Ok(parsed)
    }
}

#[async_trait::async_trait]
impl Ranker for RemoteRanker {
    async fn rank(
        &self,
        context: &RankContext,
        mut signals: Vec<Signal>,
    ) -> AnalysisResult<RankOutcome> {
        let response = self.call(context, &signals).await?;

        // Per-signal scores anchor the strength tier to the model's overall
        // read; the model summary becomes each signal's rationale.
        for signal in &mut signals {
            let base = match signal.strength {
                s if s.is_strong() => 0.9,
                crate::signals::SignalStrength::Notable => 0.6,
                crate::signals::SignalStrength::Neutral => 0.4,
                _ => 0.75,
            };
            signal.score = Some((response.score * base).clamp(0.0, 100.0));
            signal.rationale = Some(response.summary.clone());
        }
        sort_by_score(&mut signals);

        Ok(RankOutcome {
            signals,
            ai: Some(AiAssessment {
                score: response.score,
                outlook: response.outlook,
                action: response.action,
                confidence: response.confidence,
                summary: response.summary,
            }),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn response_parses_expected_wire_format() {
        let raw = r#"{
            "score": 72,
            "outlook": "BULLISH",
            "action": "BUY",
            "confidence": "MEDIUM",
            "summary": "Momentum building above the 50-day."
        }"#;
        let parsed: RankResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(parsed.score, 72.0);
        assert_eq!(parsed.outlook, super::super::Outlook::Bullish);
        assert_eq!(parsed.action, super::super::Action::Buy);
        assert_eq!(parsed.confidence, super::super::Confidence::Medium);
    }

    #[test]
    fn malformed_outlook_fails_parse() {
        let raw = r#"{
            "score": 72,
            "outlook": "SIDEWAYS",
            "action": "BUY",
            "confidence": "MEDIUM",
            "summary": "x"
        }"#;
        assert!(serde_json::from_str::<RankResponse>(raw).is_err());
    }
}
