//! HTTP bar provider for historical OHLCV data.
//!
//! Speaks a Yahoo-chart-style JSON endpoint.  Key features:
//!
//! - **Retry with backoff** — transport failures and 429s are retried with
//!   exponential backoff plus jitter; a symbol the vendor does not know is
//!   surfaced immediately as `INVALID_SYMBOL` and never retried.
//! - **Vendor-agnostic core** — the analysis engine only sees the
//!   [`BarProvider`] trait; this module is one implementation of it.

use chrono::{DateTime, Utc};
use rand::Rng;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::time::Duration;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;

use super::{Bar, BarProvider, Period};
use crate::error::{AnalysisError, AnalysisResult};

const DEFAULT_BASE_URL: &str = "https://query1.finance.yahoo.com/v8/finance/chart";
const TIMEOUT_SECS: u64 = 15;
const MAX_ATTEMPTS: u32 = 3;
const BACKOFF_BASE_MS: u64 = 250;

pub struct ChartHttpProvider {
    client: Client,
    base_url: String,
    cancel: CancellationToken,
}

impl ChartHttpProvider {
    pub fn new(base_url: impl Into<String>, cancel: CancellationToken) -> AnalysisResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(TIMEOUT_SECS))
            .build()
            .map_err(|e| AnalysisError::DataFetch {
                symbol: String::new(),
                reason: format!("failed to build HTTP client: {e}"),
            })?;
        Ok(Self {
            client,
            base_url: base_url.into(),
            cancel,
        })
    }

    /// Build from environment. `CHART_BASE_URL` overrides the default
    /// endpoint (useful for proxies and tests).
    pub fn from_env(cancel: CancellationToken) -> AnalysisResult<Self> {
        let base_url =
            std::env::var("CHART_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        Self::new(base_url, cancel)
    }

    async fn fetch_once(&self, symbol: &str, period: Period) -> AnalysisResult<Vec<Bar>> {
        let interval = match period {
            Period::Min15 => "15m",
            Period::Hour1 => "1h",
            Period::Hour4 => "1h",
            _ => "1d",
        };
        let url = format!(
            "{}/{symbol}?range={}&interval={interval}",
            self.base_url,
            period.as_str()
        );

        let request = self.client.get(&url).send();
        let response = tokio::select! {
            () = self.cancel.cancelled() => return Err(AnalysisError::Cancelled),
            resp = request => resp,
        }
        .map_err(|e| AnalysisError::DataFetch {
            symbol: symbol.to_string(),
            reason: e.to_string(),
        })?;

        match response.status() {
            StatusCode::NOT_FOUND => {
                return Err(AnalysisError::InvalidSymbol(symbol.to_string()));
            }
            StatusCode::TOO_MANY_REQUESTS => {
                return Err(AnalysisError::RateLimited(format!(
                    "chart endpoint throttled request for {symbol}"
                )));
            }
            status if !status.is_success() => {
                return Err(AnalysisError::DataFetch {
                    symbol: symbol.to_string(),
                    reason: format!("HTTP {status}"),
                });
            }
            _ => {}
        }

        let body: ChartResponse =
            response
                .json()
                .await
                .map_err(|e| AnalysisError::DataFetch {
                    symbol: symbol.to_string(),
                    reason: format!("malformed chart response: {e}"),
                })?;

        parse_chart_response(symbol, body)
    }
}

#[async_trait::async_trait]
impl BarProvider for ChartHttpProvider {
    async fn fetch_bars(&self, symbol: &str, period: Period) -> AnalysisResult<Vec<Bar>> {
        let mut last_err = None;
        for attempt in 0..MAX_ATTEMPTS {
            if attempt > 0 {
                let backoff = BACKOFF_BASE_MS * 2u64.pow(attempt - 1);
                let jitter = rand::rng().random_range(0..BACKOFF_BASE_MS);
                tracing::debug!(
                    symbol,
                    attempt,
                    backoff_ms = backoff + jitter,
                    "retrying bar fetch"
                );
                tokio::select! {
                    () = self.cancel.cancelled() => return Err(AnalysisError::Cancelled),
                    () = sleep(Duration::from_millis(backoff + jitter)) => {}
                }
            }
            match self.fetch_once(symbol, period).await {
                Ok(bars) => return Ok(bars),
                Err(e) if e.is_retryable() => {
                    tracing::warn!(symbol, error = %e, "bar fetch failed, will retry");
                    last_err = Some(e);
                }
                Err(e) => return Err(e),
            }
        }
        Err(last_err.unwrap_or_else(|| AnalysisError::DataFetch {
            symbol: symbol.to_string(),
            reason: "retries exhausted".to_string(),
        }))
    }
}

// ---------------------------------------------------------------------------
// Wire format
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: ChartEnvelope,
}

#[derive(Debug, Deserialize)]
struct ChartEnvelope {
    result: Option<Vec<ChartResult>>,
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    code: String,
    description: String,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    timestamp: Option<Vec<i64>>,
    indicators: ChartIndicators,
}

#[derive(Debug, Deserialize)]
struct ChartIndicators {
    quote: Vec<ChartQuote>,
}

#[derive(Debug, Deserialize)]
struct ChartQuote {
    open: Vec<Option<f64>>,
    high: Vec<Option<f64>>,
    low: Vec<Option<f64>>,
    close: Vec<Option<f64>>,
    volume: Vec<Option<u64>>,
}

fn parse_chart_response(symbol: &str, body: ChartResponse) -> AnalysisResult<Vec<Bar>> {
    if let Some(err) = body.chart.error {
        if err.code.eq_ignore_ascii_case("not found") {
            return Err(AnalysisError::InvalidSymbol(symbol.to_string()));
        }
        return Err(AnalysisError::DataFetch {
            symbol: symbol.to_string(),
            reason: format!("{}: {}", err.code, err.description),
        });
    }

    let result = body
        .chart
        .result
        .and_then(|mut r| if r.is_empty() { None } else { Some(r.remove(0)) })
        .ok_or_else(|| AnalysisError::InvalidSymbol(symbol.to_string()))?;

    let timestamps = result.timestamp.unwrap_or_default();
    let quote = result
        .indicators
        .quote
        .into_iter()
        .next()
        .ok_or_else(|| AnalysisError::DataFetch {
            symbol: symbol.to_string(),
            reason: "chart response carried no quote block".to_string(),
        })?;

    let mut bars = Vec::with_capacity(timestamps.len());
    for (i, ts) in timestamps.iter().enumerate() {
        // Null rows are holidays/halts in the vendor feed; skip, don't zero-fill
        let (Some(open), Some(high), Some(low), Some(close)) = (
            quote.open.get(i).copied().flatten(),
            quote.high.get(i).copied().flatten(),
            quote.low.get(i).copied().flatten(),
            quote.close.get(i).copied().flatten(),
        ) else {
            continue;
        };
        let Some(timestamp) = DateTime::<Utc>::from_timestamp(*ts, 0) else {
            tracing::warn!(symbol, timestamp = ts, "skipping bar with invalid timestamp");
            continue;
        };
        bars.push(Bar {
            timestamp,
            open,
            high,
            low,
            close,
            volume: quote.volume.get(i).copied().flatten().unwrap_or(0),
        });
    }

    if bars.is_empty() {
        return Err(AnalysisError::InsufficientData(format!(
            "{symbol}: provider returned no usable bars"
        )));
    }
    Ok(bars)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quote_block(n: usize) -> ChartQuote {
        ChartQuote {
            open: (0..n).map(|i| Some(100.0 + i as f64)).collect(),
            high: (0..n).map(|i| Some(101.0 + i as f64)).collect(),
            low: (0..n).map(|i| Some(99.0 + i as f64)).collect(),
            close: (0..n).map(|i| Some(100.5 + i as f64)).collect(),
            volume: (0..n).map(|_| Some(1_000_u64)).collect(),
        }
    }

    fn response_with(n: usize) -> ChartResponse {
        ChartResponse {
            chart: ChartEnvelope {
                result: Some(vec![ChartResult {
                    timestamp: Some((0..n).map(|i| 1_700_000_000 + i as i64 * 86_400).collect()),
                    indicators: ChartIndicators {
                        quote: vec![quote_block(n)],
                    },
                }]),
                error: None,
            },
        }
    }

    #[test]
    fn parses_well_formed_response() {
        let bars = parse_chart_response("SPY", response_with(5)).unwrap();
        assert_eq!(bars.len(), 5);
        assert_eq!(bars[0].close, 100.5);
        assert_eq!(bars[4].close, 104.5);
    }

    #[test]
    fn skips_null_rows() {
        let mut body = response_with(4);
        body.chart.result.as_mut().unwrap()[0].indicators.quote[0].close[2] = None;
        let bars = parse_chart_response("SPY", body).unwrap();
        assert_eq!(bars.len(), 3);
    }

    #[test]
    fn vendor_not_found_maps_to_invalid_symbol() {
        let body = ChartResponse {
            chart: ChartEnvelope {
                result: None,
                error: Some(ChartError {
                    code: "Not Found".to_string(),
                    description: "No data found".to_string(),
                }),
            },
        };
        let err = parse_chart_response("ZZZZZT", body).unwrap_err();
        assert_eq!(err.code(), "INVALID_SYMBOL");
    }

    #[test]
    fn empty_result_set_is_invalid_symbol() {
        let body = ChartResponse {
            chart: ChartEnvelope {
                result: Some(vec![]),
                error: None,
            },
        };
        let err = parse_chart_response("ZZZZZT", body).unwrap_err();
        assert_eq!(err.code(), "INVALID_SYMBOL");
    }

    #[test]
    fn all_null_rows_is_insufficient_data() {
        let mut body = response_with(2);
        let quote = &mut body.chart.result.as_mut().unwrap()[0].indicators.quote[0];
        quote.close = vec![None, None];
        let err = parse_chart_response("SPY", body).unwrap_err();
        assert_eq!(err.code(), "INSUFFICIENT_DATA");
    }
}
