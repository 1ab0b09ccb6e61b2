use dashmap::DashMap;
use moka::future::Cache;
use std::sync::Arc;
use std::time::Duration;

use super::{BarProvider, BarSeries, Period};
use crate::error::{AnalysisError, AnalysisResult};

const DEFAULT_TTL_SECS: u64 = 300;
const DEFAULT_CAPACITY: u64 = 100;

type FetchKey = (String, Period);

/// Caching front for a [`BarProvider`].
///
/// Hits come out of a TTL+LRU cache keyed on `(symbol, period)`. Misses for
/// the same key are collapsed to a single upstream request: the first caller
/// holds a per-key lock while fetching, later callers wait on that lock and
/// then find the entry already cached.
pub struct FetchCache {
    provider: Arc<dyn BarProvider>,
    cache: Cache<FetchKey, Arc<BarSeries>>,
    inflight: DashMap<FetchKey, Arc<tokio::sync::Mutex<()>>>,
}

impl FetchCache {
    pub fn new(provider: Arc<dyn BarProvider>) -> Self {
        Self::with_limits(
            provider,
            Duration::from_secs(DEFAULT_TTL_SECS),
            DEFAULT_CAPACITY,
        )
    }

    pub fn with_limits(provider: Arc<dyn BarProvider>, ttl: Duration, capacity: u64) -> Self {
        Self {
            provider,
            cache: Cache::builder()
                .max_capacity(capacity)
                .time_to_live(ttl)
                .build(),
            inflight: DashMap::new(),
        }
    }

    /// Fetch a bar series, possibly from cache. Upper-cases the symbol so
    /// `spy` and `SPY` share an entry.
    pub async fn fetch(&self, symbol: &str, period: Period) -> AnalysisResult<Arc<BarSeries>> {
        let key = (symbol.to_uppercase(), period);

        if let Some(series) = self.cache.get(&key).await {
            tracing::debug!(symbol = %key.0, period = period.as_str(), "fetch cache hit");
            return Ok(series);
        }

        let lock = self
            .inflight
            .entry(key.clone())
            .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(())))
            .clone();
        let _guard = lock.lock().await;

        // A concurrent caller may have populated the entry while we waited
        if let Some(series) = self.cache.get(&key).await {
            return Ok(series);
        }

        let result = self.load_upstream(&key.0, period).await;
        self.inflight.remove(&key);

        let series = result?;
        self.cache.insert(key, series.clone()).await;
        Ok(series)
    }

    async fn load_upstream(&self, symbol: &str, period: Period) -> AnalysisResult<Arc<BarSeries>> {
        tracing::info!(symbol, period = period.as_str(), "fetching bars upstream");
        let bars = self.provider.fetch_bars(symbol, period).await?;
        let series = BarSeries::new(symbol, period, bars)?;
        Ok(Arc::new(series))
    }

    pub fn entry_count(&self) -> u64 {
        self.cache.entry_count()
    }

    pub async fn invalidate(&self, symbol: &str, period: Period) {
        self.cache
            .invalidate(&(symbol.to_uppercase(), period))
            .await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Bar;
    use chrono::{TimeZone, Utc};
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingProvider {
        calls: AtomicUsize,
        delay_ms: u64,
    }

    #[async_trait::async_trait]
    impl BarProvider for CountingProvider {
        async fn fetch_bars(&self, _symbol: &str, _period: Period) -> AnalysisResult<Vec<Bar>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(self.delay_ms)).await;
            Ok((0..30)
                .map(|i| Bar {
                    timestamp: Utc.timestamp_opt(1_700_000_000 + i * 86_400, 0).unwrap(),
                    open: 100.0,
                    high: 101.0,
                    low: 99.0,
                    close: 100.0 + i as f64,
                    volume: 1_000,
                })
                .collect())
        }
    }

    struct FailingProvider;

    #[async_trait::async_trait]
    impl BarProvider for FailingProvider {
        async fn fetch_bars(&self, symbol: &str, _period: Period) -> AnalysisResult<Vec<Bar>> {
            Err(AnalysisError::InvalidSymbol(symbol.to_string()))
        }
    }

    #[tokio::test]
    async fn second_fetch_is_served_from_cache() {
        let provider = Arc::new(CountingProvider {
            calls: AtomicUsize::new(0),
            delay_ms: 0,
        });
        let cache = FetchCache::new(provider.clone());

        let first = cache.fetch("SPY", Period::Year1).await.unwrap();
        let second = cache.fetch("SPY", Period::Year1).await.unwrap();
        assert_eq!(first.last_close(), second.last_close());
        assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn symbol_case_shares_entry() {
        let provider = Arc::new(CountingProvider {
            calls: AtomicUsize::new(0),
            delay_ms: 0,
        });
        let cache = FetchCache::new(provider.clone());

        cache.fetch("spy", Period::Year1).await.unwrap();
        cache.fetch("SPY", Period::Year1).await.unwrap();
        assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_fetches_collapse_to_one_upstream_request() {
        let provider = Arc::new(CountingProvider {
            calls: AtomicUsize::new(0),
            delay_ms: 50,
        });
        let cache = Arc::new(FetchCache::new(provider.clone()));

        let mut handles = Vec::new();
        for _ in 0..8 {
            let cache = cache.clone();
            handles.push(tokio::spawn(async move {
                cache.fetch("SPY", Period::Year1).await
            }));
        }
        for h in handles {
            h.await.unwrap().unwrap();
        }
        assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn distinct_periods_are_distinct_entries() {
        let provider = Arc::new(CountingProvider {
            calls: AtomicUsize::new(0),
            delay_ms: 0,
        });
        let cache = FetchCache::new(provider.clone());

        cache.fetch("SPY", Period::Year1).await.unwrap();
        cache.fetch("SPY", Period::Month6).await.unwrap();
        assert_eq!(provider.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn provider_error_is_not_cached() {
        let cache = FetchCache::new(Arc::new(FailingProvider));
        let err = cache.fetch("ZZZZ", Period::Year1).await.unwrap_err();
        assert_eq!(err.code(), "INVALID_SYMBOL");
        assert_eq!(cache.entry_count(), 0);
    }
}
