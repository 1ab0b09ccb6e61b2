#![allow(dead_code)]

use chrono::{TimeZone, Utc};
use std::sync::Arc;

use signalscope_mcp::analysis::AnalysisEngine;
use signalscope_mcp::data::cache::FetchCache;
use signalscope_mcp::data::{Bar, BarProvider, Period};
use signalscope_mcp::error::{AnalysisError, AnalysisResult};
use signalscope_mcp::server::SignalscopeServer;
use signalscope_mcp::store::{DocumentStore, MemoryDocumentStore};

/// Scripted provider for integration tests:
///
/// - `BAD*` symbols fail with `INVALID_SYMBOL`
/// - `CHOP*` symbols get a directionless alternating tape
/// - everything else gets an orderly 240-bar uptrend with a pullback near
///   the end, so the risk layer finds confirmed swing structure
pub struct ScriptedProvider;

#[async_trait::async_trait]
impl BarProvider for ScriptedProvider {
    async fn fetch_bars(&self, symbol: &str, _period: Period) -> AnalysisResult<Vec<Bar>> {
        if symbol.starts_with("BAD") {
            return Err(AnalysisError::InvalidSymbol(symbol.to_string()));
        }
        let choppy = symbol.starts_with("CHOP");
        let mut price = 100.0;
        let mut bars = Vec::with_capacity(240);
        for i in 0..240 {
            let drift = if choppy {
                if i % 2 == 0 {
                    0.4
                } else {
                    -0.4
                }
            } else if (200..=204).contains(&i) {
                -0.8
            } else {
                0.45
            };
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

/// A `SignalscopeServer` backed by the scripted provider and an in-memory
/// document store.
pub fn make_test_server() -> SignalscopeServer {
    let fetch_cache = Arc::new(FetchCache::new(Arc::new(ScriptedProvider)));
    let engine = Arc::new(AnalysisEngine::new(fetch_cache, None));
    let store: Arc<dyn DocumentStore> = Arc::new(MemoryDocumentStore::new());
    SignalscopeServer::new(engine, store)
}
