use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;

use crate::analysis::{AnalysisEngine, AnalysisRequest};
use crate::data::Period;
use crate::error::AnalysisResult;
use crate::scan::{scan_universe, FanoutLimits};
use crate::store::{DocumentStore, ScanDocument};

use super::format::format_scan;
use super::response_types::ScanResponse;

pub async fn execute(
    engine: &Arc<AnalysisEngine>,
    store: &Arc<dyn DocumentStore>,
    universe_name: &str,
    max_results: usize,
    base: &AnalysisRequest,
    limits: FanoutLimits,
) -> AnalysisResult<ScanResponse> {
    if let Some(period) = base.period.as_deref() {
        Period::parse(period)?;
    }

    let started = Instant::now();
    let outcome = scan_universe(engine, universe_name, max_results, base, limits).await?;
    let duration_seconds = started.elapsed().as_secs_f64();

    store.save_scan(ScanDocument {
        universe: outcome.universe.clone(),
        total_scanned: outcome.total_scanned,
        qualified_trades: outcome.clone(),
        timestamp: Utc::now(),
        duration_seconds,
    });

    Ok(format_scan(outcome, duration_seconds))
}
