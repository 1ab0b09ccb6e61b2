use std::sync::Arc;

use crate::analysis::{AnalysisEngine, AnalysisRequest};
use crate::data::Period;
use crate::error::AnalysisResult;
use crate::scan::compare::{compare, CompareMetric};
use crate::scan::FanoutLimits;

use super::format::format_compare;
use super::response_types::CompareResponse;

pub async fn execute(
    engine: &Arc<AnalysisEngine>,
    symbols: &[String],
    metric: CompareMetric,
    base: &AnalysisRequest,
    limits: FanoutLimits,
) -> AnalysisResult<CompareResponse> {
    // Shared parameters are validated once, before any fan-out
    if let Some(period) = base.period.as_deref() {
        Period::parse(period)?;
    }
    let outcome = compare(engine, symbols, metric, base, limits).await;
    Ok(format_compare(outcome))
}
