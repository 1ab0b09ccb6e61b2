use std::sync::Arc;

use crate::analysis::{AnalysisEngine, AnalysisRequest};
use crate::error::AnalysisResult;

use super::format::format_trade_plan;
use super::response_types::TradePlanResponse;

pub async fn execute(
    engine: &Arc<AnalysisEngine>,
    request: &AnalysisRequest,
) -> AnalysisResult<TradePlanResponse> {
    let report = engine.analyze(request).await?;
    Ok(format_trade_plan(&report))
}
