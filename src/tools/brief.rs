use std::sync::Arc;

use crate::analysis::{AnalysisEngine, AnalysisRequest};
use crate::brief::morning_brief;
use crate::data::Period;
use crate::error::AnalysisResult;
use crate::scan::FanoutLimits;

use super::format::format_brief;
use super::response_types::BriefResponse;

pub async fn execute(
    engine: &Arc<AnalysisEngine>,
    watchlist: Option<Vec<String>>,
    market_region: Option<String>,
    base: &AnalysisRequest,
    limits: FanoutLimits,
) -> AnalysisResult<BriefResponse> {
    if let Some(period) = base.period.as_deref() {
        Period::parse(period)?;
    }
    let brief = morning_brief(engine, watchlist, market_region, base, limits).await?;
    Ok(format_brief(brief))
}
