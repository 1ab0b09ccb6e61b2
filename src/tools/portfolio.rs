use std::sync::Arc;

use crate::analysis::{AnalysisEngine, AnalysisRequest};
use crate::data::Period;
use crate::error::AnalysisResult;
use crate::scan::portfolio::{portfolio_risk, PositionInput};
use crate::scan::FanoutLimits;

use super::format::format_portfolio;
use super::response_types::PortfolioResponse;

pub async fn execute(
    engine: &Arc<AnalysisEngine>,
    positions: &[PositionInput],
    base: &AnalysisRequest,
    limits: FanoutLimits,
) -> AnalysisResult<PortfolioResponse> {
    if let Some(period) = base.period.as_deref() {
        Period::parse(period)?;
    }
    let report = portfolio_risk(engine, positions, base, limits).await;
    Ok(format_portfolio(report))
}
