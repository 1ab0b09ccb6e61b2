use std::sync::Arc;

use crate::analysis::{AnalysisEngine, AnalysisRequest};
use crate::data::Period;
use crate::error::AnalysisResult;
use crate::scan::screen::{screen, ScreenCriteria};
use crate::scan::FanoutLimits;
use crate::universe;

use super::format::format_screen;
use super::response_types::ScreenResponse;

/// Screen either an explicit symbol list or a named universe.
pub async fn execute(
    engine: &Arc<AnalysisEngine>,
    symbols: Option<Vec<String>>,
    universe_name: Option<&str>,
    criteria: &ScreenCriteria,
    base: &AnalysisRequest,
    limits: FanoutLimits,
) -> AnalysisResult<ScreenResponse> {
    if let Some(period) = base.period.as_deref() {
        Period::parse(period)?;
    }
    let symbols: Vec<String> = match (symbols, universe_name) {
        (Some(list), _) if !list.is_empty() => list.iter().map(|s| s.to_uppercase()).collect(),
        (_, Some(name)) => universe::resolve_universe(name)?
            .iter()
            .map(|s| (*s).to_string())
            .collect(),
        _ => universe::resolve_universe("watchlist_default")?
            .iter()
            .map(|s| (*s).to_string())
            .collect(),
    };
    let outcome = screen(engine, &symbols, criteria, base, limits).await;
    Ok(format_screen(outcome))
}
