use std::sync::Arc;

use crate::analysis::{AnalysisEngine, AnalysisRequest};
use crate::error::AnalysisResult;
use crate::store::{AnalysisDocument, DocumentStore};

use super::format::format_analyze;
use super::response_types::AnalyzeResponse;

pub async fn execute(
    engine: &Arc<AnalysisEngine>,
    store: &Arc<dyn DocumentStore>,
    request: &AnalysisRequest,
) -> AnalysisResult<AnalyzeResponse> {
    let report = engine.analyze(request).await?;
    store.save_analysis(AnalysisDocument::from_report(&report));
    Ok(format_analyze(&report))
}
