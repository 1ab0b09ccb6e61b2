use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::brief::MorningBrief;
use crate::config::UserConfig;
use crate::data::Period;
use crate::rank::AiAssessment;
use crate::risk::RiskAssessment;
use crate::scan::compare::{CompareMetric, CompareRow};
use crate::scan::portfolio::PortfolioRiskReport;
use crate::scan::screen::ScreenMatch;
use crate::scan::{QualifiedTrade, SymbolError};
use crate::signals::Signal;

/// AI-enriched response for `analyze_security`
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct AnalyzeResponse {
    pub summary: String,
    pub symbol: String,
    pub period: Period,
    pub price: f64,
    pub change_pct: f64,
    pub indicators: BTreeMap<String, f64>,
    pub signals: Vec<Signal>,
    pub total_signals_detected: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ai: Option<AiAssessment>,
    pub ai_powered: bool,
    pub config_applied: UserConfig,
    pub suggested_next_steps: Vec<String>,
}

/// Response for `get_trade_plan`
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct TradePlanResponse {
    pub summary: String,
    pub assessment: RiskAssessment,
    pub suggested_next_steps: Vec<String>,
}

/// Response for `compare_securities`
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CompareResponse {
    pub summary: String,
    pub metric: CompareMetric,
    pub rows: Vec<CompareRow>,
    /// Null when every symbol failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub winner: Option<String>,
    pub errors: Vec<SymbolError>,
    pub suggested_next_steps: Vec<String>,
}

/// Response for `screen_securities`
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ScreenResponse {
    pub summary: String,
    pub total_scanned: usize,
    pub matches: Vec<ScreenMatch>,
    pub errors: Vec<SymbolError>,
    pub suggested_next_steps: Vec<String>,
}

/// Response for `scan_trades`
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ScanResponse {
    pub summary: String,
    pub universe: String,
    pub total_scanned: usize,
    pub qualified_trades: Vec<QualifiedTrade>,
    pub errors: Vec<SymbolError>,
    pub duration_seconds: f64,
    pub suggested_next_steps: Vec<String>,
}

/// Response for `portfolio_risk`
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct PortfolioResponse {
    pub summary: String,
    pub report: PortfolioRiskReport,
    pub suggested_next_steps: Vec<String>,
}

/// Response for `morning_brief`
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct BriefResponse {
    pub summary: String,
    pub brief: MorningBrief,
    pub suggested_next_steps: Vec<String>,
}

/// One profile entry for `list_profiles`
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ProfileInfo {
    pub name: String,
    pub description: String,
    pub rsi_oversold: f64,
    pub rsi_overbought: f64,
    pub min_rr_ratio: f64,
    pub stop_atr_swing: f64,
    pub volatility_high: f64,
    pub adx_trending: f64,
    pub position_risk_pct: f64,
    pub max_signals_returned: usize,
    pub max_trade_plans: usize,
}

/// Response for `list_profiles`
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ProfilesResponse {
    pub summary: String,
    pub profiles: Vec<ProfileInfo>,
    pub overridable_fields: Vec<String>,
    pub suggested_next_steps: Vec<String>,
}
