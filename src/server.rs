use garde::Validate;
use rmcp::{
    handler::server::{router::tool::ToolRouter, wrapper::Json, wrapper::Parameters},
    model::{Implementation, ServerCapabilities, ServerInfo},
    tool, tool_handler, tool_router, ServerHandler,
};
use schemars::JsonSchema;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::analysis::{AnalysisEngine, AnalysisRequest};
use crate::error::AnalysisError;
use crate::risk::Timeframe;
use crate::scan::compare::CompareMetric;
use crate::scan::portfolio::PositionInput;
use crate::scan::screen::ScreenCriteria;
use crate::scan::FanoutLimits;
use crate::store::DocumentStore;
use crate::tools;
use crate::tools::response_types::{
    AnalyzeResponse, BriefResponse, CompareResponse, PortfolioResponse, ProfilesResponse,
    ScanResponse, ScreenResponse, TradePlanResponse,
};

#[derive(Clone)]
pub struct SignalscopeServer {
    pub engine: Arc<AnalysisEngine>,
    pub store: Arc<dyn DocumentStore>,
    limits: FanoutLimits,
    tool_router: ToolRouter<Self>,
}

impl SignalscopeServer {
    pub fn new(engine: Arc<AnalysisEngine>, store: Arc<dyn DocumentStore>) -> Self {
        Self {
            engine,
            store,
            limits: FanoutLimits::default(),
            tool_router: Self::tool_router(),
        }
    }

    pub fn with_limits(mut self, limits: FanoutLimits) -> Self {
        self.limits = limits;
        self
    }
}

fn tool_error(error: &AnalysisError) -> String {
    format!("Error [{}]: {error}", error.code())
}

fn default_max_results() -> usize {
    10
}

#[derive(Debug, Deserialize, JsonSchema, Validate)]
pub struct AnalyzeSecurityParams {
    /// Ticker symbol (e.g. "SPY", "AAPL", "BTC-USD")
    #[garde(length(min = 1, max = 12), pattern(r"^[A-Za-z0-9.\-]+$"))]
    pub symbol: String,
    /// Bar period (e.g. "1y", "6mo", "1d"). Defaults to "1y".
    #[garde(inner(length(min = 1, max = 5)))]
    pub period: Option<String>,
    /// Rank signals with the remote LLM ranker when configured
    #[serde(default)]
    #[garde(skip)]
    pub use_ai: bool,
    /// Risk profile: "averse", "neutral" (default), or "risky"
    #[garde(inner(length(min = 1, max = 10)))]
    pub risk_profile: Option<String>,
    /// Per-request threshold overrides (flat field -> number map)
    #[garde(skip)]
    pub config_overrides: Option<BTreeMap<String, serde_json::Value>>,
}

#[derive(Debug, Deserialize, JsonSchema, Validate)]
pub struct GetTradePlanParams {
    /// Ticker symbol
    #[garde(length(min = 1, max = 12), pattern(r"^[A-Za-z0-9.\-]+$"))]
    pub symbol: String,
    /// Bar period. Defaults to "1y".
    #[garde(inner(length(min = 1, max = 5)))]
    pub period: Option<String>,
    /// Risk profile: "averse", "neutral" (default), or "risky"
    #[garde(inner(length(min = 1, max = 10)))]
    pub risk_profile: Option<String>,
    /// Per-request threshold overrides
    #[garde(skip)]
    pub config_overrides: Option<BTreeMap<String, serde_json::Value>>,
    /// Force a trading timeframe ("swing", "day", "scalp")
    #[garde(skip)]
    pub timeframe: Option<Timeframe>,
}

#[derive(Debug, Deserialize, JsonSchema, Validate)]
pub struct CompareSecuritiesParams {
    /// Symbols to compare (2-20)
    #[garde(length(min = 2, max = 20), inner(length(min = 1, max = 12), pattern(r"^[A-Za-z0-9.\-]+$")))]
    pub symbols: Vec<String>,
    /// Projection metric (default: score)
    #[serde(default)]
    #[garde(skip)]
    pub metric: CompareMetric,
    /// Bar period. Defaults to "1y".
    #[garde(inner(length(min = 1, max = 5)))]
    pub period: Option<String>,
}

#[derive(Debug, Deserialize, JsonSchema, Validate)]
pub struct ScreenSecuritiesParams {
    /// Explicit symbols to screen; takes precedence over `universe`
    #[garde(inner(length(max = 50), inner(length(min = 1, max = 12), pattern(r"^[A-Za-z0-9.\-]+$"))))]
    pub symbols: Option<Vec<String>>,
    /// Named universe ("sp500", "nasdaq100", "watchlist_default")
    #[garde(inner(length(min = 1, max = 30)))]
    pub universe: Option<String>,
    /// Boolean match criteria
    #[serde(default)]
    #[garde(dive)]
    pub criteria: ScreenCriteria,
    /// Bar period. Defaults to "1y".
    #[garde(inner(length(min = 1, max = 5)))]
    pub period: Option<String>,
}

#[derive(Debug, Deserialize, JsonSchema, Validate)]
pub struct ScanTradesParams {
    /// Named universe ("sp500", "nasdaq100", "watchlist_default")
    #[garde(length(min = 1, max = 30))]
    pub universe: String,
    /// Maximum qualified trades returned (default: 10)
    #[serde(default = "default_max_results")]
    #[garde(range(min = 1, max = 50))]
    pub max_results: usize,
    /// Bar period. Defaults to "1y".
    #[garde(inner(length(min = 1, max = 5)))]
    pub period: Option<String>,
    /// Risk profile applied to every symbol
    #[garde(inner(length(min = 1, max = 10)))]
    pub risk_profile: Option<String>,
}

#[derive(Debug, Deserialize, JsonSchema, Validate)]
pub struct PortfolioRiskParams {
    /// Open positions
    #[garde(length(min = 1, max = 100), dive)]
    pub positions: Vec<PositionInput>,
    /// Bar period for the volatility snapshot. Defaults to "1y".
    #[garde(inner(length(min = 1, max = 5)))]
    pub period: Option<String>,
}

#[derive(Debug, Deserialize, JsonSchema, Validate)]
pub struct MorningBriefParams {
    /// Watchlist symbols; defaults to the built-in list
    #[garde(inner(length(max = 50), inner(length(min = 1, max = 12), pattern(r"^[A-Za-z0-9.\-]+$"))))]
    pub watchlist: Option<Vec<String>>,
    /// Market region label (informational; default "US")
    #[garde(inner(length(min = 1, max = 20)))]
    pub market_region: Option<String>,
    /// Bar period. Defaults to "1y".
    #[garde(inner(length(min = 1, max = 5)))]
    pub period: Option<String>,
}

#[tool_router]
impl SignalscopeServer {
    /// Full technical analysis for one symbol. **START HERE.**
    ///
    /// **When to use**: First look at any symbol — indicators, detected
    /// signals, ranked by score.
    /// **Output**: Indicator snapshot (RSI, MACD, Bollinger, ADX, ATR, MAs),
    /// ranked signals truncated to the profile's ceiling, and the applied
    /// config echo.
    /// **Next tools**: `get_trade_plan` (risk-qualified entry/stop/target),
    /// `compare_securities` (benchmark against peers)
    #[tool(name = "analyze_security", annotations(read_only_hint = true, open_world_hint = true))]
    async fn analyze_security(
        &self,
        Parameters(params): Parameters<AnalyzeSecurityParams>,
    ) -> Result<Json<AnalyzeResponse>, String> {
        params
            .validate()
            .map_err(|e| format!("Validation error: {e}"))?;
        let request = AnalysisRequest {
            symbol: params.symbol,
            period: params.period,
            risk_profile: params.risk_profile,
            config_overrides: params.config_overrides,
            use_ai: params.use_ai,
            timeframe_hint: None,
        };
        tools::analyze::execute(&self.engine, &self.store, &request)
            .await
            .map(Json)
            .map_err(|e| tool_error(&e))
    }

    /// Risk-qualified trade plan (or machine-readable suppression reasons).
    ///
    /// **When to use**: After `analyze_security`, to turn signals into an
    /// actionable plan with entry, stop, target, invalidation, and vehicle.
    /// **Output**: Either 1..max_trade_plans plans or a non-empty list of
    /// suppression codes (VOLATILITY_TOO_HIGH, NO_TREND, RR_UNFAVORABLE, ...)
    /// with threshold/actual values.
    #[tool(name = "get_trade_plan", annotations(read_only_hint = true, open_world_hint = true))]
    async fn get_trade_plan(
        &self,
        Parameters(params): Parameters<GetTradePlanParams>,
    ) -> Result<Json<TradePlanResponse>, String> {
        params
            .validate()
            .map_err(|e| format!("Validation error: {e}"))?;
        let request = AnalysisRequest {
            symbol: params.symbol,
            period: params.period,
            risk_profile: params.risk_profile,
            config_overrides: params.config_overrides,
            use_ai: false,
            timeframe_hint: params.timeframe,
        };
        tools::trade_plan::execute(&self.engine, &request)
            .await
            .map(Json)
            .map_err(|e| tool_error(&e))
    }

    /// Rank symbols side by side on one metric.
    ///
    /// **Metrics**: score (default), change_pct, rsi, volatility.
    /// **Output**: Rows sorted best-first plus a nullable winner; per-symbol
    /// failures are recorded, never fatal.
    #[tool(name = "compare_securities", annotations(read_only_hint = true, open_world_hint = true))]
    async fn compare_securities(
        &self,
        Parameters(params): Parameters<CompareSecuritiesParams>,
    ) -> Result<Json<CompareResponse>, String> {
        params
            .validate()
            .map_err(|e| format!("Validation error: {e}"))?;
        let base = AnalysisRequest {
            period: params.period,
            ..AnalysisRequest::default()
        };
        tools::compare::execute(&self.engine, &params.symbols, params.metric, &base, self.limits)
            .await
            .map(Json)
            .map_err(|e| tool_error(&e))
    }

    /// Boolean screen over a universe or symbol list.
    ///
    /// **Criteria**: RSI window, minimum bullish-signal count, minimum top
    /// score, required bias.
    /// **Output**: Matches sorted by top score, plus per-symbol errors and
    /// the scanned count.
    #[tool(name = "screen_securities", annotations(read_only_hint = true, open_world_hint = true))]
    async fn screen_securities(
        &self,
        Parameters(params): Parameters<ScreenSecuritiesParams>,
    ) -> Result<Json<ScreenResponse>, String> {
        params
            .validate()
            .map_err(|e| format!("Validation error: {e}"))?;
        let base = AnalysisRequest {
            period: params.period,
            ..AnalysisRequest::default()
        };
        tools::screen::execute(
            &self.engine,
            params.symbols,
            params.universe.as_deref(),
            &params.criteria,
            &base,
            self.limits,
        )
        .await
        .map(Json)
        .map_err(|e| tool_error(&e))
    }

    /// Scan a whole universe for qualified setups.
    ///
    /// **When to use**: Daily idea generation across sp500 / nasdaq100.
    /// **Output**: Qualified trades sorted by (risk quality, score),
    /// truncated to max_results; failures recorded per symbol.
    /// **Time to run**: Bounded concurrency (10 symbols at a time).
    #[tool(name = "scan_trades", annotations(read_only_hint = true, open_world_hint = true))]
    async fn scan_trades(
        &self,
        Parameters(params): Parameters<ScanTradesParams>,
    ) -> Result<Json<ScanResponse>, String> {
        params
            .validate()
            .map_err(|e| format!("Validation error: {e}"))?;
        let base = AnalysisRequest {
            period: params.period,
            risk_profile: params.risk_profile,
            ..AnalysisRequest::default()
        };
        tools::scan::execute(
            &self.engine,
            &self.store,
            &params.universe,
            params.max_results,
            &base,
            self.limits,
        )
        .await
        .map(Json)
        .map_err(|e| tool_error(&e))
    }

    /// Sector-bucketed portfolio risk snapshot.
    ///
    /// **Output**: Per-position intelligent stops (distance drawn from the
    /// volatility risk bucket), dollar risk, GICS sector aggregation with
    /// percent-of-portfolio and risk-level distribution, overall risk.
    #[tool(name = "portfolio_risk", annotations(read_only_hint = true, open_world_hint = true))]
    async fn portfolio_risk(
        &self,
        Parameters(params): Parameters<PortfolioRiskParams>,
    ) -> Result<Json<PortfolioResponse>, String> {
        params
            .validate()
            .map_err(|e| format!("Validation error: {e}"))?;
        let base = AnalysisRequest {
            period: params.period,
            ..AnalysisRequest::default()
        };
        tools::portfolio::execute(&self.engine, &params.positions, &base, self.limits)
            .await
            .map(Json)
            .map_err(|e| tool_error(&e))
    }

    /// Composed morning brief for a watchlist.
    ///
    /// **Output**: Gainers/losers, highest-scoring signals, qualified trade
    /// ideas — one call instead of N.
    #[tool(name = "morning_brief", annotations(read_only_hint = true, open_world_hint = true))]
    async fn morning_brief(
        &self,
        Parameters(params): Parameters<MorningBriefParams>,
    ) -> Result<Json<BriefResponse>, String> {
        params
            .validate()
            .map_err(|e| format!("Validation error: {e}"))?;
        let base = AnalysisRequest {
            period: params.period,
            ..AnalysisRequest::default()
        };
        tools::brief::execute(
            &self.engine,
            params.watchlist,
            params.market_region,
            &base,
            self.limits,
        )
        .await
        .map(Json)
        .map_err(|e| tool_error(&e))
    }

    /// Browse the three risk profiles and every overridable threshold.
    ///
    /// **When to use**: Before passing `risk_profile` or `config_overrides`
    /// to the other tools.
    #[tool(name = "list_profiles", annotations(read_only_hint = true))]
    async fn list_profiles(&self) -> Json<ProfilesResponse> {
        Json(tools::profiles::execute())
    }
}

#[tool_handler]
impl ServerHandler for SignalscopeServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: rmcp::model::ProtocolVersion::default(),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: "signalscope-mcp".into(),
                title: Some("Signalscope Technical Analysis Engine".into()),
                version: "0.1.0".into(),
                description: Some(
                    "Technical-analysis engine for equities, ETFs, and crypto: ~20 indicators, \
                     named signal detection across 10 categories, score ranking with optional \
                     LLM assist, and a risk-qualification layer that emits trade plans or \
                     machine-readable suppression reasons"
                        .into(),
                ),
                icons: None,
                website_url: None,
            },
            instructions: Some(
                "Technical-analysis engine with a risk-qualification layer. \
                \n\nRecommended workflow:\
                \n1. analyze_security({ symbol, period?, risk_profile?, config_overrides?, \
                use_ai? }) — indicators plus ranked signals for one symbol. All other tools \
                build on the same per-symbol core.\
                \n2. get_trade_plan({ symbol, ... }) — risk qualification: volatility regime, \
                trend gate, directional bias, structural invalidation, ATR stop, target, R:R \
                check, vehicle selection. Returns trade plans or suppression reasons with \
                stable codes (e.g. VOLATILITY_TOO_HIGH, NO_TREND, RR_UNFAVORABLE) and \
                threshold/actual values.\
                \n3. list_profiles() — the averse/neutral/risky presets and every field \
                accepted in config_overrides.\
                \n4. compare_securities({ symbols, metric? }) — rank symbols on score, \
                change_pct, rsi, or volatility; winner is null when nothing succeeds.\
                \n5. screen_securities({ universe | symbols, criteria }) — boolean filter \
                (RSI window, bullish count, min score, bias).\
                \n6. scan_trades({ universe, max_results? }) — fan the core out over sp500 or \
                nasdaq100 with bounded concurrency; qualified setups sorted by risk quality \
                then score. Per-symbol failures never abort the scan.\
                \n7. portfolio_risk({ positions }) — volatility-bucketed stops, dollar risk, \
                and GICS sector aggregation.\
                \n8. morning_brief({ watchlist? }) — movers, top signals, and qualified ideas \
                in one call.\
                \n\nData flow: chart provider -> bar cache (TTL 300s, single-flight) -> \
                indicator frame -> signal detectors -> ranker (rule-based, optional LLM with \
                automatic fallback) -> risk qualifier -> JSON response."
                    .into(),
            ),
        }
    }
}
