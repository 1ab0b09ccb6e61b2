//! Response assembly: turn engine output into AI-consumable responses with
//! a prose summary and suggested next steps.

use crate::analysis::AnalysisReport;
use crate::brief::MorningBrief;
use crate::config::{RiskProfile, UserConfig};
use crate::risk::{RiskOutcome, RiskQuality};
use crate::scan::compare::CompareOutcome;
use crate::scan::portfolio::PortfolioRiskReport;
use crate::scan::screen::ScreenOutcome;
use crate::scan::ScanOutcome;

use super::response_types::{
    AnalyzeResponse, BriefResponse, CompareResponse, PortfolioResponse, ProfileInfo,
    ProfilesResponse, ScanResponse, ScreenResponse, TradePlanResponse,
};

fn direction_word(change_pct: f64) -> &'static str {
    if change_pct >= 0.0 {
        "up"
    } else {
        "down"
    }
}

pub fn format_analyze(report: &AnalysisReport) -> AnalyzeResponse {
    let shown = report.signals.len();
    let summary = format!(
        "{} at {:.2}, {} {:.2}% on the day. {} signals detected ({} shown), top: {}.",
        report.symbol,
        report.price,
        direction_word(report.change_pct),
        report.change_pct.abs(),
        report.total_signals_detected,
        shown,
        report
            .signals
            .first()
            .map_or_else(|| "none".to_string(), |s| s.name.clone()),
    );

    let mut suggested_next_steps = vec![format!(
        "Call get_trade_plan for {} to turn these signals into an actionable plan or suppression reasons",
        report.symbol
    )];
    if !report.ai_powered {
        suggested_next_steps.push(
            "Re-run with use_ai=true for an LLM-ranked view when a ranker endpoint is configured"
                .to_string(),
        );
    }
    suggested_next_steps.push(format!(
        "Use compare_securities to benchmark {} against peers on rsi or change_pct",
        report.symbol
    ));

    AnalyzeResponse {
        summary,
        symbol: report.symbol.clone(),
        period: report.period,
        price: report.price,
        change_pct: report.change_pct,
        indicators: report.indicators.clone(),
        signals: report.signals.clone(),
        total_signals_detected: report.total_signals_detected,
        ai: report.ai.clone(),
        ai_powered: report.ai_powered,
        config_applied: report.config_applied.clone(),
        suggested_next_steps,
    }
}

pub fn format_trade_plan(report: &AnalysisReport) -> TradePlanResponse {
    let assessment = &report.assessment;
    let summary = match &assessment.outcome {
        RiskOutcome::TradePlans(plans) => {
            let best = &plans[0];
            format!(
                "{}: {} {} setup, {} plan(s). Entry {:.2}, stop {:.2}, target {:.2} (R:R {:.2}).",
                assessment.symbol,
                best.bias.as_str(),
                assessment.timeframe.as_str(),
                plans.len(),
                best.entry,
                best.stop,
                best.target,
                best.rr_ratio,
            )
        }
        RiskOutcome::Suppressions(reasons) => {
            let codes: Vec<&str> = reasons.iter().map(|r| r.code.as_str()).collect();
            format!(
                "{}: no actionable plan, suppressed ({}).",
                assessment.symbol,
                codes.join(", ")
            )
        }
    };

    let suggested_next_steps = match &assessment.outcome {
        RiskOutcome::TradePlans(_) => vec![
            "Size the position from max_loss_pct against your account risk budget".to_string(),
            format!(
                "Re-check {} before entry; cached analyses expire after a few minutes",
                assessment.symbol
            ),
        ],
        RiskOutcome::Suppressions(reasons) => {
            let mut steps = vec![format!(
                "Review the suppression thresholds ({}) or try another symbol",
                reasons
                    .iter()
                    .map(|r| r.code.as_str())
                    .collect::<Vec<_>>()
                    .join(", ")
            )];
            steps.push(
                "A risk_profile of 'risky' loosens R:R and volatility gates if appropriate"
                    .to_string(),
            );
            steps
        }
    };

    TradePlanResponse {
        summary,
        assessment: assessment.clone(),
        suggested_next_steps,
    }
}

pub fn format_compare(outcome: CompareOutcome) -> CompareResponse {
    let summary = match &outcome.winner {
        Some(winner) => format!(
            "Compared {} symbols on {:?}; {} ranks first.",
            outcome.rows.len(),
            outcome.metric,
            winner
        ),
        None => "No symbols produced a comparable result.".to_string(),
    };

    let mut suggested_next_steps = Vec::new();
    if let Some(winner) = &outcome.winner {
        suggested_next_steps.push(format!("Call analyze_security on {winner} for the full picture"));
        suggested_next_steps.push(format!("Call get_trade_plan on {winner} to check risk qualification"));
    }

    CompareResponse {
        summary,
        metric: outcome.metric,
        rows: outcome.rows,
        winner: outcome.winner,
        errors: outcome.errors,
        suggested_next_steps,
    }
}

pub fn format_screen(outcome: ScreenOutcome) -> ScreenResponse {
    let summary = format!(
        "Screened {} symbols: {} match, {} failed.",
        outcome.total_scanned,
        outcome.matches.len(),
        outcome.errors.len()
    );
    let suggested_next_steps = if outcome.matches.is_empty() {
        vec!["Loosen the criteria (wider RSI window, lower min_score) and re-screen".to_string()]
    } else {
        vec![format!(
            "Call get_trade_plan on the top matches ({}) to qualify entries",
            outcome
                .matches
                .iter()
                .take(3)
                .map(|m| m.symbol.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        )]
    };

    ScreenResponse {
        summary,
        total_scanned: outcome.total_scanned,
        matches: outcome.matches,
        errors: outcome.errors,
        suggested_next_steps,
    }
}

pub fn format_scan(outcome: ScanOutcome, duration_seconds: f64) -> ScanResponse {
    let high_count = outcome
        .qualified
        .iter()
        .filter(|q| q.risk_quality == RiskQuality::High)
        .count();
    let summary = format!(
        "Scanned {} of {} symbols in {:.1}s: {} qualified ({} high quality), {} errors.",
        outcome.total_scanned - outcome.errors.len(),
        outcome.total_scanned,
        duration_seconds,
        outcome.qualified.len(),
        high_count,
        outcome.errors.len(),
    );

    let suggested_next_steps = if outcome.qualified.is_empty() {
        vec![
            "No setups qualified; re-scan later or switch universe".to_string(),
            "A 'risky' profile admits more plans if your mandate allows".to_string(),
        ]
    } else {
        vec![format!(
            "Call get_trade_plan on {} for full plan details",
            outcome.qualified[0].symbol
        )]
    };

    ScanResponse {
        summary,
        universe: outcome.universe,
        total_scanned: outcome.total_scanned,
        qualified_trades: outcome.qualified,
        errors: outcome.errors,
        duration_seconds,
        suggested_next_steps,
    }
}

pub fn format_portfolio(report: PortfolioRiskReport) -> PortfolioResponse {
    let top_sector = report
        .sectors
        .iter()
        .max_by(|a, b| {
            a.pct_of_portfolio
                .partial_cmp(&b.pct_of_portfolio)
                .unwrap_or(std::cmp::Ordering::Equal)
        })
        .map(|s| format!("{} ({:.0}%)", s.sector, s.pct_of_portfolio));

    let summary = format!(
        "Portfolio of {} positions worth {:.2}: max loss {:.2} ({:.2}% of value).{}",
        report.positions.len(),
        report.total_value,
        report.total_max_loss,
        report.overall_risk_pct,
        top_sector.map_or_else(String::new, |s| format!(" Largest sector: {s}.")),
    );

    let mut suggested_next_steps = Vec::new();
    if report.overall_risk_pct > 5.0 {
        suggested_next_steps
            .push("Aggregate risk above 5% of portfolio value; consider tightening stops".to_string());
    }
    if let Some(heavy) = report.sectors.iter().find(|s| s.pct_of_portfolio > 40.0) {
        suggested_next_steps.push(format!(
            "{} concentration is {:.0}%; consider diversifying",
            heavy.sector, heavy.pct_of_portfolio
        ));
    }
    suggested_next_steps
        .push("Call analyze_security on the highest-risk positions for exit signals".to_string());

    PortfolioResponse {
        summary,
        report,
        suggested_next_steps,
    }
}

pub fn format_brief(brief: MorningBrief) -> BriefResponse {
    let summary = format!(
        "{} brief over {} symbols: {} gainers, {} losers, {} trade ideas.",
        brief.market_region,
        brief.watchlist.len(),
        brief.gainers.len(),
        brief.losers.len(),
        brief.trade_ideas.len(),
    );
    let suggested_next_steps = if brief.trade_ideas.is_empty() {
        vec!["No qualified ideas this morning; run scan_trades on a wider universe".to_string()]
    } else {
        vec![format!(
            "Call get_trade_plan on {} to review the best idea in full",
            brief.trade_ideas[0].symbol
        )]
    };

    BriefResponse {
        summary,
        brief,
        suggested_next_steps,
    }
}

fn profile_description(profile: RiskProfile) -> &'static str {
    match profile {
        RiskProfile::Averse => "Tight thresholds: fewer, higher-conviction plans",
        RiskProfile::Neutral => "Balanced defaults",
        RiskProfile::Risky => "Loose thresholds: more signals and plans admitted",
    }
}

pub fn format_profiles(overridable_fields: Vec<String>) -> ProfilesResponse {
    let profiles: Vec<ProfileInfo> = RiskProfile::ALL
        .iter()
        .map(|&profile| {
            let cfg = UserConfig::preset(profile);
            ProfileInfo {
                name: profile.as_str().to_string(),
                description: profile_description(profile).to_string(),
                rsi_oversold: cfg.indicators.rsi_oversold,
                rsi_overbought: cfg.indicators.rsi_overbought,
                min_rr_ratio: cfg.risk.min_rr_ratio,
                stop_atr_swing: cfg.risk.stop_atr_swing,
                volatility_high: cfg.risk.volatility_high,
                adx_trending: cfg.risk.adx_trending,
                position_risk_pct: cfg.risk.position_risk_pct,
                max_signals_returned: cfg.signals.max_signals_returned,
                max_trade_plans: cfg.signals.max_trade_plans,
            }
        })
        .collect();

    ProfilesResponse {
        summary: format!(
            "{} profiles available: averse, neutral, risky. Any numeric threshold can be \
             overridden per request via config_overrides.",
            profiles.len()
        ),
        profiles,
        overridable_fields,
        suggested_next_steps: vec![
            "Pass risk_profile to analyze_security or get_trade_plan".to_string(),
            "Combine a profile with config_overrides for per-request tuning".to_string(),
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scan::compare::CompareMetric;

    #[test]
    fn compare_summary_tolerates_empty_result_set() {
        let response = format_compare(CompareOutcome {
            metric: CompareMetric::Score,
            rows: vec![],
            winner: None,
            errors: vec![],
        });
        assert!(response.winner.is_none());
        assert!(response.summary.contains("No symbols"));
        assert!(response.suggested_next_steps.is_empty());
    }

    #[test]
    fn scan_summary_counts_errors() {
        let response = format_scan(
            ScanOutcome {
                universe: "sp500".to_string(),
                total_scanned: 10,
                qualified: vec![],
                errors: vec![],
            },
            2.5,
        );
        assert!(response.summary.contains("10"));
        assert!(response.summary.contains("0 qualified"));
        assert_eq!(response.duration_seconds, 2.5);
    }

    #[test]
    fn profiles_catalog_lists_all_three() {
        let response = format_profiles(vec!["rsi_oversold".to_string()]);
        assert_eq!(response.profiles.len(), 3);
        let averse = response.profiles.iter().find(|p| p.name == "averse").unwrap();
        assert_eq!(averse.max_trade_plans, 2);
        assert_eq!(averse.min_rr_ratio, 2.0);
        let risky = response.profiles.iter().find(|p| p.name == "risky").unwrap();
        assert_eq!(risky.max_trade_plans, 5);
    }
}
