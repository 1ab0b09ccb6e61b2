//! Persisted record schemas and the document store seam.
//!
//! Persistence backends are external collaborators; the engine only depends
//! on the [`DocumentStore`] trait. The in-process implementation keeps the
//! latest document per key in memory.

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::analysis::AnalysisReport;
use crate::rank::{Action, Confidence, Outlook};
use crate::scan::ScanOutcome;
use crate::signals::Signal;

/// Analysis document keyed by symbol.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct AnalysisDocument {
    pub symbol: String,
    pub timestamp: DateTime<Utc>,
    pub price: f64,
    pub change_pct: f64,
    pub indicators: BTreeMap<String, f64>,
    pub signals: Vec<Signal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ai_score: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ai_outlook: Option<Outlook>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ai_action: Option<Action>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ai_confidence: Option<Confidence>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ai_summary: Option<String>,
    pub ai_powered: bool,
}

impl AnalysisDocument {
    pub fn from_report(report: &AnalysisReport) -> Self {
        Self {
            symbol: report.symbol.clone(),
            timestamp: report.timestamp,
            price: report.price,
            change_pct: report.change_pct,
            indicators: report.indicators.clone(),
            signals: report.signals.clone(),
            ai_score: report.ai.as_ref().map(|a| a.score),
            ai_outlook: report.ai.as_ref().map(|a| a.outlook),
            ai_action: report.ai.as_ref().map(|a| a.action),
            ai_confidence: report.ai.as_ref().map(|a| a.confidence),
            ai_summary: report.ai.as_ref().map(|a| a.summary.clone()),
            ai_powered: report.ai_powered,
        }
    }
}

/// Daily scan document keyed by universe.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ScanDocument {
    pub universe: String,
    pub total_scanned: usize,
    pub qualified_trades: ScanOutcome,
    pub timestamp: DateTime<Utc>,
    pub duration_seconds: f64,
}

pub trait DocumentStore: Send + Sync {
    fn save_analysis(&self, document: AnalysisDocument);
    fn load_analysis(&self, symbol: &str) -> Option<AnalysisDocument>;
    fn save_scan(&self, document: ScanDocument);
    fn load_scan(&self, universe: &str) -> Option<ScanDocument>;
}

/// Process-local store: latest document per key.
#[derive(Default)]
pub struct MemoryDocumentStore {
    analyses: DashMap<String, AnalysisDocument>,
    scans: DashMap<String, ScanDocument>,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl DocumentStore for MemoryDocumentStore {
    fn save_analysis(&self, document: AnalysisDocument) {
        self.analyses.insert(document.symbol.clone(), document);
    }

    fn load_analysis(&self, symbol: &str) -> Option<AnalysisDocument> {
        self.analyses.get(&symbol.to_uppercase()).map(|d| d.clone())
    }

    fn save_scan(&self, document: ScanDocument) {
        self.scans.insert(document.universe.clone(), document);
    }

    fn load_scan(&self, universe: &str) -> Option<ScanDocument> {
        self.scans.get(universe).map(|d| d.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn document(symbol: &str) -> AnalysisDocument {
        AnalysisDocument {
            symbol: symbol.to_string(),
            timestamp: Utc.timestamp_opt(1_700_000_000, 0).unwrap(),
            price: 100.0,
            change_pct: 1.5,
            indicators: BTreeMap::new(),
            signals: vec![],
            ai_score: None,
            ai_outlook: None,
            ai_action: None,
            ai_confidence: None,
            ai_summary: None,
            ai_powered: false,
        }
    }

    #[test]
    fn save_and_load_analysis() {
        let store = MemoryDocumentStore::new();
        store.save_analysis(document("SPY"));
        let loaded = store.load_analysis("spy").unwrap();
        assert_eq!(loaded.symbol, "SPY");
        assert!(store.load_analysis("QQQ").is_none());
    }

    #[test]
    fn latest_document_wins() {
        let store = MemoryDocumentStore::new();
        store.save_analysis(document("SPY"));
        let mut updated = document("SPY");
        updated.price = 101.0;
        store.save_analysis(updated);
        assert_eq!(store.load_analysis("SPY").unwrap().price, 101.0);
    }
}
