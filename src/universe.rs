//! Static universe catalogs and the ticker -> GICS sector map.

use crate::error::{AnalysisError, AnalysisResult};

/// Abridged S&P 500 constituents: the liquid large-cap core.
const SP500: &[&str] = &[
    "AAPL", "MSFT", "NVDA", "AMZN", "GOOGL", "META", "BRK-B", "LLY", "AVGO", "TSLA", "JPM", "V",
    "XOM", "UNH", "MA", "PG", "JNJ", "HD", "COST", "MRK", "ABBV", "CVX", "CRM", "BAC", "NFLX",
    "AMD", "KO", "PEP", "TMO", "WMT", "ADBE", "CSCO", "ACN", "MCD", "LIN", "ABT", "ORCL", "WFC",
    "INTC", "DIS", "QCOM", "CAT", "VZ", "IBM", "GE", "TXN", "AMGN", "PFE", "NOW", "UNP", "NEE",
    "PM", "COP", "GS", "HON", "RTX", "SPGI", "T", "LOW", "BA",
];

/// Abridged Nasdaq-100 constituents.
const NASDAQ100: &[&str] = &[
    "AAPL", "MSFT", "NVDA", "AMZN", "GOOGL", "META", "AVGO", "TSLA", "COST", "NFLX", "AMD",
    "PEP", "ADBE", "CSCO", "QCOM", "INTC", "TXN", "AMGN", "INTU", "ISRG", "BKNG", "HON", "AMAT",
    "SBUX", "GILD", "ADI", "MDLZ", "LRCX", "REGN", "VRTX", "PANW", "MU", "KLAC", "SNPS", "CDNS",
    "MELI", "ASML", "ABNB", "MRVL", "ORLY",
];

/// Default morning-brief watchlist: index ETFs plus the mega-caps.
const WATCHLIST_DEFAULT: &[&str] = &[
    "SPY", "QQQ", "IWM", "DIA", "AAPL", "MSFT", "NVDA", "AMZN", "GOOGL", "META", "TSLA", "AMD",
    "NFLX", "JPM", "XOM",
];

/// The 11 GICS sectors.
pub const SECTORS: [&str; 11] = [
    "Information Technology",
    "Health Care",
    "Financials",
    "Consumer Discretionary",
    "Communication Services",
    "Industrials",
    "Consumer Staples",
    "Energy",
    "Utilities",
    "Real Estate",
    "Materials",
];

const SECTOR_MAP: &[(&str, &str)] = &[
    // Information Technology
    ("AAPL", "Information Technology"),
    ("MSFT", "Information Technology"),
    ("NVDA", "Information Technology"),
    ("AVGO", "Information Technology"),
    ("CRM", "Information Technology"),
    ("AMD", "Information Technology"),
    ("ADBE", "Information Technology"),
    ("CSCO", "Information Technology"),
    ("ACN", "Information Technology"),
    ("ORCL", "Information Technology"),
    ("INTC", "Information Technology"),
    ("QCOM", "Information Technology"),
    ("IBM", "Information Technology"),
    ("TXN", "Information Technology"),
    ("NOW", "Information Technology"),
    ("AMAT", "Information Technology"),
    ("ADI", "Information Technology"),
    ("LRCX", "Information Technology"),
    ("PANW", "Information Technology"),
    ("MU", "Information Technology"),
    ("KLAC", "Information Technology"),
    ("SNPS", "Information Technology"),
    ("CDNS", "Information Technology"),
    ("ASML", "Information Technology"),
    ("MRVL", "Information Technology"),
    ("INTU", "Information Technology"),
    // Health Care
    ("LLY", "Health Care"),
    ("UNH", "Health Care"),
    ("JNJ", "Health Care"),
    ("MRK", "Health Care"),
    ("ABBV", "Health Care"),
    ("TMO", "Health Care"),
    ("ABT", "Health Care"),
    ("AMGN", "Health Care"),
    ("PFE", "Health Care"),
    ("ISRG", "Health Care"),
    ("GILD", "Health Care"),
    ("REGN", "Health Care"),
    ("VRTX", "Health Care"),
    // Financials
    ("BRK-B", "Financials"),
    ("JPM", "Financials"),
    ("V", "Financials"),
    ("MA", "Financials"),
    ("BAC", "Financials"),
    ("WFC", "Financials"),
    ("GS", "Financials"),
    ("SPGI", "Financials"),
    // Consumer Discretionary
    ("AMZN", "Consumer Discretionary"),
    ("TSLA", "Consumer Discretionary"),
    ("HD", "Consumer Discretionary"),
    ("MCD", "Consumer Discretionary"),
    ("LOW", "Consumer Discretionary"),
    ("SBUX", "Consumer Discretionary"),
    ("BKNG", "Consumer Discretionary"),
    ("ABNB", "Consumer Discretionary"),
    ("MELI", "Consumer Discretionary"),
    ("ORLY", "Consumer Discretionary"),
    // Communication Services
    ("GOOGL", "Communication Services"),
    ("META", "Communication Services"),
    ("NFLX", "Communication Services"),
    ("DIS", "Communication Services"),
    ("VZ", "Communication Services"),
    ("T", "Communication Services"),
    // Industrials
    ("CAT", "Industrials"),
    ("GE", "Industrials"),
    ("UNP", "Industrials"),
    ("HON", "Industrials"),
    ("RTX", "Industrials"),
    ("BA", "Industrials"),
    // Consumer Staples
    ("PG", "Consumer Staples"),
    ("COST", "Consumer Staples"),
    ("KO", "Consumer Staples"),
    ("PEP", "Consumer Staples"),
    ("WMT", "Consumer Staples"),
    ("PM", "Consumer Staples"),
    ("MDLZ", "Consumer Staples"),
    // Energy
    ("XOM", "Energy"),
    ("CVX", "Energy"),
    ("COP", "Energy"),
    // Utilities
    ("NEE", "Utilities"),
    // Materials
    ("LIN", "Materials"),
];

/// Resolve a universe name to its static symbol list.
pub fn resolve_universe(name: &str) -> AnalysisResult<&'static [&'static str]> {
    match name {
        "sp500" => Ok(SP500),
        "nasdaq100" => Ok(NASDAQ100),
        "watchlist_default" => Ok(WATCHLIST_DEFAULT),
        other => Err(AnalysisError::UnknownUniverse(other.to_string())),
    }
}

pub fn known_universes() -> &'static [&'static str] {
    &["sp500", "nasdaq100", "watchlist_default"]
}

/// GICS sector for a ticker; unmapped tickers land in "Other".
pub fn sector_of(symbol: &str) -> &'static str {
    let upper = symbol.to_uppercase();
    SECTOR_MAP
        .iter()
        .find(|(ticker, _)| *ticker == upper)
        .map_or("Other", |(_, sector)| sector)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn universes_resolve() {
        assert!(resolve_universe("sp500").unwrap().len() >= 50);
        assert!(resolve_universe("nasdaq100").unwrap().len() >= 30);
        assert!(!resolve_universe("watchlist_default").unwrap().is_empty());
    }

    #[test]
    fn unknown_universe_is_rejected() {
        let err = resolve_universe("russell9000").unwrap_err();
        assert_eq!(err.code(), "UNKNOWN_UNIVERSE");
    }

    #[test]
    fn scenario_sectors_are_mapped() {
        assert_eq!(sector_of("AAPL"), "Information Technology");
        assert_eq!(sector_of("XOM"), "Energy");
        assert_eq!(sector_of("JNJ"), "Health Care");
        assert_eq!(sector_of("aapl"), "Information Technology");
        assert_eq!(sector_of("ZZZZ"), "Other");
    }

    #[test]
    fn sector_map_only_uses_known_sectors() {
        for (_, sector) in SECTOR_MAP {
            assert!(SECTORS.contains(sector), "unknown sector {sector}");
        }
    }

    #[test]
    fn sp500_has_no_duplicates() {
        let mut seen = std::collections::HashSet::new();
        for ticker in SP500 {
            assert!(seen.insert(ticker), "duplicate {ticker}");
        }
    }
}
